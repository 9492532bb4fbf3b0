//! Decoded mapping → typed payload.
//!
//! What `data` holds depends on the request that produced it, so the caller
//! passes the expected `Shape` alongside the mapping.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

use crate::context::{self, Page, Payload};
use crate::error::{ApiError, Result};

/// The layout of `data` in a successful response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A request for one resource by id.
    Single,
    /// A paginated listing: `data` is `{current_page, count, documents, last_page}`.
    Listing,
    /// A bare array of resources (random endpoints).
    Flat,
}

/// Build the payload for `fields`.
///
/// Non-200 envelopes are not decoded: their `data`, if any, is passed through
/// as `Payload::Raw`. `data` is removed from `fields`.
pub fn build<T: DeserializeOwned>(fields: &mut Map<String, Value>, shape: Shape) -> Result<Option<Payload<T>>> {
    let data = fields.remove("data").filter(|data| !data.is_null());

    if context::status_code(fields) != 200 {
        return Ok(data.map(Payload::Raw));
    }
    let Some(data) = data else {
        return Ok(None);
    };

    match shape {
        Shape::Single => decode(data).map(|item| Some(Payload::Single(item))),
        Shape::Flat => match data {
            Value::Array(items) => decode_all(items).map(|items| Some(Payload::List(items))),
            other => Err(ApiError::Decode(format!("expected an array of resources, got {other}"))),
        },
        Shape::Listing => listing(data),
    }
}

fn listing<T: DeserializeOwned>(data: Value) -> Result<Option<Payload<T>>> {
    let Value::Object(mut page) = data else {
        return Err(ApiError::Decode("expected a paginated object".to_string()));
    };
    let documents = match page.remove("documents") {
        Some(Value::Array(documents)) => documents,
        Some(Value::Null) => Vec::new(),
        Some(other) => {
            return Err(ApiError::Decode(format!("expected `documents` to be an array, got {other}")));
        }
        None => return Ok(Some(Payload::Raw(Value::Object(page)))),
    };

    let documents: Vec<T> = decode_all(documents)?;
    let current_page = page_number(&page, "current_page").unwrap_or(1);
    let last_page = page_number(&page, "last_page");
    if let Some(reported) = page.get("count").and_then(Value::as_u64) {
        if usize::try_from(reported).ok() != Some(documents.len()) {
            warn!(reported, decoded = documents.len(), "page count disagrees with documents");
        }
    }

    Ok(Some(Payload::Page(Page::new(current_page, documents, last_page))))
}

fn page_number(page: &Map<String, Value>, key: &str) -> Option<u32> {
    page.get(key)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

fn decode_all<T: DeserializeOwned>(items: Vec<Value>) -> Result<Vec<T>> {
    items.into_iter().map(decode).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Anime, Episode};
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn single_resource() {
        let mut map = fields(json!({
            "status_code": 200,
            "data": {"id": 1, "titles": {"en": "Cowboy Bebop"}}
        }));
        let payload = build::<Anime>(&mut map, Shape::Single).unwrap().unwrap();
        let anime = payload.as_single().unwrap();
        assert_eq!(anime.id, Some(1));
        assert_eq!(anime.titles["en"], "Cowboy Bebop");
        assert!(!map.contains_key("data"));
    }

    #[test]
    fn listing_keeps_order_and_null_last_page() {
        let mut map = fields(json!({
            "status_code": 200,
            "data": {
                "current_page": 1,
                "count": 2,
                "documents": [{"id": 1}, {"id": 2}],
                "last_page": null
            }
        }));
        let payload = build::<Anime>(&mut map, Shape::Listing).unwrap().unwrap();
        let page = payload.as_page().unwrap();
        assert_eq!(page.current_page(), 1);
        assert_eq!(page.count(), 2);
        assert_eq!(page.last_page(), None);
        let ids: Vec<_> = page.documents().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![Some(1), Some(2)]);
    }

    #[test]
    fn listing_count_follows_documents() {
        let mut map = fields(json!({
            "status_code": 200,
            "data": {"current_page": 3, "count": 9, "documents": [{"id": 5}], "last_page": 4}
        }));
        let payload = build::<Anime>(&mut map, Shape::Listing).unwrap().unwrap();
        let page = payload.as_page().unwrap();
        assert_eq!(page.count(), 1);
        assert_eq!(page.current_page(), 3);
        assert_eq!(page.last_page(), Some(4));
    }

    #[test]
    fn listing_without_documents_stays_raw() {
        let mut map = fields(json!({"status_code": 200, "data": {"genres": ["Action"]}}));
        let payload = build::<Anime>(&mut map, Shape::Listing).unwrap().unwrap();
        assert_eq!(payload.as_raw(), Some(&json!({"genres": ["Action"]})));
    }

    #[test]
    fn flat_list_is_not_paginated() {
        let mut map = fields(json!({"status_code": 200, "data": [{"id": 3}, {"id": 1}]}));
        let payload = build::<Anime>(&mut map, Shape::Flat).unwrap().unwrap();
        let items = payload.as_list().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, Some(3));
        assert!(payload.as_page().is_none());
    }

    #[test]
    fn flat_requires_array() {
        let mut map = fields(json!({"status_code": 200, "data": {"id": 3}}));
        assert!(matches!(build::<Anime>(&mut map, Shape::Flat), Err(ApiError::Decode(_))));
    }

    #[test]
    fn error_status_skips_construction() {
        let mut map = fields(json!({"status_code": 404, "message": "Anime not found", "data": "missing"}));
        let payload = build::<Anime>(&mut map, Shape::Single).unwrap();
        assert_eq!(payload, Some(Payload::Raw(json!("missing"))));

        let mut map = fields(json!({"status_code": 404}));
        assert_eq!(build::<Anime>(&mut map, Shape::Listing).unwrap(), None);
    }

    #[test]
    fn missing_status_counts_as_error() {
        let mut map = fields(json!({"data": {"id": "not-a-number"}}));
        let payload = build::<Anime>(&mut map, Shape::Single).unwrap();
        assert!(matches!(payload, Some(Payload::Raw(_))));
    }

    #[test]
    fn null_data_is_no_payload() {
        let mut map = fields(json!({"status_code": 200, "data": null}));
        assert_eq!(build::<Anime>(&mut map, Shape::Single).unwrap(), None);
    }

    #[test]
    fn null_documents_is_an_empty_page() {
        let mut map = fields(json!({
            "status_code": 200,
            "data": {"current_page": 1, "count": 0, "documents": null, "last_page": 1}
        }));
        let payload = build::<Anime>(&mut map, Shape::Listing).unwrap().unwrap();
        let page = payload.as_page().unwrap();
        assert_eq!(page.count(), 0);
        assert_eq!(page.last_page(), Some(1));
    }

    #[test]
    fn mistyped_field_keeps_every_document() {
        let mut map = fields(json!({
            "status_code": 200,
            "data": {
                "current_page": 1,
                "count": 2,
                "documents": [
                    {"id": 1, "locale": "en"},
                    {"id": 2, "locale": "it", "video_headers": {"X-Len": 5}, "number": "two"}
                ],
                "last_page": 1
            }
        }));
        let payload = build::<Episode>(&mut map, Shape::Listing).unwrap().unwrap();
        let page = payload.as_page().unwrap();
        assert_eq!(page.count(), 2);
        let second = &page.documents()[1];
        assert_eq!(second.id, Some(2));
        assert_eq!(second.locale.as_deref(), Some("it"));
        assert!(second.video_headers.is_empty());
        assert_eq!(second.number, None);
    }

    #[test]
    fn non_object_document_is_a_decode_error() {
        let mut map = fields(json!({
            "status_code": 200,
            "data": {"current_page": 1, "count": 1, "documents": ["x"]}
        }));
        assert!(matches!(build::<Anime>(&mut map, Shape::Listing), Err(ApiError::Decode(_))));
    }
}
