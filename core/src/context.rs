//! The response envelope returned by every operation.
//!
//! # Design
//! `Context<T>` is built once per response and exposes read-only accessors.
//! Construction never fails: a partial or error response still yields an
//! envelope, falling back to `404` / `"Not Found"` / version `"1"` for the
//! fields the body does not carry.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub(crate) const DEFAULT_STATUS: u16 = 404;
const DEFAULT_MESSAGE: &str = "Not Found";
const DEFAULT_VERSION: &str = "1";

/// Quota metadata copied verbatim from the `X-RateLimit-*` response headers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    limit: Option<String>,
    remaining: Option<String>,
    reset: Option<String>,
}

impl RateLimit {
    pub fn new(limit: Option<String>, remaining: Option<String>, reset: Option<String>) -> Self {
        Self {
            limit,
            remaining,
            reset,
        }
    }

    pub fn limit(&self) -> Option<&str> {
        self.limit.as_deref()
    }

    pub fn remaining(&self) -> Option<&str> {
        self.remaining.as_deref()
    }

    pub fn reset(&self) -> Option<&str> {
        self.reset.as_deref()
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    current_page: u32,
    count: usize,
    documents: Vec<T>,
    last_page: Option<u32>,
}

impl<T> Page<T> {
    /// `count` is always `documents.len()`.
    pub fn new(current_page: u32, documents: Vec<T>, last_page: Option<u32>) -> Self {
        Self {
            current_page,
            count: documents.len(),
            documents,
            last_page,
        }
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn documents(&self) -> &[T] {
        &self.documents
    }

    /// `None` when the API did not report a last page.
    pub fn last_page(&self) -> Option<u32> {
        self.last_page
    }

    pub fn has_next(&self) -> bool {
        self.last_page.is_some_and(|last| self.current_page < last)
    }

    pub fn into_documents(self) -> Vec<T> {
        self.documents
    }
}

/// The decoded `data` of a response.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload<T> {
    Single(T),
    List(Vec<T>),
    Page(Page<T>),
    /// `data` of a non-200 response, left undecoded.
    Raw(Value),
}

impl<T> Payload<T> {
    pub fn as_single(&self) -> Option<&T> {
        match self {
            Payload::Single(item) => Some(item),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[T]> {
        match self {
            Payload::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_page(&self) -> Option<&Page<T>> {
        match self {
            Payload::Page(page) => Some(page),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> Option<&Value> {
        match self {
            Payload::Raw(value) => Some(value),
            _ => None,
        }
    }
}

/// Status, message, payload, API version and rate limit of one response.
#[derive(Debug, Clone, PartialEq)]
pub struct Context<T> {
    status_code: u16,
    message: String,
    data: Option<Payload<T>>,
    version: String,
    ratelimit: Option<RateLimit>,
}

impl<T> Context<T> {
    /// Build the envelope from a decoded response mapping and the payload the
    /// factory produced for it.
    pub fn from_decoded(fields: &Map<String, Value>, data: Option<Payload<T>>) -> Self {
        let message = match fields.get("message") {
            Some(Value::String(message)) => message.clone(),
            _ => DEFAULT_MESSAGE.to_string(),
        };
        let version = match fields.get("version") {
            Some(Value::String(version)) => version.clone(),
            Some(Value::Number(version)) => version.to_string(),
            _ => DEFAULT_VERSION.to_string(),
        };
        let ratelimit = fields
            .get("ratelimit")
            .and_then(|value| RateLimit::deserialize(value).ok());

        Self {
            status_code: status_code(fields),
            message,
            data,
            version,
            ratelimit,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn data(&self) -> Option<&Payload<T>> {
        self.data.as_ref()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn ratelimit(&self) -> Option<&RateLimit> {
        self.ratelimit.as_ref()
    }

    pub fn into_data(self) -> Option<Payload<T>> {
        self.data
    }
}

/// The envelope's `status_code`, or 404 when it is missing or not a valid
/// status.
pub(crate) fn status_code(fields: &Map<String, Value>) -> u16 {
    fields
        .get("status_code")
        .and_then(Value::as_u64)
        .and_then(|code| u16::try_from(code).ok())
        .unwrap_or(DEFAULT_STATUS)
}
