//! Query parameters and per-endpoint whitelists.
//!
//! Every list endpoint accepts a fixed set of filter keys plus the shared
//! pagination keys. `validate` rejects anything else before a request is
//! built. Lists are sent comma-joined (`genres=Action,Comedy`) with each
//! element percent-encoded on its own.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::{ApiError, Result};

const PAGINATION: &[&str] = &["page", "locale", "per_page", "ids", "sort_fields", "sort_directions"];

const ANIME: &[&str] = &[
    "title",
    "anilist_id",
    "mal_id",
    "tmdb_id",
    "formats",
    "status",
    "year",
    "season",
    "genres",
    "nsfw",
    "with_episodes",
];

const EPISODE: &[&str] = &["anime_id", "number", "is_dub", "locale"];

const SONG: &[&str] = &["anime_id", "title", "artist", "year", "season", "type"];

const USER: &[&str] = &["username", "email"];

const USER_STORY: &[&str] = &["anime_id", "user_id", "status", "synced"];

const UPDATE_USER: &[&str] = &["password", "localization", "anilist_id", "anilist_token"];

/// An endpoint that accepts caller-supplied parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Anime,
    Episode,
    Song,
    User,
    UserStory,
    UpdateUser,
}

impl Endpoint {
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Anime => "anime",
            Endpoint::Episode => "episode",
            Endpoint::Song => "song",
            Endpoint::User => "user",
            Endpoint::UserStory => "user_story",
            Endpoint::UpdateUser => "update_user",
        }
    }

    fn filters(&self) -> &'static [&'static str] {
        match self {
            Endpoint::Anime => ANIME,
            Endpoint::Episode => EPISODE,
            Endpoint::Song => SONG,
            Endpoint::User => USER,
            Endpoint::UserStory => USER_STORY,
            Endpoint::UpdateUser => UPDATE_USER,
        }
    }

    fn paginated(&self) -> bool {
        !matches!(self, Endpoint::UpdateUser)
    }

    pub fn allows(&self, key: &str) -> bool {
        self.filters().contains(&key) || (self.paginated() && PAGINATION.contains(&key))
    }
}

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Text(String),
    List(Vec<String>),
}

impl ParamValue {
    fn to_query(&self) -> String {
        match self {
            ParamValue::Bool(b) => b.to_string(),
            ParamValue::Int(n) => n.to_string(),
            ParamValue::Text(s) => urlencoding::encode(s).into_owned(),
            ParamValue::List(items) => items
                .iter()
                .map(|item| urlencoding::encode(item).into_owned())
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value.into())
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(value.into())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        ParamValue::List(value)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(value: Vec<&str>) -> Self {
        ParamValue::List(value.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<i64>> for ParamValue {
    fn from(value: Vec<i64>) -> Self {
        ParamValue::List(value.iter().map(i64::to_string).collect())
    }
}

/// Insertion-ordered request parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, ParamValue)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing any previous value in place.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Encode as `k=v&k=v` without a leading `?`.
    pub fn to_query(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), v.to_query()))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Reject every key `endpoint` does not accept.
pub fn validate(endpoint: Endpoint, params: &Params) -> Result<()> {
    let unknown: BTreeSet<&str> = params.keys().filter(|key| !endpoint.allows(key)).collect();
    if unknown.is_empty() {
        return Ok(());
    }
    Err(ApiError::InvalidParameters {
        endpoint: endpoint.name(),
        names: unknown.into_iter().map(str::to_string).collect(),
    })
}
