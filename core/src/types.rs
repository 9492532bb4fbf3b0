//! Domain records returned by the API and payloads sent to it.
//!
//! # Design
//! Each resource has a fixed field set. Scalars are `Option`, maps and lists
//! default to empty. Every field decodes leniently: a value of the wrong type,
//! or a category code the enum does not know, becomes `None` (or empty)
//! instead of failing the record and the page around it. Unknown keys are
//! ignored.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use serde_repr::{Deserialize_repr, Serialize_repr};

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| T::deserialize(value).ok()))
}

fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|value| T::deserialize(value).ok())
        .unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum AnimeFormat {
    Tv = 0,
    TvShort = 1,
    Movie = 2,
    Special = 3,
    Ova = 4,
    Ona = 5,
    Music = 6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum AnimeStatus {
    Finished = 0,
    Releasing = 1,
    NotYetReleased = 2,
    Cancelled = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum SeasonPeriod {
    Winter = 0,
    Spring = 1,
    Summer = 2,
    Fall = 3,
    Unknown = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum AiringDay {
    Sunday = 0,
    Monday = 1,
    Tuesday = 2,
    Wednesday = 3,
    Thursday = 4,
    Friday = 5,
    Saturday = 6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum SongType {
    Opening = 0,
    Ending = 1,
    None = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum UserStoryStatus {
    Current = 0,
    Planning = 1,
    Completed = 2,
    Dropped = 3,
    Paused = 4,
    Repeating = 5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum UserRole {
    Basic = 0,
    Moderator = 1,
    Administrator = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum UserGender {
    Unknown = 0,
    Male = 1,
    Female = 2,
}

/// Which static resource list `get_resources` fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Genres = 0,
    Locales = 1,
}

impl ResourceKind {
    pub fn code(self) -> u8 {
        self as u8
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// An anime show, movie or special.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Anime {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub anilist_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub mal_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub tmdb_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub format: Option<AnimeFormat>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<AnimeStatus>,
    /// Titles keyed by locale (`en`, `jp`, ...).
    #[serde(default, deserialize_with = "null_default")]
    pub titles: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "null_default")]
    pub descriptions: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "lenient")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub weekly_airing_day: Option<AiringDay>,
    #[serde(default, deserialize_with = "lenient")]
    pub season_period: Option<SeasonPeriod>,
    #[serde(default, deserialize_with = "lenient")]
    pub season_year: Option<i32>,
    #[serde(default, deserialize_with = "lenient")]
    pub episodes_count: Option<i64>,
    /// Average episode length in minutes.
    #[serde(alias = "episodes_duration", default, deserialize_with = "lenient")]
    pub episode_duration: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub trailer_url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub cover_image: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub has_cover_image: Option<bool>,
    /// Hex colour, e.g. `#f1785d`.
    #[serde(default, deserialize_with = "lenient")]
    pub cover_color: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub banner_image: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub genres: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub sagas: Vec<Saga>,
    #[serde(default, deserialize_with = "lenient")]
    pub sequel: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub prequel: Option<i64>,
    /// 0 to 100.
    #[serde(default, deserialize_with = "lenient")]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub nsfw: Option<bool>,
    /// Similar anime ids, best rated first.
    #[serde(default, deserialize_with = "null_default")]
    pub recommendations: Vec<i64>,
}

impl Anime {
    pub fn title(&self, locale: &str) -> Option<&str> {
        self.titles.get(locale).map(String::as_str)
    }
}

/// A story arc inside an anime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Saga {
    #[serde(default, deserialize_with = "null_default")]
    pub titles: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "null_default")]
    pub descriptions: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "lenient")]
    pub episode_from: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub episode_to: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub episodes_count: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub anime_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub number: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub video: Option<String>,
    /// Headers a player needs to fetch `video`.
    #[serde(default, deserialize_with = "null_default")]
    pub video_headers: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "lenient")]
    pub locale: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub quality: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub format: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub is_dub: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Song {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub anime_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub artist: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub album: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "lenient")]
    pub season: Option<SeasonPeriod>,
    /// Milliseconds.
    #[serde(default, deserialize_with = "lenient")]
    pub duration: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub preview_url: Option<String>,
    #[serde(alias = "open_spotify_link", default, deserialize_with = "lenient")]
    pub open_spotify_url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub local_spotify_url: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub song_type: Option<SongType>,
}

/// The public view of a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSmall {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub role: Option<UserRole>,
    #[serde(default, deserialize_with = "lenient")]
    pub gender: Option<UserGender>,
}

/// A user as seen by the user themself: the public fields plus the ones only
/// returned to an authenticated caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserBig {
    #[serde(flatten)]
    pub user: UserSmall,
    #[serde(default, deserialize_with = "lenient")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub email_verified: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub avatar_tracker: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub localization: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub has_anilist: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub has_mal: Option<bool>,
}

impl AsRef<UserSmall> for UserBig {
    fn as_ref(&self) -> &UserSmall {
        &self.user
    }
}

impl From<UserBig> for UserSmall {
    fn from(user: UserBig) -> Self {
        user.user
    }
}

/// A user's watch progress on one anime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserStory {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub user_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub anime_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<UserStoryStatus>,
    #[serde(default, deserialize_with = "lenient")]
    pub current_episode: Option<i64>,
    /// Milliseconds into `current_episode`.
    #[serde(default, deserialize_with = "lenient")]
    pub current_episode_ticks: Option<i64>,
}

/// Static lists served by the resources endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResources {
    #[serde(default, deserialize_with = "null_default")]
    pub genres: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub locales: Vec<String>,
}

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Body for creating a user story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUserStory {
    pub user_id: i64,
    pub anime_id: i64,
    pub status: UserStoryStatus,
    /// Must not exceed the anime's `episodes_count`. Computed by the server
    /// for `Planning` and `Completed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_episode: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_episode_ticks: Option<i64>,
}

/// Body for updating a user story. Every field is sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStoryUpdate {
    pub id: i64,
    pub user_id: i64,
    pub anime_id: i64,
    pub status: UserStoryStatus,
    pub current_episode: i64,
    pub current_episode_ticks: i64,
}
