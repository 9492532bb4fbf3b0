//! Endpoint operations for AniAPI v1.
//!
//! # Design
//! Every operation runs the same fixed pipeline:
//!
//! 1. validate caller parameters (and counts) without touching the network,
//! 2. build an `HttpRequest` and send it through the `Transport`,
//! 3. decode the body into a JSON mapping carrying the rate limit,
//! 4. turn `data` into typed records (`factory::build`),
//! 5. wrap everything in a `Context`.
//!
//! The client holds only configuration. Nothing is cached between calls and
//! a non-200 envelope is returned as a `Context`, not as an error.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::context::Context;
use crate::decode::decode_response;
use crate::error::{ApiError, Result};
use crate::factory::{self, Shape};
use crate::http::{HttpMethod, HttpRequest, Transport};
use crate::params::{validate, Endpoint, Params};
use crate::types::{
    Anime, ApiResources, Episode, NewUserStory, ResourceKind, Song, UserBig, UserGender, UserSmall, UserStory,
    UserStoryUpdate,
};

/// Largest `count` the random endpoints accept.
pub const MAX_RANDOM_COUNT: u32 = 50;

/// Synchronous client for AniAPI.
///
/// Not meant to be shared across threads while a call is in flight; give each
/// thread its own client.
#[derive(Debug, Clone)]
pub struct AniApiClient<T> {
    transport: T,
    config: ClientConfig,
}

#[cfg(feature = "ureq")]
impl AniApiClient<crate::transport::UreqTransport> {
    /// A client using the blocking `ureq` transport.
    pub fn with_ureq(config: ClientConfig) -> Self {
        let transport = crate::transport::UreqTransport::from_config(&config);
        Self::new(transport, config)
    }
}

impl<T: Transport> AniApiClient<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // -----------------------------------------------------------------------
    // Anime
    // -----------------------------------------------------------------------

    pub fn get_anime(&self, id: i64) -> Result<Context<Anime>> {
        self.get_anime_with(id, &Params::new())
    }

    /// One anime by id with extra query parameters, e.g. `with_episodes`.
    /// Validated against the same whitelist as [`Self::list_anime`].
    pub fn get_anime_with(&self, id: i64, params: &Params) -> Result<Context<Anime>> {
        validate(Endpoint::Anime, params)?;
        let request = self.get_request(&["anime", &id.to_string()], params);
        self.execute(request, Shape::Single)
    }

    /// List anime matching `params` (filters such as `title`, `year`,
    /// `genres`, plus pagination).
    pub fn list_anime(&self, params: &Params) -> Result<Context<Anime>> {
        validate(Endpoint::Anime, params)?;
        self.execute(self.get_request(&["anime"], params), Shape::Listing)
    }

    /// `count` random anime, never paginated.
    pub fn get_random_anime(&self, count: u32, nsfw: bool) -> Result<Context<Anime>> {
        check_count(count)?;
        let request = self.get_request(&["random", "anime", &count.to_string(), &nsfw.to_string()], &Params::new());
        self.execute(request, Shape::Flat)
    }

    // -----------------------------------------------------------------------
    // Episodes
    // -----------------------------------------------------------------------

    pub fn get_episode(&self, id: i64) -> Result<Context<Episode>> {
        self.get_episode_with(id, &Params::new())
    }

    pub fn get_episode_with(&self, id: i64, params: &Params) -> Result<Context<Episode>> {
        validate(Endpoint::Episode, params)?;
        let request = self.get_request(&["episode", &id.to_string()], params);
        self.execute(request, Shape::Single)
    }

    pub fn list_episodes(&self, params: &Params) -> Result<Context<Episode>> {
        validate(Endpoint::Episode, params)?;
        self.execute(self.get_request(&["episode"], params), Shape::Listing)
    }

    // -----------------------------------------------------------------------
    // Songs
    // -----------------------------------------------------------------------

    pub fn get_song(&self, id: i64) -> Result<Context<Song>> {
        self.get_song_with(id, &Params::new())
    }

    pub fn get_song_with(&self, id: i64, params: &Params) -> Result<Context<Song>> {
        validate(Endpoint::Song, params)?;
        let request = self.get_request(&["song", &id.to_string()], params);
        self.execute(request, Shape::Single)
    }

    pub fn list_songs(&self, params: &Params) -> Result<Context<Song>> {
        validate(Endpoint::Song, params)?;
        self.execute(self.get_request(&["song"], params), Shape::Listing)
    }

    pub fn get_random_song(&self, count: u32) -> Result<Context<Song>> {
        check_count(count)?;
        let request = self.get_request(&["random", "song", &count.to_string()], &Params::new());
        self.execute(request, Shape::Flat)
    }

    // -----------------------------------------------------------------------
    // Resources
    // -----------------------------------------------------------------------

    /// Static genre or locale lists. `version` is the resource version
    /// (`"1.0"`), not the API version.
    pub fn get_resources(&self, version: &str, kind: ResourceKind) -> Result<Context<ApiResources>> {
        let request = self.get_request(&["resources", version, &kind.code().to_string()], &Params::new());
        self.execute(request, Shape::Single)
    }

    // -----------------------------------------------------------------------
    // User stories
    // -----------------------------------------------------------------------

    pub fn get_user_story(&self, id: i64) -> Result<Context<UserStory>> {
        self.get_user_story_with(id, &Params::new())
    }

    pub fn get_user_story_with(&self, id: i64, params: &Params) -> Result<Context<UserStory>> {
        validate(Endpoint::UserStory, params)?;
        let request = self.get_request(&["user_story", &id.to_string()], params);
        self.execute(request, Shape::Single)
    }

    pub fn list_user_stories(&self, params: &Params) -> Result<Context<UserStory>> {
        validate(Endpoint::UserStory, params)?;
        self.execute(self.get_request(&["user_story"], params), Shape::Listing)
    }

    pub fn create_user_story(&self, story: &NewUserStory) -> Result<Context<UserStory>> {
        let request = self.body_request(HttpMethod::Put, &["user_story"], story)?;
        self.execute(request, Shape::Single)
    }

    pub fn update_user_story(&self, story: &UserStoryUpdate) -> Result<Context<UserStory>> {
        let request = self.body_request(HttpMethod::Post, &["user_story"], story)?;
        self.execute(request, Shape::Single)
    }

    /// Delete a user story. Stories of users with linked trackers are
    /// re-imported by the server on the next sync.
    pub fn delete_user_story(&self, id: i64) -> Result<Context<Value>> {
        let request = self.request(HttpMethod::Delete, &["user_story", &id.to_string()], &Params::new());
        self.execute(request, Shape::Single)
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    pub fn get_user(&self, id: i64) -> Result<Context<UserSmall>> {
        self.get_user_with(id, &Params::new())
    }

    pub fn get_user_with(&self, id: i64, params: &Params) -> Result<Context<UserSmall>> {
        validate(Endpoint::User, params)?;
        let request = self.get_request(&["user", &id.to_string()], params);
        self.execute(request, Shape::Single)
    }

    /// List users. `username` and `email` match case-insensitive substrings.
    pub fn list_users(&self, params: &Params) -> Result<Context<UserSmall>> {
        validate(Endpoint::User, params)?;
        self.execute(self.get_request(&["user"], params), Shape::Listing)
    }

    /// Update a user's account. `params` may carry `password`,
    /// `localization`, `anilist_id` and `anilist_token`.
    pub fn update_user(&self, id: i64, gender: UserGender, params: &Params) -> Result<Context<UserBig>> {
        validate(Endpoint::UpdateUser, params)?;

        let mut body = Map::new();
        body.insert("id".to_string(), Value::from(id));
        body.insert("gender".to_string(), Value::from(gender as u8));
        for (key, value) in params.iter() {
            let value = serde_json::to_value(value).map_err(|e| ApiError::Serialization(e.to_string()))?;
            body.insert(key.to_string(), value);
        }

        let request = self.body_request(HttpMethod::Post, &["user"], &body)?;
        self.execute(request, Shape::Single)
    }

    pub fn delete_user(&self, id: i64) -> Result<Context<Value>> {
        let request = self.request(HttpMethod::Delete, &["user", &id.to_string()], &Params::new());
        self.execute(request, Shape::Single)
    }

    /// The user that owns `jwt`. An invalid token yields a 401 context.
    pub fn auth_me(&self, jwt: &str) -> Result<Context<UserBig>> {
        let request = HttpRequest {
            method: HttpMethod::Get,
            path: self.path(&["auth", "me"], &Params::new()),
            headers: default_headers(Some(jwt).filter(|jwt| !jwt.is_empty())),
            body: None,
        };
        self.execute(request, Shape::Single)
    }

    // -----------------------------------------------------------------------
    // Pipeline
    // -----------------------------------------------------------------------

    /// `/{version}/{segments...}[?query]`
    fn path(&self, segments: &[&str], params: &Params) -> String {
        let mut path = format!("/{}", self.config.version);
        for segment in segments {
            path.push('/');
            path.push_str(&urlencoding::encode(segment));
        }
        if !params.is_empty() {
            path.push('?');
            path.push_str(&params.to_query());
        }
        path
    }

    fn request(&self, method: HttpMethod, segments: &[&str], params: &Params) -> HttpRequest {
        HttpRequest {
            method,
            path: self.path(segments, params),
            headers: default_headers(self.config.bearer()),
            body: None,
        }
    }

    fn get_request(&self, segments: &[&str], params: &Params) -> HttpRequest {
        self.request(HttpMethod::Get, segments, params)
    }

    fn body_request<B: Serialize + ?Sized>(&self, method: HttpMethod, segments: &[&str], body: &B) -> Result<HttpRequest> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let mut request = self.request(method, segments, &Params::new());
        request.body = Some(body);
        Ok(request)
    }

    fn execute<R: DeserializeOwned>(&self, request: HttpRequest, shape: Shape) -> Result<Context<R>> {
        debug!(method = %request.method, path = %request.path, "sending request");
        let response = self.transport.send(&request)?;
        debug!(path = %request.path, status = response.status, "response received");

        let mut fields = decode_response(&response)?;
        let data = factory::build(&mut fields, shape)?;
        let context = Context::from_decoded(&fields, data);

        if !context.is_success() {
            warn!(
                path = %request.path,
                status_code = context.status_code(),
                message = context.message(),
                "request not successful"
            );
        }
        Ok(context)
    }
}

fn default_headers(token: Option<&str>) -> Vec<(String, String)> {
    let mut headers = Vec::with_capacity(3);
    if let Some(token) = token {
        headers.push(("authorization".to_string(), format!("Bearer {token}")));
    }
    headers.push(("content-type".to_string(), "application/json".to_string()));
    headers.push(("accept".to_string(), "application/json".to_string()));
    headers
}

fn check_count(count: u32) -> Result<()> {
    if (1..=MAX_RANDOM_COUNT).contains(&count) {
        Ok(())
    } else {
        Err(ApiError::Range { count })
    }
}
