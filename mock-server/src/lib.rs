//! In-memory imitation of the AniAPI v1 HTTP surface.
//!
//! Every response is a JSON envelope `{status_code, message, data, version}`
//! with `X-RateLimit-*` headers. Listings are paginated with `page` and
//! `per_page`; list filters arrive comma-joined (`ids=1,2`). Mutating
//! endpoints and `/v1/auth/me` require `Authorization: Bearer {VALID_TOKEN}`.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub const VALID_TOKEN: &str = "mock-token";
pub const RATE_LIMIT: u32 = 90;
const DEFAULT_PER_PAGE: usize = 100;
const MAX_RANDOM: usize = 50;

pub const GENRES: &[&str] = &["Action", "Adventure", "Comedy", "Drama", "Sci-Fi", "Space"];
pub const LOCALES: &[&str] = &["en", "it", "jp"];

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Anime {
    pub id: i64,
    pub titles: BTreeMap<String, String>,
    pub format: u8,
    pub status: u8,
    pub season_year: i32,
    pub episodes_count: i64,
    pub genres: Vec<String>,
    pub nsfw: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Episode {
    pub id: i64,
    pub anime_id: i64,
    pub number: i64,
    pub title: String,
    pub locale: String,
    pub is_dub: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Song {
    pub id: i64,
    pub anime_id: i64,
    pub title: String,
    pub artist: String,
    #[serde(rename = "type")]
    pub song_type: u8,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub role: u8,
    pub gender: u8,
    pub email: String,
    pub email_verified: bool,
    pub localization: String,
}

impl User {
    /// The fields any caller may see.
    fn public(&self) -> Value {
        json!({
            "id": self.id,
            "username": self.username,
            "role": self.role,
            "gender": self.gender,
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserStory {
    pub id: i64,
    pub user_id: i64,
    pub anime_id: i64,
    pub status: u8,
    #[serde(default)]
    pub current_episode: i64,
    #[serde(default)]
    pub current_episode_ticks: i64,
}

#[derive(Deserialize)]
pub struct NewUserStory {
    pub user_id: i64,
    pub anime_id: i64,
    pub status: u8,
    #[serde(default)]
    pub current_episode: i64,
    #[serde(default)]
    pub current_episode_ticks: i64,
}

#[derive(Debug, Default)]
pub struct Store {
    pub anime: Vec<Anime>,
    pub episodes: Vec<Episode>,
    pub songs: Vec<Song>,
    pub users: Vec<User>,
    pub stories: Vec<UserStory>,
    next_story_id: i64,
}

impl Store {
    /// A small fixed catalogue.
    pub fn seeded() -> Self {
        let titles = |en: &str, jp: &str| BTreeMap::from([("en".to_string(), en.to_string()), ("jp".to_string(), jp.to_string())]);
        let genres = |g: &[&str]| g.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        let anime = vec![
            Anime {
                id: 1,
                titles: titles("Cowboy Bebop", "カウボーイビバップ"),
                format: 0,
                status: 0,
                season_year: 1998,
                episodes_count: 26,
                genres: genres(&["Action", "Sci-Fi", "Space"]),
                nsfw: false,
            },
            Anime {
                id: 2,
                titles: titles("Cowboy Bebop: The Movie", "カウボーイビバップ 天国の扉"),
                format: 2,
                status: 0,
                season_year: 2001,
                episodes_count: 1,
                genres: genres(&["Action", "Drama", "Sci-Fi"]),
                nsfw: false,
            },
            Anime {
                id: 3,
                titles: titles("Trigun", "トライガン"),
                format: 0,
                status: 0,
                season_year: 1998,
                episodes_count: 26,
                genres: genres(&["Action", "Adventure", "Comedy"]),
                nsfw: false,
            },
            Anime {
                id: 4,
                titles: titles("Late Night Special", "深夜スペシャル"),
                format: 3,
                status: 1,
                season_year: 2020,
                episodes_count: 12,
                genres: genres(&["Drama"]),
                nsfw: true,
            },
        ];

        let episodes = (1..=3)
            .map(|number| Episode {
                id: number,
                anime_id: 1,
                number,
                title: format!("Session #{number}"),
                locale: "en".to_string(),
                is_dub: false,
            })
            .chain(std::iter::once(Episode {
                id: 4,
                anime_id: 1,
                number: 1,
                title: "Sessione #1".to_string(),
                locale: "it".to_string(),
                is_dub: true,
            }))
            .collect();

        let songs = vec![
            Song {
                id: 1,
                anime_id: 1,
                title: "Tank!".to_string(),
                artist: "The Seatbelts".to_string(),
                song_type: 0,
            },
            Song {
                id: 2,
                anime_id: 1,
                title: "The Real Folk Blues".to_string(),
                artist: "The Seatbelts".to_string(),
                song_type: 1,
            },
            Song {
                id: 3,
                anime_id: 3,
                title: "H.T.".to_string(),
                artist: "Tsuneo Imahori".to_string(),
                song_type: 0,
            },
        ];

        let users = vec![
            User {
                id: 1,
                username: "spike".to_string(),
                role: 0,
                gender: 1,
                email: "spike@bebop.invalid".to_string(),
                email_verified: true,
                localization: "en".to_string(),
            },
            User {
                id: 2,
                username: "faye".to_string(),
                role: 1,
                gender: 2,
                email: "faye@bebop.invalid".to_string(),
                email_verified: false,
                localization: "en".to_string(),
            },
        ];

        let stories = vec![UserStory {
            id: 1,
            user_id: 1,
            anime_id: 1,
            status: 0,
            current_episode: 5,
            current_episode_ticks: 120_000,
        }];

        Self {
            anime,
            episodes,
            songs,
            users,
            stories,
            next_story_id: 2,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    store: Arc<RwLock<Store>>,
    hits: Arc<AtomicU32>,
}

impl AppState {
    fn new(store: Store) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            hits: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Wrap `data` in the API envelope and attach rate-limit headers.
    fn envelope(&self, status: StatusCode, message: &str, data: Value) -> Response {
        let used = self.hits.fetch_add(1, Ordering::Relaxed) % RATE_LIMIT + 1;
        let body = json!({
            "status_code": status.as_u16(),
            "message": message,
            "data": data,
            "version": "1",
        });
        (
            status,
            [
                ("X-RateLimit-Limit", RATE_LIMIT.to_string()),
                ("X-RateLimit-Remaining", (RATE_LIMIT - used).to_string()),
                ("X-RateLimit-Reset", "1".to_string()),
            ],
            Json(body),
        )
            .into_response()
    }

    fn not_found(&self, what: &str) -> Response {
        self.envelope(StatusCode::NOT_FOUND, &format!("{what} not found"), Value::Null)
    }

    fn unauthorized(&self) -> Response {
        self.envelope(StatusCode::UNAUTHORIZED, "Unauthorized", Value::Null)
    }

    /// Page `items` according to `page` / `per_page`. An empty result or a
    /// page past the end is a 404, as on the real API.
    fn page<T: Serialize>(&self, what: &str, items: Vec<T>, query: &HashMap<String, String>) -> Response {
        let per_page = query
            .get("per_page")
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_PER_PAGE);
        let page = query
            .get("page")
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(1);
        let last_page = items.len().div_ceil(per_page);
        if items.is_empty() || page > last_page {
            return self.envelope(StatusCode::NOT_FOUND, &format!("Zero {what} found"), Value::Null);
        }

        let documents: Vec<T> = items.into_iter().skip((page - 1) * per_page).take(per_page).collect();
        let data = json!({
            "current_page": page,
            "count": documents.len(),
            "documents": documents,
            "last_page": last_page,
        });
        self.envelope(StatusCode::OK, &format!("Page {page}"), data)
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        == Some(VALID_TOKEN)
}

fn list_param(query: &HashMap<String, String>, key: &str) -> Option<Vec<String>> {
    query
        .get(key)
        .map(|v| v.split(',').filter(|s| !s.is_empty()).map(str::to_string).collect())
}

fn int_param(query: &HashMap<String, String>, key: &str) -> Option<i64> {
    query.get(key).and_then(|v| v.parse().ok())
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub fn app() -> Router {
    app_with(Store::seeded())
}

pub fn app_with(store: Store) -> Router {
    Router::new()
        .route("/v1/anime", get(list_anime))
        .route("/v1/anime/{id}", get(get_anime))
        .route("/v1/random/anime/{count}/{nsfw}", get(random_anime))
        .route("/v1/episode", get(list_episodes))
        .route("/v1/episode/{id}", get(get_episode))
        .route("/v1/song", get(list_songs))
        .route("/v1/song/{id}", get(get_song))
        .route("/v1/random/song/{count}", get(random_songs))
        .route("/v1/resources/{version}/{kind}", get(resources))
        .route(
            "/v1/user_story",
            get(list_stories).put(create_story).post(update_story),
        )
        .route("/v1/user_story/{id}", get(get_story).delete(delete_story))
        .route("/v1/user", get(list_users).post(update_user))
        .route("/v1/user/{id}", get(get_user).delete(delete_user))
        .route("/v1/auth/me", get(auth_me))
        .with_state(AppState::new(store))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

// --- anime ---

async fn list_anime(State(state): State<AppState>, Query(query): Query<HashMap<String, String>>) -> Response {
    let store = state.store.read().await;
    let nsfw = query.get("nsfw").is_some_and(|v| v == "true");
    let ids = list_param(&query, "ids");
    let wanted_genres = list_param(&query, "genres").unwrap_or_default();
    let year = int_param(&query, "year");
    let title = query.get("title");

    let items: Vec<Anime> = store
        .anime
        .iter()
        .filter(|a| nsfw || !a.nsfw)
        .filter(|a| ids.as_ref().is_none_or(|ids| ids.contains(&a.id.to_string())))
        .filter(|a| year.is_none_or(|y| i64::from(a.season_year) == y))
        .filter(|a| title.is_none_or(|t| a.titles.values().any(|v| contains_ci(v, t))))
        .filter(|a| wanted_genres.iter().all(|g| a.genres.contains(g)))
        .cloned()
        .collect();
    state.page("anime", items, &query)
}

async fn get_anime(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let store = state.store.read().await;
    match store.anime.iter().find(|a| a.id == id) {
        Some(anime) => state.envelope(StatusCode::OK, "Anime found", json!(anime)),
        None => state.not_found("Anime"),
    }
}

async fn random_anime(State(state): State<AppState>, Path((count, nsfw)): Path<(usize, bool)>) -> Response {
    let store = state.store.read().await;
    let picked: Vec<&Anime> = store
        .anime
        .iter()
        .filter(|a| nsfw || !a.nsfw)
        .take(count.min(MAX_RANDOM))
        .collect();
    state.envelope(StatusCode::OK, "Random anime", json!(picked))
}

// --- episodes ---

async fn list_episodes(State(state): State<AppState>, Query(query): Query<HashMap<String, String>>) -> Response {
    let store = state.store.read().await;
    let anime_id = int_param(&query, "anime_id");
    let number = int_param(&query, "number");
    let locale = query.get("locale");
    let is_dub = query.get("is_dub").map(|v| v == "true");

    let items: Vec<Episode> = store
        .episodes
        .iter()
        .filter(|e| anime_id.is_none_or(|id| e.anime_id == id))
        .filter(|e| number.is_none_or(|n| e.number == n))
        .filter(|e| locale.is_none_or(|l| &e.locale == l))
        .filter(|e| is_dub.is_none_or(|d| e.is_dub == d))
        .cloned()
        .collect();
    state.page("episodes", items, &query)
}

async fn get_episode(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let store = state.store.read().await;
    match store.episodes.iter().find(|e| e.id == id) {
        Some(episode) => state.envelope(StatusCode::OK, "Episode found", json!(episode)),
        None => state.not_found("Episode"),
    }
}

// --- songs ---

async fn list_songs(State(state): State<AppState>, Query(query): Query<HashMap<String, String>>) -> Response {
    let store = state.store.read().await;
    let anime_id = int_param(&query, "anime_id");
    let song_type = int_param(&query, "type");
    let title = query.get("title");
    let artist = query.get("artist");

    let items: Vec<Song> = store
        .songs
        .iter()
        .filter(|s| anime_id.is_none_or(|id| s.anime_id == id))
        .filter(|s| song_type.is_none_or(|t| i64::from(s.song_type) == t))
        .filter(|s| title.is_none_or(|t| contains_ci(&s.title, t)))
        .filter(|s| artist.is_none_or(|a| contains_ci(&s.artist, a)))
        .cloned()
        .collect();
    state.page("songs", items, &query)
}

async fn get_song(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let store = state.store.read().await;
    match store.songs.iter().find(|s| s.id == id) {
        Some(song) => state.envelope(StatusCode::OK, "Song found", json!(song)),
        None => state.not_found("Song"),
    }
}

async fn random_songs(State(state): State<AppState>, Path(count): Path<usize>) -> Response {
    let store = state.store.read().await;
    let picked: Vec<&Song> = store.songs.iter().take(count.min(MAX_RANDOM)).collect();
    state.envelope(StatusCode::OK, "Random songs", json!(picked))
}

// --- resources ---

async fn resources(State(state): State<AppState>, Path((_version, kind)): Path<(String, u8)>) -> Response {
    match kind {
        0 => state.envelope(StatusCode::OK, "Resources found", json!({ "genres": GENRES })),
        1 => state.envelope(StatusCode::OK, "Resources found", json!({ "locales": LOCALES })),
        _ => state.not_found("Resource"),
    }
}

// --- user stories ---

async fn list_stories(State(state): State<AppState>, Query(query): Query<HashMap<String, String>>) -> Response {
    let store = state.store.read().await;
    let user_id = int_param(&query, "user_id");
    let anime_id = int_param(&query, "anime_id");
    let status = int_param(&query, "status");

    let items: Vec<UserStory> = store
        .stories
        .iter()
        .filter(|s| user_id.is_none_or(|id| s.user_id == id))
        .filter(|s| anime_id.is_none_or(|id| s.anime_id == id))
        .filter(|s| status.is_none_or(|st| i64::from(s.status) == st))
        .cloned()
        .collect();
    state.page("user stories", items, &query)
}

async fn get_story(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let store = state.store.read().await;
    match store.stories.iter().find(|s| s.id == id) {
        Some(story) => state.envelope(StatusCode::OK, "UserStory found", json!(story)),
        None => state.not_found("UserStory"),
    }
}

async fn create_story(State(state): State<AppState>, headers: HeaderMap, Json(input): Json<NewUserStory>) -> Response {
    if !authorized(&headers) {
        return state.unauthorized();
    }
    let mut store = state.store.write().await;
    let story = UserStory {
        id: store.next_story_id,
        user_id: input.user_id,
        anime_id: input.anime_id,
        status: input.status,
        current_episode: input.current_episode,
        current_episode_ticks: input.current_episode_ticks,
    };
    store.next_story_id += 1;
    store.stories.push(story.clone());
    state.envelope(StatusCode::OK, "UserStory created", json!(story))
}

async fn update_story(State(state): State<AppState>, headers: HeaderMap, Json(input): Json<UserStory>) -> Response {
    if !authorized(&headers) {
        return state.unauthorized();
    }
    let mut store = state.store.write().await;
    let Some(story) = store.stories.iter_mut().find(|s| s.id == input.id) else {
        return state.not_found("UserStory");
    };
    *story = input;
    let updated = story.clone();
    state.envelope(StatusCode::OK, "UserStory updated", json!(updated))
}

async fn delete_story(State(state): State<AppState>, Path(id): Path<i64>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return state.unauthorized();
    }
    let mut store = state.store.write().await;
    let before = store.stories.len();
    store.stories.retain(|s| s.id != id);
    if store.stories.len() == before {
        return state.not_found("UserStory");
    }
    state.envelope(StatusCode::OK, "UserStory deleted", Value::Null)
}

// --- users ---

async fn list_users(State(state): State<AppState>, Query(query): Query<HashMap<String, String>>) -> Response {
    let store = state.store.read().await;
    let username = query.get("username");
    let email = query.get("email");

    let items: Vec<Value> = store
        .users
        .iter()
        .filter(|u| username.is_none_or(|n| contains_ci(&u.username, n)))
        .filter(|u| email.is_none_or(|e| contains_ci(&u.email, e)))
        .map(User::public)
        .collect();
    state.page("users", items, &query)
}

async fn get_user(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let store = state.store.read().await;
    match store.users.iter().find(|u| u.id == id) {
        Some(user) => state.envelope(StatusCode::OK, "User found", user.public()),
        None => state.not_found("User"),
    }
}

async fn update_user(State(state): State<AppState>, headers: HeaderMap, Json(input): Json<Value>) -> Response {
    if !authorized(&headers) {
        return state.unauthorized();
    }
    let Some(id) = input.get("id").and_then(Value::as_i64) else {
        return state.envelope(StatusCode::BAD_REQUEST, "Missing id", Value::Null);
    };
    let mut store = state.store.write().await;
    let Some(user) = store.users.iter_mut().find(|u| u.id == id) else {
        return state.not_found("User");
    };
    if let Some(gender) = input.get("gender").and_then(Value::as_u64).and_then(|g| u8::try_from(g).ok()) {
        user.gender = gender;
    }
    if let Some(localization) = input.get("localization").and_then(Value::as_str) {
        user.localization = localization.to_string();
    }
    let updated = user.clone();
    state.envelope(StatusCode::OK, "User updated", json!(updated))
}

async fn delete_user(State(state): State<AppState>, Path(id): Path<i64>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return state.unauthorized();
    }
    let mut store = state.store.write().await;
    let before = store.users.len();
    store.users.retain(|u| u.id != id);
    if store.users.len() == before {
        return state.not_found("User");
    }
    state.envelope(StatusCode::OK, "User deleted", Value::Null)
}

async fn auth_me(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return state.unauthorized();
    }
    let store = state.store.read().await;
    match store.users.first() {
        Some(user) => state.envelope(StatusCode::OK, "Me", json!(user)),
        None => state.not_found("User"),
    }
}
