//! Synchronous, typed client for the AniAPI v1 REST API.
//!
//! # Overview
//! Each operation on [`AniApiClient`] validates its parameters, performs one
//! HTTP round trip through a [`Transport`], decodes the JSON envelope and
//! returns a [`Context`] holding the status, message, API version, rate limit
//! and typed payload (a single record, a flat list, or a [`Page`]).
//!
//! # Design
//! - The transport is a trait. `UreqTransport` (default `ureq` feature) is a
//!   blocking implementation that opens a fresh connection per call; tests
//!   plug in recording transports instead.
//! - Records are plain serde structs with optional fields, so responses that
//!   gain or lose fields still decode.
//! - Non-200 envelopes are data, not errors. `ApiError` covers only pre-flight
//!   validation, transport failures and undecodable bodies.
//!
//! ```no_run
//! use aniapi_core::{AniApiClient, ClientConfig, Params, Payload};
//!
//! let client = AniApiClient::with_ureq(ClientConfig::from_env());
//! let ctx = client.list_anime(&Params::new().set("year", 1998))?;
//! if let Some(Payload::Page(page)) = ctx.data() {
//!     for anime in page.documents() {
//!         println!("{:?}", anime.title("en"));
//!     }
//! }
//! # Ok::<(), aniapi_core::ApiError>(())
//! ```

pub mod client;
pub mod config;
pub mod context;
pub mod decode;
pub mod error;
pub mod factory;
pub mod http;
pub mod params;
#[cfg(feature = "ureq")]
pub mod transport;
pub mod types;

pub use client::{AniApiClient, MAX_RANDOM_COUNT};
pub use config::ClientConfig;
pub use context::{Context, Page, Payload, RateLimit};
pub use error::{ApiError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
pub use params::{Endpoint, ParamValue, Params};
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use types::{
    AiringDay, Anime, AnimeFormat, AnimeStatus, ApiResources, Episode, NewUserStory, ResourceKind, Saga,
    SeasonPeriod, Song, SongType, UserBig, UserGender, UserRole, UserSmall, UserStory, UserStoryStatus,
    UserStoryUpdate,
};
