//! Every client operation against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port in a background runtime, then
//! drives the client through `UreqTransport` over real HTTP. Checks that
//! request building, query encoding, decoding and rate-limit extraction agree
//! with the server end to end.

use aniapi_core::{
    AniApiClient, ApiError, ClientConfig, NewUserStory, Params, Payload, ResourceKind, SongType, UreqTransport,
    UserGender, UserStoryStatus, UserStoryUpdate,
};

/// Start a fresh mock server and return its base URL.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn client(base_url: &str, token: Option<&str>) -> AniApiClient<UreqTransport> {
    let mut config = ClientConfig::default().with_base_url(base_url);
    if let Some(token) = token {
        config = config.with_token(token);
    }
    AniApiClient::with_ureq(config)
}

#[test]
fn read_only_endpoints() {
    let base = start_server();
    let api = client(&base, None);

    // Step 1: single anime.
    let ctx = api.get_anime(1).unwrap();
    assert_eq!(ctx.status_code(), 200);
    assert_eq!(ctx.message(), "Anime found");
    assert_eq!(ctx.version(), "1");
    let anime = ctx.data().and_then(Payload::as_single).unwrap();
    assert_eq!(anime.title("en"), Some("Cowboy Bebop"));
    let ratelimit = ctx.ratelimit().unwrap();
    assert_eq!(ratelimit.limit(), Some("90"));
    assert!(ratelimit.remaining().is_some());

    let ctx = api.get_anime_with(3, &Params::new().set("with_episodes", true)).unwrap();
    assert_eq!(ctx.data().and_then(Payload::as_single).unwrap().title("en"), Some("Trigun"));

    // Step 2: missing anime stays a context.
    let ctx = api.get_anime(999).unwrap();
    assert_eq!(ctx.status_code(), 404);
    assert!(ctx.data().is_none());

    // Step 3: filtered, paginated listing with comma-joined lists.
    let params = Params::new()
        .set("genres", vec!["Action", "Sci-Fi"])
        .set("per_page", 1)
        .set("page", 2);
    let ctx = api.list_anime(&params).unwrap();
    let page = ctx.data().and_then(Payload::as_page).unwrap();
    assert_eq!(page.current_page(), 2);
    assert_eq!(page.count(), 1);
    assert_eq!(page.last_page(), Some(2));
    assert_eq!(page.documents()[0].id, Some(2));
    assert!(!page.has_next());

    // Step 4: title with a space survives encoding.
    let ctx = api.list_anime(&Params::new().set("title", "cowboy bebop")).unwrap();
    assert_eq!(ctx.data().and_then(Payload::as_page).unwrap().count(), 2);

    // Step 5: random anime is a flat list.
    let ctx = api.get_random_anime(2, false).unwrap();
    assert_eq!(ctx.data().and_then(Payload::as_list).unwrap().len(), 2);

    // Step 6: episodes and songs.
    let ctx = api.list_episodes(&Params::new().set("anime_id", 1).set("is_dub", true)).unwrap();
    let episodes = ctx.data().and_then(Payload::as_page).unwrap();
    assert_eq!(episodes.documents()[0].locale.as_deref(), Some("it"));

    let ctx = api.get_song(1).unwrap();
    let song = ctx.data().and_then(Payload::as_single).unwrap();
    assert_eq!(song.song_type, Some(SongType::Opening));

    let ctx = api.list_songs(&Params::new().set("type", 1)).unwrap();
    assert_eq!(ctx.data().and_then(Payload::as_page).unwrap().count(), 1);

    let ctx = api.get_random_song(50).unwrap();
    assert_eq!(ctx.data().and_then(Payload::as_list).unwrap().len(), 3);

    // Step 7: resources.
    let ctx = api.get_resources("1.0", ResourceKind::Locales).unwrap();
    let resources = ctx.data().and_then(Payload::as_single).unwrap();
    assert!(resources.locales.contains(&"it".to_string()));

    // Step 8: public user view.
    let ctx = api.get_user(1).unwrap();
    let user = ctx.data().and_then(Payload::as_single).unwrap();
    assert_eq!(user.username.as_deref(), Some("spike"));
    let ctx = api.list_users(&Params::new().set("email", "faye")).unwrap();
    assert_eq!(ctx.data().and_then(Payload::as_page).unwrap().count(), 1);
}

#[test]
fn pre_flight_errors_never_reach_the_server() {
    let api = client("http://127.0.0.1:9", None);

    assert!(matches!(
        api.list_anime(&Params::new().set("studio", "Sunrise")),
        Err(ApiError::InvalidParameters { .. })
    ));
    assert!(matches!(api.get_random_anime(51, false), Err(ApiError::Range { .. })));
    assert!(matches!(api.get_anime(1), Err(ApiError::Transport(_))));
}

#[test]
fn authenticated_lifecycle() {
    let base = start_server();

    // Step 1: without a token, auth_me is a 401 context.
    let anonymous = client(&base, None);
    let ctx = anonymous.auth_me("").unwrap();
    assert_eq!(ctx.status_code(), 401);
    assert!(ctx.data().is_none());

    // Step 2: with a token, the confidential view comes back.
    let api = client(&base, Some(mock_server::VALID_TOKEN));
    let ctx = api.auth_me(mock_server::VALID_TOKEN).unwrap();
    let me = ctx.data().and_then(Payload::as_single).unwrap();
    assert_eq!(me.email.as_deref(), Some("spike@bebop.invalid"));
    assert_eq!(me.user.gender, Some(UserGender::Male));

    // Step 3: create a story.
    let ctx = api
        .create_user_story(&NewUserStory {
            user_id: 2,
            anime_id: 3,
            status: UserStoryStatus::Planning,
            current_episode: None,
            current_episode_ticks: None,
        })
        .unwrap();
    let created = ctx.data().and_then(Payload::as_single).unwrap();
    let id = created.id.unwrap();
    assert_eq!(created.status, Some(UserStoryStatus::Planning));

    // Step 4: update it.
    let ctx = api
        .update_user_story(&UserStoryUpdate {
            id,
            user_id: 2,
            anime_id: 3,
            status: UserStoryStatus::Current,
            current_episode: 7,
            current_episode_ticks: 1_000,
        })
        .unwrap();
    let updated = ctx.data().and_then(Payload::as_single).unwrap();
    assert_eq!(updated.current_episode, Some(7));

    // Step 5: it shows up in the user's listing.
    let ctx = api.list_user_stories(&Params::new().set("user_id", 2)).unwrap();
    assert_eq!(ctx.data().and_then(Payload::as_page).unwrap().count(), 1);

    // Step 6: delete, then it is gone.
    let ctx = api.delete_user_story(id).unwrap();
    assert_eq!(ctx.status_code(), 200);
    let ctx = api.get_user_story(id).unwrap();
    assert_eq!(ctx.status_code(), 404);

    // Step 7: update and delete a user.
    let ctx = api
        .update_user(2, UserGender::Female, &Params::new().set("localization", "it"))
        .unwrap();
    let user = ctx.data().and_then(Payload::as_single).unwrap();
    assert_eq!(user.localization.as_deref(), Some("it"));

    assert_eq!(api.delete_user(2).unwrap().status_code(), 200);
    assert_eq!(api.get_user(2).unwrap().status_code(), 404);

    // Step 8: the same mutation without a token is refused by the server.
    let ctx = anonymous.delete_user(1).unwrap();
    assert_eq!(ctx.status_code(), 401);
}
