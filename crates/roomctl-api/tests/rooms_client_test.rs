// Integration tests for `RoomsClient` using wiremock.
#![allow(clippy::unwrap_used)]

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use roomctl_api::types::{PullStart, RoomEventAction, RoomSettings};
use roomctl_api::{BasicCredentials, Error, RoomsClient, ServerEvent, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, RoomsClient) {
    let server = MockServer::start().await;
    let client = RoomsClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    (server, client)
}

fn room_json(id: &str, name: &str, running: bool) -> serde_json::Value {
    json!({
        "id": id,
        "url": format!("http://rooms.local/{name}/"),
        "name": name,
        "neko_image": "m1k1o/neko:firefox",
        "is_outdated": false,
        "max_connections": 10,
        "running": running,
        "paused": false,
        "is_ready": running,
        "status": if running { "Up 3 minutes" } else { "Exited (0) 1 minute ago" },
        "created": "2024-05-01T10:00:00Z",
        "labels": { "team": "qa" }
    })
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_rooms_config() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/config/rooms"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "connections": 500,
            "neko_images": ["m1k1o/neko:firefox", "m1k1o/neko:chromium"],
            "storage_enabled": true,
            "uses_mux": false
        })))
        .mount(&server)
        .await;

    let config = client.rooms_config().await.unwrap();
    assert_eq!(config.connections, 500);
    assert_eq!(config.neko_images.len(), 2);
    assert!(config.storage_enabled);
    assert!(!config.uses_mux);
}

#[tokio::test]
async fn test_list_rooms_with_label_filter() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/rooms"))
        .and(query_param("team", "qa"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            room_json("aaa", "alpha", true),
            room_json("bbb", "beta", false),
        ])))
        .mount(&server)
        .await;

    let rooms = client
        .list_rooms(&[("team".into(), "qa".into())])
        .await
        .unwrap();
    assert_eq!(rooms.len(), 2);
    assert_eq!(rooms[0].name, "alpha");
    assert!(rooms[0].running);
    assert_eq!(rooms[1].id, "bbb");
    assert_eq!(rooms[1].labels.get("team").map(String::as_str), Some("qa"));
}

#[tokio::test]
async fn test_create_room_sends_settings_and_start_flag() {
    let (server, client) = setup().await;

    let settings = RoomSettings {
        name: "alpha".into(),
        neko_image: "m1k1o/neko:firefox".into(),
        max_connections: 10,
        screen: "1280x720@30".into(),
        ..RoomSettings::default()
    };

    Mock::given(method("POST"))
        .and(path("/api/rooms"))
        .and(query_param("start", "false"))
        .and(body_json(&settings))
        .respond_with(ResponseTemplate::new(200).set_body_json(room_json("aaa", "alpha", false)))
        .expect(1)
        .mount(&server)
        .await;

    let entry = client.create_room(&settings, false).await.unwrap();
    assert_eq!(entry.id, "aaa");
    assert!(!entry.running);
}

#[tokio::test]
async fn test_lifecycle_actions_accept_no_content() {
    let (server, client) = setup().await;

    for action in ["start", "stop", "pause", "restart"] {
        Mock::given(method("POST"))
            .and(path(format!("/api/rooms/aaa/{action}")))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
    }

    client.start_room("aaa").await.unwrap();
    client.stop_room("aaa").await.unwrap();
    client.pause_room("aaa").await.unwrap();
    client.restart_room("aaa").await.unwrap();
}

#[tokio::test]
async fn test_recreate_without_settings_sends_no_query() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/rooms/aaa/recreate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(room_json("ccc", "alpha", true)))
        .mount(&server)
        .await;

    let entry = client.recreate_room("aaa", None, None).await.unwrap();
    assert_eq!(entry.id, "ccc");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].url.query().is_none());
    assert!(requests[0].body.is_empty());
}

#[tokio::test]
async fn test_get_room_by_name() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/rooms/alpha/by-name"))
        .respond_with(ResponseTemplate::new(200).set_body_json(room_json("aaa", "alpha", true)))
        .mount(&server)
        .await;

    let entry = client.get_room_by_name("alpha").await.unwrap();
    assert_eq!(entry.id, "aaa");
}

#[tokio::test]
async fn test_room_name_is_encoded_as_one_segment() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/rooms/lobby"))
        .respond_with(ResponseTemplate::new(200).set_body_json(room_json("wrong", "lobby", true)))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/rooms/lobby%3Fx%2Fy/by-name"))
        .respond_with(ResponseTemplate::new(404).set_body_string("room not found"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/rooms/a%2F..%2Fb/stop"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.get_room_by_name("lobby?x/y").await.unwrap_err();
    assert!(err.is_not_found(), "{err:?}");
    client.stop_room("a/../b").await.unwrap();
}

#[tokio::test]
async fn test_room_stats() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/rooms/aaa/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "connections": 2,
            "host": "session-1",
            "members": [
                { "id": "session-1", "displayname": "alice", "admin": true, "muted": false },
                { "id": "session-2", "displayname": "bob", "admin": false, "muted": true }
            ],
            "banned": {},
            "locked": { "control": "session-1" },
            "server_started_at": "2024-05-01T10:00:00Z",
            "control_protection": true,
            "implicit_control": false
        })))
        .mount(&server)
        .await;

    let stats = client.room_stats("aaa").await.unwrap();
    assert_eq!(stats.connections, 2);
    assert_eq!(stats.members[0].display_name, "alice");
    assert!(stats.members[1].muted);
    assert!(stats.last_user_left_at.is_none());
}

#[tokio::test]
async fn test_pull_start_and_status() {
    let (server, client) = setup().await;

    let request = PullStart {
        neko_image: "m1k1o/neko:chromium".into(),
        ..PullStart::default()
    };

    Mock::given(method("POST"))
        .and(path("/api/pull"))
        .and(body_json(json!({ "neko_image": "m1k1o/neko:chromium" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "active": true,
            "started": "2024-05-01T10:00:00Z",
            "layers": [],
            "status": []
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/pull"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "active": false,
            "started": "2024-05-01T10:00:00Z",
            "layers": [{
                "status": "Pull complete",
                "progressDetail": { "current": 100, "total": 100 },
                "id": "f1"
            }],
            "status": ["Status: Downloaded newer image"],
            "finished": "2024-05-01T10:01:00Z"
        })))
        .mount(&server)
        .await;

    let started = client.pull_start(&request).await.unwrap();
    assert!(started.active);

    let status = client.pull_status().await.unwrap();
    assert!(!status.active);
    assert_eq!(status.layers[0].id, "f1");
    assert!(status.finished.is_some());
}

#[tokio::test]
async fn test_export_compose_returns_raw_text() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/docker-compose.yaml"))
        .respond_with(ResponseTemplate::new(200).set_body_string("version: \"3.4\"\nservices: {}\n"))
        .mount(&server)
        .await;

    let yaml = client.export_compose().await.unwrap();
    assert!(yaml.starts_with("version:"));
}

#[tokio::test]
async fn test_basic_credentials_are_sent() {
    let server = MockServer::start().await;
    let transport = TransportConfig {
        credentials: Some(BasicCredentials {
            username: "admin".into(),
            password: "secret".to_string().into(),
        }),
        ..TransportConfig::default()
    };
    let client = RoomsClient::new(&server.uri(), &transport).unwrap();

    Mock::given(method("DELETE"))
        .and(path("/api/rooms/aaa"))
        .and(header("authorization", "Basic YWRtaW46c2VjcmV0"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.remove_room("aaa").await.unwrap();
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_missing_room_is_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/rooms/nope"))
        .respond_with(ResponseTemplate::new(404).set_body_string("room not found\n"))
        .mount(&server)
        .await;

    let err = client.get_room("nope").await.unwrap_err();
    assert!(err.is_not_found());
    match err {
        Error::NotFound { message } => assert_eq!(message, "room not found"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_keeps_plain_text_message() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/rooms/aaa/start"))
        .respond_with(
            ResponseTemplate::new(500).set_body_string("Error response from daemon: no such image"),
        )
        .mount(&server)
        .await;

    let err = client.start_room("aaa").await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert!(err.is_transient());
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "Error response from daemon: no such image");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_json_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/pull"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&server)
        .await;

    let err = client.pull_status().await.unwrap_err();
    match err {
        Error::Deserialization { body, .. } => assert!(body.contains("proxy error")),
        other => panic!("expected Deserialization, got {other:?}"),
    }
}

// ── Event stream tests ──────────────────────────────────────────────

#[tokio::test]
async fn test_subscribe_events_reads_frames() {
    let (server, client) = setup().await;

    let body = concat!(
        ": ping\n\n",
        "event: rooms\n",
        "data: {\"id\":\"aaa\",\"action\":\"started\"}\n\n",
        "event: rooms\n",
        "data: {\"id\":\"aaa\",\"action\":\"ready\"}\n\n",
    );

    Mock::given(method("GET"))
        .and(path("/api/events"))
        .and(query_param("sse", ""))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body),
        )
        .mount(&server)
        .await;

    let mut sub = client.subscribe_events().await.unwrap();

    let mut actions = Vec::new();
    while let Some(item) = sub.next_event().await {
        if let ServerEvent::Rooms(event) = item.unwrap() {
            actions.push(event.action);
        }
    }
    assert_eq!(actions, vec![RoomEventAction::Started, RoomEventAction::Ready]);
}

#[tokio::test]
async fn test_subscribe_events_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/events"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let err = client.subscribe_events().await.unwrap_err();
    assert!(matches!(err, Error::EventStream(ref msg) if msg.contains("401")));
}
