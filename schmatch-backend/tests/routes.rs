// cargo test -p schmatch-backend --test routes
use bytes::Bytes;
use http::header::{CONTENT_TYPE, IF_NONE_MATCH};
use http::{Method, Request, StatusCode};
use http_body_util::{BodyExt as _, Full};
use schmatch_backend::{handle, setup_server, AppState};
use schmatch_config::Config;
use schmatch_database::models::{Match, Resource, Side};
use schmatch_database::queries::{all_resources, all_slots, matches_of};
use tempfile::TempDir;

struct TestServer {
    state: AppState,
    // keeps the database directory alive
    _directory: TempDir,
}

impl TestServer {
    fn new() -> Self {
        let directory = tempfile::tempdir().unwrap();
        let config = Config {
            instance_path: directory.path().join("instance"),
            ..Config::default()
        };
        Self {
            state: setup_server(&config).unwrap(),
            _directory: directory,
        }
    }

    async fn send(&self, method: Method, uri: &str, form: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Full::new(Bytes::from(form.to_owned())))
            .unwrap();
        let response = handle(request, self.state.clone()).await;
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    async fn get(&self, uri: &str) -> (StatusCode, String) {
        self.send(Method::GET, uri, "").await
    }

    async fn post(&self, uri: &str, form: &str) -> (StatusCode, String) {
        self.send(Method::POST, uri, form).await
    }

    fn resources(&self) -> Vec<Resource> {
        let mut connection = self.state.pool().get().unwrap();
        all_resources(&mut connection).unwrap()
    }

    fn resource(&self, name: &str) -> Resource {
        self.resources()
            .into_iter()
            .find(|resource| resource.name == name)
            .unwrap()
    }

    fn slot_ids(&self) -> Vec<i32> {
        let mut connection = self.state.pool().get().unwrap();
        all_slots(&mut connection)
            .unwrap()
            .into_iter()
            .map(|slot| slot.id)
            .collect()
    }

    fn matches_of(&self, resource: &Resource) -> Vec<Match> {
        let mut connection = self.state.pool().get().unwrap();
        matches_of(&mut connection, resource).unwrap()
    }

    /// Alice (left), Bob and Carol (right), slots Monday and Tuesday.
    async fn with_fixture() -> Self {
        let server = Self::new();
        for form in [
            "name=Alice&side=left",
            "name=Bob&side=right",
            "name=Carol&side=right",
        ] {
            assert_eq!(server.post("/", form).await.0, StatusCode::OK);
        }
        for form in ["name=Monday", "name=Tuesday"] {
            assert_eq!(server.post("/slots", form).await.0, StatusCode::OK);
        }
        server
    }
}

#[tokio::test]
async fn slots_are_created_and_listed() {
    let server = TestServer::new();

    let (status, body) = server.get("/slots").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No slots yet."));

    let (status, body) = server.post("/slots", "name=Monday+9%3A00").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Monday 9:00"));

    let (_, body) = server.post("/slots", "name=Tuesday").await;
    assert!(body.contains("Monday 9:00"));
    assert!(body.contains("Tuesday"));
    assert_eq!(server.slot_ids().len(), 2);
}

#[tokio::test]
async fn slot_without_name_is_a_bad_request() {
    let server = TestServer::new();

    let (status, _) = server.post("/slots", "title=Monday").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(server.slot_ids().is_empty());
}

#[tokio::test]
async fn only_the_left_literal_creates_left_resources() {
    let server = TestServer::new();

    for form in [
        "name=Alice&side=left",
        "name=Bob&side=right",
        "name=Carol&side=LEFT",
        "name=Dave&side=",
    ] {
        let (status, _) = server.post("/", form).await;
        assert_eq!(status, StatusCode::OK);
    }

    let sides: Vec<(String, Side)> = server
        .resources()
        .into_iter()
        .map(|resource| (resource.name.clone(), resource.side()))
        .collect();
    assert_eq!(
        sides,
        [
            ("Alice".to_owned(), Side::Left),
            ("Bob".to_owned(), Side::Right),
            ("Carol".to_owned(), Side::Right),
            ("Dave".to_owned(), Side::Right),
        ]
    );

    let (_, body) = server.get("/").await;
    let alice = server.resource("Alice");
    assert!(body.contains(&format!("href=\"/schedules/{}\"", alice.id)));
}

#[tokio::test]
async fn resource_names_are_escaped() {
    let server = TestServer::new();

    let (_, body) = server
        .post("/", "name=%3Cscript%3Ealert(1)%3C%2Fscript%3E&side=left")
        .await;

    assert!(!body.contains("<script>alert(1)</script>"));
    assert!(body.contains("&lt;script&gt;"));
}

#[tokio::test]
async fn schedule_lists_available_counterparts() {
    let server = TestServer::with_fixture().await;
    let alice = server.resource("Alice");

    let (status, body) = server.get(&format!("/schedules/{}", alice.id)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Schedule for Alice"));
    assert!(body.contains("Monday"));
    assert!(body.contains("Tuesday"));
    assert!(body.contains(">Bob</option>"));
    assert!(body.contains(">Carol</option>"));
    assert!(!body.contains(">Alice</option>"));
}

#[tokio::test]
async fn submitting_a_schedule_binds_and_replaces() {
    let server = TestServer::with_fixture().await;
    let alice = server.resource("Alice");
    let bob = server.resource("Bob");
    let slots = server.slot_ids();
    let uri = format!("/schedules/{}", alice.id);

    let (status, body) = server
        .post(
            &uri,
            &format!("slot_{}={}&slot_{}=none", slots[0], bob.id, slots[1]),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(&format!("value=\"{}\" selected", bob.id)));
    let bound = server.matches_of(&alice);
    assert_eq!(bound.len(), 1);
    assert_eq!(bound[0].slot_id, slots[0]);
    assert_eq!(bound[0].left_resource_id, Some(alice.id));
    assert_eq!(bound[0].right_resource_id, Some(bob.id));
    // both sides report the same match
    assert_eq!(server.matches_of(&bob), bound);

    // bob is taken on monday, so nobody else on the left may pick him
    let (status, _) = server.post("/", "name=Room&side=left").await;
    assert_eq!(status, StatusCode::OK);
    let room = server.resource("Room");
    let (_, body) = server.get(&format!("/schedules/{}", room.id)).await;
    assert_eq!(body.matches(">Bob</option>").count(), 1);

    let (status, _) = server.post(&uri, &format!("slot_{}=none", slots[0])).await;
    assert_eq!(status, StatusCode::OK);
    assert!(server.matches_of(&alice).is_empty());
    assert!(server.matches_of(&bob).is_empty());
}

#[tokio::test]
async fn schedule_from_the_right_side() {
    let server = TestServer::with_fixture().await;
    let alice = server.resource("Alice");
    let carol = server.resource("Carol");
    let slots = server.slot_ids();

    let (status, body) = server
        .post(
            &format!("/schedules/{}", carol.id),
            &format!("slot_{}={}", slots[1], alice.id),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(&format!("value=\"{}\" selected", alice.id)));
    let bound = server.matches_of(&alice);
    assert_eq!(bound.len(), 1);
    assert_eq!(bound[0].slot_id, slots[1]);
    assert_eq!(bound[0].right_resource_id, Some(carol.id));
}

#[tokio::test]
async fn custom_description_creates_an_unpaired_match() {
    let server = TestServer::with_fixture().await;
    let alice = server.resource("Alice");
    let slots = server.slot_ids();

    let (status, body) = server
        .post(
            &format!("/schedules/{}", alice.id),
            &format!(
                "slot_{0}=custom&description_{0}=Dentist&slot_{1}=none&description_{1}=ignored",
                slots[0], slots[1]
            ),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("value=\"custom\" selected"));
    assert!(body.contains("value=\"Dentist\""));
    assert!(!body.contains("value=\"ignored\""));
    let bound = server.matches_of(&alice);
    assert_eq!(bound.len(), 1);
    assert_eq!(bound[0].right_resource_id, None);
    assert_eq!(bound[0].description.as_deref(), Some("Dentist"));
}

#[tokio::test]
async fn unknown_resource_is_not_found() {
    let server = TestServer::with_fixture().await;
    let slots = server.slot_ids();

    let (status, body) = server.get("/schedules/4711").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("4711"));

    let (status, _) = server
        .post("/schedules/4711", &format!("slot_{}=none", slots[0]))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_targets_keep_the_previous_schedule() {
    let server = TestServer::with_fixture().await;
    let alice = server.resource("Alice");
    let bob = server.resource("Bob");
    let slots = server.slot_ids();
    let uri = format!("/schedules/{}", alice.id);
    server
        .post(&uri, &format!("slot_{}={}", slots[0], bob.id))
        .await;

    let (status, _) = server.post(&uri, &format!("slot_{}=Bob", slots[0])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server
        .post(&uri, &format!("slot_{}=4711", slots[0]))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(server.matches_of(&alice).len(), 1);
}

#[tokio::test]
async fn double_booking_is_a_conflict() {
    let server = TestServer::with_fixture().await;
    let alice = server.resource("Alice");
    let bob = server.resource("Bob");
    let slots = server.slot_ids();
    server
        .post(
            &format!("/schedules/{}", alice.id),
            &format!("slot_{}={}", slots[0], bob.id),
        )
        .await;
    server.post("/", "name=Room&side=left").await;
    let room = server.resource("Room");

    let (status, _) = server
        .post(
            &format!("/schedules/{}", room.id),
            &format!("slot_{}={}", slots[0], bob.id),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(server.matches_of(&room).is_empty());
    assert_eq!(server.matches_of(&bob).len(), 1);
}

#[tokio::test]
async fn unknown_routes_and_methods() {
    let server = TestServer::new();

    assert_eq!(server.get("/nothing").await.0, StatusCode::NOT_FOUND);
    assert_eq!(server.get("/schedules/abc").await.0, StatusCode::NOT_FOUND);
    assert_eq!(
        server.send(Method::DELETE, "/slots", "").await.0,
        StatusCode::METHOD_NOT_ALLOWED
    );
    assert_eq!(
        server.post("/static/schmatch.js", "").await.0,
        StatusCode::METHOD_NOT_ALLOWED
    );
}

#[tokio::test]
async fn script_is_served_and_cached() {
    let server = TestServer::new();

    let (status, body) = server.get("/static/schmatch.js").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("description_"));

    let request = Request::builder()
        .uri("/static/schmatch.js")
        .header(IF_NONE_MATCH, "\"schmatch-js-1\"")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let response = handle(request, server.state.clone()).await;
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
}

#[tokio::test]
async fn fields_for_unknown_slots_are_ignored() {
    let server = TestServer::with_fixture().await;
    let alice = server.resource("Alice");
    let bob = server.resource("Bob");

    let (status, _) = server
        .post(
            &format!("/schedules/{}", alice.id),
            &format!("slot_4711={}", bob.id),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(server.matches_of(&alice).is_empty());
    assert!(server.matches_of(&bob).is_empty());
}

#[tokio::test]
async fn head_is_answered_like_get() {
    let server = TestServer::with_fixture().await;
    let alice = server.resource("Alice");

    for uri in [
        "/".to_owned(),
        "/slots".to_owned(),
        format!("/schedules/{}", alice.id),
        "/static/schmatch.js".to_owned(),
    ] {
        let (status, _) = server.send(Method::HEAD, &uri, "").await;
        assert_eq!(status, StatusCode::OK, "HEAD {uri}");
    }
    assert_eq!(
        server.send(Method::HEAD, "/schedules/4711", "").await.0,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn stored_same_side_pairing_stays_selected() {
    let server = TestServer::with_fixture().await;
    let alice = server.resource("Alice");
    server.post("/", "name=Room&side=left").await;
    let room = server.resource("Room");
    let slots = server.slot_ids();
    let uri = format!("/schedules/{}", alice.id);

    let (status, body) = server
        .post(&uri, &format!("slot_{}={}", slots[0], room.id))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(&format!("value=\"{}\" selected>Room</option>", room.id)));
    // only the other slot falls back to none
    assert_eq!(body.matches("value=\"none\" selected").count(), 1);
    assert_eq!(server.matches_of(&alice).len(), 1);
}
