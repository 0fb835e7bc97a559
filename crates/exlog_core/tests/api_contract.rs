use exlog_core::api::{self, ApiReply, Body, Method};
use exlog_core::db::open_db_in_memory;
use exlog_core::{
    EntryId, EntryRangeFilter, ExerciseEntry, ExerciseService, SqliteStore, Store, StoreError,
    StoreResult, User, UserId,
};
use rusqlite::Connection;
use serde_json::{json, Value};

fn service(conn: &Connection) -> ExerciseService<SqliteStore<'_>> {
    ExerciseService::new(SqliteStore::try_new(conn).unwrap())
}

fn json_body(reply: &ApiReply) -> Value {
    match &reply.body {
        Body::Json(text) => serde_json::from_str(text).unwrap(),
        Body::Text(text) => panic!("expected JSON body, got text `{text}` ({})", reply.status),
    }
}

fn text_body(reply: &ApiReply) -> &str {
    match &reply.body {
        Body::Text(text) => text,
        Body::Json(text) => panic!("expected text body, got JSON `{text}`"),
    }
}

fn create_user(service: &ExerciseService<SqliteStore<'_>>, username: &str) -> String {
    let reply = api::dispatch(
        service,
        Method::Post,
        "/api/exercise/new-user",
        json!({ "username": username }),
    );
    assert_eq!(reply.status, 200);
    json_body(&reply)["id"].as_str().unwrap().to_string()
}

#[test]
fn alice_runs_in_january() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let created = api::dispatch(
        &service,
        Method::Post,
        "/api/exercise/new-user",
        json!({ "username": "alice" }),
    );
    assert_eq!(created.status, 200);
    assert_eq!(created.content_type(), "application/json");
    let user = json_body(&created);
    let user_id = user["id"].as_str().unwrap().to_string();
    assert_eq!(user, json!({ "id": user_id, "username": "alice" }));

    let added = api::dispatch(
        &service,
        Method::Post,
        "/api/exercise/add",
        json!({
            "userId": user_id,
            "description": "run",
            "durationMinutes": 30,
            "date": "2023-01-10"
        }),
    );
    assert_eq!(added.status, 200);
    assert_eq!(
        json_body(&added),
        json!({
            "userId": user_id,
            "username": "alice",
            "description": "run",
            "durationMinutes": 30,
            "date": "2023-01-10"
        })
    );

    let log = api::dispatch(
        &service,
        Method::Get,
        "/api/exercise/log",
        json!({
            "userId": user_id,
            "from": "2023-01-01",
            "to": "2023-02-01",
            "limit": "10"
        }),
    );
    assert_eq!(log.status, 200);
    assert_eq!(
        json_body(&log),
        json!({
            "user": { "id": user_id, "username": "alice" },
            "entries": [
                { "description": "run", "durationMinutes": 30, "date": "2023-01-10" }
            ]
        })
    );
}

#[test]
fn list_users_returns_id_and_username_projection() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let alice = create_user(&service, "alice");
    let bob = create_user(&service, "bob");

    let reply = api::dispatch(&service, Method::Get, "/api/exercise/users", Value::Null);
    assert_eq!(reply.status, 200);
    assert_eq!(
        json_body(&reply),
        json!([
            { "id": alice, "username": "alice" },
            { "id": bob, "username": "bob" }
        ])
    );
}

#[test]
fn add_entry_accepts_form_style_strings_and_legacy_duration_field() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user_id = create_user(&service, "alice");

    let reply = api::dispatch(
        &service,
        Method::Post,
        "/api/exercise/add",
        json!({
            "userId": user_id,
            "description": "row",
            "duration": "45",
            "date": "2023-03-05T07:15:00+01:00"
        }),
    );
    assert_eq!(reply.status, 200);
    let body = json_body(&reply);
    assert_eq!(body["durationMinutes"], 45);
    assert_eq!(body["date"], "2023-03-05T06:15:00.000Z");
}

#[test]
fn blank_date_defaults_to_now() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user_id = create_user(&service, "alice");

    let reply = api::dispatch(
        &service,
        Method::Post,
        "/api/exercise/add",
        json!({ "userId": user_id, "description": "walk", "durationMinutes": 5, "date": "" }),
    );
    assert_eq!(reply.status, 200);
    let rendered = json_body(&reply)["date"].as_str().unwrap().to_string();
    assert!(rendered.parse::<exlog_core::EntryDate>().is_ok());
}

#[test]
fn validation_failures_map_to_400_with_first_field_message() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user_id = create_user(&service, "alice");

    let blank_user = api::dispatch(
        &service,
        Method::Post,
        "/api/exercise/new-user",
        json!({ "username": "" }),
    );
    assert_eq!(blank_user.status, 400);
    assert_eq!(blank_user.content_type(), "text/plain; charset=utf-8");
    assert_eq!(text_body(&blank_user), "username is required");

    let negative = api::dispatch(
        &service,
        Method::Post,
        "/api/exercise/add",
        json!({ "userId": user_id, "description": "run", "durationMinutes": -5 }),
    );
    assert_eq!(negative.status, 400);
    assert_eq!(
        text_body(&negative),
        "durationMinutes must be positive, got -5"
    );

    let everything_missing = api::dispatch(
        &service,
        Method::Post,
        "/api/exercise/add",
        json!({ "userId": user_id }),
    );
    assert_eq!(everything_missing.status, 400);
    assert_eq!(text_body(&everything_missing), "description is required");

    let bad_date = api::dispatch(
        &service,
        Method::Post,
        "/api/exercise/add",
        json!({ "userId": user_id, "description": "run", "durationMinutes": "abc", "date": "nope" }),
    );
    assert_eq!(bad_date.status, 400);
    assert!(text_body(&bad_date).starts_with("durationMinutes"));
}

#[test]
fn log_requires_user_id_and_valid_filters() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user_id = create_user(&service, "alice");

    let missing = api::dispatch(&service, Method::Get, "/api/exercise/log", json!({}));
    assert_eq!(missing.status, 400);
    assert_eq!(text_body(&missing), "userId is required");

    let bad_limit = api::dispatch(
        &service,
        Method::Get,
        "/api/exercise/log",
        json!({ "userId": user_id, "limit": "0" }),
    );
    assert_eq!(bad_limit.status, 400);

    let bad_from = api::dispatch(
        &service,
        Method::Get,
        "/api/exercise/log",
        json!({ "userId": user_id, "from": "soon" }),
    );
    assert_eq!(bad_from.status, 400);
    assert_eq!(text_body(&bad_from), "from `soon` is not a valid date");
}

#[test]
fn unknown_users_map_to_404() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let ghost = uuid::Uuid::new_v4().to_string();

    let log = api::dispatch(
        &service,
        Method::Get,
        "/api/exercise/log",
        json!({ "userId": ghost }),
    );
    assert_eq!(log.status, 404);
    assert!(text_body(&log).contains(&ghost));

    let add = api::dispatch(
        &service,
        Method::Post,
        "/api/exercise/add",
        json!({ "userId": ghost, "description": "run", "durationMinutes": 30 }),
    );
    assert_eq!(add.status, 404);
}

#[test]
fn unmatched_routes_reply_plain_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    for (method, path) in [
        (Method::Get, "/api/exercise/unknown"),
        (Method::Get, "/api/exercise/new-user"),
        (Method::Post, "/api/exercise/log"),
    ] {
        let reply = api::dispatch(&service, method, path, Value::Null);
        assert_eq!(reply.status, 404);
        assert_eq!(text_body(&reply), "not found");
    }
}

#[test]
fn malformed_payload_shapes_are_bad_requests() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let reply = api::dispatch(
        &service,
        Method::Post,
        "/api/exercise/new-user",
        json!({ "username": ["not", "a", "string"] }),
    );
    assert_eq!(reply.status, 400);
    assert!(text_body(&reply).starts_with("malformed request"));
}

/// Store whose every call fails with a detailed persistence error.
struct UnavailableStore;

const STORE_FAILURE_DETAIL: &str = "row 7 has a corrupted username column";

fn unavailable<T>() -> StoreResult<T> {
    Err(StoreError::InvalidData(STORE_FAILURE_DETAIL.to_string()))
}

impl Store for UnavailableStore {
    fn insert_user(&self, _user: &User) -> StoreResult<UserId> {
        unavailable()
    }

    fn find_user(&self, _id: UserId) -> StoreResult<Option<User>> {
        unavailable()
    }

    fn list_users(&self) -> StoreResult<Vec<User>> {
        unavailable()
    }

    fn insert_entry(&self, _entry: &ExerciseEntry) -> StoreResult<EntryId> {
        unavailable()
    }

    fn find_entry(&self, _id: EntryId) -> StoreResult<Option<ExerciseEntry>> {
        unavailable()
    }

    fn find_entries(&self, _filter: &EntryRangeFilter) -> StoreResult<Vec<ExerciseEntry>> {
        unavailable()
    }
}

#[test]
fn store_failures_map_to_500_with_generic_body() {
    let service = ExerciseService::new(UnavailableStore);

    let listed = api::dispatch(&service, Method::Get, "/api/exercise/users", Value::Null);
    assert_eq!(listed.status, 500);
    assert_eq!(listed.content_type(), "text/plain; charset=utf-8");
    assert_eq!(text_body(&listed), "internal server error");

    let created = api::dispatch(
        &service,
        Method::Post,
        "/api/exercise/new-user",
        json!({ "username": "alice" }),
    );
    assert_eq!(created.status, 500);
    assert_eq!(text_body(&created), "internal server error");
    assert!(!created.body_text().contains(STORE_FAILURE_DETAIL));
}

#[test]
fn bare_year_bounds_and_oversized_limits_are_honoured() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user_id = create_user(&service, "alice");

    for date in ["2022-12-31", "2023-06-01", "2024-02-01"] {
        let added = api::dispatch(
            &service,
            Method::Post,
            "/api/exercise/add",
            json!({ "userId": user_id, "description": "run", "durationMinutes": 30, "date": date }),
        );
        assert_eq!(added.status, 200);
    }

    let log = api::dispatch(
        &service,
        Method::Get,
        "/api/exercise/log",
        json!({ "userId": user_id, "from": "2023", "to": "2024", "limit": "5000000000" }),
    );
    assert_eq!(log.status, 200);
    let entries = json_body(&log)["entries"].clone();
    assert_eq!(
        entries,
        json!([{ "description": "run", "durationMinutes": 30, "date": "2023-06-01" }])
    );
}

#[test]
fn far_future_dates_are_rejected_before_storage() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user_id = create_user(&service, "alice");

    let reply = api::dispatch(
        &service,
        Method::Post,
        "/api/exercise/add",
        json!({ "userId": user_id, "description": "run", "durationMinutes": 30, "date": 253402300800001_i64 }),
    );
    assert_eq!(reply.status, 400);
    assert_eq!(
        text_body(&reply),
        "date `253402300800001` is not a valid date"
    );
}
