use exlog_core::db::open_db_in_memory;
use exlog_core::{
    DateRange, EntryDate, EntryLimit, ExerciseService, LogQuery, NewEntry, ServiceError,
    SqliteStore, User,
};
use rusqlite::Connection;
use uuid::Uuid;

fn service(conn: &Connection) -> ExerciseService<SqliteStore<'_>> {
    ExerciseService::new(SqliteStore::try_new(conn).unwrap())
}

fn date(value: &str) -> EntryDate {
    value.parse().unwrap()
}

fn log_entries(service: &ExerciseService<SqliteStore<'_>>, user: &User, dates: &[&str]) {
    for (index, day) in dates.iter().enumerate() {
        service
            .add_entry(NewEntry {
                user_id: user.id,
                description: format!("session-{index}"),
                duration_minutes: 20 + i64::try_from(index).unwrap(),
                date: Some(date(day)),
            })
            .unwrap();
    }
}

#[test]
fn get_log_returns_only_entries_strictly_inside_the_range() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let alice = service.create_user("alice").unwrap();
    log_entries(
        &service,
        &alice,
        &[
            "2022-12-31",
            "2023-01-01",
            "2023-01-15",
            "2023-01-31T23:59:59.999Z",
            "2023-02-01",
        ],
    );

    let from = date("2023-01-01");
    let to = date("2023-02-01");
    let log = service
        .get_log(&LogQuery {
            user_id: alice.id,
            range: DateRange {
                from: Some(from),
                to: Some(to),
            },
            limit: EntryLimit::Unbounded,
        })
        .unwrap();

    assert_eq!(log.entries.len(), 2);
    for entry in &log.entries {
        assert_eq!(entry.user_id, alice.id);
        assert!(from < entry.date && entry.date < to);
    }
}

#[test]
fn get_log_never_exceeds_the_limit() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let alice = service.create_user("alice").unwrap();
    log_entries(
        &service,
        &alice,
        &["2023-01-03", "2023-01-01", "2023-01-02", "2023-01-04"],
    );

    for cap in 1..=5 {
        let log = service
            .get_log(&LogQuery {
                limit: EntryLimit::at_most(cap).unwrap(),
                ..LogQuery::all(alice.id)
            })
            .unwrap();
        assert_eq!(log.entries.len(), usize::try_from(cap.min(4)).unwrap());
        let dates: Vec<_> = log.entries.iter().map(|entry| entry.date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
    }
}

#[test]
fn get_log_without_filters_returns_every_entry_of_the_user() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let alice = service.create_user("alice").unwrap();
    let bob = service.create_user("bob").unwrap();
    log_entries(&service, &alice, &["1970-01-01T00:00:00.001Z", "2023-06-01", "2999-12-31"]);
    log_entries(&service, &bob, &["2023-06-01"]);

    let log = service.get_log(&LogQuery::all(alice.id)).unwrap();
    assert_eq!(log.user, alice);
    assert_eq!(log.entries.len(), 3);
}

#[test]
fn get_log_with_inverted_range_is_empty() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let alice = service.create_user("alice").unwrap();
    log_entries(&service, &alice, &["2023-01-15"]);

    let log = service
        .get_log(&LogQuery {
            range: DateRange {
                from: Some(date("2023-02-01")),
                to: Some(date("2023-01-01")),
            },
            ..LogQuery::all(alice.id)
        })
        .unwrap();
    assert_eq!(log.user, alice);
    assert!(log.entries.is_empty());
}

#[test]
fn get_log_for_unknown_user_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let missing = Uuid::new_v4();
    let err = service.get_log(&LogQuery::all(missing)).unwrap_err();
    assert!(matches!(err, ServiceError::UserNotFound(id) if id == missing));
}

#[test]
fn get_log_is_deterministic_for_a_fixed_store() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let alice = service.create_user("alice").unwrap();
    log_entries(
        &service,
        &alice,
        &["2023-01-02", "2023-01-02", "2023-01-01", "2023-01-03"],
    );

    let query = LogQuery {
        limit: EntryLimit::AtMost(3),
        ..LogQuery::all(alice.id)
    };
    let first = service.get_log(&query).unwrap();
    let second = service.get_log(&query).unwrap();
    assert_eq!(first, second);

    let names: Vec<_> = first
        .entries
        .iter()
        .map(|entry| entry.description.as_str())
        .collect();
    assert_eq!(names, ["session-2", "session-0", "session-1"]);
}
