///
/// # Handle Lifecycle Tests
///
/// Connections and results torn down in every order against a counting
/// mock driver: nothing is freed twice, no cursor outlives its session, and
/// invalidated handles fail cleanly.
///

mod common;

use common::{install_mock, Counters, MockBehavior, MOCK_TIMESTAMP};
use naml_std_core::{ExceptionKind, Value};
use naml_std_dbi::{ConnectOptions, Connection, ConnectionConfig, ErrorKind};

fn open_mock() -> (Connection, std::sync::Arc<Counters>) {
    let (name, counters) = install_mock(MockBehavior::default());
    let conn = Connection::open(&name, &ConnectOptions::new().with("dbname", "mock.db"))
        .expect("mock connection should open");
    (conn, counters)
}

#[test]
fn test_close_frees_cursors_before_session() {
    let (conn, counters) = open_mock();
    let a = conn.query("SELECT a", &Value::Undefined).unwrap().unwrap();
    let b = conn.query("SELECT b", &Value::Undefined).unwrap().unwrap();
    assert_eq!(conn.live_results(), 2);

    conn.close();
    assert_eq!(Counters::get(&counters.cursors_freed), 2);
    assert_eq!(Counters::get(&counters.sessions_closed), 1);
    assert_eq!(Counters::get(&counters.freed_after_close), 0);
    assert_eq!(conn.live_results(), 0);

    assert!(!a.is_valid());
    assert_eq!(b.get(0).unwrap_err().kind(), ErrorKind::InvalidHandle);

    drop(a);
    drop(b);
    drop(conn);
    assert_eq!(Counters::get(&counters.cursors_freed), 2);
    assert_eq!(Counters::get(&counters.sessions_closed), 1);
    assert_eq!(Counters::get(&counters.double_closes), 0);
}

#[test]
fn test_close_is_idempotent() {
    let (conn, counters) = open_mock();
    conn.close();
    conn.close();
    drop(conn);
    assert_eq!(Counters::get(&counters.sessions_closed), 1);
    assert_eq!(Counters::get(&counters.double_closes), 0);
}

#[test]
fn test_result_dropped_first() {
    let (conn, counters) = open_mock();
    let a = conn.query("SELECT a", &Value::Undefined).unwrap().unwrap();
    let b = conn.query("SELECT b", &Value::Undefined).unwrap().unwrap();

    drop(a);
    assert_eq!(Counters::get(&counters.cursors_freed), 1);
    assert_eq!(conn.live_results(), 1);
    assert!(conn.is_open());
    assert!(b.is_valid());

    drop(conn);
    assert!(!b.is_valid());
    assert_eq!(counters.live_cursors(), 0);
    drop(b);
    assert_eq!(Counters::get(&counters.cursors_freed), 2);
    assert_eq!(Counters::get(&counters.freed_after_close), 0);
}

#[test]
fn test_connection_dropped_first() {
    let (conn, counters) = open_mock();
    let results: Vec<_> = (0..5)
        .map(|i| conn.query(&format!("SELECT {}", i), &Value::Undefined).unwrap().unwrap())
        .collect();
    drop(conn);

    assert_eq!(Counters::get(&counters.cursors_freed), 5);
    assert_eq!(Counters::get(&counters.sessions_closed), 1);
    for res in &results {
        assert_eq!(res.advance().unwrap_err().to_string(), "Result handle is no longer valid");
        assert_eq!(res.field_count().unwrap_err().exception_kind(), ExceptionKind::DbError);
    }
    drop(results);
    assert_eq!(Counters::get(&counters.cursors_freed), 5);
}

#[test]
fn test_interleaved_drops_reuse_slots() {
    let (conn, counters) = open_mock();
    let first = conn.query("SELECT first", &Value::Undefined).unwrap().unwrap();
    drop(first);
    let second = conn.query("SELECT second", &Value::Undefined).unwrap().unwrap();
    let third = conn.query("SELECT third", &Value::Undefined).unwrap().unwrap();

    assert_eq!(conn.live_results(), 2);
    assert!(second.advance().unwrap());
    assert_eq!(second.get("sql").unwrap(), Value::from("SELECT second"));
    drop(third);
    assert_eq!(conn.live_results(), 1);
    assert_eq!(counters.live_cursors(), 1);
}

#[test]
fn test_exec_frees_cursor_immediately() {
    let (conn, counters) = open_mock();
    assert!(conn.exec("UPDATE t SET a = 1", &Value::Undefined).unwrap());
    assert_eq!(Counters::get(&counters.cursors_created), 1);
    assert_eq!(counters.live_cursors(), 0);
    assert_eq!(conn.live_results(), 0);
}

#[test]
fn test_query_failure_yields_nothing() {
    let (conn, counters) = open_mock();
    assert!(conn.query("FAIL", &Value::Undefined).unwrap().is_none());
    assert!(!conn.exec("FAIL", &Value::Undefined).unwrap());
    assert_eq!(Counters::get(&counters.cursors_created), 0);
    assert!(conn.is_open());
}

#[test]
fn test_closed_connection_rejects_queries() {
    let (conn, counters) = open_mock();
    conn.close();
    let err = conn.query("SELECT 1", &Value::Undefined).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidHandle);
    assert_eq!(err.to_string(), "Connection handle is no longer valid");
    assert!(conn.exec("SELECT 1", &Value::Undefined).is_err());
    assert_eq!(Counters::get(&counters.cursors_created), 0);
}

#[test]
fn test_parameters_reach_the_driver() {
    let (conn, _counters) = open_mock();
    let res = conn
        .query(
            "SELECT :name, :missing",
            &Value::object([("name", Value::from("it's"))]),
        )
        .unwrap()
        .unwrap();
    assert!(res.advance().unwrap());
    assert_eq!(res.get("sql").unwrap(), Value::from("SELECT 'it''s', NULL"));

    let res = conn
        .query("VALUES (?, ?, ?)", &Value::array([Value::Float(0.1), Value::Bool(true)]))
        .unwrap()
        .unwrap();
    res.advance().unwrap();
    assert_eq!(res.get(0).unwrap(), Value::from("VALUES (0.10000000000000001, 1, ?)"));
}

#[test]
fn test_column_marshalling() {
    let (conn, _counters) = open_mock();
    let res = conn.query("SELECT *", &Value::Undefined).unwrap().unwrap();
    assert!(res.advance().unwrap());

    assert_eq!(res.get("n").unwrap(), Value::Int(-1));
    assert_eq!(res.get("big").unwrap(), Value::UInt(u64::MAX));
    assert_eq!(res.get("ratio").unwrap(), Value::Float(0.25));
    assert_eq!(res.get("payload").unwrap(), Value::Bytes(vec![0xDE, 0xAD]));
    assert_eq!(res.get("when").unwrap(), Value::Date(MOCK_TIMESTAMP * 1000));
    assert_eq!(res.get("flag").unwrap(), Value::from("1"));
    assert_eq!(res.get("nothing").unwrap(), Value::Null);
    assert!(!res.get("big").unwrap().to_display_string().contains('e'));
}

#[test]
fn test_to_array_against_mock() {
    let (conn, _counters) = open_mock();
    let res = conn.query("SELECT *", &Value::Undefined).unwrap().unwrap();
    let rows = res.to_array(true).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].property("n"), &Value::Int(-1));
    assert_eq!(rows[1].property("n"), &Value::Int(-2));
    assert_eq!(rows[1].property("ratio"), &Value::Float(0.5));

    let empty = conn.query("SELECT EMPTY", &Value::Undefined).unwrap().unwrap();
    assert!(empty.to_array(false).unwrap().is_empty());
    assert_eq!(empty.row_count().unwrap(), 0);
}

#[test]
fn test_unknown_driver() {
    let err = Connection::open("nonexistent-driver", &ConnectOptions::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DriverResolution);
    assert_eq!(err.exception_kind(), ExceptionKind::InternalError);
    assert_eq!(err.to_string(), "Unable to load DBI driver 'nonexistent-driver'");
}

#[test]
fn test_session_creation_failure() {
    let (name, counters) = install_mock(MockBehavior {
        fail_session: true,
        ..MockBehavior::default()
    });
    let err = Connection::open(&name, &ConnectOptions::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert!(err.to_string().contains("out of session handles"));
    assert_eq!(Counters::get(&counters.sessions_created), 0);
}

#[test]
fn test_connect_failure_closes_session() {
    let (name, counters) = install_mock(MockBehavior {
        fail_connect: true,
        ..MockBehavior::default()
    });

    let options = ConnectOptions::new().with("dbname", "users.db");
    let err = Connection::open(&name, &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert_eq!(
        err.to_string(),
        format!("DB connection failed ({}, users.db): access denied", name)
    );

    let err = Connection::open(&name, &ConnectOptions::new()).unwrap_err();
    assert!(err.to_string().contains("unknown dbname"));

    assert_eq!(Counters::get(&counters.sessions_created), 2);
    assert_eq!(Counters::get(&counters.sessions_closed), 2);
}

#[test]
fn test_open_from_config() {
    let (name, counters) = install_mock(MockBehavior::default());
    let config = ConnectionConfig::from_toml_str(&format!(
        "driver = \"{}\"\n\n[options]\ndbname = \"from-config.db\"\nretries = 3\n",
        name
    ))
    .unwrap();

    let conn = Connection::open_config(&config).unwrap();
    assert_eq!(conn.driver_name(), name);
    assert!(conn.exec("SELECT 1", &Value::Undefined).unwrap());
    drop(conn);
    assert_eq!(Counters::get(&counters.sessions_closed), 1);
}

#[test]
fn test_to_array_ignores_reported_row_count() {
    let (name, counters) = install_mock(MockBehavior {
        unknown_row_count: true,
        ..MockBehavior::default()
    });
    let conn = Connection::open(&name, &ConnectOptions::new()).unwrap();
    let res = conn.query("SELECT *", &Value::Undefined).unwrap().unwrap();

    let rows = res.to_array(false).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].to_json()[1], serde_json::json!(-2));
    assert_eq!(Counters::get(&counters.row_count_calls), 0);

    assert_eq!(res.row_count().unwrap(), u64::MAX);
}
