//! Shared fixtures for the integration tests.
//!
//! `MockDriver` records every session close and cursor free in a shared
//! `Counters`, so tests can assert that nothing is freed twice and that no
//! cursor outlives the session it came from. Each mock is registered under
//! a unique name because the driver library is process-wide and tests run
//! in parallel.

#![allow(dead_code)]

use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use naml_std_dbi::{
    register_driver, Cursor, Driver, FieldAttributes, FieldKind, NativeError, NativeResult, Session,
};

static NEXT_MOCK: AtomicUsize = AtomicUsize::new(0);

/// Epoch seconds reported by the `when` column
pub const MOCK_TIMESTAMP: i64 = 1_700_000_000;

#[derive(Debug, Default)]
pub struct Counters {
    pub sessions_created: AtomicUsize,
    pub sessions_closed: AtomicUsize,
    pub double_closes: AtomicUsize,
    pub cursors_created: AtomicUsize,
    pub cursors_freed: AtomicUsize,
    /// Cursors freed after their session was already closed
    pub freed_after_close: AtomicUsize,
    pub row_count_calls: AtomicUsize,
}

impl Counters {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn live_cursors(&self) -> usize {
        Self::get(&self.cursors_created) - Self::get(&self.cursors_freed)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MockBehavior {
    pub fail_session: bool,
    pub fail_connect: bool,
    /// Cursors report `u64::MAX` rows, like a streaming driver that
    /// cannot count ahead
    pub unknown_row_count: bool,
}

pub struct MockDriver {
    name: String,
    behavior: MockBehavior,
    counters: Arc<Counters>,
}

/// Register a fresh mock driver and return its name and counters
pub fn install_mock(behavior: MockBehavior) -> (String, Arc<Counters>) {
    let name = format!("mock-{}", NEXT_MOCK.fetch_add(1, Ordering::SeqCst));
    let counters = Arc::new(Counters::default());
    register_driver(Arc::new(MockDriver {
        name: name.clone(),
        behavior,
        counters: Arc::clone(&counters),
    }));
    (name, counters)
}

impl Driver for MockDriver {
    fn name(&self) -> &str {
        &self.name
    }

    fn new_session(&self) -> NativeResult<Box<dyn Session>> {
        if self.behavior.fail_session {
            return Err(NativeError::new("out of session handles"));
        }
        self.counters.sessions_created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            driver: self.name.clone(),
            behavior: self.behavior,
            counters: Arc::clone(&self.counters),
            options: Vec::new(),
            closed: Arc::new(AtomicBool::new(false)),
        }))
    }
}

struct MockSession {
    driver: String,
    behavior: MockBehavior,
    counters: Arc<Counters>,
    options: Vec<(String, String)>,
    closed: Arc<AtomicBool>,
}

impl Session for MockSession {
    fn driver_name(&self) -> &str {
        &self.driver
    }

    fn set_option(&mut self, key: &str, value: &str) {
        self.options.retain(|(k, _)| k != key);
        self.options.push((key.to_string(), value.to_string()));
    }

    fn option(&self, key: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn connect(&mut self) -> NativeResult<()> {
        if self.behavior.fail_connect {
            Err(NativeError::new("access denied"))
        } else {
            Ok(())
        }
    }

    /// `FAIL` anywhere in the text is a syntax error, `EMPTY` gives no rows
    fn query(&mut self, sql: &str) -> NativeResult<Box<dyn Cursor>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(NativeError::new("session is closed"));
        }
        if sql.contains("FAIL") {
            return Err(NativeError::new("syntax error"));
        }
        self.counters.cursors_created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockCursor {
            sql: sql.to_string(),
            rows: if sql.contains("EMPTY") { 0 } else { 2 },
            position: 0,
            unknown_row_count: self.behavior.unknown_row_count,
            counters: Arc::clone(&self.counters),
            session_closed: Arc::clone(&self.closed),
        }))
    }

    fn close(&mut self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            self.counters.double_closes.fetch_add(1, Ordering::SeqCst);
        }
        self.counters.sessions_closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Columns of every mock row
pub const MOCK_COLUMNS: &[&str] = &[
    "sql", "n", "big", "ratio", "payload", "when", "flag", "nothing",
];

struct MockCursor {
    sql: String,
    rows: usize,
    position: usize,
    unknown_row_count: bool,
    counters: Arc<Counters>,
    session_closed: Arc<AtomicBool>,
}

impl Drop for MockCursor {
    fn drop(&mut self) {
        self.counters.cursors_freed.fetch_add(1, Ordering::SeqCst);
        if self.session_closed.load(Ordering::SeqCst) {
            self.counters.freed_after_close.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl Cursor for MockCursor {
    fn next_row(&mut self) -> bool {
        if self.position < self.rows {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn first_row(&mut self) -> bool {
        if self.rows == 0 {
            return false;
        }
        self.position = 1;
        true
    }

    fn field_count(&self) -> usize {
        MOCK_COLUMNS.len()
    }

    fn row_count(&self) -> u64 {
        self.counters.row_count_calls.fetch_add(1, Ordering::SeqCst);
        if self.unknown_row_count {
            u64::MAX
        } else {
            self.rows as u64
        }
    }

    fn field_name(&self, field: usize) -> Option<&str> {
        MOCK_COLUMNS.get(field).copied()
    }

    fn field_index(&self, name: &str) -> Option<usize> {
        MOCK_COLUMNS.iter().position(|c| *c == name)
    }

    fn field_kind(&self, field: usize) -> FieldKind {
        match MOCK_COLUMNS.get(field).copied() {
            Some("n" | "big") => FieldKind::Integer,
            Some("ratio") => FieldKind::Decimal,
            Some("payload") => FieldKind::Binary,
            Some("when") => FieldKind::Datetime,
            Some("flag") => FieldKind::Boolean,
            _ => FieldKind::String,
        }
    }

    fn field_attributes(&self, field: usize) -> FieldAttributes {
        FieldAttributes {
            unsigned: MOCK_COLUMNS.get(field) == Some(&"big"),
        }
    }

    fn is_null(&self, field: usize) -> bool {
        self.position == 0 || MOCK_COLUMNS.get(field) == Some(&"nothing")
    }

    fn get_i64(&self, _field: usize) -> i64 {
        -(self.position as i64)
    }

    fn get_u64(&self, _field: usize) -> u64 {
        u64::MAX
    }

    fn get_f64(&self, _field: usize) -> f64 {
        0.25 * self.position as f64
    }

    fn get_binary(&self, _field: usize) -> Option<&[u8]> {
        Some(&[0xDE, 0xAD][..])
    }

    fn get_datetime(&self, _field: usize) -> i64 {
        MOCK_TIMESTAMP
    }

    fn get_string(&self, field: usize) -> Option<Cow<'_, str>> {
        match MOCK_COLUMNS.get(field).copied() {
            Some("sql") => Some(Cow::Borrowed(self.sql.as_str())),
            Some("flag") => Some(Cow::Borrowed("1")),
            _ => None,
        }
    }

    fn has_row(&self) -> bool {
        self.position > 0
    }
}
