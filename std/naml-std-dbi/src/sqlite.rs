///
/// Built-in `sqlite3` driver on rusqlite (bundled SQLite).
///
/// Options follow libdbi's sqlite3 driver:
/// - `dbname`: database file name, or `:memory:` (required)
/// - `sqlite3_dbdir`: directory holding the database file (default `.`)
/// - `sqlite3_timeout`: busy timeout in milliseconds
///
/// Result rows are materialized eagerly into the cursor, so a cursor owns
/// plain data and never borrows the rusqlite connection. A query string may
/// hold several statements; they run in order and the cursor carries the
/// rows of the last one.
///
/// Column kinds come from the declared column type. Expression columns
/// have none and take the storage class of their first non-null value.
///

use std::borrow::Cow;
use std::path::Path;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use indexmap::IndexMap;
use rusqlite::types::Value as SqlValue;
use rusqlite::{Batch, Connection, Statement};
use tracing::{debug, warn};

use crate::driver::{Cursor, Driver, FieldAttributes, FieldKind, NativeError, NativeResult, Session};

pub const DRIVER_NAME: &str = "sqlite3";

const MEMORY_DBNAME: &str = ":memory:";

/// Julian day number of the Unix epoch
const UNIX_EPOCH_JULIAN_DAY: f64 = 2440587.5;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

impl From<rusqlite::Error> for NativeError {
    fn from(e: rusqlite::Error) -> Self {
        NativeError::new(e.to_string())
    }
}

pub struct SqliteDriver;

impl Driver for SqliteDriver {
    fn name(&self) -> &str {
        DRIVER_NAME
    }

    fn new_session(&self) -> NativeResult<Box<dyn Session>> {
        Ok(Box::new(SqliteSession::default()))
    }
}

#[derive(Default)]
pub struct SqliteSession {
    options: IndexMap<String, String>,
    conn: Option<Connection>,
}

impl SqliteSession {
    fn open_database(&self) -> NativeResult<Connection> {
        let dbname = self
            .option("dbname")
            .ok_or_else(|| NativeError::new("no database specified (set the 'dbname' option)"))?;

        let conn = if dbname == MEMORY_DBNAME {
            Connection::open_in_memory()?
        } else {
            let dir = self.option("sqlite3_dbdir").unwrap_or(".");
            let path = Path::new(dir).join(dbname);
            let conn = Connection::open(&path)?;
            debug!(path = %path.display(), "sqlite3 database opened");
            conn
        };

        if let Some(timeout) = self.option("sqlite3_timeout") {
            let ms: u64 = timeout
                .trim()
                .parse()
                .map_err(|_| NativeError::new(format!("invalid sqlite3_timeout '{}'", timeout)))?;
            conn.busy_timeout(Duration::from_millis(ms))?;
        }
        Ok(conn)
    }
}

impl Session for SqliteSession {
    fn driver_name(&self) -> &str {
        DRIVER_NAME
    }

    fn set_option(&mut self, key: &str, value: &str) {
        self.options.insert(key.to_string(), value.to_string());
    }

    fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    fn connect(&mut self) -> NativeResult<()> {
        let conn = self.open_database()?;
        self.conn = Some(conn);
        Ok(())
    }

    fn query(&mut self, sql: &str) -> NativeResult<Box<dyn Cursor>> {
        let conn = self
            .conn
            .as_ref()
            .ok_or_else(|| NativeError::new("database is not connected"))?;

        let mut batch = Batch::new(conn, sql);
        let mut last = SqliteCursor::default();
        while let Some(mut stmt) = batch.next()? {
            last = materialize(&mut stmt)?;
        }
        Ok(Box::new(last))
    }

    fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err((_, e)) = conn.close() {
                warn!(error = %e, "sqlite3 close reported an error");
            }
        }
    }
}

struct SqliteColumn {
    name: String,
    kind: FieldKind,
    attributes: FieldAttributes,
}

/// Fully materialized result set. `position` 0 is before the first row,
/// `n` is row `n - 1`.
#[derive(Default)]
pub struct SqliteCursor {
    columns: Vec<SqliteColumn>,
    rows: Vec<Vec<SqlValue>>,
    position: usize,
}

fn materialize(stmt: &mut Statement<'_>) -> rusqlite::Result<SqliteCursor> {
    let declared: Vec<(String, Option<String>)> = stmt
        .columns()
        .iter()
        .map(|c| (c.name().to_string(), c.decl_type().map(str::to_string)))
        .collect();
    let count = declared.len();

    let mut rows = Vec::new();
    let mut result = stmt.raw_query();
    while let Some(row) = result.next()? {
        let mut values = Vec::with_capacity(count);
        for i in 0..count {
            values.push(row.get::<_, SqlValue>(i)?);
        }
        rows.push(values);
    }

    let columns = declared
        .into_iter()
        .enumerate()
        .map(|(i, (name, decl))| {
            let (kind, attributes) = match decl {
                Some(decl) => kind_from_decltype(&decl),
                None => (kind_from_values(&rows, i), FieldAttributes::default()),
            };
            SqliteColumn { name, kind, attributes }
        })
        .collect();

    Ok(SqliteCursor {
        columns,
        rows,
        position: 0,
    })
}

fn kind_from_decltype(decl: &str) -> (FieldKind, FieldAttributes) {
    let upper = decl.to_ascii_uppercase();
    let has = |needle: &str| upper.contains(needle);
    let kind = if has("BOOL") {
        FieldKind::Boolean
    } else if has("INT") {
        FieldKind::Integer
    } else if has("CHAR") || has("CLOB") || has("TEXT") {
        FieldKind::String
    } else if has("BLOB") || has("BINARY") {
        FieldKind::Binary
    } else if has("DATE") || has("TIME") {
        FieldKind::Datetime
    } else if has("REAL") || has("FLOA") || has("DOUB") || has("DEC") || has("NUMERIC") {
        FieldKind::Decimal
    } else {
        FieldKind::String
    };
    let attributes = FieldAttributes {
        unsigned: kind == FieldKind::Integer && has("UNSIGNED"),
    };
    (kind, attributes)
}

/// Kind of an undeclared column from its stored values. Every non-null
/// value must share one storage class; a mix falls back to `String`, which
/// renders integers and reals as text instead of coercing them.
fn kind_from_values(rows: &[Vec<SqlValue>], field: usize) -> FieldKind {
    let mut kinds = rows
        .iter()
        .filter_map(|row| row.get(field))
        .filter_map(|value| match value {
            SqlValue::Null => None,
            SqlValue::Integer(_) => Some(FieldKind::Integer),
            SqlValue::Real(_) => Some(FieldKind::Decimal),
            SqlValue::Blob(_) => Some(FieldKind::Binary),
            SqlValue::Text(_) => Some(FieldKind::String),
        });
    let Some(first) = kinds.next() else {
        return FieldKind::String;
    };
    if kinds.all(|kind| kind == first) {
        first
    } else {
        FieldKind::String
    }
}

fn parse_datetime(text: &str) -> Option<i64> {
    let text = text.trim();
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.and_utc().timestamp());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp());
    }
    for format in ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"] {
        if let Ok(time) = NaiveTime::parse_from_str(text, format) {
            return Some(i64::from(time.num_seconds_from_midnight()));
        }
    }
    None
}

fn format_real(r: f64) -> String {
    if r.is_finite() && r.fract() == 0.0 && r.abs() < 1e15 {
        format!("{:.1}", r)
    } else {
        format!("{}", r)
    }
}

impl SqliteCursor {
    fn current(&self, field: usize) -> Option<&SqlValue> {
        let row = self.position.checked_sub(1)?;
        self.rows.get(row)?.get(field)
    }
}

impl Cursor for SqliteCursor {
    fn next_row(&mut self) -> bool {
        if self.position < self.rows.len() {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn first_row(&mut self) -> bool {
        if self.rows.is_empty() {
            false
        } else {
            self.position = 1;
            true
        }
    }

    fn field_count(&self) -> usize {
        self.columns.len()
    }

    fn row_count(&self) -> u64 {
        self.rows.len() as u64
    }

    fn field_name(&self, field: usize) -> Option<&str> {
        self.columns.get(field).map(|c| c.name.as_str())
    }

    fn field_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    fn field_kind(&self, field: usize) -> FieldKind {
        self.columns.get(field).map_or(FieldKind::String, |c| c.kind)
    }

    fn field_attributes(&self, field: usize) -> FieldAttributes {
        self.columns.get(field).map(|c| c.attributes).unwrap_or_default()
    }

    fn is_null(&self, field: usize) -> bool {
        matches!(self.current(field), None | Some(SqlValue::Null))
    }

    fn get_i64(&self, field: usize) -> i64 {
        match self.current(field) {
            Some(SqlValue::Integer(i)) => *i,
            Some(SqlValue::Real(r)) => *r as i64,
            Some(SqlValue::Text(s)) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }

    fn get_u64(&self, field: usize) -> u64 {
        match self.current(field) {
            Some(SqlValue::Integer(i)) => *i as u64,
            Some(SqlValue::Real(r)) => *r as u64,
            Some(SqlValue::Text(s)) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }

    fn get_f64(&self, field: usize) -> f64 {
        match self.current(field) {
            Some(SqlValue::Real(r)) => *r,
            Some(SqlValue::Integer(i)) => *i as f64,
            Some(SqlValue::Text(s)) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    fn get_binary(&self, field: usize) -> Option<&[u8]> {
        match self.current(field) {
            Some(SqlValue::Blob(b)) => Some(b.as_slice()),
            Some(SqlValue::Text(s)) => Some(s.as_bytes()),
            _ => None,
        }
    }

    fn get_datetime(&self, field: usize) -> i64 {
        match self.current(field) {
            Some(SqlValue::Integer(secs)) => *secs,
            Some(SqlValue::Real(jd)) => ((jd - UNIX_EPOCH_JULIAN_DAY) * 86400.0).round() as i64,
            Some(SqlValue::Text(s)) => parse_datetime(s).unwrap_or(0),
            _ => 0,
        }
    }

    fn get_string(&self, field: usize) -> Option<Cow<'_, str>> {
        match self.current(field)? {
            SqlValue::Null => None,
            SqlValue::Integer(i) => Some(Cow::Owned(i.to_string())),
            SqlValue::Real(r) => Some(Cow::Owned(format_real(*r))),
            SqlValue::Text(s) => Some(Cow::Borrowed(s.as_str())),
            SqlValue::Blob(b) => Some(String::from_utf8_lossy(b)),
        }
    }

    fn has_row(&self) -> bool {
        self.position > 0
    }
}
