///
/// naml DBI Database Bridge
///
/// Relational database access for naml scripts: open a connection through
/// a named driver, run parameterized queries, and read result rows back as
/// script values.
///
/// Architecture:
/// - Drivers live in one process-wide library behind LazyLock<Mutex<..>>,
///   created on first use with the built-in `sqlite3` driver (rusqlite,
///   bundled SQLite).
/// - A `Connection` owns its native session and an arena of live cursors.
///   Each `ResultSet` holds a Weak pointer back to that state plus a
///   generation-checked slot key, so results and connections may be
///   dropped in any order without a double free or a dangling cursor.
/// - Parameters are substituted into the SQL text by the query builder,
///   through an encoder that emits SQL literals (quoted strings, `%.17g`
///   numbers, `X'..'` blobs, `NULL`).
/// - Query execution failures yield `None` / `false`; everything else
///   that goes wrong is a `DbiError` mapped onto a host exception kind.
///
/// Functions:
/// - Connection: open, open_config, query, exec, close
/// - Result: advance, field_count, row_count, get, to_array, field_names
/// - Drivers: register_driver, resolve_driver, driver_names
/// - Script boundary: api::open, api::query_sql, api::query_params
///

pub mod api;
pub mod builder;
pub mod config;
pub mod connection;
pub mod driver;
pub mod encoder;
pub mod errors;
pub mod library;
pub mod marshal;
pub mod result;
pub mod sqlite;

pub use builder::build_query;
pub use config::{ConnectOptions, ConnectionConfig};
pub use connection::Connection;
pub use driver::{Cursor, Driver, FieldAttributes, FieldKind, NativeError, NativeResult, Session};
pub use encoder::encode;
pub use errors::{DbiError, ErrorKind, HandleKind};
pub use library::{driver_names, register_driver, resolve_driver};
pub use result::{ColumnSelector, ResultSet};
