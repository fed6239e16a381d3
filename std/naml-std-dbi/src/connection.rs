///
/// # Connection Handle
///
/// A `Connection` exclusively owns one native session and every live
/// cursor spawned from it. Cursors sit in a generational arena inside the
/// shared connection state; each `ResultSet` holds only a `Weak` pointer to
/// that state plus its slot key, so neither side ever reaches a freed
/// object whichever is dropped first:
///
/// - connection closed or dropped first: teardown drains the arena (every
///   generation moves on) and closes the session; surviving results report
///   an invalid handle
/// - result dropped first: it removes its own slot and the connection is
///   unaffected
///
/// Teardown is idempotent and shared by `close()` and `Drop`.
///

use std::cell::RefCell;
use std::rc::Rc;

use naml_std_core::{Arena, Value};
use tracing::{debug, trace};

use crate::builder::build_query;
use crate::config::{ConnectOptions, ConnectionConfig};
use crate::driver::{Cursor, Session};
use crate::errors::DbiError;
use crate::library::resolve_driver;
use crate::result::ResultSet;

pub(crate) struct ConnectionState {
    /// `Some` iff the connection is open
    pub(crate) session: Option<Box<dyn Session>>,
    pub(crate) results: Arena<Box<dyn Cursor>>,
}

pub(crate) type SharedState = Rc<RefCell<ConnectionState>>;

pub struct Connection {
    state: SharedState,
    driver: String,
}

impl Connection {
    pub fn open(driver_name: &str, options: &ConnectOptions) -> Result<Self, DbiError> {
        let driver = resolve_driver(driver_name).ok_or_else(|| DbiError::DriverNotFound {
            driver: driver_name.to_string(),
        })?;

        let mut session = driver.new_session().map_err(|e| DbiError::SessionCreate {
            driver: driver_name.to_string(),
            reason: e.message,
        })?;

        for (key, value) in options.iter() {
            session.set_option(key, value);
        }

        if let Err(e) = session.connect() {
            let dbname = session.option("dbname").unwrap_or("unknown dbname").to_string();
            session.close();
            debug!(driver = %driver_name, dbname = %dbname, error = %e, "connect failed");
            return Err(DbiError::ConnectFailed {
                driver: session.driver_name().to_string(),
                dbname,
                reason: e.message,
            });
        }

        debug!(driver = %driver_name, options = options.len(), "connection opened");
        Ok(Self {
            state: Rc::new(RefCell::new(ConnectionState {
                session: Some(session),
                results: Arena::new(),
            })),
            driver: driver_name.to_string(),
        })
    }

    pub fn open_config(config: &ConnectionConfig) -> Result<Self, DbiError> {
        Self::open(&config.driver, &config.options)
    }

    /// Run `sql` with `params` substituted. `Ok(None)` when the database
    /// rejects the statement.
    pub fn query(&self, sql: &str, params: &Value) -> Result<Option<ResultSet>, DbiError> {
        let Some(cursor) = self.execute(sql, params)? else {
            return Ok(None);
        };
        let key = self.state.borrow_mut().results.insert(cursor);
        Ok(Some(ResultSet::new(Rc::downgrade(&self.state), key)))
    }

    /// Like `query`, but the cursor is freed straight away
    pub fn exec(&self, sql: &str, params: &Value) -> Result<bool, DbiError> {
        Ok(self.execute(sql, params)?.is_some())
    }

    pub fn close(&self) {
        self.teardown();
    }

    pub fn is_open(&self) -> bool {
        self.state.borrow().session.is_some()
    }

    pub fn driver_name(&self) -> &str {
        &self.driver
    }

    /// Number of results still registered with this connection
    pub fn live_results(&self) -> usize {
        self.state.borrow().results.len()
    }

    fn execute(&self, sql: &str, params: &Value) -> Result<Option<Box<dyn Cursor>>, DbiError> {
        let mut state = self.state.borrow_mut();
        let session = state.session.as_mut().ok_or_else(DbiError::invalid_connection)?;

        let sql = build_query(sql, params);
        trace!(driver = %self.driver, sql = %sql, "executing query");
        match session.query(&sql) {
            Ok(cursor) => Ok(Some(cursor)),
            Err(e) => {
                debug!(driver = %self.driver, error = %e, "query failed");
                Ok(None)
            }
        }
    }

    fn teardown(&self) {
        // Detach everything before freeing anything
        let (session, cursors) = {
            let mut state = self.state.borrow_mut();
            (state.session.take(), state.results.drain())
        };
        let Some(mut session) = session else {
            return;
        };

        let invalidated = cursors.len();
        drop(cursors);
        session.close();
        debug!(driver = %self.driver, invalidated, "connection closed");
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("driver", &self.driver)
            .field("open", &self.is_open())
            .field("live_results", &self.live_results())
            .finish()
    }
}
