///
/// Process-wide driver library.
///
/// One shared instance, created on first use (normally the first `open`)
/// with the built-in drivers registered, and never torn down for the life
/// of the process. Tearing it down once the last connection closes needs a
/// policy for re-initialising mid-run, so there is no shutdown path yet.
///

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};

use tracing::debug;

use crate::driver::Driver;
use crate::sqlite::SqliteDriver;

struct DriverLibrary {
    drivers: HashMap<String, Arc<dyn Driver>>,
}

impl DriverLibrary {
    fn with_builtin_drivers() -> Self {
        let mut library = Self {
            drivers: HashMap::new(),
        };
        library.insert(Arc::new(SqliteDriver));
        debug!(drivers = ?library.names(), "driver library initialized");
        library
    }

    fn insert(&mut self, driver: Arc<dyn Driver>) -> Option<Arc<dyn Driver>> {
        self.drivers.insert(driver.name().to_string(), driver)
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.drivers.keys().cloned().collect();
        names.sort();
        names
    }
}

static DRIVER_LIBRARY: LazyLock<Mutex<DriverLibrary>> =
    LazyLock::new(|| Mutex::new(DriverLibrary::with_builtin_drivers()));

fn library() -> MutexGuard<'static, DriverLibrary> {
    // The map is never left half-updated, so a poisoned lock is still usable
    DRIVER_LIBRARY.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Look a driver up by its exact name
pub fn resolve_driver(name: &str) -> Option<Arc<dyn Driver>> {
    library().drivers.get(name).cloned()
}

/// Add a driver, replacing any driver already registered under its name.
/// Returns the replaced driver.
pub fn register_driver(driver: Arc<dyn Driver>) -> Option<Arc<dyn Driver>> {
    let name = driver.name().to_string();
    let previous = library().insert(driver);
    debug!(driver = %name, replaced = previous.is_some(), "driver registered");
    previous
}

/// Names of every registered driver, sorted
pub fn driver_names() -> Vec<String> {
    library().names()
}
