///
/// Script call boundary.
///
/// The host hands native functions their arguments as a slice of values.
/// These helpers check the call shape the way the script API documents it
/// and forward to the typed connection API.
///

use naml_std_core::Value;

use crate::config::ConnectOptions;
use crate::connection::Connection;
use crate::errors::DbiError;

static NO_PARAMS: Value = Value::Undefined;

/// `DBI.open(driver, options)`
pub fn open(args: &[Value]) -> Result<Connection, DbiError> {
    let [driver, options, ..] = args else {
        return Err(DbiError::Usage("Usage: DBI.open(driver, options)".to_string()));
    };
    let options = ConnectOptions::from_value(options)?;
    Connection::open(&driver.to_display_string(), &options)
}

/// Optional parameter argument of `query(sql, params?)` / `exec(sql, params?)`
pub fn query_params(args: &[Value]) -> &Value {
    args.get(1).unwrap_or(&NO_PARAMS)
}

/// SQL text argument, string-coerced
pub fn query_sql(args: &[Value]) -> String {
    args.first().unwrap_or(&NO_PARAMS).to_display_string()
}
