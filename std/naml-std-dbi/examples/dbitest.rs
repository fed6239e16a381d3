///
/// DBI walkthrough: create a small table, seed it once, then read it back
/// three ways (manual cursor walk, array rows, record rows).
///
/// Usage: `cargo run -p naml-std-dbi --example dbitest [dbi.toml]`
///
/// Without a config file the database is `./test.sqlite3`. Debug events
/// from the bridge go to stderr.
///

use std::path::Path;

use naml_std_core::Value;
use naml_std_dbi::{api, Connection, ConnectionConfig, DbiError};

fn connect() -> Result<Connection, DbiError> {
    match std::env::args().nth(1) {
        Some(path) => Connection::open_config(&ConnectionConfig::from_path(Path::new(&path))?),
        None => api::open(&[
            Value::from("sqlite3"),
            Value::object([("dbname", "test.sqlite3"), ("sqlite3_dbdir", ".")]),
        ]),
    }
}

fn print_json(value: &Value, pretty: bool) {
    let json = value.to_json();
    let text = if pretty {
        serde_json::to_string_pretty(&json)
    } else {
        serde_json::to_string(&json)
    };
    match text {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("cannot render row: {}", e),
    }
}

fn dbitest() -> Result<(), DbiError> {
    let db = connect()?;

    db.exec(
        "CREATE TABLE IF NOT EXISTS test(
            foo TEXT,
            bar INTEGER,
            whizz DECIMAL(6,3),
            bang BOOLEAN,
            woop DATETIME
        );",
        &Value::Undefined,
    )?;

    let count = match db.query("SELECT COUNT(*) AS n FROM test", &Value::Undefined)? {
        Some(res) => res.to_array(true)?,
        None => Vec::new(),
    };
    if count.first().map(|row| row.property("n")) == Some(&Value::Int(0)) {
        db.exec(
            "INSERT INTO test (foo, bar, whizz, bang, woop) VALUES
                ('hello', 42, 3.141, 1, datetime('now','-1 day','localtime')),
                ('world', -7, 2.718, 0, datetime('2024-04-12 12:30:45.789')),
                ('quickjs', 1337, 1.618, 1, datetime('now'));",
            &Value::Undefined,
        )?;
    }

    println!("=== manual output, array bind ===");
    if let Some(res) = db.query("SELECT * FROM test WHERE bar > ?", &Value::array([5]))? {
        let numrows = res.row_count()?;
        let numfields = res.field_count()?;
        println!("Got {} rows, and {} fields.", numrows, numfields);
        while res.advance()? {
            let row = (0..numfields).map(|i| res.get(i)).collect::<Result<Vec<_>, _>>()?;
            print_json(&Value::Array(row), true);
        }
    }

    println!("=== array output, dict bind ===");
    let params = Value::object([("whizz", 2.0)]);
    if let Some(res) = db.query(
        "SELECT foo, bar, whizz, bang, woop FROM test WHERE whizz >= :whizz",
        &params,
    )? {
        for row in res.to_array(false)? {
            print_json(&row, false);
        }
    }

    println!("=== dict output, naked bind ===");
    if let Some(res) = db.query("SELECT * FROM test", &Value::Undefined)? {
        for row in res.to_array(true)? {
            print_json(&row, false);
        }
    }

    db.close();
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .init();

    if let Err(e) = dbitest() {
        eprintln!("{}: {}", e.exception_kind(), e);
        std::process::exit(1);
    }
}
