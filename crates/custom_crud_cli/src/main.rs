//! Operator entry point.
//!
//! # Responsibility
//! - Load configuration and initialize logging before any other work.
//! - Provision storage, serve the admin page, or print stored records.

use clap::{Parser, Subcommand};
use custom_crud_core::{
    core_version, default_log_level, init_logging, logging_status, open_db, AppConfig,
    RecordService, SqliteRecordRepository,
};
use log::info;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "custom_crud_cli", version, about = "Admin CRUD over name/email records")]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted.
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create or verify the record table, then exit.
    Install,
    /// Serve the admin page until interrupted.
    Serve,
    /// Print every stored record.
    List {
        /// Emit a JSON array instead of tab-separated lines.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let config = match &cli.config {
        Some(path) => AppConfig::load(path).map_err(|err| err.to_string())?,
        None => AppConfig::default(),
    };

    let level = config
        .logging
        .level
        .as_deref()
        .unwrap_or(default_log_level());
    init_logging(level, config.logging.dir.as_deref())?;
    if let Some(status) = logging_status() {
        info!(
            "event=cli_start module=cli status=ok version={} level={} target={}",
            core_version(),
            status.level,
            status.target
        );
    }

    match cli.command {
        Command::Install => install(&config, &mut std::io::stdout().lock()),
        Command::Serve => custom_crud_web::serve(&config)
            .await
            .map_err(|err| err.to_string()),
        Command::List { json } => list(&config, json, &mut std::io::stdout().lock()),
    }
}

fn install(config: &AppConfig, out: &mut impl Write) -> Result<(), String> {
    let table = config.table_name().map_err(|err| err.to_string())?;
    open_db(&config.database.path, &table).map_err(|err| err.to_string())?;
    writeln!(
        out,
        "table `{}` ready in {}",
        table,
        config.database.path.display()
    )
    .map_err(|err| err.to_string())
}

fn list(config: &AppConfig, json: bool, out: &mut impl Write) -> Result<(), String> {
    let table = config.table_name().map_err(|err| err.to_string())?;
    let conn = open_db(&config.database.path, &table).map_err(|err| err.to_string())?;
    let repo = SqliteRecordRepository::try_new(&conn, &table).map_err(|err| err.to_string())?;
    let records = RecordService::new(repo)
        .list()
        .map_err(|err| err.to_string())?;

    if json {
        let rendered = serde_json::to_string_pretty(&records).map_err(|err| err.to_string())?;
        writeln!(out, "{rendered}").map_err(|err| err.to_string())?;
    } else {
        for record in &records {
            writeln!(out, "{}\t{}\t{}", record.id, record.name, record.email)
                .map_err(|err| err.to_string())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{install, list};
    use custom_crud_core::{open_db, AppConfig, RecordDraft, RecordRepository, SqliteRecordRepository};
    use rusqlite::Connection;
    use std::path::Path;
    use tempfile::tempdir;

    fn config_for(db_path: &Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.database.path = db_path.to_path_buf();
        config
    }

    fn seed(config: &AppConfig, rows: &[(&str, &str)]) {
        let table = config.table_name().unwrap();
        let conn = open_db(&config.database.path, &table).unwrap();
        let repo = SqliteRecordRepository::try_new(&conn, &table).unwrap();
        for (name, email) in rows {
            repo.insert_record(&RecordDraft::new(*name, *email)).unwrap();
        }
    }

    #[test]
    fn install_provisions_a_fresh_database_and_is_repeatable() {
        let dir = tempdir().unwrap();
        let config = config_for(&dir.path().join("crud.sqlite3"));

        let mut out = Vec::new();
        install(&config, &mut out).unwrap();
        install(&config, &mut out).unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.starts_with("table `wp_custom_crud` ready in "));
        let conn = Connection::open(&config.database.path).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM wp_custom_crud;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn install_fails_on_incompatible_table() {
        let dir = tempdir().unwrap();
        let config = config_for(&dir.path().join("legacy.sqlite3"));
        Connection::open(&config.database.path)
            .unwrap()
            .execute_batch("CREATE TABLE wp_custom_crud (id INTEGER PRIMARY KEY, name TEXT);")
            .unwrap();

        let mut out = Vec::new();
        let err = install(&config, &mut out).unwrap_err();
        assert!(err.contains("email"), "{err}");
        assert!(out.is_empty());
    }

    #[test]
    fn list_prints_tab_separated_rows_in_id_order() {
        let dir = tempdir().unwrap();
        let config = config_for(&dir.path().join("crud.sqlite3"));
        seed(&config, &[("Ada", "ada@example.com"), ("Grace", "grace@example.com")]);

        let mut out = Vec::new();
        list(&config, false, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "1\tAda\tada@example.com\n2\tGrace\tgrace@example.com\n"
        );
    }

    #[test]
    fn list_json_emits_an_array_of_records() {
        let dir = tempdir().unwrap();
        let config = config_for(&dir.path().join("crud.sqlite3"));
        seed(&config, &[("Ada", "ada@example.com")]);

        let mut out = Vec::new();
        list(&config, true, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{ "id": 1, "name": "Ada", "email": "ada@example.com" }])
        );

        let empty_dir = tempdir().unwrap();
        let empty = config_for(&empty_dir.path().join("empty.sqlite3"));
        let mut out = Vec::new();
        list(&empty, true, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value, serde_json::json!([]));
    }
}
