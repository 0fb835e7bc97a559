//! Command-line front end for the exercise log.
//!
//! # Responsibility
//! - Translate subcommands into transport requests for `exlog_core::api`.
//! - Print the reply body and exit non-zero on failure replies.

use clap::{Parser, Subcommand};
use exlog_core::api::{self, ApiReply, Method};
use exlog_core::db::open_db;
use exlog_core::{init_logging, CoreConfig, ExerciseService, SqliteStore};
use log::info;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::process::ExitCode;

/// `exlog` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(name = "exlog", about = "Track exercise sessions per user", version)]
struct CliArgs {
    /// SQLite database file. Falls back to `EXLOG_DB_PATH`.
    #[arg(long = "db", value_name = "path", global = true)]
    db_path: Option<PathBuf>,
    /// Log level. Falls back to `EXLOG_LOG_LEVEL`.
    #[arg(long = "log-level", value_name = "level", global = true)]
    log_level: Option<String>,
    /// Absolute log directory. Falls back to `EXLOG_LOG_DIR`; unset disables file logs.
    #[arg(long = "log-dir", value_name = "path", global = true)]
    log_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Register a user.
    NewUser {
        #[arg(long)]
        username: String,
    },
    /// List registered users.
    Users,
    /// Append an exercise entry to a user's log.
    Add {
        #[arg(long = "user-id")]
        user_id: String,
        #[arg(long)]
        description: String,
        /// Whole minutes.
        #[arg(long, allow_hyphen_values = true)]
        duration: String,
        /// `YYYY-MM-DD`, RFC 3339 or epoch milliseconds; defaults to now.
        #[arg(long)]
        date: Option<String>,
    },
    /// Show a user's log, optionally bounded and capped.
    Log {
        #[arg(long = "user-id")]
        user_id: String,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        limit: Option<String>,
    },
}

impl Command {
    /// Route and payload understood by `api::dispatch`.
    fn into_request(self) -> (Method, &'static str, Value) {
        let mut fields = Map::new();
        let route = match self {
            Self::NewUser { username } => {
                fields.insert("username".to_string(), Value::String(username));
                api::Route::NewUser
            }
            Self::Users => api::Route::ListUsers,
            Self::Add {
                user_id,
                description,
                duration,
                date,
            } => {
                fields.insert("userId".to_string(), Value::String(user_id));
                fields.insert("description".to_string(), Value::String(description));
                fields.insert("durationMinutes".to_string(), Value::String(duration));
                insert_optional(&mut fields, "date", date);
                api::Route::AddEntry
            }
            Self::Log {
                user_id,
                from,
                to,
                limit,
            } => {
                fields.insert("userId".to_string(), Value::String(user_id));
                insert_optional(&mut fields, "from", from);
                insert_optional(&mut fields, "to", to);
                insert_optional(&mut fields, "limit", limit);
                api::Route::GetLog
            }
        };
        (route.method(), route.path(), Value::Object(fields))
    }
}

fn insert_optional(fields: &mut Map<String, Value>, key: &str, value: Option<String>) {
    if let Some(value) = value {
        fields.insert(key.to_string(), Value::String(value));
    }
}

fn resolve_config(args: &CliArgs) -> CoreConfig {
    let mut config = CoreConfig::from_env();
    if let Some(path) = &args.db_path {
        config.db_path = path.clone();
    }
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
    if let Some(dir) = &args.log_dir {
        config.log_dir = Some(dir.clone());
    }
    config
}

fn run(args: CliArgs) -> Result<ApiReply, String> {
    let config = resolve_config(&args);
    if let Some(log_dir) = &config.log_dir {
        let log_dir = log_dir
            .to_str()
            .ok_or_else(|| format!("log dir `{}` is not valid UTF-8", log_dir.display()))?;
        init_logging(&config.log_level, log_dir)?;
    }

    let conn = open_db(&config.db_path).map_err(|err| {
        format!(
            "failed to open database `{}`: {err}",
            config.db_path.display()
        )
    })?;
    let store = SqliteStore::try_new(&conn).map_err(|err| format!("store init failed: {err}"))?;
    let service = ExerciseService::new(store);

    let (method, path, payload) = args.command.into_request();
    info!("event=cli_command module=cli status=start path={path}");
    Ok(api::dispatch(&service, method, path, payload))
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    match run(args) {
        Ok(reply) => {
            if reply.is_success() {
                println!("{}", reply.body_text());
                ExitCode::SUCCESS
            } else {
                eprintln!("{} {}", reply.status, reply.body_text());
                ExitCode::FAILURE
            }
        }
        Err(message) => {
            eprintln!("exlog: {message}");
            ExitCode::FAILURE
        }
    }
}
