use clap::{Parser, command};
use serde::{Deserialize, Serialize};

/**
 * Command-line arguments for the application.
 */
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct ApplicationArguments {
    /**
     * Path to the configuration file.
     */
    #[arg(short, long)]
    pub config_file: String,
}

/**
 * Represents the configuration for the application.
 */
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /**
     * Logging configuration for the application.
     */
    pub logging: LoggingConfig,
    /**
     * Server configuration for the application.
     */
    pub server: Server,
    /**
     * Database configuration for the application.
     */
    pub database: Database,
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /**
     * Whether to log the target of the log message.
     */
    pub target: bool,
    /**
     * Whether to log thread IDs .
     */
    pub thread_ids: bool,
    /**
     * Whether to log thread names.
     */
    pub thread_names: bool,
    /**
     * Whether to log line numbers.
     */
    pub line_number: bool,
    /**
     * Whether to log the log level.
     */
    pub level: bool,
    /**
     * Whether to use ANSI colors in logs.
     */
    pub ansi: bool,
    /**
     * Whether to log the source file.
     */
    pub file: bool,
    /**
     * Path to the log file. Logs go to stdout when not set.
     */
    pub logfile: Option<String>,
    /**
     * Additional directives for logging configuration.
     */
    pub directives: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig { target: true, thread_ids: false, thread_names: false, line_number: false, level: true, ansi: true, file: false, logfile: None, directives: vec![] }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    /**
     * Type of the database (e.g., `PostgreSQL`).
     */
    pub db_type: DatabaseType,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DatabaseType {
    /**
     * `PostgreSQL` database type. Timeouts and lifetimes are in milliseconds.
     */
    #[serde(rename_all = "camelCase")]
    Postgresql { connection_string: String, max_connections: u32, min_connections: u32, acquire_timeout: u64, acquire_slow_threshold: u64, idle_timeout: u64, max_lifetime: u64 },
}

/**
 * Represents the server configuration for the application.
 */
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    /**
     * Number of worker threads for the server.
     */
    pub workers: usize,
    /**
     * HTTP port for the server.
     */
    pub http_port: u16,
    /**
     * Address to bind to.
     */
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}
