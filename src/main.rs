mod api;
mod dao;
mod model;
mod service;

use std::fs::File;
use std::sync::Arc;
use std::time::Duration;

use crate::api::endpoints::{
    customer_charts, customers_export, customers_fragment, customers_page, home, movies_fragment, movies_page, producers_fragment, producers_page, report_series, reports_fragment, reports_page,
    updates_page,
};
use crate::api::middleware::timing_middleware;
use crate::api::state::AppState;
use crate::api::views::APPLICATION_TITLE;
use crate::dao::theater::TheaterDao;
use crate::model::config::{ApplicationArguments, DatabaseType, LoggingConfig};
use crate::service::theater::TheaterService;

use actix_web::middleware::from_fn;
use actix_web::{App, HttpServer, web};
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use clap::Parser;
use prometheus::IntGauge;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

/**
 * Starts the dashboard web server.
 */
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = ApplicationArguments::parse();

    let config = get_config(&args.config_file)?;

    init_tracing(&config.logging)?;

    let connection_pool = get_connection_pool(&config.database.db_type)?;

    let theater_service = TheaterService::new(TheaterDao::new(), Some(connection_pool.clone()));
    let state = web::Data::new(AppState::new(theater_service));

    let prometheus = PrometheusMetricsBuilder::new("sineflix")
        .endpoint("/metrics")
        .mask_unmatched_patterns("UNKNOWN")
        .build()
        .map_err(|err| std::io::Error::other(format!("Failed to create Prometheus metrics: {err}")))?;

    let max_connections_gauge = register_gauge(&prometheus, "max_connections", "Connection pool maximum")?;
    let min_connections_gauge = register_gauge(&prometheus, "min_connections", "Connection pool minimum")?;
    let active_connections_gauge = register_gauge(&prometheus, "active_connections", "Connection pool active")?;
    let idle_connections_gauge = register_gauge(&prometheus, "idle_connections", "Connection pool idle")?;
    gather_db_metrics(max_connections_gauge, min_connections_gauge, active_connections_gauge, idle_connections_gauge, connection_pool);

    info!("{} dashboard listening on http://{}:{}", APPLICATION_TITLE, config.server.bind_address, config.server.http_port);

    HttpServer::new(move || {
        App::new()
            .wrap(prometheus.clone())
            .wrap(from_fn(timing_middleware))
            .app_data(state.clone())
            .service(home)
            .service(movies_page)
            .service(movies_fragment)
            .service(producers_page)
            .service(producers_fragment)
            .service(customers_page)
            .service(customers_fragment)
            .service(customers_export)
            .service(customer_charts)
            .service(reports_page)
            .service(reports_fragment)
            .service(report_series)
            .service(updates_page)
    })
    .bind((config.server.bind_address.as_str(), config.server.http_port))?
    .workers(config.server.workers)
    .run()
    .await
}

/**
 * Initializes logging for the application.
 *
 * #Arguments
 * `logging`: Logging configuration. `RUST_LOG` is honoured, configured directives are added on top.
 *
 * #Returns
 * A `Result` indicating success or failure.
 */
fn init_tracing(logging: &LoggingConfig) -> Result<(), std::io::Error> {
    let mut env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    for directive in &logging.directives {
        env_filter = env_filter.add_directive(directive.parse().map_err(|err| std::io::Error::other(format!("Invalid logging directive {directive}: {err}")))?);
    }
    let writer = match &logging.logfile {
        Some(logfile) => {
            let file = File::options().create(true).append(true).open(logfile).map_err(|err| std::io::Error::other(format!("Failed to open log file {logfile}: {err}")))?;
            BoxMakeWriter::new(Arc::new(file))
        }
        None => BoxMakeWriter::new(std::io::stdout),
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(logging.target)
        .with_thread_ids(logging.thread_ids)
        .with_thread_names(logging.thread_names)
        .with_line_number(logging.line_number)
        .with_level(logging.level)
        .with_ansi(logging.ansi)
        .with_file(logging.file)
        .with_writer(writer)
        .try_init()
        .map_err(|err| std::io::Error::other(format!("Failed to initialize logging: {err}")))
}

/**
 * Creates the shared connection pool. Connections are opened on first use so the dashboard starts while the database is down.
 *
 * #Arguments
 * `db_type`: Database configuration.
 *
 * #Returns
 * The connection pool or an `std::io::Error` if the connection string is invalid.
 */
fn get_connection_pool(db_type: &DatabaseType) -> Result<Pool<Postgres>, std::io::Error> {
    match db_type {
        DatabaseType::Postgresql { connection_string, max_connections, min_connections, acquire_timeout, acquire_slow_threshold, idle_timeout, max_lifetime } => PgPoolOptions::new()
            .max_connections(*max_connections)
            .min_connections(*min_connections)
            .acquire_timeout(Duration::from_millis(*acquire_timeout))
            .acquire_slow_threshold(Duration::from_millis(*acquire_slow_threshold))
            .idle_timeout(Duration::from_millis(*idle_timeout))
            .max_lifetime(Duration::from_millis(*max_lifetime))
            .connect_lazy(connection_string)
            .map_err(|err| std::io::Error::other(format!("Failed to create database pool: {err}"))),
    }
}

/**
 * Creates a gauge and registers it with the Prometheus registry.
 *
 * #Arguments
 * `prometheus_metrics`: The Prometheus metrics instance to register the gauge with.
 * `name`: Metric name.
 * `help`: Metric description.
 */
fn register_gauge(prometheus_metrics: &PrometheusMetrics, name: &str, help: &str) -> Result<IntGauge, std::io::Error> {
    let gauge = IntGauge::new(name, help).map_err(|err| std::io::Error::other(format!("Failed to create {name} gauge: {err}")))?;
    prometheus_metrics.registry.register(Box::new(gauge.clone())).map_err(|err| std::io::Error::other(format!("Failed to register {name} gauge: {err}")))?;
    Ok(gauge)
}

/**
 * Refreshes the connection pool gauges every second.
 *
 * #Arguments
 * `max_connections_gauge`: Gauge for maximum connections.
 * `min_connections_gauge`: Gauge for minimum connections.
 * `active_connections_gauge`: Gauge for active connections.
 * `idle_connections_gauge`: Gauge for idle connections.
 * `connection_pool`: The connection pool to gather metrics from.
 */
fn gather_db_metrics(max_connections_gauge: IntGauge, min_connections_gauge: IntGauge, active_connections_gauge: IntGauge, idle_connections_gauge: IntGauge, connection_pool: Pool<Postgres>) {
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(Duration::from_secs(1));
        loop {
            interval.tick().await;
            max_connections_gauge.set(i64::from(connection_pool.options().get_max_connections()));
            min_connections_gauge.set(i64::from(connection_pool.options().get_min_connections()));
            active_connections_gauge.set(i64::from(connection_pool.size()));
            #[allow(clippy::cast_possible_wrap)]
            idle_connections_gauge.set(connection_pool.num_idle() as i64);
        }
    });
}

/**
 * Reads the configuration from the specified file.
 *
 * #Arguments
 * `config_file`: The path to the configuration file.
 *
 * #Returns
 * A `Result` containing the parsed `Config` or an `std::io::Error` if reading or parsing fails.
*/
fn get_config(config_file: &str) -> Result<model::config::Config, std::io::Error> {
    let config_str: String = std::fs::read_to_string(config_file).map_err(|err| std::io::Error::other(format!("Failed to read config file: {err}")))?;
    let config: model::config::Config = toml::from_str(&config_str).map_err(|err| std::io::Error::other(format!("Failed to parse config file: {err}")))?;
    Ok(config)
}
