use actix_cors::Cors;
use actix_web::middleware::{Compress, DefaultHeaders};
use actix_web::{App, HttpServer, web};
use dotenv::dotenv;
use human_panic::setup_panic;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use rust_loadboard::config::AppConfig;
use rust_loadboard::routes;
use rust_loadboard::runtime::lifetime;
use rust_loadboard::services::system::DynamicConfig;
use rust_loadboard::utils::{json_error_handler, query_error_handler};

/// 日志写到 stdout；开发环境带文件名行号，其余环境输出 JSON。
/// 返回的 guard 需存活到进程结束，否则缓冲中的日志会丢失。
fn init_tracing(config: &AppConfig) -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.app.log_level))
        .with_writer(writer)
        .with_level(true);

    if config.is_development() {
        builder
            .with_ansi(true)
            .with_file(true)
            .with_line_number(true)
            .init();
    } else {
        builder.with_ansi(false).json().init();
    }
    guard
}

/// 来源列表含 "*" 时放开所有来源，否则逐个登记并允许携带 Cookie
fn build_cors(config: &AppConfig, origins: &[String], max_age: usize) -> Cors {
    let cors = &config.cors;
    let mut builder = Cors::default().max_age(max_age);

    if origins.iter().any(|o| o == "*") {
        builder = builder.allow_any_origin();
    } else {
        builder = origins
            .iter()
            .fold(builder, |b, origin| b.allowed_origin(origin))
            .supports_credentials();
    }

    builder = if cors.allowed_methods.is_empty() {
        builder.allow_any_method()
    } else {
        builder.allowed_methods(cors.allowed_methods.iter().map(String::as_str))
    };

    if cors.allowed_headers.is_empty() || cors.allowed_headers.iter().any(|h| h == "*") {
        builder.allow_any_header()
    } else {
        builder.allowed_headers(cors.allowed_headers.iter().map(String::as_str))
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let started = Instant::now();
    dotenv().ok();
    setup_panic!();

    AppConfig::init().map_err(|e| std::io::Error::other(format!("config: {e}")))?;
    let config = AppConfig::get();
    let _log_guard = init_tracing(config);

    info!(
        "{} v{} ({} environment)",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        config.app.environment
    );

    let startup = lifetime::startup::prepare_server_startup()
        .await
        .map_err(|e| {
            error!("Startup failed: {}", e);
            std::io::Error::other(e.to_string())
        })?;
    let storage = startup.storage;
    let cache = startup.cache;

    // cors.* 只在启动时读取一次
    let cors_origins = DynamicConfig::cors_allowed_origins().await;
    let cors_max_age = DynamicConfig::cors_max_age().await;

    info!(
        "Startup finished in {} ms, {} workers",
        started.elapsed().as_millis(),
        config.server.workers
    );

    let timeouts = &config.server.timeouts;
    let server = HttpServer::new(move || {
        App::new()
            .wrap(build_cors(config, &cors_origins, cors_max_age))
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("Keep-Alive", format!("timeout={}", timeouts.keep_alive)))
                    .add(("Cache-Control", "no-store")),
            )
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::PayloadConfig::new(config.server.limits.max_payload_size))
            .app_data(web::Data::new(storage.clone()))
            .app_data(web::Data::new(cache.clone()))
            .configure(routes::configure_api)
    })
    .keep_alive(Duration::from_secs(timeouts.keep_alive))
    .client_request_timeout(Duration::from_millis(timeouts.client_request))
    .client_disconnect_timeout(Duration::from_millis(timeouts.client_disconnect))
    .workers(config.server.workers);

    #[cfg(unix)]
    let server = match config.unix_socket_path() {
        Some(socket_path) => {
            if std::path::Path::new(socket_path).exists() {
                std::fs::remove_file(socket_path)?;
            }
            warn!("Listening on unix:{}", socket_path);
            server.bind_uds(socket_path)?
        }
        None => {
            warn!("Listening on http://{}", config.server_bind_address());
            server.bind(config.server_bind_address())?
        }
    };
    #[cfg(not(unix))]
    let server = {
        warn!("Listening on http://{}", config.server_bind_address());
        server.bind(config.server_bind_address())?
    };

    tokio::select! {
        res = server.run() => res?,
        _ = lifetime::shutdown::listen_for_shutdown() => {
            warn!("Shutdown signal received, stopping");
        }
    }

    Ok(())
}
