use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use std::sync::Arc;

mod aggregator;
mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod routes;
mod service;
mod store;
mod utils;
mod view;

use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use crate::model::profile::Profile;
use crate::service::{AttendanceService, CheckInPolicy, FeedbackService};
use crate::store::{MemoryStore, MySqlStore, ProfileDirectory, RecordStore};
use crate::utils::read_cache::ReadCache;
use tracing::{info, warn};
use tracing_appender::rolling;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/health")]
async fn health() -> impl Responder {
    "OK"
}

fn load_profiles(path: &str) -> anyhow::Result<Vec<Profile>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read profiles file {path}"))?;
    let profiles: Vec<Profile> = serde_json::from_str(&raw)
        .with_context(|| format!("invalid profiles file {path}"))?;
    info!(count = profiles.len(), path, "Seeded in-memory profiles");
    Ok(profiles)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let (records, profiles): (Arc<dyn RecordStore>, Arc<dyn ProfileDirectory>) =
        match &config.database_url {
            Some(url) => {
                let store = Arc::new(MySqlStore::new(init_db(url).await?));
                (store.clone() as Arc<dyn RecordStore>, store as Arc<dyn ProfileDirectory>)
            }
            None => {
                warn!("DATABASE_URL not set, using in-memory store; data is lost on restart");
                let store = Arc::new(match &config.profiles_file {
                    Some(path) => MemoryStore::with_profiles(load_profiles(path)?),
                    None => MemoryStore::new(),
                });
                (store.clone() as Arc<dyn RecordStore>, store as Arc<dyn ProfileDirectory>)
            }
        };

    let cache = ReadCache::new(config.cache_ttl);
    let policy = CheckInPolicy::new(config.late_after, config.workday_offset);
    let attendance = AttendanceService::new(records.clone(), profiles.clone(), cache.clone(), policy);
    let feedback = FeedbackService::new(records, profiles, cache);

    // One limiter for all workers so the per-IP quota is global
    let limiter = Arc::new(routes::build_limiter(config.rate_protected_per_min)?);
    let server_addr = config.server_addr.clone();

    info!(addr = %server_addr, late_after = %config.late_after, offset = %config.workday_offset, "Listening");

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard {_:.*} matches JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(config.clone()))
            .app_data(Data::new(attendance.clone()))
            .app_data(Data::new(feedback.clone()))
            .service(health)
            .configure(|cfg| routes::configure(cfg, &config.api_prefix, limiter.clone()))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
