use crate::{
    api::{attendance, dashboard, feedback},
    auth::middleware::auth_middleware,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::{Context, Result};
use std::sync::Arc;

pub type Limiter = Governor<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP limiter allowing `requests_per_min` with an equal burst.
pub fn build_limiter(requests_per_min: u32) -> Result<Limiter> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / requests_per_min as u64).max(1)
    };
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .context("invalid rate limit configuration")?;
    Ok(Governor::new(&cfg))
}

pub fn configure(cfg: &mut web::ServiceConfig, api_prefix: &str, limiter: Arc<Limiter>) {
    cfg.service(
        web::scope(api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(limiter) // rate limiting
            .configure(api_routes),
    );
}

/// Every route below sits behind `auth_middleware`.
pub fn api_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/dashboard").route(web::get().to(dashboard::dashboard)))
        .service(
            web::scope("/attendance")
                // /attendance/check-in
                .service(web::resource("/check-in").route(web::post().to(attendance::check_in)))
                // /attendance/check-out
                .service(web::resource("/check-out").route(web::post().to(attendance::check_out)))
                // /attendance/history
                .service(web::resource("/history").route(web::get().to(attendance::history)))
                // /attendance/today
                .service(web::resource("/today").route(web::get().to(attendance::today))),
        )
        .service(
            web::scope("/feedback")
                // /feedback
                .service(
                    web::resource("")
                        .route(web::get().to(feedback::inbox))
                        .route(web::post().to(feedback::send_message)),
                )
                // /feedback/{id}/read
                .service(web::resource("/{id}/read").route(web::put().to(feedback::mark_read))),
        )
        .service(web::resource("/staff").route(web::get().to(feedback::staff_members)));
}
