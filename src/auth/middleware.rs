use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::AppError;
use crate::model::role::Role;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header::AUTHORIZATION,
    web::Data,
};

/// Bearer token of the request, or the reason it has none usable.
fn bearer_token(req: &ServiceRequest) -> Result<&str, &'static str> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or("Missing Authorization header")?;
    let value = header
        .to_str()
        .map_err(|_| "Invalid Authorization header encoding")?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or("Authorization header must start with Bearer")
}

/// Resolves the session from the bearer token and stores it as [`AuthUser`].
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    let session = bearer_token(&req).and_then(|token| {
        verify_token(token, &config.jwt_secret).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            "Invalid or expired token"
        })
    });

    match session {
        Ok(claims) => {
            req.extensions_mut().insert(AuthUser {
                user_id: claims.user_id,
                role: Role::from_name(&claims.role),
            });
            next.call(req).await
        }
        Err(reason) => {
            let resp = AppError::Unauthorized(reason.to_string()).error_response();
            Ok(req.into_response(resp))
        }
    }
}
