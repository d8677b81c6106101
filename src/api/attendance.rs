use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::service::AttendanceService;
use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// First day to include (inclusive)
    #[param(example = "2024-01-01", value_type = Option<String>)]
    pub from: Option<NaiveDate>,
    /// Last day to include (inclusive)
    #[param(example = "2024-01-31", value_type = Option<String>)]
    pub to: Option<NaiveDate>,
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    responses(
        (status = 200, description = "Checked in successfully", body = Object, example = json!({
            "message": "Checked in successfully",
            "status": "present"
        })),
        (status = 400, description = "Already checked in today", body = Object, example = json!({
            "message": "Already checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Store unavailable, retry later")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
) -> Result<impl Responder, AppError> {
    let record = service.check_in(auth.user_id, Utc::now()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Checked in successfully",
        "status": record.status,
        "record": service.entry(&record)
    })))
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    responses(
        (status = 200, description = "Checked out successfully", body = Object, example = json!({
            "message": "Checked out successfully"
        })),
        (status = 400, description = "No active check-in found for today", body = Object, example = json!({
            "message": "No active check-in found for today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Store unavailable, retry later")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
) -> Result<impl Responder, AppError> {
    let record = service.check_out(auth.user_id, Utc::now()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Checked out successfully",
        "record": service.entry(&record)
    })))
}

/// Own attendance history with summary statistics
#[utoipa::path(
    get,
    path = "/api/attendance/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Attendance history", body = HistoryView),
        (status = 400, description = "Invalid date range"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn history(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
    query: web::Query<HistoryQuery>,
) -> Result<impl Responder, AppError> {
    let history = service.history(auth.user_id, query.from, query.to).await?;
    Ok(HttpResponse::Ok().json(history))
}

/// Today's attendance for all staff (Admin)
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Today's roster", body = TodayRoster),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn today(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
) -> Result<impl Responder, AppError> {
    auth.require_admin()?;

    let roster = service.today_roster(Utc::now()).await?;
    Ok(HttpResponse::Ok().json(roster))
}
