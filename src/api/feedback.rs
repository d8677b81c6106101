use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::service::FeedbackService;
use crate::service::feedback::SendFeedback;
use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;

/// Send a feedback message to a staff member (Admin)
#[utoipa::path(
    post,
    path = "/api/feedback",
    request_body(
        content = SendFeedback,
        description = "Feedback message payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Message sent", body = FeedbackMessage),
        (status = 400, description = "Missing fields or invalid recipient", body = Object, example = json!({
            "message": "All fields are required"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 503, description = "Failed to send message, please try again later")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Feedback"
)]
pub async fn send_message(
    auth: AuthUser,
    service: web::Data<FeedbackService>,
    payload: web::Json<SendFeedback>,
) -> Result<impl Responder, AppError> {
    auth.require_admin()?;

    let sent = service
        .send(&auth, payload.into_inner(), Utc::now())
        .await?;
    Ok(HttpResponse::Created().json(sent))
}

/// Messages addressed to the current user
#[utoipa::path(
    get,
    path = "/api/feedback",
    responses(
        (status = 200, description = "Inbox, newest first", body = Inbox),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Feedback"
)]
pub async fn inbox(
    auth: AuthUser,
    service: web::Data<FeedbackService>,
) -> Result<impl Responder, AppError> {
    let inbox = service.inbox(auth.user_id).await?;
    Ok(HttpResponse::Ok().json(inbox))
}

/// Mark one of the current user's messages as read
#[utoipa::path(
    put,
    path = "/api/feedback/{message_id}/read",
    params(
        ("message_id" = u64, Path, description = "ID of the message to mark as read")
    ),
    responses(
        (status = 200, description = "Marked as read", body = Object, example = json!({
            "message": "Marked as read"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Message not found", body = Object, example = json!({
            "message": "Message not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Feedback"
)]
pub async fn mark_read(
    auth: AuthUser,
    service: web::Data<FeedbackService>,
    path: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    let message_id = path.into_inner();
    service.mark_read(auth.user_id, message_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Marked as read"
    })))
}

/// Staff members who can receive feedback (Admin)
#[utoipa::path(
    get,
    path = "/api/staff",
    responses(
        (status = 200, description = "Staff profiles", body = [Profile]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Feedback"
)]
pub async fn staff_members(
    auth: AuthUser,
    service: web::Data<FeedbackService>,
) -> Result<impl Responder, AppError> {
    auth.require_admin()?;

    let staff = service.staff_members().await?;
    Ok(HttpResponse::Ok().json(staff))
}
