use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, Result};
use serde_json::{Map, Value};

use crate::app_context::AppContext;

use super::dtos::{Claims, CreateHandoffSessionDto, HandoffSessionCreatedDto, MeResponseDto};
use super::error::AuthError;
use super::service;

const BOT_API_KEY_HEADER: &str = "x-bot-api-key";

// Route: `POST /auth/login`
//
// Accepts either a Telegram login-widget assertion (field map with `hash`
// and `auth_date`) or `{"sessionToken": "..."}` from the bot handoff flow.
pub(crate) async fn login(
    web::Json(body): web::Json<Map<String, Value>>,
    ctx: web::Data<AppContext>,
) -> Result<HttpResponse> {
    let ctx = ctx.into_inner();
    let res = if let Some(session_token) = body.get("sessionToken") {
        let session_token = session_token
            .as_str()
            .filter(|s| !s.is_empty())
            .ok_or(AuthError::SessionTokenRequired)?;
        service::login_with_handoff(session_token, ctx).await?
    } else {
        service::login_with_assertion(body, ctx).await?
    };
    Ok(HttpResponse::Ok().json(res))
}

// Route: `GET /auth/me` (behind the authentication middleware, which puts
// the verified claims into request extensions)
pub(crate) async fn me(req: HttpRequest) -> Result<HttpResponse> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .cloned()
        .ok_or(AuthError::InvalidToken)?;
    Ok(HttpResponse::Ok().json(MeResponseDto { user: claims }))
}

// Route: `POST /auth/session` — bot backend creates a handoff session
pub(crate) async fn create_session(
    req: HttpRequest,
    web::Json(dto): web::Json<CreateHandoffSessionDto>,
    ctx: web::Data<AppContext>,
) -> Result<HttpResponse> {
    let api_key = req
        .headers()
        .get(BOT_API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    let session_token = service::create_handoff_session(dto, api_key, ctx.into_inner()).await?;
    Ok(HttpResponse::Ok().json(HandoffSessionCreatedDto { session_token }))
}
