use std::sync::Arc;

use serde_json::{Map, Value};

use crate::app_context::AppContext;
use crate::models::crypto;
use crate::models::handoff::{HandoffIdentity, RedeemError};
use crate::models::telegram::{self, AssertionError};
use crate::models::user::{User, UserProfile};

use super::dtos::{Claims, CreateHandoffSessionDto, LoginSuccessDto};
use super::error::AuthError;

pub(crate) const TOKEN_LIFETIME: u64 = 7 * 24 * 60 * 60; // 7 days

// Login with a Telegram widget assertion: verify the provider signature,
// check freshness, register the user on first sight, issue a session token.
pub(crate) async fn login_with_assertion(
    fields: Map<String, Value>,
    ctx: Arc<AppContext>,
) -> Result<LoginSuccessDto, AuthError> {
    telegram::verify_assertion(&fields, &ctx.secrets.bot_token).map_err(|e| {
        log::warn!("rejected login assertion: {}", e);
        AuthError::InvalidCredentials
    })?;

    telegram::check_freshness(&fields, crypto::get_current_timestamp()).map_err(|e| match e {
        AssertionError::Expired => AuthError::AuthenticationExpired,
        _ => AuthError::InvalidCredentials,
    })?;

    let id = field(&fields, "id").ok_or(AuthError::InvalidCredentials)?;
    let profile = UserProfile {
        id,
        username: field(&fields, "username"),
        first_name: field(&fields, "first_name"),
        last_name: field(&fields, "last_name"),
        photo_url: field(&fields, "photo_url"),
        wallet_address: field(&fields, "address"),
    };

    let (user, created) = ctx.users.get_or_register(profile);
    if created {
        log::info!("registered new user {}", user.id);
    } else {
        log::info!("user {} logged in", user.id);
    }

    let claims = claims_for(&user);
    let token = issue_session_token(&claims, &ctx)?;
    Ok(LoginSuccessDto { user: claims, token })
}

// Login by redeeming a single-use handoff session created by the bot
// backend. The redeem is atomic; a second presentation of the same token
// is indistinguishable from a token that never existed.
pub(crate) async fn login_with_handoff(
    session_token: &str,
    ctx: Arc<AppContext>,
) -> Result<LoginSuccessDto, AuthError> {
    let identity = ctx
        .handoff_sessions
        .redeem(session_token)
        .map_err(|e| match e {
            RedeemError::NotFound => AuthError::InvalidSession,
            RedeemError::Expired => AuthError::SessionExpired,
        })?;

    let claims = Claims {
        id: identity.user_id,
        username: identity.username,
        first_name: Some(identity.first_name),
        last_name: identity.last_name,
        wallet_address: None,
        exp: crypto::get_current_timestamp() + TOKEN_LIFETIME,
    };
    let token = issue_session_token(&claims, &ctx)?;
    Ok(LoginSuccessDto { user: claims, token })
}

// Creates a handoff session on behalf of the bot backend. Gated on the
// configured API key; with no key configured the endpoint rejects
// everything rather than becoming open.
pub(crate) async fn create_handoff_session(
    dto: CreateHandoffSessionDto,
    api_key: Option<&str>,
    ctx: Arc<AppContext>,
) -> Result<String, AuthError> {
    let expected = ctx
        .secrets
        .bot_api_key
        .as_deref()
        .ok_or(AuthError::WrongApiKey)?;
    let provided = api_key.ok_or(AuthError::WrongApiKey)?;
    if !crypto::verify_eq(expected.as_bytes(), provided.as_bytes()) {
        return Err(AuthError::WrongApiKey);
    }

    ctx.handoff_sessions
        .create(HandoffIdentity {
            user_id: dto.user_id,
            first_name: dto.first_name,
            last_name: dto.last_name,
            username: dto.username,
        })
        .map_err(|e| AuthError::ServerError(format!("{:?}", e)))
}

fn claims_for(user: &User) -> Claims {
    Claims {
        id: user.id.clone(),
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        wallet_address: user.wallet_address.clone(),
        exp: crypto::get_current_timestamp() + TOKEN_LIFETIME,
    }
}

fn issue_session_token(claims: &Claims, ctx: &AppContext) -> Result<String, AuthError> {
    crypto::sign_claims(claims, ctx.secrets.jwt_secret.as_bytes())
        .map_err(|_| AuthError::FailedToEncodeToken)
}

fn field(fields: &Map<String, Value>, name: &str) -> Option<String> {
    fields
        .get(name)
        .filter(|v| !v.is_null())
        .map(telegram::field_text)
}
