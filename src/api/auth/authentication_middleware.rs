use crate::app_context::AppContext;
use crate::models::crypto::{self, TokenError};

use super::dtos::Claims;
use super::error::AuthError;

use std::future::{ready, Ready};
use std::sync::Arc;

use actix_web::body::EitherBody;
use actix_web::http::header;
use actix_web::HttpMessage;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures_util::future::LocalBoxFuture;

// There are two steps in middleware processing.
// 1. Middleware initialization, middleware factory gets called with
//    next service in chain as parameter.
// 2. Middleware's call method gets called with normal request.
pub(crate) struct AuthenticationMiddleware(pub Arc<AppContext>);

// Middleware factory is `Transform` trait
// `S` - type of the next service
// `B` - type of response's body
impl<S, B> Transform<S, ServiceRequest> for AuthenticationMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthenticationMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthenticationMiddlewareService {
            service,
            ctx: self.0.clone(),
        }))
    }
}

pub(crate) struct AuthenticationMiddlewareService<S> {
    service: S,
    ctx: Arc<AppContext>,
}

impl<S, B> Service<ServiceRequest> for AuthenticationMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let claims = authentication_middleware(&req, &self.ctx);

        let claims = match claims {
            Ok(claims) => claims,
            Err(e) => {
                // render the auth error here so it reaches the client as a
                // response instead of a bare service error
                let res = req.error_response(e).map_into_right_body();
                return Box::pin(async move { Ok(res) });
            }
        };

        req.extensions_mut().insert(claims);

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res.map_into_left_body())
        })
    }
}

// Validates the bearer session token and returns its claims. The token is
// self-contained: only the signing secret is consulted, no session state.
fn authentication_middleware(
    req: &ServiceRequest,
    ctx: &AppContext,
) -> Result<Claims, AuthError> {
    let auth_header = req.headers().get(header::AUTHORIZATION);
    let auth_header = auth_header.ok_or(AuthError::NoToken)?;
    let auth_header = auth_header.to_str().map_err(|_| AuthError::NoToken)?;

    let mut parts = auth_header.split_whitespace();
    let (scheme, access_token) = (parts.next(), parts.next().ok_or(AuthError::NoToken)?);
    if scheme != Some("Bearer") {
        return Err(AuthError::NoToken);
    }

    let now = crypto::get_current_timestamp();
    crypto::verify_claims::<Claims>(access_token, ctx.secrets.jwt_secret.as_bytes(), now).map_err(
        |e| {
            log::debug!("rejected bearer token: {}", e);
            match e {
                TokenError::Expired => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            }
        },
    )
}
