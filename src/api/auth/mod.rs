use actix_web::{web, Scope};
use std::sync::Arc;

use crate::app_context::AppContext;

pub(crate) mod authentication_middleware;
mod controller;
mod dtos;
mod error;
mod service;

pub fn auth_module(ctx: Arc<AppContext>) -> Scope {
    web::scope("/auth")
        .route("/login", web::post().to(controller::login))
        .route("/session", web::post().to(controller::create_session))
        .service(
            web::resource("/me")
                .route(web::get().to(controller::me))
                .wrap(authentication_middleware::AuthenticationMiddleware(ctx)),
        )
}
