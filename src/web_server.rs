use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;

use crate::api;
use crate::app_context::AppContext;

// Route wiring shared by the real server and the test harness
pub fn configure_services(cfg: &mut web::ServiceConfig, ctx: Arc<AppContext>) {
    cfg.service(api::auth::auth_module(ctx))
        .route("/health", web::get().to(api::health::health_check));
}

#[actix_web::main]
pub async fn run_actix_server(ctx: Arc<AppContext>) -> std::io::Result<()> {
    let host = ctx.config.server.host.clone();
    let port = ctx.config.server.port;

    log::info!("starting HTTP server at http://{}:{}", host, port);

    HttpServer::new(move || {
        let ctx = ctx.clone();
        App::new()
            // enable logger
            .wrap(middleware::Logger::default())
            // the CORS middleware must wrap the handlers so it can add
            // headers to error responses too
            .wrap(Cors::permissive())
            .app_data(web::Data::from(ctx.clone()))
            .app_data(web::JsonConfig::default().limit(4096)) // <- limit size of the payload
            .configure(|cfg| configure_services(cfg, ctx))
    })
    .bind((host, port))?
    .run()
    .await
}
