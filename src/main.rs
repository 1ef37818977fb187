use clap::Parser;
use std::process;
use std::sync::Arc;

use legends_auth::app_context::AppContext;
use legends_auth::args::LegendsAuthArgs;
use legends_auth::config_loader;
use legends_auth::web_server;

fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let args = LegendsAuthArgs::parse();

    let config = match config_loader::load_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            process::exit(1);
        }
    };

    // Fail closed: without its secrets the server cannot verify anything,
    // so it refuses to start rather than fall back to defaults.
    let secrets = match config_loader::load_secrets() {
        Ok(secrets) => secrets,
        Err(e) => {
            log::error!("{}", e);
            process::exit(1);
        }
    };

    let ctx = Arc::new(AppContext::new(config, secrets));
    web_server::run_actix_server(ctx)
}
