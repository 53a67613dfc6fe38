use actix_web::{web, App, HttpServer};
use std::sync::Arc;

mod config;
mod github;
mod handlers;
mod netlify;

use config::ProxyConfig;
use github::{ContentsApi, GitHubContents};
use netlify::{BuildHook, NetlifyHook};

/// Shared application state
pub struct AppState {
    pub config: ProxyConfig,
    pub contents: Option<Arc<dyn ContentsApi>>,
    pub hook: Option<Arc<dyn BuildHook>>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();
    log::info!("Starting folio proxy");

    let config = ProxyConfig::from_env();

    let contents: Option<Arc<dyn ContentsApi>> = match GitHubContents::from_config(&config) {
        Ok(api) => Some(Arc::new(api)),
        Err(e) => {
            log::warn!("GitHub persistence disabled: {e}");
            None
        }
    };

    let hook: Option<Arc<dyn BuildHook>> = match config.build_hook_url.as_deref() {
        Some(url) => Some(Arc::new(NetlifyHook::new(url).map_err(std::io::Error::other)?)),
        None => {
            log::warn!("NETLIFY_BUILD_HOOK_URL not set, /deploy will answer 500");
            None
        }
    };

    let host = config.host.clone();
    let port = config.port;
    let state = web::Data::new(AppState {
        config,
        contents,
        hook,
    });

    log::info!("Listening on {host}:{port}");
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(handlers::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
