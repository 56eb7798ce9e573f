use actix_web::{web, App, HttpServer};
use env_logger::Env;
use futures::future::{self, Either};
use log::{error, info};
use std::io;
use tokio::net::TcpListener;

use chess_session_server::config::ServerConfig;
use chess_session_server::models::AppState;
use chess_session_server::{routes, tcp};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(Env::new().default_filter_or("info"));

    let config = ServerConfig::from_env().map_err(|e| {
        error!("{}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let app_state = web::Data::new(AppState::new());

    let listener = TcpListener::bind(config.tcp_addr).await?;
    let tcp_server = tcp::serve(
        listener,
        app_state.clone().into_inner(),
        config.max_frame_len,
    );

    info!("Starting HTTP server on {}", config.http_addr);
    let http_state = app_state.clone();
    let http_server = HttpServer::new(move || {
        App::new()
            .app_data(http_state.clone())
            .configure(routes::configure_routes)
    })
    .bind(config.http_addr)?
    .run();

    match future::select(Box::pin(tcp_server), Box::pin(http_server)).await {
        Either::Left((result, _)) => result,
        Either::Right((result, _)) => result,
    }
}
