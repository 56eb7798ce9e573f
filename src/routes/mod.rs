use actix_web::{web, HttpResponse, Responder};

use crate::models::AppState;

/// HTTP handler for the index page
pub async fn index() -> impl Responder {
    HttpResponse::Ok().body("Chess Session Server")
}

/// Lobby listing of live games
pub async fn list_games(app_state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(app_state.registry.summaries())
}

/// Configure the HTTP routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/ws").route(web::get().to(crate::websocket::ws_index)))
        .service(web::resource("/games").route(web::get().to(list_games)))
        .service(web::resource("/").route(web::get().to(index)));
}
