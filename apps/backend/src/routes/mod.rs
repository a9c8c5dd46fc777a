use actix_web::web;

pub mod health;
pub mod realtime;
pub mod rooms;
pub mod sessions;

/// Register every route. Shared by `main.rs` and the route tests so both
/// exercise the same paths; middleware is wrapped by the caller.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/health").configure(health::configure_routes));
    cfg.service(web::scope("/api/sessions").configure(sessions::configure_routes));
    cfg.service(web::scope("/api/rooms").configure(rooms::configure_routes));
    cfg.service(web::scope("/ws").configure(realtime::configure_routes));
}
