use actix_web::web;

pub mod index;
pub mod interactions;
pub mod status;

/// Routes for the HTTP front end. The interactions webhook is only mounted
/// when a Discord public key is configured.
pub fn configure(cfg: &mut web::ServiceConfig, interactions_enabled: bool) {
    cfg.route("/", web::get().to(index::index))
        .route("/status", web::get().to(status::get_status))
        .route("/now", web::get().to(status::get_now));
    if interactions_enabled {
        cfg.route("/interactions", web::post().to(interactions::handle_interaction));
    }
}
