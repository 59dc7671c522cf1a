// Route exports
pub mod itineraries;

use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(itineraries::configure),
    );
}
