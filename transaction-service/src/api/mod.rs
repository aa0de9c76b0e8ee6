pub mod auth;
pub mod dto;
pub mod handlers;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::transfer)
        .service(handlers::deposit)
        .service(handlers::withdraw)
        .service(handlers::reverse)
        .service(handlers::get_by_id)
        .service(handlers::by_account)
        .service(handlers::search)
        .service(handlers::health);
}
