pub mod auth;
pub mod dto;
pub mod handlers;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::get_account)
        .service(handlers::set_balance)
        .service(handlers::apply_balance_op)
        .service(handlers::health);
}
