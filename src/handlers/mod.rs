pub mod stats;
pub mod health;

use std::sync::Arc;

use actix_web::web;
use crate::services::cache::ResponseCache;

pub fn config(cache: Arc<ResponseCache>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.service(
            web::scope("/api")
                .configure(health::config)
                .configure(stats::config(cache)),
        );
    }
}
