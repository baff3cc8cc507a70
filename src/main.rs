mod catalog;
mod config;
mod database;
mod error;
mod model;
mod routes;
mod social;

use actix_web::{middleware::Logger, web, App, HttpServer};
use config::Config;
use log::info;
use routes::AppState;

#[actix_rt::main]
async fn main() -> std::io::Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "filmclub=debug,actix_web=info");
    }
    env_logger::init();

    let config = Config::from_env();
    let state = AppState::in_memory();
    info!("Listening on {}", config.bind);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(routes::configure)
    })
    .bind(config.bind)?
    .run()
    .await
}
