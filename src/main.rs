use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::io;

use taskboard::routes::{self, health};
use taskboard::{AppState, Config};

fn cors(origin: Option<&str>) -> Cors {
    let cors = match origin {
        Some(origin) => Cors::default().allowed_origin(origin),
        None => Cors::default().allow_any_origin(),
    };
    cors.allow_any_method().allow_any_header().max_age(3600)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let state = AppState::from_config(&config).await.map_err(|e| {
        log::error!("{}", e);
        io::Error::new(io::ErrorKind::Other, e.to_string())
    })?;

    if config.worker_enabled {
        actix_web::rt::spawn(state.job_worker(&config).run());
    } else {
        log::info!("Job worker disabled; deferred jobs will wait for an external consumer");
    }

    match &config.cors_origin {
        Some(origin) => log::info!("Accepting requests from origin \"{}\"", origin),
        None => log::info!("Accepting requests from any origin"),
    }

    let state = web::Data::new(state);
    let cors_origin = config.cors_origin.clone();

    log::info!("Starting taskboard server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors(cors_origin.as_deref()))
            .wrap(Logger::default())
            .service(health::health)
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
