mod classifier;
mod conditions;
mod config;
mod error;
mod pipeline;
mod routes;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use classifier::ClassifierHandle;
use config::{AppConfig, ModelSpec};
use pipeline::Pipeline;
use routes::configure_routes;

fn startup_error(e: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(e.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        startup_error(e)
    })?;

    let spec = ModelSpec::load(&config.model_manifest).map_err(|e| {
        log::error!("{}", e);
        startup_error(e)
    })?;
    log::info!(
        "Model {} ({:?}) from {}",
        spec.version,
        spec.backend,
        spec.artifact.display()
    );

    let handle = ClassifierHandle::new(classifier::loader_for(&spec));
    let pipeline = Pipeline::new(handle.clone(), spec.labels.clone());

    if config.preload_model {
        log::info!("Pre-loading skin condition model...");
        match handle.get().await {
            Ok(_) => log::info!("Model loaded successfully"),
            Err(e) => log::error!("Failed to pre-load model: {}", e),
        }
    }

    let bind_address = config.bind_address();
    let static_dir = config.static_dir.clone();
    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::AUTHORIZATION,
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(web::Data::new(pipeline.clone()))
            .app_data(web::Data::new(config.clone()))
            .configure(|cfg| configure_routes(cfg, &static_dir))
    })
    .bind(&bind_address)?
    .run()
    .await
}
