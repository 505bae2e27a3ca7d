use std::io;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use todoforge::{auth::ResetTokenStore, config::Config, db, routes};

fn startup_error<E>(error: E) -> io::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    io::Error::new(io::ErrorKind::Other, error)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(startup_error)?;
    if config.auth.uses_fallback_secret() {
        log::warn!("JWT_SECRET is not set; signing session tokens with an insecure fallback key");
    }

    let pool = db::connect(&config).await.map_err(startup_error)?;
    log::info!("PostgreSQL connected");
    db::init_schema(&pool).await.map_err(startup_error)?;

    let pool_data = web::Data::new(pool.clone());
    let auth_data = web::Data::new(config.auth.clone());
    let reset_tokens = web::Data::new(ResetTokenStore::new(chrono::Duration::seconds(
        config.auth.reset_token_ttl_seconds,
    )));

    log::info!("Starting todo API at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(pool_data.clone())
            .app_data(auth_data.clone())
            .app_data(reset_tokens.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(web::scope("/api").configure(routes::config))
            .default_service(web::to(routes::not_found))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await?;

    log::info!("Shutting down gracefully");
    pool.close().await;
    Ok(())
}
