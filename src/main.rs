use actix_cors::Cors;
use actix_web::{cookie::Key, middleware::{DefaultHeaders, Logger, NormalizePath, TrailingSlash}, web, App, HttpServer};
use clap::Parser;
use r2d2_sqlite::SqliteConnectionManager;
use std::convert::TryFrom;
use std::fs;
use std::path::PathBuf;
use supplychain_backend::{config::Config, routes, session_middleware, setup::db_setup, AppState};
use tera::Tera;

#[derive(Parser, Debug)]
#[command(name = "supplychain_server", author, version, about = "Starts the council supply chain web server.")]
struct Cli {
    /// Path to the .env configuration file.
    #[arg(long, required = true, value_name = "FILE")]
    env_file: PathBuf,
}

fn cors_for(allowed_origins: &str) -> Cors {
    let cors = if allowed_origins.trim() == "*" {
        Cors::default().allow_any_origin()
    } else {
        allowed_origins
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    };
    cors.allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![actix_web::http::header::ACCEPT, actix_web::http::header::CONTENT_TYPE])
        .supports_credentials()
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env(&cli.env_file)
        .expect("FATAL: Failed to load or parse configuration.");

    env_logger::init_from_env(env_logger::Env::new().default_filter_or(&config.log_level));

    let tera = Tera::new("templates/**/*.html").expect("Tera initialization failed");

    let db_file = config.db_file_path();
    if !db_file.exists() {
        panic!(
            "FATAL: {} not found. Run 'cargo run --bin setup_cli -- --env-file <path> db setup'",
            db_file.display()
        );
    }
    let pool = db_setup::build_pool(SqliteConnectionManager::file(&db_file))
        .expect("FATAL: Failed to create Rusqlite connection pool.");

    fs::create_dir_all(config.event_images_path())
        .expect("Failed to create media directory");

    let app_state = web::Data::new(AppState::from_config(&config));

    let session_key_bytes = hex::decode(&config.session_secret_key)
        .expect("FATAL: SESSION_SECRET_KEY in .env is not a valid hex string.");
    let session_key = Key::try_from(session_key_bytes.as_slice())
        .expect("FATAL: The decoded SESSION_SECRET_KEY is not long enough (minimum 64 bytes required).");

    let server_address = format!("{}:{}", config.web.host, config.web.port);
    log::info!(
        "Filter policy: {}, upload limit: {}MB",
        config.filter_policy.as_str(),
        config.max_upload_size_mb
    );
    println!("🚀 Server starting at http://{}", server_address);

    HttpServer::new(move || {
        App::new()
            .wrap(cors_for(&config.allowed_origins))
            .wrap(Logger::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY"))
                    .add(("X-XSS-Protection", "1; mode=block")),
            )
            .app_data(web::Data::new(tera.clone()))
            .app_data(web::Data::new(pool.clone()))
            .app_data(app_state.clone())
            .service(actix_files::Files::new("/media", &config.media_path))
            .service(actix_files::Files::new("/static", "./static"))
            .service(
                web::scope("")
                    .wrap(session_middleware(session_key.clone(), config.use_secure_cookies))
                    .wrap(NormalizePath::new(TrailingSlash::MergeOnly))
                    .configure(routes::config_site)
                    .default_service(web::to(routes::page_not_found)),
            )
    })
    .bind(server_address)?
    .run()
    .await
}
