use actix_session::{SessionMiddleware, config::PersistentSession, storage::CookieSessionStore};
use actix_web::{App, HttpServer, cookie::Key, cookie::time::Duration, middleware, web};

use quorum::auth::{self, throttle::LoginThrottle};
use quorum::config::Config;
use quorum::{db, handlers};

/// Directory of a `sqlite://` file URL, if it has one.
fn sqlite_parent_dir(database_url: &str) -> Option<std::path::PathBuf> {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next()?;
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    std::path::Path::new(path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    let config = Config::from_env().map_err(std::io::Error::other)?;

    if let Some(dir) = sqlite_parent_dir(&config.database_url) {
        std::fs::create_dir_all(&dir)?;
    }

    let pool = db::init_pool(&config.database_url)
        .await
        .map_err(std::io::Error::other)?;
    db::run_migrations(&pool)
        .await
        .map_err(std::io::Error::other)?;

    let mut seed = db::SeedContext::new();
    db::seed_admin(&pool, &config.admin_nickname, &mut seed)
        .await
        .map_err(std::io::Error::other)?;

    let secret_key = match (config.usable_session_key(), config.session_key.as_deref()) {
        (Some(key), _) => {
            log::info!("Using SESSION_KEY from environment");
            Key::from(key.as_bytes())
        }
        (None, Some(short)) => {
            log::warn!(
                "SESSION_KEY too short ({} bytes, need {}+), generating random key",
                short.len(),
                quorum::config::SESSION_KEY_MIN_LEN
            );
            Key::generate()
        }
        (None, None) => {
            log::warn!("No SESSION_KEY set, generating random key (sessions lost on restart)");
            Key::generate()
        }
    };

    let session_ttl = Duration::hours(config.session_max_age_hours);
    let throttle = LoginThrottle::new();

    log::info!("Starting server at http://{}", config.bind);

    HttpServer::new(move || {
        let session_mw =
            SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                .cookie_secure(false)
                .cookie_http_only(true)
                .session_lifecycle(PersistentSession::default().session_ttl(session_ttl))
                .build();

        App::new()
            .wrap(session_mw)
            .wrap(middleware::Logger::default())
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(throttle.clone()))
            // Public routes
            .route("/login", web::post().to(handlers::auth_handlers::login))
            .route("/logout", web::post().to(handlers::auth_handlers::logout))
            // Protected routes
            .service(
                web::scope("")
                    .wrap(middleware::from_fn(auth::middleware::require_auth))
                    .configure(handlers::configure),
            )
    })
    .bind(&config.bind)?
    .run()
    .await
}
