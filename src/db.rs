use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::auth::password;
use crate::errors::AppError;
use crate::models::user::{self, NewUser};

pub type DbPool = SqlitePool;

static MIGRATOR: Migrator = sqlx::migrate!();

/// Open the database, creating the file when missing.
///
/// A single connection serializes all transactions, so a guard query and the
/// write depending on it never interleave with another writer.
pub async fn init_pool(database_url: &str) -> Result<DbPool, AppError> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &DbPool) -> Result<(), AppError> {
    MIGRATOR.run(pool).await?;
    log::info!("Database migrations complete");
    Ok(())
}

pub struct GeneratedPassword {
    pub plain: String,
    pub hash: String,
}

/// Passwords generated during one seeding run, keyed by nickname.
#[derive(Default)]
pub struct SeedContext {
    passwords: HashMap<String, GeneratedPassword>,
}

impl SeedContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate (once per nickname) a password and its hash.
    pub fn password_for(&mut self, nickname: &str) -> Result<&GeneratedPassword, AppError> {
        if !self.passwords.contains_key(nickname) {
            let plain = password::generate_password(12);
            let hash = password::hash_password(&plain)?;
            self.passwords
                .insert(nickname.to_string(), GeneratedPassword { plain, hash });
        }
        self.passwords
            .get(nickname)
            .ok_or_else(|| AppError::Hash(format!("no password generated for {nickname}")))
    }

    pub fn generated(&self) -> impl Iterator<Item = (&str, &str)> {
        self.passwords
            .iter()
            .map(|(n, p)| (n.as_str(), p.plain.as_str()))
    }
}

/// Create the admin user when the database has no users yet.
/// Returns whether the admin was created.
pub async fn seed_admin(
    pool: &DbPool,
    nickname: &str,
    ctx: &mut SeedContext,
) -> Result<bool, AppError> {
    let mut conn = pool.acquire().await?;
    let count = user::queries::count(&mut conn).await?;
    if count > 0 {
        log::info!("Database already has {count} users, skipping admin seed");
        return Ok(false);
    }

    let generated = ctx.password_for(nickname)?;
    let admin = NewUser {
        nickname: nickname.to_string(),
        firstname: None,
        lastname: None,
        is_admin: true,
        password_hash: Some(generated.hash.clone()),
    };
    let created = user::queries::create(&mut conn, &admin).await?;
    if created {
        log::info!("Created admin user {nickname:?} with password {:?}", generated.plain);
    }
    Ok(created)
}
