use dotenv::dotenv;
use std::env;

/// Process-wide configuration, loaded once at startup. The signing secret is
/// read here and injected into the token service; nothing else reads it.
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub secret_key: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        // Load .env file
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let secret_key = env::var("SECRET_KEY").expect("SECRET_KEY must be set");
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(3000);

        Self {
            database_url,
            secret_key,
            port,
        }
    }
}
