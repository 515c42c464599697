use std::{env, net::SocketAddr};

use axum::http::HeaderValue;

pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    /// Origin the landing page is served from, for CORS.
    pub cors_origin: HeaderValue,
    pub db_max_connections: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let bind_addr: SocketAddr = env::var("BIND_ADDR")
            .unwrap_or("127.0.0.1:3001".to_string())
            .parse()
            .expect("BIND_ADDR must be a valid socket address");

        let cors_origin: HeaderValue = env::var("CORS_ORIGIN")
            .unwrap_or("http://localhost:3000".to_string())
            .parse()
            .expect("CORS_ORIGIN must be a valid header value");

        let db_max_connections: u32 = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or("5".to_string())
            .parse()
            .expect("DB_MAX_CONNECTIONS must be a valid number");

        Self {
            bind_addr,
            database_url,
            cors_origin,
            db_max_connections,
        }
    }
}
