use std::env;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub secure_cookies: bool,
    /// Artificial latency on login and signup.
    pub login_delay: Duration,
}

impl Config {
    fn get_env(key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.trim().is_empty())
    }

    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let bind_addr = Self::get_env("BIND_ADDR")
            .and_then(|v| match v.parse() {
                Ok(addr) => Some(addr),
                Err(e) => {
                    tracing::warn!("Ignoring BIND_ADDR={v}: {e}");
                    None
                }
            })
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

        let login_delay_ms = Self::get_env("LOGIN_DELAY_MS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(1000);

        Config {
            database_url: Self::get_env("DATABASE_URL")
                .unwrap_or_else(|| "sqlite:data/bagroom.db".to_string()),
            bind_addr,
            secure_cookies: Self::get_env("SECURE_COOKIES")
                .is_some_and(|v| matches!(v.as_str(), "1" | "true" | "yes")),
            login_delay: Duration::from_millis(login_delay_ms),
        }
    }
}
