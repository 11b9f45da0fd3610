use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
    pub rate_limit: RateLimitConfig,
    pub booking: BookingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// `development` or `production`; production hides internal error detail.
    pub environment: String,
}

impl ServerConfig {
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Empty means "no database": the in-memory store is used instead.
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RedisConfig {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub frontend_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u64,
    pub window_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingConfig {
    pub reference_attempts: u32,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let jwt_expire = match env::var("JWT_EXPIRE") {
            Ok(raw) => Some(
                parse_duration_secs(&raw)
                    .ok_or_else(|| config::ConfigError::Message(format!("Invalid JWT_EXPIRE: {}", raw)))?
                    .to_string(),
            ),
            Err(_) => None,
        };
        let environment = env::var("APP_ENV").or_else(|_| env::var("NODE_ENV")).ok();

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-mode overrides, e.g. config/production.toml. Optional.
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Untracked developer overrides
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `STAYA__AUTH__JWT_SECRET=...` sets auth.jwt_secret
            .add_source(config::Environment::with_prefix("STAYA").separator("__"))
            // Conventional deployment variables win over everything else
            .set_override_option("server.port", env::var("PORT").ok())?
            .set_override_option("server.environment", environment)?
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .set_override_option("redis.url", env::var("REDIS_URL").ok())?
            .set_override_option("auth.jwt_secret", env::var("JWT_SECRET").ok())?
            .set_override_option("auth.jwt_expiration_seconds", jwt_expire)?
            .set_override_option("cors.frontend_url", env::var("FRONTEND_URL").ok())?
            .build()?;

        s.try_deserialize()
    }
}

/// Parse a span such as `30d`, `12h`, `45m`, `90s` or a bare number of seconds.
pub fn parse_duration_secs(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let (digits, unit) = match raw.char_indices().last() {
        Some((i, c)) if c.is_ascii_alphabetic() => (&raw[..i], Some(c.to_ascii_lowercase())),
        _ => (raw, None),
    };
    let value: u64 = digits.trim().parse().ok()?;
    let scale = match unit {
        None | Some('s') => 1,
        Some('m') => 60,
        Some('h') => 60 * 60,
        Some('d') => 24 * 60 * 60,
        Some('w') => 7 * 24 * 60 * 60,
        Some(_) => return None,
    };
    value.checked_mul(scale)
}
