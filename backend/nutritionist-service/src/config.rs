/// Configuration management for nutritionist-service
///
/// All settings come from environment variables (optionally seeded from a
/// `.env` file by the binary).
use db_pool::env_utils::{env_or, parse_env_with_default};
use db_pool::DbConfig;

const SERVICE_NAME: &str = "nutritionist-service";

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Database pool configuration
    pub database: DbConfig,
    /// Image URL resolution
    pub images: ImageConfig,
    /// Top-rated listing
    pub ranking: RankingConfig,
}

/// Application settings
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

/// CORS configuration
#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

impl CorsConfig {
    pub fn origins(&self) -> impl Iterator<Item = &str> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct ImageConfig {
    /// Base URL that relative image references are joined onto
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct RankingConfig {
    /// Eligible nutritionists considered per top-rated request
    pub candidate_pool_cap: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            candidate_pool_cap: 20,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app = AppConfig {
            env: env_or("APP_ENV", "development"),
            host: env_or("NUTRITIONIST_SERVICE_HOST", "0.0.0.0"),
            port: parse_env_with_default("NUTRITIONIST_SERVICE_PORT", 8090),
        };

        let cors = {
            let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                Ok(value) => value,
                Err(_) if app.is_production() => {
                    return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                }
                Err(_) => "http://localhost:3000".to_string(),
            };

            if app.is_production() && allowed_origins.split(',').any(|o| o.trim() == "*") {
                return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
            }

            CorsConfig { allowed_origins }
        };

        let database = DbConfig::from_env(SERVICE_NAME)?;

        let images = ImageConfig {
            base_url: env_or("IMAGE_BASE_URL", "http://localhost:8090/upload/images"),
        };

        let candidate_pool_cap: usize = parse_env_with_default(
            "TOP_RATED_POOL_CAP",
            RankingConfig::default().candidate_pool_cap,
        );
        if candidate_pool_cap == 0 {
            return Err("TOP_RATED_POOL_CAP must be at least 1".to_string());
        }

        Ok(Config {
            app,
            cors,
            database,
            images,
            ranking: RankingConfig { candidate_pool_cap },
        })
    }
}
