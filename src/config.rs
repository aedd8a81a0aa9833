// config.rs
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub app_url: String,
    pub jwt_secret: String,
    pub jwt_maxage: i64,
    pub port: u16,
    // Payment gateway configuration
    pub stripe_secret_key: String,
    // Platform fee in basis points (2000 = 20%)
    pub platform_fee_bps: i64,
    // Task ingestion webhook signing secret (optional; unsigned when absent)
    pub task_webhook_secret: Option<String>,
    // Email service configuration
    pub smtp_host: String,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_email: String,
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let jwt_secret = std::env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set");
        let jwt_maxage = std::env::var("JWT_MAXAGE").expect("JWT_MAXAGE must be set");
        let app_url = std::env::var("APP_URL").expect("APP_URL must be set");

        let stripe_secret_key = std::env::var("STRIPE_SECRET_KEY")
            .unwrap_or_else(|_| "sk_test_placeholder".to_string());

        let platform_fee_bps = std::env::var("PLATFORM_FEE_BPS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(2000);

        let task_webhook_secret = std::env::var("TASK_WEBHOOK_SECRET").ok();

        let smtp_host = std::env::var("SMTP_HOST")
            .unwrap_or_else(|_| "localhost".to_string());
        let smtp_username = std::env::var("SMTP_USERNAME")
            .unwrap_or_else(|_| "".to_string());
        let smtp_password = std::env::var("SMTP_PASSWORD")
            .unwrap_or_else(|_| "".to_string());
        let from_email = std::env::var("FROM_EMAIL")
            .unwrap_or_else(|_| "noreply@cleancrm.local".to_string());

        Config {
            database_url,
            app_url,
            jwt_secret,
            jwt_maxage: jwt_maxage.parse::<i64>().unwrap(),
            port: 8000,
            stripe_secret_key,
            platform_fee_bps,
            task_webhook_secret,
            smtp_host,
            smtp_username,
            smtp_password,
            from_email,
        }
    }
}
