use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub audit_database_path: String,
    pub admin_token: Option<String>,
    pub admin_email: String,
    pub resend_api_key: Option<String>,
    pub email_from: String,
    /// Probability that the mock settlement resolves a payment as successful.
    pub settlement_success_rate: f64,
    pub audit_log_enabled: bool,
    pub dev_mode: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("ZEROPAY_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let settlement_success_rate = env::var("ZEROPAY_SUCCESS_RATE")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|r| (0.0..=1.0).contains(r))
            .unwrap_or(0.8);

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "zeropay.db".to_string()),
            audit_database_path: env::var("AUDIT_DATABASE_PATH")
                .unwrap_or_else(|_| "zeropay_audit.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").ok(),
            admin_email: env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@zeropay.com".to_string()),
            resend_api_key: env::var("RESEND_API_KEY").ok(),
            email_from: env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "ZeroPay <noreply@zeropay.com>".to_string()),
            settlement_success_rate,
            audit_log_enabled: env::var("AUDIT_LOG_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            dev_mode,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
