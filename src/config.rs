use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub api_key: String,
    pub slot_minutes: u32,
    pub seed_demo_data: bool,
    pub public_base_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);

        Self {
            port,
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| ":memory:".to_string()),
            api_key: env::var("API_KEY")
                .unwrap_or_else(|_| "medspa-demo-api-key-2024".to_string()),
            slot_minutes: env::var("SLOT_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|m| *m > 0 && *m <= 24 * 60)
                .unwrap_or(30),
            seed_demo_data: env::var("SEED_DEMO_DATA")
                .map(|v| !matches!(v.to_lowercase().as_str(), "0" | "false" | "no"))
                .unwrap_or(true),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{port}")),
        }
    }
}
