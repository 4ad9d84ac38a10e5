use std::path::PathBuf;

use serde::Deserialize;

/// Process configuration, merged from `appsettings.json` and `APP_`-prefixed
/// environment variables (nested keys split on `__`, e.g. `APP_EMAIL__USER`).
#[derive(Deserialize)]
pub struct AppCfg {
    pub database_url: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub token_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    #[serde(default)]
    pub email: EmailCfg,
}

impl AppCfg {
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.token_ttl_hours)
    }
}

/// SMTP settings. Sending stays disabled unless both `user` and `password`
/// are present.
#[derive(Deserialize)]
pub struct EmailCfg {
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub from: Option<String>,
}

impl Default for EmailCfg {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            user: None,
            password: None,
            from: None,
        }
    }
}

fn default_port() -> u16 {
    3000
}

fn default_token_ttl_hours() -> i64 {
    24
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}
