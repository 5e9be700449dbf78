use crate::storage::resolve_data_path;
use std::{env, path::PathBuf};

const DEFAULT_API_URL: &str = "http://localhost:3000";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub api_url: String,
    pub timezone: String,
    pub notifications: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let api_url = env::var("CLEARNEXT_API_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let timezone = env::var("CLEARNEXT_TIMEZONE")
            .or_else(|_| env::var("TZ"))
            .ok()
            .map(|value| value.trim().trim_start_matches(':').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "UTC".to_string());

        let notifications = env::var("CLEARNEXT_NOTIFICATIONS")
            .map(|value| parse_flag(&value))
            .unwrap_or(false);

        Self {
            port,
            data_path: resolve_data_path(),
            api_url,
            timezone,
            notifications,
        }
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
