use serde::{Deserialize, Serialize};
use std::env::var;

lazy_static::lazy_static! {
    pub static ref CFG: AppConfig = AppConfig::load();
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct AppConfig {
    pub(crate) http: HttpConfig,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct HttpConfig {
    pub addr: String,
    pub port: u16,
    pub realm: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0".to_string(),
            port: 3000,
            realm: "git".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Self {
        let config_file_path = var("CONFIG_FILE").unwrap_or("config.toml".to_string());
        match std::fs::read_to_string(&config_file_path) {
            Ok(content) => toml::from_str(&content).expect("Could not parse config file"),
            Err(_) => AppConfig::default(),
        }
    }

    pub fn cfg() -> &'static Self {
        &CFG
    }

    pub fn http() -> &'static HttpConfig {
        &CFG.http
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.http.port, 3000);
        assert_eq!(cfg.http.realm, "git");
    }

    #[test]
    fn test_parse_toml() {
        let cfg: AppConfig = toml::from_str(
            "[http]\naddr = \"127.0.0.1\"\nport = 8080\nrealm = \"private\"\n",
        )
        .unwrap();
        assert_eq!(cfg.http.addr, "127.0.0.1");
        assert_eq!(cfg.http.port, 8080);
        assert_eq!(cfg.http.realm, "private");
    }
}
