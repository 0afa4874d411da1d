use anyhow::{Result, anyhow};
use config::{Config, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub auth: Auth,
    pub http: Http,
    pub log: Log,
    pub session: Session,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct Auth {
    pub issuer: String,
    /// Name of the environment variable holding the HMAC signing key.
    pub signing_key_env: String,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
    pub argon2: Argon2,
}

#[derive(Debug, Deserialize)]
pub struct Argon2 {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Deserialize)]
pub struct Session {
    pub backend: String, // "fake" or "real"
    pub redis_dsn_env: String,
    pub key_prefix: String,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub backend: String, // "fake" or "real"
    pub mysql_dsn_env: String,
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_settings_parse() {
        let settings = parse_settings(Some("settings/dev.toml")).unwrap();
        assert_eq!(settings.auth.access_ttl_secs, 3600);
        assert_eq!(settings.auth.refresh_ttl_secs, 7 * 24 * 60 * 60);
        assert_eq!(settings.user.backend, "fake");
        assert_eq!(settings.session.backend, "fake");
        assert!(settings.http.cert_path.is_none());
    }

    #[test]
    fn release_settings_parse() {
        let settings = parse_settings(Some("settings/release.toml")).unwrap();
        assert_eq!(settings.user.backend, "real");
        assert_eq!(settings.session.backend, "real");
        assert!(settings.http.cert_path.is_some());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(parse_settings(Some("")).is_err());
        assert!(parse_settings(Some("settings/does-not-exist.toml")).is_err());
    }
}
