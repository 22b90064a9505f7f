use std::{fs, path::Path};

use anyhow::Context;
use serde::Deserialize;
use tracing::warn;

use crate::session::{SessionConfig, SessionDelivery};

pub const DEV_JWT_SECRET: &str = "fallback_secret";

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_bind: String,
    /// `None` leaves the catalog store unconfigured; data routes answer 503.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub session_ttl_seconds: i64,
    pub session_delivery: SessionDelivery,
    pub secure_cookies: bool,
    pub allow_origin: Option<String>,
    pub password_hash_cost: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:5000".into(),
            database_url: Some("sqlite://./data/storefront.db".into()),
            jwt_secret: DEV_JWT_SECRET.into(),
            session_ttl_seconds: 60 * 60 * 24,
            session_delivery: SessionDelivery::Cookie,
            secure_cookies: false,
            allow_origin: None,
            password_hash_cost: 10,
        }
    }
}

impl Settings {
    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            secret: self.jwt_secret.clone(),
            ttl_seconds: self.session_ttl_seconds,
            delivery: self.session_delivery,
            secure_cookies: self.secure_cookies,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    bind_addr: Option<String>,
    database_url: Option<String>,
    jwt_secret: Option<String>,
    session_ttl_seconds: Option<i64>,
    session_delivery: Option<SessionDelivery>,
    secure_cookies: Option<bool>,
    allow_origin: Option<String>,
    password_hash_cost: Option<u32>,
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new("server.toml"), |key| std::env::var(key).ok())
}

/// Defaults, then the TOML file, then environment; later sources win and
/// `APP__*` names win over the short ones.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => apply_file(&mut settings, file_cfg),
            Err(error) => warn!(path = %path.display(), %error, "ignoring malformed settings file"),
        }
    }

    let lookup = |keys: &[&str]| keys.iter().rev().find_map(|key| env(key));

    if let Some(v) = lookup(&["SERVER_BIND", "APP__BIND_ADDR"]) {
        settings.server_bind = v;
    }
    if let Some(v) = lookup(&["DATABASE_URL", "APP__DATABASE_URL"]) {
        settings.database_url = configured_database_url(&v);
    }
    if let Some(v) = lookup(&["JWT_SECRET", "APP__JWT_SECRET"]) {
        settings.jwt_secret = v;
    }
    if let Some(v) = lookup(&["APP__SESSION_TTL_SECONDS"]) {
        match v.parse::<i64>() {
            Ok(parsed) if parsed > 0 => settings.session_ttl_seconds = parsed,
            _ => warn!(value = %v, "invalid APP__SESSION_TTL_SECONDS, keeping default"),
        }
    }
    if let Some(v) = lookup(&["APP__SESSION_DELIVERY"]) {
        match SessionDelivery::parse(&v) {
            Some(delivery) => settings.session_delivery = delivery,
            None => warn!(value = %v, "unknown APP__SESSION_DELIVERY, keeping default"),
        }
    }
    if let Some(v) = lookup(&["APP__SECURE_COOKIES"]) {
        settings.secure_cookies = matches!(v.trim(), "1" | "true" | "yes");
    }
    if let Some(v) = lookup(&["APP__ALLOW_ORIGIN"]) {
        settings.allow_origin = Some(v).filter(|origin| !origin.trim().is_empty());
    }
    if let Some(v) = lookup(&["APP__PASSWORD_HASH_COST"]) {
        if let Ok(parsed) = v.parse::<u32>() {
            settings.password_hash_cost = parsed;
        }
    }

    settings
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.bind_addr {
        settings.server_bind = v;
    }
    if let Some(v) = file_cfg.database_url {
        settings.database_url = configured_database_url(&v);
    }
    if let Some(v) = file_cfg.jwt_secret {
        settings.jwt_secret = v;
    }
    if let Some(v) = file_cfg.session_ttl_seconds.filter(|ttl| *ttl > 0) {
        settings.session_ttl_seconds = v;
    }
    if let Some(v) = file_cfg.session_delivery {
        settings.session_delivery = v;
    }
    if let Some(v) = file_cfg.secure_cookies {
        settings.secure_cookies = v;
    }
    if let Some(v) = file_cfg.allow_origin {
        settings.allow_origin = Some(v);
    }
    if let Some(v) = file_cfg.password_hash_cost {
        settings.password_hash_cost = v;
    }
}

fn configured_database_url(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(raw.to_string())
    }
}

pub fn prepare_database_url(raw_database_url: &str) -> anyhow::Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

fn ensure_parent_dir_exists(database_url: &str) -> anyhow::Result<()> {
    if database_url.starts_with("sqlite::memory:") {
        return Ok(());
    }
    let Some(path) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or_default();
    let Some(parent) = Path::new(path).parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
