use axum::http::{header, HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use storage::StoredAdminUser;

pub const SESSION_COOKIE: &str = "admin_token";

/// How the login endpoint hands the session token to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionDelivery {
    /// HTTP-only `admin_token` cookie.
    #[default]
    Cookie,
    /// `token` field of the JSON response.
    Body,
}

impl SessionDelivery {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "cookie" => Some(Self::Cookie),
            "body" | "json" => Some(Self::Body),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub secret: String,
    pub ttl_seconds: i64,
    pub delivery: SessionDelivery,
    pub secure_cookies: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub email: String,
    pub name: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn mint_token(
    cfg: &SessionConfig,
    admin: &StoredAdminUser,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let exp = now + Duration::seconds(cfg.ttl_seconds);
    let claims = SessionClaims {
        sub: format!("admin:{}", admin.id.0),
        email: admin.email.clone(),
        name: admin.name.clone(),
        iat: now.timestamp(),
        exp: exp.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(cfg.secret.as_bytes()),
    )
}

/// Checks signature and expiry.
pub fn verify_token(
    cfg: &SessionConfig,
    token: &str,
) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(cfg.secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

pub fn session_cookie(cfg: &SessionConfig, token: &str) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        cfg.ttl_seconds
    );
    if cfg.secure_cookies {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn cleared_session_cookie(cfg: &SessionConfig) -> String {
    let mut cookie = format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0");
    if cfg.secure_cookies {
        cookie.push_str("; Secure");
    }
    cookie
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
}

/// Presence check only; the route guard does not validate the token.
pub fn has_session_cookie(headers: &HeaderMap) -> bool {
    cookie_value(headers, SESSION_COOKIE).is_some_and(|v| !v.is_empty())
}

/// Candidate tokens in lookup order: the session cookie, then
/// `Authorization` with or without the `Bearer` scheme.
pub fn session_tokens(headers: &HeaderMap) -> Vec<String> {
    let cookie = cookie_value(headers, SESSION_COOKIE).filter(|v| !v.is_empty());
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|raw| match raw.trim().split_once(' ') {
            Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
            _ if raw.trim().eq_ignore_ascii_case("bearer") => "",
            _ => raw.trim(),
        })
        .filter(|token| !token.is_empty());
    cookie.into_iter().chain(bearer).map(str::to_string).collect()
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
