// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup into a
//! [`Config`] that is then shared by reference. Missing or invalid values
//! fail startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `OIDC_DOMAIN` | Identity provider domain | Required |
//! | `OIDC_IDENTIFIER` | Expected token audience | Required |
//! | `OIDC_ISSUER` | Expected token issuer | `https://<OIDC_DOMAIN>/` |
//! | `OIDC_JWKS_URL` | JWKS endpoint | `https://<OIDC_DOMAIN>/.well-known/jwks.json` |
//! | `OIDC_USERINFO_URL` | Userinfo endpoint | `https://<OIDC_DOMAIN>/userinfo` |
//! | `OIDC_GROUPS_CLAIM` | Userinfo member holding groups | `https://sso.mozilla.com/claim/groups` |
//! | `LANDING_GROUPS` | Comma-separated groups allowed to land | `active_scm_level_3` |
//! | `TOKEN_LEEWAY_SECONDS` | Clock skew tolerance on `exp` | `0` |
//! | `AUTH0_TIMEOUT_SECONDS` | Timeout for identity provider calls | `10` |
//! | `JWKS_CACHE_TTL_SECONDS` | Signing key cache TTL | `300` |
//! | `TRANSPLANT_URL` | Transplant service base URL | Required |
//! | `TRANSPLANT_API_KEY` | Pingback shared secret | Unset (pingbacks rejected) |
//! | `TRANSPLANT_TREE` | Tree name sent to transplant | `mozilla-central` |
//! | `TRANSPLANT_DESTINATION` | Destination repository URL | `https://hg.mozilla.org/mozilla-central` |
//! | `TRANSPLANT_TIMEOUT_SECONDS` | Timeout for transplant calls | `30` |
//! | `PINGBACK_ENABLED` | `y` enables pingbacks | `n` |
//! | `PINGBACK_URL` | Pingback URL handed to transplant; must be routable | `http://<HOST>:<PORT>/landings/update` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use url::{Host, Url};

pub const DEFAULT_GROUPS_CLAIM: &str = "https://sso.mozilla.com/claim/groups";
pub const DEFAULT_LANDING_GROUP: &str = "active_scm_level_3";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),

    #[error("invalid configuration {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,

    pub issuer: String,
    pub audience: String,
    pub jwks_url: String,
    pub userinfo_url: String,
    pub groups_claim: String,
    pub landing_groups: Arc<[String]>,
    pub token_leeway: u64,
    pub auth0_timeout: Duration,
    pub jwks_cache_ttl: Duration,

    pub transplant_url: String,
    pub transplant_api_key: Option<String>,
    pub transplant_tree: String,
    pub transplant_destination: String,
    pub transplant_timeout: Duration,
    pub pingback_enabled: bool,
    pub pingback_url: String,

    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = parse_or("PORT", get("PORT"), 8080)?;

        let domain = required("OIDC_DOMAIN")?;
        let audience = required("OIDC_IDENTIFIER")?;
        let issuer = get("OIDC_ISSUER").unwrap_or_else(|| format!("https://{domain}/"));
        let jwks_url = url_or(
            "OIDC_JWKS_URL",
            get("OIDC_JWKS_URL"),
            format!("https://{domain}/.well-known/jwks.json"),
        )?;
        let userinfo_url = url_or(
            "OIDC_USERINFO_URL",
            get("OIDC_USERINFO_URL"),
            format!("https://{domain}/userinfo"),
        )?;
        let groups_claim =
            get("OIDC_GROUPS_CLAIM").unwrap_or_else(|| DEFAULT_GROUPS_CLAIM.to_string());

        let landing_groups: Vec<String> = get("LANDING_GROUPS")
            .unwrap_or_else(|| DEFAULT_LANDING_GROUP.to_string())
            .split(',')
            .map(|group| group.trim().to_string())
            .filter(|group| !group.is_empty())
            .collect();
        if landing_groups.is_empty() {
            return Err(ConfigError::Invalid {
                key: "LANDING_GROUPS",
                reason: "at least one group is required".to_string(),
            });
        }

        let token_leeway: u64 = parse_or("TOKEN_LEEWAY_SECONDS", get("TOKEN_LEEWAY_SECONDS"), 0)?;
        let auth0_timeout = Duration::from_secs(parse_or(
            "AUTH0_TIMEOUT_SECONDS",
            get("AUTH0_TIMEOUT_SECONDS"),
            10,
        )?);
        let jwks_cache_ttl = Duration::from_secs(parse_or(
            "JWKS_CACHE_TTL_SECONDS",
            get("JWKS_CACHE_TTL_SECONDS"),
            300,
        )?);

        let transplant_url = required("TRANSPLANT_URL")?;
        check_url("TRANSPLANT_URL", &transplant_url)?;
        let transplant_api_key = get("TRANSPLANT_API_KEY");
        let transplant_tree =
            get("TRANSPLANT_TREE").unwrap_or_else(|| "mozilla-central".to_string());
        let transplant_destination = get("TRANSPLANT_DESTINATION")
            .unwrap_or_else(|| "https://hg.mozilla.org/mozilla-central".to_string());

        let transplant_timeout = Duration::from_secs(parse_or(
            "TRANSPLANT_TIMEOUT_SECONDS",
            get("TRANSPLANT_TIMEOUT_SECONDS"),
            30,
        )?);

        let pingback_enabled = get("PINGBACK_ENABLED").as_deref() == Some("y");
        let pingback_url = url_or(
            "PINGBACK_URL",
            get("PINGBACK_URL"),
            format!("http://{host}:{port}/landings/update"),
        )?;
        check_routable("PINGBACK_URL", &pingback_url)?;

        let log_format = match get("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            host,
            port,
            issuer,
            audience,
            jwks_url,
            userinfo_url,
            groups_claim,
            landing_groups: Arc::from(landing_groups),
            token_leeway,
            auth0_timeout,
            jwks_cache_ttl,
            transplant_url,
            transplant_api_key,
            transplant_tree,
            transplant_destination,
            transplant_timeout,
            pingback_enabled,
            pingback_url,
            log_format,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                key: "HOST",
                reason: e.to_string(),
            })
    }
}

fn parse_or<T>(key: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn url_or(key: &'static str, value: Option<String>, default: String) -> Result<String, ConfigError> {
    let url = value.unwrap_or(default);
    check_url(key, &url)?;
    Ok(url)
}

fn check_url(key: &'static str, url: &str) -> Result<(), ConfigError> {
    Url::parse(url).map(|_| ()).map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}

/// Transplant calls back on this URL, so it must name a reachable host.
fn check_routable(key: &'static str, url: &str) -> Result<(), ConfigError> {
    let parsed = Url::parse(url).map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })?;
    let unspecified = match parsed.host() {
        Some(Host::Ipv4(ip)) => ip.is_unspecified(),
        Some(Host::Ipv6(ip)) => ip.is_unspecified(),
        Some(Host::Domain(_)) => false,
        None => true,
    };
    if unspecified {
        return Err(ConfigError::Invalid {
            key,
            reason: format!("{url} is not reachable by transplant; set an externally routable URL"),
        });
    }
    Ok(())
}
