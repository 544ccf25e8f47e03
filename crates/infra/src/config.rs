//! Runtime configuration read from the environment.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `JWT_SECRET` | development secret (logged as a warning) |
//! | `DATABASE_URL` | unset: in-memory stores |
//! | `BIND_ADDR` | `0.0.0.0:8080` |
//! | `ACCESS_TOKEN_TTL_SECS` | `900` |
//! | `REFRESH_TOKEN_TTL_SECS` | `86400` |
//! | `DATABASE_MAX_CONNECTIONS` | `5` |
//! | `ADMIN_EMAIL` / `ADMIN_PASSWORD` | unset: no admin is seeded |

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};
use tracing::warn;

use ecom_auth::TokenLifetimes;

const DEV_JWT_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub database_max_connections: u32,
    /// Admin account ensured at startup.
    pub admin_seed: Option<AdminSeed>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None => {
                warn!("JWT_SECRET not set; using development default");
                DEV_JWT_SECRET.to_string()
            }
        };

        let database_url = get("DATABASE_URL");
        if database_url.is_none() {
            warn!("DATABASE_URL not set; using in-memory stores");
        }

        let bind_addr = parse_or(&get, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?;
        let access_secs: u64 = parse_or(&get, "ACCESS_TOKEN_TTL_SECS", 15 * 60)?;
        let refresh_secs: u64 = parse_or(&get, "REFRESH_TOKEN_TTL_SECS", 24 * 60 * 60)?;
        let database_max_connections: u32 = parse_or(&get, "DATABASE_MAX_CONNECTIONS", 5)?;

        if access_secs == 0 || refresh_secs == 0 {
            bail!("token lifetimes must be positive");
        }
        if database_max_connections == 0 {
            bail!("DATABASE_MAX_CONNECTIONS must be positive");
        }

        let admin_seed = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed { email, password }),
            (None, None) => None,
            _ => bail!("ADMIN_EMAIL and ADMIN_PASSWORD must be set together"),
        };

        Ok(Self {
            jwt_secret,
            database_url,
            bind_addr,
            access_token_ttl: Duration::from_secs(access_secs),
            refresh_token_ttl: Duration::from_secs(refresh_secs),
            database_max_connections,
            admin_seed,
        })
    }

    pub fn token_lifetimes(&self) -> TokenLifetimes {
        TokenLifetimes {
            access: self.access_token_ttl,
            refresh: self.refresh_token_ttl,
        }
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(config.database_url, None);
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.token_lifetimes(), TokenLifetimes::default());
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.admin_seed, None);
    }

    #[test]
    fn admin_seed_needs_both_halves() {
        let config = AppConfig::from_lookup(lookup(&[
            ("ADMIN_EMAIL", "root@x.com"),
            ("ADMIN_PASSWORD", "pw"),
        ]))
        .unwrap();
        let seed = config.admin_seed.unwrap();
        assert_eq!(seed.email, "root@x.com");
        assert!(!format!("{seed:?}").contains("pw\""));

        assert!(AppConfig::from_lookup(lookup(&[("ADMIN_EMAIL", "root@x.com")])).is_err());
    }

    #[test]
    fn reads_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("JWT_SECRET", "s3cret"),
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("BIND_ADDR", "127.0.0.1:3000"),
            ("ACCESS_TOKEN_TTL_SECS", "60"),
            ("REFRESH_TOKEN_TTL_SECS", "3600"),
        ]))
        .unwrap();
        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/shop"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:3000");
        assert_eq!(config.access_token_ttl, Duration::from_secs(60));
        assert_eq!(config.refresh_token_ttl, Duration::from_secs(3600));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "  ")])).unwrap();
        assert_eq!(config.database_url, None);
    }

    #[test]
    fn rejects_unparseable_and_zero_values() {
        let err = AppConfig::from_lookup(lookup(&[("ACCESS_TOKEN_TTL_SECS", "soon")])).unwrap_err();
        assert!(err.to_string().contains("ACCESS_TOKEN_TTL_SECS"));

        assert!(AppConfig::from_lookup(lookup(&[("REFRESH_TOKEN_TTL_SECS", "0")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("BIND_ADDR", "nowhere")])).is_err());
    }
}
