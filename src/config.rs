use anyhow::Context;

pub const DEFAULT_IMAGE_URL_TEMPLATE: &str =
    "https://cdn.cloudflare.steamstatic.com/steam/apps/{externalId}/header.jpg";

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Limits and defaults applied to game payloads.
#[derive(Debug, Clone)]
pub struct GameRules {
    pub max_title_len: usize,
    /// `{externalId}` is replaced with the record's external catalog id.
    pub image_url_template: String,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            max_title_len: 100,
            image_url_template: DEFAULT_IMAGE_URL_TEMPLATE.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres {
        database_url: String,
        max_connections: u32,
    },
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub jwt: JwtConfig,
    pub games: GameRules,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store = match lookup("STORE_BACKEND").as_deref().unwrap_or("postgres") {
            "postgres" => StoreBackend::Postgres {
                database_url: lookup("DATABASE_URL")
                    .context("DATABASE_URL is required for the postgres backend")?,
                max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            },
            "memory" => StoreBackend::Memory,
            other => anyhow::bail!("unknown STORE_BACKEND {other:?}; expected postgres or memory"),
        };

        let jwt = JwtConfig {
            secret: lookup("JWT_SECRET").context("JWT_SECRET is required")?,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "gametracker".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "gametracker-users".into()),
            ttl_minutes: parse_or(&lookup, "JWT_TTL_MINUTES", 60)?,
            refresh_ttl_minutes: parse_or(&lookup, "JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14)?,
        };

        let defaults = GameRules::default();
        let games = GameRules {
            max_title_len: parse_or(&lookup, "MAX_TITLE_LEN", defaults.max_title_len)?,
            image_url_template: lookup("IMAGE_URL_TEMPLATE")
                .unwrap_or(defaults.image_url_template),
        };
        anyhow::ensure!(
            games.image_url_template.contains("{externalId}"),
            "IMAGE_URL_TEMPLATE must contain the {{externalId}} placeholder"
        );

        Ok(Self { store, jwt, games })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn postgres_is_the_default_backend() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/games"),
            ("JWT_SECRET", "s3cret"),
        ]))
        .expect("config");

        assert_eq!(
            cfg.store,
            StoreBackend::Postgres {
                database_url: "postgres://localhost/games".into(),
                max_connections: 10,
            }
        );
        assert_eq!(cfg.jwt.issuer, "gametracker");
        assert_eq!(cfg.jwt.ttl_minutes, 60);
        assert_eq!(cfg.games.max_title_len, 100);
        assert_eq!(cfg.games.image_url_template, DEFAULT_IMAGE_URL_TEMPLATE);
    }

    #[test]
    fn memory_backend_needs_no_database_url() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("STORE_BACKEND", "memory"),
            ("JWT_SECRET", "s3cret"),
            ("MAX_TITLE_LEN", "42"),
        ]))
        .expect("config");
        assert_eq!(cfg.store, StoreBackend::Memory);
        assert_eq!(cfg.games.max_title_len, 42);
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = AppConfig::from_lookup(lookup_from(&[("STORE_BACKEND", "memory")])).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn rejects_unparseable_numbers_and_unknown_backends() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("STORE_BACKEND", "memory"),
            ("JWT_SECRET", "s3cret"),
            ("JWT_TTL_MINUTES", "soon"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("JWT_TTL_MINUTES"));

        let err = AppConfig::from_lookup(lookup_from(&[
            ("STORE_BACKEND", "mongo"),
            ("JWT_SECRET", "s3cret"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("mongo"));
    }

    #[test]
    fn image_template_needs_placeholder() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("STORE_BACKEND", "memory"),
            ("JWT_SECRET", "s3cret"),
            ("IMAGE_URL_TEMPLATE", "https://img.example.com/header.jpg"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("{externalId}"));
    }
}
