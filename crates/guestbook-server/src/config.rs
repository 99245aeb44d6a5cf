use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use guestbook_api::hosting::{DEFAULT_API_URL, HostingConfig};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["secret", "change-me-to-a-random-string", "dev-secret-change-me"];

#[derive(Debug)]
pub struct Config {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub token_ttl_days: i64,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub hosting: Option<HostingConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = get("GUESTBOOK_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("GUESTBOOK_JWT_SECRET is unset or still a placeholder");
        }

        let token_ttl_days: i64 = get("GUESTBOOK_TOKEN_TTL_DAYS")
            .unwrap_or_else(|| "30".into())
            .parse()
            .context("GUESTBOOK_TOKEN_TTL_DAYS must be an integer")?;
        if token_ttl_days <= 0 {
            bail!("GUESTBOOK_TOKEN_TTL_DAYS must be positive");
        }

        let port: u16 = get("GUESTBOOK_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("GUESTBOOK_PORT must be a port number")?;

        let hosting = match (get("VERCEL_API_TOKEN"), get("PROJECT_ID_VERCEL")) {
            (Some(token), Some(project_id)) if !token.is_empty() && !project_id.is_empty() => {
                Some(HostingConfig {
                    api_url: get("VERCEL_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into()),
                    project_id,
                    team_id: get("TEAM_ID_VERCEL").filter(|t| !t.is_empty()),
                    token,
                })
            }
            _ => None,
        };

        Ok(Self {
            jwt_secret,
            jwt_issuer: get("GUESTBOOK_JWT_ISSUER").unwrap_or_else(|| "guestbook".into()),
            token_ttl_days,
            db_path: get("GUESTBOOK_DB_PATH").unwrap_or_else(|| "guestbook.db".into()).into(),
            host: get("GUESTBOOK_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            hosting,
        })
    }
}
