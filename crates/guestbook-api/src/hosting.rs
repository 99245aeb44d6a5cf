use serde_json::{Value, json};
use tracing::info;

pub const DEFAULT_API_URL: &str = "https://api.vercel.com/v9/projects";

#[derive(Debug, Clone)]
pub struct HostingConfig {
    pub api_url: String,
    pub project_id: String,
    pub team_id: Option<String>,
    pub token: String,
}

#[derive(Debug, thiserror::Error)]
pub enum HostingError {
    #[error("custom domains are not configured on this server")]
    NotConfigured,

    /// The provider refused the request; carries its message.
    #[error("{0}")]
    Rejected(String),

    #[error("hosting provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Attaches and detaches custom domains on the hosting project.
#[derive(Clone)]
pub struct HostingClient {
    http: reqwest::Client,
    config: HostingConfig,
}

impl HostingClient {
    pub fn new(config: HostingConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub async fn attach_domain(&self, domain: &str) -> Result<(), HostingError> {
        let resp = self
            .http
            .post(self.domains_url(None))
            .bearer_auth(&self.config.token)
            .json(&json!({ "name": domain }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let body: Value = resp.json().await.unwrap_or(Value::Null);
            return Err(HostingError::Rejected(rejection_message(&body)));
        }

        info!("Domain {} attached to project {}", domain, self.config.project_id);
        Ok(())
    }

    pub async fn detach_domain(&self, domain: &str) -> Result<(), HostingError> {
        let resp = self
            .http
            .delete(self.domains_url(Some(domain)))
            .bearer_auth(&self.config.token)
            .send()
            .await?;

        if !resp.status().is_success() {
            let body: Value = resp.json().await.unwrap_or(Value::Null);
            return Err(HostingError::Rejected(rejection_message(&body)));
        }

        info!("Domain {} detached from project {}", domain, self.config.project_id);
        Ok(())
    }

    fn domains_url(&self, domain: Option<&str>) -> String {
        let mut url = format!(
            "{}/{}/domains",
            self.config.api_url.trim_end_matches('/'),
            self.config.project_id
        );
        if let Some(domain) = domain {
            url.push('/');
            url.push_str(domain);
        }
        if let Some(team) = &self.config.team_id {
            url.push_str("?teamId=");
            url.push_str(team);
        }
        url
    }
}

fn rejection_message(body: &Value) -> String {
    body.pointer("/error/message")
        .and_then(Value::as_str)
        .unwrap_or("Failed to add domain to hosting provider")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(team_id: Option<&str>) -> HostingClient {
        HostingClient::new(HostingConfig {
            api_url: "https://api.example.com/v9/projects/".into(),
            project_id: "prj_123".into(),
            team_id: team_id.map(str::to_string),
            token: "tok".into(),
        })
    }

    #[test]
    fn domains_url_without_team() {
        assert_eq!(
            client(None).domains_url(None),
            "https://api.example.com/v9/projects/prj_123/domains"
        );
    }

    #[test]
    fn domains_url_with_team_and_domain() {
        assert_eq!(
            client(Some("team_9")).domains_url(Some("alice.example")),
            "https://api.example.com/v9/projects/prj_123/domains/alice.example?teamId=team_9"
        );
    }

    #[test]
    fn rejection_message_prefers_provider_text() {
        let body = json!({ "error": { "code": "domain_taken", "message": "Domain is in use" } });
        assert_eq!(rejection_message(&body), "Domain is in use");
        assert_eq!(
            rejection_message(&Value::Null),
            "Failed to add domain to hosting provider"
        );
    }
}
