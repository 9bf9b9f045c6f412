//! OAuth2 authorization-code login against the wiki's identity provider.

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

use crate::config::OAuthConfig;

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("State mismatch")]
    StateMismatch,
    #[error("Missing authorization code")]
    MissingCode,
    #[error("Network Error: {0}")]
    Network(String),
    #[error("Token exchange failed: {0}")]
    Exchange(String),
    #[error("No accessible wiki sites for this token")]
    NoAccessibleResources,
    #[error("Remote call failed {status}: {body}")]
    Remote { status: u16, body: String },
}

impl OAuthError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, OAuthError::StateMismatch | OAuthError::MissingCode)
    }
}

impl From<reqwest::Error> for OAuthError {
    fn from(e: reqwest::Error) -> Self {
        OAuthError::Network(e.to_string())
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct AccessibleResource {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    body: PageBody,
}

#[derive(Debug, Deserialize, Default)]
struct PageBody {
    #[serde(default)]
    storage: PageStorage,
}

#[derive(Debug, Deserialize, Default)]
struct PageStorage {
    #[serde(default)]
    value: String,
}

pub struct WikiOAuth {
    client: Client,
    config: OAuthConfig,
    state: String,
}

impl WikiOAuth {
    /// The state token is generated once and checked on every callback.
    pub fn new(config: OAuthConfig) -> Self {
        Self::with_state(config, uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn with_state(config: OAuthConfig, state: String) -> Self {
        Self {
            client: Client::new(),
            config,
            state,
        }
    }

    pub fn authorize_url(&self) -> String {
        format!(
            "{}?audience=api.atlassian.com&client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&prompt=consent",
            self.config.authorize_url,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode(&self.config.scopes.join(" ")),
            urlencoding::encode(&self.state),
        )
    }

    /// Validates the callback, exchanges the code and fetches the configured page.
    pub async fn complete_login(&self, code: Option<&str>, state: Option<&str>) -> Result<String, OAuthError> {
        if state != Some(self.state.as_str()) {
            return Err(OAuthError::StateMismatch);
        }
        let code = code.filter(|c| !c.is_empty()).ok_or(OAuthError::MissingCode)?;

        let token = self.exchange_code(code).await?;
        let site = self.first_site(&token.access_token).await?;
        info!("OAuth login connected to site {} ({})", site.name, site.id);

        match &self.config.page_id {
            Some(page_id) => self.fetch_page(&site.id, page_id, &token.access_token).await,
            None => Ok(format!("Connected to {} ({})", site.name, site.id)),
        }
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, OAuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        let response = self.client.post(&self.config.token_url).form(&params).send().await?;
        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Token exchange failed: {}", error_text);
            return Err(OAuthError::Exchange(error_text));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| OAuthError::Exchange(e.to_string()))
    }

    async fn first_site(&self, access_token: &str) -> Result<AccessibleResource, OAuthError> {
        let response = self
            .client
            .get(&self.config.resources_url)
            .bearer_auth(access_token)
            .header("Accept", "application/json")
            .send()
            .await?;
        let resources: Vec<AccessibleResource> = read_json(response).await?;
        resources.into_iter().next().ok_or(OAuthError::NoAccessibleResources)
    }

    async fn fetch_page(&self, cloud_id: &str, page_id: &str, access_token: &str) -> Result<String, OAuthError> {
        let url = format!(
            "{}/ex/confluence/{}/wiki/rest/api/content/{}?expand=body.storage",
            self.config.api_base.trim_end_matches('/'),
            cloud_id,
            page_id
        );
        let response = self
            .client
            .get(url)
            .bearer_auth(access_token)
            .header("Accept", "application/json")
            .send()
            .await?;
        let page: Page = read_json(response).await?;
        Ok(format!("Title: {}\n\nContent:\n{}", page.title, page.body.storage.value))
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T, OAuthError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(OAuthError::Remote {
            status: status.as_u16(),
            body,
        });
    }
    serde_json::from_str(&body).map_err(|e| OAuthError::Remote {
        status: status.as_u16(),
        body: format!("{}: {}", e, body),
    })
}
