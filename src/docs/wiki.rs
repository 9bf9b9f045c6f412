use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::WikiConfig;
use crate::docs::{
    plain_text::{PlainText, TagStripper},
    DocsError, DocumentSource,
};

/// Text search against a wiki's content API, authenticated with an email and API token.
pub struct WikiSearch {
    client: Client,
    base_url: String,
    email: String,
    api_token: String,
    extractor: Box<dyn PlainText>,
}

#[derive(Deserialize)]
struct SearchResults {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    title: String,
    #[serde(default)]
    body: HitBody,
}

#[derive(Deserialize, Default)]
struct HitBody {
    #[serde(default)]
    storage: Storage,
}

#[derive(Deserialize, Default)]
struct Storage {
    #[serde(default)]
    value: String,
}

impl WikiSearch {
    pub fn new(config: &WikiConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            email: config.email.clone(),
            api_token: config.api_token.clone(),
            extractor: Box::new(TagStripper),
        }
    }

    pub fn with_extractor(mut self, extractor: Box<dyn PlainText>) -> Self {
        self.extractor = extractor;
        self
    }

    fn search_url(&self, query: &str) -> String {
        let cql = format!("text~\"{}\"", query.replace('"', "\\\""));
        format!(
            "{}/rest/api/content/search?cql={}&expand=body.storage",
            self.base_url,
            urlencoding::encode(&cql)
        )
    }
}

#[async_trait]
impl DocumentSource for WikiSearch {
    async fn lookup(&self, query: &str) -> Result<String, DocsError> {
        info!("Searching wiki for: {}", query);
        let response = self
            .client
            .get(self.search_url(query))
            .basic_auth(&self.email, Some(&self.api_token))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| DocsError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DocsError::Network(e.to_string()))?;
        if !status.is_success() {
            warn!("Wiki search returned status {}", status);
            return Err(DocsError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let results: SearchResults = serde_json::from_str(&body)
            .map_err(|e| DocsError::Schema(format!("{} in response: {}", e, body)))?;

        let hit = results.results.into_iter().next().ok_or(DocsError::NoResults)?;
        Ok(format!(
            "{}\n\n{}",
            hit.title,
            self.extractor.extract(&hit.body.storage.value)
        ))
    }
}
