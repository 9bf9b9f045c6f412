use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_base: String,
    pub api_key: String,
    pub chat_model: String,
    pub embedding_model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: "${OPENAI_API_KEY}".to_string(),
            chat_model: "gpt-4.1-mini".to_string(),
            embedding_model: "text-embedding-ada-002".to_string(),
        }
    }
}

/// How assistant replies are rendered to HTTP callers.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResponseEnvelope {
    /// A chat completion style body with a single choice.
    #[default]
    Structured,
    /// The reply text as a plain body.
    Plain,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AssistantConfig {
    pub default_assistant_id: Option<String>,
    pub vector_store_name: String,
    pub poll_interval_ms: u64,
    /// Zero disables the ceiling.
    pub max_poll_attempts: u32,
    pub response_envelope: ResponseEnvelope,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            default_assistant_id: None,
            vector_store_name: "My Docs Store".to_string(),
            poll_interval_ms: 2000,
            max_poll_attempts: 150,
            response_envelope: ResponseEnvelope::Structured,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WikiConfig {
    pub base_url: String,
    pub email: String,
    pub api_token: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_resources_url")]
    pub resources_url: String,
    #[serde(default = "default_oauth_api_base")]
    pub api_base: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    pub page_id: Option<String>,
}

fn default_authorize_url() -> String {
    "https://auth.atlassian.com/authorize".to_string()
}

fn default_token_url() -> String {
    "https://auth.atlassian.com/oauth/token".to_string()
}

fn default_resources_url() -> String {
    "https://api.atlassian.com/oauth/token/accessible-resources".to_string()
}

fn default_oauth_api_base() -> String {
    "https://api.atlassian.com".to_string()
}

fn default_scopes() -> Vec<String> {
    vec!["read:confluence-content.all".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    pub wiki: Option<WikiConfig>,
    pub oauth: Option<OAuthConfig>,
}

impl AppConfig {
    pub fn load(path: &str) -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();

        let settings = config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("CHATBRIDGE").separator("__"))
            .build()?;

        let mut app_config: AppConfig = settings.try_deserialize()?;
        app_config.expand();
        Ok(app_config)
    }

    /// Resolves `${VAR}` placeholders once. Unset variables become empty strings.
    fn expand(&mut self) {
        self.server.host = expand_env(&self.server.host);
        self.openai.api_key = expand_env(&self.openai.api_key);

        self.assistant.default_assistant_id = self
            .assistant
            .default_assistant_id
            .as_deref()
            .map(expand_env)
            .filter(|id| !id.is_empty());

        if let Some(ref mut wiki) = self.wiki {
            wiki.base_url = expand_env(&wiki.base_url);
            wiki.email = expand_env(&wiki.email);
            wiki.api_token = expand_env(&wiki.api_token);
        }
        if let Some(ref mut oauth) = self.oauth {
            oauth.client_id = expand_env(&oauth.client_id);
            oauth.client_secret = expand_env(&oauth.client_secret);
            oauth.redirect_uri = expand_env(&oauth.redirect_uri);
            oauth.page_id = oauth.page_id.as_deref().map(expand_env).filter(|p| !p.is_empty());
        }
    }
}

pub(crate) fn expand_env(val: &str) -> String {
    match val.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) {
        Some(var_name) => std::env::var(var_name).unwrap_or_default(),
        None => val.to_string(),
    }
}
