use std::time::Duration;

pub const DEFAULT_SERVER_PORT: u16 = 5000;
pub const DEFAULT_OLLAMA_URL: &str = "http://ollama:11434/api/generate";
pub const DEFAULT_OLLAMA_MODEL: &str = "mario";
pub const DEFAULT_GENERAL_PROMPT: &str = "Introduce yourself";
pub const DEFAULT_STATIC_DIR: &str = "client/dist";
// Generation on a cold model can take well over a minute.
pub const DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS: u64 = 3;
pub const MAX_REGION_NAME_LEN: usize = 64;

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn server_port() -> u16 {
    std::env::var("SERVER_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_SERVER_PORT)
}

pub fn static_dir() -> String {
    non_empty_var("STATIC_DIR").unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string())
}

pub fn upstream_http_timeout() -> Duration {
    std::env::var("UPSTREAM_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS))
}

pub fn upstream_connect_timeout() -> Duration {
    std::env::var("UPSTREAM_CONNECT_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS))
}

/// Where and how the text generator is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamConfig {
    pub generate_url: String,
    pub model: String,
    pub general_prompt: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl UpstreamConfig {
    pub fn from_env() -> Self {
        Self {
            generate_url: non_empty_var("OLLAMA_URL")
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            model: non_empty_var("OLLAMA_MODEL")
                .unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
            general_prompt: non_empty_var("GENERAL_PROMPT")
                .unwrap_or_else(|| DEFAULT_GENERAL_PROMPT.to_string()),
            request_timeout: upstream_http_timeout(),
            connect_timeout: upstream_connect_timeout(),
        }
    }
}
