use prospect_core::{Error, Result};
use prospect_local::env_nonblank;

/// Everything the agent needs from the environment, resolved once at
/// startup so a missing key fails here with its name, not deep inside an
/// adapter call.
#[derive(Debug, Clone)]
pub struct Config {
    pub serper_api_key: String,
    pub browserless_api_key: String,
    pub openai_api_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let serper = env_nonblank("PROSPECT_SERPER_API_KEY").or_else(|| env_nonblank("SERPER_API_KEY"));
        let browserless = env_nonblank("PROSPECT_BROWSERLESS_API_KEY")
            .or_else(|| env_nonblank("BROWSERLESS_API_KEY"));
        let openai =
            env_nonblank("PROSPECT_OPENAI_API_KEY").or_else(|| env_nonblank("OPENAI_API_KEY"));

        let mut missing = Vec::new();
        if serper.is_none() {
            missing.push("PROSPECT_SERPER_API_KEY (or SERPER_API_KEY)");
        }
        if browserless.is_none() {
            missing.push("PROSPECT_BROWSERLESS_API_KEY (or BROWSERLESS_API_KEY)");
        }
        if openai.is_none() {
            missing.push("PROSPECT_OPENAI_API_KEY (or OPENAI_API_KEY)");
        }
        if !missing.is_empty() {
            return Err(Error::NotConfigured(format!(
                "missing {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            serper_api_key: serper.unwrap_or_default(),
            browserless_api_key: browserless.unwrap_or_default(),
            openai_api_key: openai.unwrap_or_default(),
        })
    }
}

/// Configuration diagnosis: which keys are present and which knobs are in
/// effect. Never includes secret values.
pub fn doctor_report() -> serde_json::Value {
    let serper =
        env_nonblank("PROSPECT_SERPER_API_KEY").or_else(|| env_nonblank("SERPER_API_KEY"));
    let browserless = env_nonblank("PROSPECT_BROWSERLESS_API_KEY")
        .or_else(|| env_nonblank("BROWSERLESS_API_KEY"));
    let openai = env_nonblank("PROSPECT_OPENAI_API_KEY").or_else(|| env_nonblank("OPENAI_API_KEY"));

    let ok = serper.is_some() && browserless.is_some() && openai.is_some();
    serde_json::json!({
        "ok": ok,
        "keys": {
            "serper_api_key": serper.is_some(),
            "browserless_api_key": browserless.is_some(),
            "openai_api_key": openai.is_some(),
        },
        "model": env_nonblank("PROSPECT_OPENAI_MODEL")
            .unwrap_or_else(|| prospect_local::openai::DEFAULT_MODEL.to_string()),
        "endpoints": {
            "serper": env_nonblank("PROSPECT_SERPER_ENDPOINT")
                .unwrap_or_else(|| "https://google.serper.dev/search".to_string()),
            "browserless": env_nonblank("PROSPECT_BROWSERLESS_ENDPOINT")
                .unwrap_or_else(|| "https://chrome.browserless.io/content".to_string()),
            "openai": env_nonblank("PROSPECT_OPENAI_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com".to_string()),
        },
    })
}
