//! OpenAI oracle (Chat Completions API).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::OracleError;
use crate::model::Category;
use crate::oracle::{EnrichmentOracle, InstructionKind};

const ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

pub struct OpenAiOracle {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiOracle {
    /// `model_override`: pass Some("gpt-4o") to override; defaults to gpt-4o-mini.
    pub fn new(api_key: String, model_override: Option<&str>) -> Result<Self, OracleError> {
        let http = reqwest::Client::builder()
            .user_agent("ai-news-pipeline/0.1")
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(60))
            .build()?;
        let model = model_override
            .filter(|m| !m.trim().is_empty())
            .unwrap_or("gpt-4o-mini")
            .to_string();
        Ok(Self {
            http,
            api_key,
            model,
        })
    }

    fn prompt(kind: InstructionKind, text: &str) -> String {
        match kind {
            InstructionKind::Categorize => {
                let labels = Category::ASSIGNABLE
                    .iter()
                    .map(|c| c.label())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("Classify into ONE: {labels}\nAnswer with the label only.\n\n{text}")
            }
            InstructionKind::Summarize => {
                format!("Tóm tắt bằng tiếng Việt, tự nhiên, 3–4 câu:\n\n{text}")
            }
        }
    }
}

#[async_trait::async_trait]
impl EnrichmentOracle for OpenAiOracle {
    async fn generate(&self, kind: InstructionKind, text: &str) -> Result<String, OracleError> {
        if self.api_key.is_empty() {
            return Err(OracleError::Disabled);
        }

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: Option<String>,
        }

        let prompt = Self::prompt(kind, text);
        let req = Req {
            model: &self.model,
            messages: vec![Msg {
                role: "user",
                content: &prompt,
            }],
            temperature: 0.3,
        };

        let resp = self
            .http
            .post(ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(OracleError::Quota("openai returned 429".to_string()));
        }
        if !status.is_success() {
            return Err(OracleError::Malformed(format!("openai returned {status}")));
        }

        let body: Resp = resp
            .json()
            .await
            .map_err(|e| OracleError::Malformed(format!("openai body: {e}")))?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        if content.is_empty() {
            return Err(OracleError::Malformed("openai returned no content".to_string()));
        }
        Ok(content)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categorize_prompt_lists_every_label() {
        let p = OpenAiOracle::prompt(InstructionKind::Categorize, "Title\nBody");
        assert!(p.starts_with("Classify into ONE: AI Tools, Research, Business, Policy, Ethics"));
        assert!(p.ends_with("Title\nBody"));
    }

    #[test]
    fn summarize_prompt_is_vietnamese() {
        let p = OpenAiOracle::prompt(InstructionKind::Summarize, "x");
        assert!(p.starts_with("Tóm tắt bằng tiếng Việt"));
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let o = OpenAiOracle::new(String::new(), None).unwrap();
        let err = o.generate(InstructionKind::Summarize, "x").await.unwrap_err();
        assert!(matches!(err, OracleError::Disabled));
    }
}
