use anyhow::{bail, Context};
use async_trait::async_trait;
use serde::Deserialize;

/// One span as reported by a token-classification model. Offsets are char
/// indices and may be stale or absent.
#[derive(Clone, Debug, Deserialize)]
pub struct RawEntity {
    pub word: String,
    pub entity_group: String,
    #[serde(default)]
    pub start: Option<usize>,
    #[serde(default)]
    pub end: Option<usize>,
    #[serde(default)]
    pub score: Option<f64>,
}

#[async_trait]
pub trait EntityRecognizer: Send + Sync {
    async fn recognize(&self, text: &str) -> anyhow::Result<Vec<RawEntity>>;
    fn is_ready(&self) -> bool;
}

/// Remote token-classification endpoint speaking the HuggingFace inference
/// JSON shape. Unconfigured means not-ready.
pub struct HttpRecognizer {
    client: reqwest::Client,
    endpoint: Option<String>,
    token: Option<String>,
}

impl HttpRecognizer {
    #[must_use]
    pub fn new(client: reqwest::Client, endpoint: Option<String>, token: Option<String>) -> Self {
        Self {
            client,
            endpoint,
            token,
        }
    }
}

#[async_trait]
impl EntityRecognizer for HttpRecognizer {
    async fn recognize(&self, text: &str) -> anyhow::Result<Vec<RawEntity>> {
        let Some(endpoint) = self.endpoint.as_deref() else {
            bail!("recognizer_endpoint_not_configured");
        };
        let mut req = self
            .client
            .post(endpoint)
            .json(&serde_json::json!({ "inputs": text }));
        if let Some(token) = self.token.as_deref() {
            req = req.bearer_auth(token);
        }
        let entities: Vec<RawEntity> = req
            .send()
            .await
            .context("recognizer request")?
            .error_for_status()
            .context("recognizer status")?
            .json()
            .await
            .context("recognizer body")?;
        Ok(entities)
    }

    fn is_ready(&self) -> bool {
        self.endpoint.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_entity_parses_inference_shape() {
        let raw = r#"[
            {"entity_group": "地名", "score": 0.998, "word": "東京", "start": 8, "end": 10},
            {"entity_group": "施設名", "word": "新 宿"}
        ]"#;
        let parsed: Vec<RawEntity> = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].start, Some(8));
        assert_eq!(parsed[1].word, "新 宿");
        assert_eq!(parsed[1].start, None);
        assert_eq!(parsed[1].score, None);
    }

    #[test]
    fn unconfigured_recognizer_is_not_ready() {
        let r = HttpRecognizer::new(reqwest::Client::new(), None, None);
        assert!(!r.is_ready());
    }
}
