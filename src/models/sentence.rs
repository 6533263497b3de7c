use anyhow::{bail, Context};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

#[async_trait]
pub trait SentenceTranslator: Send + Sync {
    /// Order-preserving; the output always has one entry per input text.
    async fn translate_batch(&self, texts: &[String]) -> anyhow::Result<Vec<String>>;
    fn is_ready(&self) -> bool;
}

#[derive(Debug, Deserialize)]
struct TranslationItem {
    translation_text: String,
}

/// Remote translation endpoint speaking the HuggingFace inference JSON shape.
/// Inputs are chunked by the configured batch size.
pub struct HttpSentenceTranslator {
    client: reqwest::Client,
    endpoint: Option<String>,
    token: Option<String>,
    batch_size: usize,
}

impl HttpSentenceTranslator {
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        endpoint: Option<String>,
        token: Option<String>,
        batch_size: usize,
    ) -> Self {
        Self {
            client,
            endpoint,
            token,
            batch_size: batch_size.max(1),
        }
    }

    async fn translate_chunk(&self, endpoint: &str, chunk: &[String]) -> anyhow::Result<Vec<String>> {
        let mut req = self
            .client
            .post(endpoint)
            .json(&serde_json::json!({ "inputs": chunk }));
        if let Some(token) = self.token.as_deref() {
            req = req.bearer_auth(token);
        }
        let items: Vec<TranslationItem> = req
            .send()
            .await
            .context("translator request")?
            .error_for_status()
            .context("translator status")?
            .json()
            .await
            .context("translator body")?;
        if items.len() != chunk.len() {
            bail!(
                "translator_batch_length_mismatch: sent {} got {}",
                chunk.len(),
                items.len()
            );
        }
        Ok(items
            .into_iter()
            .map(|item| clean_decoder_output(&item.translation_text))
            .collect())
    }
}

#[async_trait]
impl SentenceTranslator for HttpSentenceTranslator {
    async fn translate_batch(&self, texts: &[String]) -> anyhow::Result<Vec<String>> {
        let Some(endpoint) = self.endpoint.as_deref() else {
            bail!("translator_endpoint_not_configured");
        };
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            out.extend(self.translate_chunk(endpoint, chunk).await?);
        }
        Ok(out)
    }

    fn is_ready(&self) -> bool {
        self.endpoint.is_some()
    }
}

static SPACE_BEFORE_PUNCT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+([.,!?:;])").expect("punct spacing regex"));
static MULTI_SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("space regex"));

pub(crate) fn clean_decoder_output(text: &str) -> String {
    let text = SPACE_BEFORE_PUNCT_RE.replace_all(text, "$1");
    let text = MULTI_SPACE_RE.replace_all(text.trim(), " ");
    text.replace(" .", ".")
        .replace("' ", "'")
        .replace(" n't", "n't")
        .trim()
        .to_string()
}
