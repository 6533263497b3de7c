use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::config::KnowledgeConfig;

/// External knowledge lookup for canonical English entity names.
/// Single-attempt, timeout-bounded; failures mean "no result" to the caller.
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    async fn lookup(&self, japanese_name: &str) -> anyhow::Result<Option<String>>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: String,
}

/// Two-step Wikidata flow: entity search by Japanese label, then the entity
/// document for its English label.
pub struct WikidataClient {
    client: reqwest::Client,
    api_url: String,
    entity_data_url: String,
}

impl WikidataClient {
    pub fn new(cfg: &KnowledgeConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .user_agent(cfg.user_agent.clone())
            .build()
            .context("build knowledge base client")?;
        Ok(Self {
            client,
            api_url: cfg.api_url.clone(),
            entity_data_url: cfg.entity_data_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl KnowledgeBase for WikidataClient {
    async fn lookup(&self, japanese_name: &str) -> anyhow::Result<Option<String>> {
        let search: SearchResponse = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "wbsearchentities"),
                ("search", japanese_name),
                ("language", "ja"),
                ("format", "json"),
                ("limit", "5"),
            ])
            .send()
            .await
            .context("knowledge search request")?
            .error_for_status()
            .context("knowledge search status")?
            .json()
            .await
            .context("knowledge search body")?;

        let Some(hit) = search.search.into_iter().next() else {
            return Ok(None);
        };

        let url = format!("{}/{}.json", self.entity_data_url, hit.id);
        let doc: Value = self
            .client
            .get(&url)
            .send()
            .await
            .context("entity data request")?
            .error_for_status()
            .context("entity data status")?
            .json()
            .await
            .context("entity data body")?;

        Ok(english_label(&doc, &hit.id))
    }
}

fn english_label(doc: &Value, id: &str) -> Option<String> {
    doc.get("entities")?
        .get(id)?
        .get("labels")?
        .get("en")?
        .get("value")?
        .as_str()
        .map(str::to_string)
}
