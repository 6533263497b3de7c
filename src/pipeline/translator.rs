use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::models::{EntityRecognizer, RawEntity, SentenceTranslator};
use crate::pipeline::affix::strip_affixes;
use crate::pipeline::dedupe::{dedupe_phrases, tidy_sentence, DEFAULT_MAX_PHRASE_LEN};
use crate::pipeline::entity::EntityTranslator;
use crate::pipeline::mapper::{map_placeholders, PlaceholderText};
use crate::pipeline::spans::{merge_adjacent, resolve_spans, CharText};
use crate::placeholders::{is_placeholder_token, split_by_placeholders};
use crate::romaji::Romanizer;
use crate::store::EntityStore;
use crate::textutil::excerpt;
use crate::wikidata::KnowledgeBase;

// The announcement-relevant recognizer groups.
pub const DEFAULT_ENTITY_GROUPS: [&str; 5] =
    ["地名", "施設名", "法人名", "製品名", "その他の組織名"];

#[derive(Clone, Debug)]
pub struct PipelineOptions {
    pub entity_groups: Vec<String>,
    pub max_phrase_len: usize,
    pub log_excerpt_chars: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            entity_groups: DEFAULT_ENTITY_GROUPS.iter().map(|s| s.to_string()).collect(),
            max_phrase_len: DEFAULT_MAX_PHRASE_LEN,
            log_excerpt_chars: 50,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct TranslationOutcome {
    pub original_text: String,
    pub text_with_placeholders: String,
    pub entity_mapping: BTreeMap<String, String>,
    pub english_translation: String,
    pub entities_count: usize,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct ServiceHealth {
    pub recognizer: bool,
    pub translator: bool,
    pub store: bool,
}

impl ServiceHealth {
    #[must_use]
    pub fn all_ready(&self) -> bool {
        self.recognizer && self.translator && self.store
    }
}

/// Per-request orchestration. Collaborator failures degrade the request
/// instead of failing it: no recognizer means zero entities, no sentence
/// translator means a romanized sentence.
pub struct TranslatorPipeline {
    recognizer: Arc<dyn EntityRecognizer>,
    sentences: Arc<dyn SentenceTranslator>,
    entities: EntityTranslator,
    romanizer: Arc<Romanizer>,
    store: Arc<dyn EntityStore>,
    options: PipelineOptions,
}

impl TranslatorPipeline {
    pub fn new(
        recognizer: Arc<dyn EntityRecognizer>,
        sentences: Arc<dyn SentenceTranslator>,
        store: Arc<dyn EntityStore>,
        knowledge: Arc<dyn KnowledgeBase>,
        romanizer: Arc<Romanizer>,
        options: PipelineOptions,
    ) -> Self {
        let entities = EntityTranslator::new(store.clone(), knowledge, romanizer.clone());
        Self {
            recognizer,
            sentences,
            entities,
            romanizer,
            store,
            options,
        }
    }

    /// Entity pass: recognize, anchor spans, merge, strip, swap in tokens.
    pub async fn annotate(&self, text: &str) -> (String, BTreeMap<String, String>) {
        if !self.recognizer.is_ready() {
            warn!("recognizer unavailable, passing text through without entities");
            return (text.to_string(), BTreeMap::new());
        }
        let raw = match self.recognizer.recognize(text).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!("entity recognition failed: {err:#}");
                return (text.to_string(), BTreeMap::new());
            }
        };
        let filtered: Vec<RawEntity> = raw
            .into_iter()
            .filter(|e| self.options.entity_groups.iter().any(|g| g == &e.entity_group))
            .collect();
        if filtered.is_empty() {
            return (text.to_string(), BTreeMap::new());
        }

        let source = CharText::new(text);
        let resolved = resolve_spans(&source, &filtered);
        let merged = merge_adjacent(&source, &resolved);
        if merged.is_empty() {
            return (text.to_string(), BTreeMap::new());
        }

        let pairs: Vec<_> = merged
            .into_iter()
            .map(|span| {
                let split = strip_affixes(&span.text);
                (span, split)
            })
            .collect();
        let PlaceholderText { text, entities } = map_placeholders(&source, &pairs);
        info!("annotated {} distinct entities", entities.len());
        (text, entities)
    }

    async fn translate_sentence(&self, placeholder_text: &str) -> String {
        if self.sentences.is_ready() {
            let batch = [placeholder_text.to_string()];
            match self.sentences.translate_batch(&batch).await {
                Ok(mut out) if !out.is_empty() => return out.remove(0),
                Ok(_) => warn!("sentence translator returned no output"),
                Err(err) => warn!("sentence translation failed: {err:#}"),
            }
        } else {
            warn!("sentence translator unavailable, romanizing instead");
        }
        // Degraded path: romanize between placeholders so the tokens survive
        // for entity substitution.
        split_by_placeholders(placeholder_text)
            .iter()
            .map(|part| {
                if is_placeholder_token(part) {
                    part.clone()
                } else {
                    self.romanizer.romanize(part)
                }
            })
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Render pass: sentence translation, entity substitution, cleanup.
    pub async fn render(
        &self,
        placeholder_text: &str,
        mapping: &BTreeMap<String, String>,
    ) -> String {
        let mut sentence = self.translate_sentence(placeholder_text).await;
        for (token, entity) in mapping {
            let english = if is_placeholder_token(token) {
                self.entities.translate(entity).await
            } else {
                warn!("invalid placeholder format: {token}");
                entity.clone()
            };
            sentence = sentence.replace(token.as_str(), &english);
        }
        let tidied = tidy_sentence(&sentence);
        dedupe_phrases(&tidied, self.options.max_phrase_len)
    }

    pub async fn translate(&self, text: &str) -> TranslationOutcome {
        info!(
            "translating: {}",
            excerpt(text, self.options.log_excerpt_chars)
        );
        let (placeholder_text, mapping) = self.annotate(text).await;
        let english = self.render(&placeholder_text, &mapping).await;
        info!("translation completed, {} entities processed", mapping.len());
        TranslationOutcome {
            original_text: text.to_string(),
            text_with_placeholders: placeholder_text,
            english_translation: english,
            entities_count: mapping.len(),
            entity_mapping: mapping,
        }
    }

    pub fn health(&self) -> ServiceHealth {
        ServiceHealth {
            recognizer: self.recognizer.is_ready(),
            translator: self.sentences.is_ready(),
            store: self.store.is_ready(),
        }
    }
}
