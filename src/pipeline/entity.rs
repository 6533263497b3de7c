use std::cmp::Reverse;
use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::debug;

use crate::romaji::Romanizer;
use crate::store::EntityStore;
use crate::textutil::capitalize_first;
use crate::wikidata::KnowledgeBase;

// English forms for the common transit suffixes. Leading-space values append
// straight onto the romanized base; "toward" prepends instead.
pub const SUFFIX_RULES: [(&str, &str); 18] = [
    ("新幹線", "Shinkansen"),
    ("本線", "Main Line"),
    ("線", "Line"),
    ("駅", "Station"),
    ("空港", "Airport"),
    ("方面", "toward"),
    ("エクスプレス", " Express"),
    ("号", " No."),
    ("終点", "Terminal"),
    ("鉄道", "Railway"),
    ("都市", "Urban"),
    ("地下鉄", "Subway"),
    ("メトロ", "Metro"),
    ("環状線", "Loop Line"),
    ("モノレール", "Monorail"),
    ("トラム", "Tram"),
    ("バス", "Bus"),
    ("フェリー", "Ferry"),
];

static RULES_BY_LEN: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    let mut v = SUFFIX_RULES.to_vec();
    v.sort_by_key(|(suffix, _)| Reverse(suffix.chars().count()));
    v
});

/// Per-entity translation: store cache, then knowledge base, then the suffix
/// rule table, then plain romanization. Every non-cache resolution is written
/// back to the store; no tier failure reaches the caller.
pub struct EntityTranslator {
    store: Arc<dyn EntityStore>,
    knowledge: Arc<dyn KnowledgeBase>,
    romanizer: Arc<Romanizer>,
}

impl EntityTranslator {
    #[must_use]
    pub fn new(
        store: Arc<dyn EntityStore>,
        knowledge: Arc<dyn KnowledgeBase>,
        romanizer: Arc<Romanizer>,
    ) -> Self {
        Self {
            store,
            knowledge,
            romanizer,
        }
    }

    pub async fn translate(&self, entity: &str) -> String {
        let entity = entity.trim();
        if entity.is_empty() {
            return String::new();
        }

        if self.store.is_ready() {
            match self.store.get(entity).await {
                Ok(Some(hit)) => {
                    debug!("store hit: {entity} -> {hit}");
                    return hit;
                }
                Ok(None) => {}
                Err(err) => debug!("store read failed for '{entity}': {err:#}"),
            }
        }

        match self.knowledge.lookup(entity).await {
            Ok(Some(label)) => {
                debug!("knowledge hit: {entity} -> {label}");
                self.remember(entity, &label).await;
                return label;
            }
            Ok(None) => {}
            Err(err) => debug!("knowledge lookup failed for '{entity}': {err:#}"),
        }

        if let Some(result) = self.suffix_rule(entity) {
            debug!("suffix rule: {entity} -> {result}");
            self.remember(entity, &result).await;
            return result;
        }

        let romaji = self.romanizer.romanize(entity);
        debug!("romanization fallback: {entity} -> {romaji}");
        self.remember(entity, &romaji).await;
        romaji
    }

    fn suffix_rule(&self, entity: &str) -> Option<String> {
        for (suffix, english) in RULES_BY_LEN.iter() {
            if !entity.ends_with(suffix) {
                continue;
            }
            let base = entity[..entity.len() - suffix.len()].trim();
            let roman_base = if base.is_empty() {
                String::new()
            } else {
                self.romanizer.romanize(base)
            };
            let result = if *english == "toward" {
                capitalize_first(format!("toward {roman_base}").trim())
            } else if english.starts_with(' ') {
                format!("{roman_base}{english}")
            } else {
                format!("{roman_base} {english}").trim().to_string()
            };
            return Some(result);
        }
        None
    }

    async fn remember(&self, entity: &str, english: &str) {
        if !self.store.is_ready() {
            return;
        }
        if let Err(err) = self.store.set(entity, english).await {
            debug!("store write failed for '{entity}': {err:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    #[derive(Default)]
    struct MapStore {
        entries: Mutex<HashMap<String, String>>,
    }

    impl MapStore {
        fn with(entries: &[(&str, &str)]) -> Self {
            Self {
                entries: Mutex::new(
                    entries
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                ),
            }
        }

        fn snapshot(&self) -> HashMap<String, String> {
            self.entries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EntityStore for MapStore {
        async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn search(
            &self,
            _term: &str,
            _limit: usize,
        ) -> anyhow::Result<BTreeMap<String, String>> {
            Ok(BTreeMap::new())
        }

        async fn count(&self) -> usize {
            self.entries.lock().unwrap().len()
        }

        fn is_ready(&self) -> bool {
            true
        }
    }

    struct CountingKb {
        answer: Option<String>,
        calls: AtomicUsize,
    }

    impl CountingKb {
        fn new(answer: Option<&str>) -> Self {
            Self {
                answer: answer.map(str::to_string),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl KnowledgeBase for CountingKb {
        async fn lookup(&self, _japanese_name: &str) -> anyhow::Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer.clone())
        }
    }

    struct FailingKb;

    #[async_trait]
    impl KnowledgeBase for FailingKb {
        async fn lookup(&self, _japanese_name: &str) -> anyhow::Result<Option<String>> {
            anyhow::bail!("knowledge base offline")
        }
    }

    fn translator(
        store: Arc<MapStore>,
        kb: Arc<dyn KnowledgeBase>,
        romanizer: Romanizer,
    ) -> EntityTranslator {
        EntityTranslator::new(store, kb, Arc::new(romanizer))
    }

    #[tokio::test]
    async fn cache_hit_skips_the_knowledge_base() {
        let store = Arc::new(MapStore::with(&[("新宿", "Shinjuku")]));
        let kb = Arc::new(CountingKb::new(Some("never used")));
        let t = translator(store, kb.clone(), Romanizer::new());
        assert_eq!(t.translate("新宿").await, "Shinjuku");
        assert_eq!(kb.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn knowledge_hit_is_written_back() {
        let store = Arc::new(MapStore::default());
        let kb = Arc::new(CountingKb::new(Some("Shibuya")));
        let t = translator(store.clone(), kb, Romanizer::new());
        assert_eq!(t.translate("渋谷").await, "Shibuya");
        assert_eq!(store.snapshot().get("渋谷").map(String::as_str), Some("Shibuya"));
    }

    #[tokio::test]
    async fn suffix_rule_composes_with_romanized_base() {
        let store = Arc::new(MapStore::default());
        let kb = Arc::new(CountingKb::new(None));
        let lex: HashMap<String, String> =
            [("中央".to_string(), "チュウオウ".to_string())].into_iter().collect();
        let t = translator(store.clone(), kb, Romanizer::with_lexicon(lex));
        assert_eq!(t.translate("中央線").await, "Chuuou Line");
        assert_eq!(
            store.snapshot().get("中央線").map(String::as_str),
            Some("Chuuou Line")
        );
    }

    #[tokio::test]
    async fn shinkansen_rule_beats_the_bare_line_suffix() {
        let store = Arc::new(MapStore::default());
        let kb = Arc::new(CountingKb::new(None));
        let lex: HashMap<String, String> =
            [("東北".to_string(), "トウホク".to_string())].into_iter().collect();
        let t = translator(store.clone(), kb, Romanizer::with_lexicon(lex));
        assert_eq!(t.translate("東北新幹線").await, "Touhoku Shinkansen");
        assert_eq!(
            store.snapshot().get("東北新幹線").map(String::as_str),
            Some("Touhoku Shinkansen")
        );
    }

    #[tokio::test]
    async fn toward_prepends_and_capitalizes() {
        let store = Arc::new(MapStore::default());
        let kb = Arc::new(CountingKb::new(None));
        let lex: HashMap<String, String> =
            [("新宿".to_string(), "シンジュク".to_string())].into_iter().collect();
        let t = translator(store, kb, Romanizer::with_lexicon(lex));
        assert_eq!(t.translate("新宿方面").await, "Toward Shinjuku");
    }

    #[tokio::test]
    async fn leading_space_fragment_appends_directly() {
        let store = Arc::new(MapStore::default());
        let kb = Arc::new(CountingKb::new(None));
        let t = translator(store, kb, Romanizer::new());
        // Whole entity consumed by the rule leaves a bare fragment.
        assert_eq!(t.translate("エクスプレス").await, " Express");
        let store = Arc::new(MapStore::default());
        let kb = Arc::new(CountingKb::new(None));
        let t = translator(store, kb, Romanizer::new());
        assert_eq!(t.translate("はやぶさ5号").await, "Hayabusa 5 No.");
    }

    #[tokio::test]
    async fn romanization_fallback_is_persisted() {
        let store = Arc::new(MapStore::default());
        let kb = Arc::new(CountingKb::new(None));
        let t = translator(store.clone(), kb, Romanizer::new());
        assert_eq!(t.translate("ひばり").await, "Hibari");
        assert_eq!(store.snapshot().get("ひばり").map(String::as_str), Some("Hibari"));
    }

    #[tokio::test]
    async fn knowledge_failure_degrades_to_later_tiers() {
        let store = Arc::new(MapStore::default());
        let t = translator(store, Arc::new(FailingKb), Romanizer::new());
        assert_eq!(t.translate("こだま").await, "Kodama");
    }

    #[tokio::test]
    async fn blank_entity_short_circuits() {
        let store = Arc::new(MapStore::default());
        let kb = Arc::new(CountingKb::new(Some("x")));
        let t = translator(store.clone(), kb.clone(), Romanizer::new());
        assert_eq!(t.translate("  ").await, "");
        assert_eq!(kb.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.snapshot().len(), 0);
    }
}
