use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use annai_translator::models::{EntityRecognizer, RawEntity, SentenceTranslator};
use annai_translator::pipeline::{PipelineOptions, TranslatorPipeline};
use annai_translator::romaji::Romanizer;
use annai_translator::store::{EntityStore, FileStore};
use annai_translator::wikidata::KnowledgeBase;

struct FlowRecognizer {
    entities: Vec<RawEntity>,
}

#[async_trait]
impl EntityRecognizer for FlowRecognizer {
    async fn recognize(&self, _text: &str) -> anyhow::Result<Vec<RawEntity>> {
        Ok(self.entities.clone())
    }

    fn is_ready(&self) -> bool {
        true
    }
}

struct FlowTranslator {
    expect: String,
    reply: String,
}

#[async_trait]
impl SentenceTranslator for FlowTranslator {
    async fn translate_batch(&self, texts: &[String]) -> anyhow::Result<Vec<String>> {
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0], self.expect);
        Ok(vec![self.reply.clone()])
    }

    fn is_ready(&self) -> bool {
        true
    }
}

#[derive(Default)]
struct SingleEntryKb {
    calls: AtomicUsize,
}

#[async_trait]
impl KnowledgeBase for SingleEntryKb {
    async fn lookup(&self, japanese_name: &str) -> anyhow::Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((japanese_name == "新宿").then(|| "Shinjuku".to_string()))
    }
}

fn ent(word: &str, start: usize, end: usize) -> RawEntity {
    RawEntity {
        word: word.to_string(),
        entity_group: "地名".to_string(),
        start: Some(start),
        end: Some(end),
        score: Some(0.99),
    }
}

#[tokio::test]
async fn announcement_translates_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("entities.json");
    let store = Arc::new(FileStore::open(&store_path).unwrap());
    store.set("中央", "Chuo").await.unwrap();
    store.set("東京", "Tokyo").await.unwrap();

    let recognizer = Arc::new(FlowRecognizer {
        entities: vec![
            ent("中央線", 14, 17),
            ent("東京", 20, 22),
            ent("新宿", 29, 31),
            ent("新宿", 32, 34),
        ],
    });
    let sentences = Arc::new(FlowTranslator {
        expect: "ご乗車ありがとうございます。[PH1]線快速、[PH2]行きです。次は[PH3]、[PH3]です。"
            .to_string(),
        reply: "Thank you for riding. [PH1] Line Express, bound for [PH2]. Next is [PH3], [PH3]."
            .to_string(),
    });
    let kb = Arc::new(SingleEntryKb::default());

    let pipeline = TranslatorPipeline::new(
        recognizer,
        sentences,
        store.clone(),
        kb.clone(),
        Arc::new(Romanizer::new()),
        PipelineOptions::default(),
    );

    let outcome = pipeline
        .translate("ご乗車ありがとうございます。中央線快速、東京行きです。次は新宿、新宿です。")
        .await;

    assert_eq!(
        outcome.text_with_placeholders,
        "ご乗車ありがとうございます。[PH1]線快速、[PH2]行きです。次は[PH3]、[PH3]です。"
    );
    assert_eq!(outcome.entities_count, 3);
    assert_eq!(
        outcome.entity_mapping.get("[PH1]").map(String::as_str),
        Some("中央")
    );
    assert_eq!(
        outcome.entity_mapping.get("[PH2]").map(String::as_str),
        Some("東京")
    );
    assert_eq!(
        outcome.entity_mapping.get("[PH3]").map(String::as_str),
        Some("新宿")
    );
    assert_eq!(
        outcome.english_translation,
        "Thank you for riding. Chuo Line Express, bound for Tokyo. Next is Shinjuku."
    );
    // Cached entities resolve without touching the knowledge base.
    assert_eq!(kb.calls.load(Ordering::SeqCst), 1);

    // The knowledge hit was persisted.
    let reopened = FileStore::open(&store_path).unwrap();
    assert_eq!(
        reopened.get("新宿").await.unwrap().as_deref(),
        Some("Shinjuku")
    );
}

#[tokio::test]
async fn repeated_requests_reuse_the_learned_entity() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::open(dir.path().join("entities.json")).unwrap());
    let recognizer = Arc::new(FlowRecognizer {
        entities: vec![ent("新宿", 2, 4)],
    });
    let sentences = Arc::new(FlowTranslator {
        expect: "次は[PH1]です。".to_string(),
        reply: "Next is [PH1].".to_string(),
    });
    let kb = Arc::new(SingleEntryKb::default());

    let pipeline = TranslatorPipeline::new(
        recognizer,
        sentences,
        store,
        kb.clone(),
        Arc::new(Romanizer::new()),
        PipelineOptions::default(),
    );

    for _ in 0..2 {
        let outcome = pipeline.translate("次は新宿です。").await;
        assert_eq!(outcome.english_translation, "Next is Shinjuku.");
    }
    assert_eq!(kb.calls.load(Ordering::SeqCst), 1);
}
