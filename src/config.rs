use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::pipeline::DEFAULT_ENTITY_GROUPS;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub models: ModelsSection,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub pipeline: PipelineSection,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    /// Overridden by the PORT environment variable when set.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ModelsSection {
    /// Hosted NER endpoint. Unset leaves the recognizer degraded: requests
    /// pass through without entity annotation.
    #[serde(default)]
    pub recognizer_endpoint: Option<String>,
    /// Hosted ja→en sequence-to-sequence endpoint. Unset leaves sentence
    /// translation degraded: requests fall back to romanization.
    #[serde(default)]
    pub translator_endpoint: Option<String>,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for ModelsSection {
    fn default() -> Self {
        Self {
            recognizer_endpoint: None,
            translator_endpoint: None,
            api_token: None,
            request_timeout_secs: default_request_timeout_secs(),
            batch_size: default_batch_size(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct KnowledgeConfig {
    #[serde(default = "default_knowledge_api_url")]
    pub api_url: String,
    #[serde(default = "default_entity_data_url")]
    pub entity_data_url: String,
    #[serde(default = "default_knowledge_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            api_url: default_knowledge_api_url(),
            entity_data_url: default_entity_data_url(),
            timeout_secs: default_knowledge_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct StoreSection {
    /// Entity cache file, created on first write if missing.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct PipelineSection {
    /// Recognizer groups eligible for placeholder substitution.
    #[serde(default = "default_entity_groups")]
    pub entity_groups: Vec<String>,
    #[serde(default = "default_max_phrase_len")]
    pub max_phrase_len: usize,
    #[serde(default = "default_log_excerpt_chars")]
    pub log_excerpt_chars: usize,
    /// Optional TOML table of kanji surface → katakana reading.
    #[serde(default)]
    pub readings_lexicon: Option<PathBuf>,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            entity_groups: default_entity_groups(),
            max_phrase_len: default_max_phrase_len(),
            log_excerpt_chars: default_log_excerpt_chars(),
            readings_lexicon: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_batch_size() -> usize {
    16
}

fn default_knowledge_api_url() -> String {
    "https://www.wikidata.org/w/api.php".to_string()
}

fn default_entity_data_url() -> String {
    "https://www.wikidata.org/wiki/Special:EntityData".to_string()
}

fn default_knowledge_timeout_secs() -> u64 {
    8
}

fn default_user_agent() -> String {
    "annai-translator/0.1 (transit announcement translation service)".to_string()
}

fn default_store_path() -> PathBuf {
    PathBuf::from("entities.json")
}

fn default_entity_groups() -> Vec<String> {
    DEFAULT_ENTITY_GROUPS.iter().map(|s| s.to_string()).collect()
}

fn default_max_phrase_len() -> usize {
    5
}

fn default_log_excerpt_chars() -> usize {
    50
}

pub fn find_file_upwards(start: &Path, filename: &str, max_up: usize) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    for _ in 0..=max_up {
        let cand = dir.join(filename);
        if cand.is_file() {
            return Some(cand);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

pub fn find_default_config(workdir: &Path, filename: &str) -> Option<PathBuf> {
    if let Ok(cwd) = std::env::current_dir() {
        if let Some(p) = find_file_upwards(&cwd, filename, 8) {
            return Some(p);
        }
    }
    if let Some(p) = find_file_upwards(workdir, filename, 8) {
        return Some(p);
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            if let Some(p) = find_file_upwards(dir, filename, 10) {
                return Some(p);
            }
        }
    }
    None
}

pub fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: AppConfig = toml::from_str(&text).context("parse config toml")?;
    Ok(cfg)
}

pub fn init_default_config(dir: &Path, force: bool) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create config dir: {}", dir.display()))?;
    let cfg_path = dir.join("annai-translator.toml");
    if cfg_path.exists() && !force {
        return Ok(cfg_path);
    }

    let cfg_text = r#"[server]
host = "0.0.0.0"
port = 8000

[models]
# Hosted inference endpoints. Leave unset to run degraded (pass-through
# entity recognition, romanized sentence output).
# recognizer_endpoint = "https://api-inference.example.com/models/ja-ner"
# translator_endpoint = "https://api-inference.example.com/models/ja-en"
# api_token = "hf_..."
request_timeout_secs = 30
batch_size = 16

[knowledge]
api_url = "https://www.wikidata.org/w/api.php"
entity_data_url = "https://www.wikidata.org/wiki/Special:EntityData"
timeout_secs = 8

[store]
path = "entities.json"

[pipeline]
max_phrase_len = 5
# entity_groups = ["地名", "施設名", "法人名", "製品名", "その他の組織名"]
# readings_lexicon = "readings.toml"
"#;
    std::fs::write(&cfg_path, cfg_text)
        .with_context(|| format!("write config: {}", cfg_path.display()))?;
    Ok(cfg_path)
}
