use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use annai_translator::api::{router, AppState};
use annai_translator::config::{find_default_config, init_default_config, load_config, AppConfig};
use annai_translator::models::{
    EntityRecognizer, HttpRecognizer, HttpSentenceTranslator, SentenceTranslator,
};
use annai_translator::pipeline::{PipelineOptions, TranslatorPipeline};
use annai_translator::romaji::Romanizer;
use annai_translator::store::{EntityStore, FileStore};
use annai_translator::wikidata::WikidataClient;

#[derive(Parser, Debug)]
#[command(name = "annai-translator")]
#[command(about = "Japanese transit announcement translation service", long_about = None)]
struct Args {
    /// Generate a default config file, then exit
    #[arg(long)]
    init_config: bool,

    /// Directory to write the config file (default: current directory)
    #[arg(long, value_name = "DIR")]
    init_config_dir: Option<PathBuf>,

    /// Overwrite an existing config file when used with --init-config
    #[arg(long)]
    force: bool,

    /// Config file path (default: search for annai-translator.toml upwards)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bind host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides config; the PORT env var is also honored)
    #[arg(short, long)]
    port: Option<u16>,

    /// Entity store JSON file (overrides config)
    #[arg(long, value_name = "FILE")]
    store: Option<PathBuf>,

    /// Hosted entity recognizer endpoint URL (overrides config)
    #[arg(long)]
    recognizer_endpoint: Option<String>,

    /// Hosted sentence translator endpoint URL (overrides config)
    #[arg(long)]
    translator_endpoint: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if args.init_config {
        let dir = args
            .init_config_dir
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        let cfg_path = init_default_config(&dir, args.force).context("init default config")?;
        eprintln!("Wrote config: {}", cfg_path.display());
        return Ok(());
    }

    let workdir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let cfg_file = args
        .config
        .clone()
        .or_else(|| std::env::var("ANNAI_CONFIG").ok().map(PathBuf::from))
        .or_else(|| find_default_config(&workdir, "annai-translator.toml"));
    let mut cfg = AppConfig::default();
    if let Some(p) = cfg_file.as_ref() {
        if p.exists() {
            cfg = load_config(p)?;
            info!("loaded config: {}", p.display());
        }
    }

    if let Some(host) = args.host {
        cfg.server.host = host;
    }
    if let Some(port) = args.port {
        cfg.server.port = port;
    } else if let Ok(port) = std::env::var("PORT") {
        cfg.server.port = port.parse().context("parse PORT env var")?;
    }
    if let Some(path) = args.store {
        cfg.store.path = path;
    }
    if let Some(url) = args.recognizer_endpoint {
        cfg.models.recognizer_endpoint = Some(url);
    }
    if let Some(url) = args.translator_endpoint {
        cfg.models.translator_endpoint = Some(url);
    }

    let model_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.models.request_timeout_secs))
        .build()
        .context("build model http client")?;

    let store = Arc::new(
        FileStore::open(cfg.store.path.clone())
            .with_context(|| format!("open entity store {}", cfg.store.path.display()))?,
    );
    info!("entity store ready, {} entries", store.count().await);

    let recognizer = Arc::new(HttpRecognizer::new(
        model_client.clone(),
        cfg.models.recognizer_endpoint.clone(),
        cfg.models.api_token.clone(),
    ));
    let sentences = Arc::new(HttpSentenceTranslator::new(
        model_client,
        cfg.models.translator_endpoint.clone(),
        cfg.models.api_token.clone(),
        cfg.models.batch_size,
    ));
    if !recognizer.is_ready() {
        warn!("recognizer endpoint not configured, requests will pass through unannotated");
    }
    if !sentences.is_ready() {
        warn!("translator endpoint not configured, requests will fall back to romanization");
    }

    let knowledge =
        Arc::new(WikidataClient::new(&cfg.knowledge).context("build knowledge client")?);
    let romanizer = match cfg.pipeline.readings_lexicon.as_ref() {
        Some(p) => Arc::new(
            Romanizer::from_lexicon_file(p)
                .with_context(|| format!("load readings lexicon {}", p.display()))?,
        ),
        None => Arc::new(Romanizer::new()),
    };

    let options = PipelineOptions {
        entity_groups: cfg.pipeline.entity_groups.clone(),
        max_phrase_len: cfg.pipeline.max_phrase_len,
        log_excerpt_chars: cfg.pipeline.log_excerpt_chars,
    };
    let pipeline = Arc::new(TranslatorPipeline::new(
        recognizer,
        sentences,
        store.clone(),
        knowledge,
        romanizer,
        options,
    ));

    let app = router(AppState { pipeline, store });
    let addr = format!("{}:{}", cfg.server.host, cfg.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!("listening on {addr}");
    axum::serve(listener, app).await.context("serve http")?;
    Ok(())
}
