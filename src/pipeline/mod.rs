pub mod affix;
pub mod dedupe;
pub mod entity;
pub mod mapper;
pub mod spans;
mod translator;

pub use translator::{
    PipelineOptions, ServiceHealth, TranslationOutcome, TranslatorPipeline, DEFAULT_ENTITY_GROUPS,
};
