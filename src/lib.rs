pub mod api;
pub mod config;
pub mod models;
pub mod pipeline;
pub mod placeholders;
pub mod romaji;
pub mod store;
pub mod textutil;
pub mod wikidata;
