pub mod recognizer;
pub mod sentence;

pub use recognizer::{EntityRecognizer, HttpRecognizer, RawEntity};
pub use sentence::{HttpSentenceTranslator, SentenceTranslator};
