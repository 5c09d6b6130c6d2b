pub mod core;
pub mod persistence;
pub mod sentence;
pub mod wanikani;

pub use crate::core::{
    AppConfig,
    KnowledgeSnapshot,
    SpeechBubbleError,
};
