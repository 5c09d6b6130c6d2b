pub mod config;
pub mod errors;
pub mod http;
pub mod models;

pub use config::{
    AppConfig,
    CredentialKind,
    Credentials,
};
pub use errors::SpeechBubbleError;
pub use models::{
    KnowledgeSnapshot,
    Meaning,
    Reading,
    ReadingKind,
    SrsStage,
    SubjectKind,
    UserMetadata,
    VocabularyItem,
};
