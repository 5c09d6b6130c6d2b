pub mod api;
pub mod knowledge;
pub mod types;

pub use api::{
    WaniKaniClient,
    WaniKaniSource,
};
pub use knowledge::{
    build_snapshot,
    cache_key_for,
    load_or_build_snapshot,
};
