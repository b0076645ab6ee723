pub mod identity;
pub mod item;
pub mod source;

pub use identity::{hash_identifier, seen_fingerprint};
pub use item::Item;
pub use source::{
    ScrapeSelectors, Source, SourceInput, SourceMode, SourcePatch, DEFAULT_GROUP,
    DEFAULT_INTERVAL_MINUTES,
};
