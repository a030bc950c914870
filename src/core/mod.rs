//! Core module - tag types, storage backends and configuration

pub mod config;
pub mod storage;
pub mod store;
pub mod tag;

pub use config::{Config, ConfigError};
pub use storage::TagsStorage;
pub use store::{
    MutationResult, OpenResult, Ordering, OrderColumn, OrderDirection, SqliteTagsStore,
    StoreError, StoreOptions, StoreStatistics, StoreStats, TypeScope, TAGS_DB_VERSION,
};
pub use tag::{FileEntry, MacroEntry, PPToken, TagEntry, ANONYMOUS_SCOPE_PREFIX, GLOBAL_SCOPE};
