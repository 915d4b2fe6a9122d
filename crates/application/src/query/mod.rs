mod context;
mod metadata;
mod options;

pub use context::QueryContext;
pub use metadata::QueryMetadata;
pub use options::QueryOptions;
