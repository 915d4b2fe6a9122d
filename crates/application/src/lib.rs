pub mod ports;
pub mod query;

pub use query::{QueryContext, QueryMetadata, QueryOptions};
