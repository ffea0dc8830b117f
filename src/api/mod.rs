pub mod format;
pub mod query;
