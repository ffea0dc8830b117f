pub mod types;
pub mod filter;
pub mod filter_where;
pub mod filter_order;
pub mod certificate_search;
pub mod error;

pub use types::*;
pub use filter::Filter;
pub use filter_order::FilterOrder;
pub use certificate_search::CertificateSearch;
pub use error::FilterError;
