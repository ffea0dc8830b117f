pub mod certificate;
pub mod order;
pub mod refresh_token;
pub mod role;
pub mod tag;
pub mod user;

pub use certificate::{Certificate, CertificateWithTags};
pub use order::{Order, OrderDetails};
pub use refresh_token::RefreshToken;
pub use role::Role;
pub use tag::Tag;
pub use user::{User, UserWithRoles};
