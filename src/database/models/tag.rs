use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// Tag row joined with the certificate it is attached to
#[derive(Debug, Clone, FromRow)]
pub struct CertificateTagRow {
    pub cert_id: i64,
    pub id: i64,
    pub name: String,
}

impl From<CertificateTagRow> for Tag {
    fn from(row: CertificateTagRow) -> Self {
        Tag { id: row.id, name: row.name }
    }
}
