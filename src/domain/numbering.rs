use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::errors::DomainError;

/// Document families that draw numbers from their own per-year sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentKind {
    Order,
    Transfer,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Order => "ORDER",
            DocumentKind::Transfer => "TRANSFER",
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            DocumentKind::Order => "PO",
            DocumentKind::Transfer => "TR",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ORDER" => Ok(DocumentKind::Order),
            "TRANSFER" => Ok(DocumentKind::Transfer),
            other => Err(DomainError::Internal(format!(
                "unknown document kind '{other}'"
            ))),
        }
    }
}

/// `{PREFIX}-{year}-{sequence}` with the sequence zero-padded to six digits.
pub fn format_document_number(kind: DocumentKind, year: i32, sequence: i64) -> String {
    format!("{}-{}-{:06}", kind.prefix(), year, sequence)
}
