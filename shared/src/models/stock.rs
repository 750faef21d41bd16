//! Stock ledger enums

use serde::{Deserialize, Serialize};

/// Direction of a manual stock adjustment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockChangeType {
    Add,
    Reduce,
}

impl StockChangeType {
    /// Parse from database string value (uppercase)
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "ADD" => Some(Self::Add),
            "REDUCE" => Some(Self::Reduce),
            _ => None,
        }
    }

    /// Database string representation (uppercase)
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Reduce => "REDUCE",
        }
    }
}

impl std::fmt::Display for StockChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_db())
    }
}
