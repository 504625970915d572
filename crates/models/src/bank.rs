use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed set of supported statement layouts. The bank folder name in the
/// upload hierarchy is the external tag that selects one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bank {
    KBank,
    Scb,
    Ttb,
}

impl Bank {
    /// Resolve an external tag string, case-insensitively.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "kbank" => Some(Bank::KBank),
            "scb" => Some(Bank::Scb),
            "ttb" => Some(Bank::Ttb),
            _ => None,
        }
    }

    /// Display name used in the canonical `Bank` column.
    pub fn name(&self) -> &'static str {
        match self {
            Bank::KBank => "KBank",
            Bank::Scb => "SCB",
            Bank::Ttb => "TTB",
        }
    }

    pub fn all() -> [Bank; 3] {
        [Bank::KBank, Bank::Scb, Bank::Ttb]
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
