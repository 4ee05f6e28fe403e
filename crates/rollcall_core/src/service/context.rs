//! Caller context for administrative operations.

use serde::{Deserialize, Serialize};

/// Authenticated operator performing a directory change.
///
/// Authentication happens outside the core; this only carries who the
/// identity layer says the caller is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminContext {
    operator: String,
}

impl AdminContext {
    pub fn new(operator: impl Into<String>) -> Self {
        Self {
            operator: operator.into().trim().to_string(),
        }
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }

    /// Whether an operator is named at all.
    pub fn is_present(&self) -> bool {
        !self.operator.is_empty()
    }
}
