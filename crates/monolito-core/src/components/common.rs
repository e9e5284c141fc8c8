//! Shared components.

use serde::{Deserialize, Serialize};

/// Name component for villagers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name {
    pub given: String,
    pub family: String,
    /// Epithet earned by legendary villagers ("la Vidente").
    pub epithet: Option<String>,
}

impl Name {
    pub fn new(given: impl Into<String>, family: impl Into<String>) -> Self {
        Self {
            given: given.into(),
            family: family.into(),
            epithet: None,
        }
    }

    pub fn with_epithet(mut self, epithet: impl Into<String>) -> Self {
        self.epithet = Some(epithet.into());
        self
    }

    pub fn full_name(&self) -> String {
        match &self.epithet {
            Some(epithet) => format!("{} {}, {}", self.given, self.family, epithet),
            None => format!("{} {}", self.given, self.family),
        }
    }
}
