use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Activation state shared by members, associations, banks and fees.
///
/// Records are never deleted. Disabling one keeps its history readable while
/// dropping it out of listings and aggregates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    #[default]
    Active,
    NotActive,
}

impl RecordStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::NotActive => "not_active",
        }
    }

    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl TryFrom<&str> for RecordStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(Self::Active),
            "not_active" => Ok(Self::NotActive),
            other => Err(EngineError::InvalidStatus(format!(
                "invalid record status: {other}"
            ))),
        }
    }
}
