use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a material. `Draft -> Published` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialStatus {
    #[default]
    Draft,
    Published,
}

impl MaterialStatus {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            MaterialStatus::Draft => "draft",
            MaterialStatus::Published => "published",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "draft" => Some(MaterialStatus::Draft),
            "published" => Some(MaterialStatus::Published),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_published(&self) -> bool {
        matches!(self, MaterialStatus::Published)
    }
}

impl fmt::Display for MaterialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip() {
        for status in [MaterialStatus::Draft, MaterialStatus::Published] {
            assert_eq!(MaterialStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(MaterialStatus::from_code("archived"), None);
        assert_eq!(MaterialStatus::default(), MaterialStatus::Draft);
    }
}
