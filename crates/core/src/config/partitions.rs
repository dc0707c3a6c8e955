//! Versioned cache partition names.

use serde::{Deserialize, Serialize};

/// What a partition holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Purpose {
    Static,
    Api,
    Image,
}

impl Purpose {
    pub const ALL: [Purpose; 3] = [Purpose::Static, Purpose::Api, Purpose::Image];

    pub fn as_str(self) -> &'static str {
        match self {
            Purpose::Static => "static",
            Purpose::Api => "api",
            Purpose::Image => "image",
        }
    }
}

/// The current partition for each purpose, named `<prefix>-<purpose>-<version>`.
///
/// Exactly one name per purpose is current; anything else found in storage
/// belongs to an older deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionSet {
    static_name: String,
    api_name: String,
    image_name: String,
}

impl PartitionSet {
    pub fn new(prefix: &str, version: &str) -> Self {
        let name = |purpose: Purpose| format!("{prefix}-{}-{version}", purpose.as_str());
        Self { static_name: name(Purpose::Static), api_name: name(Purpose::Api), image_name: name(Purpose::Image) }
    }

    pub fn name(&self, purpose: Purpose) -> &str {
        match purpose {
            Purpose::Static => &self.static_name,
            Purpose::Api => &self.api_name,
            Purpose::Image => &self.image_name,
        }
    }

    pub fn is_current(&self, name: &str) -> bool {
        Purpose::ALL.iter().any(|p| self.name(*p) == name)
    }

    pub fn names(&self) -> [&str; 3] {
        [&self.static_name, &self.api_name, &self.image_name]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_names() {
        let set = PartitionSet::new("otakudb", "v1");
        assert_eq!(set.name(Purpose::Static), "otakudb-static-v1");
        assert_eq!(set.name(Purpose::Api), "otakudb-api-v1");
        assert_eq!(set.name(Purpose::Image), "otakudb-image-v1");
    }

    #[test]
    fn test_is_current() {
        let set = PartitionSet::new("otakudb", "v2");
        assert!(set.is_current("otakudb-api-v2"));
        assert!(!set.is_current("otakudb-api-v1"));
        assert!(!set.is_current("otakudb-v1"));
    }
}
