use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Functional category of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Security,
    Cloud,
    Devops,
    Databases,
    Messaging,
    Productivity,
    Ai,
    Search,
    Monitoring,
    Finance,
    Knowledge,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Security,
        Category::Cloud,
        Category::Devops,
        Category::Databases,
        Category::Messaging,
        Category::Productivity,
        Category::Ai,
        Category::Search,
        Category::Monitoring,
        Category::Finance,
        Category::Knowledge,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Security => "security",
            Category::Cloud => "cloud",
            Category::Devops => "devops",
            Category::Databases => "databases",
            Category::Messaging => "messaging",
            Category::Productivity => "productivity",
            Category::Ai => "ai",
            Category::Search => "search",
            Category::Monitoring => "monitoring",
            Category::Finance => "finance",
            Category::Knowledge => "knowledge",
        }
    }

    /// Priority given to non-official connectors of this category.
    pub fn base_priority(self) -> u8 {
        match self {
            Category::Security => 9,
            Category::Cloud => 8,
            Category::Devops => 8,
            Category::Databases => 7,
            Category::Messaging => 7,
            Category::Productivity => 6,
            Category::Ai => 6,
            Category::Search => 5,
            Category::Monitoring => 5,
            Category::Finance => 4,
            Category::Knowledge => 5,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let lowered = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == lowered)
            .ok_or_else(|| anyhow::anyhow!("Unknown category: {}", s))
    }
}

/// Immutable identity and metadata of a connector, compiled into the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConnectorDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: Category,
    pub official: bool,
    pub featured: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse_case_insensitive() {
        assert_eq!("Cloud".parse::<Category>().unwrap(), Category::Cloud);
        assert_eq!(" databases ".parse::<Category>().unwrap(), Category::Databases);
        assert!("aiml".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_serializes_lowercase() {
        let json = serde_json::to_string(&Category::Ai).unwrap();
        assert_eq!(json, "\"ai\"");
    }

    #[test]
    fn test_base_priority_table() {
        assert_eq!(Category::Security.base_priority(), 9);
        assert_eq!(Category::Cloud.base_priority(), 8);
        assert_eq!(Category::Devops.base_priority(), 8);
        assert_eq!(Category::Databases.base_priority(), 7);
        assert_eq!(Category::Messaging.base_priority(), 7);
        assert_eq!(Category::Productivity.base_priority(), 6);
        assert_eq!(Category::Ai.base_priority(), 6);
        assert_eq!(Category::Search.base_priority(), 5);
        assert_eq!(Category::Monitoring.base_priority(), 5);
        assert_eq!(Category::Finance.base_priority(), 4);
        assert_eq!(Category::Knowledge.base_priority(), 5);
    }
}
