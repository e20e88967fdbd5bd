//! Connector Catalog
//!
//! The immutable table of connector descriptors the registry is built from.
//! It is the source of truth for identity and metadata only; runtime state
//! (status, usage, priority) lives in [`crate::registry`].

mod library;
mod models;

pub use library::{CONNECTORS, DEFAULT_FALLBACKS};
pub use models::{Category, ConnectorDescriptor};

use serde::Serialize;

/// A catalog hit with its relevance score.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub connector: ConnectorDescriptor,
    pub score: u32,
}

/// Read-only view over a static connector table.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    connectors: &'static [ConnectorDescriptor],
}

impl Catalog {
    pub fn new(connectors: &'static [ConnectorDescriptor]) -> Self {
        Self { connectors }
    }

    /// The table shipped with the binary.
    pub fn builtin() -> Self {
        Self::new(CONNECTORS)
    }

    pub fn connectors(&self) -> &'static [ConnectorDescriptor] {
        self.connectors
    }

    pub fn get(&self, id: &str) -> Option<&'static ConnectorDescriptor> {
        self.connectors.iter().find(|c| c.id == id)
    }

    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }

    /// Categories that have at least one connector, in enumeration order.
    pub fn categories(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|cat| self.connectors.iter().any(|c| c.category == *cat))
            .collect()
    }

    /// Substring search over id, name, description and category, best match first.
    pub fn search(&self, query: &str, category: Option<Category>) -> Vec<SearchHit> {
        let term = query.trim().to_lowercase();
        let mut hits: Vec<SearchHit> = self
            .connectors
            .iter()
            .filter(|c| category.map_or(true, |cat| c.category == cat))
            .filter(|c| {
                c.id.to_lowercase().contains(&term)
                    || c.name.to_lowercase().contains(&term)
                    || c.description.to_lowercase().contains(&term)
                    || c.category.as_str().contains(&term)
            })
            .map(|c| SearchHit {
                connector: *c,
                score: relevance(c, &term),
            })
            .collect();

        // Stable: equal scores keep table order
        hits.sort_by(|a, b| b.score.cmp(&a.score));
        hits
    }
}

fn relevance(connector: &ConnectorDescriptor, term: &str) -> u32 {
    let name = connector.name.to_lowercase();
    let mut score = 0;
    if name == term {
        score += 10;
    }
    if name.contains(term) {
        score += 5;
    }
    if connector.description.to_lowercase().contains(term) {
        score += 3;
    }
    if connector.official {
        score += 2;
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    static TEST_CONNECTORS: &[ConnectorDescriptor] = &[
        ConnectorDescriptor {
            id: "acme/slack-lite",
            name: "Slack Lite",
            description: "Minimal chat bridge",
            category: Category::Messaging,
            official: false,
            featured: false,
        },
        ConnectorDescriptor {
            id: "acme/slack",
            name: "Slack",
            description: "Slack workspace integration",
            category: Category::Messaging,
            official: true,
            featured: false,
        },
        ConnectorDescriptor {
            id: "acme/ledger",
            name: "Ledger",
            description: "Bookkeeping exports",
            category: Category::Finance,
            official: false,
            featured: false,
        },
    ];

    #[test]
    fn test_search_ranks_exact_name_first() {
        let catalog = Catalog::new(TEST_CONNECTORS);
        let hits = catalog.search("slack", None);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].connector.id, "acme/slack");
        // 10 (exact) + 5 (contains) + 3 (description) + 2 (official)
        assert_eq!(hits[0].score, 20);
        assert_eq!(hits[1].score, 5);
    }

    #[test]
    fn test_search_matches_category_name() {
        let catalog = Catalog::new(TEST_CONNECTORS);
        let hits = catalog.search("FINANCE", None);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].connector.id, "acme/ledger");
        assert_eq!(hits[0].score, 0);
    }

    #[test]
    fn test_search_with_category_filter() {
        let catalog = Catalog::new(TEST_CONNECTORS);
        assert!(catalog.search("slack", Some(Category::Finance)).is_empty());
    }

    #[test]
    fn test_categories_only_lists_populated() {
        let catalog = Catalog::new(TEST_CONNECTORS);
        assert_eq!(
            catalog.categories(),
            vec![Category::Messaging, Category::Finance]
        );
    }

    #[test]
    fn test_builtin_catalog_lookup() {
        let catalog = Catalog::builtin();
        assert!(!catalog.is_empty());
        let postgres = catalog.get("@modelcontextprotocol/postgres").unwrap();
        assert_eq!(postgres.category, Category::Databases);
        assert!(catalog.get("does-not-exist").is_none());
    }
}
