//! Operational blocks.
//!
//! A block groups connectors across categories by matching substrings
//! against connector ids. This is a coarse heuristic, not a taxonomy: an id
//! like `@gitguardian/gg-mcp` lands in both `security` and `devops`.

pub struct CategoryBlock {
    pub name: &'static str,
    pub patterns: &'static [&'static str],
}

impl CategoryBlock {
    pub fn matches(&self, connector_id: &str) -> bool {
        self.patterns.iter().any(|p| connector_id.contains(p))
    }
}

pub static CATEGORY_BLOCKS: &[CategoryBlock] = &[
    CategoryBlock {
        name: "cloud",
        patterns: &["aws", "gcp", "azure", "vercel", "cloudflare"],
    },
    CategoryBlock {
        name: "devops",
        patterns: &["docker", "kubernetes", "git", "github", "gitlab"],
    },
    CategoryBlock {
        name: "search",
        patterns: &["brave-search", "perplexity", "google-search", "bing"],
    },
    CategoryBlock {
        name: "messaging",
        patterns: &["slack", "discord", "telegram", "whatsapp", "email"],
    },
    CategoryBlock {
        name: "productivity",
        patterns: &["notion", "todoist", "calendar", "drive", "sheets"],
    },
    CategoryBlock {
        name: "databases",
        patterns: &["postgres", "sqlite", "mongodb", "redis", "bigquery"],
    },
    CategoryBlock {
        name: "ai",
        patterns: &["openai", "anthropic", "huggingface", "langchain"],
    },
    CategoryBlock {
        name: "monitoring",
        patterns: &["datadog", "sentry", "prometheus", "grafana"],
    },
    CategoryBlock {
        name: "finance",
        patterns: &["stripe", "paypal", "crypto", "stocks"],
    },
    CategoryBlock {
        name: "security",
        patterns: &["vault", "gitguardian", "1password", "auth0"],
    },
];

/// Blocks that must keep at least [`MIN_ACTIVE_PER_CRITICAL_BLOCK`] active connectors.
pub const CRITICAL_BLOCKS: [&str; 4] = ["cloud", "databases", "messaging", "security"];

pub const MIN_ACTIVE_PER_CRITICAL_BLOCK: usize = 2;

pub fn find_block(name: &str) -> Option<&'static CategoryBlock> {
    CATEGORY_BLOCKS.iter().find(|b| b.name == name)
}

pub fn block_names() -> impl Iterator<Item = &'static str> {
    CATEGORY_BLOCKS.iter().map(|b| b.name)
}
