//! Compiled-in connector table.

use super::models::{Category, ConnectorDescriptor};

const fn connector(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    category: Category,
    official: bool,
    featured: bool,
) -> ConnectorDescriptor {
    ConnectorDescriptor {
        id,
        name,
        description,
        category,
        official,
        featured,
    }
}

pub static CONNECTORS: &[ConnectorDescriptor] = &[
    // Knowledge & memory
    connector(
        "@modelcontextprotocol/memory",
        "Memory System",
        "Persistent graph-based memory",
        Category::Knowledge,
        true,
        true,
    ),
    connector(
        "@modelcontextprotocol/sequential-thinking",
        "Sequential Thinking",
        "Dynamic step-by-step problem solving",
        Category::Knowledge,
        true,
        false,
    ),
    connector(
        "@modelcontextprotocol/knowledge-graph",
        "Knowledge Graph",
        "Knowledge graph for semantic lookup",
        Category::Knowledge,
        false,
        false,
    ),
    // Messaging
    connector(
        "@modelcontextprotocol/slack",
        "Slack",
        "Channel and message management",
        Category::Messaging,
        false,
        true,
    ),
    connector(
        "@chatbotkit/discord-mcp",
        "Discord",
        "Build and run Discord chatbots",
        Category::Messaging,
        false,
        false,
    ),
    connector(
        "@lharries/whatsapp-mcp",
        "WhatsApp",
        "Search and send WhatsApp messages",
        Category::Messaging,
        false,
        false,
    ),
    connector(
        "@modelcontextprotocol/telegram",
        "Telegram",
        "Chat and message management",
        Category::Messaging,
        false,
        false,
    ),
    // Productivity
    connector(
        "@makenotion/notion-mcp-server",
        "Notion",
        "Full Notion workspace integration",
        Category::Productivity,
        true,
        true,
    ),
    connector(
        "@modelcontextprotocol/google-calendar",
        "Google Calendar",
        "Manage events and calendars",
        Category::Productivity,
        false,
        false,
    ),
    connector(
        "@modelcontextprotocol/gmail",
        "Gmail",
        "Read, search and send mail",
        Category::Productivity,
        false,
        false,
    ),
    connector(
        "@modelcontextprotocol/google-tasks",
        "Google Tasks",
        "Task list management",
        Category::Productivity,
        false,
        false,
    ),
    connector(
        "@isaacphi/mcp-gdrive",
        "Google Drive",
        "Access and manage Drive files",
        Category::Productivity,
        false,
        false,
    ),
    // AI / ML
    connector(
        "@modelcontextprotocol/huggingface",
        "Hugging Face",
        "Interact with the Hugging Face Hub",
        Category::Ai,
        false,
        false,
    ),
    connector(
        "@modelcontextprotocol/openai",
        "OpenAI",
        "OpenAI API integration",
        Category::Ai,
        false,
        false,
    ),
    connector(
        "@langchain-ai/langchain-mcp-adapters",
        "LangChain",
        "LangChain adapters for MCP",
        Category::Ai,
        false,
        false,
    ),
    connector(
        "@google-cloud/vertex-ai-mcp",
        "Vertex AI",
        "Google Vertex AI machine learning platform",
        Category::Ai,
        true,
        true,
    ),
    connector(
        "@google/gemini-mcp",
        "Google Gemini",
        "Google Gemini multimodal models",
        Category::Ai,
        true,
        false,
    ),
    connector(
        "@google/ai-studio-mcp",
        "Google AI Studio",
        "Google AI development platform",
        Category::Ai,
        false,
        false,
    ),
    // Databases
    connector(
        "@modelcontextprotocol/postgres",
        "PostgreSQL",
        "PostgreSQL queries and schema inspection",
        Category::Databases,
        true,
        true,
    ),
    connector(
        "@modelcontextprotocol/sqlite",
        "SQLite",
        "SQLite queries and schema inspection",
        Category::Databases,
        true,
        false,
    ),
    connector(
        "@mongodb-js/mongodb-mcp-server",
        "MongoDB",
        "MongoDB collections and aggregation",
        Category::Databases,
        false,
        false,
    ),
    connector(
        "@redis/mcp-redis",
        "Redis",
        "Redis key-value operations",
        Category::Databases,
        false,
        false,
    ),
    // DevOps
    connector(
        "@modelcontextprotocol/git",
        "Git",
        "Git repository operations",
        Category::Devops,
        true,
        false,
    ),
    connector(
        "@ryan0204/github-repo-mcp",
        "GitHub",
        "GitHub repositories, issues and pull requests",
        Category::Devops,
        false,
        true,
    ),
    connector(
        "@modelcontextprotocol/docker",
        "Docker",
        "Container management",
        Category::Devops,
        false,
        false,
    ),
    // Cloud
    connector(
        "@awslabs/aws-api-mcp-server",
        "AWS API",
        "AWS service APIs through the AWS CLI",
        Category::Cloud,
        true,
        false,
    ),
    connector(
        "@cloudflare/mcp-server-cloudflare",
        "Cloudflare",
        "Workers, KV and DNS management",
        Category::Cloud,
        true,
        false,
    ),
    connector(
        "@vercel/vercel-mcp",
        "Vercel",
        "Deployments and project management",
        Category::Cloud,
        false,
        false,
    ),
    connector(
        "@azure/azure-mcp",
        "Microsoft Azure",
        "Azure resource management",
        Category::Cloud,
        false,
        false,
    ),
    // Search
    connector(
        "@modelcontextprotocol/brave-search",
        "Brave Search",
        "Web and local search through Brave",
        Category::Search,
        true,
        false,
    ),
    connector(
        "@perplexity-ai/perplexity-mcp",
        "Perplexity",
        "Answer engine with cited sources",
        Category::Search,
        false,
        false,
    ),
    // Monitoring
    connector(
        "@sentry/mcp-server",
        "Sentry",
        "Error tracking and issue triage",
        Category::Monitoring,
        true,
        false,
    ),
    connector(
        "@grafana/mcp-grafana",
        "Grafana",
        "Dashboards, alerts and data sources",
        Category::Monitoring,
        false,
        false,
    ),
    // Finance
    connector(
        "@stripe/agent-toolkit",
        "Stripe",
        "Payments, customers and invoices",
        Category::Finance,
        true,
        false,
    ),
    // Security
    connector(
        "@hashicorp/vault-mcp-server",
        "HashiCorp Vault",
        "Secret storage and retrieval",
        Category::Security,
        true,
        false,
    ),
    connector(
        "@gitguardian/gg-mcp",
        "GitGuardian",
        "Secret scanning for repositories",
        Category::Security,
        false,
        false,
    ),
    connector(
        "@auth0/auth0-mcp-server",
        "Auth0",
        "Identity tenant management",
        Category::Security,
        false,
        false,
    ),
];

/// Default (primary, fallback) pairs applied when the registry is built.
pub static DEFAULT_FALLBACKS: &[(&str, &str)] = &[
    ("@modelcontextprotocol/postgres", "@modelcontextprotocol/sqlite"),
    ("@modelcontextprotocol/slack", "@chatbotkit/discord-mcp"),
    ("@modelcontextprotocol/telegram", "@lharries/whatsapp-mcp"),
    ("@awslabs/aws-api-mcp-server", "@cloudflare/mcp-server-cloudflare"),
    ("@google/gemini-mcp", "@google-cloud/vertex-ai-mcp"),
    ("@ryan0204/github-repo-mcp", "@modelcontextprotocol/git"),
    ("@modelcontextprotocol/brave-search", "@perplexity-ai/perplexity-mcp"),
];
