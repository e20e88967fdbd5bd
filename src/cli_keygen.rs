use anyhow::{bail, Result};
use clap::Parser;

use mcp_hub_server::security::{generate_api_key, key_fingerprint};

/// Generates API keys for the hub and prints them with their fingerprints.
///
/// Only the fingerprint is ever logged by the server, so keep it next to
/// whatever label you give the key.
#[derive(Parser, Debug)]
struct CliArgs {
    /// Number of keys to generate.
    #[clap(short, long, default_value_t = 1)]
    pub count: usize,

    /// Print a `[api_keys]` TOML snippet using this label prefix.
    #[clap(long)]
    pub label: Option<String>,
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();
    if cli_args.count == 0 {
        bail!("--count must be at least 1");
    }

    let keys: Vec<String> = (0..cli_args.count).map(|_| generate_api_key()).collect();

    match &cli_args.label {
        Some(label) => {
            println!("[api_keys]");
            for (i, key) in keys.iter().enumerate() {
                let name = if keys.len() == 1 {
                    label.clone()
                } else {
                    format!("{}-{}", label, i + 1)
                };
                println!("# {}", key_fingerprint(key));
                println!("{} = \"{}\"", name, key);
            }
        }
        None => {
            for key in &keys {
                println!("{}  {}", key, key_fingerprint(key));
            }
        }
    }
    Ok(())
}
