//! Init-config command - Write a sample configuration file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use desk_chat::DeskConfig;

#[derive(Args)]
pub struct InitConfigArgs {
    /// Where to write the file
    #[arg(short, long, default_value = "deskchat.toml")]
    path: PathBuf,

    /// Webhook URL to put in the file
    #[arg(long, default_value = "http://localhost:5678/webhook/support")]
    webhook_url: String,

    /// Overwrite an existing file
    #[arg(short, long)]
    force: bool,
}

pub async fn execute(args: InitConfigArgs) -> Result<()> {
    write_sample(&args.path, &args.webhook_url, args.force)?;

    println!("✅ Wrote {}", args.path.display());
    println!();
    println!("Next steps:");
    println!("  deskchat chat --config {}", args.path.display());

    Ok(())
}

fn write_sample(path: &Path, webhook_url: &str, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            path.display()
        );
    }

    let mut config = DeskConfig::default();
    config.webhook.url = webhook_url.to_string();

    let content = config.to_toml().context("Failed to render configuration")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!("Sample configuration written to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_sample_loads_back() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("deskchat.toml");

        write_sample(&path, "https://hooks.example.com/support", false).unwrap();

        let config = DeskConfig::from_file(&path).unwrap();
        assert_eq!(config.webhook.url, "https://hooks.example.com/support");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_refuses_to_overwrite() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("deskchat.toml");
        std::fs::write(&path, "# mine").unwrap();

        assert!(write_sample(&path, "https://hooks.example.com/support", false).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# mine");

        write_sample(&path, "https://hooks.example.com/support", true).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("[webhook]"));
    }
}
