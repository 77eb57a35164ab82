use clap::{Args, Subcommand, ValueEnum};

use crate::config::Config;

#[derive(Debug, Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => print_text(config),
                }
                Ok(())
            }
        }
    }
}

fn print_text(config: &Config) {
    println!("Configuration");
    println!("=============\n");

    if let Some(path) = &config.config_file {
        println!("Config file: {}", path.display());
    } else {
        println!(
            "Config file: {} (not found)",
            Config::default_config_path().display()
        );
    }
    println!();

    println!("collection: {}", config.collection.value);
    println!("  source: {}", config.collection.source);
    println!();

    println!("mirror_dir: {}", config.mirror_dir.value.display());
    println!("  source: {}", config.mirror_dir.source);
    println!();

    let remote = &config.remote;
    println!("remote:");
    println!(
        "  project_id:    {}",
        remote.project_id.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  access_token:  {}",
        if remote.access_token.is_some() {
            "(set)"
        } else {
            "(not set)"
        }
    );
    if let Some(host) = &remote.emulator_host {
        println!("  emulator_host: {}", host);
    }
    println!("  read_attempts: {}", remote.read_attempts);
    println!("  retry_delay:   {}ms", remote.retry_delay_ms);
    println!("  timeout:       {}s", remote.timeout_secs);
}
