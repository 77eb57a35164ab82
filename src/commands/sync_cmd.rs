//! Pull, push and status commands.

use clap::Args;
use std::path::PathBuf;

use crate::config::{Config, ConfigError};
use crate::mirror::{sentinel_path, FsMirror, MirrorStore};
use crate::remote::{FirestoreClient, RemoteCollection};
use crate::sync::{Pipeline, SyncError};

/// Collection and mirror directory overrides shared by every sync command
#[derive(Debug, Args)]
pub struct TargetArgs {
    /// Remote collection name
    #[arg(long)]
    collection: Option<String>,

    /// Local mirror directory
    #[arg(long)]
    dir: Option<PathBuf>,
}

impl TargetArgs {
    fn resolve(&self, config: &Config) -> Config {
        config
            .clone()
            .with_overrides(self.collection.clone(), self.dir.clone())
    }
}

/// Replace the local mirror with the remote collection
#[derive(Debug, Args)]
pub struct PullCommand {
    #[command(flatten)]
    target: TargetArgs,
}

impl PullCommand {
    pub async fn run(&self, config: &Config) -> Result<(), SyncCommandError> {
        let config = self.target.resolve(config);
        let client = FirestoreClient::from_config(&config.remote)?;
        let collection = &config.collection.value;
        let dir = &config.mirror_dir.value;

        println!("Pulling '{}' into {}...", collection, dir.display());

        let report = Pipeline::new(&client, &FsMirror).pull(collection, dir).await?;

        println!(
            "✓ {} record{} written",
            report.written,
            if report.written == 1 { "" } else { "s" }
        );
        println!("  synced at {}", report.synced_at.to_rfc3339());
        Ok(())
    }
}

/// Replace the remote collection with the local mirror
#[derive(Debug, Args)]
pub struct PushCommand {
    #[command(flatten)]
    target: TargetArgs,
}

impl PushCommand {
    pub async fn run(&self, config: &Config) -> Result<(), SyncCommandError> {
        let config = self.target.resolve(config);
        let client = FirestoreClient::from_config(&config.remote)?;
        let collection = &config.collection.value;
        let dir = &config.mirror_dir.value;

        println!("Pushing {} to '{}'...", dir.display(), collection);

        let report = Pipeline::new(&client, &FsMirror).push(collection, dir).await?;

        println!("✓ {} document(s) deleted", report.deleted);
        println!("✓ {} document(s) inserted and verified", report.inserted);
        Ok(())
    }
}

/// Show sync configuration, local mirror state and remote count
#[derive(Debug, Args)]
pub struct StatusCommand {
    #[command(flatten)]
    target: TargetArgs,
}

impl StatusCommand {
    pub async fn run(&self, config: &Config) -> Result<(), SyncCommandError> {
        let config = self.target.resolve(config);
        let dir = &config.mirror_dir.value;

        println!("Sync Status");
        println!("===========");
        println!();
        println!("Collection: {}", config.collection.value);
        println!("Mirror:     {}", dir.display());
        println!();

        match FsMirror.list_files(dir) {
            Ok(files) => println!("Local records:  {}", files.len()),
            Err(_) => println!("Local records:  (mirror directory missing)"),
        }

        let sentinel = sentinel_path(dir);
        if FsMirror.exists(&sentinel) {
            let stamp = FsMirror.read_text(&sentinel)?;
            println!("Last pull:      {}", stamp.trim());
        } else {
            println!("Last pull:      never");
        }

        if !config.remote.is_configured() {
            println!("Remote records: not configured");
            println!();
            println!("To enable sync, add to your config file:");
            println!();
            println!("  remote:");
            println!("    project_id: \"your-project\"");
            println!();
            println!("Or set environment variable:");
            println!("  LEVELSYNC_PROJECT_ID");
            return Ok(());
        }

        let client = FirestoreClient::from_config(&config.remote)?;
        match client.count(&config.collection.value).await {
            Ok(count) => println!("Remote records: {}", count),
            Err(SyncError::RemoteUnavailable(e)) => {
                tracing::debug!("Count failed: {}", e);
                println!("Remote records: ✗ unreachable");
            }
            Err(e) => println!("Remote records: ✗ error: {}", e),
        }

        Ok(())
    }
}

/// Errors from sync commands
#[derive(Debug)]
pub enum SyncCommandError {
    ConfigError(ConfigError),
    SyncError(SyncError),
}

impl SyncCommandError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            SyncCommandError::ConfigError(_) => 1,
            SyncCommandError::SyncError(e) => e.exit_code(),
        }
    }
}

impl std::fmt::Display for SyncCommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncCommandError::ConfigError(e) => write!(f, "{}", e),
            SyncCommandError::SyncError(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SyncCommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncCommandError::ConfigError(e) => Some(e),
            SyncCommandError::SyncError(e) => Some(e),
        }
    }
}

impl From<ConfigError> for SyncCommandError {
    fn from(e: ConfigError) -> Self {
        SyncCommandError::ConfigError(e)
    }
}

impl From<SyncError> for SyncCommandError {
    fn from(e: SyncError) -> Self {
        SyncCommandError::SyncError(e)
    }
}
