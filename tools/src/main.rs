use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client::ClientConfig;
use glob::Pattern;
use tools::{format_text, parse_capture, replay};

#[derive(Parser)]
#[command(
    name = "netsnap-tools",
    version,
    about = "netsnap capture replay tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay captured server messages through a client connection.
    Replay {
        /// Capture file, or a directory of captures.
        path: PathBuf,
        /// Optional glob filter when replaying a directory.
        #[arg(long)]
        glob: Option<String>,
        /// Client configuration JSON (limits and field layouts).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Replay {
            path,
            glob,
            config,
            format,
        } => {
            let config = config
                .as_deref()
                .map(load_config)
                .transpose()
                .context("load config")?
                .unwrap_or_default();
            let files = if path.is_dir() {
                collect_captures(&path, glob.as_deref())?
            } else {
                vec![path]
            };
            for file in files {
                replay_file(&file, &config, format)?;
            }
        }
    }
    Ok(())
}

fn replay_file(path: &Path, config: &ClientConfig, format: OutputFormat) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("read capture {}", path.display()))?;
    let records =
        parse_capture(&bytes).with_context(|| format!("parse capture {}", path.display()))?;
    tracing::info!(file = %path.display(), messages = records.len(), "replaying");
    let summary = replay(&records, config.clone())?;
    match format {
        OutputFormat::Text => {
            println!("== {} ({} messages) ==", path.display(), records.len());
            print!("{}", format_text(&summary));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&summary).context("serialize json")?;
            println!("{json}");
        }
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<ClientConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let config: ClientConfig = serde_json::from_str(&contents).context("parse config json")?;
    config
        .validate()
        .map_err(|err| anyhow::anyhow!("config validation failed: {err}"))?;
    Ok(config)
}

fn collect_captures(dir: &Path, glob: Option<&str>) -> Result<Vec<PathBuf>> {
    let pattern = match glob {
        Some(value) => Some(Pattern::new(value).context("invalid glob pattern")?),
        None => None,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(pattern) = &pattern {
            let matches_path = pattern.matches_path(&path);
            let matches_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| pattern.matches(name));
            if !matches_path && !matches_name {
                continue;
            }
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}
