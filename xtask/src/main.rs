use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use haunt_assembler::{HauntSession, SceneConfig};
use haunt_stream::LoadRequest;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use std::process::Command;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for the haunted house")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run fmt, clippy, tests and doc in order
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates with warnings denied
    Clippy,
    /// Run all tests
    Test,
    /// Build rustdoc for the workspace
    Doc,
    /// Verify every texture and model the scene requests exists on disk
    Assets {
        /// Asset root, overriding the config
        #[arg(long)]
        root: Option<PathBuf>,
        /// Scene configuration (YAML)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the default scene configuration as YAML
    DefaultConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            cargo("fmt", &["fmt", "--all", "--", "--check"])?;
            cargo("clippy", CLIPPY)?;
            cargo("test", &["test", "--workspace"])?;
            cargo("doc", &["doc", "--workspace", "--no-deps"])?;
        }
        Commands::Fmt => cargo("fmt", &["fmt", "--all", "--", "--check"])?,
        Commands::Clippy => cargo("clippy", CLIPPY)?,
        Commands::Test => cargo("test", &["test", "--workspace"])?,
        Commands::Doc => cargo("doc", &["doc", "--workspace", "--no-deps"])?,
        Commands::Assets { root, config } => check_assets(root, config)?,
        Commands::DefaultConfig => print!("{}", SceneConfig::default().to_yaml()?),
    }

    Ok(())
}

const CLIPPY: &[&str] = &[
    "clippy",
    "--workspace",
    "--all-targets",
    "--",
    "-D",
    "warnings",
];

fn cargo(step: &str, args: &[&str]) -> Result<()> {
    println!("==> Running cargo {step}");
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        bail!("cargo {step} failed");
    }
    Ok(())
}

fn check_assets(root: Option<PathBuf>, config: Option<PathBuf>) -> Result<()> {
    let mut config = match config {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::default(),
    };
    if let Some(root) = root {
        config.assets.root = root;
    }
    println!("==> Checking assets under {}", config.assets.root.display());

    // Grave placement does not affect which files are requested.
    let session = HauntSession::new(config, &mut StdRng::seed_from_u64(0), Instant::now())?;
    let requests = session.load_requests();
    let missing: Vec<PathBuf> = requests
        .iter()
        .map(|r| match r {
            LoadRequest::Texture { path, .. } | LoadRequest::Model { path, .. } => path.clone(),
        })
        .filter(|path| !path.is_file())
        .collect();

    for path in &missing {
        println!("missing: {}", path.display());
    }
    if !missing.is_empty() {
        bail!("{} of {} assets missing", missing.len(), requests.len());
    }
    println!("all {} assets present", requests.len());
    Ok(())
}
