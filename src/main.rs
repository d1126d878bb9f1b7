use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use repovault::{Config, GitHubClient, MirrorEngine, MirrorOutcome, PlanAction};

#[derive(Parser)]
#[command(name = "repovault")]
#[command(about = "Mirror GitHub repositories from a primary account into a backup account")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter configuration file
    Init {
        /// Username of the account to back up
        #[arg(long)]
        primary: String,

        /// Username of the backup account
        #[arg(long)]
        secondary: String,

        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// List repositories owned by the primary account
    List {
        /// Show repository details
        #[arg(long)]
        details: bool,
    },

    /// Mirror primary repositories into the secondary account
    Run {
        /// Report what would happen without creating, cloning or pushing
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    match cli.command {
        Commands::Init {
            primary,
            secondary,
            force,
        } => cmd_init(cli.config, &primary, &secondary, force),
        Commands::List { details } => {
            let config = load_config(cli.config)?;
            cmd_list(details, &config).await
        }
        Commands::Run { dry_run } => {
            let config = load_config(cli.config)?;
            cmd_run(dry_run, config).await
        }
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    Ok(())
}

/// Load configuration from specified path or the default location
fn load_config(config_path: Option<std::path::PathBuf>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_config_path()?,
    };

    if !path.exists() {
        return Err(anyhow!(
            "No configuration found at {:?}.\n\
             Run: repovault init --primary <user> --secondary <user>",
            path
        ));
    }

    Config::load(&path)
}

/// Write a starter configuration file
fn cmd_init(
    config_path: Option<std::path::PathBuf>,
    primary: &str,
    secondary: &str,
    force: bool,
) -> Result<()> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_config_path()?,
    };

    if path.exists() && !force {
        return Err(anyhow!(
            "Configuration already exists at {:?} (use --force to overwrite)",
            path
        ));
    }

    let config = Config::template(primary, secondary);
    config.save(&path)?;

    println!("✅ Configuration written to {:?}", path);
    println!("   Primary account:   {}", primary);
    println!("   Secondary account: {}", secondary);
    println!();
    println!("Next, export the access tokens:");
    println!("   export REPOVAULT_PRIMARY_TOKEN=<token for {}>", primary);
    println!("   export REPOVAULT_SECONDARY_TOKEN=<token for {}>", secondary);
    println!("Then run: repovault run");

    Ok(())
}

/// List repositories owned by the primary account
async fn cmd_list(details: bool, config: &Config) -> Result<()> {
    let client = GitHubClient::new(&config.primary, config.mirror.page_size)?;

    let repositories = client.list_owned_repositories().await?;

    println!("Repositories ({}):", repositories.len());

    for repo in repositories {
        if details {
            println!("📁 {}", repo.name);
            if let Some(description) = &repo.description {
                println!("   📝 {}", description);
            }
            println!("   🔒 Private: {}", repo.private);
            if let Some(url) = &repo.clone_url {
                println!("   🔗 {}", url);
            }
            println!();
        } else {
            println!("  📁 {}", repo.name);
        }
    }

    Ok(())
}

/// Mirror primary repositories into the secondary account
async fn cmd_run(dry_run: bool, config: Config) -> Result<()> {
    info!("Starting repository backup...");

    let engine = MirrorEngine::new(config)?;

    if dry_run {
        println!("🔍 Dry run mode - no repositories will be created or pushed");

        let plan = engine.plan().await?;

        let mut to_mirror = 0;
        for entry in &plan {
            match entry.action {
                PlanAction::Mirror => {
                    to_mirror += 1;
                    println!("   📥 Would mirror: {}", entry.name);
                }
                PlanAction::Skip => {
                    println!("   ⏭️  Already present: {}", entry.name);
                }
                PlanAction::Exclude => {
                    println!("   🚫 Excluded: {}", entry.name);
                }
            }
        }

        println!();
        println!(
            "📈 {} of {} repositories would be mirrored",
            to_mirror,
            plan.len()
        );

        return Ok(());
    }

    let summary = engine.run().await?;

    println!();
    println!("🎉 Backup completed!");
    println!("   📊 Total repositories: {}", summary.total);
    println!("   ✅ Mirrored: {}", summary.mirrored);
    println!("   ⏭️  Skipped: {}", summary.skipped);
    println!("   ❌ Failed: {}", summary.failed);
    println!("   ⏱️  Duration: {:.2}s", summary.duration.as_secs_f64());

    if summary.failed > 0 {
        println!();
        println!("🔍 Failed repositories:");
        for outcome in &summary.outcomes {
            if let MirrorOutcome::Failed { name, error } = outcome {
                println!("   ❌ {}: {}", name, error);
            }
        }

        // Partial failure still completes the run, but the process reports it
        std::process::exit(1);
    }

    Ok(())
}
