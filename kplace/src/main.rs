//! Point d'entrée CLI pour kplace

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// Charger .env au démarrage
fn load_env() {
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::Commands;

/// Étiqueter les régions coréennes et y ajuster des images
#[derive(Parser)]
#[command(name = "kplace")]
#[command(author, version)]
#[command(about = "Étiqueter les régions administratives coréennes et y ajuster des images")]
#[command(long_about = "Résout noms et codes stables des régions d'un GeoJSON, ajuste une image sur une région (aperçu puis overlay haute résolution géoréférencé) et tient un tableau de likes.\n\nLes presets de configuration (default, sharp, fast) ou un fichier JSON se passent via --config ou KPLACE_CONFIG.")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env();

    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Label {
            path,
            level,
            output,
            report,
        } => {
            info!(path = %path.display(), level = %level, "Étiquetage");
            cli::cmd_label(&path, level, output.as_deref(), report.as_deref()).await?;
        }
        Commands::Preview { render, output } => {
            info!(region = %render.code, image = %render.image.display(), "Aperçu");
            cli::cmd_preview(&render, &output).await?;
        }
        Commands::Apply {
            render,
            output,
            zoom,
        } => {
            info!(region = %render.code, output = %output.display(), "Application de l'overlay");
            cli::cmd_apply(&render, &output, zoom).await?;
        }
        Commands::Like { key, store, config } => {
            cli::cmd_like(&key, store.as_deref(), config.as_deref())?;
        }
        Commands::Top {
            store,
            provinces,
            municipalities,
            limit,
            config,
        } => {
            cli::cmd_top(
                store.as_deref(),
                provinces.as_deref(),
                municipalities.as_deref(),
                limit,
                config.as_deref(),
            )
            .await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
