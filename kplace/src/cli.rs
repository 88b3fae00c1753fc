//! Définition et implémentation des commandes CLI
//!
//! - `label`: GeoJSON → noms/codes résolus (+ GeoJSON étiqueté, rapport)
//! - `preview`: aperçu PNG d'une image ajustée sur une région
//! - `apply`: overlay haute résolution géoréférencé dans un dossier
//! - `like` / `top`: tableau de likes

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tracing::{info, warn};

use kplace::compositor::{decode_image_async, Compositor, TransformParams};
use kplace::config::Config;
use kplace::export::export_labeled;
use kplace::ids::now_millis;
use kplace::likes::{format_count, format_remaining, JsonFileStore, LikeBoard, LikeOutcome};
use kplace::overlay::{ApplyOutcome, DirectorySurface, OverlayRegistry, VisibilityPolicy};
use kplace::report::LabelReport;
use kplace::selection::SelectionState;
use kplace::session::{EditSession, RegionTarget};
use region_label::{LabeledCollection, Level};

/// Fichier de likes par défaut (surchargé par `KPLACE_STORE`)
const DEFAULT_STORE: &str = "kplace-store.json";

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve canonical names and stable codes of a GeoJSON file
    Label {
        /// Path to a GeoJSON FeatureCollection
        #[arg(short, long)]
        path: PathBuf,

        /// Administrative level: province (prov) or municipality (mun)
        #[arg(short, long, default_value = "municipality")]
        level: Level,

        /// Write the labeled collection (with __NAME / __CODE) to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Save the JSON report to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Render the preview of an image fitted on a region
    Preview {
        #[command(flatten)]
        render: RenderArgs,

        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Bake the high-resolution overlay of a region into an overlay directory
    Apply {
        #[command(flatten)]
        render: RenderArgs,

        /// Overlay directory (PNG + JSON per overlay, overlays.json index)
        #[arg(short, long)]
        output: PathBuf,

        /// Map zoom used for layer visibility
        #[arg(long, default_value_t = 5.5)]
        zoom: f64,
    },

    /// Like a region (one like per user every few minutes)
    Like {
        /// Selection key, e.g. mun:11680 or prov:11
        #[arg(short, long)]
        key: String,

        /// Likes store (défaut : env KPLACE_STORE / kplace-store.json)
        #[arg(long)]
        store: Option<PathBuf>,

        /// Config preset name (default/sharp/fast) or path to a JSON config
        #[arg(long)]
        config: Option<String>,
    },

    /// Show the most liked regions per level
    Top {
        /// Likes store (défaut : env KPLACE_STORE / kplace-store.json)
        #[arg(long)]
        store: Option<PathBuf>,

        /// Province GeoJSON used to display names
        #[arg(long)]
        provinces: Option<PathBuf>,

        /// Municipality GeoJSON used to display names
        #[arg(long)]
        municipalities: Option<PathBuf>,

        /// Number of regions per level
        #[arg(long)]
        limit: Option<usize>,

        /// Config preset name (default/sharp/fast) or path to a JSON config
        #[arg(long)]
        config: Option<String>,
    },
}

/// Arguments communs à `preview` et `apply`
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// GeoJSON FeatureCollection containing the region
    #[arg(short, long)]
    pub regions: PathBuf,

    /// Administrative level of the collection
    #[arg(short, long, default_value = "municipality")]
    pub level: Level,

    /// Region code (__CODE), or name when no code matches
    #[arg(short, long)]
    pub code: String,

    /// Image to fit on the region
    #[arg(short, long)]
    pub image: PathBuf,

    /// Scale factor on top of the cover fit
    #[arg(long, default_value_t = 1.0)]
    pub scale: f64,

    /// Clockwise rotation in degrees
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub rotate: f64,

    /// Horizontal offset in preview pixels
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub offset_x: f64,

    /// Vertical offset in preview pixels
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub offset_y: f64,

    /// Config preset name (default/sharp/fast) or path to a JSON config
    /// (défaut : env KPLACE_CONFIG / default)
    #[arg(long)]
    pub config: Option<String>,
}

impl RenderArgs {
    fn params(&self) -> TransformParams {
        TransformParams::new(self.scale, self.rotate, self.offset_x, self.offset_y)
    }
}

/// Exécute la commande label
pub async fn cmd_label(
    path: &Path,
    level: Level,
    output: Option<&Path>,
    report_path: Option<&Path>,
) -> Result<()> {
    let start = Instant::now();
    let collection = load_collection(path, level).await?;

    let mut report = LabelReport::from_collection(&path.display().to_string(), &collection);
    report.set_duration(start.elapsed());

    if let Some(output) = output {
        export_labeled(&collection, output)?;
        info!(output = %output.display(), features = collection.features.len(), "Labeled GeoJSON written");
    }

    report.display();
    if let Some(report_path) = report_path {
        report.save_to_file(report_path)?;
        info!(report = %report_path.display(), "Report saved");
    }

    println!("{}", report.summary());
    Ok(())
}

/// Exécute la commande preview
pub async fn cmd_preview(args: &RenderArgs, output: &Path) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let mut session = open_session(args, &config).await?;

    let preview = session.set_params(args.params())?;
    preview
        .save(output)
        .context(format!("Failed to write preview: {}", output.display()))?;

    println!(
        "Preview {}x{} written to {}",
        preview.width(),
        preview.height(),
        output.display()
    );
    Ok(())
}

/// Exécute la commande apply
pub async fn cmd_apply(args: &RenderArgs, output: &Path, zoom: f64) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let mut session = open_session(args, &config).await?;

    session.set_params(args.params())?;
    let artifact = session.apply()?;
    let region_name = artifact.region_name.clone();
    let [tl, tr, br, bl] = artifact.corners;

    let mut surface = DirectorySurface::open(output)?;
    let mut registry = OverlayRegistry::new(
        VisibilityPolicy::new(config.map.province_max_zoom),
        zoom,
    );
    for (name, registration) in surface.registrations() {
        registry.restore(&name, registration);
    }

    let outcome = match registry.submit(&mut surface, artifact)? {
        ApplyOutcome::Deferred => registry
            .on_ready(&mut surface)?
            .pop()
            .context("Overlay directory is not available")?,
        registered => registered,
    };
    registry.set_zoom(&mut surface, zoom)?;

    if let ApplyOutcome::Registered {
        source_id,
        replaced,
        ..
    } = outcome
    {
        println!("{} applied as {}", region_name, source_id);
        if let Some(old) = replaced {
            println!("  replaced {}", old);
        }
        println!(
            "  corners: TL {:?} TR {:?} BR {:?} BL {:?}",
            tl, tr, br, bl
        );
    }
    Ok(())
}

/// Exécute la commande like
pub fn cmd_like(key: &str, store: Option<&Path>, config: Option<&str>) -> Result<()> {
    let config = load_config(config)?;
    let store = JsonFileStore::open(&store_path(store))?;
    let mut board = LikeBoard::open(store, config.likes.cooldown())?;

    match board.like(key, now_millis())? {
        LikeOutcome::Liked { key, count } => {
            println!("♥ {} ({})", format_count(count as i64), key);
        }
        LikeOutcome::CoolingDown { remaining } => {
            println!("Cooldown: {} remaining", format_remaining(remaining));
        }
    }
    Ok(())
}

/// Exécute la commande top
pub async fn cmd_top(
    store: Option<&Path>,
    provinces: Option<&Path>,
    municipalities: Option<&Path>,
    limit: Option<usize>,
    config: Option<&str>,
) -> Result<()> {
    let config = load_config(config)?;
    let board = LikeBoard::open(JsonFileStore::open(&store_path(store))?, config.likes.cooldown())?;
    let limit = limit.unwrap_or(config.likes.top_limit);

    let mut names = std::collections::HashMap::new();
    for (path, level) in [(provinces, Level::Province), (municipalities, Level::Municipality)] {
        if let Some(path) = path {
            names.extend(load_collection(path, level).await?.name_cache());
        }
    }
    let selection = SelectionState::with_names(names);

    for level in [Level::Province, Level::Municipality] {
        println!("\nTop {} ({})", limit, level);
        let top = board.top(level, limit);
        if top.is_empty() {
            println!("  -");
        }
        for (rank, (key, count)) in top.into_iter().enumerate() {
            println!(
                "  {}. {} ♥ {}",
                rank + 1,
                selection.display_name(key),
                format_count(count as i64)
            );
        }
    }
    Ok(())
}

/// Preset par nom, chemin de fichier, sinon `KPLACE_CONFIG`, sinon `default`
fn load_config(spec: Option<&str>) -> Result<Config> {
    let spec = spec
        .map(str::to_string)
        .or_else(|| std::env::var("KPLACE_CONFIG").ok())
        .unwrap_or_else(|| "default".to_string());
    Config::resolve(&spec)
}

fn store_path(store: Option<&Path>) -> PathBuf {
    store
        .map(Path::to_path_buf)
        .or_else(|| std::env::var("KPLACE_STORE").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE))
}

/// Charge et étiquette une collection hors du runtime async
async fn load_collection(path: &Path, level: Level) -> Result<LabeledCollection> {
    let collection = tokio::task::spawn_blocking({
        let path = path.to_path_buf();
        move || region_label::load(&path, level)
    })
    .await
    .context("Label task failed")?
    .context(format!("Failed to load {}", path.display()))?;

    for error in &collection.errors {
        warn!(path = %path.display(), error = %error, "Feature skipped");
    }
    Ok(collection)
}

/// Prépare une session : région trouvée, image décodée, aperçu prêt à rendre
async fn open_session(args: &RenderArgs, config: &Config) -> Result<EditSession> {
    let collection = load_collection(&args.regions, args.level).await?;
    let feature = collection
        .find_by_code(&args.code)
        .or_else(|| collection.find_by_name(&args.code))
        .context(format!(
            "No {} with code or name '{}' in {}",
            args.level,
            args.code,
            args.regions.display()
        ))?;
    let target = RegionTarget::from_feature(feature)
        .context(format!("Region '{}' has no usable geometry", feature.identity.name))?;

    let bytes = tokio::fs::read(&args.image)
        .await
        .context(format!("Failed to read image: {}", args.image.display()))?;
    let image = decode_image_async(bytes).await?;

    info!(
        region = %target.name,
        code = %target.code,
        image = %args.image.display(),
        "Region and image loaded"
    );

    let mut session = EditSession::new(Compositor::new(config.compositor.clone()));
    session.attach(target, image)?;
    Ok(session)
}
