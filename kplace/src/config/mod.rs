//! Configuration du compositeur, de la carte et du tableau de likes

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

/// Configuration principale
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub compositor: CompositorConfig,
    pub map: MapConfig,
    pub likes: LikesConfig,
}

/// Paramètres de rendu
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CompositorConfig {
    /// Largeur de l'aperçu en pixels
    pub preview_width: u32,

    /// Facteur de la haute résolution par rapport à l'aperçu
    pub hires_multiplier: u32,

    /// Plus grand côté admis pour l'aperçu, la haute résolution en découle
    pub max_canvas_side: u32,

    /// Marge ajoutée à l'emprise projetée
    pub bbox_padding: f64,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            preview_width: 360,
            hires_multiplier: 3,
            max_canvas_side: 2048,
            bbox_padding: crate::projection::BBOX_PADDING,
        }
    }
}

/// Paramètres de la carte
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MapConfig {
    /// En dessous de ce zoom, seules les provinces sont visibles
    pub province_max_zoom: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            province_max_zoom: 8.0,
        }
    }
}

/// Paramètres du tableau de likes
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LikesConfig {
    /// Délai entre deux likes d'un même utilisateur
    pub cooldown_secs: u64,

    /// Taille des classements par niveau
    pub top_limit: usize,
}

impl Default for LikesConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 180,
            top_limit: 5,
        }
    }
}

impl LikesConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

impl Config {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: Self = serde_json::from_str(&content).context("Failed to parse config JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Charge une configuration depuis un preset embarqué
    pub fn from_preset(preset: &str) -> Result<Self> {
        match preset {
            "default" => Self::load_embedded(include_str!("presets/default.json")),
            "sharp" => Self::load_embedded(include_str!("presets/sharp.json")),
            "fast" => Self::load_embedded(include_str!("presets/fast.json")),
            _ => anyhow::bail!("Unknown preset: {}. Use: default, sharp, fast", preset),
        }
    }

    /// Preset par nom, sinon chemin vers un fichier JSON
    pub fn resolve(spec: &str) -> Result<Self> {
        match spec {
            "default" | "sharp" | "fast" => Self::from_preset(spec),
            _ => Self::load(Path::new(spec)),
        }
    }

    fn load_embedded(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("Failed to parse embedded config")?;
        config.validate()?;
        Ok(config)
    }

    /// Vérifie les bornes des paramètres
    pub fn validate(&self) -> Result<()> {
        let c = &self.compositor;
        if c.preview_width == 0 {
            anyhow::bail!("compositor.preview_width must be at least 1");
        }
        if c.hires_multiplier == 0 {
            anyhow::bail!("compositor.hires_multiplier must be at least 1");
        }
        if c.max_canvas_side == 0 {
            anyhow::bail!("compositor.max_canvas_side must be at least 1");
        }
        if !c.bbox_padding.is_finite() || c.bbox_padding < 0.0 {
            anyhow::bail!("compositor.bbox_padding must be a finite, non-negative number");
        }
        if !self.map.province_max_zoom.is_finite() {
            anyhow::bail!("map.province_max_zoom must be finite");
        }
        Ok(())
    }
}
