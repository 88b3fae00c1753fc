//! Overlay produit par un apply : raster haute résolution géoréférencé

use std::io::Cursor;
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use image::{ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};

use region_label::Level;

use super::TransformParams;

/// Overlay autonome, ré-applicable tel quel à une carte
#[derive(Debug, Clone)]
pub struct OverlayArtifact {
    pub source_id: String,
    pub layer_id: String,
    pub region_name: String,
    pub level: Level,
    pub raster: RgbaImage,
    /// Coins `[lon, lat]` : haut-gauche, haut-droit, bas-droit, bas-gauche
    pub corners: [[f64; 2]; 4],
    pub params: TransformParams,
}

/// Description JSON d'un overlay, écrite à côté du PNG
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlaySidecar {
    pub source_id: String,
    pub layer_id: String,
    pub region_name: String,
    pub level: Level,
    pub width: u32,
    pub height: u32,
    pub corners: [[f64; 2]; 4],
    pub params: TransformParams,
    /// BLAKE3 des pixels RGBA
    pub fingerprint: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

impl OverlayArtifact {
    /// Empreinte BLAKE3 des pixels
    pub fn fingerprint(&self) -> String {
        hex::encode(blake3::hash(self.raster.as_raw()).as_bytes())
    }

    pub fn sidecar(&self, visible: bool) -> OverlaySidecar {
        OverlaySidecar {
            source_id: self.source_id.clone(),
            layer_id: self.layer_id.clone(),
            region_name: self.region_name.clone(),
            level: self.level,
            width: self.raster.width(),
            height: self.raster.height(),
            corners: self.corners,
            params: self.params,
            fingerprint: self.fingerprint(),
            visible,
        }
    }

    /// Raster encodé en PNG
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.raster
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .context("Failed to encode overlay PNG")?;
        Ok(bytes)
    }

    /// Écrit `<dir>/<source_id>.png` et `<dir>/<source_id>.json`
    pub fn write_to_dir(&self, dir: &Path, visible: bool) -> Result<()> {
        std::fs::create_dir_all(dir)
            .context(format!("Failed to create directory: {}", dir.display()))?;

        let png = overlay_path(dir, &self.source_id, "png")?;
        std::fs::write(&png, self.encode_png()?)
            .context(format!("Failed to write {}", png.display()))?;

        let json = overlay_path(dir, &self.source_id, "json")?;
        std::fs::write(&json, serde_json::to_string_pretty(&self.sidecar(visible))?)
            .context(format!("Failed to write {}", json.display()))?;

        Ok(())
    }
}

/// Chemin `<dir>/<source_id>.<extension>`
///
/// Erreur si l'identifiant n'est pas un simple nom de fichier : un overlay
/// n'est jamais écrit ni supprimé hors de son dossier.
pub fn overlay_path(dir: &Path, source_id: &str, extension: &str) -> Result<PathBuf> {
    let file_name = format!("{}.{}", source_id, extension);
    let mut components = Path::new(&file_name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !source_id.contains(['/', '\\']) => {
            Ok(dir.join(file_name))
        }
        _ => bail!("Overlay id is not a plain file name: {}", source_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn artifact() -> OverlayArtifact {
        OverlayArtifact {
            source_id: "municipality-강남구-abc-0".to_string(),
            layer_id: "municipality-강남구-abc-0-layer".to_string(),
            region_name: "강남구".to_string(),
            level: Level::Municipality,
            raster: RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255])),
            corners: [[127.0, 37.5], [127.1, 37.5], [127.1, 37.4], [127.0, 37.4]],
            params: TransformParams::default(),
        }
    }

    #[test]
    fn test_sidecar_fields() {
        let sidecar = artifact().sidecar(false);
        assert_eq!(sidecar.width, 3);
        assert_eq!(sidecar.height, 2);
        assert_eq!(sidecar.fingerprint.len(), 64);
        assert!(!sidecar.visible);

        let json = serde_json::to_value(&sidecar).unwrap();
        assert_eq!(json["level"], "municipality");
        assert_eq!(json["corners"][2][1], 37.4);
    }

    #[test]
    fn test_fingerprint_tracks_pixels() {
        let a = artifact();
        let mut b = artifact();
        b.raster.put_pixel(0, 0, Rgba([9, 9, 9, 255]));
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), artifact().fingerprint());
    }

    #[test]
    fn test_png_decodes_back() {
        let png = artifact().encode_png().unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded, artifact().raster);
    }

    #[test]
    fn test_write_to_dir() {
        let dir = std::env::temp_dir().join("kplace_artifact_test");
        let a = artifact();
        a.write_to_dir(&dir, true).unwrap();

        let json = std::fs::read_to_string(dir.join(format!("{}.json", a.source_id))).unwrap();
        let sidecar: OverlaySidecar = serde_json::from_str(&json).unwrap();
        assert_eq!(sidecar, a.sidecar(true));
        assert!(dir.join(format!("{}.png", a.source_id)).exists());

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_overlay_path_stays_in_dir() {
        let dir = Path::new("/tmp/overlays");
        assert_eq!(
            overlay_path(dir, "municipality-강남구-abc-0", "png").unwrap(),
            dir.join("municipality-강남구-abc-0.png")
        );
        assert!(overlay_path(dir, "../escaped", "png").is_err());
        assert!(overlay_path(dir, "a/b", "json").is_err());
        assert!(overlay_path(dir, r"a\b", "json").is_err());
        assert!(overlay_path(dir, "/abs", "png").is_err());
    }

    #[test]
    fn test_write_refuses_escaping_id() {
        let dir = std::env::temp_dir().join("kplace_artifact_escape");
        let mut a = artifact();
        a.source_id = "../kplace_artifact_escaped".to_string();

        assert!(a.write_to_dir(&dir, true).is_err());
        assert!(!std::env::temp_dir().join("kplace_artifact_escaped.png").exists());

        std::fs::remove_dir_all(dir).ok();
    }
}
