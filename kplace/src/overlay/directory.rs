//! Surface de carte sur disque : un PNG et un JSON par overlay, plus un index
//!
//! Sert à la CLI : un apply dans un dossier existant remplace l'overlay de
//! la même région, comme le ferait la carte interactive.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{MapSurface, Registration};
use crate::compositor::{overlay_path, OverlayArtifact, OverlaySidecar};

/// Nom du fichier d'index
pub const INDEX_FILE: &str = "overlays.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct Index {
    /// Visibilité des couches de base
    #[serde(default)]
    layers: BTreeMap<String, bool>,

    /// Overlays par identifiant de source
    #[serde(default)]
    overlays: BTreeMap<String, OverlaySidecar>,
}

/// Dossier d'overlays
#[derive(Debug)]
pub struct DirectorySurface {
    dir: PathBuf,
    index: Index,
}

impl DirectorySurface {
    /// Ouvre (ou crée) un dossier d'overlays
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .context(format!("Failed to create overlay directory: {}", dir.display()))?;

        let path = dir.join(INDEX_FILE);
        let index = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)
                .context(format!("Failed to parse overlay index: {}", path.display()))?,
            Err(e) if e.kind() == ErrorKind::NotFound => Index::default(),
            Err(e) => {
                return Err(e).context(format!("Failed to read overlay index: {}", path.display()))
            }
        };

        Ok(Self {
            dir: dir.to_path_buf(),
            index,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn overlays(&self) -> impl Iterator<Item = &OverlaySidecar> {
        self.index.overlays.values()
    }

    pub fn layer_visibility(&self, layer_id: &str) -> Option<bool> {
        self.index.layers.get(layer_id).copied().or_else(|| {
            self.overlays()
                .find(|o| o.layer_id == layer_id)
                .map(|o| o.visible)
        })
    }

    /// Enregistrements par nom de région, pour recharger un registre
    pub fn registrations(&self) -> Vec<(String, Registration)> {
        self.overlays()
            .map(|o| {
                (
                    o.region_name.clone(),
                    Registration {
                        source_id: o.source_id.clone(),
                        layer_id: o.layer_id.clone(),
                        level: o.level,
                        fingerprint: o.fingerprint.clone(),
                    },
                )
            })
            .collect()
    }

    fn save_index(&self) -> Result<()> {
        let path = self.dir.join(INDEX_FILE);
        let json = serde_json::to_string_pretty(&self.index)?;
        std::fs::write(&path, json).context(format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context(format!("Failed to remove {}", path.display())),
        }
    }
}

impl MapSurface for DirectorySurface {
    fn is_ready(&self) -> bool {
        self.dir.is_dir()
    }

    fn add_overlay(&mut self, artifact: &OverlayArtifact, visible: bool) -> Result<()> {
        artifact.write_to_dir(&self.dir, visible)?;
        self.index
            .overlays
            .insert(artifact.source_id.clone(), artifact.sidecar(visible));
        self.save_index()?;
        debug!(source_id = %artifact.source_id, dir = %self.dir.display(), "Overlay written");
        Ok(())
    }

    fn remove_overlay(&mut self, source_id: &str, _layer_id: &str) -> Result<()> {
        self.remove_file(&overlay_path(&self.dir, source_id, "png")?)?;
        self.remove_file(&overlay_path(&self.dir, source_id, "json")?)?;
        self.index.overlays.remove(source_id);
        self.save_index()
    }

    fn set_visibility(&mut self, layer_id: &str, visible: bool) -> Result<()> {
        let overlay = self
            .index
            .overlays
            .values_mut()
            .find(|o| o.layer_id == layer_id);
        match overlay {
            Some(sidecar) => {
                sidecar.visible = visible;
                let path = overlay_path(&self.dir, &sidecar.source_id, "json")?;
                std::fs::write(&path, serde_json::to_string_pretty(sidecar)?)
                    .context(format!("Failed to write {}", path.display()))?;
            }
            None => {
                self.index.layers.insert(layer_id.to_string(), visible);
            }
        }
        self.save_index()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::tests::artifact;
    use crate::overlay::{OverlayRegistry, VisibilityPolicy};
    use region_label::Level;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        std::fs::remove_dir_all(&dir).ok();
        dir
    }

    #[test]
    fn test_add_and_remove() {
        let dir = temp_dir("kplace_surface_add_remove");
        let mut surface = DirectorySurface::open(&dir).unwrap();
        assert!(surface.is_ready());

        let a = artifact("강남구", "municipality-a", Level::Municipality);
        surface.add_overlay(&a, false).unwrap();
        assert!(dir.join("municipality-a.png").exists());
        assert_eq!(surface.layer_visibility("municipality-a-layer"), Some(false));

        surface.remove_overlay("municipality-a", "municipality-a-layer").unwrap();
        assert!(!dir.join("municipality-a.png").exists());
        assert_eq!(surface.overlays().count(), 0);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_index_survives_reopen() {
        let dir = temp_dir("kplace_surface_reopen");
        {
            let mut surface = DirectorySurface::open(&dir).unwrap();
            surface
                .add_overlay(&artifact("서울특별시", "province-a", Level::Province), true)
                .unwrap();
            surface.set_visibility("provinces-fill", true).unwrap();
        }

        let surface = DirectorySurface::open(&dir).unwrap();
        let registrations = surface.registrations();
        assert_eq!(registrations.len(), 1);
        assert_eq!(registrations[0].0, "서울특별시");
        assert_eq!(registrations[0].1.source_id, "province-a");
        assert_eq!(surface.layer_visibility("provinces-fill"), Some(true));

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_registry_replaces_across_sessions() {
        let dir = temp_dir("kplace_surface_replace");
        {
            let mut surface = DirectorySurface::open(&dir).unwrap();
            let mut registry = OverlayRegistry::new(VisibilityPolicy::default(), 5.5);
            registry
                .submit(&mut surface, artifact("강남구", "municipality-a", Level::Municipality))
                .unwrap();
        }

        let mut surface = DirectorySurface::open(&dir).unwrap();
        let mut registry = OverlayRegistry::new(VisibilityPolicy::default(), 5.5);
        for (name, registration) in surface.registrations() {
            registry.restore(&name, registration);
        }
        registry
            .submit(&mut surface, artifact("강남구", "municipality-b", Level::Municipality))
            .unwrap();

        let ids: Vec<_> = surface.overlays().map(|o| o.source_id.as_str()).collect();
        assert_eq!(ids, vec!["municipality-b"]);
        assert!(!dir.join("municipality-a.png").exists());

        std::fs::remove_dir_all(dir).ok();
    }
}
