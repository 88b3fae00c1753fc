//! Enregistrement des overlays auprès de la carte
//!
//! La carte est un collaborateur externe vu à travers [`MapSurface`]. Le
//! registre garantit au plus une couche d'overlay par nom de région : un
//! nouvel apply ajoute d'abord la nouvelle couche puis retire l'ancienne.

pub mod directory;
pub mod visibility;

use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use region_label::Level;

use crate::compositor::OverlayArtifact;

pub use directory::DirectorySurface;
pub use visibility::{base_layers, overlay_level, source_name, VisibilityPolicy};

/// Surface de carte capable d'afficher des rasters positionnés
pub trait MapSurface {
    /// Vrai quand la carte accepte de nouvelles sources
    fn is_ready(&self) -> bool;

    fn add_overlay(&mut self, artifact: &OverlayArtifact, visible: bool) -> Result<()>;

    fn remove_overlay(&mut self, source_id: &str, layer_id: &str) -> Result<()>;

    fn set_visibility(&mut self, layer_id: &str, visible: bool) -> Result<()>;
}

/// Overlay enregistré pour une région
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub source_id: String,
    pub layer_id: String,
    pub level: Level,
    pub fingerprint: String,
}

/// Résultat d'une soumission
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    Registered {
        source_id: String,
        layer_id: String,
        /// Source retirée au profit de la nouvelle
        replaced: Option<String>,
    },
    /// Carte pas prête : l'overlay sera enregistré par [`OverlayRegistry::on_ready`]
    Deferred,
}

/// Registre des overlays par nom de région
#[derive(Debug)]
pub struct OverlayRegistry {
    policy: VisibilityPolicy,
    zoom: f64,
    entries: BTreeMap<String, Registration>,
    /// Overlays en attente de la carte, un par région
    pending: BTreeMap<String, OverlayArtifact>,
}

impl OverlayRegistry {
    pub fn new(policy: VisibilityPolicy, zoom: f64) -> Self {
        Self {
            policy,
            zoom,
            entries: BTreeMap::new(),
            pending: BTreeMap::new(),
        }
    }

    pub fn get(&self, region_name: &str) -> Option<&Registration> {
        self.entries.get(region_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &Registration)> {
        self.entries.iter()
    }

    /// Overlay en attente de la carte pour une région
    pub fn pending(&self, region_name: &str) -> Option<&OverlayArtifact> {
        self.pending.get(region_name)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Reprend un enregistrement existant (registre rechargé)
    pub fn restore(&mut self, region_name: &str, registration: Registration) {
        self.entries.insert(region_name.to_string(), registration);
    }

    /// Soumet un overlay ; différé si la carte n'est pas prête
    ///
    /// Un overlay différé ne remplace que l'attente de sa propre région.
    pub fn submit(
        &mut self,
        surface: &mut dyn MapSurface,
        artifact: OverlayArtifact,
    ) -> Result<ApplyOutcome> {
        if !surface.is_ready() {
            let region = artifact.region_name.clone();
            if let Some(previous) = self.pending.insert(region.clone(), artifact) {
                debug!(region = %region, source_id = %previous.source_id, "Pending overlay superseded");
            }
            info!(region = %region, pending = self.pending.len(), "Map not ready, overlay deferred");
            return Ok(ApplyOutcome::Deferred);
        }
        self.register(surface, &artifact)
    }

    /// Signal de disponibilité de la carte : enregistre tous les overlays en attente
    ///
    /// Si la carte n'est toujours pas prête, rien ne bouge. Un overlay dont
    /// l'ajout échoue reste en attente du signal suivant.
    pub fn on_ready(&mut self, surface: &mut dyn MapSurface) -> Result<Vec<ApplyOutcome>> {
        if self.pending.is_empty() {
            return Ok(Vec::new());
        }
        if !surface.is_ready() {
            warn!(
                pending = self.pending.len(),
                "Ready signal received but map still not ready, keeping pending overlays"
            );
            return Ok(Vec::new());
        }

        let mut outcomes = Vec::with_capacity(self.pending.len());
        for (region, artifact) in std::mem::take(&mut self.pending) {
            match self.register(surface, &artifact) {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    warn!(region = %region, error = %e, "Deferred overlay failed, kept pending");
                    self.pending.insert(region, artifact);
                }
            }
        }
        Ok(outcomes)
    }

    /// Met à jour le zoom et la visibilité de toutes les couches
    pub fn set_zoom(&mut self, surface: &mut dyn MapSurface, zoom: f64) -> Result<()> {
        self.zoom = zoom;

        for (layer_id, visible) in self.policy.base_layer_states(zoom) {
            surface.set_visibility(&layer_id, visible)?;
        }
        for registration in self.entries.values() {
            let visible = self.policy.is_visible(registration.level, zoom);
            if let Err(e) = surface.set_visibility(&registration.layer_id, visible) {
                warn!(layer_id = %registration.layer_id, error = %e, "Failed to update overlay visibility");
            }
        }
        Ok(())
    }

    fn register(
        &mut self,
        surface: &mut dyn MapSurface,
        artifact: &OverlayArtifact,
    ) -> Result<ApplyOutcome> {
        let visible = self.policy.is_visible(artifact.level, self.zoom);

        // Un échec ici laisse l'overlay précédent en place
        surface.add_overlay(artifact, visible)?;

        let registration = Registration {
            source_id: artifact.source_id.clone(),
            layer_id: artifact.layer_id.clone(),
            level: artifact.level,
            fingerprint: artifact.fingerprint(),
        };
        let previous = self
            .entries
            .insert(artifact.region_name.clone(), registration);

        let replaced = match previous {
            // Même source réécrite en place : rien à retirer
            Some(old) if old.source_id == artifact.source_id => None,
            Some(old) => {
                if let Err(e) = surface.remove_overlay(&old.source_id, &old.layer_id) {
                    warn!(source_id = %old.source_id, error = %e, "Failed to remove replaced overlay");
                }
                Some(old.source_id)
            }
            None => None,
        };

        info!(
            region = %artifact.region_name,
            source_id = %artifact.source_id,
            visible,
            replaced = ?replaced,
            "Overlay registered"
        );

        Ok(ApplyOutcome::Registered {
            source_id: artifact.source_id.clone(),
            layer_id: artifact.layer_id.clone(),
            replaced,
        })
    }
}
