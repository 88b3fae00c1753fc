//! Région sélectionnée sur la carte
//!
//! Une seule feature porte le drapeau `selected` à la fois. Le détenteur de
//! la sélection vit hors du compositeur : il ne connaît que la carte, via
//! [`FeatureHighlighter`].

use std::collections::HashMap;

use anyhow::Result;
use tracing::{debug, warn};

use region_label::{FeatureId, LabeledFeature, Level, ResolvedIdentity};

use crate::overlay::source_name;

/// Carte capable de marquer une feature comme sélectionnée
pub trait FeatureHighlighter {
    fn set_selected(&mut self, source: &str, id: &FeatureId, selected: bool) -> Result<()>;
}

/// Sélection courante
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub source: &'static str,
    /// `None` si la feature n'a pas d'identifiant (pas de drapeau possible)
    pub id: Option<FeatureId>,
    pub level: Level,
    pub name: String,
    pub code: String,
    /// `"<niveau>:<code>"`
    pub key: String,
}

/// Détenteur de la sélection et du cache clé -> nom
#[derive(Debug, Default)]
pub struct SelectionState {
    current: Option<Selection>,
    names: HashMap<String, String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Part d'un cache déjà construit (voir `LabeledCollection::name_cache`)
    pub fn with_names(names: HashMap<String, String>) -> Self {
        Self {
            current: None,
            names,
        }
    }

    pub fn current(&self) -> Option<&Selection> {
        self.current.as_ref()
    }

    /// Nom affichable d'une clé, la clé elle-même à défaut
    pub fn display_name(&self, key: &str) -> String {
        self.names.get(key).cloned().unwrap_or_else(|| key.to_string())
    }

    /// Clic sur la carte : une feature sélectionne, le vide efface
    pub fn click(
        &mut self,
        highlighter: &mut dyn FeatureHighlighter,
        feature: Option<&LabeledFeature>,
    ) -> Option<&Selection> {
        match feature {
            Some(f) => Some(self.select(highlighter, f)),
            None => {
                self.clear(highlighter);
                None
            }
        }
    }

    /// Sélectionne une feature étiquetée
    pub fn select(
        &mut self,
        highlighter: &mut dyn FeatureHighlighter,
        feature: &LabeledFeature,
    ) -> &Selection {
        self.select_identity(highlighter, Some(feature.id.clone()), &feature.identity)
    }

    /// Sélectionne une identité, avec ou sans identifiant carte
    pub fn select_identity(
        &mut self,
        highlighter: &mut dyn FeatureHighlighter,
        id: Option<FeatureId>,
        identity: &ResolvedIdentity,
    ) -> &Selection {
        self.unflag(highlighter);

        let source = source_name(identity.level);
        match &id {
            Some(id) => {
                if let Err(e) = highlighter.set_selected(source, id, true) {
                    warn!(source, id = %id, error = %e, "Failed to flag selected feature");
                }
            }
            None => warn!(name = %identity.name, "Feature has no id, cannot flag it as selected"),
        }

        let key = identity.selection_key();
        self.names.insert(key.clone(), identity.name.clone());

        debug!(key = %key, name = %identity.name, "Region selected");

        self.current.insert(Selection {
            source,
            id,
            level: identity.level,
            name: identity.name.clone(),
            code: identity.code.clone(),
            key,
        })
    }

    /// Efface la sélection
    pub fn clear(&mut self, highlighter: &mut dyn FeatureHighlighter) {
        self.unflag(highlighter);
        self.current = None;
    }

    fn unflag(&mut self, highlighter: &mut dyn FeatureHighlighter) {
        if let Some(Selection {
            source,
            id: Some(id),
            ..
        }) = &self.current
        {
            if let Err(e) = highlighter.set_selected(source, id, false) {
                warn!(source, id = %id, error = %e, "Failed to clear selected flag");
            }
        }
    }
}
