//! Types d'erreurs pour le crate region-label

use thiserror::Error;

/// Erreurs pouvant survenir lors du chargement d'une collection de features
///
/// La résolution d'identité elle-même ne produit jamais d'erreur : un
/// enregistrement illisible reçoit un nom et un code de substitution.
#[derive(Debug, Error)]
pub enum LabelError {
    /// Erreur d'I/O lors de la lecture du fichier source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document GeoJSON invalide
    #[error("Invalid GeoJSON in {source_name}: {reason}")]
    InvalidGeoJson { source_name: String, reason: String },

    /// Le document n'est pas une FeatureCollection
    #[error("Expected a FeatureCollection, found {0}")]
    NotFeatureCollection(&'static str),

    /// Géométrie non convertible pour une feature
    #[error("Invalid geometry for feature #{index}: {reason}")]
    InvalidGeometry { index: usize, reason: String },

    /// Règle de score dont le motif ne compile pas
    #[error("Invalid scoring rule {rule}: {reason}")]
    InvalidRule { rule: &'static str, reason: String },
}

impl LabelError {
    /// Crée une erreur GeoJSON avec contexte
    pub fn invalid_geojson(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidGeoJson {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Crée une erreur de géométrie invalide
    pub fn invalid_geometry(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            index,
            reason: reason.into(),
        }
    }
}
