//! # region-label
//!
//! Noms canoniques et codes stables pour les régions administratives coréennes
//! (시/도, 시/군/구) à partir de propriétés GeoJSON hétérogènes.
//!
//! ## Features
//!
//! - Champs stricts par niveau, sans heuristique quand le jeu est bien formé
//! - Découpage des valeurs composites (`|`, `/`, `,`, blancs doubles, écritures mêlées)
//! - Score par table de règles ordonnée ([`scoring::RULES`])
//! - Codes stables, avec repli positionnel `idx_<n>`
//! - Lecture UTF-8 ou EUC-KR (CP949)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use region_label::{load, Level};
//! use std::path::Path;
//!
//! let collection = load(Path::new("skorea-municipalities-geo.json"), Level::Municipality)?;
//! for feature in &collection.features {
//!     println!("{} -> {}", feature.identity.code, feature.identity.name);
//! }
//! ```

pub mod collection;
pub mod error;
pub mod keys;
pub mod resolver;
pub mod scoring;
pub mod tokens;
pub mod types;

pub use collection::{load, FeatureId, LabeledCollection, LabeledFeature};
pub use error::LabelError;
pub use resolver::{placeholder_name, positional_code, resolve_code, Resolver};
pub use scoring::{Rule, Scorer};
pub use types::{CodeSource, FeatureRecord, Level, NameSource, ResolvedIdentity};

/// Résout l'identité d'un enregistrement avec la table de règles standard.
///
/// # Arguments
///
/// * `record` - Propriétés de la feature (vide si absentes)
/// * `level` - Niveau administratif déclaré
/// * `index` - Position de la feature dans sa collection (pour les substituts)
///
/// # Returns
///
/// Un `ResolvedIdentity` ; n'échoue jamais.
pub fn resolve(record: &FeatureRecord, level: Level, index: usize) -> ResolvedIdentity {
    Resolver::default().resolve(record, level, index)
}
