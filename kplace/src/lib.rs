//! # kplace
//!
//! Ajuste une image sur une région administrative coréenne et la fige en
//! overlay raster géoréférencé.
//!
//! ## Features
//!
//! - Projection Web Mercator normalisée et boîte englobante d'une région
//! - Rendu unique pour l'aperçu et la haute résolution (clip pair-impair,
//!   couverture, rotation, décalage, échantillonnage bilinéaire)
//! - Session d'édition à états, qui refuse d'appliquer sans aperçu
//! - Registre d'overlays : un par région, visibilité selon le zoom
//! - Sélection de région et tableau de likes avec délai
//!
//! ## Usage CLI
//!
//! ```bash
//! # Noms et codes d'un GeoJSON
//! kplace label --path skorea-municipalities-geo.json --level mun --output labeled.json
//!
//! # Aperçu puis overlay
//! kplace preview --regions mun.json --code 11680 --image photo.jpg --rotate 15 --output preview.png
//! kplace apply --regions mun.json --code 11680 --image photo.jpg --rotate 15 --output ./overlays/
//! ```

pub mod compositor;
pub mod config;
pub mod error;
pub mod export;
pub mod ids;
pub mod likes;
pub mod overlay;
pub mod projection;
pub mod report;
pub mod selection;
pub mod session;

pub use compositor::{render, CanvasSize, Compositor, OverlayArtifact, TransformParams};
pub use config::Config;
pub use error::{CompositorError, SessionError};
pub use overlay::{ApplyOutcome, MapSurface, OverlayRegistry};
pub use projection::{project, project_point, unproject_point, BBox, ProjectedGeometry};
pub use report::{LabelReport, LabelStatus};
pub use session::{EditSession, RegionTarget, SessionState};
