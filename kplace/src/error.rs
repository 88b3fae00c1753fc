//! Types d'erreurs du compositeur et de la session d'édition

use thiserror::Error;

/// Erreur de projection, de décodage ou de rendu
#[derive(Error, Debug)]
pub enum CompositorError {
    #[error("Image decode failed: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("Image decode task failed: {0}")]
    DecodeTask(String),

    #[error("Image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("Unsupported geometry type: {0}")]
    UnsupportedGeometry(&'static str),

    #[error("Geometry has no coordinates")]
    EmptyGeometry,

    #[error("Non-finite coordinate ({lon}, {lat})")]
    InvalidCoordinate { lon: f64, lat: f64 },
}

/// Erreur de transition de la session d'édition
#[derive(Error, Debug)]
pub enum SessionError {
    /// Image ou géométrie absente : rien n'est appliqué
    #[error("missing image/region data")]
    MissingData,

    #[error("apply requires a preview of the current parameters")]
    NotPreviewed,

    #[error("Invalid transform: {0}")]
    InvalidTransform(String),

    #[error(transparent)]
    Compositor(#[from] CompositorError),
}

impl SessionError {
    pub fn invalid_transform(reason: impl Into<String>) -> Self {
        Self::InvalidTransform(reason.into())
    }
}
