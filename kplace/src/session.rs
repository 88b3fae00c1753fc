//! Session d'édition : une image, une région, des paramètres
//!
//! ```text
//! Idle ──attach──▶ ImageLoaded ──preview──▶ Previewing ⟲ ──apply──▶ Applied
//! ```
//!
//! Un nouvel attach repart de zéro depuis n'importe quel état. Un apply
//! hors de `Previewing` échoue sans rien produire.

use geo::Geometry;
use image::RgbaImage;
use tracing::{debug, info};

use region_label::{LabeledFeature, Level};

use crate::compositor::{decode_image, CanvasSize, Compositor, OverlayArtifact, TransformParams};
use crate::error::{CompositorError, SessionError};
use crate::projection::ProjectedGeometry;

/// État de la session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    ImageLoaded,
    Previewing,
    Applied,
}

/// Région ciblée par la session
#[derive(Debug, Clone)]
pub struct RegionTarget {
    pub name: String,
    pub code: String,
    pub level: Level,
    pub geometry: Geometry<f64>,
}

impl RegionTarget {
    /// Cible construite depuis une feature étiquetée, `None` sans géométrie
    pub fn from_feature(feature: &LabeledFeature) -> Option<Self> {
        Some(Self {
            name: feature.identity.name.clone(),
            code: feature.identity.code.clone(),
            level: feature.identity.level,
            geometry: feature.geometry.clone()?,
        })
    }
}

/// Session d'édition d'un overlay
#[derive(Debug)]
pub struct EditSession {
    compositor: Compositor,
    state: SessionState,
    region: Option<(RegionTarget, ProjectedGeometry)>,
    image: Option<RgbaImage>,
    params: TransformParams,
    preview: Option<RgbaImage>,
}

impl EditSession {
    pub fn new(compositor: Compositor) -> Self {
        Self {
            compositor,
            state: SessionState::Idle,
            region: None,
            image: None,
            params: TransformParams::default(),
            preview: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn params(&self) -> &TransformParams {
        &self.params
    }

    pub fn region(&self) -> Option<&RegionTarget> {
        self.region.as_ref().map(|(target, _)| target)
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    /// Dernier aperçu rendu
    pub fn last_preview(&self) -> Option<&RgbaImage> {
        self.preview.as_ref()
    }

    /// Taille d'aperçu de la région courante
    pub fn preview_size(&self) -> Option<CanvasSize> {
        self.region
            .as_ref()
            .map(|(_, projected)| self.compositor.preview_size(projected))
    }

    /// Associe une image décodée à une région ; paramètres remis à zéro
    ///
    /// Si la géométrie ne peut pas être projetée, la session revient à `Idle`.
    pub fn attach(&mut self, region: RegionTarget, image: RgbaImage) -> Result<(), SessionError> {
        self.reset();

        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(CompositorError::EmptyImage { width, height }.into());
        }
        let projected = self.compositor.project(&region.geometry)?;

        info!(
            region = %region.name,
            code = %region.code,
            level = %region.level,
            width,
            height,
            "Image attached"
        );

        self.region = Some((region, projected));
        self.image = Some(image);
        self.state = SessionState::ImageLoaded;
        Ok(())
    }

    /// Décode puis associe ; un échec de décodage laisse la session intacte
    pub fn attach_bytes(&mut self, region: RegionTarget, bytes: &[u8]) -> Result<(), SessionError> {
        let image = decode_image(bytes)?;
        self.attach(region, image)
    }

    /// Rend l'aperçu des paramètres courants
    pub fn preview(&mut self) -> Result<&RgbaImage, SessionError> {
        let (Some((_, projected)), Some(image)) = (&self.region, &self.image) else {
            return Err(SessionError::MissingData);
        };

        let rendered = self.compositor.preview(projected, image, &self.params);
        debug!(
            width = rendered.width(),
            height = rendered.height(),
            params = ?self.params,
            "Preview rendered"
        );

        self.state = SessionState::Previewing;
        Ok(self.preview.insert(rendered))
    }

    /// Change les paramètres et rend un nouvel aperçu
    pub fn set_params(&mut self, params: TransformParams) -> Result<&RgbaImage, SessionError> {
        if !params.is_valid() {
            return Err(SessionError::invalid_transform(format!("{params:?}")));
        }
        if self.image.is_none() || self.region.is_none() {
            return Err(SessionError::MissingData);
        }
        self.params = params;
        self.preview()
    }

    /// Cuit l'overlay haute résolution et vide la session
    pub fn apply(&mut self) -> Result<OverlayArtifact, SessionError> {
        let (Some((target, projected)), Some(image)) = (&self.region, &self.image) else {
            return Err(SessionError::MissingData);
        };
        if self.state != SessionState::Previewing {
            return Err(SessionError::NotPreviewed);
        }

        let artifact = self
            .compositor
            .apply(projected, image, &self.params, &target.name, target.level);

        info!(
            region = %target.name,
            source_id = %artifact.source_id,
            width = artifact.raster.width(),
            height = artifact.raster.height(),
            "Overlay applied"
        );

        self.region = None;
        self.image = None;
        self.preview = None;
        self.state = SessionState::Applied;
        Ok(artifact)
    }

    /// Abandonne l'édition en cours
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.region = None;
        self.image = None;
        self.preview = None;
        self.params = TransformParams::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;
    use image::Rgba;

    fn target(name: &str) -> RegionTarget {
        RegionTarget {
            name: name.to_string(),
            code: "11680".to_string(),
            level: Level::Municipality,
            geometry: Geometry::Polygon(polygon![
                (x: 127.0, y: 37.55),
                (x: 127.1, y: 37.52),
                (x: 127.08, y: 37.46),
                (x: 127.01, y: 37.47),
                (x: 127.0, y: 37.55),
            ]),
        }
    }

    fn image() -> RgbaImage {
        RgbaImage::from_pixel(16, 12, Rgba([200, 30, 30, 255]))
    }

    fn session() -> EditSession {
        EditSession::new(Compositor::default())
    }

    #[test]
    fn test_full_cycle() {
        let mut s = session();
        assert_eq!(s.state(), SessionState::Idle);

        s.attach(target("강남구"), image()).unwrap();
        assert_eq!(s.state(), SessionState::ImageLoaded);

        s.preview().unwrap();
        assert_eq!(s.state(), SessionState::Previewing);
        s.set_params(TransformParams::new(1.2, 15.0, 4.0, -3.0)).unwrap();
        assert_eq!(s.state(), SessionState::Previewing);

        let artifact = s.apply().unwrap();
        assert_eq!(s.state(), SessionState::Applied);
        assert_eq!(artifact.region_name, "강남구");
        assert_eq!(artifact.params.rotate_deg, 15.0);
        assert!(s.region().is_none());
    }

    #[test]
    fn test_apply_without_data_fails_closed() {
        let mut s = session();
        let err = s.apply().unwrap_err();
        assert!(matches!(err, SessionError::MissingData));
        assert_eq!(err.to_string(), "missing image/region data");
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[test]
    fn test_apply_requires_preview() {
        let mut s = session();
        s.attach(target("강남구"), image()).unwrap();
        assert!(matches!(s.apply(), Err(SessionError::NotPreviewed)));
        assert_eq!(s.state(), SessionState::ImageLoaded);
    }

    #[test]
    fn test_apply_twice_fails() {
        let mut s = session();
        s.attach(target("강남구"), image()).unwrap();
        s.preview().unwrap();
        s.apply().unwrap();
        assert!(matches!(s.apply(), Err(SessionError::MissingData)));
    }

    #[test]
    fn test_attach_resets_params() {
        let mut s = session();
        s.attach(target("강남구"), image()).unwrap();
        s.set_params(TransformParams::new(2.0, 90.0, 10.0, 10.0)).unwrap();

        s.attach(target("서초구"), image()).unwrap();
        assert_eq!(*s.params(), TransformParams::default());
        assert_eq!(s.state(), SessionState::ImageLoaded);
        assert!(s.last_preview().is_none());
        assert_eq!(s.region().map(|r| r.name.as_str()), Some("서초구"));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let mut s = session();
        s.attach(target("강남구"), image()).unwrap();
        assert!(matches!(
            s.set_params(TransformParams::new(0.0, 0.0, 0.0, 0.0)),
            Err(SessionError::InvalidTransform(_))
        ));
        assert!(matches!(
            s.set_params(TransformParams::new(1.0, f64::NAN, 0.0, 0.0)),
            Err(SessionError::InvalidTransform(_))
        ));
        assert_eq!(*s.params(), TransformParams::default());
    }

    #[test]
    fn test_decode_failure_keeps_session() {
        let mut s = session();
        s.attach(target("강남구"), image()).unwrap();
        s.preview().unwrap();

        assert!(matches!(
            s.attach_bytes(target("서초구"), b"not an image"),
            Err(SessionError::Compositor(CompositorError::ImageDecode(_)))
        ));
        assert_eq!(s.state(), SessionState::Previewing);
        assert_eq!(s.region().map(|r| r.name.as_str()), Some("강남구"));
    }

    #[test]
    fn test_unprojectable_region_returns_to_idle() {
        let mut s = session();
        s.attach(target("강남구"), image()).unwrap();

        let mut bad = target("점");
        bad.geometry = Geometry::Point(geo::Point::new(127.0, 37.5));
        assert!(s.attach(bad, image()).is_err());
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[test]
    fn test_preview_matches_preview_size() {
        let mut s = session();
        s.attach(target("강남구"), image()).unwrap();
        let size = s.preview_size().unwrap();
        let preview = s.preview().unwrap();
        assert_eq!(preview.dimensions(), (size.width, size.height));
        assert_eq!(size.width, 360);
    }
}
