//! Composition d'une image sur une région
//!
//! Un seul chemin de rendu sert l'aperçu et la haute résolution : la taille
//! cible et la taille de référence (celle de l'aperçu, dans laquelle les
//! décalages sont exprimés) sont des paramètres. À paramètres égaux, un
//! point relatif du canevas donne le même pixel image aux deux résolutions.

pub mod artifact;
pub mod clip;
pub mod raster;

use geo::Geometry;
use image::RgbaImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use region_label::Level;

use crate::config::CompositorConfig;
use crate::error::CompositorError;
use crate::ids::{safe_name, IdGenerator};
use crate::projection::{project_with_padding, BBox, ProjectedGeometry};

pub use artifact::{overlay_path, OverlayArtifact, OverlaySidecar};
pub use clip::ClipMask;
pub use raster::{decode_image, decode_image_async, sample_bilinear};

/// Échelle minimale effective
pub const MIN_SCALE: f64 = 0.001;

/// Transformation de l'image dans le canevas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformParams {
    /// Facteur multiplié par l'échelle de couverture
    pub scale: f64,
    /// Rotation horaire, en degrés
    pub rotate_deg: f64,
    /// Décalage horizontal en pixels d'aperçu
    pub offset_x: f64,
    /// Décalage vertical en pixels d'aperçu
    pub offset_y: f64,
}

impl Default for TransformParams {
    fn default() -> Self {
        Self {
            scale: 1.0,
            rotate_deg: 0.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

impl TransformParams {
    pub fn new(scale: f64, rotate_deg: f64, offset_x: f64, offset_y: f64) -> Self {
        Self {
            scale,
            rotate_deg,
            offset_x,
            offset_y,
        }
    }

    pub fn effective_scale(&self) -> f64 {
        self.scale.max(MIN_SCALE)
    }

    /// Tous les champs finis et une échelle strictement positive
    pub fn is_valid(&self) -> bool {
        self.scale.is_finite()
            && self.scale > 0.0
            && self.rotate_deg.is_finite()
            && self.offset_x.is_finite()
            && self.offset_y.is_finite()
    }
}

/// Taille d'un canevas en pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    /// Taille bornée à 1x1 au minimum
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Aperçu de largeur fixe, hauteur suivant le rapport de l'emprise
    ///
    /// Le plus grand côté ne dépasse jamais `max_side` : une emprise très
    /// étirée réduit les deux côtés en gardant son rapport.
    pub fn preview(bbox: &BBox, preview_width: u32, max_side: u32) -> Self {
        let max_side = max_side.max(1) as f64;
        let aspect = match bbox.aspect_ratio() {
            a if a.is_nan() || a < 0.0 => 0.0,
            a => a,
        };

        let width = (preview_width as f64).min(max_side);
        let (width, height) = if aspect * width > max_side {
            (max_side / aspect, max_side)
        } else {
            (width, aspect * width)
        };
        Self::new(width.round() as u32, height.round() as u32)
    }

    pub fn scaled(self, factor: u32) -> Self {
        Self::new(
            self.width.saturating_mul(factor),
            self.height.saturating_mul(factor),
        )
    }
}

/// Placement inverse : d'un pixel canevas vers un point image
#[derive(Debug, Clone, Copy)]
struct Placement {
    origin_x: f64,
    origin_y: f64,
    cos: f64,
    sin: f64,
    inv_scale: f64,
    half_w: f64,
    half_h: f64,
    image_w: f64,
    image_h: f64,
}

impl Placement {
    fn new(target: CanvasSize, reference: CanvasSize, image: (u32, u32), params: &TransformParams) -> Self {
        let (w, h) = (target.width as f64, target.height as f64);
        let (ref_w, ref_h) = (reference.width as f64, reference.height as f64);
        let (iw, ih) = (image.0 as f64, image.1 as f64);

        let cover = (w / iw).max(h / ih);
        let scale = params.effective_scale() * cover;
        let theta = params.rotate_deg.to_radians();

        Self {
            origin_x: w / 2.0 + params.offset_x * w / ref_w,
            origin_y: h / 2.0 + params.offset_y * h / ref_h,
            cos: theta.cos(),
            sin: theta.sin(),
            inv_scale: 1.0 / scale,
            half_w: iw / 2.0,
            half_h: ih / 2.0,
            image_w: iw,
            image_h: ih,
        }
    }

    /// Point image sous le point canevas `(x, y)`, `None` hors de l'image
    fn source_of(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let dx = x - self.origin_x;
        let dy = y - self.origin_y;
        // Rotation inverse (sens antihoraire dans un repère y vers le bas)
        let u = (dx * self.cos + dy * self.sin) * self.inv_scale + self.half_w;
        let v = (-dx * self.sin + dy * self.cos) * self.inv_scale + self.half_h;

        if u >= 0.0 && u < self.image_w && v >= 0.0 && v < self.image_h {
            Some((u, v))
        } else {
            None
        }
    }
}

/// Rend l'image transformée, découpée à la région, dans un canevas transparent
///
/// # Arguments
///
/// * `target` - Taille du canevas produit
/// * `reference` - Taille dans laquelle `params.offset_*` sont exprimés
/// * `geometry` - Région projetée ; le canevas couvre exactement son emprise
/// * `image` - Image source
/// * `params` - Échelle, rotation et décalage
pub fn render(
    target: CanvasSize,
    reference: CanvasSize,
    geometry: &ProjectedGeometry,
    image: &RgbaImage,
    params: &TransformParams,
) -> RgbaImage {
    let mut canvas = RgbaImage::new(target.width, target.height);
    let (iw, ih) = image.dimensions();
    if iw == 0 || ih == 0 {
        return canvas;
    }

    let mask = ClipMask::new(geometry, target);
    let placement = Placement::new(target, reference, (iw, ih), params);
    let stride = target.width as usize * 4;

    canvas
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(row, pixels)| {
            let y = row as f64 + 0.5;
            for (start, end) in mask.row_spans(row as u32) {
                for col in start..end {
                    let x = col as f64 + 0.5;
                    if let Some((u, v)) = placement.source_of(x, y) {
                        let offset = col as usize * 4;
                        pixels[offset..offset + 4].copy_from_slice(&sample_bilinear(image, u, v));
                    }
                }
            }
        });

    canvas
}

/// Compositeur configuré : tailles d'aperçu et de haute résolution,
/// générateur d'identifiants d'overlay
#[derive(Debug, Default)]
pub struct Compositor {
    config: CompositorConfig,
    ids: IdGenerator,
}

impl Compositor {
    pub fn new(config: CompositorConfig) -> Self {
        Self {
            config,
            ids: IdGenerator::new(),
        }
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    /// Projette une région avec la marge configurée
    pub fn project(&self, geometry: &Geometry<f64>) -> Result<ProjectedGeometry, CompositorError> {
        project_with_padding(geometry, self.config.bbox_padding)
    }

    pub fn preview_size(&self, geometry: &ProjectedGeometry) -> CanvasSize {
        CanvasSize::preview(
            geometry.bbox(),
            self.config.preview_width,
            self.config.max_canvas_side,
        )
    }

    pub fn hires_size(&self, geometry: &ProjectedGeometry) -> CanvasSize {
        self.preview_size(geometry).scaled(self.config.hires_multiplier)
    }

    /// Rendu d'aperçu
    pub fn preview(
        &self,
        geometry: &ProjectedGeometry,
        image: &RgbaImage,
        params: &TransformParams,
    ) -> RgbaImage {
        let size = self.preview_size(geometry);
        render(size, size, geometry, image, params)
    }

    /// Rendu haute résolution et géoréférencement de l'overlay
    pub fn apply(
        &self,
        geometry: &ProjectedGeometry,
        image: &RgbaImage,
        params: &TransformParams,
        region_name: &str,
        level: Level,
    ) -> OverlayArtifact {
        let reference = self.preview_size(geometry);
        let target = reference.scaled(self.config.hires_multiplier);
        let raster = render(target, reference, geometry, image, params);

        let source_id = self
            .ids
            .next(&format!("{}-{}", level.layer_prefix(), safe_name(region_name)));
        let layer_id = format!("{}-layer", source_id);

        debug!(
            source_id = %source_id,
            width = target.width,
            height = target.height,
            "Baked overlay"
        );

        OverlayArtifact {
            source_id,
            layer_id,
            region_name: region_name.to_string(),
            level,
            raster,
            corners: geometry.bbox().corners(),
            params: *params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::project;
    use geo::{polygon, Geometry};
    use image::Rgba;

    fn region() -> ProjectedGeometry {
        project(&Geometry::Polygon(polygon![
            (x: 126.0, y: 37.0),
            (x: 128.0, y: 37.0),
            (x: 128.0, y: 35.0),
            (x: 126.0, y: 35.0),
            (x: 126.0, y: 37.0),
        ]))
        .unwrap()
    }

    fn solid(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([10, 20, 30, 255]))
    }

    #[test]
    fn test_preview_size_square_bbox() {
        let bbox = BBox::new(0.40, 0.30, 0.42, 0.32);
        assert_eq!(CanvasSize::preview(&bbox, 360, 2048), CanvasSize::new(360, 360));
    }

    #[test]
    fn test_preview_size_never_zero() {
        let flat = BBox::new(0.0, 0.5, 1.0, 0.5);
        assert_eq!(CanvasSize::preview(&flat, 360, 2048).height, 1);
        assert_eq!(CanvasSize::new(0, 0), CanvasSize::new(1, 1));
    }

    #[test]
    fn test_sliver_bbox_is_bounded() {
        // Emprise 1000 fois plus haute que large
        let sliver = BBox::new(0.0, 0.0, 0.001, 1.0);
        let size = CanvasSize::preview(&sliver, 360, 2048);
        assert_eq!(size, CanvasSize::new(2, 2048));

        let vertical = BBox::new(0.5, 0.0, 0.5, 1.0);
        assert_eq!(CanvasSize::preview(&vertical, 360, 2048), CanvasSize::new(1, 2048));

        let tall = BBox::new(0.0, 0.0, 1.0, 4.0);
        assert_eq!(CanvasSize::preview(&tall, 360, 1000), CanvasSize::new(250, 1000));
        assert_eq!(CanvasSize::preview(&tall, 360, 1), CanvasSize::new(1, 1));
    }

    #[test]
    fn test_compositor_bounds_sliver_region() {
        let config = CompositorConfig {
            max_canvas_side: 512,
            ..CompositorConfig::default()
        };
        let compositor = Compositor::new(config);
        let sliver = Geometry::Polygon(polygon![
            (x: 127.0, y: 33.0),
            (x: 127.0001, y: 33.0),
            (x: 127.0001, y: 38.0),
            (x: 127.0, y: 38.0),
            (x: 127.0, y: 33.0),
        ]);
        let geometry = compositor.project(&sliver).unwrap();

        let preview = compositor.preview_size(&geometry);
        assert_eq!(preview.height, 512);
        assert!(preview.width >= 1 && preview.width < 360);
        assert_eq!(compositor.hires_size(&geometry).height, 512 * 3);

        let rendered = compositor.preview(&geometry, &solid(16, 16), &TransformParams::default());
        assert_eq!(rendered.dimensions(), (preview.width, preview.height));
    }

    #[test]
    fn test_hires_is_multiple_of_preview() {
        let compositor = Compositor::default();
        let geometry = region();
        let preview = compositor.preview_size(&geometry);
        let hires = compositor.hires_size(&geometry);
        assert_eq!(hires.width, preview.width * 3);
        assert_eq!(hires.height, preview.height * 3);
    }

    #[test]
    fn test_identity_transform_covers_region() {
        let geometry = region();
        let out = Compositor::default().preview(&geometry, &solid(50, 10), &TransformParams::default());
        // Rectangle de région = emprise : tout est opaque
        assert!(out.pixels().all(|p| p[3] == 255));
    }

    #[test]
    fn test_small_scale_leaves_transparent_margin() {
        let geometry = region();
        let params = TransformParams::new(0.5, 0.0, 0.0, 0.0);
        let out = Compositor::default().preview(&geometry, &solid(10, 10), &params);
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        let (w, h) = out.dimensions();
        assert_eq!(out.get_pixel(w / 2, h / 2)[3], 255);
    }

    #[test]
    fn test_scale_is_floored() {
        let params = TransformParams::new(-5.0, 0.0, 0.0, 0.0);
        assert_eq!(params.effective_scale(), MIN_SCALE);
        assert!(!params.is_valid());
        assert!(TransformParams::default().is_valid());
    }

    #[test]
    fn test_offset_moves_image() {
        let geometry = region();
        let size = Compositor::default().preview_size(&geometry);
        let params = TransformParams::new(0.5, 0.0, size.width as f64 / 4.0, 0.0);
        let out = Compositor::default().preview(&geometry, &solid(10, 10), &params);
        let mid = size.height / 2;
        // Image réduite poussée vers la droite : le bord gauche reste vide
        assert_eq!(out.get_pixel(size.width / 8, mid)[3], 0);
        assert_eq!(out.get_pixel(size.width * 5 / 8, mid)[3], 255);
    }

    #[test]
    fn test_apply_builds_artifact() {
        let geometry = region();
        let compositor = Compositor::default();
        let artifact = compositor.apply(
            &geometry,
            &solid(8, 8),
            &TransformParams::default(),
            "서울 특별시",
            Level::Province,
        );

        assert!(artifact.source_id.starts_with("province-서울_특별시-"));
        assert_eq!(artifact.layer_id, format!("{}-layer", artifact.source_id));
        assert_eq!(artifact.raster.dimensions().0, compositor.preview_size(&geometry).width * 3);
        assert_eq!(artifact.corners, geometry.bbox().corners());
    }

    #[test]
    fn test_apply_twice_yields_fresh_ids() {
        let geometry = region();
        let compositor = Compositor::default();
        let a = compositor.apply(&geometry, &solid(4, 4), &TransformParams::default(), "강남구", Level::Municipality);
        let b = compositor.apply(&geometry, &solid(4, 4), &TransformParams::default(), "강남구", Level::Municipality);
        assert_ne!(a.source_id, b.source_id);
        assert!(a.source_id.starts_with("municipality-강남구-"));
    }
}
