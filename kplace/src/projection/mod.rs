//! Projection des géométries de région et emprise en Mercator normalisé
//!
//! Une région (Polygon ou MultiPolygon en longitude/latitude) devient une
//! liste d'anneaux projetés et une emprise légèrement élargie. Les anneaux
//! intérieurs sont conservés : le découpage pair-impair les traite comme
//! des trous.

pub mod mercator;

use geo::{Coord, Geometry, LineString, Polygon};
use serde::Serialize;

use crate::error::CompositorError;

pub use mercator::{project_point, unproject_point, MAX_LATITUDE};

/// Marge ajoutée de chaque côté de l'emprise
pub const BBOX_PADDING: f64 = 1e-6;

/// Étendue minimale d'une emprise, pour ne jamais diviser par zéro
pub const MIN_EXTENT: f64 = 1e-12;

/// Emprise en Mercator normalisé
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Largeur, jamais inférieure à [`MIN_EXTENT`]
    pub fn width(&self) -> f64 {
        (self.max_x - self.min_x).max(MIN_EXTENT)
    }

    /// Hauteur, jamais inférieure à [`MIN_EXTENT`]
    pub fn height(&self) -> f64 {
        (self.max_y - self.min_y).max(MIN_EXTENT)
    }

    /// Rapport hauteur / largeur
    pub fn aspect_ratio(&self) -> f64 {
        self.height() / self.width()
    }

    pub fn padded(&self, padding: f64) -> Self {
        Self::new(
            self.min_x - padding,
            self.min_y - padding,
            self.max_x + padding,
            self.max_y + padding,
        )
    }

    /// Coins en longitude/latitude, dans l'ordre haut-gauche, haut-droit,
    /// bas-droit, bas-gauche
    pub fn corners(&self) -> [[f64; 2]; 4] {
        [
            (self.min_x, self.min_y),
            (self.max_x, self.min_y),
            (self.max_x, self.max_y),
            (self.min_x, self.max_y),
        ]
        .map(|(x, y)| {
            let (lon, lat) = unproject_point(x, y);
            [lon, lat]
        })
    }
}

/// Géométrie de région projetée
#[derive(Debug, Clone)]
pub struct ProjectedGeometry {
    rings: Vec<Vec<Coord<f64>>>,
    bbox: BBox,
}

impl ProjectedGeometry {
    /// Anneaux projetés (extérieurs et intérieurs, sans distinction)
    pub fn rings(&self) -> &[Vec<Coord<f64>>] {
        &self.rings
    }

    pub fn bbox(&self) -> &BBox {
        &self.bbox
    }

    /// Position d'un point projeté dans un canevas de `width x height` pixels
    /// couvrant exactement l'emprise
    pub fn to_canvas(&self, point: Coord<f64>, width: f64, height: f64) -> Coord<f64> {
        Coord {
            x: (point.x - self.bbox.min_x) / self.bbox.width() * width,
            y: (point.y - self.bbox.min_y) / self.bbox.height() * height,
        }
    }
}

/// Projette une géométrie de région avec la marge par défaut
pub fn project(geometry: &Geometry<f64>) -> Result<ProjectedGeometry, CompositorError> {
    project_with_padding(geometry, BBOX_PADDING)
}

/// Projette une géométrie de région
///
/// Seuls les types surfaciques sont acceptés (`Polygon`, `MultiPolygon`,
/// `Rect`, `Triangle`). Les anneaux vides sont ignorés ; une géométrie sans
/// aucune coordonnée est une erreur.
pub fn project_with_padding(
    geometry: &Geometry<f64>,
    padding: f64,
) -> Result<ProjectedGeometry, CompositorError> {
    let polygons: Vec<Polygon<f64>> = match geometry {
        Geometry::Polygon(p) => vec![p.clone()],
        Geometry::MultiPolygon(mp) => mp.0.clone(),
        Geometry::Rect(r) => vec![r.to_polygon()],
        Geometry::Triangle(t) => vec![t.to_polygon()],
        Geometry::Point(_) => return Err(CompositorError::UnsupportedGeometry("Point")),
        Geometry::Line(_) => return Err(CompositorError::UnsupportedGeometry("Line")),
        Geometry::LineString(_) => return Err(CompositorError::UnsupportedGeometry("LineString")),
        Geometry::MultiPoint(_) => return Err(CompositorError::UnsupportedGeometry("MultiPoint")),
        Geometry::MultiLineString(_) => {
            return Err(CompositorError::UnsupportedGeometry("MultiLineString"))
        }
        Geometry::GeometryCollection(_) => {
            return Err(CompositorError::UnsupportedGeometry("GeometryCollection"))
        }
    };

    let mut rings = Vec::new();
    for polygon in &polygons {
        for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
            let projected = project_ring(ring)?;
            if !projected.is_empty() {
                rings.push(projected);
            }
        }
    }

    let mut points = rings.iter().flatten();
    let first = points.next().ok_or(CompositorError::EmptyGeometry)?;
    let mut bbox = BBox::new(first.x, first.y, first.x, first.y);
    for p in points {
        bbox.min_x = bbox.min_x.min(p.x);
        bbox.min_y = bbox.min_y.min(p.y);
        bbox.max_x = bbox.max_x.max(p.x);
        bbox.max_y = bbox.max_y.max(p.y);
    }

    Ok(ProjectedGeometry {
        rings,
        bbox: bbox.padded(padding),
    })
}

fn project_ring(ring: &LineString<f64>) -> Result<Vec<Coord<f64>>, CompositorError> {
    ring.0
        .iter()
        .map(|c| {
            if !c.x.is_finite() || !c.y.is_finite() {
                return Err(CompositorError::InvalidCoordinate { lon: c.x, lat: c.y });
            }
            let (x, y) = project_point(c.x, c.y);
            Ok(Coord { x, y })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon, Point};

    fn square() -> Geometry<f64> {
        Geometry::Polygon(polygon![
            (x: 127.0, y: 37.5),
            (x: 127.1, y: 37.5),
            (x: 127.1, y: 37.4),
            (x: 127.0, y: 37.4),
            (x: 127.0, y: 37.5),
        ])
    }

    #[test]
    fn test_bbox_is_padded() {
        let projected = project(&square()).unwrap();
        let bbox = projected.bbox();
        let (x0, y0) = project_point(127.0, 37.5);
        let (x1, y1) = project_point(127.1, 37.4);

        assert!((bbox.min_x - (x0 - BBOX_PADDING)).abs() < 1e-15);
        assert!((bbox.min_y - (y0 - BBOX_PADDING)).abs() < 1e-15);
        assert!((bbox.max_x - (x1 + BBOX_PADDING)).abs() < 1e-15);
        assert!((bbox.max_y - (y1 + BBOX_PADDING)).abs() < 1e-15);
    }

    #[test]
    fn test_multipolygon_keeps_every_ring() {
        let holed = polygon!(
            exterior: [
                (x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0), (x: 0.0, y: 4.0), (x: 0.0, y: 0.0),
            ],
            interiors: [
                [(x: 1.0, y: 1.0), (x: 2.0, y: 1.0), (x: 2.0, y: 2.0), (x: 1.0, y: 1.0)],
            ],
        );
        let geometry = Geometry::MultiPolygon(MultiPolygon(vec![holed, polygon![
            (x: 10.0, y: 10.0), (x: 11.0, y: 10.0), (x: 11.0, y: 11.0), (x: 10.0, y: 10.0),
        ]]));

        let projected = project(&geometry).unwrap();
        assert_eq!(projected.rings().len(), 3);
    }

    #[test]
    fn test_degenerate_extent_is_floored() {
        let bbox = BBox::new(0.3, 0.3, 0.3, 0.3);
        assert_eq!(bbox.width(), MIN_EXTENT);
        assert_eq!(bbox.height(), MIN_EXTENT);
        assert!(bbox.aspect_ratio().is_finite());
    }

    #[test]
    fn test_rejects_non_areal_geometry() {
        let point = Geometry::Point(Point::new(127.0, 37.5));
        assert!(matches!(
            project(&point),
            Err(CompositorError::UnsupportedGeometry("Point"))
        ));
    }

    #[test]
    fn test_rejects_empty_polygon() {
        let empty = Geometry::Polygon(Polygon::new(LineString::new(vec![]), vec![]));
        assert!(matches!(project(&empty), Err(CompositorError::EmptyGeometry)));
    }

    #[test]
    fn test_rejects_non_finite() {
        let bad = Geometry::Polygon(polygon![
            (x: f64::NAN, y: 37.5),
            (x: 127.1, y: 37.5),
            (x: 127.1, y: 37.4),
        ]);
        assert!(matches!(
            project(&bad),
            Err(CompositorError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn test_corners_unproject_bbox() {
        let projected = project_with_padding(&square(), 0.0).unwrap();
        let [tl, tr, br, bl] = projected.bbox().corners();

        assert!((tl[0] - 127.0).abs() < 1e-9 && (tl[1] - 37.5).abs() < 1e-9);
        assert!((tr[0] - 127.1).abs() < 1e-9 && (tr[1] - 37.5).abs() < 1e-9);
        assert!((br[0] - 127.1).abs() < 1e-9 && (br[1] - 37.4).abs() < 1e-9);
        assert!((bl[0] - 127.0).abs() < 1e-9 && (bl[1] - 37.4).abs() < 1e-9);
    }

    #[test]
    fn test_to_canvas_maps_bbox_to_canvas() {
        let projected = project_with_padding(&square(), 0.0).unwrap();
        let bbox = *projected.bbox();
        let tl = projected.to_canvas(Coord { x: bbox.min_x, y: bbox.min_y }, 360.0, 200.0);
        let br = projected.to_canvas(Coord { x: bbox.max_x, y: bbox.max_y }, 360.0, 200.0);
        assert!(tl.x.abs() < 1e-9 && tl.y.abs() < 1e-9);
        assert!((br.x - 360.0).abs() < 1e-9 && (br.y - 200.0).abs() < 1e-9);
    }
}
