//! Masque de découpage par balayage de lignes (règle pair-impair)
//!
//! Un pixel est couvert si son centre est à l'intérieur de la région. Les
//! intersections sont calculées une fois par ligne, ce qui rend le masque
//! indépendant de la résolution : le même centre relatif donne la même
//! décision en aperçu et en haute résolution.

use geo::Coord;

use super::CanvasSize;
use crate::projection::ProjectedGeometry;

/// Arêtes de la région en coordonnées canevas
#[derive(Debug, Clone)]
pub struct ClipMask {
    edges: Vec<(Coord<f64>, Coord<f64>)>,
    width: u32,
}

impl ClipMask {
    /// Prépare le masque pour un canevas couvrant l'emprise de la géométrie
    pub fn new(geometry: &ProjectedGeometry, size: CanvasSize) -> Self {
        let (w, h) = (size.width as f64, size.height as f64);
        let mut edges = Vec::new();

        for ring in geometry.rings() {
            let points: Vec<Coord<f64>> = ring.iter().map(|&p| geometry.to_canvas(p, w, h)).collect();
            if points.len() < 2 {
                continue;
            }
            // L'arête de fermeture est ajoutée même si l'anneau est déjà fermé :
            // une arête de longueur nulle ne coupe aucune ligne.
            for (i, &a) in points.iter().enumerate() {
                let b = points[(i + 1) % points.len()];
                if a.y != b.y {
                    edges.push((a, b));
                }
            }
        }

        Self {
            edges,
            width: size.width,
        }
    }

    /// Intervalles `[début, fin)` de colonnes couvertes sur la ligne `row`
    pub fn row_spans(&self, row: u32) -> Vec<(u32, u32)> {
        let y = row as f64 + 0.5;

        let mut crossings: Vec<f64> = self
            .edges
            .iter()
            .filter(|(a, b)| (a.y > y) != (b.y > y))
            .map(|(a, b)| a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y))
            .collect();
        crossings.sort_by(f64::total_cmp);

        let mut spans = Vec::with_capacity(crossings.len() / 2);
        for pair in crossings.chunks_exact(2) {
            let start = column_from(pair[0], self.width);
            let end = column_from(pair[1], self.width);
            if start < end {
                spans.push((start, end));
            }
        }
        spans
    }

    /// Vrai si le centre du pixel `(x, y)` est dans la région
    pub fn contains(&self, x: u32, y: u32) -> bool {
        self.row_spans(y).iter().any(|&(s, e)| x >= s && x < e)
    }
}

/// Première colonne dont le centre est à droite de `x`
fn column_from(x: f64, width: u32) -> u32 {
    let col = (x - 0.5).ceil();
    if col <= 0.0 {
        0
    } else if col >= width as f64 {
        width
    } else {
        col as u32
    }
}
