//! Décodage d'image et échantillonnage bilinéaire

use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::error::CompositorError;

/// Décode une image (PNG, JPEG, ...) en RGBA 8 bits
///
/// Une image sans pixel est refusée : elle ne peut pas couvrir une région.
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage, CompositorError> {
    let image = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(CompositorError::EmptyImage { width, height });
    }
    debug!(width, height, bytes = bytes.len(), "Decoded image");
    Ok(image)
}

/// Décode une image hors du runtime async
pub async fn decode_image_async(bytes: Vec<u8>) -> Result<RgbaImage, CompositorError> {
    tokio::task::spawn_blocking(move || decode_image(&bytes))
        .await
        .map_err(|e| CompositorError::DecodeTask(e.to_string()))?
}

/// Échantillonne `image` au point `(u, v)` exprimé en pixels image
/// (`(0, 0)` : coin haut-gauche du premier pixel)
///
/// Interpolation bilinéaire en alpha prémultiplié, bords étendus.
pub fn sample_bilinear(image: &RgbaImage, u: f64, v: f64) -> [u8; 4] {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return [0, 0, 0, 0];
    }
    let fx = (u - 0.5).clamp(0.0, (w - 1) as f64);
    let fy = (v - 0.5).clamp(0.0, (h - 1) as f64);

    let x0 = fx.floor() as u32;
    let y0 = fy.floor() as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let tx = fx - x0 as f64;
    let ty = fy - y0 as f64;

    let taps = [
        (image.get_pixel(x0, y0), (1.0 - tx) * (1.0 - ty)),
        (image.get_pixel(x1, y0), tx * (1.0 - ty)),
        (image.get_pixel(x0, y1), (1.0 - tx) * ty),
        (image.get_pixel(x1, y1), tx * ty),
    ];

    let mut alpha = 0.0;
    let mut premul = [0.0f64; 3];
    for (Rgba(px), weight) in taps {
        let a = px[3] as f64 * weight;
        alpha += a;
        for c in 0..3 {
            premul[c] += px[c] as f64 * a;
        }
    }

    if alpha <= 0.0 {
        return [0, 0, 0, 0];
    }
    [
        to_channel(premul[0] / alpha),
        to_channel(premul[1] / alpha),
        to_channel(premul[2] / alpha),
        to_channel(alpha),
    ]
}

fn to_channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
