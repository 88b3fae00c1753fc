//! Web Mercator normalisé (carré unité)
//!
//! Même projection que EPSG:3857, mais ramenée sur `[0, 1] x [0, 1]` :
//! x croît vers l'est, y croît vers le sud, (0, 0) est le coin nord-ouest.
//! C'est l'espace des tuiles de la carte.

use std::f64::consts::PI;

/// Latitude limite de la projection, en degrés
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Longitude/latitude (degrés) vers Mercator normalisé
///
/// La latitude est bornée à ±[`MAX_LATITUDE`] pour éviter l'infini aux pôles.
pub fn project_point(lon: f64, lat: f64) -> (f64, f64) {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let sin = lat.to_radians().sin();

    let x = (lon + 180.0) / 360.0;
    let y = 0.5 - ((1.0 + sin) / (1.0 - sin)).ln() / (4.0 * PI);

    (x, y)
}

/// Mercator normalisé vers longitude/latitude (degrés)
pub fn unproject_point(x: f64, y: f64) -> (f64, f64) {
    let lon = x * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();

    (lon, lat)
}
