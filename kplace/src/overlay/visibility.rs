//! Visibilité des couches selon le zoom

use region_label::Level;

/// Source vectorielle d'un niveau
pub fn source_name(level: Level) -> &'static str {
    match level {
        Level::Province => "provinces",
        Level::Municipality => "municipalities",
    }
}

/// Couches vectorielles de base (remplissage et contour) d'un niveau
pub fn base_layers(level: Level) -> [String; 2] {
    let source = source_name(level);
    [format!("{}-fill", source), format!("{}-outline", source)]
}

/// Niveau d'un identifiant de couche d'overlay (`province-…-layer`)
pub fn overlay_level(layer_id: &str) -> Option<Level> {
    if !layer_id.ends_with("-layer") {
        return None;
    }
    [Level::Province, Level::Municipality]
        .into_iter()
        .find(|level| layer_id.starts_with(&format!("{}-", level.layer_prefix())))
}

/// Règle de visibilité : provinces en dessous d'un zoom seuil,
/// municipalités au-delà
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityPolicy {
    pub province_max_zoom: f64,
}

impl Default for VisibilityPolicy {
    fn default() -> Self {
        Self {
            province_max_zoom: 8.0,
        }
    }
}

impl VisibilityPolicy {
    pub fn new(province_max_zoom: f64) -> Self {
        Self { province_max_zoom }
    }

    /// Niveau affiché à ce zoom
    pub fn visible_level(&self, zoom: f64) -> Level {
        if zoom < self.province_max_zoom {
            Level::Province
        } else {
            Level::Municipality
        }
    }

    pub fn is_visible(&self, level: Level, zoom: f64) -> bool {
        self.visible_level(zoom) == level
    }

    /// Visibilité de chaque couche de base à ce zoom
    pub fn base_layer_states(&self, zoom: f64) -> Vec<(String, bool)> {
        [Level::Province, Level::Municipality]
            .into_iter()
            .flat_map(|level| {
                let visible = self.is_visible(level, zoom);
                base_layers(level).into_iter().map(move |id| (id, visible))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold() {
        let policy = VisibilityPolicy::default();
        assert_eq!(policy.visible_level(5.5), Level::Province);
        assert_eq!(policy.visible_level(7.99), Level::Province);
        assert_eq!(policy.visible_level(8.0), Level::Municipality);
        assert_eq!(policy.visible_level(12.0), Level::Municipality);
    }

    #[test]
    fn test_base_layer_states() {
        let states = VisibilityPolicy::default().base_layer_states(9.0);
        assert_eq!(
            states,
            vec![
                ("provinces-fill".to_string(), false),
                ("provinces-outline".to_string(), false),
                ("municipalities-fill".to_string(), true),
                ("municipalities-outline".to_string(), true),
            ]
        );
    }

    #[test]
    fn test_overlay_level_from_layer_id() {
        assert_eq!(overlay_level("province-서울특별시-abc-0-layer"), Some(Level::Province));
        assert_eq!(overlay_level("municipality-강남구-abc-1-layer"), Some(Level::Municipality));
        assert_eq!(overlay_level("municipality-강남구-abc-1"), None);
        assert_eq!(overlay_level("provinces-fill"), None);
    }
}
