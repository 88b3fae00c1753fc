//! Chargement et étiquetage d'une FeatureCollection GeoJSON
//!
//! Chaque feature est résolue une seule fois, au chargement. Les features
//! sans identifiant reçoivent leur index, pour que l'état `selected` côté
//! carte puisse les cibler.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use geojson::GeoJson;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::resolver::Resolver;
use crate::types::{FeatureRecord, Level, ResolvedIdentity};
use crate::LabelError;

/// Propriété ajoutée portant le nom résolu
pub const NAME_PROPERTY: &str = "__NAME";

/// Propriété ajoutée portant le code résolu
pub const CODE_PROPERTY: &str = "__CODE";

/// Identifiant de feature côté carte
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum FeatureId {
    Number(u64),
    Text(String),
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<geojson::feature::Id> for FeatureId {
    fn from(id: geojson::feature::Id) -> Self {
        match id {
            geojson::feature::Id::String(s) => Self::Text(s),
            geojson::feature::Id::Number(n) => match n.as_u64() {
                Some(v) => Self::Number(v),
                None => Self::Text(n.to_string()),
            },
        }
    }
}

/// Une feature étiquetée
#[derive(Debug, Clone)]
pub struct LabeledFeature {
    /// Position dans la collection source
    pub index: usize,

    /// Identifiant (celui du document, sinon l'index)
    pub id: FeatureId,

    /// Identité résolue
    pub identity: ResolvedIdentity,

    /// Géométrie en longitude/latitude, si convertible
    pub geometry: Option<geo::Geometry>,

    /// Propriétés telles que reçues
    pub properties: FeatureRecord,
}

impl LabeledFeature {
    /// Propriétés d'origine enrichies de `__NAME` et `__CODE`
    pub fn labeled_properties(&self) -> Map<String, Value> {
        let mut props = self.properties.fields().clone();
        props.insert(
            NAME_PROPERTY.to_string(),
            Value::String(self.identity.name.clone()),
        );
        props.insert(
            CODE_PROPERTY.to_string(),
            Value::String(self.identity.code.clone()),
        );
        props
    }
}

/// Collection étiquetée pour un niveau
#[derive(Debug)]
pub struct LabeledCollection {
    pub level: Level,

    pub features: Vec<LabeledFeature>,

    /// Erreurs non fatales rencontrées (géométries non convertibles)
    pub errors: Vec<LabelError>,
}

impl LabeledCollection {
    /// Cache `"<niveau>:<code>" -> nom`
    pub fn name_cache(&self) -> HashMap<String, String> {
        self.features
            .iter()
            .map(|f| (f.identity.selection_key(), f.identity.name.clone()))
            .collect()
    }

    /// Première feature portant ce code
    pub fn find_by_code(&self, code: &str) -> Option<&LabeledFeature> {
        self.features.iter().find(|f| f.identity.code == code)
    }

    /// Première feature portant ce nom
    pub fn find_by_name(&self, name: &str) -> Option<&LabeledFeature> {
        self.features.iter().find(|f| f.identity.name == name)
    }

    /// Feature par identifiant carte
    pub fn get(&self, id: &FeatureId) -> Option<&LabeledFeature> {
        self.features.iter().find(|f| &f.id == id)
    }
}

/// Charge et étiquette un fichier GeoJSON
pub fn load(path: &Path, level: Level) -> Result<LabeledCollection, LabelError> {
    let bytes = std::fs::read(path)?;
    let text = decode_text(&bytes);
    let geojson = parse(&text, &path.display().to_string())?;
    label(geojson, level)
}

/// Décode le contenu d'un fichier : UTF-8, sinon EUC-KR (CP949)
///
/// Beaucoup d'exports coréens hérités de shapefiles sont encore en CP949.
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    match simdutf8::basic::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text.strip_prefix('\u{feff}').unwrap_or(text)),
        Err(_) => {
            let (decoded, _, had_errors) = encoding_rs::EUC_KR.decode(bytes);
            if had_errors {
                warn!("Input is neither valid UTF-8 nor EUC-KR, some characters were replaced");
            } else {
                debug!("Input decoded as EUC-KR");
            }
            decoded
        }
    }
}

/// Parse un document GeoJSON
pub fn parse(text: &str, source_name: &str) -> Result<GeoJson, LabelError> {
    text.parse::<GeoJson>()
        .map_err(|e| LabelError::invalid_geojson(source_name, e.to_string()))
}

/// Étiquette toutes les features d'une FeatureCollection
pub fn label(geojson: GeoJson, level: Level) -> Result<LabeledCollection, LabelError> {
    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        GeoJson::Feature(_) => return Err(LabelError::NotFeatureCollection("Feature")),
        GeoJson::Geometry(_) => return Err(LabelError::NotFeatureCollection("Geometry")),
    };

    let resolver = Resolver::default();
    let mut features = Vec::with_capacity(collection.features.len());
    let mut errors = Vec::new();

    for (index, feature) in collection.features.into_iter().enumerate() {
        let properties = FeatureRecord::new(feature.properties.unwrap_or_default());
        let identity = resolver.resolve(&properties, level, index);

        let geometry = match feature.geometry {
            Some(geometry) => match geo::Geometry::<f64>::try_from(geometry) {
                Ok(g) => Some(g),
                Err(e) => {
                    warn!(index, name = %identity.name, error = %e, "Unconvertible geometry");
                    errors.push(LabelError::invalid_geometry(index, e.to_string()));
                    None
                }
            },
            None => None,
        };

        let id = feature
            .id
            .map(FeatureId::from)
            .unwrap_or(FeatureId::Number(index as u64));

        features.push(LabeledFeature {
            index,
            id,
            identity,
            geometry,
            properties,
        });
    }

    debug!(level = %level, count = features.len(), errors = errors.len(), "Labeled collection");

    Ok(LabeledCollection {
        level,
        features,
        errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CodeSource;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"SIG_CD": "11680", "SIG_KOR_NM": "강남구", "SIG_ENG_NM": "Gangnam-gu"},
                "geometry": {"type": "Polygon", "coordinates": [[[127.0,37.5],[127.1,37.5],[127.1,37.45],[127.0,37.5]]]}
            },
            {
                "type": "Feature",
                "id": 42,
                "properties": {"name": "마포구 | Mapo-gu"},
                "geometry": null
            },
            {
                "type": "Feature",
                "properties": null,
                "geometry": {"type": "Point", "coordinates": [127.0, 37.5]}
            }
        ]
    }"#;

    fn sample() -> LabeledCollection {
        label(parse(SAMPLE, "sample").unwrap(), Level::Municipality).unwrap()
    }

    #[test]
    fn test_label_collection() {
        let collection = sample();
        assert_eq!(collection.features.len(), 3);

        let first = &collection.features[0];
        assert_eq!(first.identity.name, "강남구");
        assert_eq!(first.identity.code, "11680");
        assert_eq!(first.id, FeatureId::Number(0));
        assert!(matches!(first.geometry, Some(geo::Geometry::Polygon(_))));

        let second = &collection.features[1];
        assert_eq!(second.identity.name, "마포구");
        assert_eq!(second.identity.code, "idx_1");
        assert_eq!(second.identity.code_source, CodeSource::Positional);
        assert_eq!(second.id, FeatureId::Number(42));
        assert!(second.geometry.is_none());

        let third = &collection.features[2];
        assert_eq!(third.identity.name, "이름미상_3");
        assert_eq!(third.identity.code, "idx_2");
    }

    #[test]
    fn test_name_cache_and_lookup() {
        let collection = sample();
        let cache = collection.name_cache();
        assert_eq!(cache.get("mun:11680").map(String::as_str), Some("강남구"));
        assert_eq!(cache.get("mun:idx_1").map(String::as_str), Some("마포구"));
        assert!(collection.find_by_code("11680").is_some());
        assert!(collection.find_by_name("마포구").is_some());
        assert!(collection.get(&FeatureId::Number(42)).is_some());
    }

    #[test]
    fn test_labeled_properties() {
        let collection = sample();
        let props = collection.features[0].labeled_properties();
        assert_eq!(props.get(NAME_PROPERTY), Some(&Value::String("강남구".into())));
        assert_eq!(props.get(CODE_PROPERTY), Some(&Value::String("11680".into())));
        assert_eq!(props.get("SIG_ENG_NM"), Some(&Value::String("Gangnam-gu".into())));
    }

    #[test]
    fn test_not_a_feature_collection() {
        let geojson = parse(r#"{"type":"Point","coordinates":[0,0]}"#, "pt").unwrap();
        assert!(matches!(
            label(geojson, Level::Province),
            Err(LabelError::NotFeatureCollection("Geometry"))
        ));
    }

    #[test]
    fn test_invalid_geojson() {
        assert!(matches!(
            parse("{not json", "broken"),
            Err(LabelError::InvalidGeoJson { .. })
        ));
    }

    #[test]
    fn test_decode_euc_kr() {
        let (bytes, _, _) = encoding_rs::EUC_KR.encode("강남구");
        assert_eq!(decode_text(&bytes), "강남구");
        assert_eq!(decode_text("\u{feff}서울".as_bytes()), "서울");
    }
}
