//! Export GeoJSON d'une collection étiquetée (streaming, géométries via geozero)

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use geozero::geojson::GeoJsonWriter;
use geozero::GeozeroGeometry;

use region_label::{LabeledCollection, LabeledFeature};

/// Écrit la collection avec `__NAME` et `__CODE` dans les propriétés
pub fn export_labeled(collection: &LabeledCollection, output_path: &Path) -> Result<()> {
    let file = File::create(output_path)
        .context(format!("Failed to create file: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    write_collection(&mut writer, collection)?;
    writer.flush()?;

    Ok(())
}

/// Écrit une FeatureCollection complète
pub fn write_collection<W: Write>(writer: &mut W, collection: &LabeledCollection) -> Result<()> {
    write!(writer, r#"{{"type":"FeatureCollection","features":["#)?;
    for (i, feature) in collection.features.iter().enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        write_feature(writer, feature)?;
    }
    write!(writer, "]}}")?;
    Ok(())
}

/// Écrit une feature en GeoJSON
fn write_feature<W: Write>(writer: &mut W, feature: &LabeledFeature) -> Result<()> {
    write!(
        writer,
        r#"{{"type":"Feature","id":{},"#,
        serde_json::to_string(&feature.id)?
    )?;

    write!(writer, r#""geometry":"#)?;
    match &feature.geometry {
        Some(geometry) => {
            let mut geom_buf = Vec::new();
            let mut geom_writer = GeoJsonWriter::new(&mut geom_buf);
            geometry.process_geom(&mut geom_writer)?;
            writer.write_all(&geom_buf)?;
        }
        None => write!(writer, "null")?,
    }

    write!(
        writer,
        r#","properties":{}}}"#,
        serde_json::to_string(&feature.labeled_properties())?
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use region_label::collection::{label, parse};
    use region_label::Level;
    use serde_json::Value;

    const SAMPLE: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"SIG_CD":"11680","SIG_KOR_NM":"강남구","note":"a \"quoted\"\nvalue"},
         "geometry":{"type":"Polygon","coordinates":[[[127.0,37.5],[127.1,37.5],[127.1,37.4],[127.0,37.5]]]}},
        {"type":"Feature","id":"x-1","properties":{"name":"마포구"},"geometry":null}
    ]}"#;

    fn exported() -> Value {
        let collection = label(parse(SAMPLE, "sample").unwrap(), Level::Municipality).unwrap();
        let mut buffer = Vec::new();
        write_collection(&mut buffer, &collection).unwrap();
        serde_json::from_slice(&buffer).unwrap()
    }

    #[test]
    fn test_export_is_valid_geojson() {
        let json = exported();
        assert_eq!(json["type"], "FeatureCollection");
        assert_eq!(json["features"].as_array().unwrap().len(), 2);

        let first = &json["features"][0];
        assert_eq!(first["id"], 0);
        assert_eq!(first["geometry"]["type"], "Polygon");
        assert_eq!(first["properties"]["__NAME"], "강남구");
        assert_eq!(first["properties"]["__CODE"], "11680");
        assert_eq!(first["properties"]["note"], "a \"quoted\"\nvalue");
    }

    #[test]
    fn test_missing_geometry_and_text_id() {
        let json = exported();
        let second = &json["features"][1];
        assert_eq!(second["id"], "x-1");
        assert!(second["geometry"].is_null());
        assert_eq!(second["properties"]["__CODE"], "idx_1");
    }

    #[test]
    fn test_export_to_file() {
        let collection = label(parse(SAMPLE, "sample").unwrap(), Level::Municipality).unwrap();
        let output_path = std::env::temp_dir().join("kplace_labeled_export.geojson");

        export_labeled(&collection, &output_path).unwrap();

        let content = std::fs::read_to_string(&output_path).unwrap();
        assert!(content.contains(r#""type":"FeatureCollection""#));
        assert!(content.contains("__NAME"));

        std::fs::remove_file(output_path).ok();
    }
}
