//! Rapport d'étiquetage d'une collection
//!
//! Résume d'où viennent les noms et les codes : champ strict, score,
//! substitut. Les codes positionnels (`idx_<n>`) sont signalés car ils
//! changent si le jeu de données est réordonné.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;

use region_label::{CodeSource, LabeledCollection, Level, NameSource};

/// Statut global de l'étiquetage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LabelStatus {
    /// Toutes les features ont un nom et un code issus des données
    Complete,
    /// Des substituts ou des codes positionnels ont été nécessaires
    Degraded,
    /// Aucune feature exploitable
    Empty,
}

/// Anomalie sur une feature
#[derive(Debug, Clone, Serialize)]
pub struct LabelWarning {
    /// Position dans la collection
    pub index: usize,
    pub name: String,
    pub code: String,
    pub message: String,
}

/// Rapport complet
#[derive(Debug, Clone, Serialize)]
pub struct LabelReport {
    /// Fichier source
    pub source: String,
    pub level: Level,
    pub duration_secs: f64,
    pub status: LabelStatus,

    pub features: usize,
    /// Noms pris tels quels dans un champ strict
    pub strict_names: usize,
    /// Noms choisis par score
    pub scored_names: usize,
    /// Noms substituts `이름미상_<n>`
    pub placeholder_names: usize,
    pub field_codes: usize,
    /// Codes `idx_<n>`, instables
    pub positional_codes: usize,
    /// Codes portés par plusieurs features
    pub duplicate_codes: Vec<String>,
    /// Géométries absentes ou non convertibles
    pub missing_geometries: usize,

    pub warnings: Vec<LabelWarning>,
    pub errors: Vec<String>,
}

impl LabelReport {
    /// Construit le rapport d'une collection étiquetée
    pub fn from_collection(source: &str, collection: &LabeledCollection) -> Self {
        let mut report = Self {
            source: source.to_string(),
            level: collection.level,
            duration_secs: 0.0,
            status: LabelStatus::Empty,
            features: 0,
            strict_names: 0,
            scored_names: 0,
            placeholder_names: 0,
            field_codes: 0,
            positional_codes: 0,
            duplicate_codes: Vec::new(),
            missing_geometries: 0,
            warnings: Vec::new(),
            errors: collection.errors.iter().map(|e| e.to_string()).collect(),
        };

        let mut seen: HashMap<&str, usize> = HashMap::new();
        for feature in &collection.features {
            let identity = &feature.identity;
            report.features += 1;

            match identity.name_source {
                NameSource::Strict => report.strict_names += 1,
                NameSource::Scored(_) => report.scored_names += 1,
                NameSource::Placeholder => {
                    report.placeholder_names += 1;
                    report.warn(feature.index, &identity.name, &identity.code, "No usable name, placeholder assigned");
                }
            }

            match identity.code_source {
                CodeSource::Field => report.field_codes += 1,
                CodeSource::Positional => {
                    report.positional_codes += 1;
                    report.warn(
                        feature.index,
                        &identity.name,
                        &identity.code,
                        "No code field, positional code is not stable across reorderings",
                    );
                }
            }

            if feature.geometry.is_none() {
                report.missing_geometries += 1;
            }

            *seen.entry(identity.code.as_str()).or_default() += 1;
        }

        let mut duplicates: Vec<String> = seen
            .into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|(code, _)| code.to_string())
            .collect();
        duplicates.sort();
        report.duplicate_codes = duplicates;

        report.finalize();
        report
    }

    fn warn(&mut self, index: usize, name: &str, code: &str, message: &str) {
        self.warnings.push(LabelWarning {
            index,
            name: name.to_string(),
            code: code.to_string(),
            message: message.to_string(),
        });
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Détermine le statut final
    pub fn finalize(&mut self) {
        self.status = if self.features == 0 {
            LabelStatus::Empty
        } else if self.placeholder_names > 0
            || self.positional_codes > 0
            || !self.duplicate_codes.is_empty()
            || !self.errors.is_empty()
        {
            LabelStatus::Degraded
        } else {
            LabelStatus::Complete
        };
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("LABEL REPORT - {} ({})", self.source, self.level);
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Duration: {:.2}s", self.duration_secs);

        println!("\n--- NAMES ---");
        println!(
            "{} features: {} strict, {} scored, {} placeholder",
            self.features, self.strict_names, self.scored_names, self.placeholder_names
        );
        println!("\n--- CODES ---");
        println!(
            "{} from fields, {} positional, {} duplicated",
            self.field_codes,
            self.positional_codes,
            self.duplicate_codes.len()
        );
        if !self.duplicate_codes.is_empty() {
            println!("  duplicated: {}", self.duplicate_codes.join(", "));
        }
        if self.missing_geometries > 0 {
            println!("  {} features without usable geometry", self.missing_geometries);
        }

        if !self.warnings.is_empty() {
            println!("\n--- WARNINGS ({}) ---", self.warnings.len());
            for w in self.warnings.iter().take(10) {
                println!("  [#{} {}] {}: {}", w.index, w.code, w.name, w.message);
            }
            if self.warnings.len() > 10 {
                println!("  ... and {} more", self.warnings.len() - 10);
            }
        }

        if !self.errors.is_empty() {
            println!("\n--- ERRORS ({}) ---", self.errors.len());
            for e in self.errors.iter().take(20) {
                println!("  {}", e);
            }
            if self.errors.len() > 20 {
                println!("  ... and {} more", self.errors.len() - 20);
            }
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        format!(
            "{} ({}): {} features, {} placeholder names, {} positional codes",
            self.source, self.level, self.features, self.placeholder_names, self.positional_codes
        )
    }
}
