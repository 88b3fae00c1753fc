//! Résolution d'identité : nom canonique et code stable

use tracing::trace;

use crate::keys;
use crate::scoring::Scorer;
use crate::tokens::candidates_of;
use crate::types::{CodeSource, FeatureRecord, Level, NameSource, ResolvedIdentity};

/// Préfixe du nom synthétisé quand aucun candidat ne survit ("nom inconnu")
pub const PLACEHOLDER_NAME_PREFIX: &str = "이름미상_";

/// Préfixe du code positionnel
pub const POSITIONAL_CODE_PREFIX: &str = "idx_";

/// Nom de substitution (index 1-based)
pub fn placeholder_name(index: usize) -> String {
    format!("{}{}", PLACEHOLDER_NAME_PREFIX, index + 1)
}

/// Code positionnel (index 0-based)
///
/// Ce code dépend de l'ordre de la collection : il n'est pas stable si le
/// jeu de données est réordonné ou rechargé.
pub fn positional_code(index: usize) -> String {
    format!("{}{}", POSITIONAL_CODE_PREFIX, index)
}

/// Résolveur d'identité paramétré par une table de score
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    scorer: &'a Scorer,
}

impl Default for Resolver<'static> {
    fn default() -> Self {
        Self::new(Scorer::standard())
    }
}

impl<'a> Resolver<'a> {
    pub fn new(scorer: &'a Scorer) -> Self {
        Self { scorer }
    }

    /// Résout le nom et le code d'un enregistrement
    ///
    /// N'échoue jamais : un enregistrement vide reçoit `이름미상_<index+1>`
    /// et `idx_<index>`.
    pub fn resolve(&self, record: &FeatureRecord, level: Level, index: usize) -> ResolvedIdentity {
        let (name, name_source) = match self.resolve_name(record, level) {
            Some(resolved) => resolved,
            None => (placeholder_name(index), NameSource::Placeholder),
        };
        let (code, code_source) = match resolve_code(record, level) {
            Some(code) => (code, CodeSource::Field),
            None => (positional_code(index), CodeSource::Positional),
        };

        ResolvedIdentity {
            name,
            code,
            level,
            name_source,
            code_source,
        }
    }

    /// Nom canonique, `None` si aucun candidat ne survit au filtrage
    pub fn resolve_name(&self, record: &FeatureRecord, level: Level) -> Option<(String, NameSource)> {
        // 1. Champs stricts : retour immédiat
        if let Some(strict) = pick_first(record, keys::strict_name_keys(level)) {
            return Some((strict, NameSource::Strict));
        }

        // 2. Valeurs des clés de nom du niveau, avec leurs jetons
        let mut tokens: Vec<String> = keys::name_keys(level)
            .filter_map(|key| record.get(key).map(|v| (key, v)))
            .flat_map(|(key, value)| value_candidates(record, key, value))
            .collect();

        // 3. Une municipalité n'hérite pas du nom de sa province
        let province_labels = match level {
            Level::Municipality => province_labels(record),
            Level::Province => Vec::new(),
        };
        tokens.retain(|t| !province_labels.contains(t));

        // 4. Dernier recours : tous les champs texte
        if tokens.is_empty() {
            tokens = record
                .string_fields()
                .flat_map(|(_, value)| candidates_of(value))
                .filter(|t| !province_labels.contains(t))
                .collect();
        }

        // 5. Étiquettes de langue et abréviations
        tokens.retain(|t| !self.scorer.is_disqualified(t));

        // 6-7. Meilleur score, le premier rencontré gagne en cas d'égalité
        let mut best: Option<(i32, &String)> = None;
        for token in &tokens {
            let score = self.scorer.score(token, level);
            trace!(candidate = %token, score, level = %level, "Scored name candidate");
            if best.map_or(true, |(best_score, _)| score > best_score) {
                best = Some((score, token));
            }
        }

        best.map(|(score, token)| (normalize_hyphens(token), NameSource::Scored(score)))
    }
}

/// Code stable : première clé de code présente du niveau
pub fn resolve_code(record: &FeatureRecord, level: Level) -> Option<String> {
    pick_first(record, keys::code_keys(level))
}

/// Première valeur non vide parmi les clés, dans l'ordre des clés
fn pick_first(record: &FeatureRecord, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| record.text(key))
}

/// Une valeur suivie de ses jetons ; seules les chaînes sont découpées
fn value_candidates(record: &FeatureRecord, key: &str, value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::String(s) => candidates_of(s),
        _ => record.text(key).into_iter().collect(),
    }
}

/// Libellés de province présents sur l'enregistrement, avec leurs jetons
fn province_labels(record: &FeatureRecord) -> Vec<String> {
    keys::STRICT_PROVINCE_NAME_KEYS
        .iter()
        .filter_map(|key| record.get(key).map(|v| value_candidates(record, key, v)))
        .flatten()
        .collect()
}

/// Supprime les blancs autour des tirets
fn normalize_hyphens(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, part) in s.split('-').enumerate() {
        if i == 0 {
            out.push_str(part);
            continue;
        }
        let end = out.trim_end().len();
        out.truncate(end);
        out.push('-');
        out.push_str(part.trim_start());
    }
    out.trim().to_string()
}
