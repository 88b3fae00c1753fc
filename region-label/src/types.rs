//! Types de données pour le crate region-label

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Niveau administratif d'une feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Province (시/도)
    Province,
    /// Municipalité (시/군/구)
    Municipality,
}

impl Level {
    /// Préfixe court utilisé dans les clés de sélection (`prov:<code>`)
    pub fn key_prefix(self) -> &'static str {
        match self {
            Self::Province => "prov",
            Self::Municipality => "mun",
        }
    }

    /// Préfixe des identifiants de source/couche côté carte
    pub fn layer_prefix(self) -> &'static str {
        match self {
            Self::Province => "province",
            Self::Municipality => "municipality",
        }
    }

    /// Clé de sélection `"<niveau>:<code>"`
    pub fn selection_key(self, code: &str) -> String {
        format!("{}:{}", self.key_prefix(), code)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Province => "province",
            Self::Municipality => "municipality",
        })
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "province" | "prov" | "sido" => Ok(Self::Province),
            "municipality" | "mun" | "sigungu" => Ok(Self::Municipality),
            other => Err(format!(
                "Unknown level: {other}. Use: province (prov), municipality (mun)"
            )),
        }
    }
}

/// Enregistrement de propriétés d'une feature, tel que reçu
///
/// L'ordre des champs est celui du document source : il départage les
/// candidats de même score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRecord {
    fields: Map<String, Value>,
}

impl FeatureRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Construit un enregistrement depuis des paires clé/valeur texte
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Valeur scalaire d'un champ, convertie en texte et nettoyée
    ///
    /// `None` si le champ est absent, nul, vide ou non scalaire.
    pub fn text(&self, key: &str) -> Option<String> {
        self.fields.get(key).and_then(scalar_text)
    }

    /// Champs de type chaîne non vides, dans l'ordre du document
    pub fn string_fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().filter_map(|(k, v)| match v {
            Value::String(s) if !s.trim().is_empty() => Some((k.as_str(), s.as_str())),
            _ => None,
        })
    }

    /// Accès aux champs bruts
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Consomme l'enregistrement et rend les champs bruts
    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }
}

/// Rendu texte d'une valeur scalaire (les nombres gardent leur forme JSON)
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Origine du nom retenu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NameSource {
    /// Champ strict du niveau, sans heuristique
    Strict,
    /// Candidat retenu par le score (avec son score)
    Scored(i32),
    /// Aucun candidat : nom synthétisé depuis l'index
    Placeholder,
}

/// Origine du code retenu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CodeSource {
    /// Champ de code reconnu
    Field,
    /// Code positionnel `idx_<n>` (instable si la collection est réordonnée)
    Positional,
}

/// Identité canonique d'une feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedIdentity {
    /// Nom affiché
    pub name: String,

    /// Code stable servant de clé entre sessions
    pub code: String,

    /// Niveau administratif
    pub level: Level,

    /// Origine du nom
    pub name_source: NameSource,

    /// Origine du code
    pub code_source: CodeSource,
}

impl ResolvedIdentity {
    /// Clé de sélection `"<niveau>:<code>"`
    pub fn selection_key(&self) -> String {
        self.level.selection_key(&self.code)
    }
}
