//! Tableau de likes par région, avec délai par utilisateur
//!
//! Les compteurs sont indexés par clé de sélection (`"prov:11"`,
//! `"mun:11680"`) et persistés dans un magasin clé-valeur injecté.

use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use region_label::Level;

use crate::ids::new_user_id;

/// Compteurs par clé de région
pub const LIKES_KEY: &str = "kplace_likes_v10";

/// Dernier like de chaque utilisateur (millisecondes epoch)
pub const LAST_LIKE_KEY: &str = "kplace_user_lastlike_v1";

/// Identifiant de l'utilisateur courant
pub const USER_ID_KEY: &str = "kplace_user_id_v1";

/// Magasin clé-valeur de chaînes
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: String) -> Result<()>;
}

/// Magasin en mémoire
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Magasin dans un fichier JSON (objet de chaînes), réécrit à chaque `set`
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonFileStore {
    pub fn open(path: &Path) -> Result<Self> {
        let values = match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content)
                .context(format!("Failed to parse store: {}", path.display()))?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e).context(format!("Failed to read store: {}", path.display())),
        };
        Ok(Self {
            path: path.to_path_buf(),
            values,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.values.insert(key.to_string(), value);
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&self.values)?)
            .context(format!("Failed to write store: {}", self.path.display()))
    }
}

/// Résultat d'un like
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LikeOutcome {
    Liked { key: String, count: u64 },
    CoolingDown { remaining: Duration },
}

/// Tableau de likes d'un utilisateur
#[derive(Debug)]
pub struct LikeBoard<S: KeyValueStore> {
    store: S,
    user_id: String,
    cooldown: Duration,
    counts: BTreeMap<String, u64>,
    last_likes: BTreeMap<String, u64>,
}

impl<S: KeyValueStore> LikeBoard<S> {
    /// Charge les compteurs ; crée l'identifiant utilisateur au premier usage
    ///
    /// Un contenu illisible est ignoré (compteurs vides), jamais fatal.
    pub fn open(mut store: S, cooldown: Duration) -> Result<Self> {
        let user_id = match store.get(USER_ID_KEY).filter(|id| !id.trim().is_empty()) {
            Some(id) => id,
            None => {
                let id = new_user_id();
                store.set(USER_ID_KEY, id.clone())?;
                debug!(user_id = %id, "Created user id");
                id
            }
        };

        let counts = read_json(&store, LIKES_KEY);
        let last_likes = read_json(&store, LAST_LIKE_KEY);

        Ok(Self {
            store,
            user_id,
            cooldown,
            counts,
            last_likes,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn count(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Horodatage du dernier like de l'utilisateur
    pub fn last_like(&self) -> Option<u64> {
        self.last_likes.get(&self.user_id).copied()
    }

    /// Délai restant avant le prochain like
    pub fn remaining(&self, now_ms: u64) -> Duration {
        match self.last_like() {
            Some(last) => {
                let elapsed = Duration::from_millis(now_ms.saturating_sub(last));
                self.cooldown.saturating_sub(elapsed)
            }
            None => Duration::ZERO,
        }
    }

    pub fn can_like(&self, now_ms: u64) -> bool {
        self.remaining(now_ms).is_zero()
    }

    /// Ajoute un like à une région si le délai est écoulé
    pub fn like(&mut self, key: &str, now_ms: u64) -> Result<LikeOutcome> {
        if key.trim().is_empty() {
            anyhow::bail!("No region selected");
        }

        let remaining = self.remaining(now_ms);
        if !remaining.is_zero() {
            debug!(key, remaining = %format_remaining(remaining), "Like refused, cooling down");
            return Ok(LikeOutcome::CoolingDown { remaining });
        }

        // Les compteurs en mémoire ne changent qu'une fois le magasin écrit
        let mut counts = self.counts.clone();
        let count = counts.get(key).copied().unwrap_or(0) + 1;
        counts.insert(key.to_string(), count);
        let mut last_likes = self.last_likes.clone();
        last_likes.insert(self.user_id.clone(), now_ms);

        self.store.set(LIKES_KEY, serde_json::to_string(&counts)?)?;
        self.store.set(LAST_LIKE_KEY, serde_json::to_string(&last_likes)?)?;
        self.counts = counts;
        self.last_likes = last_likes;

        Ok(LikeOutcome::Liked {
            key: key.to_string(),
            count,
        })
    }

    /// Régions les plus aimées d'un niveau, par compte décroissant
    pub fn top(&self, level: Level, limit: usize) -> Vec<(&str, u64)> {
        let prefix = format!("{}:", level.key_prefix());
        let mut entries: Vec<(&str, u64)> = self
            .counts
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(key, &count)| (key.as_str(), count))
            .collect();
        // Tri stable : à égalité, ordre des clés
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.truncate(limit);
        entries
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

fn read_json<S: KeyValueStore, T: DeserializeOwned + Default>(store: &S, key: &str) -> T {
    match store.get(key) {
        Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(key, error = %e, "Ignoring unreadable stored value");
            T::default()
        }),
        None => T::default(),
    }
}

/// Compteur compact : `999`, `1.2k`, `3M`, `1.5B`
pub fn format_count(n: i64) -> String {
    const UNITS: [(f64, &str); 3] = [(1e9, "B"), (1e6, "M"), (1e3, "k")];

    let abs = n.unsigned_abs() as f64;
    for (value, suffix) in UNITS {
        if abs >= value {
            let formatted = format!("{:.1}", n as f64 / value);
            let trimmed = formatted.strip_suffix(".0").unwrap_or(&formatted);
            return format!("{}{}", trimmed, suffix);
        }
    }
    n.to_string()
}

/// Délai au format `m:ss`, secondes arrondies au supérieur
pub fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.as_millis().div_ceil(1000);
    format!("{}:{:02}", secs / 60, secs % 60)
}
