//! Identifiants uniques des sources d'overlay et des utilisateurs

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Écriture en base 36, chiffres minuscules
pub fn base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    out.into_iter().map(char::from).collect()
}

/// Millisecondes depuis l'epoch Unix
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Caractères refusés dans un nom de fichier portable
const UNPORTABLE: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|', '.'];

/// Remplace chaque suite de blancs, séparateurs de chemin, points et
/// caractères non portables par un seul `_`
///
/// Le résultat sert de composant de nom de fichier : jamais de `/`, de `..`
/// ni de `_` en bord.
pub fn safe_name(name: &str) -> String {
    let joined = name
        .split(|c: char| c.is_whitespace() || c.is_control() || UNPORTABLE.contains(&c))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    if joined.is_empty() {
        "region".to_string()
    } else {
        joined
    }
}

/// Générateur d'identifiants `"<base>-<millis36>-<compteur36>"`
///
/// Le compteur rend deux identifiants émis dans la même milliseconde
/// distincts.
#[derive(Debug, Default)]
pub struct IdGenerator {
    counter: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self, base: &str) -> String {
        self.next_at(base, now_millis())
    }

    pub fn next_at(&self, base: &str, millis: u64) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}-{}", base, base36(millis), base36(n))
    }
}

/// Nouvel identifiant d'utilisateur anonyme (`u_` + 11 caractères hex)
pub fn new_user_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let mut hasher = blake3::Hasher::new();
    hasher.update(&nanos.to_le_bytes());
    hasher.update(&std::process::id().to_le_bytes());
    let digest = hex::encode(hasher.finalize().as_bytes());
    format!("u_{}", &digest[..11])
}
