//! Score heuristique des candidats de nom
//!
//! Le score est une fonction pure d'une table ordonnée de règles. Ajouter une
//! règle revient à ajouter une ligne à [`RULES`].

use std::sync::OnceLock;

use regex::Regex;

use crate::types::Level;
use crate::LabelError;

/// Score sentinelle d'un candidat éliminé
pub const DISQUALIFIED: i32 = -999;

/// Score d'un candidat vide
pub const EMPTY: i32 = -1;

/// Effet d'une règle sur le score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Élimine le candidat ([`DISQUALIFIED`])
    Disqualify,
    /// Ajoute le poids une fois si le motif correspond
    Bonus(i32),
    /// Ajoute le poids pour chaque occurrence du motif
    PerMatch(i32),
}

/// Règle de score
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    /// Nom stable de la règle (traces, tests)
    pub name: &'static str,
    /// Motif regex évalué sur le candidat
    pub pattern: &'static str,
    /// Niveau auquel la règle s'applique (`None` : tous)
    pub level: Option<Level>,
    pub effect: Effect,
}

const LANGUAGE_TAG: &str = r"(?i)^(ko|kor|kr|korean)$";
const SHORT_LATIN: &str = r"^[A-Za-z]{1,3}$";
const PROVINCE_SUFFIX: &str = r"(특별시|광역시|자치시|특별자치시|특별자치도|자치도|도)$";
const MUNICIPALITY_SUFFIX: &str = r"(시|군|구)$";

/// Table de règles standard, évaluée dans l'ordre
pub const RULES: &[Rule] = &[
    Rule {
        name: "language_tag",
        pattern: LANGUAGE_TAG,
        level: None,
        effect: Effect::Disqualify,
    },
    Rule {
        name: "short_latin",
        pattern: SHORT_LATIN,
        level: None,
        effect: Effect::Disqualify,
    },
    Rule {
        name: "native_script",
        pattern: r"[가-힣]",
        level: None,
        effect: Effect::PerMatch(10),
    },
    Rule {
        name: "municipality_suffix",
        pattern: MUNICIPALITY_SUFFIX,
        level: Some(Level::Municipality),
        effect: Effect::Bonus(30),
    },
    Rule {
        name: "province_suffix_on_municipality",
        pattern: PROVINCE_SUFFIX,
        level: Some(Level::Municipality),
        effect: Effect::Bonus(-40),
    },
    Rule {
        name: "province_suffix",
        pattern: PROVINCE_SUFFIX,
        level: Some(Level::Province),
        effect: Effect::Bonus(20),
    },
    Rule {
        name: "municipality_suffix_on_province",
        pattern: MUNICIPALITY_SUFFIX,
        level: Some(Level::Province),
        effect: Effect::Bonus(-10),
    },
    Rule {
        name: "romanized_suffix",
        pattern: r"(?i)(?:-?\s*(do|si|gun|gu))$",
        level: None,
        effect: Effect::Bonus(6),
    },
    // Un seul caractère Unicode (scalaire), y compris hors du plan de base :
    // "𠀀" compte pour un, comme "강"
    Rule {
        name: "too_short",
        pattern: r"^.$",
        level: None,
        effect: Effect::Bonus(-10),
    },
    Rule {
        name: "digits_only",
        pattern: r"^[\s0-9-]+$",
        level: None,
        effect: Effect::Bonus(-10),
    },
    Rule {
        name: "mixed_script",
        pattern: r"[가-힣].*[A-Za-z]|[A-Za-z].*[가-힣]",
        level: None,
        effect: Effect::Bonus(-5),
    },
];

/// Table de règles compilée
#[derive(Debug)]
pub struct Scorer {
    rules: Vec<(Rule, Regex)>,
}

impl Scorer {
    /// Compile une table de règles
    pub fn new(rules: &[Rule]) -> Result<Self, LabelError> {
        let rules = rules
            .iter()
            .map(|rule| {
                Regex::new(rule.pattern)
                    .map(|re| (*rule, re))
                    .map_err(|e| LabelError::InvalidRule {
                        rule: rule.name,
                        reason: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Table standard, compilée une seule fois
    ///
    /// # Panics
    ///
    /// Si un motif de [`RULES`] ne compile pas (couvert par les tests).
    pub fn standard() -> &'static Scorer {
        static STANDARD: OnceLock<Scorer> = OnceLock::new();
        STANDARD.get_or_init(|| Scorer::new(RULES).expect("standard scoring rules must compile"))
    }

    /// Score d'un candidat pour un niveau
    pub fn score(&self, candidate: &str, level: Level) -> i32 {
        if candidate.is_empty() {
            return EMPTY;
        }
        let mut score = 0;
        for (rule, re) in self.applicable(level) {
            match rule.effect {
                Effect::Disqualify => {
                    if re.is_match(candidate) {
                        return DISQUALIFIED;
                    }
                }
                Effect::Bonus(weight) => {
                    if re.is_match(candidate) {
                        score += weight;
                    }
                }
                Effect::PerMatch(weight) => {
                    score += weight * re.find_iter(candidate).count() as i32;
                }
            }
        }
        score
    }

    /// Contribution de chaque règle déclenchée, dans l'ordre de la table
    pub fn explain(&self, candidate: &str, level: Level) -> Vec<(&'static str, i32)> {
        let mut out = Vec::new();
        for (rule, re) in self.applicable(level) {
            let contribution = match rule.effect {
                Effect::Disqualify if re.is_match(candidate) => DISQUALIFIED,
                Effect::Bonus(weight) if re.is_match(candidate) => weight,
                Effect::PerMatch(weight) => weight * re.find_iter(candidate).count() as i32,
                _ => 0,
            };
            if contribution != 0 {
                out.push((rule.name, contribution));
            }
        }
        out
    }

    /// Vrai si une règle d'élimination correspond
    pub fn is_disqualified(&self, candidate: &str) -> bool {
        self.rules
            .iter()
            .any(|(rule, re)| rule.effect == Effect::Disqualify && re.is_match(candidate))
    }

    fn applicable(&self, level: Level) -> impl Iterator<Item = &(Rule, Regex)> {
        self.rules
            .iter()
            .filter(move |(rule, _)| rule.level.map_or(true, |l| l == level))
    }
}
