//! Tables de clés de propriétés, par niveau
//!
//! L'ordre des tables est significatif : la première clé présente gagne.

use crate::types::Level;

/// Clés portant sans ambiguïté un nom de municipalité
pub const STRICT_MUNICIPALITY_NAME_KEYS: &[&str] = &[
    "SIG_KOR_NM",
    "SIG_ENG_NM",
    "SIG_NM",
    "SIG_ENG",
    "ADM2_KOR_NM",
    "ADM2_ENG_NM",
    "si_gun_gu",
    "SI_GUN_GU",
    "SIGUNGU",
    "SIGUNGU_NM",
    "NAME_2",
    "NAME_ENG2",
    "NAME_KO2",
    "NAME_MUN",
    "MUN_NAME",
];

/// Clés portant sans ambiguïté un nom de province
pub const STRICT_PROVINCE_NAME_KEYS: &[&str] = &[
    "CTP_KOR_NM",
    "CTP_ENG_NM",
    "CTP_KOR",
    "CTP_ENG",
    "SIDO_NM",
    "sido",
    "ADM1_KOR_NM",
    "ADM1_ENG_NM",
];

/// Clés génériques, de niveau inconnu
pub const GENERIC_NAME_KEYS: &[&str] = &[
    "ADM_NM",
    "NAME_KO",
    "NAME_KOR",
    "NAME_LOCAL",
    "KOR_NM",
    "korName",
    "name_ko",
    "ko_name",
    "label_ko",
    "local",
    "localName",
    "local_name",
    "label",
    "name",
    "NAME",
    "full_nm",
    "adm_nm",
];

pub const PROVINCE_CODE_KEYS: &[&str] = &[
    "CTPRVN_CD",
    "sido_cd",
    "ADM1_CD",
    "ADM_CD",
    "code",
    "CODE",
    "ID",
    "id",
];

pub const MUNICIPALITY_CODE_KEYS: &[&str] = &[
    "SIG_CD",
    "sig_cd",
    "ADM2_CD",
    "ADM_CD",
    "code",
    "CODE",
    "ID",
    "id",
];

/// Clés strictes du niveau
pub fn strict_name_keys(level: Level) -> &'static [&'static str] {
    match level {
        Level::Province => STRICT_PROVINCE_NAME_KEYS,
        Level::Municipality => STRICT_MUNICIPALITY_NAME_KEYS,
    }
}

/// Toutes les clés de nom du niveau : strictes puis génériques
pub fn name_keys(level: Level) -> impl Iterator<Item = &'static str> {
    strict_name_keys(level)
        .iter()
        .chain(GENERIC_NAME_KEYS.iter())
        .copied()
}

pub fn code_keys(level: Level) -> &'static [&'static str] {
    match level {
        Level::Province => PROVINCE_CODE_KEYS,
        Level::Municipality => MUNICIPALITY_CODE_KEYS,
    }
}
