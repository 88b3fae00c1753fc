//! Découpage des valeurs composites en candidats
//!
//! Certains fournisseurs empilent plusieurs libellés dans un seul champ
//! (`"강남구 | Gangnam-gu"`, `"Jeju Province 제주특별자치도"`).

/// Longueur maximale d'un jeton, en caractères
pub const MAX_TOKEN_CHARS: usize = 80;

/// Découpe une valeur en jetons
///
/// Les parenthèses deviennent des espaces, puis la valeur est coupée sur les
/// séquences de `|`, `/` et `,`, puis sur les blancs doubles. Un segment qui
/// mélange des mots hangul et latins produit en plus ses groupes de mots de
/// même écriture.
pub fn split_tokens(value: &str) -> Vec<String> {
    let cleaned: String = value
        .chars()
        .map(|c| if c == '(' || c == ')' { ' ' } else { c })
        .collect();

    let mut tokens = Vec::new();
    for part in cleaned.split(|c| matches!(c, '|' | '/' | ',')) {
        for segment in split_double_space(part) {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let token = truncate_chars(segment, MAX_TOKEN_CHARS);
            let runs = if is_mixed_script(&token) {
                script_runs(&token)
            } else {
                Vec::new()
            };
            tokens.push(token);
            tokens.extend(runs);
        }
    }
    tokens
}

/// Valeur suivie de ses jetons, telle que présentée au score
pub fn candidates_of(value: &str) -> Vec<String> {
    let mut out = Vec::new();
    let trimmed = value.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
    out.extend(split_tokens(value));
    out
}

/// Vrai si le caractère est une syllabe hangul
pub fn is_hangul(c: char) -> bool {
    ('가'..='힣').contains(&c)
}

/// Vrai si le texte contient à la fois du hangul et des lettres latines
pub fn is_mixed_script(s: &str) -> bool {
    s.chars().any(is_hangul) && s.chars().any(|c| c.is_ascii_alphabetic())
}

/// Coupe sur les séquences d'au moins deux blancs
fn split_double_space(s: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut run_start: Option<usize> = None;
    let mut run_len = 0;

    for (i, c) in s.char_indices() {
        if c.is_whitespace() {
            if run_start.is_none() {
                run_start = Some(i);
                run_len = 0;
            }
            run_len += 1;
        } else if let Some(rs) = run_start.take() {
            if run_len >= 2 {
                out.push(&s[start..rs]);
                start = i;
            }
        }
    }
    match run_start {
        Some(rs) if run_len >= 2 => out.push(&s[start..rs]),
        _ => out.push(&s[start..]),
    }
    out
}

/// Regroupe les mots consécutifs de même écriture
fn script_runs(token: &str) -> Vec<String> {
    let mut runs: Vec<(bool, Vec<&str>)> = Vec::new();
    for word in token.split_whitespace() {
        let native = word.chars().any(is_hangul);
        match runs.last_mut() {
            Some((kind, words)) if *kind == native => words.push(word),
            _ => runs.push((native, vec![word])),
        }
    }
    if runs.len() < 2 {
        return Vec::new();
    }
    runs.into_iter().map(|(_, words)| words.join(" ")).collect()
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_on_delimiters() {
        assert_eq!(
            split_tokens("강남구|Gangnam-gu / 江南區,,Seoul"),
            vec!["강남구", "Gangnam-gu", "江南區", "Seoul"]
        );
    }

    #[test]
    fn test_split_on_double_space() {
        assert_eq!(
            split_tokens("서울특별시  강남구"),
            vec!["서울특별시", "강남구"]
        );
        // un seul espace ne coupe pas
        assert_eq!(split_tokens("서울특별시 강남구"), vec!["서울특별시 강남구"]);
    }

    #[test]
    fn test_parentheses_become_spaces() {
        assert_eq!(split_tokens("수원시(장안구)"), vec!["수원시 장안구"]);
        assert_eq!(split_tokens("수원시  (장안구)"), vec!["수원시", "장안구"]);
    }

    #[test]
    fn test_mixed_script_runs() {
        assert_eq!(
            split_tokens("Jeju Province 제주특별자치도"),
            vec!["Jeju Province 제주특별자치도", "Jeju Province", "제주특별자치도"]
        );
    }

    #[test]
    fn test_truncate_long_token() {
        let long = "가".repeat(100);
        let tokens = split_tokens(&long);
        assert_eq!(tokens[0].chars().count(), MAX_TOKEN_CHARS);
    }

    #[test]
    fn test_candidates_of_keeps_whole_value_first() {
        assert_eq!(
            candidates_of(" 강남구 | Gangnam-gu "),
            vec!["강남구 | Gangnam-gu", "강남구", "Gangnam-gu"]
        );
        assert!(candidates_of("   ").is_empty());
    }
}
