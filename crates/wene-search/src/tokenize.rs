//! Tokenization and prefix expansion for the search index (spec §4.H).

const MAX_TERM_LEN: usize = 64;
const MAX_PREFIX_LEN: usize = 24;

/// Lowercases, splits on whitespace and common punctuation, dedups, and
/// caps each term at 64 chars.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut seen = std::collections::BTreeSet::new();
    let mut terms = Vec::new();
    for raw in text.split(|c: char| c.is_whitespace() || is_punctuation(c)) {
        if raw.is_empty() {
            continue;
        }
        let term: String = raw.to_lowercase().chars().take(MAX_TERM_LEN).collect();
        if term.is_empty() {
            continue;
        }
        if seen.insert(term.clone()) {
            terms.push(term);
        }
    }
    terms
}

fn is_punctuation(c: char) -> bool {
    matches!(c, '.' | ',' | ';' | ':' | '!' | '?' | '\'' | '"' | '(' | ')' | '[' | ']' | '{' | '}' | '/' | '\\' | '-' | '_')
}

/// All prefixes of `term` with length in `2..=min(24, len)`, including the
/// full term itself when its length falls in that range.
pub fn prefixes(term: &str) -> Vec<String> {
    let char_count = term.chars().count();
    let max_len = char_count.min(MAX_PREFIX_LEN);
    if max_len < 2 {
        return vec![term.to_string()];
    }
    (2..=max_len).map(|len| term.chars().take(len).collect()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_dedups_and_lowercases() {
        let terms = tokenize("Welcome, Welcome Mixer!");
        assert_eq!(terms, vec!["welcome", "mixer"]);
    }

    #[test]
    fn prefixes_cover_2_through_full_length() {
        let p = prefixes("mixer");
        assert_eq!(p, vec!["mi", "mix", "mixe", "mixer"]);
    }

    #[test]
    fn prefixes_cap_at_24_chars() {
        let term = "a".repeat(30);
        let p = prefixes(&term);
        assert_eq!(p.last().unwrap().len(), 24);
        assert_eq!(p.len(), 23);
    }
}
