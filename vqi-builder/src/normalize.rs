//! Venue name normalization
//!
//! Every source is joined on the key produced here, so the rules must never
//! depend on which source a name came from.

/// Canonical lookup key for a venue display name
///
/// Lowercases, spells `&` as `and`, turns every run of characters outside
/// `[a-z0-9]` into one space and trims. Returns an empty string for names with
/// no usable characters; callers discard those.
pub fn normalize_venue_name(name: &str) -> String {
    let lowered = name.to_lowercase().replace('&', " and ");

    let mut key = String::with_capacity(lowered.len());
    let mut pending_space = false;

    for ch in lowered.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_space && !key.is_empty() {
                key.push(' ');
            }
            pending_space = false;
            key.push(ch);
        } else {
            pending_space = true;
        }
    }

    key
}

/// Keys for a `|`-separated synonym list (`"Full Name|ACRONYM"`)
///
/// Empty synonyms are dropped and duplicates collapse, preserving first
/// appearance order.
pub fn synonym_keys(names: &str) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();

    for synonym in names.split('|') {
        let key = normalize_venue_name(synonym);
        if !key.is_empty() && !keys.contains(&key) {
            keys.push(key);
        }
    }

    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_normalization() {
        assert_eq!(
            normalize_venue_name("Journal of Finance"),
            "journal of finance"
        );
        assert_eq!(
            normalize_venue_name("  IEEE Trans. on Software-Engineering "),
            "ieee trans on software engineering"
        );
    }

    #[test]
    fn test_ampersand_becomes_and() {
        assert_eq!(
            normalize_venue_name("Information & Management"),
            "information and management"
        );
        assert_eq!(
            normalize_venue_name("R&D Management"),
            "r and d management"
        );
    }

    #[test]
    fn test_empty_and_punctuation_only() {
        assert_eq!(normalize_venue_name(""), "");
        assert_eq!(normalize_venue_name("   \t\n"), "");
        assert_eq!(normalize_venue_name("--//--"), "");
    }

    #[test]
    fn test_non_ascii_letters_are_separators() {
        assert_eq!(normalize_venue_name("Zürich Papers"), "z rich papers");
    }

    #[test]
    fn test_idempotent_on_known_names() {
        for raw in [
            "ACM Transactions on Information Systems (TOIS)",
            "The Accounting Review",
            "Journal of Marketing, 2019",
            "MIS Quarterly: Management Information Systems",
        ] {
            let once = normalize_venue_name(raw);
            assert_eq!(normalize_venue_name(&once), once);
        }
    }

    #[test]
    fn test_synonym_keys() {
        assert_eq!(
            synonym_keys("International Conference on Software Engineering|ICSE"),
            vec![
                "international conference on software engineering".to_string(),
                "icse".to_string()
            ]
        );
        assert_eq!(synonym_keys("ICSE||icse| "), vec!["icse".to_string()]);
        assert!(synonym_keys("|").is_empty());
    }
}
