//! Key Normalization
//!
//! External records name their fields in loose snake_case conventions
//! derived from human labels (`address_country` for a "Country" field in
//! an "Address" step). Matching happens over a canonical normalized form.

/// Normalizes an identifier or label into canonical snake_case.
///
/// Lowercases, collapses every run of non-alphanumeric characters into a
/// single underscore, and trims leading/trailing underscores.
pub fn normalize_key(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_sep = false;

    for ch in input.chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_sep = true;
        }
    }

    out
}

/// Normalizes a display label into its snake_case matching key.
///
/// Same transform as [`normalize_key`]; named separately because call
/// sites match labels and identifiers with different precedence.
pub fn label_key(label: &str) -> String {
    normalize_key(label)
}

/// Returns true when `haystack_key` ends with `needle_key` on a word
/// boundary, or equals it outright.
///
/// `address_country` matches a `country` needle; `country_code` does not.
pub fn has_suffix_word(haystack_key: &str, needle_key: &str) -> bool {
    if needle_key.is_empty() {
        return false;
    }
    haystack_key == needle_key
        || haystack_key.ends_with(&format!("_{}", needle_key))
}

/// Returns true when the `_`-split parts of `haystack_key` contain the
/// parts of `needle_key` as a contiguous word subsequence.
///
/// Guards against accidental substring hits: `country_code` does not
/// contain the word `country` followed by nothing, but as a part list
/// `["country", "code"]` it does contain `["country"]` — the suffix rule
/// above is what distinguishes position; this rule only requires the
/// words to appear intact somewhere, so `legal_company_name` matches a
/// "Company Name" label while `companyname_x` does not.
pub fn has_word(haystack_key: &str, needle_key: &str) -> bool {
    if needle_key.is_empty() {
        return false;
    }

    let haystack: Vec<&str> = haystack_key.split('_').collect();
    let needle: Vec<&str> = needle_key.split('_').collect();

    if needle.len() > haystack.len() {
        return false;
    }

    haystack
        .windows(needle.len())
        .any(|window| window == needle.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize_key("Company Name"), "company_name");
        assert_eq!(normalize_key("country"), "country");
        assert_eq!(normalize_key("PO Match Tol. (%)"), "po_match_tol");
    }

    #[test]
    fn test_normalize_collapses_runs() {
        assert_eq!(normalize_key("a--b__c  d"), "a_b_c_d");
        assert_eq!(normalize_key("  Primary   Email  "), "primary_email");
    }

    #[test]
    fn test_normalize_trims_separators() {
        assert_eq!(normalize_key("__country__"), "country");
        assert_eq!(normalize_key("(Country)"), "country");
    }

    #[test]
    fn test_normalize_empty_and_symbols() {
        assert_eq!(normalize_key(""), "");
        assert_eq!(normalize_key("!!!"), "");
    }

    #[test]
    fn test_normalize_mixed_case_unicode() {
        assert_eq!(normalize_key("Straße"), "straße");
        assert_eq!(normalize_key("VAT-ID"), "vat_id");
    }

    #[test]
    fn test_suffix_word() {
        assert!(has_suffix_word("address_country", "country"));
        assert!(has_suffix_word("country", "country"));
        assert!(!has_suffix_word("country_code", "country"));
        assert!(!has_suffix_word("address_countryside", "country"));
    }

    #[test]
    fn test_has_word_single() {
        assert!(has_word("address_country", "country"));
        assert!(has_word("country_code", "country"));
        assert!(!has_word("countryside_code", "country"));
    }

    #[test]
    fn test_has_word_multi() {
        assert!(has_word("legal_company_name", "company_name"));
        assert!(has_word("company_name", "company_name"));
        assert!(!has_word("company_legal_name", "company_name"));
    }

    #[test]
    fn test_has_word_empty_needle() {
        assert!(!has_word("anything", ""));
        assert!(!has_suffix_word("anything", ""));
    }
}
