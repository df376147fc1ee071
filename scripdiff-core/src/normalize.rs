//! Trading-symbol normalization — derives the canonical join key from a raw
//! provider symbol string.
//!
//! Both providers decorate symbols differently: series suffixes
//! (`RELIANCE-EQ`), stray casing, quoting artifacts. The normalizer maps all
//! of them to one canonical form so the reconciler can match on equality.

/// NSE series suffixes stripped from the end of a raw symbol.
///
/// Stripped only when preceded by a hyphen at the very end of the string,
/// and at most once (`RELIANCE-EQ` → `RELIANCE`, but `TCSEQ` is untouched).
const SERIES_SUFFIXES: [&str; 14] = [
    "EQ", "BE", "RE", "SM", "ST", "PP", "BL", "BZ", "IW", "GS", "GB", "N1", "N2", "N3",
];

/// Normalize a raw trading symbol into the canonical join key.
///
/// Returns `None` for unusable input: null, empty, whitespace-only, or a
/// symbol that is nothing but punctuation. Callers drop such records and
/// count the drop as a data-quality loss.
///
/// Idempotent: feeding a returned key back in yields the same key.
pub fn normalize_symbol(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut symbol = trimmed.to_uppercase();

    // At most one trailing series suffix, anchored to the end.
    let stripped = SERIES_SUFFIXES.iter().find_map(|suffix| {
        symbol
            .strip_suffix(suffix)
            .and_then(|rest| rest.strip_suffix('-'))
            .map(str::to_owned)
    });
    if let Some(stem) = stripped {
        symbol = stem;
    }

    // Quoting artifacts from the source files: keep alphanumerics and `&`.
    symbol.retain(|c| c.is_ascii_alphanumeric() || c == '&');

    if symbol.is_empty() {
        None
    } else {
        Some(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unusable_input_yields_no_key() {
        assert_eq!(normalize_symbol(None), None);
        assert_eq!(normalize_symbol(Some("")), None);
        assert_eq!(normalize_symbol(Some("   ")), None);
        assert_eq!(normalize_symbol(Some("##--")), None);
        assert_eq!(normalize_symbol(Some("-EQ")), None);
    }

    #[test]
    fn uppercases_and_strips_series_suffix() {
        assert_eq!(normalize_symbol(Some("reliance-eq")).as_deref(), Some("RELIANCE"));
        assert_eq!(normalize_symbol(Some("TCS-BE")).as_deref(), Some("TCS"));
        assert_eq!(normalize_symbol(Some("SGBDEC25-GB")).as_deref(), Some("SGBDEC25"));
        assert_eq!(normalize_symbol(Some("IDFCFIRSTB-N3")).as_deref(), Some("IDFCFIRSTB"));
    }

    #[test]
    fn suffix_requires_hyphen_and_anchoring() {
        // No hyphen: not a series suffix, just part of the name.
        assert_eq!(normalize_symbol(Some("TCSEQ")).as_deref(), Some("TCSEQ"));
        // Suffix in the middle is not stripped (the hyphen is, as punctuation).
        assert_eq!(normalize_symbol(Some("AB-EQ-CD")).as_deref(), Some("ABEQCD"));
    }

    #[test]
    fn strips_at_most_one_suffix() {
        assert_eq!(normalize_symbol(Some("FOO-EQ-EQ")).as_deref(), Some("FOOEQ"));
    }

    #[test]
    fn removes_punctuation_but_keeps_ampersand() {
        assert_eq!(normalize_symbol(Some("M&M-EQ")).as_deref(), Some("M&M"));
        assert_eq!(normalize_symbol(Some("AB#CD-RE")).as_deref(), Some("ABCD"));
        assert_eq!(normalize_symbol(Some("  J&K BANK ")).as_deref(), Some("J&KBANK"));
    }

    #[test]
    fn idempotent_on_its_own_output() {
        for raw in ["reliance-eq", "M&M-EQ", "AB#CD-RE", "FOO-EQ-EQ", "  tcs-be "] {
            let once = normalize_symbol(Some(raw)).unwrap();
            let twice = normalize_symbol(Some(&once)).unwrap();
            assert_eq!(once, twice, "not idempotent for {raw:?}");
        }
    }
}
