//! Address candidate filtering and normalisation.
//!
//! The focused recognition pass over the cropped region returns everything
//! legible near the anchor: the address itself, neighbouring labels, lot
//! numbers, stray table rules read as hyphens. This module keeps the
//! fragments that look like a Japanese address and reduces them to a clean
//! place name.
//!
//! ## Candidate rules
//!
//! A fragment (after trimming) is a candidate when all of these hold:
//!
//! 1. it is longer than the configured minimum (characters, not bytes)
//! 2. it contains none of the profile's keywords
//! 3. it looks like an address: a prefecture followed by a municipality,
//!    a number followed by a block/lot/house marker, or a marker followed
//!    by a number
//! 4. it is not made only of digits and hyphens
//!
//! ## Normalisation
//!
//! Candidates are joined with single spaces, then:
//!
//! 1. a leading keyword is stripped (keywords checked in priority order)
//! 2. whitespace runs collapse to one space
//! 3. leading digits, spaces and hyphens are dropped
//! 4. only the head up to the first digit or whitespace is kept
//! 5. surrounding whitespace is trimmed
//!
//! Steps 1–3 repeat until nothing changes, so normalising an already
//! normalised address returns it unchanged.

use crate::config::KeywordProfile;
use crate::engine::RecognitionResult;
use once_cell::sync::Lazy;
use regex::Regex;

// ── Candidate patterns ───────────────────────────────────────────────────────

/// Prefecture (都/道/府/県) immediately followed by a municipality (市/区/町/村).
static RE_PREFECTURE_MUNICIPALITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\s)\S+[都道府県]\S+[市区町村]").unwrap());

/// `12-`, `3丁目`, `15番地`, `7号`.
static RE_NUMBER_THEN_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+[-丁目番地号]+").unwrap());

/// `丁目3`, `番地12`.
static RE_MARKER_THEN_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\S+[丁目番地号]\d+").unwrap());

static RE_DIGITS_AND_HYPHENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\d\-]+$").unwrap());

// ── Normalisation patterns ───────────────────────────────────────────────────

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static RE_LEADING_NUMBERING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\d\s\-]+").unwrap());

static RE_PLACE_HEAD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\d\s]+").unwrap());

/// True if `text` matches one of the address shapes.
pub fn looks_like_address(text: &str) -> bool {
    RE_PREFECTURE_MUNICIPALITY.is_match(text)
        || RE_NUMBER_THEN_MARKER.is_match(text)
        || RE_MARKER_THEN_NUMBER.is_match(text)
}

/// Apply the four candidate rules to one (already trimmed) fragment.
pub fn is_candidate(text: &str, profile: &KeywordProfile, min_len: usize) -> bool {
    text.chars().count() > min_len
        && !profile.mentions_any(text)
        && looks_like_address(text)
        && !RE_DIGITS_AND_HYPHENS.is_match(text)
}

/// Trimmed texts of the focused-pass results that pass [`is_candidate`],
/// in the order the engine returned them.
pub fn select_candidates(
    results: &[RecognitionResult],
    profile: &KeywordProfile,
    min_len: usize,
) -> Vec<String> {
    results
        .iter()
        .map(|r| r.text.trim())
        .filter(|t| is_candidate(t, profile, min_len))
        .map(str::to_string)
        .collect()
}

/// Normalise joined candidates into a place name.
pub fn normalize_address(raw: &str, profile: &KeywordProfile) -> String {
    let mut s = raw.to_string();
    loop {
        let next = strip_leading_numbering(&collapse_whitespace(&strip_keyword_prefix(
            &s, profile,
        )));
        if next == s {
            break;
        }
        s = next;
    }
    keep_place_head(&s).trim().to_string()
}

// ── Rule 1: Strip keyword prefix ─────────────────────────────────────────────

fn strip_keyword_prefix(input: &str, profile: &KeywordProfile) -> String {
    let mut s = input;
    for keyword in profile.keywords() {
        if let Some(rest) = s.strip_prefix(keyword.as_str()) {
            s = rest.trim();
        }
    }
    s.to_string()
}

// ── Rule 2: Collapse whitespace ──────────────────────────────────────────────

fn collapse_whitespace(input: &str) -> String {
    RE_WHITESPACE.replace_all(input, " ").into_owned()
}

// ── Rule 3: Drop leading numbering ───────────────────────────────────────────

fn strip_leading_numbering(input: &str) -> String {
    RE_LEADING_NUMBERING.replace(input, "").into_owned()
}

// ── Rule 4: Keep the non-numeric head ────────────────────────────────────────

fn keep_place_head(input: &str) -> &str {
    RE_PLACE_HEAD
        .find(input)
        .map(|m| m.as_str())
        .unwrap_or(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p() -> KeywordProfile {
        KeywordProfile::default()
    }

    // ── candidates ──

    #[test]
    fn accepts_prefecture_municipality() {
        assert!(is_candidate("福岡県福岡市中央区天神", &p(), 3));
        assert!(is_candidate("東京都渋谷区神南", &p(), 3));
        assert!(is_candidate("所在 長崎県佐世保市", &p(), 3));
    }

    #[test]
    fn accepts_block_markers() {
        assert!(is_candidate("渋谷区1-2-3", &p(), 3));
        assert!(is_candidate("天神2丁目", &p(), 3));
        assert!(is_candidate("大字丁目12", &p(), 3));
        assert!(is_candidate("１２番地の先", &p(), 3));
    }

    #[test]
    fn rejects_short_fragments() {
        assert!(!is_candidate("1丁目", &p(), 3));
        assert!(is_candidate("12丁目", &p(), 3));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        // four characters, twelve bytes
        assert!(is_candidate("3番地号", &p(), 3));
    }

    #[test]
    fn rejects_pure_digits_and_hyphens() {
        assert!(!is_candidate("123-45", &p(), 3));
        assert!(!is_candidate("2024-10-01", &p(), 3));
    }

    #[test]
    fn rejects_fragments_with_keywords() {
        assert!(!is_candidate("建築地 東京都渋谷区1-2-3", &p(), 3));
        assert!(!is_candidate("申請地:福岡県福岡市", &p(), 3));
    }

    #[test]
    fn rejects_non_address_text() {
        assert!(!is_candidate("配置図 S=1/100", &p(), 3));
        assert!(!is_candidate("株式会社サンプル設計", &p(), 3));
    }

    #[test]
    fn select_keeps_pass_order_and_trims() {
        let results = vec![
            RecognitionResult::rect(0.0, 0.0, 1.0, 1.0, "  東京都渋谷区神南 "),
            RecognitionResult::rect(0.0, 0.0, 1.0, 1.0, "123-45"),
            RecognitionResult::rect(0.0, 0.0, 1.0, 1.0, "建築地"),
            RecognitionResult::rect(0.0, 0.0, 1.0, 1.0, "1丁目2番3号"),
        ];
        assert_eq!(
            select_candidates(&results, &p(), 3),
            vec!["東京都渋谷区神南".to_string(), "1丁目2番3号".to_string()]
        );
    }

    // ── normalisation ──

    #[test]
    fn keeps_place_name_head() {
        assert_eq!(normalize_address("東京都渋谷区1-2-3 先", &p()), "東京都渋谷区");
    }

    #[test]
    fn strips_leading_lot_numbers() {
        assert_eq!(normalize_address("12-3 福岡県福岡市 天神", &p()), "福岡県福岡市");
    }

    #[test]
    fn strips_keyword_prefix() {
        assert_eq!(normalize_address("建築地住所 長崎県佐世保市", &p()), "長崎県佐世保市");
        assert_eq!(normalize_address("建築地　島根県松江市", &p()), "島根県松江市");
    }

    #[test]
    fn collapses_ideographic_space() {
        assert_eq!(normalize_address("\u{3000}\u{3000}鳥取県鳥取市", &p()), "鳥取県鳥取市");
    }

    #[test]
    fn numbering_only_normalises_to_empty() {
        assert_eq!(normalize_address("123-4 5", &p()), "");
        assert_eq!(normalize_address("", &p()), "");
    }

    #[test]
    fn keyword_exposed_after_numbering_is_stripped() {
        assert_eq!(normalize_address("12 建築地 東京都港区", &p()), "東京都港区");
    }

    #[test]
    fn normalisation_is_idempotent() {
        let inputs = [
            "東京都渋谷区1-2-3 先",
            "建築地住所 長崎県佐世保市",
            "12 建築地 東京都港区",
            "1丁目2番3号",
            "  大阪府大阪市北区  梅田 ",
            "---",
            "建設地建築地 申請地 7 福岡県",
        ];
        for input in inputs {
            let once = normalize_address(input, &p());
            let twice = normalize_address(&once, &p());
            assert_eq!(once, twice, "input: {input:?}");
        }
    }
}
