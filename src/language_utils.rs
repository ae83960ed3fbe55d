use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for the language tags found in XLIFF files
///
/// XLIFF carries BCP 47 tags (`en`, `en-US`, `pt_BR`, `zh-Hans`). Only the
/// primary subtag is checked against ISO 639-1 / ISO 639-2.
/// Language code type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageCodeType {
    /// ISO 639-1 (2-letter) code
    Part1,
    /// ISO 639-2/T (3-letter) code
    Part2T,
    /// ISO 639-2/B (3-letter) code
    Part2B,
}

/// ISO 639-2/B codes that differ from their ISO 639-2/T counterpart
const BIBLIOGRAPHIC_CODES: &[(&str, &str)] = &[
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("dut", "nld"),
    ("fre", "fra"),
    ("geo", "kat"),
    ("ger", "deu"),
    ("gre", "ell"),
    ("ice", "isl"),
    ("mac", "mkd"),
    ("may", "msa"),
    ("per", "fas"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Primary language subtag of a tag, lowercased (`en-US` -> `en`)
pub fn primary_subtag(tag: &str) -> String {
    tag.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

fn bibliographic_to_terminology(code: &str) -> Option<&'static str> {
    BIBLIOGRAPHIC_CODES.iter()
        .find(|(b, _)| *b == code)
        .map(|(_, t)| *t)
}

fn lookup(code: &str) -> Option<(Language, LanguageCodeType)> {
    match code.len() {
        2 => Language::from_639_1(code).map(|lang| (lang, LanguageCodeType::Part1)),
        3 => {
            if let Some(lang) = Language::from_639_3(code) {
                return Some((lang, LanguageCodeType::Part2T));
            }
            bibliographic_to_terminology(code)
                .and_then(Language::from_639_3)
                .map(|lang| (lang, LanguageCodeType::Part2B))
        }
        _ => None,
    }
}

/// Validate that a language tag starts with a valid ISO 639-1 or ISO 639-2 code
pub fn validate_language_code(code: &str) -> Result<LanguageCodeType> {
    lookup(&primary_subtag(code))
        .map(|(_, kind)| kind)
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

/// Normalize a language tag to its ISO 639-2/T (3-letter) code
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    lookup(&primary_subtag(code))
        .map(|(lang, _)| lang.to_639_3().to_string())
        .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Check if two language tags name the same language, ignoring region and script
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part2t(code1), normalize_to_part2t(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let (lang, _) = lookup(&primary_subtag(code))
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", code))?;

    Ok(lang.to_name().to_string())
}

/// Language name suitable for a prompt; unknown tags are used verbatim
pub fn display_language(code: &str) -> String {
    match get_language_name(code) {
        Ok(name) if primary_subtag(code) != code.trim().to_lowercase() => {
            format!("{} ({})", name, code.trim())
        }
        Ok(name) => name,
        Err(_) => code.to_string(),
    }
}
