//! Defensive parsing of model output and deterministic text fallbacks.
//!
//! Nothing a model returns is trusted. Candidate lists go through
//! [`decode_candidates`], which yields an explicit [`CandidateDecode`]
//! instead of an empty list on failure; add-command fields go through
//! [`parse_person_fields`] and, for whatever is still missing, the regex
//! extractors in this module.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::envelope::PersonFields;
use crate::models::{CandidateProfile, Source};

/// Outcome of decoding a model's candidate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateDecode {
    /// A JSON array was found; these are its valid elements (possibly none).
    Validated(Vec<CandidateProfile>),
    /// No usable JSON array was found in the text.
    Fallback { reason: String },
}

/// Decode the first well-formed bracketed JSON array in `text`.
///
/// Every element must be an object with non-empty string `name`, `role` and
/// `location`; anything else is dropped. `source` is always forced to
/// [`Source::External`], whatever the model wrote.
pub fn decode_candidates(text: &str) -> CandidateDecode {
    let mut last_error = None;

    for span in bracketed_spans(text) {
        match serde_json::from_str::<Vec<Value>>(span) {
            Ok(items) => {
                return CandidateDecode::Validated(
                    items.iter().filter_map(validate_candidate).collect(),
                )
            }
            Err(e) => last_error = Some(e.to_string()),
        }
    }

    let reason = match last_error {
        Some(e) => format!("bracketed span in model output is not a JSON array: {}", e),
        None => "no bracketed JSON array in model output".to_string(),
    };
    CandidateDecode::Fallback { reason }
}

fn validate_candidate(item: &Value) -> Option<CandidateProfile> {
    let field = |key: &str| {
        item.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    Some(CandidateProfile {
        name: field("name")?,
        role: field("role")?,
        location: field("location")?,
        source: Source::External,
    })
}

/// Balanced `[ ... ]` spans in order of their opening bracket.
///
/// Brackets inside JSON string literals are ignored. An opening bracket
/// without a matching close yields nothing.
fn bracketed_spans(text: &str) -> impl Iterator<Item = &str> {
    let bytes = text.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == b'[')
        .filter_map(move |(start, _)| {
            let mut depth = 0usize;
            let mut in_string = false;
            let mut escaped = false;
            for (offset, &b) in bytes[start..].iter().enumerate() {
                if in_string {
                    match b {
                        _ if escaped => escaped = false,
                        b'\\' => escaped = true,
                        b'"' => in_string = false,
                        _ => {}
                    }
                    continue;
                }
                match b {
                    b'"' => in_string = true,
                    b'[' => depth += 1,
                    b']' => {
                        depth -= 1;
                        if depth == 0 {
                            return Some(&text[start..=start + offset]);
                        }
                    }
                    _ => {}
                }
            }
            None
        })
}

#[derive(Deserialize)]
struct RawPersonFields {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    location: Option<String>,
}

/// Parse a `{name, role, location}` object from model output.
///
/// Any parse failure yields all-`None` fields. Blank strings count as missing.
pub fn parse_person_fields(text: &str) -> PersonFields {
    let body = strip_code_fences(text);
    match serde_json::from_str::<RawPersonFields>(body) {
        Ok(raw) => PersonFields {
            name: non_blank(raw.name),
            role: non_blank(raw.role),
            location: non_blank(raw.location),
        },
        Err(_) => PersonFields::default(),
    }
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Remove a surrounding Markdown code fence, if any.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json", "sql", ...) on the opening line.
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.trim_end().trim_end_matches("```").trim()
}

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i:\badd)\s+([A-Z][A-Za-z'-]*(?:[ \t]+[A-Z][A-Za-z'-]*)*)\b")
        .expect("valid name regex")
});

static ROLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:a|an)\s+([a-z][a-z\s]*?)\s+(?:from|in)\b").expect("valid role regex")
});

static LOCATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i:\b(?:from|in))\s+([A-Z][a-zA-Z]+)").expect("valid location regex")
});

/// Capitalised-word run following "add".
pub fn extract_name_fallback(query: &str) -> Option<String> {
    NAME_RE
        .captures(query)
        .map(|c| c[1].trim().to_string())
}

/// Phrase following an article and preceding "from" / "in".
pub fn extract_role_fallback(query: &str) -> Option<String> {
    ROLE_RE
        .captures(query)
        .map(|c| c[1].trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Capitalised word following "from" / "in".
pub fn extract_location_fallback(query: &str) -> Option<String> {
    LOCATION_RE.captures(query).map(|c| c[1].to_string())
}

/// Capitalise the first letter of every alphabetic run and lower-case the rest.
///
/// ```
/// use hiring_orchestrator_core::extract::title_case;
/// assert_eq!(title_case("senior ML engineer"), "Senior Ml Engineer");
/// ```
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}
