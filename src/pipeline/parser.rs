//! Turns pipeline text into an ordered list of [`Stage`] descriptors.
//!
//! Grammar (informal):
//!
//! ```text
//! pipeline := stage ('|' stage)*
//! stage    := identifier ('{' param (',' param)* '}')?
//! param    := key ':' value
//! value    := quotedString | boolLiteral | numberLiteral | bareWord
//! ```
//!
//! Splitting on `|` is literal; there is no escaping. Parameter splitting on
//! `,` respects quoted values, since a quoted string may contain commas.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};
use crate::pipeline::{ParamValue, Params, Stage};

static STAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\s*(?:\{(.*)\})?$").unwrap());

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+(\.\d+)?$").unwrap());

/// Parses one line of pipeline text into stages, in order.
pub fn parse(input: &str) -> Result<Vec<Stage>> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Error::Parse("pipeline is empty".to_string()));
    }

    input
        .split('|')
        .map(|segment| parse_stage(segment.trim()))
        .collect()
}

fn parse_stage(text: &str) -> Result<Stage> {
    let caps = STAGE_RE
        .captures(text)
        .ok_or_else(|| Error::Parse(format!("invalid stage syntax: '{text}'")))?;

    let name = caps[1].to_string();
    let mut params = Params::new();

    if let Some(body) = caps.get(2) {
        let body = body.as_str().trim();
        if !body.is_empty() {
            for pair in split_params(body) {
                let pair = pair.trim();
                let (key, value) = pair.split_once(':').ok_or_else(|| {
                    Error::Parse(format!("invalid parameter '{pair}' in stage '{name}'"))
                })?;
                params.insert(key.trim().to_string(), parse_value(value.trim()));
            }
        }
    }

    Ok(Stage { name, params })
}

/// Splits a parameter body on commas, leaving commas inside quoted values
/// alone.
fn split_params(body: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in body.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    current.push(c);
                }
                ',' => parts.push(std::mem::take(&mut current)),
                _ => current.push(c),
            },
        }
    }
    parts.push(current);
    parts
}

/// Classifies a raw value token. Quoted (matching single or double quotes)
/// is a string with the quotes stripped and no escape processing;
/// case-insensitive `true`/`false` is a boolean; a full numeric match is an
/// integer or float; anything else stays a bare word.
fn parse_value(raw: &str) -> ParamValue {
    let bytes = raw.as_bytes();
    if raw.len() >= 2
        && ((bytes[0] == b'"' && bytes[raw.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[raw.len() - 1] == b'\''))
    {
        return ParamValue::Str(raw[1..raw.len() - 1].to_string());
    }

    if raw.eq_ignore_ascii_case("true") {
        return ParamValue::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return ParamValue::Bool(false);
    }

    if NUMBER_RE.is_match(raw) {
        if raw.contains('.') {
            if let Ok(f) = raw.parse::<f64>() {
                return ParamValue::Float(f);
            }
        } else if let Ok(n) = raw.parse::<i64>() {
            return ParamValue::Int(n);
        }
        // Numbers too large for i64 fall through as bare words.
    }

    ParamValue::Word(raw.to_string())
}
