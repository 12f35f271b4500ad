/*
 *  extract.rs
 *
 *  PiPanel - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Best-effort scalar extraction from flat key/value response blobs
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

//! The remote endpoints answer with small flat objects such as
//! `{"title":"Song","progress":1000}`. This is a scanner, not a parser:
//! it knows nothing about nesting or escapes, and any irregularity yields
//! an empty result. Empty always means "unknown", never an error.

/// Returns the value stored under `key`, or an empty string.
///
/// The first occurrence of `"key"` that is followed by a `:` is the key;
/// earlier hits are string values that happen to spell it. The value is either a quoted string (up to the next `"`) or a bare
/// scalar (up to the next `,` or `}`, whitespace trimmed).
pub fn extract(blob: &str, key: &str) -> String {
    extract_str(blob, key).unwrap_or_default().to_string()
}

/// Borrowing variant of [`extract`]; `None` covers both "absent" and "malformed".
pub fn extract_str<'a>(blob: &'a str, key: &str) -> Option<&'a str> {
    let quoted_key = format!("\"{}\"", key);
    let value = blob
        .match_indices(&quoted_key)
        .find_map(|(at, _)| blob[at + quoted_key.len()..].trim_start().strip_prefix(':'))?
        .trim_start();

    if let Some(rest) = value.strip_prefix('"') {
        let end = rest.find('"')?;
        return Some(&rest[..end]);
    }

    let end = value.find([',', '}']).unwrap_or(value.len());
    let scalar = value[..end].trim_end();
    if scalar.is_empty() { None } else { Some(scalar) }
}

/// Numeric convenience; unparsable and missing values are both `None`.
pub fn extract_f64(blob: &str, key: &str) -> Option<f64> {
    extract_str(blob, key)?
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Value under `key`, or `fallback` when the extractor comes back empty.
pub fn extract_or(blob: &str, key: &str, fallback: &str) -> String {
    match extract_str(blob, key) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => fallback.to_string(),
    }
}
