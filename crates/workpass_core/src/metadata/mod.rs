use serde_json::Value;

use crate::domain::{ChunkMetadata, FlatMetadata, MetadataValue};
use crate::error::{codes, AppError};

/// Flattens chunk metadata into the scalar-only shape the collection accepts.
///
/// Lossy for structured fields: `headings` becomes `"h1: Eligibility; h2: Fees"`
/// and reading it back yields that string, not the list.
pub fn flatten_chunk_metadata(meta: &ChunkMetadata) -> Result<FlatMetadata, AppError> {
    let value = serde_json::to_value(meta).map_err(|e| {
        AppError::new(codes::METADATA_ENCODE_FAILED, "Failed to encode chunk metadata")
            .with_details(e.to_string())
    })?;
    match value {
        Value::Object(map) => Ok(flatten_map(map)),
        other => Err(AppError::new(
            codes::METADATA_ENCODE_FAILED,
            "Chunk metadata did not encode as an object",
        )
        .with_details(format!("got={other}"))),
    }
}

/// Flattens an arbitrary JSON object:
/// - scalars pass through
/// - lists of `{level, text}` join as `level: text` separated by `"; "`
/// - other lists become a JSON string, or `""` when empty
/// - nested objects become a JSON string
pub fn flatten_map(map: serde_json::Map<String, Value>) -> FlatMetadata {
    let mut out = FlatMetadata::new();
    for (key, value) in map {
        if let Some(flat) = flatten_value(value) {
            out.insert(key, flat);
        }
    }
    out
}

fn flatten_value(value: Value) -> Option<MetadataValue> {
    match value {
        Value::Null => Some(MetadataValue::Null),
        Value::Bool(b) => Some(MetadataValue::Bool(b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(MetadataValue::Int(i))
            } else {
                n.as_f64().map(MetadataValue::Float)
            }
        }
        Value::String(s) => Some(MetadataValue::Str(s)),
        Value::Array(items) => {
            if items.is_empty() {
                return Some(MetadataValue::Str(String::new()));
            }
            if let Some(joined) = join_headings(&items) {
                return Some(MetadataValue::Str(joined));
            }
            serde_json::to_string(&items).ok().map(MetadataValue::Str)
        }
        Value::Object(map) => serde_json::to_string(&map).ok().map(MetadataValue::Str),
    }
}

fn join_headings(items: &[Value]) -> Option<String> {
    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        let obj = item.as_object()?;
        let level = obj.get("level")?.as_str()?;
        let text = obj.get("text")?.as_str()?;
        parts.push(format!("{level}: {text}"));
    }
    Some(parts.join("; "))
}

/// String field of a flat record, falling back when missing or not a string.
pub fn get_str<'a>(meta: &'a FlatMetadata, key: &str, fallback: &'a str) -> &'a str {
    meta.get(key).and_then(MetadataValue::as_str).unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Heading;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn meta(headings: Vec<Heading>) -> ChunkMetadata {
        ChunkMetadata {
            source: "https://www.mom.gov.sg/passes-and-permits/employment-pass".to_string(),
            title: "Employment Pass".to_string(),
            category: "employment_passes".to_string(),
            pass_type: "Employment Pass".to_string(),
            chunk_index: 2,
            total_chunks: 5,
            headings,
        }
    }

    #[test]
    fn headings_flatten_to_level_text_pairs() {
        let flat = flatten_chunk_metadata(&meta(vec![Heading::new("h1", "Eligibility")])).unwrap();
        assert_eq!(flat.get("headings"), Some(&MetadataValue::from("h1: Eligibility")));

        let flat = flatten_chunk_metadata(&meta(vec![
            Heading::new("h1", "Eligibility"),
            Heading::new("h2", "Fees"),
        ]))
        .unwrap();
        assert_eq!(get_str(&flat, "headings", ""), "h1: Eligibility; h2: Fees");
    }

    #[test]
    fn scalars_pass_through_and_empty_lists_become_blank() {
        let flat = flatten_chunk_metadata(&meta(vec![])).unwrap();
        assert_eq!(flat.get("chunk_index"), Some(&MetadataValue::Int(2)));
        assert_eq!(flat.get("total_chunks"), Some(&MetadataValue::Int(5)));
        assert_eq!(get_str(&flat, "category", "general"), "employment_passes");
        assert_eq!(get_str(&flat, "headings", "x"), "");
        assert_eq!(flat.len(), 7);
    }

    #[test]
    fn other_structures_become_json_strings() {
        let map = json!({
            "links": ["a", "b"],
            "extra": {"k": 1},
            "score": 0.5,
            "flag": true,
            "none": null
        });
        let flat = match map {
            Value::Object(m) => flatten_map(m),
            _ => unreachable!(),
        };
        assert_eq!(get_str(&flat, "links", ""), r#"["a","b"]"#);
        assert_eq!(get_str(&flat, "extra", ""), r#"{"k":1}"#);
        assert_eq!(flat.get("score"), Some(&MetadataValue::Float(0.5)));
        assert_eq!(flat.get("flag"), Some(&MetadataValue::Bool(true)));
        assert_eq!(flat.get("none"), Some(&MetadataValue::Null));
    }

    #[test]
    fn flat_record_survives_json_round_trip() {
        let flat = flatten_chunk_metadata(&meta(vec![Heading::new("h1", "Eligibility")])).unwrap();
        let raw = serde_json::to_string(&flat).unwrap();
        let back: FlatMetadata = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, flat);
    }
}
