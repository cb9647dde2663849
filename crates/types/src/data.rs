//! Dynamic slide data payload and path extraction.
//!
//! Collectors hand the scheduler a JSON object. Most collectors build it from
//! a typed struct, but the custom slide type extracts user-chosen parts of an
//! arbitrary response, so the payload stays schema-less at this boundary.

use serde_json::{Map, Value};

/// Data produced by a collector for one slide
pub type SlideData = Map<String, Value>;

/// Wrap any JSON value as slide data
///
/// Objects are used as-is; anything else is stored under a `value` key.
pub fn into_slide_data(value: Value) -> SlideData {
    match value {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}

/// One step of a parsed data path
#[derive(Debug, Clone, PartialEq)]
enum PathStep<'a> {
    Key(&'a str),
    Index(usize),
}

/// Parse a single dot-separated segment such as `items[0][2]` into steps.
fn parse_segment(segment: &str) -> Option<Vec<PathStep<'_>>> {
    let mut steps = Vec::new();
    let (key, mut rest) = match segment.find('[') {
        Some(pos) => (&segment[..pos], &segment[pos..]),
        None => (segment, ""),
    };
    if !key.is_empty() {
        steps.push(PathStep::Key(key));
    }
    while !rest.is_empty() {
        let close = rest.find(']')?;
        if !rest.starts_with('[') {
            return None;
        }
        let index = rest[1..close].trim().parse::<usize>().ok()?;
        steps.push(PathStep::Index(index));
        rest = &rest[close + 1..];
    }
    Some(steps)
}

/// Split on dots that are not inside brackets
fn split_segments(path: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in path.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '.' if depth == 0 => {
                segments.push(&path[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&path[start..]);
    segments
}

/// Extract a nested value using dot notation with optional array indices.
///
/// Supported forms:
/// - `$` or an empty path returns the whole value
/// - `cpu.percent` walks object keys
/// - `items[0].name` indexes into arrays
/// - `$.items[1]` with a leading root marker
///
/// Returns `None` when any step is missing, out of range, or `null`.
pub fn extract_path<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    let trimmed = path.trim().trim_start_matches(['$', '.']);
    if trimmed.is_empty() {
        return Some(data);
    }

    let mut current = data;
    for segment in split_segments(trimmed) {
        if segment.is_empty() {
            return None;
        }
        for step in parse_segment(segment)? {
            current = match step {
                PathStep::Key(key) => current.as_object()?.get(key)?,
                PathStep::Index(index) => current.as_array()?.get(index)?,
            };
        }
        if current.is_null() {
            return None;
        }
    }
    Some(current)
}
