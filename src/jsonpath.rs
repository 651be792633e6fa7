//! Restricted JSONPath evaluation.
//!
//! Supports the dotted/bracket subset only: `$.key.sub[0].name`, bare
//! `[idx]` indexing, and a syntactic `[*]` wildcard that leaves the
//! undiscriminated collection in place. No filters, no recursive descent.

use crate::error::ResolveError;
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    /// `key`
    Key(String),
    /// `key[3]`
    KeyIndex(String, usize),
    /// bare `[3]` against the current collection
    Index(usize),
    /// `key[*]` — descends into `key`, keeps the whole collection
    KeyWildcard(String),
    /// bare `[*]` — keeps the current collection
    Wildcard,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsonPathExpr {
    pub segments: Vec<PathSegment>,
}

/// Optional trailing transform applied to the final resolved value.
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    Sum,
    Join(String),
    Bool { yes: String, no: String },
}

/// Parse a `$.`-rooted path expression.
pub fn parse_path(path: &str) -> Result<JsonPathExpr, ResolveError> {
    let rest = path
        .trim()
        .strip_prefix("$.")
        .ok_or_else(|| ResolveError::InvalidPath(path.trim().to_string()))?;

    let mut segments = Vec::new();
    for part in rest.split('.') {
        if part.is_empty() {
            return Err(ResolveError::InvalidPath(path.trim().to_string()));
        }
        segments.push(parse_segment(part, path)?);
    }
    Ok(JsonPathExpr { segments })
}

fn parse_segment(part: &str, whole_path: &str) -> Result<PathSegment, ResolveError> {
    let Some(open) = part.find('[') else {
        return Ok(PathSegment::Key(part.to_string()));
    };
    if !part.ends_with(']') {
        return Err(ResolveError::InvalidPath(whole_path.trim().to_string()));
    }

    let key = &part[..open];
    let index_str = &part[open + 1..part.len() - 1];

    if index_str == "*" {
        return Ok(if key.is_empty() {
            PathSegment::Wildcard
        } else {
            PathSegment::KeyWildcard(key.to_string())
        });
    }

    let index: usize = index_str
        .parse()
        .map_err(|_| ResolveError::InvalidPath(whole_path.trim().to_string()))?;
    Ok(if key.is_empty() {
        PathSegment::Index(index)
    } else {
        PathSegment::KeyIndex(key.to_string(), index)
    })
}

/// Parse the optional third placeholder argument into a transform.
pub fn parse_transform(spec: &str) -> Result<Transform, ResolveError> {
    let spec = spec.trim();
    let upper = spec.to_uppercase();
    if upper == "SUM" {
        return Ok(Transform::Sum);
    }
    if upper.starts_with("JOIN(") && spec.ends_with(')') {
        return Ok(Transform::Join(spec[5..spec.len() - 1].to_string()));
    }
    if upper.starts_with("BOOL(") && spec.ends_with(')') {
        let inner = &spec[5..spec.len() - 1];
        let (yes, no) = inner.split_once('/').unwrap_or((inner, "No"));
        return Ok(Transform::Bool {
            yes: if yes.is_empty() { "Yes".to_string() } else { yes.to_string() },
            no: no.to_string(),
        });
    }
    Err(ResolveError::Malformed(format!("JSON transform: {spec}")))
}

/// Walk the document left to right along the path segments.
///
/// Wildcards leave the undiscriminated collection in place; there is no
/// per-element key mapping behind them.
pub fn evaluate<'a>(doc: &'a Value, expr: &JsonPathExpr) -> Result<&'a Value, ResolveError> {
    let mut current = doc;
    for segment in &expr.segments {
        current = match segment {
            PathSegment::Key(key) => descend(current, key)?,
            PathSegment::KeyIndex(key, index) => index_into(descend(current, key)?, *index, key)?,
            PathSegment::Index(index) => index_into(current, *index, "value")?,
            PathSegment::KeyWildcard(key) => {
                let inner = descend(current, key)?;
                if !inner.is_array() {
                    return Err(ResolveError::NotACollection(key.clone()));
                }
                inner
            }
            PathSegment::Wildcard => {
                if !current.is_array() {
                    return Err(ResolveError::NotACollection("value".to_string()));
                }
                current
            }
        };
    }
    Ok(current)
}

fn descend<'a>(current: &'a Value, key: &str) -> Result<&'a Value, ResolveError> {
    current
        .as_object()
        .and_then(|map| map.get(key))
        .ok_or_else(|| ResolveError::KeyNotFound(key.to_string()))
}

fn index_into<'a>(current: &'a Value, index: usize, name: &str) -> Result<&'a Value, ResolveError> {
    let array = current
        .as_array()
        .ok_or_else(|| ResolveError::NotACollection(name.to_string()))?;
    array.get(index).ok_or(ResolveError::IndexOutOfRange(index))
}

/// Apply a transform to the final value, producing its string form.
pub fn apply_transform(value: &Value, transform: &Transform) -> Result<String, ResolveError> {
    match transform {
        Transform::Sum => {
            let array = value.as_array().ok_or_else(|| {
                ResolveError::TransformFailure("SUM requires an array".to_string())
            })?;
            let mut total = 0.0;
            for element in array {
                if element.is_null() {
                    continue;
                }
                total += coerce_number(element).ok_or_else(|| {
                    ResolveError::TransformFailure(format!(
                        "cannot SUM non-numeric value: {}",
                        render(element)
                    ))
                })?;
            }
            Ok(render_number(total))
        }
        Transform::Join(delimiter) => match value.as_array() {
            Some(array) => Ok(array
                .iter()
                .filter(|v| !v.is_null())
                .map(render)
                .collect::<Vec<_>>()
                .join(delimiter)),
            None => Ok(render(value)),
        },
        Transform::Bool { yes, no } => {
            let truthy = match value {
                Value::Bool(b) => *b,
                Value::String(s) => {
                    matches!(s.to_lowercase().as_str(), "true" | "yes" | "1" | "on")
                }
                Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
                _ => false,
            };
            Ok(if truthy { yes.clone() } else { no.clone() })
        }
    }
}

/// Numeric coercion for SUM: numbers directly, strings after stripping
/// currency symbols and thousands separators.
fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let stripped: String = s
                .chars()
                .filter(|c| !matches!(c, '$' | '€' | '£' | '¥' | ','))
                .collect();
            stripped.trim().parse().ok()
        }
        _ => None,
    }
}

/// String form of a resolved JSON value for substitution into text.
pub fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n
            .as_f64()
            .map(render_number)
            .unwrap_or_else(|| n.to_string()),
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

fn render_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Load and decode a JSON file for a `JSON!` placeholder.
pub fn load_json(path: &Path) -> Result<Value, ResolveError> {
    let content = std::fs::read_to_string(path)
        .map_err(|_| ResolveError::MissingFile(path.display().to_string()))?;
    serde_json::from_str(&content)
        .map_err(|_| ResolveError::BadJson(path.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_path() {
        let expr = parse_path("$.items[1].price").unwrap();
        assert_eq!(
            expr.segments,
            vec![
                PathSegment::KeyIndex("items".to_string(), 1),
                PathSegment::Key("price".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_path_requires_root() {
        assert!(matches!(
            parse_path("items.price"),
            Err(ResolveError::InvalidPath(_))
        ));
        assert!(matches!(parse_path("$."), Err(ResolveError::InvalidPath(_))));
    }

    #[test]
    fn test_evaluate_nested_index() {
        let doc = json!({"items": [{"price": 5}, {"price": 7}]});
        let expr = parse_path("$.items[1].price").unwrap();
        assert_eq!(evaluate(&doc, &expr).unwrap(), &json!(7));
    }

    #[test]
    fn test_evaluate_diagnostics_are_distinct() {
        let doc = json!({"a": {"b": 1}, "list": [1, 2]});
        assert_eq!(
            evaluate(&doc, &parse_path("$.missing").unwrap()),
            Err(ResolveError::KeyNotFound("missing".to_string()))
        );
        assert_eq!(
            evaluate(&doc, &parse_path("$.a[0]").unwrap()),
            Err(ResolveError::NotACollection("a".to_string()))
        );
        assert_eq!(
            evaluate(&doc, &parse_path("$.list[9]").unwrap()),
            Err(ResolveError::IndexOutOfRange(9))
        );
    }

    #[test]
    fn test_wildcard_keeps_collection() {
        let doc = json!({"names": ["a", "b"]});
        let expr = parse_path("$.names[*]").unwrap();
        assert_eq!(evaluate(&doc, &expr).unwrap(), &json!(["a", "b"]));
    }

    #[test]
    fn test_wildcard_has_no_element_mapping() {
        // Restricted semantics: a key behind a wildcard is not projected
        // over the elements, it is a plain lookup against the array.
        let doc = json!({"lines": [{"amount": 100}]});
        let expr = parse_path("$.lines[*].amount").unwrap();
        assert_eq!(
            evaluate(&doc, &expr),
            Err(ResolveError::KeyNotFound("amount".to_string()))
        );
    }

    #[test]
    fn test_sum_with_string_coercion() {
        let value = json!([1, "2", 3]);
        assert_eq!(apply_transform(&value, &Transform::Sum).unwrap(), "6");

        let money = json!(["$1,000.50", 0.5]);
        assert_eq!(apply_transform(&money, &Transform::Sum).unwrap(), "1001");
    }

    #[test]
    fn test_sum_rejects_non_numeric() {
        let value = json!([1, "apple"]);
        assert!(matches!(
            apply_transform(&value, &Transform::Sum),
            Err(ResolveError::TransformFailure(_))
        ));
    }

    #[test]
    fn test_join() {
        let value = json!(["a", "b", "c"]);
        let t = parse_transform("JOIN(, )").unwrap();
        assert_eq!(apply_transform(&value, &t).unwrap(), "a, b, c");
        // Scalar join stringifies.
        assert_eq!(apply_transform(&json!(42), &t).unwrap(), "42");
    }

    #[test]
    fn test_bool_coercions() {
        let t = parse_transform("BOOL(Active/Inactive)").unwrap();
        assert_eq!(apply_transform(&json!(true), &t).unwrap(), "Active");
        assert_eq!(apply_transform(&json!("YES"), &t).unwrap(), "Active");
        assert_eq!(apply_transform(&json!(0), &t).unwrap(), "Inactive");
        assert_eq!(apply_transform(&json!("off"), &t).unwrap(), "Inactive");
    }

    #[test]
    fn test_render_scalars() {
        assert_eq!(render(&json!("text")), "text");
        assert_eq!(render(&json!(7)), "7");
        assert_eq!(render(&json!(7.5)), "7.5");
        assert_eq!(render(&json!(null)), "");
        assert_eq!(render(&json!([1, 2])), "[1,2]");
    }
}
