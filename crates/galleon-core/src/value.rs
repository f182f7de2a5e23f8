//! Input-source variants and numeric coercions.
//!
//! An input slot on a graph node is either a literal parameter or a
//! connection to another node's output. The inline serialization encodes a
//! connection as a two-element `[node_id, slot]` array; anything else is a
//! literal. [`InputSource`] makes that distinction explicit instead of
//! probing JSON shapes at every call site.

use serde_json::Value;

/// A resolved input slot: a literal value or a connection to another node.
#[derive(Debug, Clone, PartialEq)]
pub enum InputSource {
    /// A literal parameter value carried directly on the node.
    Literal(Value),
    /// A connection to another node's output slot.
    Connection { node: String, slot: u32 },
}

impl InputSource {
    /// Classifies an inline-variant input value.
    ///
    /// A `[node_id, slot]` array is a connection; every other shape is a
    /// literal. The node id may arrive as a JSON string or number.
    pub fn from_inline(value: &Value) -> InputSource {
        if let Value::Array(items) = value {
            if let Some(node) = items.first().and_then(json_id) {
                let slot = items
                    .get(1)
                    .and_then(Value::as_u64)
                    .map(|s| s as u32)
                    .unwrap_or(0);
                return InputSource::Connection { node, slot };
            }
        }
        InputSource::Literal(value.clone())
    }

    /// Returns the connected node id, if this is a connection.
    pub fn connected_node(&self) -> Option<&str> {
        match self {
            InputSource::Connection { node, .. } => Some(node),
            InputSource::Literal(_) => None,
        }
    }
}

/// Normalizes a JSON id (string or number) to its string form.
pub fn json_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Coerces a JSON value to f64: numbers directly, strings by parsing.
///
/// Anything else (booleans, arrays, objects, unparseable strings) is None.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Coerces a JSON value to u32.
///
/// Fractional numbers truncate toward zero; numeric strings must parse as
/// integers; negative values are None.
pub fn coerce_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_u64() {
                u32::try_from(i).ok()
            } else {
                let f = n.as_f64()?;
                if f >= 0.0 && f < u32::MAX as f64 {
                    Some(f.trunc() as u32)
                } else {
                    None
                }
            }
        }
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inline_connection_is_classified() {
        let src = InputSource::from_inline(&json!(["4", 0]));
        assert_eq!(
            src,
            InputSource::Connection {
                node: "4".into(),
                slot: 0
            }
        );
    }

    #[test]
    fn inline_numeric_node_id_is_normalized() {
        let src = InputSource::from_inline(&json!([4, 1]));
        assert_eq!(src.connected_node(), Some("4"));
    }

    #[test]
    fn inline_scalar_is_literal() {
        assert_eq!(
            InputSource::from_inline(&json!(7.5)),
            InputSource::Literal(json!(7.5))
        );
        assert_eq!(
            InputSource::from_inline(&json!("euler")),
            InputSource::Literal(json!("euler"))
        );
    }

    #[test]
    fn coerce_f64_accepts_numbers_and_numeric_strings() {
        assert_eq!(coerce_f64(&json!(7.5)), Some(7.5));
        assert_eq!(coerce_f64(&json!(7)), Some(7.0));
        assert_eq!(coerce_f64(&json!("7.5")), Some(7.5));
        assert_eq!(coerce_f64(&json!("x")), None);
        assert_eq!(coerce_f64(&json!(true)), None);
    }

    #[test]
    fn coerce_u32_truncates_and_rejects_negatives() {
        assert_eq!(coerce_u32(&json!(20)), Some(20));
        assert_eq!(coerce_u32(&json!(20.9)), Some(20));
        assert_eq!(coerce_u32(&json!("20")), Some(20));
        assert_eq!(coerce_u32(&json!(-1)), None);
        assert_eq!(coerce_u32(&json!("20.5")), None);
    }
}
