//! GraphDocument: normalization of two graph serializations.
//!
//! A generation graph arrives in one of two shapes:
//!
//! - **Linked**: a top-level `nodes` array where each node addresses widget
//!   values by position and references inputs through a separate link table
//!   (`links`), optionally accompanied by a per-node `widget_idx_map` that
//!   translates parameter names to widget positions.
//! - **Inline**: a map of node-id to node object carrying a `class_type`,
//!   where each input is either a literal value or a `[node_id, slot]`
//!   connection embedded inline.
//!
//! [`GraphDocument::from_value`] decides the variant once at construction
//! and exposes a single capability set — [`node_type`](Node::node_type),
//! [`input_source`](GraphDocument::input_source),
//! [`widget_value`](GraphDocument::widget_value) — so traversal code never
//! branches on the wire format.
//!
//! The document is immutable after construction and owned by the extraction
//! call that created it.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::GraphError;
use crate::tables::{fallback_widget_index, PRIMITIVE_PREFIX};
use crate::value::{json_id, InputSource};

/// One node of a normalized graph document.
#[derive(Debug, Clone)]
pub struct Node {
    id: String,
    node_type: Option<String>,
    payload: Payload,
}

/// Variant-specific node payload. Private: all access goes through the
/// document's capability methods.
#[derive(Debug, Clone)]
enum Payload {
    Linked {
        /// Ordered widget values, addressed by position.
        widgets: Vec<Value>,
        /// Named inputs, each optionally referencing the link table.
        inputs: Vec<LinkedInput>,
    },
    Inline {
        /// Named inputs: literal values or `[node_id, slot]` connections.
        inputs: serde_json::Map<String, Value>,
    },
}

#[derive(Debug, Clone)]
struct LinkedInput {
    name: String,
    link: Option<i64>,
}

/// Variant-wide state resolved once at construction.
#[derive(Debug, Clone)]
enum Variant {
    Linked {
        /// `link_id -> source node id`. The source output slot is carried in
        /// the wire format but unused by backward tracing.
        links: HashMap<i64, String>,
        /// Per-node parameter-name to widget-position map, when supplied.
        widget_index: HashMap<String, HashMap<String, usize>>,
    },
    Inline,
}

/// A normalized graph document over either serialization variant.
///
/// Node iteration order follows the wire payload (insertion order), which
/// keeps downstream ordering heuristics deterministic.
#[derive(Debug, Clone)]
pub struct GraphDocument {
    nodes: IndexMap<String, Node>,
    variant: Variant,
}

impl Node {
    /// The node's stable string id, unique within its document.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The node's type (class) name, if the payload carried one.
    pub fn node_type(&self) -> Option<&str> {
        self.node_type.as_deref()
    }
}

impl GraphDocument {
    /// Normalizes raw parsed JSON into a document.
    ///
    /// A top-level `nodes` array selects the linked variant; a non-empty
    /// object whose sampled values are node objects carrying `class_type`
    /// selects the inline variant. Anything else is
    /// [`GraphError::UnrecognizedFormat`] — callers treat that as "no
    /// metadata extractable", not as a fatal condition.
    pub fn from_value(value: &Value) -> Result<GraphDocument, GraphError> {
        let root = value.as_object().ok_or_else(|| GraphError::UnrecognizedFormat {
            reason: "payload root is not an object".to_string(),
        })?;

        if let Some(Value::Array(raw_nodes)) = root.get("nodes") {
            return Ok(Self::from_linked(root, raw_nodes));
        }
        Self::from_inline(root)
    }

    fn from_linked(root: &serde_json::Map<String, Value>, raw_nodes: &[Value]) -> GraphDocument {
        let mut nodes = IndexMap::new();
        for raw in raw_nodes.iter().filter_map(Value::as_object) {
            let Some(id) = raw.get("id").and_then(json_id) else {
                continue;
            };
            let widgets = raw
                .get("widgets_values")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            let inputs = raw
                .get("inputs")
                .and_then(Value::as_array)
                .map(|defs| {
                    defs.iter()
                        .filter_map(Value::as_object)
                        .filter_map(|def| {
                            let name = def.get("name")?.as_str()?.to_string();
                            let link = def.get("link").and_then(Value::as_i64);
                            Some(LinkedInput { name, link })
                        })
                        .collect()
                })
                .unwrap_or_default();
            let node_type = raw.get("type").and_then(Value::as_str).map(str::to_string);
            nodes.insert(
                id.clone(),
                Node {
                    id,
                    node_type,
                    payload: Payload::Linked { widgets, inputs },
                },
            );
        }

        // Each link is `[link_id, source_id, source_slot, target_id,
        // target_slot, type]`; only the first two matter for backward
        // resolution.
        let mut links = HashMap::new();
        if let Some(Value::Array(raw_links)) = root.get("links") {
            for link in raw_links.iter().filter_map(Value::as_array) {
                if link.len() < 3 {
                    continue;
                }
                let (Some(link_id), Some(source)) = (link[0].as_i64(), json_id(&link[1])) else {
                    continue;
                };
                links.insert(link_id, source);
            }
        }

        let mut widget_index = HashMap::new();
        if let Some(Value::Object(raw_map)) = root.get("widget_idx_map") {
            for (node_id, entry) in raw_map {
                let Some(params) = entry.as_object() else {
                    continue;
                };
                let per_node: HashMap<String, usize> = params
                    .iter()
                    .filter_map(|(name, idx)| {
                        idx.as_u64().map(|i| (name.clone(), i as usize))
                    })
                    .collect();
                widget_index.insert(node_id.clone(), per_node);
            }
        }

        GraphDocument {
            nodes,
            variant: Variant::Linked { links, widget_index },
        }
    }

    fn from_inline(root: &serde_json::Map<String, Value>) -> Result<GraphDocument, GraphError> {
        // Sampled validation: the first few object values must look like
        // node payloads (carry a class_type), otherwise this is some other
        // JSON object that happens to be non-empty.
        let sampled: Vec<&serde_json::Map<String, Value>> = root
            .values()
            .filter_map(Value::as_object)
            .take(3)
            .collect();
        if sampled.is_empty() || !sampled.iter().all(|n| n.contains_key("class_type")) {
            return Err(GraphError::UnrecognizedFormat {
                reason: "object values do not carry class_type".to_string(),
            });
        }

        let mut nodes = IndexMap::new();
        for (id, raw) in root {
            let Some(obj) = raw.as_object() else {
                continue;
            };
            let node_type = obj
                .get("class_type")
                .and_then(Value::as_str)
                .map(str::to_string);
            let inputs = obj
                .get("inputs")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            nodes.insert(
                id.clone(),
                Node {
                    id: id.clone(),
                    node_type,
                    payload: Payload::Inline { inputs },
                },
            );
        }

        Ok(GraphDocument {
            nodes,
            variant: Variant::Inline,
        })
    }

    // -----------------------------------------------------------------------
    // Capability set (variant-agnostic)
    // -----------------------------------------------------------------------

    /// Looks up a node by id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Iterates all nodes in wire order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Number of nodes in the document.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Resolves the source node feeding a named input, or None when the
    /// input is a literal value or unconnected.
    pub fn input_source<'s>(&'s self, node: &Node, input: &str) -> Option<&'s Node> {
        match (&node.payload, &self.variant) {
            (Payload::Linked { inputs, .. }, Variant::Linked { links, .. }) => {
                let def = inputs.iter().find(|i| i.name == input)?;
                let source_id = links.get(&def.link?)?;
                self.node(source_id)
            }
            (Payload::Inline { inputs }, _) => {
                let source = InputSource::from_inline(inputs.get(input)?);
                self.node(source.connected_node()?)
            }
            // A linked-payload node can only exist inside a linked document.
            (Payload::Linked { .. }, Variant::Inline) => None,
        }
    }

    /// Reads a literal widget/parameter value off a node.
    ///
    /// Linked variant: resolves the parameter name to a position via the
    /// document's widget-index map, falling back to the hard-coded tables
    /// for known node types. Inline variant: reads the input directly, but
    /// only when it is a literal (connections return None here).
    pub fn widget_value<'s>(&'s self, node: &'s Node, param: &str) -> Option<&'s Value> {
        match (&node.payload, &self.variant) {
            (Payload::Linked { widgets, .. }, Variant::Linked { widget_index, .. }) => {
                let position = widget_index
                    .get(&node.id)
                    .and_then(|per_node| per_node.get(param).copied())
                    .or_else(|| fallback_widget_index(node.node_type()?, param))?;
                widgets.get(position)
            }
            (Payload::Inline { inputs }, _) => {
                let value = inputs.get(param)?;
                if value.is_array() {
                    None
                } else {
                    Some(value)
                }
            }
            (Payload::Linked { .. }, Variant::Inline) => None,
        }
    }

    /// Universal parameter resolution: literal first, then a connected
    /// primitive-constant node's own literal.
    ///
    /// This handles graphs where users route shared parameters through
    /// reusable constant nodes. The literal always wins when present.
    pub fn param_value<'s>(&'s self, node: &'s Node, param: &str) -> Option<&'s Value> {
        if let Some(value) = self.widget_value(node, param) {
            return Some(value);
        }
        let source = self.input_source(node, param)?;
        if !source.node_type()?.starts_with(PRIMITIVE_PREFIX) {
            return None;
        }
        self.widget_value(source, "value")
    }
}
