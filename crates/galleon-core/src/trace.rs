//! Backward single-path traversal over a graph document.
//!
//! Each named input on a node has exactly one semantic source, so the
//! tracer follows a single chain backwards instead of fanning out
//! breadth-first (which would conflate unrelated branches). A hop budget
//! guards against cycles and pathological graphs.

use crate::doc::{GraphDocument, Node};

/// Default hop budget for a trace.
pub const DEFAULT_MAX_HOPS: usize = 20;

/// Borrowed traversal view over a [`GraphDocument`].
#[derive(Debug, Clone, Copy)]
pub struct GraphTracer<'a> {
    doc: &'a GraphDocument,
}

impl<'a> GraphTracer<'a> {
    /// Creates a tracer over the given document.
    pub fn new(doc: &'a GraphDocument) -> Self {
        GraphTracer { doc }
    }

    /// Traces `input_name` backwards from `start_id` to its ultimate source.
    ///
    /// At each hop: a node whose type is in `stop_at` is returned
    /// immediately; a node whose input resolves to no source (literal value
    /// or unconnected) is returned so the caller can read the literal off
    /// it; otherwise traversal continues from the source node. Returns None
    /// when the hop budget is exhausted (cycle guard) or a referenced node
    /// id is missing from the document.
    pub fn trace(
        &self,
        start_id: &str,
        input_name: &str,
        stop_at: &[&str],
        max_hops: usize,
    ) -> Option<&'a Node> {
        let mut current = start_id;

        for _ in 0..max_hops {
            let node = self.doc.node(current)?;

            if let Some(node_type) = node.node_type() {
                if stop_at.contains(&node_type) {
                    return Some(node);
                }
            }

            match self.doc.input_source(node, input_name) {
                None => return Some(node),
                Some(source) => current = source.id(),
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chain_doc() -> GraphDocument {
        // sampler(1) -model-> lora(2) -model-> lora(3) -model-> loader(4)
        GraphDocument::from_value(&json!({
            "1": {"class_type": "KSampler", "inputs": {"model": ["2", 0]}},
            "2": {"class_type": "LoraLoader", "inputs": {"model": ["3", 0]}},
            "3": {"class_type": "LoraLoader", "inputs": {"model": ["4", 0]}},
            "4": {"class_type": "CheckpointLoaderSimple",
                  "inputs": {"ckpt_name": "base.safetensors"}}
        }))
        .unwrap()
    }

    #[test]
    fn stops_at_target_type_through_chain() {
        let doc = chain_doc();
        let tracer = GraphTracer::new(&doc);
        let found = tracer
            .trace("1", "model", &["CheckpointLoaderSimple"], DEFAULT_MAX_HOPS)
            .unwrap();
        assert_eq!(found.id(), "4");
    }

    #[test]
    fn returns_dead_end_node_without_stop_match() {
        let doc = chain_doc();
        let tracer = GraphTracer::new(&doc);
        // No stop types: traversal ends where the input chain ends.
        let found = tracer.trace("1", "model", &[], DEFAULT_MAX_HOPS).unwrap();
        assert_eq!(found.id(), "4");
    }

    #[test]
    fn returns_start_node_when_input_is_literal() {
        let doc = chain_doc();
        let tracer = GraphTracer::new(&doc);
        let found = tracer
            .trace("4", "ckpt_name", &[], DEFAULT_MAX_HOPS)
            .unwrap();
        assert_eq!(found.id(), "4");
    }

    #[test]
    fn terminates_on_cycle_within_hop_budget() {
        let doc = GraphDocument::from_value(&json!({
            "a": {"class_type": "NodeA", "inputs": {"x": ["b", 0]}},
            "b": {"class_type": "NodeB", "inputs": {"x": ["a", 0]}}
        }))
        .unwrap();
        let tracer = GraphTracer::new(&doc);
        assert!(tracer.trace("a", "x", &[], DEFAULT_MAX_HOPS).is_none());
    }

    #[test]
    fn missing_node_id_is_not_found() {
        let doc = chain_doc();
        let tracer = GraphTracer::new(&doc);
        assert!(tracer.trace("99", "model", &[], DEFAULT_MAX_HOPS).is_none());
    }

    #[test]
    fn dangling_connection_target_is_not_found() {
        let doc = GraphDocument::from_value(&json!({
            "1": {"class_type": "KSampler", "inputs": {"model": ["77", 0]}}
        }))
        .unwrap();
        let tracer = GraphTracer::new(&doc);
        // The connection points at a node missing from the document; the
        // inline input lookup yields no source, so the start node itself is
        // the end of the chain.
        let found = tracer.trace("1", "model", &[], DEFAULT_MAX_HOPS).unwrap();
        assert_eq!(found.id(), "1");
    }
}
