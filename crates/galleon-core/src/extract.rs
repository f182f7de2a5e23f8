//! Per-sampler metadata extraction.
//!
//! [`SamplerExtractor`] finds every sampling node in a document and
//! independently resolves each parameter for it: sampler/scheduler names,
//! the model loaded at the end of the `model` chain, positive/negative
//! prompt text, output dimensions, and cfg/steps. Each field is extracted
//! on its own so a failure in one never aborts the others; a record with
//! partial `None` fields is still returned.

use serde_json::Value;

use crate::doc::{GraphDocument, Node};
use crate::record::SamplerRecord;
use crate::tables::{
    DIMENSION_NODE_TYPES, MODEL_LOADER_TYPES, PROMPT_NODE_TYPES, SAMPLER_SELECT_TYPES,
    SAMPLER_TYPES, SCHEDULER_NODE_TYPES,
};
use crate::trace::{GraphTracer, DEFAULT_MAX_HOPS};
use crate::value::{coerce_f64, coerce_u32};

/// Orchestrates field extraction for every sampler node in a document.
pub struct SamplerExtractor<'a> {
    doc: &'a GraphDocument,
    tracer: GraphTracer<'a>,
    /// Pixel dimensions probed from the actual file, used when the graph
    /// does not resolve width/height.
    pixel_fallback: Option<(u32, u32)>,
}

impl<'a> SamplerExtractor<'a> {
    /// Creates an extractor over the document, with an optional pixel
    /// dimension fallback supplied by the caller.
    pub fn new(doc: &'a GraphDocument, pixel_fallback: Option<(u32, u32)>) -> Self {
        SamplerExtractor {
            doc,
            tracer: GraphTracer::new(doc),
            pixel_fallback,
        }
    }

    /// Extracts one record per sampler node.
    ///
    /// Sampler nodes are ordered by numeric node id (string ids that do not
    /// parse sort first), a deterministic heuristic for graph order. A
    /// document with no sampler nodes yields an empty list, not an error.
    pub fn extract_all(&self) -> Vec<SamplerRecord> {
        let mut samplers: Vec<&Node> = self
            .doc
            .nodes()
            .filter(|n| n.node_type().is_some_and(|t| SAMPLER_TYPES.contains(&t)))
            .collect();
        samplers.sort_by(|a, b| {
            numeric_id(a.id())
                .cmp(&numeric_id(b.id()))
                .then_with(|| a.id().cmp(b.id()))
        });

        samplers
            .iter()
            .enumerate()
            .map(|(index, node)| self.process_sampler(node, index as u32))
            .collect()
    }

    fn process_sampler(&self, node: &Node, index: u32) -> SamplerRecord {
        let (sampler_name, scheduler) = self.sampler_details(node);
        let model_name = self.model_name(node);
        let (positive_prompt, negative_prompt) = self.prompts(node);
        let (width, height) = self.dimensions(node);
        let (cfg, steps) = self.parameters(node);

        SamplerRecord {
            sampler_index: index,
            model_name,
            sampler_name,
            scheduler,
            positive_prompt,
            negative_prompt,
            width,
            height,
            cfg,
            steps,
        }
    }

    /// Sampler and scheduler names: direct parameter first, then the
    /// selector/scheduler helper node wired into `sampler`/`sigmas`.
    fn sampler_details(&self, node: &Node) -> (Option<String>, Option<String>) {
        let mut sampler_name = self.string_param(node, "sampler_name");
        let mut scheduler = self.string_param(node, "scheduler");

        if sampler_name.is_none() {
            sampler_name = self
                .tracer
                .trace(node.id(), "sampler", SAMPLER_SELECT_TYPES, DEFAULT_MAX_HOPS)
                .and_then(|selector| self.string_param(selector, "sampler_name"));
        }
        if scheduler.is_none() {
            scheduler = self
                .tracer
                .trace(node.id(), "sigmas", SCHEDULER_NODE_TYPES, DEFAULT_MAX_HOPS)
                .and_then(|sched| self.string_param(sched, "scheduler"));
        }

        (sampler_name, scheduler)
    }

    /// Model name: trace the `model` input through loader/LoRA chains to a
    /// loader node and read its name parameter, in priority order.
    fn model_name(&self, node: &Node) -> Option<String> {
        let loader = self
            .tracer
            .trace(node.id(), "model", MODEL_LOADER_TYPES, DEFAULT_MAX_HOPS)?;
        let name = ["ckpt_name", "unet_name", "model_name", "clip_name1"]
            .iter()
            .find_map(|param| self.string_param(loader, param))?;
        Some(basename_no_ext(&name))
    }

    /// Positive/negative prompt text from the encoder nodes wired into the
    /// conditioning inputs. Multiple prompts join with `\n---\n`.
    fn prompts(&self, node: &Node) -> (String, String) {
        let mut positive = Vec::new();
        let mut negative = Vec::new();

        if let Some(encoder) =
            self.tracer
                .trace(node.id(), "positive", PROMPT_NODE_TYPES, DEFAULT_MAX_HOPS)
        {
            if let Some(text) = self.nonempty_text(encoder) {
                positive.push(text);
            }
        }
        if let Some(encoder) =
            self.tracer
                .trace(node.id(), "negative", PROMPT_NODE_TYPES, DEFAULT_MAX_HOPS)
        {
            if let Some(text) = self.nonempty_text(encoder) {
                negative.push(text);
            }
        }

        (positive.join("\n---\n"), negative.join("\n---\n"))
    }

    /// Output dimensions from the latent generator, else the file's actual
    /// pixel size.
    fn dimensions(&self, node: &Node) -> (Option<u32>, Option<u32>) {
        let mut width = None;
        let mut height = None;

        if let Some(latent) = self
            .tracer
            .trace(node.id(), "latent_image", &[], DEFAULT_MAX_HOPS)
        {
            if latent
                .node_type()
                .is_some_and(|t| DIMENSION_NODE_TYPES.contains(&t))
            {
                width = self.u32_param(latent, "width");
                height = self.u32_param(latent, "height");
            }
        }

        if width.is_none() || height.is_none() {
            if let Some((w, h)) = self.pixel_fallback {
                return (Some(w), Some(h));
            }
        }

        (width, height)
    }

    /// cfg and steps, with steps falling back to the scheduler node.
    fn parameters(&self, node: &Node) -> (Option<f64>, Option<u32>) {
        let cfg = self.doc.param_value(node, "cfg").and_then(coerce_f64);
        let mut steps = self.u32_param(node, "steps");

        if steps.is_none() {
            steps = self
                .tracer
                .trace(node.id(), "sigmas", SCHEDULER_NODE_TYPES, DEFAULT_MAX_HOPS)
                .and_then(|sched| self.u32_param(sched, "steps"));
        }

        (cfg, steps)
    }

    fn string_param(&self, node: &Node, param: &str) -> Option<String> {
        self.doc
            .param_value(node, param)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn u32_param(&self, node: &Node, param: &str) -> Option<u32> {
        self.doc.param_value(node, param).and_then(coerce_u32)
    }

    fn nonempty_text(&self, node: &Node) -> Option<String> {
        self.string_param(node, "text")
            .filter(|t| !t.trim().is_empty())
    }
}

fn numeric_id(id: &str) -> i64 {
    id.parse().unwrap_or(0)
}

/// Strips directory components and the extension from a model path.
fn basename_no_ext(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name);
    match base.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => base.to_string(),
    }
}
