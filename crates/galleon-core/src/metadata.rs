//! Metadata extraction entry point and payload detection.
//!
//! Embedded metadata is frequently malformed, truncated, or wrapped in one
//! of several envelope shapes. [`MetadataService::extract`] parses raw
//! bytes, detects where the actual graph payload lives, and returns zero
//! or more [`SamplerRecord`]s — it never errors out of this boundary, since
//! one bad file must not abort the processing of the rest.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::doc::GraphDocument;
use crate::extract::SamplerExtractor;
use crate::record::SamplerRecord;

/// Which envelope shape the payload was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedFormat {
    /// A nested `prompt` (or `Prompt`) object held the inline payload.
    NestedPrompt,
    /// Linked shape whose `extra.prompt` carried an embedded inline payload.
    LinkedEmbedded,
    /// Linked shape used directly.
    Linked,
    /// The root itself was an inline node map.
    Inline,
}

impl DetectedFormat {
    /// Stable label for logs and debug artifacts.
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectedFormat::NestedPrompt => "nested_prompt",
            DetectedFormat::LinkedEmbedded => "linked_embedded",
            DetectedFormat::Linked => "linked",
            DetectedFormat::Inline => "inline",
        }
    }
}

/// Sink for intermediate extraction artifacts.
///
/// Implementations receive each stage of processing for one file. The
/// service holds the sink behind an `Option`, so a disabled sink costs a
/// single branch per stage and is never on the hot path in production.
pub trait DebugSink: Send + Sync {
    /// Records one named stage for the given file label.
    fn record(&self, label: &str, stage: &str, payload: &Value);
}

/// Top-level metadata extraction service.
///
/// Stateless apart from the optional debug sink; one instance is shared by
/// all extraction workers.
#[derive(Clone, Default)]
pub struct MetadataService {
    debug: Option<Arc<dyn DebugSink>>,
}

impl MetadataService {
    /// Creates a service with debugging disabled.
    pub fn new() -> Self {
        MetadataService { debug: None }
    }

    /// Creates a service that records every stage to the given sink.
    pub fn with_debug_sink(sink: Arc<dyn DebugSink>) -> Self {
        MetadataService { debug: Some(sink) }
    }

    /// Extracts sampler records from raw embedded-metadata bytes.
    ///
    /// `pixel_fallback` is the file's actual pixel size, used when the
    /// graph does not resolve output dimensions. Parse failures and
    /// unrecognized payload shapes yield an empty list.
    pub fn extract(&self, raw: &[u8], pixel_fallback: Option<(u32, u32)>) -> Vec<SamplerRecord> {
        self.extract_named("unnamed", raw, pixel_fallback)
    }

    /// Like [`extract`](Self::extract), labeling debug artifacts with the
    /// originating file name.
    pub fn extract_named(
        &self,
        label: &str,
        raw: &[u8],
        pixel_fallback: Option<(u32, u32)>,
    ) -> Vec<SamplerRecord> {
        if raw.is_empty() {
            return Vec::new();
        }
        self.stage(label, "01_raw", || {
            Value::String(String::from_utf8_lossy(raw).into_owned())
        });

        let Ok(root) = serde_json::from_slice::<Value>(raw) else {
            return Vec::new();
        };
        self.stage(label, "02_parsed", || root.clone());

        let Some((payload, format)) = detect_payload(&root) else {
            self.stage(label, "03_format", || json!({ "detected": "unknown" }));
            return Vec::new();
        };
        self.stage(label, "03_format", || json!({ "detected": format.as_str() }));
        self.stage(label, "04_parser_input", || payload.clone());

        let Ok(doc) = GraphDocument::from_value(payload) else {
            return Vec::new();
        };
        let records = SamplerExtractor::new(&doc, pixel_fallback).extract_all();

        self.stage(label, "05_parser_output", || {
            json!({
                "format": format.as_str(),
                "samplers_found": records.len(),
                "records": &records,
            })
        });

        records
    }

    fn stage(&self, label: &str, name: &str, payload: impl FnOnce() -> Value) {
        if let Some(sink) = &self.debug {
            sink.record(label, name, &payload());
        }
    }
}

/// Locates the graph payload inside an envelope, in priority order:
///
/// 1. a nested `prompt`/`Prompt` object;
/// 2. the linked shape (top-level `nodes` array), preferring an embedded
///    `extra.prompt` inline payload when one is present;
/// 3. a root that itself validates as an inline node map (sampled values
///    all carry `class_type`).
pub fn detect_payload(root: &Value) -> Option<(&Value, DetectedFormat)> {
    let obj = root.as_object()?;

    for key in ["prompt", "Prompt"] {
        if let Some(nested) = obj.get(key) {
            if nested.is_object() {
                return Some((nested, DetectedFormat::NestedPrompt));
            }
        }
    }

    if matches!(obj.get("nodes"), Some(Value::Array(_))) {
        if let Some(embedded) = obj
            .get("extra")
            .and_then(Value::as_object)
            .and_then(|extra| extra.get("prompt"))
            .filter(|p| p.is_object())
        {
            return Some((embedded, DetectedFormat::LinkedEmbedded));
        }
        return Some((root, DetectedFormat::Linked));
    }

    if !obj.is_empty() {
        let sampled: Vec<&serde_json::Map<String, Value>> =
            obj.values().filter_map(Value::as_object).take(3).collect();
        if !sampled.is_empty() && sampled.iter().all(|n| n.contains_key("class_type")) {
            return Some((root, DetectedFormat::Inline));
        }
    }

    None
}
