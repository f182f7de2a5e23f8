//! The extracted sampler record.
//!
//! One [`SamplerRecord`] is produced per sampling node found in a document.
//! Records are immutable once returned; the caller decides whether to
//! persist or discard them. `(file_id, sampler_index)` is the uniqueness
//! key once stored.

use serde::{Deserialize, Serialize};

/// Generation parameters recovered for one sampling operation.
///
/// Every field except `sampler_index` is best-effort: a failure to resolve
/// one field never prevents extraction of the others, so partially-`None`
/// records are normal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerRecord {
    /// 0-based position of this sampler within its file, ordered by numeric
    /// node id. Stable across re-extraction of an unchanged document.
    pub sampler_index: u32,
    /// Model name with directory and extension stripped.
    pub model_name: Option<String>,
    /// Sampler algorithm name (e.g. "euler", "dpmpp_2m").
    pub sampler_name: Option<String>,
    /// Scheduler name (e.g. "normal", "karras").
    pub scheduler: Option<String>,
    /// Positive prompt text; multiple prompts are joined with `\n---\n`.
    pub positive_prompt: String,
    /// Negative prompt text; multiple prompts are joined with `\n---\n`.
    pub negative_prompt: String,
    /// Output width in pixels.
    pub width: Option<u32>,
    /// Output height in pixels.
    pub height: Option<u32>,
    /// Classifier-free guidance scale.
    pub cfg: Option<f64>,
    /// Number of denoising steps.
    pub steps: Option<u32>,
}
