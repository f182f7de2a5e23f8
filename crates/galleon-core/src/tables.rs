//! Node-type constants and positional widget fallbacks.
//!
//! These tables are curated from real-world generation graphs. They decide
//! which nodes count as samplers (versus helpers that merely select a
//! name), which nodes load models, which encode prompts, and where known
//! node types keep their widget values when the serialization addresses
//! them by position instead of by name.

/// Revision of the fallback tables below. Bumped whenever a node type or
/// positional mapping is added, so stored extraction results can be traced
/// back to the table that produced them.
pub const FALLBACK_TABLE_REVISION: u32 = 1;

/// Node types that perform actual sampling operations.
///
/// Helper nodes like `KSamplerSelect` (which only provide a sampler name)
/// are deliberately excluded.
pub const SAMPLER_TYPES: &[&str] = &[
    "KSampler",
    "KSamplerAdvanced",
    "SamplerCustom",
    "SamplerCustomAdvanced",
    "KSamplerEfficient",
    "DetailerForEach",
    "SamplerDPMPP_2M_SDE",
    "WanVideoSampler",
    "UltimateSDUpscale",
];

/// Model loader node types (checkpoints, UNETs, diffusion models).
pub const MODEL_LOADER_TYPES: &[&str] = &[
    "CheckpointLoaderSimple",
    "CheckpointLoader",
    "Load Checkpoint",
    "UNETLoader",
    "Load Diffusion Model",
    "UnetLoaderGGUF",
    "DualCLIPLoader",
];

/// Text-encoding node types for prompts.
pub const PROMPT_NODE_TYPES: &[&str] = &[
    "CLIPTextEncode",
    "CLIP Text Encode (Prompt)",
    "TextEncodeQwenImageEditPlus",
    "CLIPTextEncodeSDXL",
    "CLIPTextEncodeSDXLRefiner",
];

/// Scheduler node types (provide scheduling algorithms via `sigmas`).
pub const SCHEDULER_NODE_TYPES: &[&str] = &[
    "BasicScheduler",
    "KarrasScheduler",
    "ExponentialScheduler",
    "SgmUniformScheduler",
];

/// Sampler-selection node types (provide sampler names, not sampling).
pub const SAMPLER_SELECT_TYPES: &[&str] = &["KSamplerSelect"];

/// Latent/dimension-providing node types read for width/height.
pub const DIMENSION_NODE_TYPES: &[&str] =
    &["EmptyLatentImage", "EmptySD3LatentImage", "WanImageToVideo"];

/// Prefix shared by reusable constant-value node types.
pub const PRIMITIVE_PREFIX: &str = "Primitive";

/// Positional widget index for known node types.
///
/// The linked serialization stores widget values in an ordered array and
/// (sometimes) ships a per-node name-to-index map. When that map is absent
/// or incomplete, these hard-coded positions cover the node types whose
/// layouts are stable.
pub fn fallback_widget_index(node_type: &str, param: &str) -> Option<usize> {
    match node_type {
        "KSampler" | "KSamplerAdvanced" => match param {
            "seed" => Some(0),
            "control_after_generate" => Some(1),
            "steps" => Some(2),
            "cfg" => Some(3),
            "sampler_name" => Some(4),
            "scheduler" => Some(5),
            "denoise" => Some(6),
            _ => None,
        },
        "CLIPTextEncode" if param == "text" => Some(0),
        "CheckpointLoaderSimple" if param == "ckpt_name" => Some(0),
        "EmptyLatentImage" | "EmptySD3LatentImage" => match param {
            "width" => Some(0),
            "height" => Some(1),
            "batch_size" => Some(2),
            _ => None,
        },
        "DualCLIPLoader" => match param {
            "clip_name1" => Some(0),
            "clip_name2" => Some(1),
            "type" => Some(2),
            _ => None,
        },
        "UNETLoader" if param == "unet_name" => Some(0),
        t if t.starts_with(PRIMITIVE_PREFIX) && param == "value" => Some(0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampler_types_exclude_selector_helpers() {
        assert!(SAMPLER_TYPES.contains(&"KSampler"));
        assert!(!SAMPLER_TYPES.contains(&"KSamplerSelect"));
    }

    #[test]
    fn ksampler_positions_match_widget_layout() {
        assert_eq!(fallback_widget_index("KSampler", "steps"), Some(2));
        assert_eq!(fallback_widget_index("KSampler", "cfg"), Some(3));
        assert_eq!(fallback_widget_index("KSampler", "sampler_name"), Some(4));
        assert_eq!(fallback_widget_index("KSampler", "scheduler"), Some(5));
        assert_eq!(fallback_widget_index("KSampler", "text"), None);
    }

    #[test]
    fn primitive_family_exposes_value_at_zero() {
        assert_eq!(fallback_widget_index("PrimitiveInt", "value"), Some(0));
        assert_eq!(fallback_widget_index("PrimitiveNode", "value"), Some(0));
        assert_eq!(fallback_widget_index("PrimitiveInt", "other"), None);
    }

    #[test]
    fn unknown_node_type_has_no_positions() {
        assert_eq!(fallback_widget_index("VAEDecode", "samples"), None);
    }
}
