//! Filter, sort, and pagination condition building.
//!
//! Queries against the files table are assembled from a [`FileFilter`].
//! Metadata criteria compile into a single `EXISTS` subquery over the
//! samplers table: the file qualifies when at least one of its samplers
//! matches all criteria, and — unlike a join — a file with several matching
//! samplers can never appear more than once in the result set.

use std::path::MAIN_SEPARATOR;

use rusqlite::types::Value as SqlValue;
use serde::Deserialize;

/// Criteria applied to a file's sampler metadata.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MetadataFilter {
    pub model: Option<String>,
    pub sampler: Option<String>,
    pub scheduler: Option<String>,
    pub cfg_min: Option<f64>,
    pub cfg_max: Option<f64>,
    pub steps_min: Option<i64>,
    pub steps_max: Option<i64>,
    pub width_min: Option<i64>,
    pub width_max: Option<i64>,
    pub height_min: Option<i64>,
    pub height_max: Option<i64>,
}

impl MetadataFilter {
    /// True when no criterion is set.
    pub fn is_empty(&self) -> bool {
        *self == MetadataFilter::default()
    }
}

/// Full filter state for a paginated file query.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    /// Scope to files under this absolute folder path.
    pub folder: Option<String>,
    /// Substring match against the file name.
    pub search: Option<String>,
    /// Only favorited files.
    pub favorites_only: bool,
    /// Filename prefixes (any may match).
    pub prefixes: Vec<String>,
    /// File extensions without the dot (any may match).
    pub extensions: Vec<String>,
    /// Sampler metadata criteria.
    pub metadata: MetadataFilter,
}

/// Sort column for paginated queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Name,
    #[default]
    Mtime,
}

impl SortKey {
    pub(crate) fn column(&self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Mtime => "mtime",
        }
    }
}

/// Sort direction for paginated queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    #[default]
    Desc,
}

impl SortDir {
    pub(crate) fn keyword(&self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

/// Builds the WHERE conditions and bound parameters for a filter.
///
/// Conditions reference the files table through the `f` alias; the caller
/// joins them with `AND`.
pub(crate) fn build_conditions(filter: &FileFilter) -> (Vec<String>, Vec<SqlValue>) {
    let mut conditions = Vec::new();
    let mut params: Vec<SqlValue> = Vec::new();

    if let Some(folder) = &filter.folder {
        conditions.push("f.path LIKE ?".to_string());
        params.push(SqlValue::Text(format!(
            "{}{}%",
            folder.trim_end_matches(MAIN_SEPARATOR),
            MAIN_SEPARATOR
        )));
    }

    if let Some((subquery, sub_params)) = metadata_subquery(&filter.metadata) {
        conditions.push(subquery);
        params.extend(sub_params);
    }

    if let Some(search) = filter.search.as_deref().map(str::trim) {
        if !search.is_empty() {
            conditions.push("f.name LIKE ?".to_string());
            params.push(SqlValue::Text(format!("%{search}%")));
        }
    }

    if filter.favorites_only {
        conditions.push("f.is_favorite = 1".to_string());
    }

    let prefixes: Vec<&str> = filter
        .prefixes
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect();
    if !prefixes.is_empty() {
        let clause = vec!["f.name LIKE ?"; prefixes.len()].join(" OR ");
        conditions.push(format!("({clause})"));
        for prefix in prefixes {
            params.push(SqlValue::Text(format!("{prefix}%")));
        }
    }

    let extensions: Vec<String> = filter
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect();
    if !extensions.is_empty() {
        let clause = vec!["f.name LIKE ?"; extensions.len()].join(" OR ");
        conditions.push(format!("({clause})"));
        for ext in extensions {
            params.push(SqlValue::Text(format!("%.{ext}")));
        }
    }

    (conditions, params)
}

/// Builds the EXISTS subquery for sampler-metadata criteria.
///
/// Returns None when no criterion is set.
fn metadata_subquery(filter: &MetadataFilter) -> Option<(String, Vec<SqlValue>)> {
    let mut conditions: Vec<&'static str> = Vec::new();
    let mut params: Vec<SqlValue> = Vec::new();

    if let Some(model) = &filter.model {
        conditions.push("s.model_name = ?");
        params.push(SqlValue::Text(model.clone()));
    }
    if let Some(sampler) = &filter.sampler {
        conditions.push("s.sampler_name = ?");
        params.push(SqlValue::Text(sampler.clone()));
    }
    if let Some(scheduler) = &filter.scheduler {
        conditions.push("s.scheduler = ?");
        params.push(SqlValue::Text(scheduler.clone()));
    }
    if let Some(cfg_min) = filter.cfg_min {
        conditions.push("s.cfg >= ?");
        params.push(SqlValue::Real(cfg_min));
    }
    if let Some(cfg_max) = filter.cfg_max {
        conditions.push("s.cfg <= ?");
        params.push(SqlValue::Real(cfg_max));
    }
    if let Some(steps_min) = filter.steps_min {
        conditions.push("s.steps >= ?");
        params.push(SqlValue::Integer(steps_min));
    }
    if let Some(steps_max) = filter.steps_max {
        conditions.push("s.steps <= ?");
        params.push(SqlValue::Integer(steps_max));
    }
    if let Some(width_min) = filter.width_min {
        conditions.push("s.width >= ?");
        params.push(SqlValue::Integer(width_min));
    }
    if let Some(width_max) = filter.width_max {
        conditions.push("s.width <= ?");
        params.push(SqlValue::Integer(width_max));
    }
    if let Some(height_min) = filter.height_min {
        conditions.push("s.height >= ?");
        params.push(SqlValue::Integer(height_min));
    }
    if let Some(height_max) = filter.height_max {
        conditions.push("s.height <= ?");
        params.push(SqlValue::Integer(height_max));
    }

    if conditions.is_empty() {
        return None;
    }
    let subquery = format!(
        "EXISTS (SELECT 1 FROM samplers s WHERE s.file_id = f.id AND {})",
        conditions.join(" AND ")
    );
    Some((subquery, params))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_builds_no_conditions() {
        let (conditions, params) = build_conditions(&FileFilter::default());
        assert!(conditions.is_empty());
        assert!(params.is_empty());
    }

    #[test]
    fn metadata_criteria_compile_into_one_exists_subquery() {
        let filter = FileFilter {
            metadata: MetadataFilter {
                sampler: Some("euler".into()),
                cfg_min: Some(5.0),
                ..Default::default()
            },
            ..Default::default()
        };
        let (conditions, params) = build_conditions(&filter);
        assert_eq!(conditions.len(), 1);
        assert!(conditions[0].starts_with("EXISTS (SELECT 1 FROM samplers"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn folder_scope_uses_path_prefix() {
        let filter = FileFilter {
            folder: Some("/data/out".into()),
            ..Default::default()
        };
        let (conditions, params) = build_conditions(&filter);
        assert_eq!(conditions, vec!["f.path LIKE ?".to_string()]);
        assert_eq!(params, vec![SqlValue::Text("/data/out/%".into())]);
    }

    #[test]
    fn extension_filters_normalize_dots_and_case() {
        let filter = FileFilter {
            extensions: vec![".PNG".into(), "webp".into(), "  ".into()],
            ..Default::default()
        };
        let (conditions, params) = build_conditions(&filter);
        assert_eq!(conditions.len(), 1);
        assert_eq!(
            params,
            vec![
                SqlValue::Text("%.png".into()),
                SqlValue::Text("%.webp".into())
            ]
        );
    }

    #[test]
    fn blank_search_is_ignored() {
        let filter = FileFilter {
            search: Some("   ".into()),
            ..Default::default()
        };
        let (conditions, _) = build_conditions(&filter);
        assert!(conditions.is_empty());
    }
}
