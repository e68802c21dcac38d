use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use membench_core::{read_jsonl_dir, JsonlLoad};
use membench_types::{IngestionRecord, SearchEntry, Task};
use serde_json::Value;
use tracing::{info, warn};

pub(crate) fn load_ingestion_tasks(data_dir: &Path) -> Result<Vec<Task>> {
    let load = read_jsonl_dir::<IngestionRecord>(data_dir)
        .with_context(|| format!("failed to load ingestion records from {}", data_dir.display()))?;
    log_load("ingestion", data_dir, &load);
    Ok(load.records.into_iter().map(Task::from).collect())
}

pub(crate) fn load_search_entries(data_dir: &Path) -> Result<Vec<SearchEntry>> {
    let load = read_jsonl_dir::<SearchEntry>(data_dir)
        .with_context(|| format!("failed to load search entries from {}", data_dir.display()))?;
    log_load("search", data_dir, &load);
    Ok(load.records)
}

fn log_load<T>(kind: &str, data_dir: &Path, load: &JsonlLoad<T>) {
    info!(
        kind,
        dir = %data_dir.display(),
        files = load.files,
        records = load.records.len(),
        skipped = load.skipped.len(),
        "loaded task source"
    );
}

/// Keeps entries whose id starts with one of `categories`. `all` or nothing keeps everything.
pub(crate) fn filter_by_category(entries: Vec<SearchEntry>, categories: &[String]) -> Vec<SearchEntry> {
    let prefixes = categories
        .iter()
        .map(|category| category.trim())
        .filter(|category| !category.is_empty())
        .collect::<Vec<_>>();
    if prefixes.is_empty() || prefixes.iter().any(|prefix| prefix.eq_ignore_ascii_case("all")) {
        return entries;
    }
    entries
        .into_iter()
        .filter(|entry| prefixes.iter().any(|prefix| entry.id.starts_with(prefix)))
        .collect()
}

/// Keeps entries named in `ids`, warning about ids with no entry.
pub(crate) fn select_ids(entries: Vec<SearchEntry>, ids: &[String]) -> Vec<SearchEntry> {
    let wanted = ids.iter().map(String::as_str).collect::<HashSet<_>>();
    let selected = entries
        .into_iter()
        .filter(|entry| wanted.contains(entry.id.as_str()))
        .collect::<Vec<_>>();
    let found = selected
        .iter()
        .map(|entry| entry.id.as_str())
        .collect::<HashSet<_>>();
    let missing = wanted.difference(&found).count();
    if missing > 0 {
        warn!(missing, "ids named for this run have no matching entry");
    }
    selected
}

pub(crate) fn read_ids_file(path: &Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read ids file {}", path.display()))?;
    parse_ids(&raw).with_context(|| format!("invalid ids file {}", path.display()))
}

/// Accepts a JSON array of ids, a JSON object whose values are id arrays, or one id per line.
pub(crate) fn parse_ids(raw: &str) -> Result<Vec<String>> {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        let value = serde_json::from_str::<Value>(trimmed).context("failed to parse JSON")?;
        return match value {
            Value::Array(items) => ids_from_array(&items),
            Value::Object(groups) => {
                let mut ids = Vec::new();
                for (group, items) in &groups {
                    let Some(items) = items.as_array() else {
                        bail!("value for '{group}' must be an array of ids");
                    };
                    ids.extend(ids_from_array(items)?);
                }
                Ok(ids)
            }
            other => bail!("expected an array or object of ids, got {other}"),
        };
    }
    Ok(trimmed
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn ids_from_array(items: &[Value]) -> Result<Vec<String>> {
    items
        .iter()
        .map(|item| match item {
            Value::String(id) => Ok(id.clone()),
            other => bail!("ids must be strings, got {other}"),
        })
        .collect()
}
