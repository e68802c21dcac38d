use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use tracing::warn;

/// Line that could not be decoded and was left out of a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonlSkip {
    pub file: PathBuf,
    pub line: usize,
    pub reason: String,
}

/// Records decoded from one or more JSONL files.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonlLoad<T> {
    pub records: Vec<T>,
    pub skipped: Vec<JsonlSkip>,
    pub files: usize,
}

impl<T> Default for JsonlLoad<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: Vec::new(),
            files: 0,
        }
    }
}

/// Decodes every non-blank line of `path`. A missing file loads as empty.
pub fn read_jsonl_file<T: DeserializeOwned>(path: &Path) -> Result<JsonlLoad<T>> {
    let mut load = JsonlLoad::default();
    if !path.exists() {
        return Ok(load);
    }
    append_jsonl_file(path, &mut load)?;
    Ok(load)
}

/// Decodes all `*.jsonl` files directly under `dir`, in file-name order.
pub fn read_jsonl_dir<T: DeserializeOwned>(dir: &Path) -> Result<JsonlLoad<T>> {
    if !dir.is_dir() {
        bail!("directory {} does not exist", dir.display());
    }

    let mut files = std::fs::read_dir(dir)
        .with_context(|| format!("failed to list {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("jsonl"))
        })
        .collect::<Vec<_>>();
    files.sort();

    let mut load = JsonlLoad::default();
    if files.is_empty() {
        warn!(dir = %dir.display(), "no .jsonl files found");
        return Ok(load);
    }
    for file in &files {
        append_jsonl_file(file, &mut load)?;
    }
    Ok(load)
}

fn append_jsonl_file<T: DeserializeOwned>(path: &Path, load: &mut JsonlLoad<T>) -> Result<()> {
    let file =
        std::fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("failed to read {}", path.display()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(trimmed) {
            Ok(record) => load.records.push(record),
            Err(error) => {
                warn!(
                    file = %path.display(),
                    line = index + 1,
                    %error,
                    "skipping unparsable jsonl line"
                );
                load.skipped.push(JsonlSkip {
                    file: path.to_path_buf(),
                    line: index + 1,
                    reason: error.to_string(),
                });
            }
        }
    }
    load.files += 1;
    Ok(())
}

/// Reads trimmed, non-blank lines. A missing file reads as empty.
pub fn read_trimmed_lines(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::{read_jsonl_dir, read_jsonl_file, read_trimmed_lines};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        id: String,
    }

    #[test]
    fn reads_directory_in_file_name_order_and_skips_bad_lines() {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::write(temp.path().join("b.jsonl"), "{\"id\":\"b1\"}\n").expect("write b");
        std::fs::write(
            temp.path().join("a.jsonl"),
            "{\"id\":\"a1\"}\n\nnot json\n{\"id\":\"a2\"}\n",
        )
        .expect("write a");
        std::fs::write(temp.path().join("notes.txt"), "{\"id\":\"ignored\"}\n").expect("write txt");

        let load = read_jsonl_dir::<Row>(temp.path()).expect("load");
        let ids = load
            .records
            .iter()
            .map(|row| row.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["a1", "a2", "b1"]);
        assert_eq!(load.files, 2);
        assert_eq!(load.skipped.len(), 1);
        assert_eq!(load.skipped[0].line, 3);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let error = read_jsonl_dir::<Row>(&temp.path().join("absent")).expect_err("should fail");
        assert!(error.to_string().contains("does not exist"));
    }

    #[test]
    fn missing_file_and_empty_directory_load_empty() {
        let temp = tempfile::tempdir().expect("tempdir");
        let file_load = read_jsonl_file::<Row>(&temp.path().join("none.jsonl")).expect("file");
        assert!(file_load.records.is_empty());
        let dir_load = read_jsonl_dir::<Row>(temp.path()).expect("dir");
        assert!(dir_load.records.is_empty());
        assert_eq!(dir_load.files, 0);
    }

    #[test]
    fn trimmed_lines_drop_blanks_and_whitespace() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("success_records.txt");
        assert!(read_trimmed_lines(&path).expect("missing").is_empty());
        std::fs::write(&path, "a\n  b  \n\n c\n").expect("write");
        assert_eq!(read_trimmed_lines(&path).expect("read"), vec!["a", "b", "c"]);
    }
}
