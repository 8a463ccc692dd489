//! Discovery and extraction of raw records from the input directory.

use std::path::{Path, PathBuf};

use futures::future::join_all;
use serde_json::Value;
use tokio::sync::Semaphore;

use crate::error::AppError;

/// Records read from one input file.
#[derive(Debug, Clone, Default)]
pub struct ExtractedFile {
    pub path: PathBuf,
    pub records: Vec<Value>,
    /// Lines (or whole array files) that were not valid JSON.
    pub malformed: usize,
    pub errors: Vec<String>,
}

impl ExtractedFile {
    pub fn file_name(&self) -> String {
        display_name(&self.path)
    }
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// List regular files directly inside `dir` whose name matches `pattern`,
/// sorted by path.
pub async fn discover_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, AppError> {
    let matcher = glob::Pattern::new(pattern)
        .map_err(|e| AppError::ConfigError(format!("Invalid file pattern '{pattern}': {e}")))?;
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
        AppError::ConfigError(format!("cannot read input directory {}: {e}", dir.display()))
    })?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        if !matcher.matches(&name.to_string_lossy()) {
            continue;
        }
        if entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Parse file content as a JSON array when it starts with `[`, otherwise as
/// newline-delimited JSON. Blank lines are ignored.
pub fn parse_records(name: &str, content: &str) -> ExtractedFile {
    let mut out = ExtractedFile::default();
    let trimmed = content.trim_start_matches('\u{feff}').trim_start();

    if trimmed.starts_with('[') {
        match serde_json::from_str::<Vec<Value>>(trimmed) {
            Ok(records) => out.records = records,
            Err(e) => {
                out.malformed = 1;
                out.errors.push(format!("{name}: invalid JSON array: {e}"));
            }
        }
        return out;
    }

    for (idx, line) in content.lines().enumerate() {
        let line = line.trim().trim_start_matches('\u{feff}');
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(value) => out.records.push(value),
            Err(e) => {
                out.malformed += 1;
                out.errors.push(format!("{name}:{}: malformed JSON: {e}", idx + 1));
            }
        }
    }
    out
}

/// Read and parse one file. Never fails: an unreadable file is reported in
/// `errors` and yields no records.
pub async fn extract_file(path: &Path) -> ExtractedFile {
    let name = display_name(path);
    let mut extracted = match tokio::fs::read_to_string(path).await {
        Ok(content) => parse_records(&name, &content),
        Err(e) => ExtractedFile {
            errors: vec![format!("{name}: cannot read file: {e}")],
            ..ExtractedFile::default()
        },
    };
    extracted.path = path.to_path_buf();
    extracted
}

/// Extract several files concurrently, at most `max_parallel` at a time.
/// Results keep the order of `paths`.
pub async fn extract_files(paths: &[PathBuf], max_parallel: usize) -> Vec<ExtractedFile> {
    let semaphore = Semaphore::new(max_parallel.max(1));
    let reads = paths.iter().map(|path| {
        let semaphore = &semaphore;
        async move {
            let _permit = semaphore.acquire().await.ok();
            extract_file(path).await
        }
    });
    join_all(reads).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ndjson_with_malformed_lines() {
        let content = "{\"a\":1}\n\nnot json\n{\"a\":2}\n";
        let out = parse_records("f.jsonl", content);
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.malformed, 1);
        assert!(out.errors[0].starts_with("f.jsonl:3:"));
    }

    #[test]
    fn test_json_array_file() {
        let out = parse_records("f.json", "  [{\"a\":1},{\"a\":2}]");
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.malformed, 0);

        let out = parse_records("f.json", "[{\"a\":1},");
        assert!(out.records.is_empty());
        assert_eq!(out.malformed, 1);
    }

    #[tokio::test]
    async fn test_discover_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.jsonl", "a.jsonl", "c.txt"] {
            std::fs::write(dir.path().join(name), "{}\n").unwrap();
        }
        std::fs::create_dir(dir.path().join("d.jsonl")).unwrap();

        let files = discover_files(dir.path(), "*.jsonl").await.unwrap();
        let names: Vec<String> = files.iter().map(|p| display_name(p)).collect();
        assert_eq!(names, vec!["a.jsonl", "b.jsonl"]);
    }

    #[tokio::test]
    async fn test_discover_pattern_classes() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["batch_7.jsonl", "batch_x.jsonl", "freework_01.json", "freework_001.json"] {
            std::fs::write(dir.path().join(name), "{}\n").unwrap();
        }

        let files = discover_files(dir.path(), "batch_[0-9]*.jsonl").await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(display_name(&files[0]), "batch_7.jsonl");

        let files = discover_files(dir.path(), "freework_??.json").await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(display_name(&files[0]), "freework_01.json");
    }

    #[tokio::test]
    async fn test_discover_invalid_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_files(dir.path(), "broken[").await.unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_discover_missing_dir() {
        let err = discover_files(Path::new("/definitely/not/here"), "*.jsonl")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_extract_files_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = Vec::new();
        for i in 0..5 {
            let path = dir.path().join(format!("f{i}.jsonl"));
            std::fs::write(&path, format!("{{\"n\":{i}}}\n")).unwrap();
            paths.push(path);
        }
        paths.push(dir.path().join("missing.jsonl"));

        let extracted = extract_files(&paths, 2).await;
        assert_eq!(extracted.len(), 6);
        for (i, file) in extracted.iter().take(5).enumerate() {
            assert_eq!(file.records[0]["n"], i);
        }
        assert!(extracted[5].records.is_empty());
        assert!(extracted[5].errors[0].contains("cannot read file"));
    }
}
