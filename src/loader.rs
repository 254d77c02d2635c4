use crate::event::Event;
use crate::snippet::Snippet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("{path}:{line}: invalid event: {source}")]
    Json { path: PathBuf, line: usize, source: serde_json::Error },
    #[error("{0} contains no events")]
    Empty(PathBuf),
}

const LOG_EXTENSIONS: [&str; 4] = ["log", "json", "jsonl", "txt"];

fn is_log_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| LOG_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

/// Reads one snippet from a file holding one JSON event per line.
pub fn read_snippet_file(path: &Path) -> Result<Snippet, LoadError> {
    let io_err = |source| LoadError::Io { path: path.to_path_buf(), source };
    let f = File::open(path).map_err(io_err)?;
    let mut events = Vec::new();
    for (i, line) in BufReader::new(f).lines().enumerate() {
        let line = line.map_err(io_err)?;
        if line.trim().is_empty() {
            continue;
        }
        let event: Event = serde_json::from_str(&line)
            .map_err(|source| LoadError::Json { path: path.to_path_buf(), line: i + 1, source })?;
        events.push(event);
    }
    if events.is_empty() {
        return Err(LoadError::Empty(path.to_path_buf()));
    }
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    Ok(Snippet::from_source(name, events))
}

/// Reads every log file directly inside `dir`, in file-name order.
pub fn read_snippet_dir(dir: &Path) -> Result<Vec<Snippet>, LoadError> {
    let io_err = |source| LoadError::Io { path: dir.to_path_buf(), source };
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(io_err)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_log_file(p))
        .collect();
    paths.sort();
    paths.iter().map(|p| read_snippet_file(p)).collect()
}

/// Reads a mix of files and directories.
pub fn read_paths(paths: &[PathBuf]) -> Result<Vec<Snippet>, LoadError> {
    let mut out = Vec::new();
    for p in paths {
        if p.is_dir() {
            out.extend(read_snippet_dir(p)?);
        } else {
            out.push(read_snippet_file(p)?);
        }
    }
    Ok(out)
}
