use anyhow::{Context, Result};
use boolrank_core::corpus::{Corpus, CorpusDocument};
use boolrank_core::DocId;
use serde::Deserialize;
use walkdir::WalkDir;

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct InputDoc {
    #[serde(default)]
    title: String,
    body: String,
}

struct LoadedDoc {
    title: String,
    body: String,
}

/// Documents read from `.json`, `.jsonl` and `.txt` files, in path order.
pub struct DirectoryCorpus {
    docs: Vec<LoadedDoc>,
}

impl DirectoryCorpus {
    pub fn load(input: &Path) -> Result<Self> {
        let mut files: Vec<PathBuf> = Vec::new();
        if input.is_dir() {
            for entry in WalkDir::new(input).into_iter().filter_map(|e| e.ok()) {
                let p = entry.path();
                if p.is_file() && matches!(extension(p), Some("json" | "jsonl" | "txt")) {
                    files.push(p.to_path_buf());
                }
            }
        } else if input.is_file() {
            files.push(input.to_path_buf());
        } else {
            anyhow::bail!("input {} does not exist", input.display());
        }
        files.sort();

        let mut docs = Vec::new();
        for file in &files {
            let before = docs.len();
            match extension(file) {
                Some("jsonl") => load_jsonl(file, &mut docs)?,
                Some("json") => load_json(file, &mut docs)?,
                _ => load_text(file, &mut docs)?,
            }
            tracing::debug!(file = %file.display(), docs = docs.len() - before, "loaded corpus file");
        }
        tracing::info!(files = files.len(), docs = docs.len(), "loaded corpus");
        Ok(Self { docs })
    }
}

fn extension(p: &Path) -> Option<&str> {
    p.extension().and_then(|s| s.to_str())
}

fn load_jsonl(file: &Path, docs: &mut Vec<LoadedDoc>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: InputDoc = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}", file.display(), line_no + 1))?;
        docs.push(LoadedDoc { title: doc.title, body: doc.body });
    }
    Ok(())
}

fn load_json(file: &Path, docs: &mut Vec<LoadedDoc>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader)
        .with_context(|| format!("parsing {}", file.display()))?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                let doc: InputDoc = serde_json::from_value(v)?;
                docs.push(LoadedDoc { title: doc.title, body: doc.body });
            }
        }
        serde_json::Value::Object(_) => {
            let doc: InputDoc = serde_json::from_value(json)?;
            docs.push(LoadedDoc { title: doc.title, body: doc.body });
        }
        _ => tracing::warn!(file = %file.display(), "skipping JSON that is neither object nor array"),
    }
    Ok(())
}

fn load_text(file: &Path, docs: &mut Vec<LoadedDoc>) -> Result<()> {
    let body = fs::read_to_string(file)?;
    let title = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    docs.push(LoadedDoc { title, body });
    Ok(())
}

impl Corpus for DirectoryCorpus {
    fn len(&self) -> usize {
        self.docs.len()
    }

    fn documents(&self) -> Box<dyn Iterator<Item = boolrank_core::Result<CorpusDocument>> + '_> {
        Box::new(self.docs.iter().enumerate().map(|(id, doc)| {
            Ok(CorpusDocument {
                id: id as DocId,
                title: doc.title.clone(),
                byte_size: doc.body.len() as u64,
                content: Box::new(Cursor::new(doc.body.clone().into_bytes())),
            })
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn loads_all_supported_formats_in_path_order() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.jsonl"), "{\"title\":\"A1\",\"body\":\"x\"}\n\n{\"title\":\"A2\",\"body\":\"y\"}\n").unwrap();
        fs::write(dir.path().join("b.json"), "[{\"title\":\"B\",\"body\":\"zz\"}]").unwrap();
        fs::write(dir.path().join("c.txt"), "plain text").unwrap();
        fs::write(dir.path().join("ignored.md"), "# nope").unwrap();

        let corpus = DirectoryCorpus::load(dir.path()).unwrap();
        assert_eq!(corpus.len(), 4);
        let titles: Vec<String> = corpus
            .documents()
            .map(|d| d.unwrap().title)
            .collect();
        assert_eq!(titles, vec!["A1", "A2", "B", "c"]);
    }

    #[test]
    fn missing_input_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(DirectoryCorpus::load(&dir.path().join("nope")).is_err());
    }
}
