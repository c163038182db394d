//! Folder-backed knowledge base for validator context

use std::path::{Path, PathBuf};

use negcase_core::KnowledgeConfig;

use crate::runner::RunError;

/// Returns passages relevant to a query.
pub trait KnowledgeBase: Send + Sync {
    fn query(&self, text: &str) -> Vec<String>;
}

/// No documents configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyKnowledgeBase;

impl KnowledgeBase for EmptyKnowledgeBase {
    fn query(&self, _text: &str) -> Vec<String> {
        Vec::new()
    }
}

/// Overlapping character chunks ranked by query occurrence count.
#[derive(Debug, Clone, Default)]
pub struct ChunkedKnowledgeBase {
    chunks: Vec<String>,
    top_k: usize,
}

impl ChunkedKnowledgeBase {
    #[must_use]
    pub fn from_text(text: &str, chunk_size: usize, overlap: usize, top_k: usize) -> Self {
        Self {
            chunks: chunk_text(text, chunk_size, overlap),
            top_k,
        }
    }

    /// Load every `.pdf`, `.docx`, `.txt` and `.md` file in `folder`, in
    /// file-name order. Documents that fail to extract are skipped.
    ///
    /// # Errors
    ///
    /// Returns error if the folder cannot be listed
    pub fn load(folder: &Path, chunk_size: usize, overlap: usize, top_k: usize) -> Result<Self, RunError> {
        let entries = std::fs::read_dir(folder)
            .map_err(|e| RunError::Io(format!("{}: {e}", folder.display())))?;

        let mut files: Vec<(PathBuf, DocumentKind)> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter_map(|path| DocumentKind::of(&path).map(|kind| (path, kind)))
            .collect();
        files.sort();

        let mut combined = String::new();
        let mut loaded = 0;
        for (path, kind) in &files {
            match kind.extract(path) {
                Ok(text) => {
                    let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
                    combined.push_str(&format!("\n\n=== Document: {name} ===\n\n{text}"));
                    loaded += 1;
                }
                Err(e) => tracing::warn!(file = %path.display(), error = %e, "skipping knowledge document"),
            }
        }

        tracing::debug!(documents = loaded, "knowledge base loaded");
        Ok(Self::from_text(&combined, chunk_size, overlap, top_k))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl KnowledgeBase for ChunkedKnowledgeBase {
    fn query(&self, text: &str) -> Vec<String> {
        let needle = text.to_lowercase();
        if needle.is_empty() {
            return self.chunks.iter().take(self.top_k).cloned().collect();
        }

        let mut scored: Vec<(usize, &String)> = self
            .chunks
            .iter()
            .map(|chunk| (chunk.to_lowercase().matches(&needle).count(), chunk))
            .filter(|(count, _)| *count > 0)
            .collect();

        if scored.is_empty() {
            return self.chunks.iter().take(self.top_k).cloned().collect();
        }

        // stable: equal scores keep document order
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored
            .into_iter()
            .take(self.top_k)
            .map(|(_, chunk)| chunk.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum DocumentKind {
    Pdf,
    Docx,
    Text,
}

impl DocumentKind {
    fn of(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" | "md" => Some(Self::Text),
            _ => None,
        }
    }

    fn extract(self, path: &Path) -> Result<String, String> {
        match self {
            Self::Pdf => pdf_extract::extract_text(path).map_err(|e| e.to_string()),
            Self::Docx => {
                let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
                let docx = docx_rs::read_docx(&bytes).map_err(|e| e.to_string())?;
                Ok(docx_text(&docx))
            }
            Self::Text => std::fs::read_to_string(path).map_err(|e| e.to_string()),
        }
    }
}

/// Body paragraphs, one per line.
fn docx_text(docx: &docx_rs::Docx) -> String {
    use docx_rs::{DocumentChild, ParagraphChild, RunChild};

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(p) => Some(p),
            _ => None,
        })
        .map(|p| {
            p.children
                .iter()
                .filter_map(|child| match child {
                    ParagraphChild::Run(run) => Some(run),
                    _ => None,
                })
                .flat_map(|run| run.children.iter())
                .filter_map(|child| match child {
                    RunChild::Text(t) => Some(t.text.as_str()),
                    _ => None,
                })
                .collect()
        })
        .collect();
    paragraphs.join("\n")
}

/// Split into `chunk_size`-character windows advancing by
/// `chunk_size - overlap` (at least one character).
#[must_use]
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    if chunk_size == 0 {
        return Vec::new();
    }
    let chars: Vec<char> = text.chars().collect();
    let step = chunk_size.saturating_sub(overlap).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        start += step;
    }
    chunks
}

/// Pick the knowledge base described by `config`. A missing or unreadable
/// folder yields an empty one.
#[must_use]
pub fn from_config(config: &KnowledgeConfig) -> Box<dyn KnowledgeBase> {
    let Some(folder) = &config.folder else {
        return Box::new(EmptyKnowledgeBase);
    };
    match ChunkedKnowledgeBase::load(folder, config.chunk_size, config.overlap, config.top_k) {
        Ok(kb) => Box::new(kb),
        Err(e) => {
            tracing::warn!(error = %e, "knowledge base unavailable");
            Box::new(EmptyKnowledgeBase)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_overlap() {
        assert_eq!(chunk_text("abcdefgh", 4, 2), ["abcd", "cdef", "efgh", "gh"]);
        assert_eq!(chunk_text("abc", 10, 2), ["abc"]);
        assert!(chunk_text("", 4, 1).is_empty());
        assert!(chunk_text("abc", 0, 0).is_empty());
        // overlap >= size still advances
        assert_eq!(chunk_text("abc", 2, 5), ["ab", "bc", "c"]);
    }

    #[test]
    fn chunks_count_characters_not_bytes() {
        assert_eq!(chunk_text("ééé", 2, 0), ["éé", "é"]);
    }

    #[test]
    fn ranks_by_occurrence_count() {
        let kb = ChunkedKnowledgeBase {
            chunks: vec![
                "token once".into(),
                "Token token TOKEN".into(),
                "nothing".into(),
                "token, token".into(),
            ],
            top_k: 2,
        };
        assert_eq!(kb.query("TOKEN"), ["Token token TOKEN", "token, token"]);
    }

    #[test]
    fn falls_back_to_first_chunks() {
        let kb = ChunkedKnowledgeBase {
            chunks: vec!["a".into(), "b".into(), "c".into()],
            top_k: 2,
        };
        assert_eq!(kb.query("zzz"), ["a", "b"]);
        assert_eq!(kb.query(""), ["a", "b"]);
        assert!(EmptyKnowledgeBase.query("a").is_empty());
    }

    #[test]
    fn loads_text_and_markdown_skipping_others() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), "Session tokens expire hourly.").unwrap();
        std::fs::write(dir.path().join("b.txt"), "Names are mandatory.").unwrap();
        std::fs::write(dir.path().join("c.csv"), "ignored,row").unwrap();
        // not a real PDF: extraction fails and the file is skipped
        std::fs::write(dir.path().join("d.pdf"), "binary").unwrap();

        let kb = ChunkedKnowledgeBase::load(dir.path(), 1000, 200, 3).unwrap();
        assert_eq!(kb.len(), 1);
        let hit = kb.query("mandatory");
        assert!(hit[0].contains("=== Document: a.md ==="));
        assert!(hit[0].contains("Names are mandatory."));
        assert!(!hit[0].contains("ignored"));
        assert!(!hit[0].contains("d.pdf"));
    }

    #[test]
    fn document_kind_by_extension() {
        assert_eq!(DocumentKind::of(Path::new("a.PDF")), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::of(Path::new("a.docx")), Some(DocumentKind::Docx));
        assert_eq!(DocumentKind::of(Path::new("a.Md")), Some(DocumentKind::Text));
        assert_eq!(DocumentKind::of(Path::new("a.doc")), None);
        assert_eq!(DocumentKind::of(Path::new("README")), None);
    }

    #[test]
    fn missing_folder_degrades_to_empty() {
        let config = KnowledgeConfig {
            folder: Some("/definitely/not/here".into()),
            ..KnowledgeConfig::default()
        };
        assert!(from_config(&config).query("x").is_empty());
        assert!(ChunkedKnowledgeBase::load(Path::new("/definitely/not/here"), 10, 0, 1).is_err());
    }
}
