//! Immutable solution snapshots.
//!
//! A [`Solution`] is the whole program at one point in time: every document
//! with its text and parsed tree. Rewrites never mutate a solution; they
//! produce a new one with [`Solution::with_document_text`], which shares
//! every untouched document with the old snapshot.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sharpfix_cst::{parse_source, ParseError, SyntaxTree};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

use crate::error::{AnalyzerError, AnalyzerResult};

/// Directories never scanned for sources.
const SKIPPED_DIRS: &[&str] = &["bin", "obj", ".git"];

/// Stable identity of a document across snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub u32);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One parsed source file.
#[derive(Debug)]
pub struct Document {
    id: DocumentId,
    path: String,
    tree: SyntaxTree,
}

impl Document {
    fn parse(id: DocumentId, path: String, text: String) -> AnalyzerResult<Self> {
        let tree = parse_source(&text).map_err(|error| AnalyzerError::Parse {
            path: path.clone(),
            error,
        })?;
        Ok(Document { id, path, tree })
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// Path relative to the workspace root, with `/` separators.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn text(&self) -> &str {
        self.tree.source()
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }
}

/// A file that was found but could not be parsed.
#[derive(Debug, Clone)]
pub struct SkippedDocument {
    pub path: String,
    pub error: ParseError,
    pub text: String,
}

impl SkippedDocument {
    /// True if the unparsed text contains `name` as a whole word.
    pub fn mentions(&self, name: &str) -> bool {
        let is_word = |c: char| c.is_alphanumeric() || c == '_';
        self.text.match_indices(name).any(|(start, _)| {
            let before = self.text[..start].chars().next_back();
            let after = self.text[start + name.len()..].chars().next();
            !before.is_some_and(is_word) && !after.is_some_and(is_word)
        })
    }
}

/// The whole program at one point in time.
#[derive(Debug, Clone, Default)]
pub struct Solution {
    documents: Vec<Arc<Document>>,
    skipped: Vec<SkippedDocument>,
}

impl Solution {
    /// Build a solution from in-memory sources. Any parse failure is an error.
    pub fn from_sources<P, T>(sources: impl IntoIterator<Item = (P, T)>) -> AnalyzerResult<Self>
    where
        P: Into<String>,
        T: Into<String>,
    {
        let mut documents = Vec::new();
        for (index, (path, text)) in sources.into_iter().enumerate() {
            let id = DocumentId(index as u32);
            documents.push(Arc::new(Document::parse(id, path.into(), text.into())?));
        }
        Ok(Solution {
            documents,
            skipped: Vec::new(),
        })
    }

    /// Load every `.cs` file under `root`.
    ///
    /// Files that do not parse are left out of the solution and listed in
    /// [`Solution::skipped`].
    pub fn load(root: &Path) -> AnalyzerResult<Self> {
        let mut files = collect_source_files(root)?;
        files.sort();

        let mut solution = Solution::default();
        for file in files {
            let text = std::fs::read_to_string(&file).map_err(|source| AnalyzerError::Io {
                path: file.clone(),
                source,
            })?;
            let path = relative_path(root, &file);
            let id = DocumentId(solution.documents.len() as u32);
            match Document::parse(id, path, text.clone()) {
                Ok(document) => solution.documents.push(Arc::new(document)),
                Err(AnalyzerError::Parse { path, error }) => {
                    warn!(path = %path, error = %error, "skipping unparseable document");
                    solution.skipped.push(SkippedDocument { path, error, text });
                }
                Err(other) => return Err(other),
            }
        }
        Ok(solution)
    }

    pub fn documents(&self) -> impl Iterator<Item = &Arc<Document>> {
        self.documents.iter()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn skipped(&self) -> &[SkippedDocument] {
        &self.skipped
    }

    pub fn document(&self, id: DocumentId) -> AnalyzerResult<&Arc<Document>> {
        self.documents
            .iter()
            .find(|d| d.id == id)
            .ok_or(AnalyzerError::UnknownDocument(id))
    }

    pub fn document_by_path(&self, path: &str) -> Option<&Arc<Document>> {
        self.documents.iter().find(|d| d.path == path)
    }

    /// A new snapshot in which `id` has `text`. Other documents are shared.
    pub fn with_document_text(&self, id: DocumentId, text: String) -> AnalyzerResult<Solution> {
        let old = self.document(id)?;
        let replacement = Arc::new(Document::parse(id, old.path.clone(), text)?);
        let documents = self
            .documents
            .iter()
            .map(|d| {
                if d.id == id {
                    Arc::clone(&replacement)
                } else {
                    Arc::clone(d)
                }
            })
            .collect();
        Ok(Solution {
            documents,
            skipped: self.skipped.clone(),
        })
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

fn collect_source_files(root: &Path) -> AnalyzerResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e))
    {
        let entry = entry.map_err(|e| AnalyzerError::Io {
            path: e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf()),
            source: e.into(),
        })?;
        let is_source = entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == "cs");
        if is_source {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn relative_path(root: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    mod snapshots {
        use super::*;

        #[test]
        fn with_document_text_shares_untouched_documents() {
            let solution = Solution::from_sources([
                ("A.cs", "class A { }"),
                ("B.cs", "class B { }"),
            ])
            .unwrap();
            let updated = solution
                .with_document_text(DocumentId(0), "class A2 { }".to_string())
                .unwrap();

            assert_eq!(solution.document(DocumentId(0)).unwrap().text(), "class A { }");
            assert_eq!(updated.document(DocumentId(0)).unwrap().text(), "class A2 { }");
            assert!(Arc::ptr_eq(
                solution.document(DocumentId(1)).unwrap(),
                updated.document(DocumentId(1)).unwrap()
            ));
        }

        #[test]
        fn with_document_text_rejects_invalid_code() {
            let solution = Solution::from_sources([("A.cs", "class A { }")]).unwrap();
            let err = solution
                .with_document_text(DocumentId(0), "class A {".to_string())
                .unwrap_err();
            assert!(matches!(err, AnalyzerError::Parse { .. }));
        }

        #[test]
        fn unknown_document_is_an_error() {
            let solution = Solution::from_sources([("A.cs", "class A { }")]).unwrap();
            assert!(matches!(
                solution.document(DocumentId(7)),
                Err(AnalyzerError::UnknownDocument(DocumentId(7)))
            ));
        }
    }

    mod loading {
        use super::*;

        #[test]
        fn load_finds_sources_and_skips_build_output() {
            let dir = tempfile::tempdir().unwrap();
            let root = dir.path();
            std::fs::create_dir_all(root.join("src")).unwrap();
            std::fs::create_dir_all(root.join("obj")).unwrap();
            std::fs::write(root.join("src/A.cs"), "class A { }").unwrap();
            std::fs::write(root.join("B.cs"), "class B { }").unwrap();
            std::fs::write(root.join("obj/Gen.cs"), "class Gen { }").unwrap();
            std::fs::write(root.join("notes.txt"), "not code").unwrap();

            let solution = Solution::load(root).unwrap();
            let paths: Vec<_> = solution.documents().map(|d| d.path().to_string()).collect();
            assert_eq!(paths, vec!["B.cs", "src/A.cs"]);
        }

        #[test]
        fn load_skips_unparseable_files() {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join("Good.cs"), "class G { }").unwrap();
            std::fs::write(dir.path().join("Bad.cs"), "class B {").unwrap();

            let solution = Solution::load(dir.path()).unwrap();
            assert_eq!(solution.len(), 1);
            assert_eq!(solution.skipped().len(), 1);
            assert_eq!(solution.skipped()[0].path, "Bad.cs");
            assert!(solution.skipped()[0].mentions("B"));
            assert!(!solution.skipped()[0].mentions("G"));
            assert!(!solution.skipped()[0].mentions("clas"));
        }
    }
}
