use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use tokio::fs;

use super::{clean_text, ContextProvider, Passage, TextSplitter};
use crate::documents::is_text_document;
use crate::errors::AegisError;

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "in", "is", "it", "of", "on",
    "or", "that", "the", "this", "to", "with",
];

/// Lexical retriever over passages held in memory.
///
/// Passages are ranked by the share of distinct query terms they contain.
/// Ties keep corpus order, so retrieval is deterministic.
pub struct InMemoryContextProvider {
    passages: Vec<Passage>,
}

impl InMemoryContextProvider {
    pub fn new(passages: Vec<Passage>) -> Self {
        Self { passages }
    }

    /// Loads every text document in `dir`, in file-name order, split into
    /// passages of at most `chunk_size` bytes.
    pub async fn from_directory(dir: &Path, chunk_size: usize) -> Result<Self, AegisError> {
        let mut entries = fs::read_dir(dir).await.map_err(|e| {
            AegisError::ContextError(format!(
                "Failed to read documents folder {}: {}",
                dir.display(),
                e
            ))
        })?;

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_file() && is_text_document(&path) {
                files.push(path);
            }
        }
        files.sort();

        let splitter = TextSplitter::new(chunk_size);
        let mut passages = Vec::new();
        for path in files {
            let source = path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default();
            let content = fs::read_to_string(&path).await.map_err(|e| {
                AegisError::ContextError(format!("Failed to read {}: {}", path.display(), e))
            })?;
            for chunk in splitter.split_text(&content) {
                passages.push(Passage::new(chunk, source.clone()));
            }
        }

        log::info!(
            "Indexed {} passage(s) from {}",
            passages.len(),
            dir.display()
        );
        Ok(Self::new(passages))
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }
}

#[async_trait]
impl ContextProvider for InMemoryContextProvider {
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Passage>, AegisError> {
        log::debug!("Retrieving up to {} passage(s) for query: {}", top_k, query);

        let terms = query_terms(query);
        let mut ranked: Vec<Passage> = self
            .passages
            .iter()
            .map(|passage| {
                let score = overlap_score(&terms, &passage.text);
                passage.clone().with_score(score)
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(top_k);
        Ok(ranked)
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
}

fn query_terms(query: &str) -> Vec<String> {
    let cleaned = clean_text(Some(query));
    let mut seen = HashSet::new();
    tokenize(&cleaned)
        .filter(|term| !STOP_WORDS.contains(term))
        .filter(|term| seen.insert(term.to_string()))
        .map(str::to_string)
        .collect()
}

fn overlap_score(terms: &[String], text: &str) -> f32 {
    if terms.is_empty() {
        return 0.0;
    }
    let cleaned = clean_text(Some(text));
    let words: HashSet<&str> = tokenize(&cleaned).collect();
    let matched = terms
        .iter()
        .filter(|term| words.contains(term.as_str()))
        .count();
    matched as f32 / terms.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;

    fn corpus() -> InMemoryContextProvider {
        InMemoryContextProvider::new(vec![
            Passage::new(
                "Confidentiality obligations must not exceed three years.",
                "policy_guidelines.txt",
            ),
            Passage::new("Governing law must be Delaware.", "policy_guidelines.txt"),
            Passage::new(
                "The confidentiality term of this agreement is five years.",
                "acme_nda.txt",
            ),
            Passage::new("Payment is due within 30 days.", "acme_nda.txt"),
        ])
    }

    #[tokio::test]
    async fn test_retrieve_ranks_by_term_overlap() {
        let passages = corpus()
            .retrieve("confidentiality term", 2)
            .await
            .unwrap();

        assert_eq!(passages.len(), 2);
        assert_eq!(passages[0].source, "acme_nda.txt");
        assert_eq!(passages[0].score, 1.0);
        assert_eq!(passages[1].source, "policy_guidelines.txt");
        assert_eq!(passages[1].score, 0.5);
    }

    #[tokio::test]
    async fn test_retrieve_respects_top_k_and_keeps_order_on_ties() {
        let passages = corpus().retrieve("unrelated words", 3).await.unwrap();
        assert_eq!(passages.len(), 3);
        assert!(passages.iter().all(|p| p.score == 0.0));
        assert!(passages[0].text.starts_with("Confidentiality obligations"));
        assert!(passages[1].text.starts_with("Governing law"));
    }

    #[tokio::test]
    async fn test_query_is_case_and_punctuation_insensitive() {
        let passages = corpus().retrieve("  GOVERNING Law?  ", 1).await.unwrap();
        assert_eq!(passages[0].text, "Governing law must be Delaware.");
    }

    #[tokio::test]
    async fn test_empty_corpus_returns_nothing() {
        let provider = InMemoryContextProvider::new(vec![]);
        assert!(provider.retrieve("anything", 4).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_from_directory_loads_text_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std_fs::write(dir.path().join("b_nda.txt"), "Term is five years.").unwrap();
        std_fs::write(
            dir.path().join("a_policy.txt"),
            "Rule one.\n\nRule two.",
        )
        .unwrap();
        std_fs::write(dir.path().join("scan.png"), [0u8, 1, 2]).unwrap();
        std_fs::create_dir(dir.path().join("nested.txt")).unwrap();

        let provider = InMemoryContextProvider::from_directory(dir.path(), 12)
            .await
            .unwrap();

        assert_eq!(provider.len(), 4);
        let all = provider.retrieve("", 10).await.unwrap();
        let sources: Vec<&str> = all.iter().map(|p| p.source.as_str()).collect();
        assert_eq!(sources, vec!["a_policy.txt", "a_policy.txt", "b_nda.txt", "b_nda.txt"]);
    }

    #[tokio::test]
    async fn test_from_missing_directory_is_context_error() {
        let dir = tempfile::tempdir().unwrap();
        let result =
            InMemoryContextProvider::from_directory(&dir.path().join("missing"), 100).await;
        assert!(matches!(result, Err(AegisError::ContextError(_))));
    }
}
