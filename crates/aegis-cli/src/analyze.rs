//! One-shot compliance analysis of a document from the document folder

use anyhow::{bail, Result};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use aegis_core::context::join_passages;
use aegis_core::prompts::{analysis_prompt, analysis_query};
use aegis_core::{ContextProvider, DocumentLibrary, GenerationRequest, Generator};

use crate::output::write_response;

const RULE: &str = "----------------";

#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub model: String,
    pub stream: bool,
    pub top_k: usize,
}

pub async fn list_documents<W>(out: &mut W, library: &DocumentLibrary) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let names = library.list().await?;
    let listing = if names.is_empty() {
        format!("No documents found in {}\n", library.dir().display())
    } else {
        names.iter().map(|name| format!("{}\n", name)).collect()
    };
    out.write_all(listing.as_bytes()).await?;
    out.flush().await?;
    Ok(())
}

/// Analyses `document`, or the first listed document when none is named,
/// against retrieved policy context. Returns the text that was displayed.
pub async fn run_analysis<W>(
    out: &mut W,
    library: &DocumentLibrary,
    provider: &dyn ContextProvider,
    generator: &dyn Generator,
    options: &AnalysisOptions,
    document: Option<&str>,
) -> Result<String>
where
    W: AsyncWrite + Unpin,
{
    let names = library.list().await?;
    let Some(first) = names.first() else {
        bail!("No documents found in {}", library.dir().display());
    };

    let name = match document {
        None => first.clone(),
        Some(wanted) if names.iter().any(|n| n == wanted) => wanted.to_string(),
        Some(wanted) => bail!(
            "Document '{}' not found. Available documents: {}",
            wanted,
            names.join(", ")
        ),
    };

    let content = library.read(&name).await?;
    let header = format!(
        "Document: {} ({} characters)\n{rule}\n{}\n{rule}\n\nAnalysis Results\n{rule}\n",
        name,
        content.chars().count(),
        content.trim_end(),
        rule = RULE
    );
    out.write_all(header.as_bytes()).await?;
    out.flush().await?;

    let passages = provider
        .retrieve(&analysis_query(&name), options.top_k)
        .await?;
    if passages.is_empty() {
        log::warn!("No policy context retrieved for {}", name);
    } else {
        log::info!("Retrieved {} passages for {}", passages.len(), name);
    }

    let prompt = analysis_prompt(&join_passages(&passages), &name);
    let request = GenerationRequest::new(&options.model, prompt).with_stream(options.stream);

    write_response(out, generator, &request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedGenerator;
    use aegis_core::{AegisError, InMemoryContextProvider, Passage};
    use std::fs;

    fn library() -> (tempfile::TempDir, DocumentLibrary) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("policy_guidelines.txt"), "Rules").unwrap();
        fs::write(dir.path().join("vendor_nda.txt"), "NDA between us.").unwrap();
        fs::write(dir.path().join("acme_msa.txt"), "MSA text").unwrap();
        let library = DocumentLibrary::new(dir.path(), "policy_guidelines.txt");
        (dir, library)
    }

    fn provider() -> InMemoryContextProvider {
        InMemoryContextProvider::new(vec![
            Passage::new("Confidentiality must not exceed two years.", "policy_guidelines.txt"),
            Passage::new("Payment within 30 days.", "policy_guidelines.txt"),
        ])
    }

    fn options(stream: bool) -> AnalysisOptions {
        AnalysisOptions {
            model: "llama3".to_string(),
            stream,
            top_k: 4,
        }
    }

    #[tokio::test]
    async fn test_defaults_to_first_document_and_streams() {
        let (_dir, library) = library();
        let generator = ScriptedGenerator::new(&["Low", " Risk"]);
        let mut out = Vec::new();

        let shown = run_analysis(&mut out, &library, &provider(), &generator, &options(true), None)
            .await
            .unwrap();

        assert_eq!(shown, "Low Risk");
        let requests = generator.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].stream);
        assert_eq!(requests[0].model, "llama3");
        assert!(requests[0].prompt.contains("analyze the document 'acme_msa.txt'"));
        assert!(requests[0].prompt.contains("Confidentiality must not exceed two years."));

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Document: acme_msa.txt (8 characters)"));
        assert!(text.ends_with("Low Risk\n"));
    }

    #[tokio::test]
    async fn test_document_content_is_shown_before_results() {
        let (_dir, library) = library();
        let generator = ScriptedGenerator::new(&["Medium Risk"]);
        let mut out = Vec::new();

        run_analysis(
            &mut out,
            &library,
            &provider(),
            &generator,
            &options(true),
            Some("vendor_nda.txt"),
        )
        .await
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        let content_at = text.find("NDA between us.").unwrap();
        let results_at = text.find("Analysis Results").unwrap();
        assert!(content_at < results_at);
        assert!(text.starts_with(
            "Document: vendor_nda.txt (15 characters)\n----------------\nNDA between us.\n----------------\n"
        ));
    }

    #[tokio::test]
    async fn test_named_document_without_streaming() {
        let (_dir, library) = library();
        let generator = ScriptedGenerator::new(&["All clear."]);
        let mut out = Vec::new();

        run_analysis(
            &mut out,
            &library,
            &provider(),
            &generator,
            &options(false),
            Some("vendor_nda.txt"),
        )
        .await
        .unwrap();

        let requests = generator.requests();
        assert!(!requests[0].stream);
        assert!(requests[0].prompt.contains("'vendor_nda.txt'"));
    }

    #[tokio::test]
    async fn test_unknown_or_guidelines_document_is_rejected() {
        let (_dir, library) = library();
        let generator = ScriptedGenerator::new(&[]);
        for name in ["missing.txt", "policy_guidelines.txt"] {
            let mut out = Vec::new();
            let err = run_analysis(
                &mut out,
                &library,
                &provider(),
                &generator,
                &options(true),
                Some(name),
            )
            .await
            .unwrap_err();
            assert!(err.to_string().contains("acme_msa.txt, vendor_nda.txt"));
        }
        assert!(generator.requests().is_empty());
    }

    #[tokio::test]
    async fn test_empty_folder_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let library = DocumentLibrary::new(dir.path(), "policy_guidelines.txt");
        let generator = ScriptedGenerator::new(&[]);
        let mut out = Vec::new();

        let err = run_analysis(&mut out, &library, &provider(), &generator, &options(true), None)
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("No documents found"));
    }

    #[tokio::test]
    async fn test_generation_failure_is_displayed() {
        let (_dir, library) = library();
        let generator = ScriptedGenerator::with_items(vec![Err(AegisError::TransportError(
            "connection refused".to_string(),
        ))]);
        let mut out = Vec::new();

        let shown = run_analysis(&mut out, &library, &provider(), &generator, &options(true), None)
            .await
            .unwrap();

        assert_eq!(
            shown,
            "Error: Could not connect to the generation service: connection refused"
        );
    }

    #[tokio::test]
    async fn test_list_documents() {
        let (_dir, library) = library();
        let mut out = Vec::new();
        list_documents(&mut out, &library).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "acme_msa.txt\nvendor_nda.txt\n");
    }
}
