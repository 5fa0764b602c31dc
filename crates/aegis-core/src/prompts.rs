//! Prompt templates sent to the generation server

/// Retrieval query used to gather context for analysing `doc_name`.
pub fn analysis_query(doc_name: &str) -> String {
    format!("Analysis of document {}", doc_name)
}

/// Compliance analysis of `doc_name` against the retrieved policy context.
pub fn analysis_prompt(context: &str, doc_name: &str) -> String {
    format!(
        "You are a meticulous legal compliance analyst. Your task is to analyze the provided document \
strictly against our company's policy guidelines, which are included below.\n\n\
--- POLICY GUIDELINES & DOCUMENT CONTEXT ---\n\
{context}\n\
--- END OF CONTEXT ---\n\n\
Based on the context above, analyze the document '{doc_name}'. \
For each policy guideline, perform the following steps:\n\
1. **Guideline Reference:** State the guideline you are analyzing (e.g., 'Confidentiality Term').\n\
2. **Clause Identification:** Quote the specific clause or text from the document. If no clause is found, state that explicitly.\n\
3. **Risk Assessment:** Assign a clear risk level: **Low Risk**, **Medium Risk**, **High Risk**, or **Unacceptable**.\n\
4. **Justification:** Provide a concise, one-sentence justification for your risk assessment.\n"
    )
}

/// Question about a document, answered only from that document.
pub fn chat_prompt(document_context: &str, question: &str) -> String {
    format!(
        "**Document Context:**\n---\n{document_context}\n---\n\n\
**User's Question:** {question}\n\n\
**Instruction:** Based ONLY on the document context provided, answer the user's question.\n"
    )
}

/// Assistant message recorded once an uploaded file is attached to a session.
pub fn upload_acknowledgement(file_name: &str) -> String {
    format!(
        "I've finished analyzing `{}`. What would you like to know?",
        file_name
    )
}
