//! Prompts for LLM-based circular analysis.
//!
//! Every prompt lives here so a wording change touches one file and unit
//! tests can inspect the exact text sent to the provider.
//!
//! Callers can override the template via
//! [`crate::config::DigestConfig::prompt_template`]; a custom template must
//! contain [`CONTENT_PLACEHOLDER`] at least once.

/// Placeholder replaced by the combined document text.
pub const CONTENT_PLACEHOLDER: &str = "{document_content}";

/// System message preceding the analysis request.
pub const SYSTEM_PROMPT: &str = "You are a document analyzer and writer specialising in \
insurance regulatory circulars. Answer in Markdown only.";

/// Default analysis template.
///
/// The output conventions requested here (`##`/`###`/`####` headings, `-`
/// bullets, `1.` numbered items) are exactly what [`crate::layout`] styles.
pub const DEFAULT_PROMPT_TEMPLATE: &str = r#"You are a document analyzer and writer. There are some input IRDAI circulars. Read through the documents and create an output where there will be headers and sub-headers, under which the pointers to be mentioned.

Document Content:
{document_content}

Please analyze the document and structure it with:
1. Clear headers and sub-headers
2. Key points organized under relevant sections
3. Important regulatory information highlighted
4. Actionable items clearly identified

Output Format:
- Use markdown formatting for headers (## for main headers, ### for sub-headers, #### for minor headings)
- Use bullet points for key information
- Maintain logical flow and structure
- Include any deadlines or compliance requirements

Analysis:"#;

/// Does `template` contain the content placeholder?
pub fn has_placeholder(template: &str) -> bool {
    template.contains(CONTENT_PLACEHOLDER)
}

/// Substitute `content` into `template`.
///
/// Only the placeholder is touched; other braces in the template (JSON
/// examples, say) pass through unchanged.
pub fn render_prompt(template: &str, content: &str) -> String {
    template.replace(CONTENT_PLACEHOLDER, content)
}

/// Join per-document text in input order, separated by a blank line.
pub fn combine_documents<'a, I>(texts: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    texts
        .into_iter()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
