//! Document summary prompt
//!
//! Wraps extracted document text in the fixed template the agent sends as a
//! user turn when a file is uploaded.

/// Builds the user message asking the model to summarise an uploaded file
///
/// # Arguments
///
/// * `text` - Text extracted from the document
/// * `file_name` - Display name of the uploaded file
///
/// # Examples
///
/// ```
/// use kimi_agent::prompts::document_prompt::summarize_prompt;
///
/// let prompt = summarize_prompt("Quarterly revenue grew.", "report.pdf");
/// assert!(prompt.contains("'report.pdf'"));
/// assert!(prompt.contains("Quarterly revenue grew."));
/// ```
pub fn summarize_prompt(text: &str, file_name: &str) -> String {
    format!(
        "The user has uploaded a file named '{}'. Here are its contents:\n\n---\n{}\n---\n\n\
         Please provide a concise summary and highlight the key points.",
        file_name, text
    )
}
