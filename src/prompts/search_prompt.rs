//! Search context formatting
//!
//! Renders web search results as a numbered reference block and attaches it
//! to the user's message, labelled so the model reads it as context rather
//! than as something the user said.

use crate::tools::SearchResult;

/// Header placed between the user's text and the reference block
pub const SEARCH_CONTEXT_HEADER: &str = "[Web search results for your reference:]";

/// Format results into the block injected into the prompt
///
/// # Examples
///
/// ```
/// use kimi_agent::prompts::search_prompt::format_search_results;
/// use kimi_agent::tools::SearchResult;
///
/// assert_eq!(format_search_results(&[]), "No results found.");
///
/// let block = format_search_results(&[SearchResult::new("A", "http://a", "s")]);
/// assert!(block.starts_with("[1] A"));
/// ```
pub fn format_search_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No results found.".to_string();
    }

    let mut lines = Vec::with_capacity(results.len() * 4);
    for (i, r) in results.iter().enumerate() {
        lines.push(format!("[{}] {}", i + 1, r.title));
        lines.push(format!("    URL: {}", r.url));
        lines.push(format!("    {}", r.snippet));
        lines.push(String::new());
    }
    lines.join("\n")
}

/// Append a formatted reference block to the user's message
pub fn with_search_context(message: &str, results: &[SearchResult]) -> String {
    format!(
        "{}\n\n{}\n{}",
        message,
        SEARCH_CONTEXT_HEADER,
        format_search_results(results)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_single_result() {
        let block = format_search_results(&[SearchResult::new("A", "http://a", "s")]);
        assert_eq!(block, "[1] A\n    URL: http://a\n    s\n");
    }

    #[test]
    fn test_format_numbers_results() {
        let block = format_search_results(&[
            SearchResult::new("First", "http://1", "one"),
            SearchResult::new("Second", "http://2", "two"),
        ]);
        assert!(block.contains("[1] First"));
        assert!(block.contains("[2] Second"));
        assert!(block.contains("    URL: http://2"));
    }

    #[test]
    fn test_with_search_context_keeps_original_text() {
        let text = with_search_context(
            "latest news on X",
            &[SearchResult::new("A", "http://a", "s")],
        );
        assert!(text.starts_with("latest news on X\n\n[Web search results for your reference:]\n"));
        assert!(text.ends_with("[1] A\n    URL: http://a\n    s\n"));
    }

    #[test]
    fn test_with_search_context_no_results() {
        let text = with_search_context("what is up", &[]);
        assert!(text.ends_with("No results found."));
    }
}
