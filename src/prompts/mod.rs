//! Prompts used by the agent
//!
//! This module holds the fixed system preamble and the templates that turn
//! search results and uploaded documents into user turns.

pub mod document_prompt;
pub mod search_prompt;

pub use document_prompt::summarize_prompt;
pub use search_prompt::{format_search_results, with_search_context};

/// Preamble inserted as the first message of every session
pub const SYSTEM_PROMPT: &str = "You are Kimi, a smart and helpful AI assistant.
You have access to:
- Web search: When users ask about current events or need up-to-date information, you will receive search results to base your answer on.
- File analysis: You can read and analyze uploaded documents (PDF, DOCX, TXT).
- Conversation memory: You remember previous messages in this session.

Always be concise, accurate, and helpful. When using search results, cite the source URLs when relevant.
";
