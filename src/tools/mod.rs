//! Collaborators used by the agent
//!
//! - [`web_search`]: web search backends returning ranked results
//! - [`file_reader`]: document to text extraction

pub mod file_reader;
pub mod web_search;

pub use file_reader::{
    DocumentExtractor, DocumentKind, ExtractedDocument, FileReader, SUPPORTED_EXTENSIONS,
};
pub use web_search::{
    create_search_provider, DuckDuckGoSearch, SearchError, SearchProvider, SearchResult,
    SerpApiSearch,
};
