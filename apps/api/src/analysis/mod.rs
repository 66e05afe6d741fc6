pub mod analyzer;
pub mod catalog;
pub mod handlers;
pub mod keywords;
pub mod pipeline;
pub mod redact;
pub mod scoring;
pub mod suggestions;
