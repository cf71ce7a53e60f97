//! Reference rendering backends
//!
//! The engine stops at a `ReportDocument`; a backend turns it into bytes.

pub mod markdown;
pub mod json;
#[cfg(feature = "html")]
pub mod html;

pub use markdown::MarkdownFormatter;
pub use json::JsonFormatter;
#[cfg(feature = "html")]
pub use html::HtmlFormatter;

use crate::report::types::ReportDocument;

/// Turns an assembled document into a byte-stream artifact.
pub trait RenderBackend {
    fn name(&self) -> &'static str;
    fn render(&self, document: &ReportDocument) -> anyhow::Result<Vec<u8>>;
}

/// Backend by name ("markdown", "json", "html"); `None` if unknown or not compiled in.
pub fn backend_for(name: &str) -> Option<Box<dyn RenderBackend>> {
    match name.to_ascii_lowercase().as_str() {
        "markdown" | "md" => Some(Box::new(MarkdownFormatter)),
        "json" => Some(Box::new(JsonFormatter)),
        #[cfg(feature = "html")]
        "html" => Some(Box::new(HtmlFormatter)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_lookup() {
        assert_eq!(backend_for("Markdown").unwrap().name(), "markdown");
        assert_eq!(backend_for("json").unwrap().name(), "json");
        assert!(backend_for("pdf").is_none());
    }
}
