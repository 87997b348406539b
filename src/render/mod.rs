//! Subprocess-backed collaborators for diagram rendering and HTML-to-PDF
//! conversion.
//!
//! Both tools sit behind narrow traits so the relocation pipeline can be
//! driven by fakes in tests. Invocations are blocking, single-shot, and
//! awaited to completion; tool output is captured for diagnostics rather
//! than streamed, and no timeout is applied.

mod mermaid_cli;
mod wkhtmltopdf;

pub use mermaid_cli::MermaidCli;
pub use wkhtmltopdf::WkhtmlToPdf;

use std::path::Path;

use crate::error::MungeError;

/// Renders the diagram blocks of a Markdown file.
///
/// Given a Markdown file containing fenced diagram blocks, produces a derived
/// Markdown file at `output` with each block replaced by a reference to a
/// generated image placed alongside it.
pub trait DiagramRenderer {
    fn render(&self, input: &Path, output: &Path) -> Result<(), MungeError>;
}

/// Converts an HTML file to a PDF file.
///
/// Must resolve local filesystem image references; all references produced by
/// the pipeline are relative paths next to the HTML file.
pub trait PdfEngine {
    fn convert(&self, input: &Path, output: &Path) -> Result<(), MungeError>;
}
