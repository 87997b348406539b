//! Convert Markdown documents with embedded Mermaid diagrams into PDFs.
//!
//! Pipeline:
//!
//! ```text
//! doc.md
//!  │
//!  ├─ 1. enumerate image references in the original document
//!  ├─ 2. copy the document into a temp working directory
//!  ├─ 3. mermaid-cli: diagram blocks → generated PNG references
//!  ├─ 4. relocate original images into the working directory,
//!  │     leaving generated diagram images untouched
//!  ├─ 5. Markdown → HTML → wkhtmltopdf → doc.pdf
//!  └─ 6. remove the working directory
//! ```
//!
//! The external tools are behind the [`render::DiagramRenderer`] and
//! [`render::PdfEngine`] traits so the relocation logic is testable without
//! mermaid-cli or wkhtmltopdf installed.

pub mod error;
pub mod images;
pub mod munger;
pub mod render;

pub use error::MungeError;
pub use munger::Munger;
pub use render::{DiagramRenderer, MermaidCli, PdfEngine, WkhtmlToPdf};
