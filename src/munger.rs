//! The conversion pipeline: validate, render diagrams, relocate original
//! images, convert to PDF, clean up.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use markdown::{CompileOptions, Options};
use tempfile::TempDir;
use tracing::{debug, info};

use crate::error::MungeError;
use crate::images;
use crate::render::{DiagramRenderer, MermaidCli, PdfEngine, WkhtmlToPdf};

/// Converts one Markdown document with embedded Mermaid diagrams to a PDF.
///
/// Construction validates the input and resolves the output path but touches
/// nothing on disk; all intermediate artifacts of [`Munger::convert`] live in
/// a temporary working directory that is removed on every exit path.
pub struct Munger {
    path: PathBuf,
    pdf_path: PathBuf,
    renderer: Box<dyn DiagramRenderer>,
    pdf_engine: Box<dyn PdfEngine>,
}

impl Munger {
    /// Validate the input document and resolve the output path.
    ///
    /// # Errors
    ///
    /// * [`MungeError::NotFound`] — `md_path` does not exist
    /// * [`MungeError::InvalidInput`] — `md_path` is not a `.md` file
    /// * [`MungeError::AlreadyExists`] — a file already exists at the
    ///   resolved output path (`pdf_path`, or `md_path` with a `pdf`
    ///   extension when not given)
    pub fn new(md_path: impl AsRef<Path>, pdf_path: Option<&Path>) -> Result<Self, MungeError> {
        let path = md_path.as_ref().to_path_buf();

        if !path.exists() {
            return Err(MungeError::NotFound { path });
        }
        if path.extension().and_then(|e| e.to_str()) != Some("md") {
            return Err(MungeError::InvalidInput { path });
        }

        let pdf_path = match pdf_path {
            Some(p) => p.to_path_buf(),
            None => path.with_extension("pdf"),
        };
        if pdf_path.exists() {
            return Err(MungeError::AlreadyExists { path: pdf_path });
        }

        Ok(Self {
            path,
            pdf_path,
            renderer: Box::new(MermaidCli),
            pdf_engine: Box::new(WkhtmlToPdf),
        })
    }

    /// Replace the diagram renderer, e.g. with a fake in tests.
    pub fn with_renderer(mut self, renderer: Box<dyn DiagramRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Replace the HTML-to-PDF backend.
    pub fn with_pdf_engine(mut self, pdf_engine: Box<dyn PdfEngine>) -> Self {
        self.pdf_engine = pdf_engine;
        self
    }

    /// The resolved output path.
    pub fn pdf_path(&self) -> &Path {
        &self.pdf_path
    }

    /// Enumerate the image references of the original document, in document
    /// order, duplicates preserved. No side effects.
    ///
    /// Must run before diagram rendering: references found here are user
    /// content; anything appearing only after rendering is a generated
    /// diagram image.
    pub fn original_images(&self) -> Result<Vec<String>, MungeError> {
        let text = self.read_to_string(&self.path)?;
        let refs = images::collect_image_refs(&text)?;
        Ok(refs.into_iter().map(|r| r.src).collect())
    }

    /// Copy the file behind an image reference into `root` under a fresh
    /// unique name and return that name.
    ///
    /// The reference is resolved against the source document's own directory,
    /// not the working directory. The new name keeps the original stem and
    /// extension with a random infix, so it never equals the reference string.
    pub fn materialize(&self, reference: &str, root: &Path) -> Result<String, MungeError> {
        let origin = self
            .path
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(reference);

        let prefix = format!(
            "{}-",
            origin.file_stem().and_then(|s| s.to_str()).unwrap_or("image")
        );
        let suffix = origin
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();

        let target = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(&suffix)
            .tempfile_in(root)
            .map_err(|e| MungeError::Io {
                path: root.to_path_buf(),
                source: e,
            })?;
        let (_, target) = target.keep().map_err(|e| MungeError::Io {
            path: root.to_path_buf(),
            source: e.error,
        })?;

        fs::copy(&origin, &target).map_err(|e| MungeError::Io {
            path: origin,
            source: e,
        })?;

        let name = target
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| MungeError::Internal("materialized name is not utf-8".into()))?;
        Ok(name.to_string())
    }

    /// Render the diagram blocks of `source` into a derived Markdown file at
    /// `destination`, with each block replaced by a generated image
    /// reference placed alongside it.
    pub fn render_diagrams(&self, source: &Path, destination: &Path) -> Result<(), MungeError> {
        self.renderer.render(source, destination)
    }

    /// Run the full pipeline and return the absolute output path.
    ///
    /// The working directory is removed on every exit path. On failure the
    /// removal is best-effort and never masks the original error; on success
    /// a vanished directory is tolerated but any other cleanup failure is
    /// raised.
    pub fn convert(&self) -> Result<PathBuf, MungeError> {
        info!("converting {}", self.path.display());
        let originals = self.original_images()?;
        debug!("found {} original image reference(s)", originals.len());

        let workdir = TempDir::new().map_err(|e| MungeError::Io {
            path: std::env::temp_dir(),
            source: e,
        })?;

        match self.run(workdir.path(), &originals) {
            Ok(()) => {
                let dir = workdir.path().to_path_buf();
                match workdir.close() {
                    Ok(()) => {}
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => return Err(MungeError::Io { path: dir, source: e }),
                }
                let out = std::path::absolute(&self.pdf_path).map_err(|e| MungeError::Io {
                    path: self.pdf_path.clone(),
                    source: e,
                })?;
                info!("wrote {}", out.display());
                Ok(out)
            }
            // workdir drops here, removing the directory best-effort
            Err(e) => Err(e),
        }
    }

    fn run(&self, dir: &Path, originals: &[String]) -> Result<(), MungeError> {
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| MungeError::Internal("document path has no file name".into()))?;
        let copied = dir.join(file_name);
        fs::copy(&self.path, &copied).map_err(|e| MungeError::Io {
            path: self.path.clone(),
            source: e,
        })?;

        let rendered = unique_markdown_path(dir)?;
        self.render_diagrams(&copied, &rendered)?;
        debug!("diagrams rendered to {}", rendered.display());

        let text = self.read_to_string(&rendered)?;
        let refs = images::collect_image_refs(&text)?;

        let mut replacements = Vec::new();
        for r in &refs {
            if originals.iter().any(|o| o == &r.src) {
                let name = self.materialize(&r.src, dir)?;
                debug!("relocated {} -> {}", r.src, name);
                replacements.push((r.span.clone(), name));
            }
        }
        let text = images::rewrite_refs(&text, replacements);

        let html = markdown::to_html_with_options(&text, &html_options())
            .map_err(|e| MungeError::Internal(format!("html serialization: {e}")))?;
        let html_path = rendered.with_extension("html");
        fs::write(&html_path, page_context(&html)).map_err(|e| MungeError::Io {
            path: html_path.clone(),
            source: e,
        })?;

        self.pdf_engine.convert(&html_path, &self.pdf_path)
    }

    fn read_to_string(&self, path: &Path) -> Result<String, MungeError> {
        fs::read_to_string(path).map_err(|e| MungeError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

impl fmt::Debug for Munger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Munger")
            .field("path", &self.path)
            .field("pdf_path", &self.pdf_path)
            .finish_non_exhaustive()
    }
}

/// GFM with raw HTML passed through: `<img>` tags embedded in the document
/// must come out as elements, not escaped text.
fn html_options() -> Options {
    Options {
        parse: markdown::ParseOptions::gfm(),
        compile: CompileOptions {
            allow_dangerous_html: true,
            ..CompileOptions::gfm()
        },
    }
}

/// Declare the encoding so non-ASCII text survives the PDF backend.
fn page_context(html: &str) -> String {
    let meta_tag = r#"<meta http-equiv="Content-Type" content="text/html; charset=utf-8"/>"#;
    format!("{meta_tag}\n{html}")
}

/// A fresh, uniquely named `.md` path in `dir` for the rendered document.
fn unique_markdown_path(dir: &Path) -> Result<PathBuf, MungeError> {
    let file = tempfile::Builder::new()
        .suffix(".md")
        .tempfile_in(dir)
        .map_err(|e| MungeError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;
    let (_, path) = file.keep().map_err(|e| MungeError::Io {
        path: dir.to_path_buf(),
        source: e.error,
    })?;
    Ok(path)
}
