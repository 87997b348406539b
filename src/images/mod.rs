//! Image-reference extraction and rewriting over the `markdown` crate's
//! mdast tree.
//!
//! A reference is identified by its literal source string; matching against
//! the pre-render set is exact string equality, with no path normalization.
//! Each extracted reference also carries the byte span of the URL in the
//! source text so a matched reference can be rewritten in place without
//! disturbing the rest of the document.
//!
//! Three constructs are covered: inline images, `<img>` tags embedded as raw
//! HTML, and reference-style images. For the latter the URL lives on the
//! `[ref]: path` definition, which is collected once (at the definition's
//! position) and only when no link shares the same definition, so rewriting
//! it cannot corrupt a link target.

use std::collections::HashSet;
use std::ops::Range;
use std::sync::LazyLock;

use markdown::mdast::Node;
use markdown::ParseOptions;
use regex::Regex;

use crate::error::MungeError;

/// `src` attribute of an `<img>` tag inside a raw-HTML node.
static IMG_TAG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#).unwrap()
});

/// One image reference found in a Markdown document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// The literal source string of the reference.
    pub src: String,
    /// Byte range of the URL within the document text.
    pub span: Range<usize>,
}

/// Which definition identifiers are used by image references and which by
/// link references.
#[derive(Default)]
struct RefUsage {
    images: HashSet<String>,
    links: HashSet<String>,
}

/// Collect all image references in document order, duplicates preserved.
pub fn collect_image_refs(text: &str) -> Result<Vec<ImageRef>, MungeError> {
    let tree = markdown::to_mdast(text, &ParseOptions::gfm())
        .map_err(|e| MungeError::Internal(format!("markdown parse: {e}")))?;

    let mut usage = RefUsage::default();
    scan_reference_usage(&tree, &mut usage);

    let mut refs = Vec::new();
    walk(&tree, text, &usage, &mut refs);
    Ok(refs)
}

fn scan_reference_usage(node: &Node, usage: &mut RefUsage) {
    match node {
        Node::ImageReference(r) => {
            usage.images.insert(r.identifier.clone());
        }
        Node::LinkReference(r) => {
            usage.links.insert(r.identifier.clone());
        }
        _ => {}
    }

    if let Some(children) = node.children() {
        for child in children {
            scan_reference_usage(child, usage);
        }
    }
}

fn walk(node: &Node, text: &str, usage: &RefUsage, refs: &mut Vec<ImageRef>) {
    match node {
        Node::Image(img) => {
            if let Some(pos) = &img.position {
                // The URL sits after the `](` delimiter; the alt text before
                // it may spell the same string and must not be touched.
                if let Some(span) =
                    url_span(text, pos.start.offset, pos.end.offset, &img.url, "](")
                {
                    refs.push(ImageRef {
                        src: img.url.clone(),
                        span,
                    });
                }
            }
        }
        Node::Definition(def) => {
            // Only definitions backing images exclusively; a definition
            // shared with a link must keep its URL for the link target.
            if usage.images.contains(&def.identifier) && !usage.links.contains(&def.identifier) {
                if let Some(pos) = &def.position {
                    if let Some(span) =
                        url_span(text, pos.start.offset, pos.end.offset, &def.url, "]:")
                    {
                        refs.push(ImageRef {
                            src: def.url.clone(),
                            span,
                        });
                    }
                }
            }
        }
        Node::Html(html) => {
            if let Some(pos) = &html.position {
                for cap in IMG_TAG_SRC.captures_iter(&html.value) {
                    if let Some(m) = cap.get(1) {
                        refs.push(ImageRef {
                            src: m.as_str().to_string(),
                            span: pos.start.offset + m.start()..pos.start.offset + m.end(),
                        });
                    }
                }
            }
        }
        _ => {}
    }

    if let Some(children) = node.children() {
        for child in children {
            walk(child, text, usage, refs);
        }
    }
}

/// Locate the URL inside the source slice of an image or definition node.
///
/// The search starts after `delim` (`](` for inline images, `]:` for
/// definitions) so label or alt text spelling the same string as the URL is
/// never matched. References whose source spelling differs from the parsed
/// URL (entity escapes etc.) are skipped rather than rewritten wrongly.
fn url_span(text: &str, start: usize, end: usize, url: &str, delim: &str) -> Option<Range<usize>> {
    if url.is_empty() {
        return None;
    }
    let slice = text.get(start..end)?;
    let from = slice.find(delim).map(|i| i + delim.len()).unwrap_or(0);
    let at = slice[from..].find(url)? + from;
    Some(start + at..start + at + url.len())
}

/// Apply span replacements to the document text.
///
/// Replacements must not overlap; they are applied lowest-offset first.
pub fn rewrite_refs(text: &str, mut replacements: Vec<(Range<usize>, String)>) -> String {
    replacements.sort_by_key(|(span, _)| span.start);

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (span, value) in replacements {
        if span.start < cursor {
            continue;
        }
        out.push_str(&text[cursor..span.start]);
        out.push_str(&value);
        cursor = span.end;
    }
    out.push_str(&text[cursor..]);
    out
}
