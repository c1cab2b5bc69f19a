//! Markdown digest → standalone HTML page.

use crate::types::{DigestError, Result};
use pulldown_cmark::{html, Options, Parser};
use pulldown_cmark_escape::escape_html;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_TITLE: &str = "Paper Digest";

const STYLESHEET: &str = r#"
    body {
        max-width: 900px;
        margin: 40px auto;
        padding: 20px;
        font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif;
        font-size: 16px;
        line-height: 1.7;
        color: #333;
        background: #fff;
    }
    h1 {
        font-size: 2em;
        margin-top: 0;
        color: #1a1a1a;
        border-bottom: 3px solid #3498db;
        padding-bottom: 0.3em;
    }
    h2 {
        font-size: 1.5em;
        margin-top: 2em;
        color: #2c3e50;
        border-bottom: 1px solid #e0e0e0;
        padding-bottom: 0.2em;
    }
    h3 { font-size: 1.2em; margin-top: 1.5em; color: #34495e; }
    a { color: #3498db; text-decoration: none; }
    a:hover { text-decoration: underline; }
    a[href*="arxiv.org"] { font-weight: 500; color: #2ecc71; }
    code {
        background-color: #f5f5f5;
        padding: 0.2em 0.4em;
        border-radius: 3px;
        font-family: "SF Mono", Monaco, "Courier New", monospace;
        font-size: 0.9em;
    }
    blockquote {
        margin: 1em 0;
        padding: 0.5em 1em;
        border-left: 4px solid #3498db;
        color: #555;
        background: #f9f9f9;
    }
    table { border-collapse: collapse; margin: 1em 0; }
    th, td { border: 1px solid #e0e0e0; padding: 0.4em 0.8em; }
    hr { border: none; border-top: 2px solid #e0e0e0; margin: 2em 0; }
    @media print {
        body { max-width: 100%; margin: 0; }
        a { color: #000; text-decoration: underline; }
    }
"#;

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    // Writing into a String is infallible.
    let _ = escape_html(&mut out, text);
    out
}

/// Renders Markdown to a complete HTML document. Raw HTML in the input,
/// comments included, is kept as written.
pub fn render_html(markdown: &str, title: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);

    let parser = Parser::new_ext(markdown, options);
    let mut body = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut body, parser);

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape_text(title),
        STYLESHEET,
        body
    )
}

/// Writes `<stem>.html` next to the Markdown file and returns its path.
pub fn convert_file(markdown_path: &Path) -> Result<PathBuf> {
    let markdown = std::fs::read_to_string(markdown_path).map_err(|e| {
        DigestError::Render(format!(
            "Cannot read {}: {}",
            markdown_path.display(),
            e
        ))
    })?;

    let html_path = markdown_path.with_extension("html");
    std::fs::write(&html_path, render_html(&markdown, DEFAULT_TITLE)).map_err(|e| {
        DigestError::Render(format!("Cannot write {}: {}", html_path.display(), e))
    })?;

    debug!("Rendered {} → {}", markdown_path.display(), html_path.display());
    Ok(html_path)
}
