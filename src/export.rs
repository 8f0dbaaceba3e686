//! Word export: wrap converted body HTML in an MS-Word-compatible document
//! shell and write it to disk.
//!
//! Word opens an `.doc` file containing HTML as long as it carries the
//! legacy Office namespaces and an explicit `Section1` page definition;
//! without the section block Word ignores the page margins entirely. The
//! shell below matches what the original deployment shipped: A4 pages, 2 cm
//! margins, RTL direction, bordered tables that stay inside the margins.

use crate::error::Pdf2DocError;
use std::path::Path;

/// UTF-8 byte-order mark; Word needs it to detect the encoding of an
/// HTML-in-.doc file.
const BOM: &str = "\u{FEFF}";

/// Wrap converted body markup into a standalone Word-compatible document.
///
/// `title` becomes the document title (HTML-escaped); `body` is inserted
/// verbatim since it is model output that is already HTML.
pub fn wrap_word_document(title: &str, body: &str) -> String {
    format!(
        r#"<html xmlns:o='urn:schemas-microsoft-com:office:office'
      xmlns:w='urn:schemas-microsoft-com:office:word'
      xmlns='http://www.w3.org/TR/REC-html40'
      dir="rtl">
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <style>
    @page {{
      size: 21cm 29.7cm;
      margin: 2cm 2cm 2cm 2cm;
      mso-page-orientation: portrait;
    }}

    /* Word only applies margins through a named section definition. */
    @page Section1 {{
      size: 21cm 29.7cm;
      margin: 2cm 2cm 2cm 2cm;
      mso-header-margin: 36pt;
      mso-footer-margin: 36pt;
      mso-paper-source: 0;
    }}

    body {{
      font-family: 'Times New Roman', Arial, sans-serif;
      font-size: 12pt;
    }}

    table {{
      border-collapse: collapse;
      width: 100%;
      mso-border-alt: solid windowtext .5pt;
      margin-bottom: 12pt;
    }}
    td, th {{
      border: 1px solid #000;
      padding: 5pt;
    }}

    img {{
      max-width: 100%;
      height: auto;
    }}

    div.Section1 {{ page: Section1; }}
  </style>
</head>
<body>
  <div class="Section1">{body}</div>
</body>
</html>
"#,
        title = escape_html(title),
        body = body,
    )
}

/// Write a Word document to `path` atomically (temp file + rename), with the
/// BOM Word expects. Parent directories are created as needed.
pub async fn export_to_file(
    path: impl AsRef<Path>,
    title: &str,
    body: &str,
) -> Result<(), Pdf2DocError> {
    let path = path.as_ref();
    let document = format!("{BOM}{}", wrap_word_document(title, body));

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Pdf2DocError::OutputWriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }
    }

    let tmp_path = path.with_extension("doc.tmp");
    tokio::fs::write(&tmp_path, &document)
        .await
        .map_err(|e| Pdf2DocError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Pdf2DocError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(())
}

/// Minimal HTML escaping for text inserted into the document head.
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_carries_office_namespaces_and_section() {
        let doc = wrap_word_document("Exam", "<p>q1</p>");
        assert!(doc.contains("urn:schemas-microsoft-com:office:word"));
        assert!(doc.contains("@page Section1"));
        assert!(doc.contains(r#"<div class="Section1"><p>q1</p></div>"#));
    }

    #[test]
    fn title_is_escaped_body_is_not() {
        let doc = wrap_word_document("a<b>&c", "<p>kept</p>");
        assert!(doc.contains("<title>a&lt;b&gt;&amp;c</title>"));
        assert!(doc.contains("<p>kept</p>"));
    }

    #[tokio::test]
    async fn export_writes_bom_prefixed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.doc");

        export_to_file(&path, "t", "<p>x</p>").await.unwrap();

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(written.starts_with('\u{FEFF}'));
        assert!(written.contains("<p>x</p>"));
        // No stray temp file left behind
        assert!(!path.with_extension("doc.tmp").exists());
    }

    #[tokio::test]
    async fn export_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/out.doc");

        export_to_file(&path, "t", "<p>x</p>").await.unwrap();
        assert!(path.exists());
    }
}
