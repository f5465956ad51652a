//! HTML → PDF rendering.
//!
//! `AppState` holds an `Arc<dyn PdfRenderer>`; the default shells out to an
//! external renderer (WeasyPrint) with the print stylesheet.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::policy::templates::RenderError;

/// Renders a complete HTML document to PDF bytes.
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, html: &str) -> Result<Vec<u8>, RenderError>;
}

/// Runs `<program> -s <stylesheet> in.html out.pdf` in a scratch directory.
pub struct CommandPdfRenderer {
    program: String,
    stylesheet: PathBuf,
}

impl CommandPdfRenderer {
    pub fn new(program: impl Into<String>, stylesheet: PathBuf) -> Self {
        Self {
            program: program.into(),
            stylesheet,
        }
    }
}

#[async_trait]
impl PdfRenderer for CommandPdfRenderer {
    async fn render(&self, html: &str) -> Result<Vec<u8>, RenderError> {
        let workdir = tempfile::tempdir()?;
        let input = workdir.path().join("document.html");
        let output = workdir.path().join("document.pdf");
        tokio::fs::write(&input, html).await?;

        let result = Command::new(&self.program)
            .arg("-s")
            .arg(&self.stylesheet)
            .arg(&input)
            .arg(&output)
            .output()
            .await
            .map_err(|e| RenderError::Pdf(format!("could not run {}: {e}", self.program)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(RenderError::Pdf(format!(
                "{} exited with {}: {}",
                self.program,
                result.status,
                stderr.trim()
            )));
        }

        let pdf = tokio::fs::read(&output).await?;
        debug!("Rendered {} bytes of PDF", pdf.len());
        Ok(pdf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_render_error() {
        let renderer = CommandPdfRenderer::new(
            "definitely-not-a-pdf-renderer",
            PathBuf::from("static/print.css"),
        );
        let err = renderer.render("<html></html>").await.unwrap_err();
        assert!(matches!(err, RenderError::Pdf(msg) if msg.contains("could not run")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_program_reports_status() {
        // `false` ignores its arguments and exits 1.
        let renderer = CommandPdfRenderer::new("false", PathBuf::from("print.css"));
        let err = renderer.render("<html></html>").await.unwrap_err();
        assert!(matches!(err, RenderError::Pdf(msg) if msg.contains("false exited")));
    }
}
