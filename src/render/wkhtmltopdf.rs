use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::MungeError;
use crate::render::PdfEngine;

/// HTML-to-PDF backend via the `wkhtmltopdf` binary.
///
/// Local file access must be enabled: every image reference in the generated
/// HTML is a relative path next to it, not a URL.
pub struct WkhtmlToPdf;

impl WkhtmlToPdf {
    fn build_convert_cmd(input: &Path, output: &Path) -> Command {
        let mut cmd = Command::new("wkhtmltopdf");
        cmd.arg("--enable-local-file-access").arg(input).arg(output);
        cmd
    }
}

impl PdfEngine for WkhtmlToPdf {
    fn convert(&self, input: &Path, output: &Path) -> Result<(), MungeError> {
        let mut cmd = Self::build_convert_cmd(input, output);
        debug!(?cmd, "invoking wkhtmltopdf");

        let out = cmd.output().map_err(|e| MungeError::ConversionFailure {
            status: None,
            stderr: format!("failed to spawn wkhtmltopdf: {e}"),
        })?;

        if !out.status.success() {
            return Err(MungeError::ConversionFailure {
                status: out.status.code(),
                stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
            });
        }

        Ok(())
    }
}
