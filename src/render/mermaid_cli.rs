use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::MungeError;
use crate::render::DiagramRenderer;

/// Mermaid diagram renderer via `@mermaid-js/mermaid-cli`, run through npx so
/// no global install is required.
pub struct MermaidCli;

impl MermaidCli {
    /// Build the mmdc command: replaces ```mermaid fences in `input` with
    /// references to PNG files generated next to `output`.
    fn build_render_cmd(input: &Path, output: &Path) -> Command {
        let mut cmd = Command::new("npx");
        cmd.args(["-p", "@mermaid-js/mermaid-cli", "mmdc"])
            .arg(format!("--input={}", input.display()))
            .arg(format!("--output={}", output.display()))
            .arg("--outputFormat=png");
        cmd
    }
}

impl DiagramRenderer for MermaidCli {
    fn render(&self, input: &Path, output: &Path) -> Result<(), MungeError> {
        let mut cmd = Self::build_render_cmd(input, output);
        debug!(?cmd, "invoking mermaid-cli");

        let out = cmd.output().map_err(|e| MungeError::RenderFailure {
            status: None,
            stderr: format!("failed to spawn npx: {e}"),
        })?;

        if !out.status.success() {
            return Err(MungeError::RenderFailure {
                status: out.status.code(),
                stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
            });
        }

        Ok(())
    }
}
