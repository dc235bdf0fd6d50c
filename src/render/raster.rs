use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use log::debug;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("rsvg-convert binary not found at '{0}'")]
    NotFound(String),

    #[error("rsvg-convert failed with exit code {exit_code:?}: {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Turns an SVG document into a PNG on disk. The board-image cache only
/// needs this one operation, and the trait keeps its idempotence testable
/// without a rasterizer binary installed.
pub trait SvgRasterizer {
    fn rasterize(&self, svg: &str, output: &Path, size: u32) -> Result<(), RenderError>;
}

/// Shells out to rsvg-convert, feeding the SVG document over stdin.
pub struct RsvgConvert {
    bin: String,
}

impl RsvgConvert {
    pub fn new(bin: &str) -> RsvgConvert {
        RsvgConvert {
            bin: bin.to_string(),
        }
    }
}

impl SvgRasterizer for RsvgConvert {
    fn rasterize(&self, svg: &str, output: &Path, size: u32) -> Result<(), RenderError> {
        debug!("rasterizing {} bytes of svg to {}", svg.len(), output.display());

        let mut child = Command::new(&self.bin)
            .arg("--width")
            .arg(size.to_string())
            .arg("--height")
            .arg(size.to_string())
            .arg("--output")
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => RenderError::NotFound(self.bin.clone()),
                _ => RenderError::Io(err),
            })?;

        child
            .stdin
            .take()
            .expect("stdin was piped")
            .write_all(svg.as_bytes())?;

        let result = child.wait_with_output()?;
        if !result.status.success() {
            return Err(RenderError::ExecutionFailed {
                exit_code: result.status.code(),
                stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_reports_not_found() {
        let rasterizer = RsvgConvert::new("/nonexistent/rsvg-convert");
        let dir = tempfile::tempdir().unwrap();
        let err = rasterizer
            .rasterize("<svg/>", &dir.path().join("out.png"), 64)
            .unwrap_err();
        assert!(matches!(err, RenderError::NotFound(_)));
    }
}
