use std::process::Stdio;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use tokio::{io::AsyncWriteExt, process::Command};
use tracing::{debug, warn};

use super::{OcrEngine, OcrError};
use crate::config::OcrConfig;

/// Runs the `tesseract` executable as a child process, feeding the image on stdin.
#[derive(Clone)]
pub struct TesseractEngine {
    bin: String,
    psm: u8,
}

impl TesseractEngine {
    pub fn new(cfg: &OcrConfig) -> Self {
        Self {
            bin: cfg.tesseract_bin.clone(),
            psm: cfg.psm,
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    async fn recognize(&self, image: Bytes) -> Result<String, OcrError> {
        let mut child = Command::new(&self.bin)
            .args(["stdin", "stdout", "--psm"])
            .arg(self.psm.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("spawn {}", self.bin))?;

        let mut stdin = child.stdin.take().context("tesseract stdin unavailable")?;
        let writer = tokio::spawn(async move {
            // tesseract may exit before reading everything from a corrupt image
            if let Err(e) = stdin.write_all(&image).await {
                debug!(error = %e, "tesseract closed stdin early");
            }
        });

        let output = child
            .wait_with_output()
            .await
            .context("wait for tesseract")?;
        let _ = writer.await;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(status = %output.status, %stderr, "tesseract failed");
            return Err(OcrError::Unreadable(stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
