use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use super::extractor::{DocumentFormat, ExtractionError, TextExtractor};
use crate::config::OcrConfig;

/// Recognition language handed to tesseract.
pub const OCR_LANGUAGE: &str = "eng";

/// OCR through the `tesseract` CLI; PDFs are rasterised with `pdftoppm` first.
#[derive(Debug, Clone)]
pub struct TesseractExtractor {
    tesseract_bin: String,
    pdftoppm_bin: String,
    render_dpi: u32,
}

impl TesseractExtractor {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            tesseract_bin: config.tesseract_bin.clone(),
            pdftoppm_bin: config.pdftoppm_bin.clone(),
            render_dpi: config.render_dpi,
        }
    }

    fn locate(binary: &str) -> Result<PathBuf, ExtractionError> {
        which::which(binary)
            .map_err(|err| ExtractionError::EngineUnavailable(format!("{binary}: {err}")))
    }

    fn render_pdf(&self, pdf: &Path, workdir: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
        let pdftoppm = Self::locate(&self.pdftoppm_bin)?;
        let prefix = workdir.join("page");
        let output = Command::new(pdftoppm)
            .arg("-r")
            .arg(self.render_dpi.to_string())
            .arg("-png")
            .arg(pdf)
            .arg(&prefix)
            .output()?;

        if !output.status.success() {
            return Err(ExtractionError::EngineFailed {
                tool: "pdftoppm",
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        // pdftoppm zero-pads page numbers, so lexical order is page order.
        let mut pages: Vec<PathBuf> = std::fs::read_dir(workdir)?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| {
                let is_page = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .map(|name| name.starts_with("page"))
                    .unwrap_or(false);
                is_page && path.extension().and_then(|ext| ext.to_str()) == Some("png")
            })
            .collect();
        pages.sort();

        if pages.is_empty() {
            return Err(ExtractionError::NoPagesRendered);
        }
        debug!(pages = pages.len(), "rendered pdf for ocr");
        Ok(pages)
    }

    fn recognize(&self, tesseract: &Path, image: &Path) -> Result<String, ExtractionError> {
        let output = Command::new(tesseract)
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(OCR_LANGUAGE)
            .output()?;

        for line in String::from_utf8_lossy(&output.stderr).lines() {
            debug!(image = %image.display(), progress = line, "tesseract");
        }

        if !output.status.success() {
            return Err(ExtractionError::EngineFailed {
                tool: "tesseract",
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl TextExtractor for TesseractExtractor {
    fn extract(&self, file: &[u8]) -> Result<String, ExtractionError> {
        let format = DocumentFormat::sniff(file).ok_or(ExtractionError::UnsupportedFormat)?;
        let tesseract = Self::locate(&self.tesseract_bin)?;

        let workdir = tempfile::tempdir()?;
        let input = workdir.path().join(format!("upload.{}", format.extension()));
        std::fs::write(&input, file)?;

        let images = match format {
            DocumentFormat::Pdf => self.render_pdf(&input, workdir.path())?,
            DocumentFormat::Png | DocumentFormat::Jpeg => vec![input],
        };

        let mut pages = Vec::with_capacity(images.len());
        for image in &images {
            pages.push(self.recognize(&tesseract, image)?);
        }

        let text = pages.join("\n");
        debug!(characters = text.chars().count(), "ocr finished");
        Ok(text)
    }
}
