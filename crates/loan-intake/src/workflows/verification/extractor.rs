/// Errors raised while turning an uploaded file into text.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("ocr engine not available: {0}")]
    EngineUnavailable(String),
    #[error("unsupported file format for text extraction")]
    UnsupportedFormat,
    #[error("{tool} exited with status {code:?}: {stderr}")]
    EngineFailed {
        tool: &'static str,
        code: Option<i32>,
        stderr: String,
    },
    #[error("pdf rendering produced no pages")]
    NoPagesRendered,
    #[error("ocr io failure: {0}")]
    Io(#[from] std::io::Error),
}

/// OCR boundary. Implementations recognise English text only.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, file: &[u8]) -> Result<String, ExtractionError>;
}

/// File kinds the extractor accepts, sniffed from leading magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Png,
    Jpeg,
}

impl DocumentFormat {
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"%PDF-") {
            Some(Self::Pdf)
        } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(Self::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else {
            None
        }
    }

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}
