use thiserror::Error;

/// Extensions accepted by the format dispatcher, in the order they are listed to users.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["docx", "txt", "md", "markdown"];

#[derive(Error, Debug)]
pub enum ManuscriptError {
    #[error("Unsupported file type: .{extension}. Upload .docx, .txt, or .md/.markdown files.")]
    UnsupportedFormat { extension: String },

    #[error("Unable to read document: {0}")]
    MalformedDocument(String),

    #[error("Parsing cancelled.")]
    Cancelled,

    #[error("Failed to fetch guidelines after {attempts} attempt(s): {message}")]
    TransientFetch { attempts: u32, message: String },

    #[error("Unexpected guidelines response format")]
    UnexpectedGuidelineFormat,

    #[error("Guideline not found for {journal} {article_type}")]
    GuidelineNotFound {
        journal: String,
        article_type: String,
    },

    #[error("Background analysis unavailable: {0}")]
    WorkerUnavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ManuscriptError {
    /// Superseded requests are not failures; callers should not surface them as errors.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ManuscriptError::Cancelled)
    }
}

impl From<zip::result::ZipError> for ManuscriptError {
    fn from(err: zip::result::ZipError) -> Self {
        ManuscriptError::MalformedDocument(err.to_string())
    }
}

impl From<quick_xml::Error> for ManuscriptError {
    fn from(err: quick_xml::Error) -> Self {
        ManuscriptError::MalformedDocument(format!("invalid document XML: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, ManuscriptError>;
