#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("upload failed: {0}")]
    Upload(String),
    #[error("download failed: {0}")]
    Download(String),
    /// Listing failures carry the backend message as-is.
    #[error("{0}")]
    Listing(String),
}

impl StoreError {
    pub fn is_upload(&self) -> bool {
        matches!(self, StoreError::Upload(_))
    }

    pub fn is_download(&self) -> bool {
        matches!(self, StoreError::Download(_))
    }
}

pub(crate) fn require_non_empty(field: &'static str, value: &str) -> Result<(), StoreError> {
    if value.is_empty() {
        return Err(StoreError::InvalidArgument(format!("{field} must not be empty")));
    }
    Ok(())
}
