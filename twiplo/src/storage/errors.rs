use thiserror::Error;

/// Errors raised by object storage backends and the storage service
#[derive(Error, Debug)]
pub enum StorageError {
    /// Caller-supplied folder cannot be used as a key prefix
    #[error("Invalid folder '{folder}': {reason}")]
    InvalidFolder { folder: String, reason: String },

    /// Object upload failed in transport or was rejected by the bucket
    #[error("Failed to upload object {key}: {message}")]
    Upload { key: String, message: String },

    /// Presigned URL could not be produced
    #[error("Failed to presign object {key}: {message}")]
    Presign { key: String, message: String },
}

/// Type alias for storage operation results
pub type Result<T> = std::result::Result<T, StorageError>;
