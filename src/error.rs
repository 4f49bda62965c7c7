use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scan root not found: {0}")]
    RootNotFound(PathBuf),

    #[error("Scan root is not a directory: {0}")]
    RootNotDirectory(PathBuf),
}

pub type Result<T> = std::result::Result<T, TreeError>;
