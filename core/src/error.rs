use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("q must be at least 1, got {0}")]
    InvalidQ(usize),

    #[error("failed to load catalogue {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read catalogue: {0}")]
    Io(#[from] std::io::Error),

    #[error("error budget must be non-negative, got {0}")]
    InvalidDelta(i64),
}

pub type Result<T> = std::result::Result<T, IndexError>;
