use thiserror::Error;

#[derive(Error, Debug)]
pub enum VanityError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Backend(String),

    #[error("nothing to search")]
    NothingToSearch,
}

pub type Result<T> = std::result::Result<T, VanityError>;
