use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("virtual node count must be at least 1, got {0}")]
    InvalidVirtualNodeCount(usize),

    #[error("Parse error: {0}")]
    Parse(String),
}
