use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to marshal value for key '{key}': {message}")]
    Marshal { key: String, message: String },

    #[error("Failed to unmarshal value for key '{key}': {message}")]
    Unmarshal { key: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
