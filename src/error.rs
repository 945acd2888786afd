use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TansyncError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("corrupted stream: {0}")]
    CorruptedStream(String),

    #[error("buffer underflow: {0}")]
    BufferUnderflow(String),
}

impl TansyncError {
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        TansyncError::Config(msg.to_string())
    }

    pub fn table<T: fmt::Display>(msg: T) -> Self {
        TansyncError::Table(msg.to_string())
    }

    pub fn corrupted<T: fmt::Display>(msg: T) -> Self {
        TansyncError::CorruptedStream(msg.to_string())
    }

    pub fn underflow<T: fmt::Display>(msg: T) -> Self {
        TansyncError::BufferUnderflow(msg.to_string())
    }
}

pub type TansyncResult<T> = Result<T, TansyncError>;
