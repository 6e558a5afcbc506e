use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("Missing dependency: {0}")]
    MissingDependency(&'static str),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

pub type Result<T> = std::result::Result<T, ExecutorError>;
