#[derive(Debug, thiserror::Error)]
pub enum TabevalError {
    #[error("Model error: {0}")]
    Model(String),

    #[error("Session error: {0}")]
    Session(String),
}

pub type Result<T> = std::result::Result<T, TabevalError>;
