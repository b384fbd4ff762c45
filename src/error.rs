use std::fmt;

#[derive(Debug, Clone)]
pub enum Error {
    InvalidData(String),
    InvalidConfig(String),
    InvalidShape(String),
    /// Inference was requested before any training occurred.
    NotTrained,
    /// An activation derivative was queried outside its defined domain.
    DerivativeUndefined { activation: &'static str, x: f64 },
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidData(msg) => write!(f, "invalid data: {msg}"),
            Error::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Error::InvalidShape(msg) => write!(f, "invalid shape: {msg}"),
            Error::NotTrained => write!(f, "model not initialized: call fit before predict"),
            Error::DerivativeUndefined { activation, x } => {
                write!(f, "derivative of {activation} is not defined at x = {x}")
            }
        }
    }
}

impl std::error::Error for Error {}
