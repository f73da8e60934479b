use std::{error::Error, fmt::Display};

#[derive(Debug)]
pub enum StoreError {
    Fetch(String),
    NotFound(String),
    Subscription(String),
    Lock(String),
    Config(String),
    Serialize(String),
}

impl Error for StoreError {}

impl Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetch(msg) => write!(f, "{msg}"),
            Self::NotFound(msg) => write!(f, "{msg}"),
            Self::Subscription(msg) => write!(f, "{msg}"),
            Self::Lock(msg) => write!(f, "{msg}"),
            Self::Config(msg) => write!(f, "{msg}"),
            Self::Serialize(msg) => write!(f, "{msg}"),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        StoreError::Serialize(format!("{value}"))
    }
}
