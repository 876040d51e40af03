use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassroomError {
    #[error("Invalid event type: {0}")]
    InvalidEventType(String),

    #[error("Invalid trigger condition: {0}")]
    InvalidTriggerCondition(String),

    #[error("Invalid teacher action: {0}")]
    InvalidTeacherAction(String),

    #[error("Invalid behavior state: {0}")]
    InvalidState(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Level file error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ClassroomError>;
