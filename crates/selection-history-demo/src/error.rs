use thiserror::Error;

use selection_history::ConfigError;

pub type Result<T> = std::result::Result<T, DemoError>;

#[derive(Debug, Error)]
pub enum DemoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("line {line}: {message}")]
    Script { line: usize, message: String },

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl DemoError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::InvalidArgument { .. } => 2,
            Self::Script { .. } => 3,
            Self::Io(_) => 1,
        }
    }

    #[must_use]
    pub fn script(line: usize, message: impl Into<String>) -> Self {
        Self::Script {
            line,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DemoError;

    #[test]
    fn script_error_names_the_line() {
        let error = DemoError::script(7, "unknown command `jump`");
        assert_eq!(error.to_string(), "line 7: unknown command `jump`");
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn config_errors_exit_with_usage_code() {
        let error = DemoError::from(selection_history::ConfigError::Validation(vec![
            "max_depth must be between 1 and 128".to_string(),
        ]));
        assert_eq!(error.exit_code(), 2);
    }
}
