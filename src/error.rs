//! Process-level error type.
//!
//! Every failure that reaches `main` is an `AppError`; the constructor used
//! decides the process exit code:
//! - `2`: bad input/configuration (unreadable corpus root, bad flags, export I/O)
//! - `3`: no data (empty corpus, empty view)
//! - `4`: terminal/render failures

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    /// Bad input or configuration.
    pub fn input(message: impl Into<String>) -> Self {
        Self::new(2, message)
    }

    /// The corpus (or a required view) produced no data.
    pub fn no_data(message: impl Into<String>) -> Self {
        Self::new(3, message)
    }

    /// Terminal setup or rendering failure.
    pub fn terminal(message: impl Into<String>) -> Self {
        Self::new(4, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_map_to_exit_codes() {
        assert_eq!(AppError::input("bad flag").exit_code(), 2);
        assert_eq!(AppError::no_data("empty corpus").exit_code(), 3);
        assert_eq!(AppError::terminal("raw mode").exit_code(), 4);
        assert_eq!(AppError::input("bad flag").to_string(), "bad flag");
    }
}
