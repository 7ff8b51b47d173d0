//! Environment loading and typed readers

use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Error raised when an environment variable holds an unusable value
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    /// The variable is set but cannot be parsed
    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue { name: String, value: String },

    /// A `.env` file exists but cannot be read or parsed
    #[error("Unreadable .env file: {0}")]
    Dotenv(String),
}

/// Load a `.env` file from the working directory (or a parent) if one exists
///
/// Returns the path that was loaded, or `None` when there is no file. Runs
/// before logging is set up, so the caller reports the outcome.
pub fn load_dotenv() -> Result<Option<PathBuf>, EnvError> {
    dotenv_outcome(dotenvy::dotenv())
}

fn dotenv_outcome(result: dotenvy::Result<PathBuf>) -> Result<Option<PathBuf>, EnvError> {
    match result {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(EnvError::Dotenv(e.to_string())),
    }
}

/// Read a variable, treating empty or whitespace-only values as unset
pub fn var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read and parse a variable, `Ok(None)` when it is unset
pub fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>, EnvError> {
    match var(name) {
        None => Ok(None),
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| EnvError::InvalidValue {
                name: name.to_string(),
                value,
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotenv_outcome() {
        use std::io;

        let found = dotenv_outcome(Ok(PathBuf::from("/app/.env")));
        assert_eq!(found, Ok(Some(PathBuf::from("/app/.env"))));

        let missing = dotenvy::Error::Io(io::Error::new(io::ErrorKind::NotFound, "no .env"));
        assert_eq!(dotenv_outcome(Err(missing)), Ok(None));

        let broken = dotenvy::Error::LineParse("KEY='unterminated".to_string(), 4);
        assert!(matches!(dotenv_outcome(Err(broken)), Err(EnvError::Dotenv(_))));
    }

    #[test]
    fn test_blank_value_is_unset() {
        unsafe {
            std::env::set_var("FINSIGHT_TEST_BLANK", "   ");
        }
        assert_eq!(var("FINSIGHT_TEST_BLANK"), None);
        unsafe {
            std::env::remove_var("FINSIGHT_TEST_BLANK");
        }
    }

    #[test]
    fn test_parse_var() {
        unsafe {
            std::env::set_var("FINSIGHT_TEST_NUMBER", " 42 ");
            std::env::set_var("FINSIGHT_TEST_GARBAGE", "forty-two");
        }

        assert_eq!(parse_var::<u32>("FINSIGHT_TEST_NUMBER"), Ok(Some(42)));
        assert_eq!(parse_var::<u32>("FINSIGHT_TEST_MISSING_VAR"), Ok(None));
        assert!(matches!(
            parse_var::<u32>("FINSIGHT_TEST_GARBAGE"),
            Err(EnvError::InvalidValue { .. })
        ));

        unsafe {
            std::env::remove_var("FINSIGHT_TEST_NUMBER");
            std::env::remove_var("FINSIGHT_TEST_GARBAGE");
        }
    }
}
