use std::{error, fmt};

use tokio::sync::{mpsc, oneshot};

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorType {
    Bluez,
    ChannelError,
    UnknownCharacteristic,
    NotPermitted,
    Decode,
    Config,
}

impl From<ErrorType> for &'static str {
    fn from(error_type: ErrorType) -> &'static str {
        match error_type {
            ErrorType::Bluez => "Bluez",
            ErrorType::ChannelError => "ChannelError",
            ErrorType::UnknownCharacteristic => "UnknownCharacteristic",
            ErrorType::NotPermitted => "NotPermitted",
            ErrorType::Decode => "Decode",
            ErrorType::Config => "Config",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let error_type: &str = self.clone().into();
        write!(f, "<FtmsPeripheral {} Error>", error_type)
    }
}

impl error::Error for ErrorType {}

#[derive(Debug, Clone)]
pub struct Error {
    name: String,
    description: String,
    error_type: ErrorType,
}

impl Error {
    pub fn new<T: Into<String>>(name: T, description: T, error_type: ErrorType) -> Self {
        Error {
            name: name.into(),
            description: description.into(),
            error_type,
        }
    }

    pub fn from_type(error_type: ErrorType) -> Self {
        let name: String = error_type.to_string();
        let description: String = error_type.to_string();
        Error {
            name,
            description,
            error_type,
        }
    }

    pub fn from_string(error: String, error_type: ErrorType) -> Self {
        Error {
            name: error_type.to_string(),
            description: error,
            error_type,
        }
    }

    pub fn error_type(&self) -> &ErrorType {
        &self.error_type
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let error_type: &str = self.error_type.clone().into();
        write!(
            f,
            "**FtmsPeripheral {} Error**\n\n\t{}:\n\t\t{}",
            error_type, self.name, self.description,
        )
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(&self.error_type)
    }
}

impl<T> From<mpsc::error::SendError<T>> for Error {
    fn from(err: mpsc::error::SendError<T>) -> Self {
        Error::from_string(err.to_string(), ErrorType::ChannelError)
    }
}

impl From<oneshot::error::RecvError> for Error {
    fn from(err: oneshot::error::RecvError) -> Self {
        Error::from_string(err.to_string(), ErrorType::ChannelError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_error_type() {
        let err = Error::new(
            "lookup",
            "no characteristic 2ad2",
            ErrorType::UnknownCharacteristic,
        );
        let text = err.to_string();
        assert!(text.contains("UnknownCharacteristic"));
        assert!(text.contains("no characteristic 2ad2"));
        assert_eq!(err.error_type(), &ErrorType::UnknownCharacteristic);
    }

    #[test]
    fn source_is_the_error_type() {
        use std::error::Error as _;
        let err = Error::from_type(ErrorType::Config);
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("<FtmsPeripheral Config Error>"));
    }
}
