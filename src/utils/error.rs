use thiserror::Error;

/// Why the command-line tokens could not be turned into a location.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("no argument list was supplied")]
    MissingInput,

    #[error("at least one location token is required")]
    EmptyInput,

    #[error("location token {index} is missing or not valid unicode")]
    MissingEntry { index: usize },
}

/// The underlying cause of a failed lookup.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("location must not be blank")]
    InvalidLocation,

    #[error("unsupported text encoding: {name}")]
    UnsupportedEncoding { name: String },

    #[error("bytes are not valid {encoding}")]
    Undecodable { encoding: &'static str },

    #[error("malformed request url: {0}")]
    MalformedUrl(#[from] url::ParseError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed JSON: {message}")]
    MalformedJson { message: String },

    #[error("record is missing required field `{field}`")]
    MissingField { field: &'static str },

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("processing was cancelled")]
    Cancelled,
}

impl LookupError {
    pub fn malformed_json(message: impl Into<String>) -> Self {
        LookupError::MalformedJson {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        LookupError::Config {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for LookupError {
    fn from(e: serde_json::Error) -> Self {
        LookupError::malformed_json(e.to_string())
    }
}

/// The single error kind reported by the query processor.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct QueryProcessingError {
    message: String,
    #[source]
    cause: LookupError,
}

impl QueryProcessingError {
    pub fn new(message: impl Into<String>, cause: LookupError) -> Self {
        Self {
            message: message.into(),
            cause,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> &LookupError {
        &self.cause
    }

    pub fn user_friendly_message(&self) -> String {
        match &self.cause {
            LookupError::Http(_) => format!("Could not fetch locations: {}", self.message),
            LookupError::MalformedJson { .. } | LookupError::MissingField { .. } => {
                format!("The service returned unexpected data: {}", self.message)
            }
            LookupError::Io(_) | LookupError::Csv(_) => {
                format!("Could not write the CSV file: {}", self.message)
            }
            LookupError::Cancelled => "Processing was cancelled".to_string(),
            _ => self.message.clone(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match &self.cause {
            LookupError::InvalidLocation => "Pass a non-empty location name",
            LookupError::UnsupportedEncoding { .. } | LookupError::Undecodable { .. } => {
                "Set output.encoding to a supported label such as UTF-8 or ISO-8859-1"
            }
            LookupError::MalformedUrl(_) | LookupError::Config { .. } => {
                "Check source.base_url in the configuration file"
            }
            LookupError::Http(_) => "Check network connectivity and that the service is up",
            LookupError::Io(_) | LookupError::Csv(_) => {
                "Check that output.directory exists or can be created and is writable"
            }
            LookupError::MalformedJson { .. } | LookupError::MissingField { .. } => {
                "The service response format may have changed; inspect it with --verbose"
            }
            LookupError::Cancelled => "Run the command again",
        }
    }

    /// Process exit status for the CLI. Network failures are worth retrying.
    pub fn exit_code(&self) -> i32 {
        match &self.cause {
            LookupError::Http(_) => 2,
            LookupError::Cancelled => 130,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, LookupError>;
