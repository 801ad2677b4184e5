use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] arrow_schema::ArrowError),

    #[error("missing required column: {0}")]
    MissingColumn(&'static str),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum HeadlineError {
    #[error("no headline marker in article text")]
    NotFound,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum QueryError {
    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("invalid sentiment type: {0}")]
    InvalidSentiment(String),
}

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV encoding failed: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),
}
