use crate::forms::FieldErrors;
use camino::FromPathBufError;
use derive_builder::UninitializedFieldError;
use pastey::paste;
use reqwest::Error as HttpError;
use serde_json::Error as JsonError;
use serde_norway::Error as YamlError;
use snafu::{Backtrace, GenerateImplicitData, Snafu};
use std::{io::Error as IoError, string::FromUtf8Error};

type DecodeError = serde_path_to_error::Error<JsonError>;

#[derive(Snafu, Debug)]
#[snafu(visibility(pub))]
pub enum Error {
    Io {
        source: IoError,
        backtrace: Backtrace,
    },
    FromUtf8 {
        source: FromUtf8Error,
        backtrace: Backtrace,
    },
    Yaml {
        source: YamlError,
        backtrace: Backtrace,
    },
    Json {
        source: JsonError,
        backtrace: Backtrace,
    },
    #[snafu(display("Could not decode response at `{}`: {}", source.path(), source.inner()))]
    Decode {
        source: DecodeError,
        backtrace: Backtrace,
    },
    #[snafu(display("[Network error]: {source}"))]
    Http {
        source: HttpError,
        backtrace: Backtrace,
    },
    Csv {
        source: csv::Error,
        backtrace: Backtrace,
    },
    NonUtf8Path {
        source: FromPathBufError,
        backtrace: Backtrace,
    },
    #[snafu(display("{source}"))]
    ClientGoals {
        source: ClientGoalsError,
        backtrace: Backtrace,
    },
    #[snafu(display("{message}"))]
    Other {
        message: String,
        //backtrace: Backtrace,
    },
}

#[derive(Snafu, Debug)]
#[snafu(visibility(pub))]
pub enum ClientGoalsError {
    #[snafu(display("{}", messages.join("; ")))]
    GraphQl { messages: Vec<String> },
    #[snafu(display("{endpoint} responded with HTTP {status}: {body}"))]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },
    #[snafu(display("{reason}"))]
    Auth { reason: String },
    #[snafu(display("Invalid input: {errors}"))]
    Validation { errors: FieldErrors },
    #[snafu(display("{entity} {id} not found"))]
    NotFound { entity: &'static str, id: i64 },
    #[snafu(display("Response did not contain `{field}`"))]
    MissingData { field: String },
    #[snafu(display("Unsupported file type: {ext}"))]
    UnsupportedFileType { ext: String },
    #[snafu(display("Missing required field `{field}`"))]
    MissingField { field: String },
}

impl Error {
    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self {
            Self::Io { backtrace, .. } => Some(backtrace),
            Self::FromUtf8 { backtrace, .. } => Some(backtrace),
            Self::Yaml { backtrace, .. } => Some(backtrace),
            Self::Json { backtrace, .. } => Some(backtrace),
            Self::Decode { backtrace, .. } => Some(backtrace),
            Self::Http { backtrace, .. } => Some(backtrace),
            Self::Csv { backtrace, .. } => Some(backtrace),
            Self::NonUtf8Path { backtrace, .. } => Some(backtrace),
            Self::ClientGoals { backtrace, .. } => Some(backtrace),
            _ => None,
        }
    }

    pub fn simple<S: AsRef<str>>(message: S) -> Self {
        Self::Other {
            message: String::from(message.as_ref()),
        }
    }

    /// The domain error behind this error, if there is one.
    pub fn kind(&self) -> Option<&ClientGoalsError> {
        match self {
            Self::ClientGoals { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn graphql<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ClientGoalsError::GraphQl {
            messages: messages.into_iter().map(Into::into).collect(),
        }
        .into()
    }

    pub fn status<E: AsRef<str>, B: AsRef<str>>(endpoint: E, status: u16, body: B) -> Self {
        ClientGoalsError::Status {
            endpoint: String::from(endpoint.as_ref()),
            status,
            body: body.as_ref().chars().take(200).collect(),
        }
        .into()
    }

    pub fn auth<S: AsRef<str>>(reason: S) -> Self {
        ClientGoalsError::Auth {
            reason: String::from(reason.as_ref()),
        }
        .into()
    }

    pub fn validation(errors: FieldErrors) -> Self {
        ClientGoalsError::Validation { errors }.into()
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        ClientGoalsError::NotFound { entity, id }.into()
    }

    pub fn missing_data<S: AsRef<str>>(field: S) -> Self {
        ClientGoalsError::MissingData {
            field: String::from(field.as_ref()),
        }
        .into()
    }

    pub fn unsupported_file_type<S: AsRef<str>>(ext: S) -> Self {
        ClientGoalsError::UnsupportedFileType {
            ext: String::from(ext.as_ref()),
        }
        .into()
    }

    #[inline]
    pub fn is_auth(&self) -> bool {
        matches!(
            self.kind(),
            Some(
                ClientGoalsError::Auth { .. }
                    | ClientGoalsError::Status {
                        status: 401 | 403,
                        ..
                    }
            )
        )
    }

    #[inline]
    pub fn is_validation(&self) -> bool {
        matches!(self.kind(), Some(ClientGoalsError::Validation { .. }))
    }
}

macro_rules! impl_from {
    ($type:path, $error:ident, $base_error:ident) => {
        impl From<$type> for $base_error {
            fn from(error: $type) -> Self {
                Self::$error {
                    source: error,
                    backtrace: Backtrace::generate(),
                }
            }
        }
    };
    ($type:path, $error:ident) => {
        impl_from! { $type, $error, Error }
    };
    ($name:ident) => {
        paste! {
            impl_from! { [<$name Error>], $name }
        }
    };
}

impl_from! {FromPathBufError, NonUtf8Path}
impl_from! {ClientGoalsError, ClientGoals}
impl_from! {DecodeError, Decode}
impl_from! {csv::Error, Csv}
impl_from! {Io}
impl_from! {FromUtf8}
impl_from! {Yaml}
impl_from! {Json}
impl_from! {Http}

impl From<UninitializedFieldError> for Error {
    fn from(error: UninitializedFieldError) -> Self {
        ClientGoalsError::MissingField {
            field: String::from(error.field_name()),
        }
        .into()
    }
}

pub type Result<V> = core::result::Result<V, Error>;
