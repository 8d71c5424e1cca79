use std::error::Error;
use std::fmt;

/// Crate error type for helper, spatial and shell operations.
#[derive(Debug)]
pub enum HelperError {
    /// Wraps errors returned by `rusqlite`, including failures raised by loaded extensions.
    Sql(rusqlite::Error),
    /// Wraps errors returned by the `wkb` crate.
    Wkb(wkb::error::WkbError),
    /// WKT could not be written or parsed.
    Wkt(String),
    /// Console I/O failed.
    Io(std::io::Error),
    /// `update` was called without any column to set.
    EmptyData { table: String },
    /// A column in a table definition has an empty or whitespace-only name.
    BlankColumnName { table: String },
    /// A table that must be created fresh is already present.
    TableExists { table: String },
    /// Dynamic value type did not match the requested conversion target.
    ValueTypeMismatch {
        column: String,
        expected: &'static str,
        actual: &'static str,
    },
    /// Numeric conversion failed because the value is out of range.
    ValueOutOfRange { column: String },
    /// Requested column does not exist in the result set.
    MissingColumn { column: String },
    /// A SpatiaLite management function reported failure by returning 0.
    SpatialFunctionFailed { function: &'static str },
    /// A shell command needs a database but none has been opened yet.
    NoOpenDatabase,
    /// Shell input could not be interpreted.
    InvalidInput(String),
}

impl fmt::Display for HelperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sql(err) => write!(f, "{err}"),
            Self::Wkb(err) => write!(f, "{err}"),
            Self::Wkt(err) => write!(f, "wkt error: {err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::EmptyData { table } => {
                write!(f, "no column values given for update of table '{table}'")
            }
            Self::BlankColumnName { table } => {
                write!(f, "column name cannot be blank in table '{table}'")
            }
            Self::TableExists { table } => write!(f, "table '{table}' already exists"),
            Self::ValueTypeMismatch {
                column,
                expected,
                actual,
            } => write!(f, "column '{column}': expected {expected}, got {actual}"),
            Self::ValueOutOfRange { column } => {
                write!(f, "column '{column}': value out of range")
            }
            Self::MissingColumn { column } => write!(f, "missing column: {column}"),
            Self::SpatialFunctionFailed { function } => {
                write!(f, "{function}() returned failure")
            }
            Self::NoOpenDatabase => write!(f, "no database is open, choose 1 first"),
            Self::InvalidInput(input) => write!(f, "invalid input: {input}"),
        }
    }
}

impl Error for HelperError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sql(err) => Some(err),
            Self::Wkb(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for HelperError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Sql(err)
    }
}

impl From<wkb::error::WkbError> for HelperError {
    fn from(err: wkb::error::WkbError) -> Self {
        Self::Wkb(err)
    }
}

impl From<std::io::Error> for HelperError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, HelperError>;
