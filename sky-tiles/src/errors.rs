use sky_geom::GeomError;
use thiserror::Error;

pub type TileResult<T> = Result<T, TileError>;

#[derive(Debug, Error)]
pub enum TileError {
    /// A row of the tile table could not be parsed. `line` is 1-based.
    #[error("Tile table line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Failed to read tile table: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Two corners that should bound an edge produced no half-space. `line`
    /// is 0 for tiles built outside a table.
    #[error("Tile table line {line}: cannot build edge {first:?} to {second:?}: {message}")]
    MissingEdge {
        first: (f64, f64),
        second: (f64, f64),
        message: String,
        line: usize,
    },

    #[error("Duplicate tile id {id} at line {line}")]
    DuplicateTile { id: i64, line: usize },

    #[error("Unknown tile id {id}")]
    UnknownTile { id: i64 },

    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    #[error(transparent)]
    Geometry(#[from] GeomError),
}

impl TileError {
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    pub fn missing_edge(first: (f64, f64), second: (f64, f64), cause: &GeomError) -> Self {
        Self::MissingEdge {
            first,
            second,
            message: cause.to_string(),
            line: 0,
        }
    }

    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Moves an error produced for a bare row onto its line in the file.
    /// Geometry errors become parse errors at that line.
    pub(crate) fn at_line(self, line: usize) -> Self {
        match self {
            Self::Parse { message, .. } => Self::Parse { line, message },
            Self::DuplicateTile { id, .. } => Self::DuplicateTile { id, line },
            Self::MissingEdge {
                first,
                second,
                message,
                ..
            } => Self::MissingEdge {
                first,
                second,
                message,
                line,
            },
            Self::Geometry(e) => Self::parse(line, e.to_string()),
            other => other,
        }
    }
}
