use thiserror::Error;

#[derive(Error, Debug)]
pub enum GemmError {
    #[error("{operand} has {got} elements but [{rows}x{cols}] needs {expected}")]
    DimensionMismatch {
        operand: &'static str,
        rows: usize,
        cols: usize,
        expected: usize,
        got: usize,
    },
    #[error("{operand} of [{rows}x{cols}] overflows the address space")]
    SizeOverflow {
        operand: &'static str,
        rows: usize,
        cols: usize,
    },
    #[error("tile error: {0}")]
    Tile(#[from] tm_tile::TileError),
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, GemmError>;
