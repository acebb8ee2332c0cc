use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TileError {
    #[error("invalid tile shape: {rows} rows x {colsb} bytes (max 16 x 64, width a multiple of 4)")]
    InvalidShape { rows: usize, colsb: usize },
    #[error("matrix tile hardware unavailable: {0}")]
    Unsupported(String),
    #[error("kernel refused tile data permission (errno {errno})")]
    PermissionDenied { errno: i32 },
}

pub type Result<T> = std::result::Result<T, TileError>;
