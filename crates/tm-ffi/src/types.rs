use tm_gemm::BackendKind;
use tm_tile::TileError;

/// Status codes returned by all FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TMStatus {
    Ok = 0,
    ErrorInvalidArgument = 1,
    ErrorUnsupported = 2,
    ErrorPermission = 3,
    ErrorInternal = 4,
}

impl From<&tm_gemm::GemmError> for TMStatus {
    fn from(err: &tm_gemm::GemmError) -> Self {
        use tm_gemm::GemmError;
        match err {
            GemmError::DimensionMismatch { .. }
            | GemmError::SizeOverflow { .. }
            | GemmError::InvalidConfig(_) => {
                TMStatus::ErrorInvalidArgument
            }
            GemmError::Tile(TileError::PermissionDenied { .. }) => TMStatus::ErrorPermission,
            GemmError::Tile(TileError::Unsupported(_)) => TMStatus::ErrorUnsupported,
            GemmError::Tile(_) | GemmError::Other(_) => TMStatus::ErrorInternal,
        }
    }
}

/// Tile unit selector.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub enum TMBackendType {
    Auto = 0,
    Hardware = 1,
    Emulated = 2,
}

impl From<TMBackendType> for BackendKind {
    fn from(t: TMBackendType) -> Self {
        match t {
            TMBackendType::Auto => BackendKind::Auto,
            TMBackendType::Hardware => BackendKind::Hardware,
            TMBackendType::Emulated => BackendKind::Emulated,
        }
    }
}
