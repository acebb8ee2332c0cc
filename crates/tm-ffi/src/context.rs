use std::ffi::CString;

use tm_gemm::DynGemm;

/// Opaque engine handle owning a configured tile unit.
///
/// Tile state is per thread: a handle must be used (and destroyed) on the
/// thread that created it.
pub struct TMEngine {
    pub gemm: DynGemm,
    pub name: CString,
}

impl TMEngine {
    pub fn new(gemm: DynGemm) -> Self {
        let name = CString::new(gemm.backend_name()).unwrap_or_default();
        Self { gemm, name }
    }
}
