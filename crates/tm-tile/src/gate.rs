//! Capability gate: asks the kernel for permission to use tile data state.
//!
//! Linux keeps the (large) AMX tile data component out of a process's
//! signal and context-switch frames until the process opts in with
//! `arch_prctl(ARCH_REQ_XCOMP_PERM, XFEATURE_XTILEDATA)`. Executing a tile
//! instruction before that traps, so every hardware path goes through
//! [`request_tile_permission`] first.

use std::sync::OnceLock;

use crate::error::{Result, TileError};

pub const ARCH_GET_XCOMP_PERM: u64 = 0x1022;
pub const ARCH_REQ_XCOMP_PERM: u64 = 0x1023;
pub const XFEATURE_XTILEDATA: u64 = 18;

/// Proof that the capability gate succeeded for this process.
///
/// Only [`request_tile_permission`] hands these out; hardware tile units
/// demand one at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrant {
    _private: (),
}

/// Tile-related CPU features reported by CPUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuSupport {
    pub amx_tile: bool,
    pub amx_int8: bool,
}

impl CpuSupport {
    /// True when both the tile architecture and the int8 dot product exist.
    pub fn is_usable(&self) -> bool {
        self.amx_tile && self.amx_int8
    }
}

static GRANT: OnceLock<Result<TileGrant>> = OnceLock::new();

/// Query CPUID (leaf 7, subleaf 0, EDX bits 24/25).
#[cfg(target_arch = "x86_64")]
pub fn detect() -> CpuSupport {
    use std::arch::x86_64::{__cpuid_count, __get_cpuid_max};

    #[allow(unused_unsafe)]
    let (max_leaf, _) = unsafe { __get_cpuid_max(0) };
    if max_leaf < 7 {
        return CpuSupport::default();
    }
    #[allow(unused_unsafe)]
    let leaf7 = unsafe { __cpuid_count(7, 0) };
    CpuSupport {
        amx_tile: leaf7.edx & (1 << 24) != 0,
        amx_int8: leaf7.edx & (1 << 25) != 0,
    }
}

#[cfg(not(target_arch = "x86_64"))]
pub fn detect() -> CpuSupport {
    CpuSupport::default()
}

/// Request tile data permission for the process.
///
/// The kernel request is issued at most once; later calls return the cached
/// outcome.
pub fn request_tile_permission() -> Result<TileGrant> {
    GRANT.get_or_init(request_uncached).clone()
}

fn request_uncached() -> Result<TileGrant> {
    let support = detect();
    if !support.is_usable() {
        let err = TileError::Unsupported(format!(
            "cpu reports amx-tile={} amx-int8={}",
            support.amx_tile, support.amx_int8
        ));
        log::warn!("tile permission not requested: {}", err);
        return Err(err);
    }

    match sys::request_xtiledata() {
        Ok(()) => {
            log::info!("tile data use granted (XFEATURE_XTILEDATA)");
            Ok(TileGrant { _private: () })
        }
        Err(err) => {
            log::warn!("tile data use refused: {}", err);
            Err(err)
        }
    }
}

#[cfg(all(target_arch = "x86_64", target_os = "linux"))]
mod sys {
    use super::{ARCH_GET_XCOMP_PERM, ARCH_REQ_XCOMP_PERM, XFEATURE_XTILEDATA};
    use crate::error::{Result, TileError};

    fn last_errno() -> i32 {
        std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
    }

    pub(super) fn request_xtiledata() -> Result<()> {
        // SAFETY: arch_prctl with ARCH_REQ_XCOMP_PERM takes an integer
        // feature number and touches no user memory.
        let rc = unsafe {
            libc::syscall(
                libc::SYS_arch_prctl,
                ARCH_REQ_XCOMP_PERM as libc::c_ulong,
                XFEATURE_XTILEDATA as libc::c_ulong,
            )
        };
        if rc != 0 {
            return Err(TileError::PermissionDenied { errno: last_errno() });
        }

        let mut bitmask: u64 = 0;
        // SAFETY: the kernel writes one u64 through the pointer.
        let rc = unsafe {
            libc::syscall(
                libc::SYS_arch_prctl,
                ARCH_GET_XCOMP_PERM as libc::c_ulong,
                &mut bitmask as *mut u64,
            )
        };
        if rc != 0 {
            return Err(TileError::PermissionDenied { errno: last_errno() });
        }
        if bitmask & (1 << XFEATURE_XTILEDATA) == 0 {
            return Err(TileError::Unsupported(format!(
                "permitted xfeature mask {:#x} lacks tile data",
                bitmask
            )));
        }
        Ok(())
    }
}

#[cfg(not(all(target_arch = "x86_64", target_os = "linux")))]
mod sys {
    use crate::error::{Result, TileError};

    pub(super) fn request_xtiledata() -> Result<()> {
        Err(TileError::Unsupported(
            "tile permission requests need x86_64 Linux".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_is_idempotent() {
        let first = request_tile_permission();
        let second = request_tile_permission();
        assert_eq!(first, second);
    }

    #[test]
    fn test_gate_agrees_with_cpuid() {
        if !detect().is_usable() {
            assert!(matches!(
                request_tile_permission(),
                Err(TileError::Unsupported(_))
            ));
        }
    }

    #[test]
    fn test_cpu_support_requires_both_bits() {
        let partial = CpuSupport {
            amx_tile: true,
            amx_int8: false,
        };
        assert!(!partial.is_usable());
        assert!(CpuSupport {
            amx_tile: true,
            amx_int8: true
        }
        .is_usable());
    }
}
