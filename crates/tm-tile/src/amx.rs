//! Intel AMX tile unit, driven through inline assembly.
//!
//! Tile register numbers are immediates in the instruction encoding, so
//! every (instruction, register) pair is spelled out.

use std::arch::asm;
use std::marker::PhantomData;

use crate::config::{TileConfig, TileId};
use crate::gate::TileGrant;
use crate::unit::{check_buffer, TileUnit};

/// Hardware tile unit.
///
/// Tile state belongs to the thread that executed `ldtilecfg`, so this type
/// is neither `Send` nor `Sync`.
#[derive(Debug)]
pub struct AmxTileUnit {
    config: TileConfig,
    _grant: TileGrant,
    _thread_bound: PhantomData<*const ()>,
}

impl AmxTileUnit {
    /// Create a hardware unit. Requires a grant from
    /// [`crate::request_tile_permission`].
    pub fn new(grant: TileGrant) -> Self {
        AmxTileUnit {
            config: TileConfig::default(),
            _grant: grant,
            _thread_bound: PhantomData,
        }
    }
}

macro_rules! tdpbssd {
    ($ins:literal) => {
        // SAFETY: the grant proves tile data permission; the caller has
        // configured the unit (enforced by TileSession).
        unsafe { asm!($ins, options(nostack, nomem)) }
    };
}

impl TileUnit for AmxTileUnit {
    fn name(&self) -> &str {
        "amx"
    }

    fn configure(&mut self, config: &TileConfig) {
        self.config = *config;
        let raw = self.config.as_bytes().as_ptr();
        // SAFETY: `raw` points at a 64-byte, 64-byte aligned configuration
        // record that lives for the duration of the instruction.
        unsafe { asm!("ldtilecfg [{0}]", in(reg) raw, options(nostack, readonly)) }
    }

    fn load(&mut self, tile: TileId, buf: &[u8], stride: usize) {
        check_buffer("load", tile, self.config.shape(tile), buf.len(), stride);
        let base = buf.as_ptr();
        // SAFETY: the buffer backs rows x colsb bytes at `stride` (checked
        // above), and tile data permission has been granted.
        unsafe {
            match tile {
                TileId::T0 => asm!("tileloadd tmm0, [{b} + {s} * 1]", b = in(reg) base, s = in(reg) stride, options(nostack, readonly)),
                TileId::T1 => asm!("tileloadd tmm1, [{b} + {s} * 1]", b = in(reg) base, s = in(reg) stride, options(nostack, readonly)),
                TileId::T2 => asm!("tileloadd tmm2, [{b} + {s} * 1]", b = in(reg) base, s = in(reg) stride, options(nostack, readonly)),
                TileId::T3 => asm!("tileloadd tmm3, [{b} + {s} * 1]", b = in(reg) base, s = in(reg) stride, options(nostack, readonly)),
            }
        }
    }

    fn multiply_accumulate(&mut self, dst: TileId, lhs: TileId, rhs: TileId) {
        use TileId::*;
        match (dst, lhs, rhs) {
            (T0, T1, T2) => tdpbssd!("tdpbssd tmm0, tmm1, tmm2"),
            (T0, T1, T3) => tdpbssd!("tdpbssd tmm0, tmm1, tmm3"),
            (T0, T2, T1) => tdpbssd!("tdpbssd tmm0, tmm2, tmm1"),
            (T0, T2, T3) => tdpbssd!("tdpbssd tmm0, tmm2, tmm3"),
            (T0, T3, T1) => tdpbssd!("tdpbssd tmm0, tmm3, tmm1"),
            (T0, T3, T2) => tdpbssd!("tdpbssd tmm0, tmm3, tmm2"),
            (T1, T0, T2) => tdpbssd!("tdpbssd tmm1, tmm0, tmm2"),
            (T1, T0, T3) => tdpbssd!("tdpbssd tmm1, tmm0, tmm3"),
            (T1, T2, T0) => tdpbssd!("tdpbssd tmm1, tmm2, tmm0"),
            (T1, T2, T3) => tdpbssd!("tdpbssd tmm1, tmm2, tmm3"),
            (T1, T3, T0) => tdpbssd!("tdpbssd tmm1, tmm3, tmm0"),
            (T1, T3, T2) => tdpbssd!("tdpbssd tmm1, tmm3, tmm2"),
            (T2, T0, T1) => tdpbssd!("tdpbssd tmm2, tmm0, tmm1"),
            (T2, T0, T3) => tdpbssd!("tdpbssd tmm2, tmm0, tmm3"),
            (T2, T1, T0) => tdpbssd!("tdpbssd tmm2, tmm1, tmm0"),
            (T2, T1, T3) => tdpbssd!("tdpbssd tmm2, tmm1, tmm3"),
            (T2, T3, T0) => tdpbssd!("tdpbssd tmm2, tmm3, tmm0"),
            (T2, T3, T1) => tdpbssd!("tdpbssd tmm2, tmm3, tmm1"),
            (T3, T0, T1) => tdpbssd!("tdpbssd tmm3, tmm0, tmm1"),
            (T3, T0, T2) => tdpbssd!("tdpbssd tmm3, tmm0, tmm2"),
            (T3, T1, T0) => tdpbssd!("tdpbssd tmm3, tmm1, tmm0"),
            (T3, T1, T2) => tdpbssd!("tdpbssd tmm3, tmm1, tmm2"),
            (T3, T2, T0) => tdpbssd!("tdpbssd tmm3, tmm2, tmm0"),
            (T3, T2, T1) => tdpbssd!("tdpbssd tmm3, tmm2, tmm1"),
            _ => panic!("tdpbssd needs three distinct tiles, got {dst}, {lhs}, {rhs}"),
        }
    }

    fn store(&mut self, tile: TileId, buf: &mut [u8], stride: usize) {
        check_buffer("store", tile, self.config.shape(tile), buf.len(), stride);
        let base = buf.as_mut_ptr();
        // SAFETY: the buffer backs rows x colsb writable bytes at `stride`.
        unsafe {
            match tile {
                TileId::T0 => asm!("tilestored [{b} + {s} * 1], tmm0", b = in(reg) base, s = in(reg) stride, options(nostack)),
                TileId::T1 => asm!("tilestored [{b} + {s} * 1], tmm1", b = in(reg) base, s = in(reg) stride, options(nostack)),
                TileId::T2 => asm!("tilestored [{b} + {s} * 1], tmm2", b = in(reg) base, s = in(reg) stride, options(nostack)),
                TileId::T3 => asm!("tilestored [{b} + {s} * 1], tmm3", b = in(reg) base, s = in(reg) stride, options(nostack)),
            }
        }
    }

    fn release(&mut self) {
        self.config = TileConfig::default();
        // SAFETY: tilerelease is valid in any state once permission exists.
        unsafe { asm!("tilerelease", options(nostack, nomem)) }
    }
}
