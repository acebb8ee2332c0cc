use crate::config::{TileConfig, TileId};
use crate::unit::TileUnit;

/// A configured tile unit with guaranteed release.
///
/// Opening a session applies the configuration; the unit is released exactly
/// once, either by [`TileSession::finish`] or when the session is dropped
/// (including while unwinding from a panic).
#[derive(Debug)]
pub struct TileSession<U: TileUnit> {
    unit: U,
    config: TileConfig,
    released: bool,
}

impl<U: TileUnit> TileSession<U> {
    /// Configure `unit` with `config` and take ownership of it.
    pub fn open(mut unit: U, config: TileConfig) -> Self {
        log::debug!("opening {} tile session: {:?}", unit.name(), config);
        unit.configure(&config);
        TileSession {
            unit,
            config,
            released: false,
        }
    }

    /// Apply a (possibly identical) configuration.
    pub fn reconfigure(&mut self, config: TileConfig) {
        self.config = config;
        self.unit.configure(&self.config);
    }

    pub fn config(&self) -> &TileConfig {
        &self.config
    }

    pub fn unit_name(&self) -> &str {
        self.unit.name()
    }

    pub fn load(&mut self, tile: TileId, buf: &[u8], stride: usize) {
        self.unit.load(tile, buf, stride)
    }

    pub fn multiply_accumulate(&mut self, dst: TileId, lhs: TileId, rhs: TileId) {
        self.unit.multiply_accumulate(dst, lhs, rhs)
    }

    pub fn store(&mut self, tile: TileId, buf: &mut [u8], stride: usize) {
        self.unit.store(tile, buf, stride)
    }

    /// Release the tile unit now.
    pub fn finish(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if !self.released {
            self.released = true;
            self.unit.release();
            log::debug!("released {} tile session", self.unit.name());
        }
    }
}

impl<U: TileUnit> Drop for TileSession<U> {
    fn drop(&mut self) {
        self.release_once();
    }
}
