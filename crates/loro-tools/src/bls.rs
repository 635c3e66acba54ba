//! Bilateral stimulation preferences.

use loro_core::types::BlsPrefs;
use loro_storage::{KeyValueStore, StorageBackend};

use crate::error::ToolError;
use crate::doc::load_doc;
use crate::{keys, persist};

pub const SPEED_RANGE: (u32, u32) = (10, 180);
pub const TONE_RANGE: (u32, u32) = (0, 1200);

pub struct BilateralPrefs<'a, B> {
    store: &'a mut KeyValueStore<B>,
}

impl<'a, B: StorageBackend> BilateralPrefs<'a, B> {
    pub fn new(store: &'a mut KeyValueStore<B>) -> Self {
        Self { store }
    }

    pub fn load(&self) -> BlsPrefs {
        normalize(load_doc(self.store, keys::BLS).unwrap_or_default())
    }

    pub fn save(&mut self, prefs: &BlsPrefs) -> Result<(), ToolError> {
        persist(self.store, keys::BLS, &normalize(prefs.clone()))
    }
}

/// Clamp ranges and force alternating-ear audio on.
pub fn normalize(mut prefs: BlsPrefs) -> BlsPrefs {
    prefs.speed = prefs.speed.clamp(SPEED_RANGE.0, SPEED_RANGE.1);
    prefs.tone_hz = prefs.tone_hz.clamp(TONE_RANGE.0, TONE_RANGE.1);
    prefs.volume = if prefs.volume.is_nan() {
        BlsPrefs::default().volume
    } else {
        prefs.volume.clamp(0.0, 1.0)
    };
    prefs.invert_audio = true;
    prefs
}

/// Milliseconds for one half sweep (one side to the other) at `speed`
/// sweeps per minute.
pub fn half_sweep_ms(speed: u32) -> f64 {
    let speed = speed.clamp(SPEED_RANGE.0, SPEED_RANGE.1);
    60.0 / f64::from(speed) * 500.0
}
