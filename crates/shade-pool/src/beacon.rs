//! randomness beacons for batch ordering
//!
//! a beacon is asked for its output only after the batch contents are
//! fixed, and the output is mixed with a digest of those contents, so
//! nobody can pick an order set that lands in a favourable position.

use parking_lot::Mutex;
use rand::RngCore;

use crate::hash::Hash;
use crate::BEACON_DOMAIN;

pub trait RandomnessBeacon: Send + Sync {
    /// randomness for `epoch`, bound to the already-fixed batch contents
    fn reveal(&self, epoch: u64, batch_digest: &Hash) -> Hash;
}

fn mix(source: &Hash, epoch: u64, batch_digest: &Hash) -> Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(BEACON_DOMAIN);
    hasher.update(source);
    hasher.update(&epoch.to_le_bytes());
    hasher.update(batch_digest);
    *hasher.finalize().as_bytes()
}

/// fresh os entropy on every reveal
#[derive(Clone, Copy, Debug, Default)]
pub struct OsBeacon;

impl RandomnessBeacon for OsBeacon {
    fn reveal(&self, epoch: u64, batch_digest: &Hash) -> Hash {
        let mut source = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut source);
        mix(&source, epoch, batch_digest)
    }
}

/// deterministic beacon for tests and replays
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FixedBeacon(pub Hash);

impl RandomnessBeacon for FixedBeacon {
    fn reveal(&self, epoch: u64, batch_digest: &Hash) -> Hash {
        mix(&self.0, epoch, batch_digest)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Accumulator {
    current: Hash,
    /// accumulator value at the end of the last three epochs, newest first
    history: [Hash; 3],
}

/// beacon fed by external contributions (vrf outputs, block hashes)
///
/// contributions are folded into a running blake3 accumulator; each reveal
/// reads the current value and copies it into the epoch history, where
/// [`EntropyBeacon::epoch_entropy`] can look it up later. unless
/// built with [`EntropyBeacon::deterministic`], os entropy is mixed in too,
/// so a beacon with no contributions is still unpredictable.
#[derive(Debug)]
pub struct EntropyBeacon {
    acc: Mutex<Accumulator>,
    os_entropy: bool,
}

impl EntropyBeacon {
    pub fn new(genesis: Hash) -> Self {
        Self {
            acc: Mutex::new(Accumulator {
                current: genesis,
                history: [genesis; 3],
            }),
            os_entropy: true,
        }
    }

    /// output depends only on genesis and contributions
    pub fn deterministic(genesis: Hash) -> Self {
        Self {
            os_entropy: false,
            ..Self::new(genesis)
        }
    }

    pub fn accumulate(&self, contribution: &Hash) {
        let mut acc = self.acc.lock();
        let mut hasher = blake3::Hasher::new();
        hasher.update(&acc.current);
        hasher.update(contribution);
        acc.current = *hasher.finalize().as_bytes();
    }

    /// current -> history[0] -> history[1] -> history[2]
    pub fn rotate_epoch(&self) {
        let mut acc = self.acc.lock();
        acc.history = [acc.current, acc.history[0], acc.history[1]];
    }

    pub fn current(&self) -> Hash {
        self.acc.lock().current
    }

    /// 0 is the current value, 1..=3 the end of previous epochs; older
    /// indices clamp to the oldest kept
    pub fn epoch_entropy(&self, index: usize) -> Hash {
        let acc = self.acc.lock();
        match index {
            0 => acc.current,
            i => acc.history[(i - 1).min(2)],
        }
    }
}

impl RandomnessBeacon for EntropyBeacon {
    fn reveal(&self, epoch: u64, batch_digest: &Hash) -> Hash {
        let mut source = self.current();
        if self.os_entropy {
            let mut fresh = [0u8; 32];
            rand::rngs::OsRng.fill_bytes(&mut fresh);
            let mut hasher = blake3::Hasher::new();
            hasher.update(&source);
            hasher.update(&fresh);
            source = *hasher.finalize().as_bytes();
        }
        self.rotate_epoch();
        mix(&source, epoch, batch_digest)
    }
}
