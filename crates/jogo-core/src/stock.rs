use serde::{Deserialize, Serialize};

/// Global pack stock, singleton in the Coordination Store (I1, I2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalStock {
    pub packs_remaining: u64,
}

impl GlobalStock {
    pub const INITIAL_PACKS: u64 = 50;

    pub fn initial() -> Self {
        GlobalStock {
            packs_remaining: Self::INITIAL_PACKS,
        }
    }

    /// `true` iff `packs_remaining - delta` would stay `>= 0`.
    pub fn can_adjust(&self, delta: i64) -> bool {
        if delta >= 0 {
            true
        } else {
            self.packs_remaining as i64 + delta >= 0
        }
    }
}

impl Default for GlobalStock {
    fn default() -> Self {
        Self::initial()
    }
}
