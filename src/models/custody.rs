use serde::{Deserialize, Serialize};

/// Value locked for one bet, keyed by the same index as the bet record.
///
/// Balance only grows through deposits and is drained once, in full,
/// when the bet closes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Custody {
    pub bet_id: u64,
    pub(crate) balance: u64,
}

impl Custody {
    pub fn balance(&self) -> u64 {
        self.balance
    }
}
