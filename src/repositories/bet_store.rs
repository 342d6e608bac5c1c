//! Key-value storage for bet and custody records

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::StoreError;
use crate::models::{Bet, Custody};

/// Per-bet storage keyed by bet index.
///
/// A bet and its custody entry are always written and removed together.
pub trait BetStore: Send {
    fn get_bet(&self, bet_id: u64) -> Result<Option<Bet>, StoreError>;

    fn get_custody(&self, bet_id: u64) -> Result<Option<Custody>, StoreError>;

    /// Insert a new pair; fails with `Duplicate` if the index is taken
    fn insert(&mut self, bet: Bet, custody: Custody) -> Result<(), StoreError>;

    /// Overwrite an existing pair
    fn update(&mut self, bet: Bet, custody: Custody) -> Result<(), StoreError>;

    /// Remove and return the pair stored under `bet_id`
    fn remove(&mut self, bet_id: u64) -> Result<Option<(Bet, Custody)>, StoreError>;

    fn bet_ids(&self) -> Result<Vec<u64>, StoreError>;
}

/// Store held entirely in memory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryBetStore {
    bets: BTreeMap<u64, Bet>,
    custodies: BTreeMap<u64, Custody>,
}

impl InMemoryBetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bets.is_empty()
    }
}

impl BetStore for InMemoryBetStore {
    fn get_bet(&self, bet_id: u64) -> Result<Option<Bet>, StoreError> {
        Ok(self.bets.get(&bet_id).cloned())
    }

    fn get_custody(&self, bet_id: u64) -> Result<Option<Custody>, StoreError> {
        Ok(self.custodies.get(&bet_id).cloned())
    }

    fn insert(&mut self, bet: Bet, custody: Custody) -> Result<(), StoreError> {
        if self.bets.contains_key(&bet.id) || self.custodies.contains_key(&custody.bet_id) {
            return Err(StoreError::Duplicate(bet.id));
        }
        self.custodies.insert(custody.bet_id, custody);
        self.bets.insert(bet.id, bet);
        Ok(())
    }

    fn update(&mut self, bet: Bet, custody: Custody) -> Result<(), StoreError> {
        if bet.id != custody.bet_id {
            return Err(StoreError::Backend(format!(
                "Custody {} does not belong to bet {}",
                custody.bet_id, bet.id
            )));
        }
        if !self.bets.contains_key(&bet.id) {
            return Err(StoreError::Backend(format!("Bet {} is not stored", bet.id)));
        }
        self.custodies.insert(custody.bet_id, custody);
        self.bets.insert(bet.id, bet);
        Ok(())
    }

    fn remove(&mut self, bet_id: u64) -> Result<Option<(Bet, Custody)>, StoreError> {
        match (self.bets.remove(&bet_id), self.custodies.remove(&bet_id)) {
            (Some(bet), Some(custody)) => Ok(Some((bet, custody))),
            (None, None) => Ok(None),
            _ => Err(StoreError::Backend(format!(
                "Bet {} and its custody were out of step",
                bet_id
            ))),
        }
    }

    fn bet_ids(&self) -> Result<Vec<u64>, StoreError> {
        Ok(self.bets.keys().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BetTerms, Identity};

    fn pair(id: u64) -> (Bet, Custody) {
        let terms = BetTerms {
            creator: Identity::new([1; 32]),
            challenger: Identity::new([2; 32]),
            resolver_group: vec![Identity::new([3; 32])],
            creator_stake: 10,
            challenger_stake: 20,
            deadline: 100,
        };
        (Bet::new(id, terms, 0, 0), Custody { bet_id: id, balance: 10 })
    }

    #[test]
    fn test_insert_get_remove() {
        let mut store = InMemoryBetStore::new();
        let (bet, custody) = pair(4);
        store.insert(bet.clone(), custody.clone()).unwrap();

        assert_eq!(store.get_bet(4).unwrap(), Some(bet.clone()));
        assert_eq!(store.get_custody(4).unwrap(), Some(custody.clone()));
        assert_eq!(store.bet_ids().unwrap(), vec![4]);

        assert_eq!(store.remove(4).unwrap(), Some((bet, custody)));
        assert!(store.is_empty());
        assert_eq!(store.remove(4).unwrap(), None);
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let mut store = InMemoryBetStore::new();
        let (bet, custody) = pair(1);
        store.insert(bet.clone(), custody.clone()).unwrap();
        assert!(matches!(store.insert(bet, custody), Err(StoreError::Duplicate(1))));
    }

    #[test]
    fn test_update_requires_existing() {
        let mut store = InMemoryBetStore::new();
        let (bet, custody) = pair(2);
        assert!(store.update(bet, custody).is_err());
    }
}
