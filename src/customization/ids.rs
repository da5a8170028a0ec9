use serde::{Deserialize, Serialize};

use crate::types::ItemId;

/// Mints [`ItemId`]s. Each analysis opens a new generation, so ids from
/// different analyses never collide and are never reused.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct IdAllocator {
    generation: u32,
    next_seq: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation and return its number.
    pub fn next_generation(&mut self) -> u32 {
        self.generation += 1;
        self.next_seq = 0;
        self.generation
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Mint the next id in the current generation.
    pub fn mint(&mut self) -> ItemId {
        let id = ItemId {
            generation: self.generation,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_unique_across_generations() {
        let mut ids = IdAllocator::new();
        let a = ids.mint();
        ids.next_generation();
        let b = ids.mint();
        let c = ids.mint();

        assert_eq!(a, ItemId { generation: 0, seq: 0 });
        assert_eq!(b, ItemId { generation: 1, seq: 0 });
        assert_ne!(b, c);
        assert_eq!(ids.generation(), 1);
    }
}
