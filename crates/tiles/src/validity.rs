use bitvec::prelude::{BitVec, Lsb0};

/// One validity bit per tile plus a running count of set bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileValidity {
    bits: BitVec<usize, Lsb0>,
    valid_count: usize,
}

impl TileValidity {
    pub fn new(tile_count: usize) -> Self {
        Self {
            bits: BitVec::repeat(false, tile_count),
            valid_count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn valid_count(&self) -> usize {
        self.valid_count
    }

    pub fn is_complete(&self) -> bool {
        self.valid_count == self.bits.len()
    }

    pub fn is_valid(&self, index: usize) -> bool {
        self.bits.get(index).is_some_and(|bit| *bit)
    }

    /// Returns whether the bit changed.
    pub fn set_valid(&mut self, index: usize) -> bool {
        let Some(mut slot) = self.bits.get_mut(index) else {
            return false;
        };
        if *slot {
            return false;
        }
        *slot = true;
        self.valid_count += 1;
        true
    }

    /// Returns whether the bit changed.
    pub fn invalidate(&mut self, index: usize) -> bool {
        let Some(mut slot) = self.bits.get_mut(index) else {
            return false;
        };
        if !*slot {
            return false;
        }
        *slot = false;
        self.valid_count -= 1;
        true
    }

    pub fn invalidate_all(&mut self) {
        self.bits.fill(false);
        self.valid_count = 0;
    }

    pub fn iter_valid(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter_ones()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_tracks_bit_changes() {
        let mut validity = TileValidity::new(4);
        assert!(validity.set_valid(1));
        assert!(!validity.set_valid(1));
        assert!(validity.set_valid(3));
        assert_eq!(validity.valid_count(), 2);
        assert_eq!(validity.iter_valid().collect::<Vec<_>>(), vec![1, 3]);
        assert!(validity.invalidate(1));
        assert!(!validity.invalidate(1));
        assert!(!validity.set_valid(10));
        validity.invalidate_all();
        assert_eq!(validity.valid_count(), 0);
    }
}
