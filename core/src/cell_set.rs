//! Dense bit set keyed by [`CellIndex`].

use std::hash::{Hash, Hasher};

use crate::CellIndex;

const WORD_BITS: usize = u64::BITS as usize;

/// Set of cells stored as one bit per row-major index.
///
/// Cloning copies the backing words, which keeps every clone independent of
/// the set it was taken from.
#[derive(Clone, Debug, Default)]
pub struct CellSet {
    words: Vec<u64>,
    len: usize,
}

impl CellSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty set sized for `cell_count` indices.
    #[must_use]
    pub fn with_capacity(cell_count: usize) -> Self {
        Self {
            words: vec![0; cell_count.div_ceil(WORD_BITS)],
            len: 0,
        }
    }

    /// Number of cells in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Reports whether the set holds no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reports whether the cell is a member.
    #[must_use]
    pub fn contains(&self, cell: CellIndex) -> bool {
        let (word, mask) = locate(cell);
        self.words
            .get(word)
            .is_some_and(|bits| bits & mask != 0)
    }

    /// Adds the cell, returning `true` when it was not present yet.
    pub fn insert(&mut self, cell: CellIndex) -> bool {
        let (word, mask) = locate(cell);
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        let bits = &mut self.words[word];
        if *bits & mask != 0 {
            return false;
        }
        *bits |= mask;
        self.len += 1;
        true
    }

    /// Removes the cell, returning `true` when it was present.
    pub fn remove(&mut self, cell: CellIndex) -> bool {
        let (word, mask) = locate(cell);
        let Some(bits) = self.words.get_mut(word) else {
            return false;
        };
        if *bits & mask == 0 {
            return false;
        }
        *bits &= !mask;
        self.len -= 1;
        true
    }

    /// Removes every cell while keeping the allocation.
    pub fn clear(&mut self) {
        self.words.fill(0);
        self.len = 0;
    }

    /// Iterates the members in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = CellIndex> + '_ {
        self.words
            .iter()
            .enumerate()
            .flat_map(|(word_index, &bits)| {
                (0..WORD_BITS)
                    .filter(move |bit| bits & (1u64 << bit) != 0)
                    .map(move |bit| CellIndex::new(word_index * WORD_BITS + bit))
            })
    }
}

impl CellSet {
    fn significant_words(&self) -> &[u64] {
        let used = self
            .words
            .iter()
            .rposition(|bits| *bits != 0)
            .map_or(0, |last| last + 1);
        &self.words[..used]
    }
}

impl PartialEq for CellSet {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.significant_words() == other.significant_words()
    }
}

impl Eq for CellSet {}

impl Hash for CellSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant_words().hash(state);
    }
}

impl FromIterator<CellIndex> for CellSet {
    fn from_iter<I: IntoIterator<Item = CellIndex>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl Extend<CellIndex> for CellSet {
    fn extend<I: IntoIterator<Item = CellIndex>>(&mut self, iter: I) {
        for cell in iter {
            let _ = self.insert(cell);
        }
    }
}

fn locate(cell: CellIndex) -> (usize, u64) {
    let index = cell.get();
    (index / WORD_BITS, 1u64 << (index % WORD_BITS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_remove_track_length() {
        let mut set = CellSet::with_capacity(225);
        assert!(set.insert(CellIndex::new(3)));
        assert!(set.insert(CellIndex::new(200)));
        assert!(!set.insert(CellIndex::new(3)));
        assert_eq!(set.len(), 2);

        assert!(set.remove(CellIndex::new(3)));
        assert!(!set.remove(CellIndex::new(3)));
        assert!(!set.remove(CellIndex::new(9_999)));
        assert_eq!(set.len(), 1);
        assert!(set.contains(CellIndex::new(200)));
    }

    #[test]
    fn grows_beyond_initial_capacity() {
        let mut set = CellSet::new();
        assert!(set.insert(CellIndex::new(130)));
        assert!(set.contains(CellIndex::new(130)));
        assert!(!set.contains(CellIndex::new(129)));
    }

    #[test]
    fn iterates_in_ascending_order() {
        let set: CellSet = [64, 1, 300, 63]
            .into_iter()
            .map(CellIndex::new)
            .collect();
        let members: Vec<usize> = set.iter().map(|cell| cell.get()).collect();
        assert_eq!(members, vec![1, 63, 64, 300]);
    }

    #[test]
    fn clones_do_not_share_storage() {
        let mut original: CellSet = [1, 2].into_iter().map(CellIndex::new).collect();
        let copy = original.clone();
        let _ = original.insert(CellIndex::new(5));
        assert!(!copy.contains(CellIndex::new(5)));
        original.clear();
        assert!(original.is_empty());
        assert_eq!(copy.len(), 2);
    }

    #[test]
    fn equality_ignores_spare_capacity() {
        let mut sized = CellSet::with_capacity(225);
        let _ = sized.insert(CellIndex::new(7));
        let compact: CellSet = std::iter::once(CellIndex::new(7)).collect();
        assert_eq!(sized, compact);
    }
}
