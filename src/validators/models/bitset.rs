//! Fixed-capacity bit set over automaton positions
//!
//! Sets of up to 64 positions live inline in a single word, larger ones on
//! the heap. Both representations behave identically.

use std::fmt;

const WORD_BITS: usize = 64;

#[derive(Clone, PartialEq, Eq, Hash)]
enum Words {
    Inline(u64),
    Heap(Box<[u64]>),
}

/// A set of positions in `[0, capacity)`
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BitSet {
    capacity: usize,
    words: Words,
}

impl BitSet {
    /// Create an empty set able to hold positions `0..capacity`
    pub fn new(capacity: usize) -> Self {
        let words = if capacity <= WORD_BITS {
            Words::Inline(0)
        } else {
            Words::Heap(vec![0; capacity.div_ceil(WORD_BITS)].into_boxed_slice())
        };
        Self { capacity, words }
    }

    /// Number of positions this set can hold
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn words(&self) -> &[u64] {
        match &self.words {
            Words::Inline(word) => std::slice::from_ref(word),
            Words::Heap(words) => words,
        }
    }

    fn words_mut(&mut self) -> &mut [u64] {
        match &mut self.words {
            Words::Inline(word) => std::slice::from_mut(word),
            Words::Heap(words) => words,
        }
    }

    #[inline]
    fn check_index(&self, index: usize) {
        assert!(
            index < self.capacity,
            "bit index {} out of range for capacity {}",
            index,
            self.capacity
        );
    }

    #[inline]
    fn check_capacity(&self, other: &BitSet) {
        assert_eq!(
            self.capacity, other.capacity,
            "bit set capacity mismatch"
        );
    }

    /// Add a position
    ///
    /// # Panics
    ///
    /// Panics if `index >= capacity`.
    pub fn set(&mut self, index: usize) {
        self.check_index(index);
        self.words_mut()[index / WORD_BITS] |= 1 << (index % WORD_BITS);
    }

    /// Check whether a position is in the set
    ///
    /// # Panics
    ///
    /// Panics if `index >= capacity`.
    pub fn get(&self, index: usize) -> bool {
        self.check_index(index);
        self.words()[index / WORD_BITS] & (1 << (index % WORD_BITS)) != 0
    }

    /// Remove every position
    pub fn clear_all(&mut self) {
        self.words_mut().iter_mut().for_each(|w| *w = 0);
    }

    /// Add every position of `other`
    ///
    /// # Panics
    ///
    /// Panics if the capacities differ.
    pub fn union_with(&mut self, other: &BitSet) {
        self.check_capacity(other);
        for (w, o) in self.words_mut().iter_mut().zip(other.words()) {
            *w |= *o;
        }
    }

    /// Keep only the positions also in `other`
    ///
    /// # Panics
    ///
    /// Panics if the capacities differ.
    pub fn intersect_with(&mut self, other: &BitSet) {
        self.check_capacity(other);
        for (w, o) in self.words_mut().iter_mut().zip(other.words()) {
            *w &= *o;
        }
    }

    /// Replace the contents with those of `other`
    ///
    /// # Panics
    ///
    /// Panics if the capacities differ.
    pub fn set_to(&mut self, other: &BitSet) {
        self.check_capacity(other);
        self.words_mut().copy_from_slice(other.words());
    }

    /// Check whether no position is set
    pub fn is_empty(&self) -> bool {
        self.words().iter().all(|w| *w == 0)
    }

    /// Same capacity and same positions
    pub fn equals(&self, other: &BitSet) -> bool {
        self == other
    }

    /// Check whether the sets share a position (false on capacity mismatch)
    pub fn intersects(&self, other: &BitSet) -> bool {
        self.capacity == other.capacity
            && self.words().iter().zip(other.words()).any(|(a, b)| a & b != 0)
    }

    /// Number of positions in the set
    pub fn count(&self) -> usize {
        self.words().iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Iterate set positions in ascending order
    pub fn iter(&self) -> Iter<'_> {
        let words = self.words();
        Iter {
            words,
            index: 0,
            current: words.first().copied().unwrap_or(0),
        }
    }
}

/// Ascending iterator over the positions of a [`BitSet`]
pub struct Iter<'a> {
    words: &'a [u64],
    index: usize,
    current: u64,
}

impl Iterator for Iter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            if self.current != 0 {
                let bit = self.current.trailing_zeros() as usize;
                self.current &= self.current - 1;
                return Some(self.index * WORD_BITS + bit);
            }
            self.index += 1;
            self.current = *self.words.get(self.index)?;
        }
    }
}

impl<'a> IntoIterator for &'a BitSet {
    type Item = usize;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl fmt::Display for BitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for position in self {
            write!(f, " {}", position)?;
        }
        write!(f, " }}")
    }
}

impl fmt::Debug for BitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitSet({}){}", self.capacity, self)
    }
}
