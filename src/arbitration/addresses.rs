//! Set of protected heap addresses.

use std::collections::HashMap;

/// Starting capacity of a fresh [`ProtectedAddressSet`].
pub const INITIAL_CAPACITY: usize = 10;

/// Addresses that must never reach the real deallocation routine.
///
/// Entries live in a dense vector with a position index beside it, so membership, insertion
/// and removal are all O(1). Removal swaps the last entry into the freed position. When full,
/// the vector doubles its capacity.
#[derive(Clone, Debug)]
pub struct ProtectedAddressSet {
    entries: Vec<usize>,
    positions: HashMap<usize, usize>,
}

impl Default for ProtectedAddressSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtectedAddressSet {
    /// Creates an empty set with [`INITIAL_CAPACITY`].
    #[must_use]
    pub fn new() -> Self {
        ProtectedAddressSet {
            entries: Vec::with_capacity(INITIAL_CAPACITY),
            positions: HashMap::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Adds `address`. Returns `false` if it was already present.
    pub fn insert(&mut self, address: usize) -> bool {
        if self.positions.contains_key(&address) {
            return false;
        }

        if self.entries.len() == self.entries.capacity() {
            let grow = self.entries.capacity().max(INITIAL_CAPACITY);
            self.entries.reserve_exact(grow);
        }

        self.positions.insert(address, self.entries.len());
        self.entries.push(address);
        true
    }

    /// Removes `address`. Returns `false` if it was not present.
    pub fn remove(&mut self, address: usize) -> bool {
        let Some(index) = self.positions.remove(&address) else {
            return false;
        };

        self.entries.swap_remove(index);
        if let Some(moved) = self.entries.get(index) {
            self.positions.insert(*moved, index);
        }
        true
    }

    /// Returns `true` if `address` is protected.
    #[must_use]
    pub fn contains(&self, address: usize) -> bool {
        self.positions.contains_key(&address)
    }

    /// Number of protected addresses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is protected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current storage capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    /// Iterates the protected addresses in storage order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().copied()
    }
}
