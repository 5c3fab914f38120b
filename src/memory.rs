use std::collections::HashMap;

/// Cells below this address (or below the loaded image, if larger) live in a
/// contiguous buffer. Higher addresses are stored sparsely, so a program
/// touching a huge address costs one map entry rather than a huge allocation.
pub const DENSE_LIMIT: usize = 1 << 20;

/// The address space of a machine: a flat run of signed 64-bit cells.
///
/// Every non-negative address is valid. Cells beyond the current extent read
/// as zero, and touching one (read or write) grows the extent to cover it.
/// Existing values are never moved or lost by growth.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Memory {
    cells: Vec<i64>,
    sparse: HashMap<usize, i64>,
    extent: usize,
}

impl Memory {
    pub fn new(cells: Vec<i64>) -> Self {
        let extent = cells.len();
        Self {
            cells,
            sparse: HashMap::new(),
            extent,
        }
    }

    /// One past the highest address ever touched (or loaded).
    pub fn len(&self) -> usize {
        self.extent
    }

    pub fn is_empty(&self) -> bool {
        self.extent == 0
    }

    /// The contiguous low region of memory. Cells stored sparsely above
    /// [`DENSE_LIMIT`] are not included.
    pub fn as_slice(&self) -> &[i64] {
        &self.cells
    }

    /// Read a cell, growing the extent if `address` is past the end.
    pub fn read(&mut self, address: usize) -> i64 {
        if self.is_dense(address) {
            self.grow_to(address);
            self.cells[address]
        } else {
            self.touch(address);
            self.sparse.get(&address).copied().unwrap_or(0)
        }
    }

    /// Write a cell, growing the extent if `address` is past the end.
    pub fn write(&mut self, address: usize, value: i64) {
        if self.is_dense(address) {
            self.grow_to(address);
            self.cells[address] = value;
        } else {
            self.touch(address);
            self.sparse.insert(address, value);
        }
    }

    /// Inspect a cell without growing. Unbacked cells are zero.
    pub fn peek(&self, address: usize) -> i64 {
        match self.cells.get(address) {
            Some(&value) => value,
            None => self.sparse.get(&address).copied().unwrap_or(0),
        }
    }

    #[inline(always)]
    fn is_dense(&self, address: usize) -> bool {
        address < DENSE_LIMIT.max(self.cells.len())
    }

    #[inline(always)]
    fn touch(&mut self, address: usize) {
        self.extent = self.extent.max(address.saturating_add(1));
    }

    #[inline(always)]
    fn grow_to(&mut self, address: usize) {
        if address >= self.cells.len() {
            self.cells.resize(address + 1, 0);
        }
        self.touch(address);
    }
}
