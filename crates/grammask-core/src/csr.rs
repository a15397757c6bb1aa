//! Compressed-sparse-row storage.
//!
//! Rows are pushed into a [`CsrBuilder`] and frozen into a [`CsrArray`].
//! The frozen form keeps its buffers behind `Arc`, so clones share storage
//! and are cheap enough to hand out by value.

use std::sync::Arc;

/// Append-only builder for a CSR array.
#[derive(Debug, Clone)]
pub struct CsrBuilder<T> {
    data: Vec<T>,
    indptr: Vec<u32>,
}

impl<T> CsrBuilder<T> {
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            indptr: vec![0],
        }
    }

    /// Append a row, returning its index.
    pub fn push_row(&mut self, row: impl IntoIterator<Item = T>) -> u32 {
        self.data.extend(row);
        self.indptr.push(self.data.len() as u32);
        (self.indptr.len() - 2) as u32
    }

    /// Number of rows pushed so far.
    pub fn len(&self) -> usize {
        self.indptr.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn row(&self, index: usize) -> &[T] {
        let start = self.indptr[index] as usize;
        let end = self.indptr[index + 1] as usize;
        &self.data[start..end]
    }

    /// Freeze into the immutable shared form. One-way.
    pub fn freeze(self) -> CsrArray<T> {
        CsrArray {
            data: self.data.into(),
            indptr: self.indptr.into(),
        }
    }
}

impl<T> Default for CsrBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable CSR array. Row `i` occupies `data[indptr[i]..indptr[i+1]]`.
#[derive(Debug, Clone)]
pub struct CsrArray<T> {
    data: Arc<[T]>,
    indptr: Arc<[u32]>,
}

impl<T> CsrArray<T> {
    /// Build directly from raw parts. `indptr` must start at 0, be
    /// non-decreasing, and end at `data.len()`.
    pub fn from_parts(data: Vec<T>, indptr: Vec<u32>) -> Option<Self> {
        if indptr.first() != Some(&0) || indptr.last() != Some(&(data.len() as u32)) {
            return None;
        }
        if indptr.windows(2).any(|w| w[0] > w[1]) {
            return None;
        }
        Some(Self {
            data: data.into(),
            indptr: indptr.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.indptr.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn row(&self, index: usize) -> &[T] {
        let start = self.indptr[index] as usize;
        let end = self.indptr[index + 1] as usize;
        &self.data[start..end]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[T]> + '_ {
        (0..self.len()).map(|i| self.row(i))
    }

    /// The dense payload buffer.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// The row-offset vector, one entry per row plus a trailing total.
    pub fn indptr(&self) -> &[u32] {
        &self.indptr
    }

    /// Heap footprint in bytes.
    pub fn memory_size(&self) -> usize {
        std::mem::size_of_val(&*self.data) + std::mem::size_of_val(&*self.indptr)
    }
}
