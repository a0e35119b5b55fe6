//! Batch planning: splits `[0, total_rows)` into contiguous insert batches.

use serde::Serialize;

use crate::error::HarnessError;

/// How many rows to load and how many go into each insert.
///
/// Validated on construction and immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadSpec {
    total_rows: u64,
    batch_size: u64,
}

impl LoadSpec {
    pub fn new(total_rows: u64, batch_size: u64) -> Result<Self, HarnessError> {
        if total_rows == 0 {
            return Err(HarnessError::invalid_spec("total rows must be positive"));
        }
        if batch_size == 0 {
            return Err(HarnessError::invalid_spec("batch size must be positive"));
        }
        if batch_size > total_rows {
            return Err(HarnessError::invalid_spec(format!(
                "batch size {batch_size} exceeds total rows {total_rows}"
            )));
        }
        Ok(Self {
            total_rows,
            batch_size,
        })
    }

    /// 2,000,000 rows in batches of 20,000.
    pub fn reference() -> Self {
        Self {
            total_rows: 2_000_000,
            batch_size: 20_000,
        }
    }

    pub fn total_rows(&self) -> u64 {
        self.total_rows
    }

    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }

    /// `ceil(total_rows / batch_size)`.
    pub fn batch_count(&self) -> u64 {
        self.total_rows.div_ceil(self.batch_size)
    }

    /// A fresh pass over the batches. Each call starts again from row 0.
    pub fn batches(&self) -> BatchPlan {
        BatchPlan {
            spec: *self,
            next_start: 0,
        }
    }
}

/// One contiguous slice of rows, submitted as a single multi-row insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Batch {
    pub start_index: u64,
    pub count: u64,
}

impl Batch {
    /// One past the last row index.
    pub fn end_index(&self) -> u64 {
        self.start_index + self.count
    }

    pub fn indices(&self) -> std::ops::Range<u64> {
        self.start_index..self.end_index()
    }
}

/// Lazy, finite iterator over the batches of a [`LoadSpec`].
#[derive(Debug, Clone)]
pub struct BatchPlan {
    spec: LoadSpec,
    next_start: u64,
}

impl Iterator for BatchPlan {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        if self.next_start >= self.spec.total_rows {
            return None;
        }
        let count = self
            .spec
            .batch_size
            .min(self.spec.total_rows - self.next_start);
        let batch = Batch {
            start_index: self.next_start,
            count,
        };
        self.next_start += count;
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining_rows = self.spec.total_rows - self.next_start.min(self.spec.total_rows);
        let remaining = remaining_rows.div_ceil(self.spec.batch_size) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for BatchPlan {}

/// Validate `(total_rows, batch_size)` and return the batch sequence.
pub fn plan(total_rows: u64, batch_size: u64) -> Result<BatchPlan, HarnessError> {
    Ok(LoadSpec::new(total_rows, batch_size)?.batches())
}
