//! Fixed-Capacity Rolling Window over Recent Readings
//!
//! ## Overview
//!
//! The detector does not score single readings. It scores the per-channel
//! mean of the last *W* readings, the same rolling mean the model was trained
//! on. This module keeps those *W* feature triples.
//!
//! ## Design Rationale
//!
//! ### Why a ring and not a queue?
//!
//! *W* is only known once the configuration is loaded, so the storage is a
//! single allocation sized at construction and then reused forever:
//! - O(1) push (overwrites the oldest slot when full)
//! - O(W) mean, computed fresh on every call
//! - No allocation after the first *W* pushes
//!
//! ### Warm-up
//!
//! Until *W* readings have been pushed there is no mean. [`RollingWindow::mean`]
//! returns `None` and the detector stays in its warming phase. A partial mean
//! would be computed over fewer readings than the model was trained with.
//!
//! ### Memory Layout
//!
//! ```text
//! RollingWindow with capacity 5, after 7 pushes (r0..r6):
//! ┌────┬────┬────┬────┬────┐
//! │ r5 │ r6 │ r2 │ r3 │ r4 │  ← data
//! └────┴────┴────┴────┴────┘
//!             ↑
//!             └── write_pos = 2 (oldest entry, next to be overwritten)
//!
//! Logical view (oldest → newest): r2, r3, r4, r5, r6
//! ```
//!
//! ## Usage Example
//!
//! ```rust
//! use envwatch_core::window::RollingWindow;
//!
//! let mut window = RollingWindow::new(2)?;
//! window.push((20.0, 50.0, 0));
//! window.push((22.0, 54.0, 1));
//! window.push((24.0, 58.0, 1)); // evicts (20.0, 50.0, 0)
//!
//! let mean = window.mean().unwrap();
//! assert_eq!(mean.to_tuple(), (23.0, 56.0, 1.0));
//! # Ok::<(), envwatch_core::errors::WindowError>(())
//! ```

use alloc::vec::Vec;

use crate::errors::WindowError;
use crate::reading::{FeatureVector, Features, FEATURE_COUNT};

/// Fixed-capacity FIFO of feature triples
///
/// ## Internal Invariants
///
/// - `data.len() <= capacity`
/// - `write_pos < capacity`
/// - while not full, `write_pos == data.len()`
/// - when full, `data[write_pos]` is the oldest entry
///
/// ## Thread Safety
///
/// Owned by exactly one detector; not shared.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    /// Storage, grows to `capacity` and then stays there
    data: Vec<Features>,

    /// Maximum number of readings (W)
    capacity: usize,

    /// Index where the next write will occur
    write_pos: usize,
}

impl RollingWindow {
    /// Creates an empty window holding at most `capacity` readings
    pub fn new(capacity: usize) -> Result<Self, WindowError> {
        if capacity == 0 {
            return Err(WindowError::ZeroCapacity);
        }

        Ok(Self {
            data: Vec::with_capacity(capacity),
            capacity,
            write_pos: 0,
        })
    }

    /// Adds a feature triple, evicting the oldest one when full
    pub fn push(&mut self, features: Features) {
        if self.data.len() < self.capacity {
            self.data.push(features);
        } else {
            self.data[self.write_pos] = features;
        }
        self.write_pos = (self.write_pos + 1) % self.capacity;
    }

    /// Per-channel arithmetic mean over all W entries
    ///
    /// `None` until the window is full.
    pub fn mean(&self) -> Option<FeatureVector> {
        if !self.is_full() {
            return None;
        }

        let mut sums = [0.0f64; FEATURE_COUNT];
        for &(temperature, humidity, motion) in &self.data {
            sums[0] += temperature;
            sums[1] += humidity;
            sums[2] += f64::from(motion);
        }

        let n = self.capacity as f64;
        Some(FeatureVector([sums[0] / n, sums[1] / n, sums[2] / n]))
    }

    /// Get number of stored readings
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if window is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Check if window holds W readings
    pub fn is_full(&self) -> bool {
        self.data.len() == self.capacity
    }

    /// Configured capacity W
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recently pushed entry
    pub fn last(&self) -> Option<&Features> {
        if self.is_empty() {
            return None;
        }
        let idx = if self.write_pos == 0 { self.capacity - 1 } else { self.write_pos - 1 };
        self.data.get(idx)
    }

    /// Iterate from oldest to newest
    pub fn iter(&self) -> RollingWindowIter<'_> {
        RollingWindowIter { window: self, index: 0 }
    }

    /// Maps a logical index (0 = oldest) to the stored entry
    ///
    /// ```text
    /// Physical: [D, E, A, B, C]  (write_pos = 2)
    /// Logical:  [A, B, C, D, E]
    /// logical[i] = physical[(write_pos + i) % W]
    /// ```
    fn get(&self, index: usize) -> Option<&Features> {
        if index >= self.data.len() {
            return None;
        }

        let actual = if self.is_full() {
            (self.write_pos + index) % self.capacity
        } else {
            index
        };

        self.data.get(actual)
    }
}

/// Iterator over window contents, oldest first
pub struct RollingWindowIter<'a> {
    window: &'a RollingWindow,
    index: usize,
}

impl<'a> Iterator for RollingWindowIter<'a> {
    type Item = &'a Features;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.window.get(self.index)?;
        self.index += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.window.len().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RollingWindowIter<'_> {}
