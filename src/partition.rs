//! # Index Partitioning
//!
//! Splits the sample index range `[0, num_samples)` of a dataset into one
//! partition per worker.
//!
//! The index array is padded with placeholder zeros until it divides evenly,
//! split into equal chunks, and only the last chunk has its placeholders
//! trimmed. When there are more workers than samples, middle chunks can end up
//! holding placeholders, which duplicates work on index 0. Those entries are
//! kept (so the dispatched work matches the padded layout) and are reported
//! through [`Partition::padding`] and [`Partition::is_padding_only`].
//!
//! ```rust
//! use mini_batch_fanout::partition::split_indices;
//!
//! let plan = split_indices(10, 4).unwrap();
//! let lengths: Vec<usize> = plan.partitions().iter().map(|p| p.len()).collect();
//! assert_eq!(lengths, vec![3, 3, 3, 1]);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{PreprocessError, Result};

/// Value written into padded slots
pub const PLACEHOLDER_INDEX: usize = 0;

/// Indices assigned to a single worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    /// Position of this partition among its siblings
    pub worker_index: usize,
    /// Sample indices, including any trailing placeholders
    pub indices: Vec<usize>,
    /// Number of trailing entries that are placeholders rather than real samples
    pub padding: usize,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Indices that refer to real samples
    pub fn real_indices(&self) -> &[usize] {
        &self.indices[..self.indices.len().saturating_sub(self.padding)]
    }

    /// True when every entry is a placeholder, i.e. the worker would only
    /// repeat index 0
    pub fn is_padding_only(&self) -> bool {
        !self.indices.is_empty() && self.padding >= self.indices.len()
    }

    pub fn first_index(&self) -> Option<usize> {
        self.indices.first().copied()
    }

    pub fn last_index(&self) -> Option<usize> {
        self.indices.last().copied()
    }
}

/// Result of splitting an index range across workers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionPlan {
    pub num_samples: usize,
    pub num_children: usize,
    /// Placeholders appended before splitting
    pub padding: usize,
    /// Length of every chunk before the last one was trimmed
    pub chunk_len: usize,
    partitions: Vec<Partition>,
}

impl PartitionPlan {
    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    pub fn into_partitions(self) -> Vec<Partition> {
        self.partitions
    }

    /// Real sample indices in partition order
    pub fn real_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.partitions
            .iter()
            .flat_map(|partition| partition.real_indices().iter().copied())
    }

    /// Partitions whose entries are all placeholders
    pub fn padding_only_partitions(&self) -> impl Iterator<Item = &Partition> {
        self.partitions.iter().filter(|p| p.is_padding_only())
    }
}

/// Split `[0, num_samples)` into `num_children` partitions.
///
/// All partitions except the last have length `ceil(num_samples / num_children)`.
/// Fails with [`PreprocessError::InvalidWorkerCount`] when `num_children` is 0.
pub fn split_indices(num_samples: usize, num_children: usize) -> Result<PartitionPlan> {
    if num_children == 0 {
        return Err(PreprocessError::InvalidWorkerCount {
            count: num_children,
        });
    }

    // (-num_samples) mod num_children
    let padding = (num_children - num_samples % num_children) % num_children;
    let padded_len = num_samples + padding;
    let chunk_len = padded_len / num_children;

    let padded: Vec<usize> = (0..num_samples)
        .chain(std::iter::repeat(PLACEHOLDER_INDEX).take(padding))
        .collect();

    let mut partitions: Vec<Partition> = padded
        .chunks(chunk_len.max(1))
        .take(num_children)
        .enumerate()
        .map(|(worker_index, chunk)| {
            let start = worker_index * chunk_len;
            let end = start + chunk.len();
            let chunk_padding = end.saturating_sub(start.max(num_samples));
            Partition {
                worker_index,
                indices: chunk.to_vec(),
                padding: chunk_padding,
            }
        })
        .collect();

    // Nothing to chunk when num_samples == 0
    while partitions.len() < num_children {
        partitions.push(Partition {
            worker_index: partitions.len(),
            indices: Vec::new(),
            padding: 0,
        });
    }

    if let Some(last) = partitions.last_mut() {
        let keep = last.indices.len() - last.padding;
        last.indices.truncate(keep);
        last.padding = 0;
    }

    Ok(PartitionPlan {
        num_samples,
        num_children,
        padding,
        chunk_len,
        partitions,
    })
}
