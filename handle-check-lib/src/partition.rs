//! Static workload partitioning.
//!
//! The candidate list is cut into one contiguous chunk per worker. Chunks
//! are `ceil(len / workers)` long until the list runs out, so trailing
//! partitions may be shorter or empty when the list is small.

use crate::types::Partition;

/// Split `candidates` into exactly `workers` contiguous partitions.
///
/// Concatenating the partitions in worker order reproduces the input. A
/// worker count of zero is treated as one.
pub fn split_into_partitions(candidates: &[String], workers: usize) -> Vec<Partition> {
    let workers = workers.max(1);
    let total = candidates.len();
    let chunk = total.div_ceil(workers);

    (0..workers)
        .map(|worker_id| {
            let from = (worker_id * chunk).min(total);
            let to = ((worker_id + 1) * chunk).min(total);
            Partition {
                worker_id,
                names: candidates[from..to].to_vec(),
            }
        })
        .collect()
}
