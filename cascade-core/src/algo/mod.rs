//! Time-dependent Dijkstra's algorithm for finding shortest paths in a
//! time-dependent graph: the delay between two nodes is calculated
//! from the current time and the router's view of the schedule, not a
//! fixed edge weight.

use std::cmp::Ordering;

pub mod dijkstra;
pub mod segmentation;

/// Holds a score `f64` and a scored object `T` for use with a
/// `BinaryHeap`. Compares in reverse order by the score, so a
/// `BinaryHeap` can be used as a min-heap to extract the least score.
#[derive(Copy, Clone, PartialEq)]
pub(crate) struct MinScored<T>(pub f64, pub T);

impl<T: Eq> Eq for MinScored<T> {}

impl<T: PartialEq> PartialOrd for MinScored<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        other.0.partial_cmp(&self.0)
    }
}

impl<T: Eq> Ord for MinScored<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        other.0.partial_cmp(&self.0).unwrap_or(Ordering::Equal)
    }
}
