//! Sum tree for proportional sampling.
//!
//! The tree lives in a flat arena of `2 * capacity` values. Node `i` has the
//! children `2i` and `2i + 1`, leaves occupy `capacity..2 * capacity` and the
//! root is node `1` (node `0` is unused). Every internal node holds the sum of
//! its children, so the root holds the total priority.
//!
//! Updates recompute the sums on the path to the root from the children rather
//! than propagating differences, so the total does not drift after many
//! updates.
use crate::error::{
    AgentError,
    Result,
};

#[derive(Clone, Debug)]
pub struct SumTree {
    capacity: usize,
    tree: Vec<f64>,
}

impl SumTree {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(AgentError::Config("Sum tree capacity must be positive".to_owned()));
        }
        Ok(Self {
            capacity,
            tree: vec![0.0; 2 * capacity],
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The sum of all priorities.
    pub fn total(&self) -> f64 {
        self.tree[1]
    }

    /// The priority stored at leaf `index`.
    pub fn get(
        &self,
        index: usize,
    ) -> Option<f64> {
        (index < self.capacity).then(|| self.tree[index + self.capacity])
    }

    /// Set the priority at leaf `index` in O(log capacity).
    pub fn set(
        &mut self,
        index: usize,
        priority: f64,
    ) -> Result<()> {
        if index >= self.capacity {
            return Err(AgentError::IndexOutOfRange {
                index,
                size: self.capacity,
            });
        }
        if !priority.is_finite() || priority < 0.0 {
            return Err(AgentError::InvalidPriority(priority));
        }

        let mut ix = index + self.capacity;
        self.tree[ix] = priority;
        while ix > 1 {
            ix /= 2;
            self.tree[ix] = self.tree[2 * ix] + self.tree[2 * ix + 1];
        }
        Ok(())
    }

    /// Find the leaf whose cumulative priority interval contains `value`.
    ///
    /// `value` is expected in `[0, total)`. Values at or beyond the total (from
    /// rounding) resolve to the last leaf with a nonzero priority on the right
    /// edge, and zero-priority leaves are never returned while the total is
    /// positive.
    pub fn find(
        &self,
        mut value: f64,
    ) -> usize {
        let mut ix = 1;
        while ix < self.capacity {
            let left = 2 * ix;
            let right = left + 1;
            if value < self.tree[left] || self.tree[right] <= 0.0 {
                ix = left;
            } else {
                value -= self.tree[left];
                ix = right;
            }
        }
        ix - self.capacity
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn build(priorities: &[f64], capacity: usize) -> Result<SumTree> {
        let mut tree = SumTree::new(capacity)?;
        for (ix, &p) in priorities.iter().enumerate() {
            tree.set(ix, p)?;
        }
        Ok(tree)
    }

    #[test]
    fn test_total_tracks_sets_and_overwrites() -> Result<()> {
        let mut tree = build(&[0.5, 0.2, 0.8, 0.3], 4)?;
        assert!((tree.total() - 1.8).abs() < 1e-12);

        tree.set(2, 0.1)?;
        assert!((tree.total() - 1.1).abs() < 1e-12);
        assert_eq!(tree.get(2), Some(0.1));
        assert_eq!(tree.get(4), None);
        Ok(())
    }

    #[test]
    fn test_find_resolves_cumulative_intervals() -> Result<()> {
        // non power of two capacity
        let tree = build(&[0.5, 0.2, 0.8, 0.3, 1.1, 2.5, 3.9], 7)?;
        let total = tree.total();
        assert!((total - 9.3).abs() < 1e-12);

        // every leaf is reached by some value and the interval widths add up
        // to the leaf priorities
        let steps = 93_000;
        let mut hits = [0usize; 7];
        for k in 0..steps {
            let value = total * (k as f64 + 0.5) / steps as f64;
            hits[tree.find(value)] += 1;
        }
        for (ix, &p) in [0.5, 0.2, 0.8, 0.3, 1.1, 2.5, 3.9].iter().enumerate() {
            let expected = p / total * steps as f64;
            assert!((hits[ix] as f64 - expected).abs() <= 1.0, "leaf {ix}: {} vs {expected}", hits[ix]);
        }
        Ok(())
    }

    #[test]
    fn test_find_skips_zero_priorities() -> Result<()> {
        let tree = build(&[0.0, 2.0, 0.0, 0.0, 0.0], 5)?;
        for value in [0.0, 0.5, 1.999, 2.0, 5.0] {
            assert_eq!(tree.find(value), 1);
        }
        Ok(())
    }

    #[test]
    fn test_single_slot() -> Result<()> {
        let tree = build(&[3.0], 1)?;
        assert_eq!(tree.total(), 3.0);
        assert_eq!(tree.find(1.0), 0);
        Ok(())
    }

    #[test]
    fn test_rejects_invalid_priorities() -> Result<()> {
        let mut tree = SumTree::new(2)?;
        assert!(matches!(tree.set(0, -1.0), Err(AgentError::InvalidPriority(_))));
        assert!(matches!(tree.set(0, f64::NAN), Err(AgentError::InvalidPriority(_))));
        assert!(matches!(tree.set(2, 1.0), Err(AgentError::IndexOutOfRange { .. })));
        assert_eq!(tree.total(), 0.0);
        Ok(())
    }
}
