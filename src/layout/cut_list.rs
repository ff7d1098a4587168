//! Sorted, unique cut positions along one axis.
//!
//! Cuts arrive mostly in increasing order (the vertical axis fills top to
//! bottom), so appends are O(1). Out-of-order inserts estimate the target
//! index from the average cut spacing and probe a small window around it
//! before falling back to a full binary search.

use serde::Serialize;
use std::cmp::Ordering;

use crate::types::Coord;

/// Below this many cuts a linear scan beats binary search.
const LINEAR_SCAN_LIMIT: usize = 16;

/// Half-width of the window probed around the estimated index.
const PROBE_WINDOW: usize = 7;

/// A grid line candidate. Auxiliary cuts are provisional and pruned when
/// the page completes unless something promotes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cut {
    pub coord: Coord,
    pub auxiliary: bool,
}

/// How [`CutList::find_position`] resolves a coordinate that is not a cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Index of the nearest cut below.
    Lower,
    /// Index of the nearest cut above.
    Upper,
}

/// What an insert did to the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Added,
    /// An existing auxiliary cut became real.
    Promoted,
    Unchanged,
}

/// Strictly increasing sequence of cuts.
#[derive(Debug, Clone, Default)]
pub struct CutList {
    cuts: Vec<Cut>,
    /// Average distance between neighbouring cuts, at least 1.
    scale: Coord,
}

impl CutList {
    pub fn new() -> Self {
        Self {
            cuts: Vec::new(),
            scale: 1,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cuts: Vec::with_capacity(capacity),
            scale: 1,
        }
    }

    pub fn size(&self) -> usize {
        self.cuts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cuts.is_empty()
    }

    /// Coordinate of the cut at `index`.
    ///
    /// # Panics
    /// If `index` is out of range; callers only pass indices obtained from
    /// this list.
    #[allow(clippy::indexing_slicing)]
    pub fn key_at(&self, index: usize) -> Coord {
        self.cuts[index].coord
    }

    pub fn cut_at(&self, index: usize) -> Option<Cut> {
        self.cuts.get(index).copied()
    }

    pub fn first_key(&self) -> Option<Coord> {
        self.cuts.first().map(|c| c.coord)
    }

    pub fn last_key(&self) -> Option<Coord> {
        self.cuts.last().map(|c| c.coord)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cut> {
        self.cuts.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = Coord> + '_ {
        self.cuts.iter().map(|c| c.coord)
    }

    /// Coordinates of all cuts still marked auxiliary, ascending.
    pub fn auxiliary_keys(&self) -> Vec<Coord> {
        self.cuts
            .iter()
            .filter(|c| c.auxiliary)
            .map(|c| c.coord)
            .collect()
    }

    pub fn contains(&self, coord: Coord) -> bool {
        self.search(coord).is_ok()
    }

    pub fn clear(&mut self) {
        self.cuts.clear();
        self.scale = 1;
    }

    /// Insert a cut. Returns true if a new key was added; false if the key
    /// existed (whether or not it was promoted to real).
    pub fn insert(&mut self, coord: Coord, auxiliary: bool) -> bool {
        self.insert_cut(coord, auxiliary) == InsertOutcome::Added
    }

    /// Insert a cut and report exactly what changed.
    ///
    /// An existing key is only ever promoted from auxiliary to real, never
    /// the reverse.
    pub fn insert_cut(&mut self, coord: Coord, auxiliary: bool) -> InsertOutcome {
        match self.last_key() {
            Some(last) if coord < last => {}
            Some(last) if coord == last => {
                return self
                    .cuts
                    .last_mut()
                    .map_or(InsertOutcome::Unchanged, |cut| promote(cut, auxiliary));
            }
            _ => {
                self.cuts.push(Cut { coord, auxiliary });
                self.update_scale();
                return InsertOutcome::Added;
            }
        }

        match self.search(coord) {
            Ok(index) => self
                .cuts
                .get_mut(index)
                .map_or(InsertOutcome::Unchanged, |cut| promote(cut, auxiliary)),
            Err(index) => {
                self.cuts.insert(index, Cut { coord, auxiliary });
                self.update_scale();
                InsertOutcome::Added
            }
        }
    }

    /// Index of `coord` if it is a cut, otherwise the index of the nearest
    /// cut in the `rounding` direction. Out-of-range coordinates clamp to
    /// the first or last index. An empty list yields 0.
    pub fn find_position(&self, coord: Coord, rounding: Rounding) -> usize {
        let len = self.cuts.len();
        if len == 0 {
            return 0;
        }
        match self.search(coord) {
            Ok(index) => index,
            Err(index) => match rounding {
                Rounding::Lower => index.saturating_sub(1),
                Rounding::Upper => index.min(len - 1),
            },
        }
    }

    /// Remove exactly the given coordinates in one compacting pass.
    ///
    /// `coords` must be ascending and a subset of the list's keys. This is
    /// only checked in debug builds.
    pub fn remove_sorted_subset(&mut self, coords: &[Coord]) {
        if coords.is_empty() {
            return;
        }
        debug_assert!(
            coords.windows(2).all(|w| matches!(w, [a, b] if a < b)),
            "coordinates to remove must be strictly ascending"
        );

        let mut pending = coords.iter().copied().peekable();
        self.cuts.retain(|cut| {
            while pending.next_if(|&c| c < cut.coord).is_some() {}
            pending.next_if_eq(&cut.coord).is_none()
        });
        self.update_scale();
    }

    /// Binary-search style lookup: `Ok(index)` on a hit, `Err(insertion point)`
    /// otherwise.
    fn search(&self, coord: Coord) -> Result<usize, usize> {
        let len = self.cuts.len();
        if len < LINEAR_SCAN_LIMIT {
            return linear_search(&self.cuts, coord);
        }

        let first = self.first_key().unwrap_or(0);
        let estimate = usize::try_from((coord - first) / self.scale)
            .unwrap_or(0)
            .min(len - 1);
        let lo = estimate.saturating_sub(PROBE_WINDOW);
        let hi = estimate.saturating_add(PROBE_WINDOW).min(len - 1);

        // The window is only trustworthy if the target lies inside it, or
        // it reaches the end of the list on the open side.
        let lo_holds = lo == 0 || self.cuts.get(lo).is_some_and(|c| c.coord <= coord);
        let hi_holds = hi == len - 1 || self.cuts.get(hi).is_some_and(|c| c.coord >= coord);
        if lo_holds && hi_holds {
            if let Some(window) = self.cuts.get(lo..=hi) {
                return match linear_search(window, coord) {
                    Ok(index) => Ok(lo + index),
                    Err(index) => Err(lo + index),
                };
            }
        }

        self.cuts.binary_search_by_key(&coord, |c| c.coord)
    }

    fn update_scale(&mut self) {
        self.scale = match (self.first_key(), self.last_key()) {
            (Some(first), Some(last)) => {
                let count = Coord::try_from(self.cuts.len()).unwrap_or(Coord::MAX);
                ((last - first) / count).max(1)
            }
            _ => 1,
        };
    }
}

fn promote(cut: &mut Cut, auxiliary: bool) -> InsertOutcome {
    if cut.auxiliary && !auxiliary {
        cut.auxiliary = false;
        InsertOutcome::Promoted
    } else {
        InsertOutcome::Unchanged
    }
}

fn linear_search(cuts: &[Cut], coord: Coord) -> Result<usize, usize> {
    for (index, cut) in cuts.iter().enumerate() {
        match cut.coord.cmp(&coord) {
            Ordering::Less => {}
            Ordering::Equal => return Ok(index),
            Ordering::Greater => return Err(index),
        }
    }
    Err(cuts.len())
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;

    fn keys(list: &CutList) -> Vec<Coord> {
        list.keys().collect()
    }

    #[test]
    fn test_append_fast_path() {
        let mut list = CutList::new();
        assert!(list.insert(0, false));
        assert!(list.insert(10, true));
        assert!(list.insert(20, false));
        assert_eq!(keys(&list), vec![0, 10, 20]);
        assert!(list.cut_at(1).unwrap().auxiliary);
    }

    #[test]
    fn test_out_of_order_insert() {
        let mut list = CutList::new();
        for coord in [50, 10, 30, 20, 40, 0] {
            assert!(list.insert(coord, false));
        }
        assert_eq!(keys(&list), vec![0, 10, 20, 30, 40, 50]);
    }

    #[test]
    fn test_duplicate_reports_not_added() {
        let mut list = CutList::new();
        list.insert(5, false);
        list.insert(9, false);
        assert!(!list.insert(5, false));
        assert!(!list.insert(9, true));
        assert_eq!(list.size(), 2);
    }

    #[test]
    fn test_promotion_only_upgrades() {
        let mut list = CutList::new();
        assert_eq!(list.insert_cut(100, true), InsertOutcome::Added);
        assert_eq!(list.insert_cut(100, false), InsertOutcome::Promoted);
        assert_eq!(list.insert_cut(100, true), InsertOutcome::Unchanged);
        assert!(!list.cut_at(0).unwrap().auxiliary);
    }

    #[test]
    fn test_promotion_in_middle() {
        let mut list = CutList::new();
        list.insert(0, false);
        list.insert(10, true);
        list.insert(20, false);
        assert_eq!(list.insert_cut(10, false), InsertOutcome::Promoted);
        assert!(list.auxiliary_keys().is_empty());
    }

    #[test]
    fn test_find_position_rounding() {
        let mut list = CutList::new();
        for coord in [10, 20, 30] {
            list.insert(coord, false);
        }
        assert_eq!(list.find_position(20, Rounding::Lower), 1);
        assert_eq!(list.find_position(20, Rounding::Upper), 1);
        assert_eq!(list.find_position(25, Rounding::Lower), 1);
        assert_eq!(list.find_position(25, Rounding::Upper), 2);
        assert_eq!(list.find_position(5, Rounding::Lower), 0);
        assert_eq!(list.find_position(5, Rounding::Upper), 0);
        assert_eq!(list.find_position(35, Rounding::Lower), 2);
        assert_eq!(list.find_position(35, Rounding::Upper), 2);
    }

    #[test]
    fn test_find_position_empty() {
        let list = CutList::new();
        assert_eq!(list.find_position(42, Rounding::Upper), 0);
    }

    #[test]
    fn test_large_list_windowed_search() {
        let mut list = CutList::new();
        // Evenly spaced so the estimate lands inside the probe window
        for i in 0..200 {
            list.insert(i * 100, false);
        }
        assert!(list.insert(12_345, true));
        assert!(list.contains(12_345));
        assert_eq!(list.find_position(12_345, Rounding::Lower), 124);
        assert_eq!(list.find_position(12_350, Rounding::Upper), 125);
        assert_eq!(list.size(), 201);
    }

    #[test]
    fn test_large_list_skewed_spacing_falls_back() {
        let mut list = CutList::new();
        // Dense cluster followed by one far outlier defeats the estimate
        for i in 0..64 {
            list.insert(i, false);
        }
        list.insert(1_000_000, false);
        for coord in [635, 500_000, 32] {
            list.insert(coord, false);
        }
        let all = keys(&list);
        assert!(all.windows(2).all(|w| w[0] < w[1]));
        assert!(list.contains(500_000));
        assert!(list.contains(635));
    }

    #[test]
    fn test_remove_sorted_subset() {
        let mut list = CutList::new();
        for coord in [0, 10, 20, 30, 40] {
            list.insert(coord, coord % 20 != 0);
        }
        let aux = list.auxiliary_keys();
        assert_eq!(aux, vec![10, 30]);
        list.remove_sorted_subset(&aux);
        assert_eq!(keys(&list), vec![0, 20, 40]);
    }

    #[test]
    fn test_remove_nothing() {
        let mut list = CutList::new();
        list.insert(1, false);
        list.remove_sorted_subset(&[]);
        assert_eq!(keys(&list), vec![1]);
    }

    #[test]
    fn test_key_at_out_of_range_panics() {
        let list = CutList::new();
        let result = std::panic::catch_unwind(|| list.key_at(0));
        assert!(result.is_err());
    }
}
