//! Component J: the charlist algebra used by `CHARSINTYPE` bodies and
//! JFM kanji-class tables -- converting between explicit code-point
//! enumerations and compacted range notation, set algebra over both
//! forms, and a small registry of named, built-in charlists.

mod error;
mod registry;

pub use error::Error;
pub use registry::named_charlist;

use tfmkit_config::Config;

/// A Unicode (or internal JIS) code point.
pub type CodePoint = u32;

/// One member of a [`Charlist`]: either a single code point or an
/// inclusive range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Entry {
    Single(CodePoint),
    /// Inclusive on both ends, `lo <= hi`.
    Range(CodePoint, CodePoint),
}

impl Entry {
    pub fn lo(&self) -> CodePoint {
        match self {
            Entry::Single(c) => *c,
            Entry::Range(lo, _) => *lo,
        }
    }

    pub fn hi(&self) -> CodePoint {
        match self {
            Entry::Single(c) => *c,
            Entry::Range(_, hi) => *hi,
        }
    }

    pub fn contains(&self, point: CodePoint) -> bool {
        (self.lo()..=self.hi()).contains(&point)
    }
}

/// An ordered, non-overlapping set of code points (§4.10).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Charlist(pub Vec<Entry>);

impl Charlist {
    pub fn new(entries: Vec<Entry>) -> Self {
        Charlist(entries)
    }

    /// Expand every entry into its member code points, ascending and
    /// deduplicated.
    pub fn enumerate(&self) -> Vec<CodePoint> {
        let mut points: Vec<CodePoint> = self
            .0
            .iter()
            .flat_map(|e| e.lo()..=e.hi())
            .collect();
        points.sort_unstable();
        points.dedup();
        points
    }

    /// Whether `point` belongs to any entry.
    pub fn contains(&self, point: CodePoint) -> bool {
        self.0.iter().any(|e| e.contains(point))
    }

    /// Compact a sorted-or-unsorted list of code points into a
    /// [`Charlist`], merging any run of at least `threshold` contiguous
    /// points into a [`Entry::Range`] and leaving shorter runs as
    /// [`Entry::Single`] entries (§4.10).
    pub fn rangify(points: &[CodePoint], threshold: usize) -> Charlist {
        let mut sorted = points.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut entries = Vec::new();
        let mut i = 0;
        while i < sorted.len() {
            let start = i;
            while i + 1 < sorted.len() && sorted[i + 1] == sorted[i] + 1 {
                i += 1;
            }
            let run_len = i - start + 1;
            if run_len >= threshold.max(1) {
                entries.push(Entry::Range(sorted[start], sorted[i]));
            } else {
                for p in &sorted[start..=i] {
                    entries.push(Entry::Single(*p));
                }
            }
            i += 1;
        }
        Charlist(entries)
    }

    /// Compact using a configuration's threshold.
    pub fn rangify_with_config(points: &[CodePoint], cfg: &Config) -> Charlist {
        Self::rangify(points, cfg.rangify_threshold)
    }

    /// The set union of `self` and `other`, re-rangified at `threshold`.
    pub fn union(&self, other: &Charlist, threshold: usize) -> Charlist {
        let mut points = self.enumerate();
        points.extend(other.enumerate());
        Charlist::rangify(&points, threshold)
    }

    /// The set difference `self - other`, re-rangified at `threshold`.
    pub fn difference(&self, other: &Charlist, threshold: usize) -> Charlist {
        let excluded = other.enumerate();
        let points: Vec<CodePoint> = self
            .enumerate()
            .into_iter()
            .filter(|p| excluded.binary_search(p).is_err())
            .collect();
        Charlist::rangify(&points, threshold)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.enumerate().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rangify_merges_runs_at_or_above_threshold() {
        let points: Vec<CodePoint> = (0x3041..=0x3096).collect();
        let list = Charlist::rangify(&points, 8);
        assert_eq!(list.0, vec![Entry::Range(0x3041, 0x3096)]);
    }

    #[test]
    fn rangify_leaves_short_runs_as_singles() {
        let list = Charlist::rangify(&[10, 11, 12, 20], 8);
        assert_eq!(list.0, vec![Entry::Single(10), Entry::Single(11), Entry::Single(12), Entry::Single(20)]);
    }

    #[test]
    fn enumerate_expands_ranges_and_dedupes() {
        let list = Charlist::new(vec![Entry::Range(1, 3), Entry::Single(3), Entry::Single(5)]);
        assert_eq!(list.enumerate(), vec![1, 2, 3, 5]);
    }

    #[test]
    fn union_and_difference_round_trip() {
        let a = Charlist::new(vec![Entry::Range(1, 5)]);
        let b = Charlist::new(vec![Entry::Range(3, 7)]);
        let u = a.union(&b, 1);
        assert_eq!(u.enumerate(), vec![1, 2, 3, 4, 5, 6, 7]);
        let d = a.difference(&b, 1);
        assert_eq!(d.enumerate(), vec![1, 2]);
    }

    #[test]
    fn contains_checks_both_singles_and_ranges() {
        let list = Charlist::new(vec![Entry::Single(5), Entry::Range(10, 20)]);
        assert!(list.contains(5));
        assert!(list.contains(15));
        assert!(!list.contains(9));
    }
}
