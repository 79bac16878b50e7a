//! Component G: reducing a raw per-glyph metric table into a compact
//! class-based JFM representation (§4.7).
//!
//! The raw metric's widths, heights, and depths are design-size real
//! numbers (§3 "Raw metric"); reduction buckets them into a small
//! number of classes under a tunable error bound, trading exact
//! per-glyph dimensions for a table with at most 256 entries.

use indexmap::IndexMap;

use crate::error::Error;

/// One glyph's raw, unreduced metric (§3 "Raw metric"). `code` is
/// 0..0xFFFFFF; `width`/`height`/`depth` are design-size real numbers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawMetricEntry {
    pub code: u32,
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

/// The result of a reduction: each code's slot in `value_table`, and
/// the table itself. `value_table[0]` is always the reserved zero
/// triple `(0,0,0)` (§3 "Reduced metric"); later entries are ordered by
/// descending reference frequency, ties broken by first appearance.
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedMetric {
    pub index_map: IndexMap<u32, usize>,
    pub value_table: Vec<(f64, f64, f64)>,
}

/// How a rounding-cover class's representative value is chosen (§4.7.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundMode {
    /// Midpoint of the class's first and last member.
    Midpoint,
    /// The class's first (lowest) member.
    Lower,
    /// The class's last (highest) member.
    Upper,
}

/// The outcome of partitioning a sorted, distinct value set into
/// error-bounded classes (§4.7.1 "rounding cover").
#[derive(Debug, Clone, PartialEq)]
pub struct Cover {
    /// Per-input-element class index, same length and order as the
    /// `sorted` slice passed to [`rounding_cover`].
    pub slots: Vec<usize>,
    pub representatives: Vec<f64>,
}

fn represent(first: f64, last: f64, mode: RoundMode) -> f64 {
    match mode {
        RoundMode::Midpoint => (first + last) / 2.0,
        RoundMode::Lower => first,
        RoundMode::Upper => last,
    }
}

/// Partition `sorted` (ascending, distinct) into classes such that no
/// class spans more than `e` from its first to its last member,
/// opening a new class greedily whenever the next element would exceed
/// the current class's last member by more than `e` (§4.7.1).
pub fn rounding_cover(sorted: &[f64], e: f64, mode: RoundMode) -> Cover {
    if sorted.is_empty() {
        return Cover { slots: Vec::new(), representatives: Vec::new() };
    }
    let mut slots = Vec::with_capacity(sorted.len());
    let mut representatives = Vec::new();
    let mut class_first = sorted[0];
    let mut class_last = sorted[0];
    let mut class_idx = 0usize;
    slots.push(0);
    for &v in &sorted[1..] {
        if v - class_last > e {
            representatives.push(represent(class_first, class_last, mode));
            class_idx += 1;
            class_first = v;
        }
        class_last = v;
        slots.push(class_idx);
    }
    representatives.push(represent(class_first, class_last, mode));
    Cover { slots, representatives }
}

fn sorted_distinct(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.partial_cmp(b).expect("NaN in metric data"));
    v.dedup_by(|a, b| (*a - *b).abs() < f64::EPSILON);
    v
}

fn class_count(sorted: &[f64], e: f64) -> usize {
    rounding_cover(sorted, e, RoundMode::Midpoint).representatives.len()
}

/// The smallest amount by which `e` would need to grow to merge at
/// least one more class boundary, given the current partition at `e`.
/// Used by [`tfm_shorten`] to step `e` upward without overshooting.
fn next_needed_gap(sorted: &[f64], e: f64) -> f64 {
    let mut class_last = sorted[0];
    let mut min_excess = f64::INFINITY;
    for &v in &sorted[1..] {
        let diff = v - class_last;
        if diff > e {
            min_excess = min_excess.min(diff - e);
        }
        class_last = v;
    }
    min_excess
}

/// Find the smallest error bound `e` such that `rounding_cover(values,
/// e, _)` yields at most `m` classes (§4.7.1 "Minimizing e").
///
/// Starts at `e=0`; if that already satisfies `m`, returns it.
/// Otherwise doubles a probe step until an upper bound satisfying `m`
/// is found, halves once, then steps the lower bound up by the
/// smallest boundary gap the cover routine reports until the class
/// count drops to `m`. Converges in at most `|values|` steps because
/// each step strictly merges at least one class.
pub fn tfm_shorten(values: &[f64], m: usize) -> f64 {
    let sorted = sorted_distinct(values);
    if sorted.len() <= m {
        return 0.0;
    }
    if class_count(&sorted, 0.0) <= m {
        return 0.0;
    }
    let min_gap = sorted.windows(2).map(|w| w[1] - w[0]).fold(f64::INFINITY, f64::min);
    let mut step = if min_gap.is_finite() && min_gap > 0.0 { min_gap } else { 1.0 };
    while class_count(&sorted, step) > m {
        step *= 2.0;
    }
    let mut e = step / 2.0;
    loop {
        if class_count(&sorted, e) <= m {
            return e;
        }
        e += next_needed_gap(&sorted, e) + 1e-9;
    }
}

/// Look up the class index a value was assigned in `cover`, built over
/// `sorted` (the same slice passed to [`rounding_cover`]).
fn class_of(sorted: &[f64], cover: &Cover, value: f64) -> usize {
    let idx = sorted
        .binary_search_by(|probe| probe.partial_cmp(&value).expect("NaN in metric data"))
        .expect("value must come from the same set `cover` was built over");
    cover.slots[idx]
}

/// Assign frequency-descending slot numbers to a set of `(w,h,d)`
/// triples referenced by `codes_triples`, reserving slot 0 for the
/// zero triple regardless of whether any code actually needs it, and
/// breaking frequency ties by first appearance (§3, §8 "stable
/// frequency sort").
fn assign_slots(codes_triples: &[(u32, (f64, f64, f64))]) -> ReducedMetric {
    let mut order: Vec<(f64, f64, f64)> = Vec::new();
    let mut counts: IndexMap<(u64, u64, u64), (usize, usize)> = IndexMap::new(); // bits -> (first_seen, count)

    let bits = |t: (f64, f64, f64)| (t.0.to_bits(), t.1.to_bits(), t.2.to_bits());

    for (seen_order, &(_, triple)) in codes_triples.iter().enumerate() {
        let key = bits(triple);
        match counts.get_mut(&key) {
            Some((_, count)) => *count += 1,
            None => {
                counts.insert(key, (seen_order, 1));
                order.push(triple);
            }
        }
    }

    let mut entries: Vec<(f64, f64, f64)> = order.into_iter().filter(|&t| t != (0.0, 0.0, 0.0)).collect();
    entries.sort_by_key(|&t| {
        let (first_seen, count) = counts[&bits(t)];
        (std::cmp::Reverse(count), first_seen)
    });

    let mut value_table = vec![(0.0, 0.0, 0.0)];
    value_table.extend(entries.iter().copied());

    let mut slot_of: IndexMap<(u64, u64, u64), usize> = IndexMap::new();
    for (slot, &t) in value_table.iter().enumerate() {
        slot_of.insert(bits(t), slot);
    }

    let mut index_map = IndexMap::new();
    for &(code, triple) in codes_triples {
        index_map.insert(code, slot_of[&bits(triple)]);
    }

    ReducedMetric { index_map, value_table }
}

/// Number of non-zero-reserved height/depth classes in the classic
/// reduction: 15 usable slots plus the reserved zero (§4.7 "target of
/// 15 slots (m=16, slot 0 reserved for zero)").
const CLASSIC_DIMENSION_CLASSES: usize = 15;

/// Maximum distinct widths the classic grammar's `w` index can carry
/// (one byte, minus the reserved zero slot).
const CLASSIC_MAX_WIDTHS: usize = 255;

/// Maximum total `(w,h,d)` triples a JFM-family table may hold,
/// including the reserved zero slot.
const MAX_TABLE_SIZE: usize = 256;

/// Classic `tfm_reduce`: widths pass through unreduced (at most 255
/// distinct values allowed); heights and depths are bucketed
/// independently into at most 15 non-zero classes each (§4.7).
pub fn tfm_reduce(raw: &[RawMetricEntry]) -> Result<ReducedMetric, Error> {
    log::debug!("tfm_reduce: {} raw metric entries", raw.len());
    let widths = sorted_distinct(&raw.iter().map(|r| r.width).collect::<Vec<_>>());
    if widths.len() > CLASSIC_MAX_WIDTHS {
        return Err(Error::Semantic(format!(
            "{} distinct widths exceed the classic TFM limit of {CLASSIC_MAX_WIDTHS}",
            widths.len()
        )));
    }

    let heights = sorted_distinct(&raw.iter().map(|r| r.height).collect::<Vec<_>>());
    let depths = sorted_distinct(&raw.iter().map(|r| r.depth).collect::<Vec<_>>());
    let eh = tfm_shorten(&heights, CLASSIC_DIMENSION_CLASSES);
    let ed = tfm_shorten(&depths, CLASSIC_DIMENSION_CLASSES);
    let h_cover = rounding_cover(&heights, eh, RoundMode::Midpoint);
    let d_cover = rounding_cover(&depths, ed, RoundMode::Midpoint);

    let triples: Vec<(u32, (f64, f64, f64))> = raw
        .iter()
        .map(|r| {
            let h_rep = h_cover.representatives[class_of(&heights, &h_cover, r.height)];
            let d_rep = d_cover.representatives[class_of(&depths, &d_cover, r.depth)];
            (r.code, (r.width, h_rep, d_rep))
        })
        .collect();

    let reduced = assign_slots(&triples);
    log::info!(
        "tfm_reduce: {} widths, {} height classes, {} depth classes",
        widths.len(),
        h_cover.representatives.len(),
        d_cover.representatives.len()
    );
    Ok(reduced)
}

fn triple_count_for(raw: &[RawMetricEntry], w_bound: f64, hd_bound: f64) -> usize {
    let (_, _, metric) = reduce_with_bounds(raw, w_bound, hd_bound);
    metric.value_table.len()
}

fn reduce_with_bounds(raw: &[RawMetricEntry], w_bound: f64, hd_bound: f64) -> (f64, f64, ReducedMetric) {
    let widths = sorted_distinct(&raw.iter().map(|r| r.width).collect::<Vec<_>>());
    let heights = sorted_distinct(&raw.iter().map(|r| r.height).collect::<Vec<_>>());
    let depths = sorted_distinct(&raw.iter().map(|r| r.depth).collect::<Vec<_>>());

    let w_cover = rounding_cover(&widths, w_bound, RoundMode::Midpoint);
    let h_cover = rounding_cover(&heights, hd_bound, RoundMode::Midpoint);
    let d_cover = rounding_cover(&depths, hd_bound, RoundMode::Midpoint);

    let triples: Vec<(u32, (f64, f64, f64))> = raw
        .iter()
        .map(|r| {
            let w_rep = w_cover.representatives[class_of(&widths, &w_cover, r.width)];
            let h_rep = h_cover.representatives[class_of(&heights, &h_cover, r.height)];
            let d_rep = d_cover.representatives[class_of(&depths, &d_cover, r.depth)];
            (r.code, (w_rep, h_rep, d_rep))
        })
        .collect();

    (w_bound, hd_bound, assign_slots(&triples))
}

/// Bisection precision for [`tfm_reduce_jpl`] (§4.7 "convergence
/// threshold `9x10^-7`").
const JPL_CONVERGENCE: f64 = 9e-7;

/// Bisection precision for [`tfm_reduce_jpl_x`] (§4.7 "threshold
/// `10^-7`").
const JPL_X_CONVERGENCE: f64 = 1e-7;

/// The width-to-height/depth error ratio `tfm_reduce_jpl_x` applies to
/// its single parameter `d` (width bound `d/B`). The spec leaves `B`
/// unspecified beyond "single parameter `d`"; we fix it at 16, matching
/// upstream pTeX's jfm-reduce-ratio default of a much tighter width
/// tolerance than height/depth — see DESIGN.md Open Questions.
const JPL_X_WIDTH_RATIO: f64 = 16.0;

/// Upper end of the `dh` search range for [`tfm_reduce_jpl`] (§4.7
/// "binary-search `dh` in `[0, 2048]`").
const JPL_DH_SEARCH_CEILING: f64 = 2048.0;

fn doubling_probe(raw: &[RawMetricEntry], ceiling: f64, count_for: impl Fn(&[RawMetricEntry], f64) -> usize) -> f64 {
    let mut probe = 1e-6_f64;
    while probe < ceiling && count_for(raw, probe) > MAX_TABLE_SIZE {
        probe *= 2.0;
    }
    probe.min(ceiling)
}

/// Balanced `tfm_reduce_jpl`: widths are bucketed under a caller-given
/// bound `dw`; heights and depths share a single bound `dh`, binary-
/// searched over `[0, 2048]` (doubling-probe first) so the total
/// `(w,h,d)` table has at most 256 entries (§4.7). Returns `(dw, dh,
/// reduced)`.
pub fn tfm_reduce_jpl(raw: &[RawMetricEntry], dw: f64) -> (f64, f64, ReducedMetric) {
    log::debug!("tfm_reduce_jpl: {} raw metric entries, dw={dw}", raw.len());
    let upper = doubling_probe(raw, JPL_DH_SEARCH_CEILING, |raw, dh| triple_count_for(raw, dw, dh));
    let mut lo = 0.0_f64;
    let mut hi = upper;
    while hi - lo > JPL_CONVERGENCE {
        let mid = (lo + hi) / 2.0;
        if triple_count_for(raw, dw, mid) <= MAX_TABLE_SIZE {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    log::info!("tfm_reduce_jpl converged: dh={hi}");
    reduce_with_bounds(raw, dw, hi)
}

/// Ratio-balanced `tfm_reduce_jpl_x`: a single parameter `d` bounds
/// widths at `d / JPL_X_WIDTH_RATIO` and heights/depths at `d`, binary-
/// searched over `[0, d_max]` (doubling-probe first) at a finer
/// convergence threshold than [`tfm_reduce_jpl`]. Returns `(d,
/// reduced)`.
pub fn tfm_reduce_jpl_x(raw: &[RawMetricEntry], d_max: f64) -> (f64, ReducedMetric) {
    log::debug!("tfm_reduce_jpl_x: {} raw metric entries, d_max={d_max}", raw.len());
    let upper = doubling_probe(raw, d_max, |raw, d| triple_count_for(raw, d / JPL_X_WIDTH_RATIO, d));
    let mut lo = 0.0_f64;
    let mut hi = upper;
    while hi - lo > JPL_X_CONVERGENCE {
        let mid = (lo + hi) / 2.0;
        if triple_count_for(raw, mid / JPL_X_WIDTH_RATIO, mid) <= MAX_TABLE_SIZE {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    log::info!("tfm_reduce_jpl_x converged: d={hi}");
    let (_, _, metric) = reduce_with_bounds(raw, hi / JPL_X_WIDTH_RATIO, hi);
    (hi, metric)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(code: u32, w: f64, h: f64, d: f64) -> RawMetricEntry {
        RawMetricEntry { code, width: w, height: h, depth: d }
    }

    #[test]
    fn rounding_cover_opens_a_new_class_past_the_error_bound() {
        let cover = rounding_cover(&[0.0, 0.1, 0.5, 0.55], 0.2, RoundMode::Midpoint);
        assert_eq!(cover.slots, vec![0, 0, 1, 1]);
        assert_eq!(cover.representatives.len(), 2);
    }

    #[test]
    fn tfm_shorten_returns_zero_when_already_within_m_classes() {
        assert_eq!(tfm_shorten(&[1.0, 2.0, 3.0], 5), 0.0);
    }

    #[test]
    fn tfm_shorten_finds_minimal_bound_for_two_clusters() {
        let values = [0.0, 0.01, 1.0, 1.01];
        let e = tfm_shorten(&values, 2);
        let cover = rounding_cover(&values, e, RoundMode::Midpoint);
        assert_eq!(cover.representatives.len(), 2);
        // A slightly smaller e must fail to reach 2 classes.
        let tighter = rounding_cover(&values, e - 1e-7, RoundMode::Midpoint);
        assert!(tighter.representatives.len() >= 2);
    }

    #[test]
    fn tfm_reduce_rejects_too_many_distinct_widths() {
        let raw: Vec<RawMetricEntry> = (0..=CLASSIC_MAX_WIDTHS as u32 + 1)
            .map(|i| entry(i, i as f64, 0.5, 0.1))
            .collect();
        assert!(tfm_reduce(&raw).is_err());
    }

    #[test]
    fn tfm_reduce_buckets_heights_into_classic_class_budget() {
        let raw: Vec<RawMetricEntry> = (0..100).map(|i| entry(i, 0.5, i as f64 * 0.001, 0.1)).collect();
        let reduced = tfm_reduce(&raw).unwrap();
        // <= 15 distinct heights * 1 depth * 1 width, plus reserved zero.
        assert!(reduced.value_table.len() <= CLASSIC_DIMENSION_CLASSES + 1);
    }

    #[test]
    fn zero_triple_is_always_reserved_slot_zero_even_if_unused() {
        let raw = vec![entry(65, 0.5, 0.7, 0.2), entry(66, 0.5, 0.7, 0.2)];
        let reduced = tfm_reduce(&raw).unwrap();
        assert_eq!(reduced.value_table[0], (0.0, 0.0, 0.0));
    }

    #[test]
    fn frequency_sort_is_descending_and_stable_on_ties() {
        let raw = vec![
            entry(1, 0.1, 0.1, 0.1),
            entry(2, 0.2, 0.2, 0.2),
            entry(3, 0.1, 0.1, 0.1),
            entry(4, 0.3, 0.3, 0.3),
            entry(5, 0.2, 0.2, 0.2),
        ];
        let reduced = tfm_reduce(&raw).unwrap();
        // (0.1,...) appears twice and was seen first among the ties;
        // it must outrank (0.2,...) which also appears twice but later,
        // and both outrank the singleton (0.3,...).
        let slot_01 = reduced.index_map[&1];
        let slot_02 = reduced.index_map[&2];
        let slot_03 = reduced.index_map[&4];
        assert!(slot_01 < slot_02);
        assert!(slot_02 < slot_03);
    }

    #[test]
    fn tfm_reduce_jpl_respects_the_256_entry_budget() {
        let raw: Vec<RawMetricEntry> =
            (0..500).map(|i| entry(i, (i % 50) as f64 * 0.01, (i % 50) as f64 * 0.01, 0.1)).collect();
        let (dw, dh, reduced) = tfm_reduce_jpl(&raw, 0.02);
        assert!(dw >= 0.0);
        assert!(dh >= 0.0);
        assert!(reduced.value_table.len() <= MAX_TABLE_SIZE);
        for entry in &raw {
            let slot = reduced.index_map[&entry.code];
            let (w, h, d) = reduced.value_table[slot];
            assert!((w - entry.width).abs() <= dw + 1e-6);
            assert!((h - entry.height).abs() <= dh + 1e-6);
            assert!((d - entry.depth).abs() <= dh + 1e-6);
        }
    }

    #[test]
    fn tfm_reduce_jpl_x_respects_the_256_entry_budget() {
        let raw: Vec<RawMetricEntry> =
            (0..500).map(|i| entry(i, (i % 50) as f64 * 0.01, (i % 50) as f64 * 0.01, 0.1)).collect();
        let (d, reduced) = tfm_reduce_jpl_x(&raw, 20.0);
        assert!(d >= 0.0);
        assert!(reduced.value_table.len() <= MAX_TABLE_SIZE);
    }

    #[test]
    fn tfm_reduce_jpl_x_matches_scenario_widths_and_clusters_heights() {
        let raw = vec![entry(1, 0.5, 0.3, 0.1), entry(2, 0.5, 0.31, 0.1), entry(3, 0.5, 0.7, 0.1)];
        let (d, reduced) = tfm_reduce_jpl_x(&raw, 20.0);
        assert!(d >= 0.0 && d <= 20.0);
        for e in &raw {
            let slot = reduced.index_map[&e.code];
            let (w, _, _) = reduced.value_table[slot];
            assert_eq!(w, 0.5);
        }
        // codes 1 and 2 differ in height by only 0.01, well inside any
        // reasonable bound, so they should land in the same class while
        // code 3 (height 0.7) stays distinct.
        let slot1 = reduced.index_map[&1];
        let slot2 = reduced.index_map[&2];
        let slot3 = reduced.index_map[&3];
        assert_eq!(slot1, slot2);
        assert_ne!(slot1, slot3);
    }
}
