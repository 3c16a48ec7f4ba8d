//! Data ranges used to autoscale an axis on the data it shows.

/// Closed interval `[lo, hi]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub lo: f64,
    pub hi: f64,
}

impl Range {
    fn point(v: f64) -> Self {
        Range { lo: v, hi: v }
    }

    fn include(self, v: f64) -> Self {
        Range { lo: self.lo.min(v), hi: self.hi.max(v) }
    }

    /// Smallest range containing both `self` and `other`.
    pub fn union(self, other: Range) -> Self {
        Range { lo: self.lo.min(other.lo), hi: self.hi.max(other.hi) }
    }
}

fn fold(values: impl Iterator<Item = f64>) -> Option<Range> {
    values.filter(|v| !v.is_nan())
        .fold(None, |r: Option<Range>, v| {
            Some(r.map_or(Range::point(v), |r| r.include(v)))
        })
}

/// Range of `ys`, NaNs ignored.  `None` if nothing is left.
pub fn data_range(ys: &[f64]) -> Option<Range> {
    fold(ys.iter().copied())
}

/// Range of the `ys` whose abscissa lies between `x0` and `x1`
/// (inclusive, in either order).
pub fn visible_range(xs: &[f64], ys: &[f64], x0: f64, x1: f64)
                     -> Option<Range> {
    let (lo, hi) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
    fold(xs.iter().zip(ys)
         .filter(|(x, _)| lo <= **x && **x <= hi)
         .map(|(_, y)| *y))
}

/// Union of the ranges of several lines, skipping lines without data.
pub fn union_all(ranges: impl IntoIterator<Item = Option<Range>>)
                 -> Option<Range> {
    ranges.into_iter().flatten().reduce(Range::union)
}
