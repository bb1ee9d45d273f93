use std::cmp::Ordering;

use serde::Serialize;
use time::OffsetDateTime;

use crate::domain::model::rfc3339_opt;
use crate::domain::Tick;

/// Smallest and largest element in one pass. Ties keep the first element
/// seen for the minimum and the last for the maximum.
pub fn min_max_by<I, F>(items: I, mut compare: F) -> Option<(I::Item, I::Item)>
where
    I: IntoIterator,
    I::Item: Clone,
    F: FnMut(&I::Item, &I::Item) -> Ordering,
{
    let mut iter = items.into_iter();
    let first = iter.next()?;
    let mut min = first.clone();
    let mut max = first;
    for item in iter {
        if compare(&item, &min) == Ordering::Less {
            min = item.clone();
        }
        if compare(&item, &max) != Ordering::Less {
            max = item;
        }
    }
    Some((min, max))
}

pub fn min_max<I>(items: I) -> Option<(I::Item, I::Item)>
where
    I: IntoIterator,
    I::Item: Ord + Clone,
{
    min_max_by(items, |a, b| a.cmp(b))
}

pub fn min_max_f64<I>(items: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = f64>,
{
    min_max_by(items, |a, b| a.total_cmp(b))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CounterStats {
    pub count: usize,
    pub total: f64,
    pub average: Option<f64>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    #[serde(serialize_with = "rfc3339_opt")]
    pub first: Option<OffsetDateTime>,
    #[serde(serialize_with = "rfc3339_opt")]
    pub last: Option<OffsetDateTime>,
}

impl CounterStats {
    /// Aggregates amounts and the data-time span of `ticks`.
    pub fn from_ticks(ticks: &[Tick]) -> Self {
        let count = ticks.len();
        let total: f64 = ticks.iter().map(|tick| tick.amount).sum();
        let amounts = min_max_f64(ticks.iter().map(|tick| tick.amount));
        let span = min_max(ticks.iter().map(|tick| tick.time_for_data));

        Self {
            count,
            total,
            average: (count > 0).then(|| total / count as f64),
            min_amount: amounts.map(|(lo, _)| lo),
            max_amount: amounts.map(|(_, hi)| hi),
            first: span.map(|(lo, _)| lo),
            last: span.map(|(_, hi)| hi),
        }
    }
}
