use std::collections::BTreeSet;
use std::sync::mpsc::Receiver;

use crate::observable::{MapChange, ObservableMap};
use crate::repository::{CounterSummary, StoreError, StoreFlow};

pub type BoardChange = MapChange<i64, CounterSummary>;

/// Live view of every counter and its stats, keyed by counter id.
pub struct CounterBoard<'r> {
    flow: StoreFlow<'r, Vec<CounterSummary>>,
    entries: ObservableMap<i64, CounterSummary>,
}

impl<'r> CounterBoard<'r> {
    pub fn new(flow: StoreFlow<'r, Vec<CounterSummary>>) -> Self {
        Self {
            flow,
            entries: ObservableMap::new(),
        }
    }

    pub fn subscribe(&mut self) -> Receiver<BoardChange> {
        self.entries.subscribe()
    }

    /// Pulls the latest summaries if the store changed and applies the
    /// difference. Returns how many entries changed.
    pub fn refresh(&mut self) -> Result<usize, StoreError> {
        let Some(summaries) = self.flow.poll()? else {
            return Ok(0);
        };
        Ok(self.apply(summaries))
    }

    fn apply(&mut self, summaries: Vec<CounterSummary>) -> usize {
        let live: BTreeSet<i64> = summaries.iter().map(|s| s.counter.id).collect();
        let mut changes = self.entries.retain_keys(|id| live.contains(id));
        for summary in summaries {
            let id = summary.counter.id;
            let unchanged = self.entries.get(&id) == Some(&summary);
            if !unchanged {
                self.entries.insert(id, summary);
                changes += 1;
            }
        }
        changes
    }

    pub fn get(&self, counter_id: i64) -> Option<&CounterSummary> {
        self.entries.get(&counter_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rows ordered by most recently modified counter first.
    pub fn rows(&self) -> Vec<&CounterSummary> {
        let mut rows: Vec<&CounterSummary> = self.entries.values().collect();
        rows.sort_by(|a, b| {
            b.counter
                .time_modified
                .cmp(&a.counter.time_modified)
                .then(a.counter.id.cmp(&b.counter.id))
        });
        rows
    }

    pub fn grand_total(&self) -> f64 {
        self.entries.values().map(|s| s.stats.total).sum()
    }
}
