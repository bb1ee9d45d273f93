use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Counter,
    Tick,
    Note,
    NoteItem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Inserted,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change {
    pub table: Table,
    pub kind: ChangeKind,
    pub id: i64,
}

/// Fans committed writes out to every live subscriber.
#[derive(Debug, Default)]
pub struct ChangeFeed {
    subscribers: Mutex<Vec<Sender<Change>>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<Change> {
        let (tx, rx) = mpsc::channel();
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push(tx);
        }
        rx
    }

    pub fn emit(&self, table: Table, kind: ChangeKind, id: i64) {
        let change = Change { table, kind, id };
        if let Ok(mut subscribers) = self.subscribers.lock() {
            // Dropped receivers fail to send and are pruned here.
            subscribers.retain(|tx| tx.send(change).is_ok());
        }
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map_or(0, |subscribers| subscribers.len())
    }
}

type Query<'r, T, E> = Box<dyn FnMut() -> Result<T, E> + 'r>;

/// A query that yields again whenever one of the tables it reads changes.
pub struct Flow<'r, T, E> {
    rx: Receiver<Change>,
    tables: Vec<Table>,
    query: Query<'r, T, E>,
    primed: bool,
}

impl<'r, T, E> Flow<'r, T, E> {
    pub fn new<F>(rx: Receiver<Change>, tables: &[Table], query: F) -> Self
    where
        F: FnMut() -> Result<T, E> + 'r,
    {
        Self {
            rx,
            tables: tables.to_vec(),
            query: Box::new(query),
            primed: false,
        }
    }

    /// First call yields the current value; later calls yield only when a
    /// relevant change arrived since the previous poll.
    pub fn poll(&mut self) -> Result<Option<T>, E> {
        let mut dirty = !self.primed;
        loop {
            match self.rx.try_recv() {
                Ok(change) => {
                    if self.tables.contains(&change.table) {
                        dirty = true;
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        if !dirty {
            return Ok(None);
        }
        // A failed query leaves the flow dirty so the next poll retries.
        let value = (self.query)();
        self.primed = value.is_ok();
        value.map(Some)
    }
}
