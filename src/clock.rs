use time::OffsetDateTime;

use crate::domain::time_field::truncate_to_millis;

/// Source of "now" for use cases that stamp rows.
pub trait Clock {
    fn now(&self) -> OffsetDateTime;
}

/// Wall clock, truncated to the millisecond precision rows are stored with.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        truncate_to_millis(OffsetDateTime::now_utc())
    }
}

#[cfg(test)]
#[derive(Debug)]
pub struct FixedClock {
    now: std::cell::Cell<OffsetDateTime>,
}

#[cfg(test)]
impl FixedClock {
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            now: std::cell::Cell::new(truncate_to_millis(now)),
        }
    }

    pub fn advance(&self, by: time::Duration) {
        self.now.set(self.now.get() + by);
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.now.get()
    }
}

#[cfg(test)]
impl<C: Clock + ?Sized> Clock for std::rc::Rc<C> {
    fn now(&self) -> OffsetDateTime {
        (**self).now()
    }
}
