#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

const MIN_REPEAT_INTERVAL_SECONDS: f32 = 0.001;

#[derive(Debug, Clone, Copy)]
struct Timer {
    id: TimerId,
    remaining_seconds: f32,
    repeat_seconds: Option<f32>,
}

/// Cancellable timers owned by one screen, advanced by the tick delta.
#[derive(Debug, Default)]
pub struct TimerQueue {
    timers: Vec<Timer>,
    next_id: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn after(&mut self, seconds: f32) -> TimerId {
        self.schedule(seconds, None)
    }

    pub fn every(&mut self, seconds: f32) -> TimerId {
        let interval = seconds.max(MIN_REPEAT_INTERVAL_SECONDS);
        self.schedule(interval, Some(interval))
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|timer| timer.id != id);
        self.timers.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.iter().any(|timer| timer.id == id)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn advance(&mut self, dt_seconds: f32) {
        let dt_seconds = dt_seconds.max(0.0);
        for timer in &mut self.timers {
            timer.remaining_seconds -= dt_seconds;
        }
    }

    /// Pops the most overdue timer. Repeating timers are rescheduled, so a
    /// handler cancelling another timer between pops takes effect immediately.
    pub fn pop_due(&mut self) -> Option<TimerId> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.remaining_seconds <= 0.0)
            .min_by(|(_, a), (_, b)| {
                a.remaining_seconds
                    .total_cmp(&b.remaining_seconds)
                    .then(a.id.cmp(&b.id))
            })
            .map(|(index, _)| index)?;

        let Timer {
            id, repeat_seconds, ..
        } = self.timers[index];
        match repeat_seconds {
            Some(interval) => self.timers[index].remaining_seconds += interval,
            None => {
                self.timers.remove(index);
            }
        }
        Some(id)
    }

    fn schedule(&mut self, seconds: f32, repeat_seconds: Option<f32>) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.timers.push(Timer {
            id,
            remaining_seconds: seconds.max(0.0),
            repeat_seconds,
        });
        id
    }
}
