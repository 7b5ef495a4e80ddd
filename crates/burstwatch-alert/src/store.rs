use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Per-key event count and last-seen time.
///
/// Handed out by value only; the live copy stays inside [`CounterStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tracker {
    count: u64,
    last_event_time: DateTime<Utc>,
}

impl Tracker {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            count: 1,
            last_event_time: now,
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn last_event_time(&self) -> DateTime<Utc> {
        self.last_event_time
    }

    fn bump(&mut self, now: DateTime<Utc>) -> TrackerUpdate {
        let previous_event_time = self.last_event_time;
        self.count += 1;
        // never move backwards if two workers read the clock out of order
        self.last_event_time = previous_event_time.max(now);
        TrackerUpdate {
            count: self.count,
            previous_event_time,
            event_time: self.last_event_time,
        }
    }
}

/// Result of incrementing an existing tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerUpdate {
    /// Count after this event was applied.
    pub count: u64,
    /// `last_event_time` as it was before this event.
    pub previous_event_time: DateTime<Utc>,
    /// `last_event_time` after this event.
    pub event_time: DateTime<Utc>,
}

/// Outcome of [`CounterStore::record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    /// First event for the key; the tracker starts at count 1.
    Created(Tracker),
    /// The key already had a tracker and it was incremented.
    Incremented(TrackerUpdate),
}

/// Concurrent map from entity key to [`Tracker`].
///
/// Backed by a sharded [`DashMap`]: operations on different keys only
/// contend when they hash to the same shard, and every operation on one
/// key runs under that shard's write lock, so per-key updates are totally
/// ordered. Keys are never removed.
#[derive(Debug, Default)]
pub struct CounterStore {
    trackers: DashMap<String, Tracker>,
}

impl CounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the tracker for `key`, creating it with count 1 if absent.
    ///
    /// The boolean is `true` only for the single caller that created it.
    pub fn get_or_create(&self, key: &str, now: DateTime<Utc>) -> (Tracker, bool) {
        if let Some(tracker) = self.trackers.get(key) {
            return (*tracker, false);
        }

        match self.trackers.entry(key.to_owned()) {
            Entry::Occupied(entry) => (*entry.get(), false),
            Entry::Vacant(entry) => {
                let tracker = Tracker::new(now);
                entry.insert(tracker);
                (tracker, true)
            }
        }
    }

    /// Increments the tracker for `key` and stamps it with `now`.
    ///
    /// Returns `None` if the key has never been observed.
    pub fn update(&self, key: &str, now: DateTime<Utc>) -> Option<TrackerUpdate> {
        self.trackers
            .get_mut(key)
            .map(|mut tracker| tracker.bump(now))
    }

    /// Creates or increments the tracker for `key` in one critical section.
    pub fn record(&self, key: &str, now: DateTime<Utc>) -> Recorded {
        // fast path: existing keys don't allocate an owned key
        if let Some(update) = self.update(key, now) {
            return Recorded::Incremented(update);
        }

        match self.trackers.entry(key.to_owned()) {
            Entry::Occupied(mut entry) => Recorded::Incremented(entry.get_mut().bump(now)),
            Entry::Vacant(entry) => {
                let tracker = Tracker::new(now);
                entry.insert(tracker);
                Recorded::Created(tracker)
            }
        }
    }

    /// Snapshot of the tracker for `key`, if any.
    pub fn get(&self, key: &str) -> Option<Tracker> {
        self.trackers.get(key).map(|tracker| *tracker)
    }

    /// Number of distinct keys tracked.
    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }
}
