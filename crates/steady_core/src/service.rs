use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    habit::{DayMark, DayTone, Habit, MarkHistory},
    storage::{BlobStore, MemoryStore},
    streak,
};

pub const HABITS_KEY: &str = "habits";
pub const LAST_RESET_KEY: &str = "last_reset";
pub const DAY_MARKS_KEY: &str = "day_marks";

/// Everything the renderer needs for one screen: the habit checklist, the
/// derived streak, and the calendar marks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HabitSnapshot {
    pub habits: Vec<Habit>,
    pub streak: u32,
    pub marks: MarkHistory,
}

/// Authoritative owner of the habit list, today's completion flags, and the
/// mark history. Every mutating operation writes through to the store before
/// returning; storage failures are logged and the in-memory state stays
/// authoritative for the session.
pub struct HabitService {
    store: Box<dyn BlobStore>,
    habits: Vec<Habit>,
    marks: MarkHistory,
    last_reset: NaiveDate,
}

pub struct HabitServiceBuilder {
    store: Option<Box<dyn BlobStore>>,
}

impl HabitServiceBuilder {
    pub fn new() -> Self {
        Self { store: None }
    }

    pub fn with_store(mut self, store: Box<dyn BlobStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Load persisted state, falling back to empty defaults on any read or
    /// deserialization failure. Losing a day's transient completion state is
    /// preferable to blocking the caller, so this never fails.
    pub fn build(self, today: NaiveDate) -> HabitService {
        let store = self
            .store
            .unwrap_or_else(|| Box::new(MemoryStore::new()) as Box<dyn BlobStore>);

        let habits: Vec<Habit> = load_value(store.as_ref(), HABITS_KEY).unwrap_or_default();
        let marks: MarkHistory = load_value(store.as_ref(), DAY_MARKS_KEY).unwrap_or_default();
        let stored_reset: Option<NaiveDate> = load_value(store.as_ref(), LAST_RESET_KEY);
        let last_reset = stored_reset.unwrap_or(today);

        let service = HabitService {
            store,
            habits,
            marks,
            last_reset,
        };
        if stored_reset.is_none() {
            // First access: seed the cursor so the next activation sees it.
            service.persist(LAST_RESET_KEY, &service.last_reset);
        }
        service
    }
}

impl Default for HabitServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HabitService {
    pub fn builder() -> HabitServiceBuilder {
        HabitServiceBuilder::new()
    }

    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    pub fn marks(&self) -> &MarkHistory {
        &self.marks
    }

    pub fn last_reset(&self) -> NaiveDate {
        self.last_reset
    }

    /// Clear every completion flag when the calendar day has rolled over
    /// since the last reset. Must run before any toggle is trusted; calling
    /// it again on the same day is a no-op and issues no further writes.
    pub fn reconcile_day(&mut self, today: NaiveDate) -> Vec<Habit> {
        if self.last_reset == today {
            return self.habits.clone();
        }
        debug!(from = %self.last_reset, to = %today, "day rolled over; clearing completion flags");
        for habit in &mut self.habits {
            habit.completed = false;
        }
        self.last_reset = today;
        self.persist(HABITS_KEY, &self.habits);
        self.persist(LAST_RESET_KEY, &self.last_reset);
        self.habits.clone()
    }

    /// Flip the named habit and rewrite today's mark: `Completed` when every
    /// active habit is done, `Partial` otherwise. Unknown names are ignored
    /// and leave the mark history untouched.
    ///
    /// Callers must have reconciled the day first; the mark is keyed by the
    /// reset cursor rather than by a fresh clock read.
    pub fn toggle(&mut self, name: &str) -> (Vec<Habit>, Option<DayMark>) {
        let Some(habit) = self.habits.iter_mut().find(|habit| habit.name == name) else {
            debug!(name, "toggle ignored; no such habit");
            return (self.habits.clone(), None);
        };
        habit.completed = !habit.completed;

        let tone = if self.habits.iter().all(|habit| habit.completed) {
            DayTone::Completed
        } else {
            DayTone::Partial
        };
        let mark = DayMark::with_tone(tone);
        self.marks.insert(self.last_reset, mark);

        self.persist(HABITS_KEY, &self.habits);
        self.persist(DAY_MARKS_KEY, &self.marks);
        (self.habits.clone(), Some(mark))
    }

    /// Append a habit. Blank names and duplicates of an active name are
    /// ignored; uniqueness is not enforced against history.
    pub fn add(&mut self, name: &str) -> Vec<Habit> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            debug!("add ignored; blank habit name");
            return self.habits.clone();
        }
        if self.habits.iter().any(|habit| habit.name == trimmed) {
            debug!(name = trimmed, "add ignored; name already in the active list");
            return self.habits.clone();
        }
        self.habits.push(Habit::new(trimmed));
        self.persist(HABITS_KEY, &self.habits);
        self.habits.clone()
    }

    /// Remove the first habit with the given name; unknown names are ignored.
    pub fn remove(&mut self, name: &str) -> Vec<Habit> {
        match self.habits.iter().position(|habit| habit.name == name) {
            Some(index) => {
                self.habits.remove(index);
                self.persist(HABITS_KEY, &self.habits);
            }
            None => debug!(name, "remove ignored; no such habit"),
        }
        self.habits.clone()
    }

    pub fn snapshot(&self) -> HabitSnapshot {
        HabitSnapshot {
            habits: self.habits.clone(),
            streak: streak::current_streak(&self.marks, self.last_reset),
            marks: self.marks.clone(),
        }
    }

    fn persist<T: Serialize>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(key, %err, "failed to serialize value; in-memory state stays authoritative");
                return;
            }
        };
        if let Err(err) = self.store.put(key, &raw) {
            warn!(key, %err, "storage write failed; in-memory state stays authoritative");
        }
    }
}

fn load_value<T: DeserializeOwned>(store: &dyn BlobStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            warn!(key, %err, "storage read failed; treating as no prior state");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key, %err, "stored value is unreadable; treating as no prior state");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    /// Wraps a `MemoryStore` and counts writes, for idempotence assertions.
    struct CountingStore {
        inner: MemoryStore,
        puts: Arc<AtomicUsize>,
    }

    impl CountingStore {
        fn new() -> (Self, Arc<AtomicUsize>) {
            let puts = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    inner: MemoryStore::new(),
                    puts: Arc::clone(&puts),
                },
                puts,
            )
        }
    }

    impl BlobStore for CountingStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            self.inner.put(key, value)
        }
    }

    /// Store whose every operation fails, for fail-open assertions.
    struct BrokenStore;

    impl BlobStore for BrokenStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Read {
                key: key.to_string(),
                source: std::io::Error::other("unavailable"),
            })
        }

        fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
            let _ = value;
            Err(StorageError::Write {
                key: key.to_string(),
                source: std::io::Error::other("unavailable"),
            })
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    fn service_with_habits(names: &[&str]) -> HabitService {
        let mut service = HabitService::builder().build(today());
        for name in names {
            service.add(name);
        }
        service
    }

    #[test]
    fn toggle_tracks_the_all_complete_aggregate() {
        let mut service = service_with_habits(&["Meditate", "Read"]);

        let (_, mark) = service.toggle("Meditate");
        assert_eq!(mark.map(|m| m.tone), Some(DayTone::Partial));

        let (_, mark) = service.toggle("Read");
        assert_eq!(mark.map(|m| m.tone), Some(DayTone::Completed));

        let (_, mark) = service.toggle("Read");
        assert_eq!(mark.map(|m| m.tone), Some(DayTone::Partial));

        let (habits, mark) = service.toggle("Read");
        assert_eq!(mark.map(|m| m.tone), Some(DayTone::Completed));
        assert!(habits.iter().all(|habit| habit.completed));
    }

    #[test]
    fn toggling_an_unknown_name_changes_nothing() {
        let mut service = service_with_habits(&["Meditate"]);
        let (habits, mark) = service.toggle("Journal");
        assert_eq!(mark, None);
        assert_eq!(habits.len(), 1);
        assert!(!habits[0].completed);
        assert!(service.marks().is_empty());
    }

    #[test]
    fn blank_and_duplicate_adds_are_ignored() {
        let mut service = service_with_habits(&["Meditate"]);
        assert_eq!(service.add("").len(), 1);
        assert_eq!(service.add("   ").len(), 1);
        assert_eq!(service.add("Meditate").len(), 1);
        assert_eq!(service.add("  Read  ").len(), 2);
        assert_eq!(service.habits()[1].name, "Read");
    }

    #[test]
    fn removing_an_unknown_name_is_a_no_op() {
        let mut service = service_with_habits(&["Meditate"]);
        assert_eq!(service.remove("Journal").len(), 1);
        assert!(service.remove("Meditate").is_empty());
    }

    #[test]
    fn reconcile_day_clears_flags_once_per_rollover() {
        let (store, puts) = CountingStore::new();
        let mut service = HabitService::builder()
            .with_store(Box::new(store))
            .build(today());
        service.add("Meditate");
        service.toggle("Meditate");
        assert!(service.habits()[0].completed);

        let tomorrow = today().succ_opt().unwrap();
        let writes_before = puts.load(Ordering::SeqCst);
        let first = service.reconcile_day(tomorrow);
        assert!(first.iter().all(|habit| !habit.completed));
        assert!(puts.load(Ordering::SeqCst) > writes_before);

        let writes_after_first = puts.load(Ordering::SeqCst);
        let second = service.reconcile_day(tomorrow);
        assert_eq!(second, first);
        assert_eq!(
            puts.load(Ordering::SeqCst),
            writes_after_first,
            "repeat reconcile on the same day must not write"
        );
    }

    #[test]
    fn reconcile_preserves_history_marks() {
        let mut service = service_with_habits(&["Meditate"]);
        service.toggle("Meditate");
        let tomorrow = today().succ_opt().unwrap();
        service.reconcile_day(tomorrow);
        assert_eq!(
            service.marks().get(&today()).map(|m| m.tone),
            Some(DayTone::Completed)
        );
    }

    #[test]
    fn broken_storage_degrades_to_defaults_without_failing() {
        let mut service = HabitService::builder()
            .with_store(Box::new(BrokenStore))
            .build(today());
        assert!(service.habits().is_empty());

        // Writes fail silently; in-memory state is still updated.
        service.add("Meditate");
        let (habits, mark) = service.toggle("Meditate");
        assert!(habits[0].completed);
        assert_eq!(mark.map(|m| m.tone), Some(DayTone::Completed));
    }

    #[test]
    fn snapshot_reports_streak_through_yesterday() {
        let mut service = service_with_habits(&["Meditate"]);
        service.toggle("Meditate");
        assert_eq!(service.snapshot().streak, 1, "completed today counts");

        let tomorrow = today().succ_opt().unwrap();
        service.reconcile_day(tomorrow);
        let snapshot = service.snapshot();
        assert_eq!(snapshot.streak, 1, "empty today keeps yesterday's streak");
        assert!(snapshot.habits.iter().all(|habit| !habit.completed));
    }
}
