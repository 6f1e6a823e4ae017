//! Daily escalation of confirmed disallowed gestures
//!
//! Every confirmed gesture bumps a per-day counter. Crossing the threshold
//! turns on face masking and raises a high warning; twice the threshold shuts
//! the session down. The counter is persisted after each change and starts
//! over whenever the calendar date changes.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use super::store::StateStore;
use crate::hand::Gesture;

/// Penalty level derived from the day's count
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyLevel {
    Normal,
    HighWarning,
    Shutdown,
}

impl PenaltyLevel {
    /// `count < T` is normal, `T <= count < 2T` a high warning, `count >= 2T` shutdown
    pub fn from_count(count: u32, threshold: u32) -> Self {
        if count >= threshold.saturating_mul(2) {
            PenaltyLevel::Shutdown
        } else if count >= threshold {
            PenaltyLevel::HighWarning
        } else {
            PenaltyLevel::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PenaltyLevel::Normal => "normal",
            PenaltyLevel::HighWarning => "high_warning",
            PenaltyLevel::Shutdown => "shutdown",
        }
    }
}

impl std::fmt::Display for PenaltyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted per-day record
///
/// Missing counters read as zero. `last_update` is written as RFC 3339 but
/// also accepted without an offset (taken as local time); a missing or
/// unreadable timestamp falls back to the load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationState {
    /// Calendar day the counter belongs to
    pub date: NaiveDate,
    #[serde(rename = "bad_gesture_count", default)]
    pub disallowed_count: u32,
    #[serde(default)]
    pub face_mosaic_enabled: bool,
    #[serde(default = "Local::now", deserialize_with = "lenient_timestamp")]
    pub last_update: DateTime<Local>,
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Local>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or_else(Local::now))
}

fn parse_timestamp(s: &str) -> Option<DateTime<Local>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local));
    }
    match s.parse::<NaiveDateTime>() {
        Ok(naive) => naive.and_local_timezone(Local).earliest(),
        Err(e) => {
            warn!("Unreadable last_update {:?}: {}", s, e);
            None
        }
    }
}

impl EscalationState {
    /// Zeroed state for `date`
    pub fn fresh(date: NaiveDate) -> Self {
        Self {
            date,
            disallowed_count: 0,
            face_mosaic_enabled: false,
            last_update: Local::now(),
        }
    }
}

/// Result of recording one confirmed gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordOutcome {
    /// The penalty level differs from before this record
    pub level_changed: bool,
    pub penalty_level: PenaltyLevel,
    pub face_mosaic_enabled: bool,
}

/// Snapshot of the day's counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub date: NaiveDate,
    pub disallowed_count: u32,
    pub face_mosaic_enabled: bool,
    /// Confirmations left before face masking kicks in
    pub remaining_warnings: u32,
    pub penalty_level: PenaltyLevel,
}

/// Supplies the current calendar date
pub type DateSource = Box<dyn Fn() -> NaiveDate + Send>;

/// Counts confirmed disallowed gestures per calendar day
pub struct EscalationTracker {
    threshold: u32,
    state: EscalationState,
    level: PenaltyLevel,
    store: Box<dyn StateStore>,
    today: DateSource,
}

impl std::fmt::Debug for EscalationTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EscalationTracker")
            .field("threshold", &self.threshold)
            .field("state", &self.state)
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

impl EscalationTracker {
    /// Create a tracker using the local calendar date
    pub fn new(threshold: u32, store: Box<dyn StateStore>) -> Self {
        Self::with_date_source(threshold, store, Box::new(|| Local::now().date_naive()))
    }

    /// Create a tracker with a custom notion of "today"
    ///
    /// The stored record is kept only if it belongs to today; anything else,
    /// including a store that fails to load, starts a fresh zeroed day.
    pub fn with_date_source(threshold: u32, store: Box<dyn StateStore>, today: DateSource) -> Self {
        let date = today();
        let loaded = match store.load() {
            Ok(state) => state,
            Err(e) => {
                warn!("Failed to load escalation state: {}", e);
                None
            }
        };

        let mut tracker = Self {
            threshold,
            state: EscalationState::fresh(date),
            level: PenaltyLevel::Normal,
            store,
            today,
        };

        match loaded {
            Some(state) if state.date == date => {
                info!(
                    "Loaded today's record: {} disallowed gestures",
                    state.disallowed_count
                );
                tracker.state = state;
                tracker.level = PenaltyLevel::from_count(tracker.state.disallowed_count, threshold);
            }
            Some(_) => {
                info!("New day, resetting disallowed gesture count");
                tracker.persist();
            }
            None => {
                info!("No escalation record, starting fresh");
                tracker.persist();
            }
        }

        tracker
    }

    /// Record one confirmed disallowed gesture
    pub fn record(&mut self, gesture: Gesture) -> RecordOutcome {
        self.roll_over();

        let previous = self.level;
        self.state.disallowed_count = self.state.disallowed_count.saturating_add(1);
        info!(
            "Disallowed gesture {} confirmed ({} today)",
            gesture, self.state.disallowed_count
        );

        if self.state.disallowed_count >= self.threshold && !self.state.face_mosaic_enabled {
            self.state.face_mosaic_enabled = true;
            warn!(
                "Disallowed gesture count reached {}, enabling face mosaic",
                self.threshold
            );
        }

        self.level = PenaltyLevel::from_count(self.state.disallowed_count, self.threshold);
        let level_changed = self.level != previous;
        if level_changed {
            warn!("Penalty level {} -> {}", previous, self.level);
        }

        self.state.last_update = Local::now();
        self.persist();

        RecordOutcome {
            level_changed,
            penalty_level: self.level,
            face_mosaic_enabled: self.state.face_mosaic_enabled,
        }
    }

    /// Clear today's counters and persist the zeroed record
    pub fn reset(&mut self) {
        info!("Resetting disallowed gesture count");
        self.state = EscalationState::fresh((self.today)());
        self.level = PenaltyLevel::Normal;
        self.persist();
    }

    /// Snapshot of today's counters
    pub fn statistics(&mut self) -> Statistics {
        self.roll_over();
        Statistics {
            date: self.state.date,
            disallowed_count: self.state.disallowed_count,
            face_mosaic_enabled: self.state.face_mosaic_enabled,
            remaining_warnings: self.threshold.saturating_sub(self.state.disallowed_count),
            penalty_level: self.level,
        }
    }

    pub fn penalty_level(&self) -> PenaltyLevel {
        self.level
    }

    pub fn face_mosaic_enabled(&self) -> bool {
        self.state.face_mosaic_enabled
    }

    pub fn disallowed_count(&self) -> u32 {
        self.state.disallowed_count
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn state(&self) -> &EscalationState {
        &self.state
    }

    pub fn store(&self) -> &dyn StateStore {
        self.store.as_ref()
    }

    /// Start a fresh day if the date moved on since the last update
    fn roll_over(&mut self) {
        let today = (self.today)();
        if today != self.state.date {
            info!(
                "Date changed from {} to {}, resetting disallowed gesture count",
                self.state.date, today
            );
            self.state = EscalationState::fresh(today);
            self.level = PenaltyLevel::Normal;
            self.persist();
        }
    }

    fn persist(&mut self) {
        if let Err(e) = self.store.save(&self.state) {
            warn!("Failed to save escalation state: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::guard::store::MemoryStore;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn fixed(d: u32) -> DateSource {
        Box::new(move || day(d))
    }

    #[test]
    fn test_level_boundaries() {
        assert_eq!(PenaltyLevel::from_count(0, 5), PenaltyLevel::Normal);
        assert_eq!(PenaltyLevel::from_count(4, 5), PenaltyLevel::Normal);
        assert_eq!(PenaltyLevel::from_count(5, 5), PenaltyLevel::HighWarning);
        assert_eq!(PenaltyLevel::from_count(9, 5), PenaltyLevel::HighWarning);
        assert_eq!(PenaltyLevel::from_count(10, 5), PenaltyLevel::Shutdown);
        assert_eq!(PenaltyLevel::from_count(u32::MAX, u32::MAX), PenaltyLevel::Shutdown);
    }

    #[test]
    fn test_level_monotone_in_count() {
        let mut prev = PenaltyLevel::Normal;
        for count in 0..30 {
            let level = PenaltyLevel::from_count(count, 5);
            assert!(level >= prev);
            prev = level;
        }
    }

    #[test]
    fn test_escalates_through_levels() {
        let mut tracker = EscalationTracker::with_date_source(5, Box::new(MemoryStore::new()), fixed(1));

        for _ in 0..4 {
            let out = tracker.record(Gesture::Bad);
            assert!(!out.level_changed);
            assert_eq!(out.penalty_level, PenaltyLevel::Normal);
            assert!(!out.face_mosaic_enabled);
        }

        let out = tracker.record(Gesture::Bad);
        assert!(out.level_changed);
        assert_eq!(out.penalty_level, PenaltyLevel::HighWarning);
        assert!(out.face_mosaic_enabled);

        for _ in 0..4 {
            assert!(!tracker.record(Gesture::No).level_changed);
        }

        let out = tracker.record(Gesture::No);
        assert!(out.level_changed);
        assert_eq!(out.penalty_level, PenaltyLevel::Shutdown);
        assert_eq!(tracker.disallowed_count(), 10);
    }

    #[test]
    fn test_every_record_is_saved() {
        let mut tracker = EscalationTracker::with_date_source(5, Box::new(MemoryStore::new()), fixed(1));
        tracker.record(Gesture::Ok);
        tracker.record(Gesture::Ok);

        let saved = tracker.store().load().unwrap().unwrap();
        assert_eq!(saved.disallowed_count, 2);
        assert_eq!(saved.date, day(1));
    }

    #[test]
    fn test_loads_todays_record() {
        let mut state = EscalationState::fresh(day(1));
        state.disallowed_count = 7;
        state.face_mosaic_enabled = true;

        let tracker =
            EscalationTracker::with_date_source(5, Box::new(MemoryStore::with_state(state)), fixed(1));
        assert_eq!(tracker.disallowed_count(), 7);
        assert!(tracker.face_mosaic_enabled());
        assert_eq!(tracker.penalty_level(), PenaltyLevel::HighWarning);
    }

    #[test]
    fn test_stale_record_is_reset_and_saved() {
        let mut state = EscalationState::fresh(day(1));
        state.disallowed_count = 7;
        state.face_mosaic_enabled = true;

        let tracker =
            EscalationTracker::with_date_source(5, Box::new(MemoryStore::with_state(state)), fixed(2));
        assert_eq!(tracker.disallowed_count(), 0);
        assert!(!tracker.face_mosaic_enabled());

        let saved = tracker.store().load().unwrap().unwrap();
        assert_eq!(saved.date, day(2));
        assert_eq!(saved.disallowed_count, 0);
    }

    #[test]
    fn test_rollover_while_running() {
        let current = Arc::new(AtomicU32::new(1));
        let source = Arc::clone(&current);
        let mut tracker = EscalationTracker::with_date_source(
            2,
            Box::new(MemoryStore::new()),
            Box::new(move || day(source.load(Ordering::SeqCst))),
        );

        tracker.record(Gesture::Bad);
        tracker.record(Gesture::Bad);
        assert!(tracker.face_mosaic_enabled());

        current.store(2, Ordering::SeqCst);
        let stats = tracker.statistics();
        assert_eq!(stats.date, day(2));
        assert_eq!(stats.disallowed_count, 0);
        assert!(!stats.face_mosaic_enabled);
        assert_eq!(stats.penalty_level, PenaltyLevel::Normal);

        let out = tracker.record(Gesture::Bad);
        assert_eq!(out.penalty_level, PenaltyLevel::Normal);
        assert_eq!(tracker.disallowed_count(), 1);
    }

    #[test]
    fn test_statistics_remaining_warnings() {
        let mut tracker = EscalationTracker::with_date_source(3, Box::new(MemoryStore::new()), fixed(1));
        assert_eq!(tracker.statistics().remaining_warnings, 3);
        for _ in 0..5 {
            tracker.record(Gesture::Bad);
        }
        let stats = tracker.statistics();
        assert_eq!(stats.remaining_warnings, 0);
        assert_eq!(stats.disallowed_count, 5);
    }

    #[test]
    fn test_reset() {
        let mut tracker = EscalationTracker::with_date_source(2, Box::new(MemoryStore::new()), fixed(1));
        for _ in 0..4 {
            tracker.record(Gesture::Bad);
        }
        assert_eq!(tracker.penalty_level(), PenaltyLevel::Shutdown);

        tracker.reset();
        assert_eq!(tracker.disallowed_count(), 0);
        assert_eq!(tracker.penalty_level(), PenaltyLevel::Normal);
        assert!(!tracker.face_mosaic_enabled());
        assert_eq!(tracker.store().load().unwrap().unwrap().disallowed_count, 0);
    }

    #[test]
    fn test_state_json_keys() {
        let state = EscalationState::fresh(day(5));
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["date"], "2024-03-05");
        assert_eq!(value["bad_gesture_count"], 0);
        assert_eq!(value["face_mosaic_enabled"], false);
        assert!(value["last_update"].is_string());
    }

    /// Store whose writes always fail
    struct ReadOnlyStore;

    impl StateStore for ReadOnlyStore {
        fn load(&self) -> Result<Option<EscalationState>, StoreError> {
            Ok(None)
        }

        fn save(&mut self, _state: &EscalationState) -> Result<(), StoreError> {
            Err(StoreError::Write {
                path: "read-only".to_string(),
                message: "permission denied".to_string(),
            })
        }
    }

    #[test]
    fn test_save_failure_keeps_counting() {
        let mut tracker = EscalationTracker::with_date_source(2, Box::new(ReadOnlyStore), fixed(1));

        let out = tracker.record(Gesture::Bad);
        assert!(!out.level_changed);
        assert_eq!(out.penalty_level, PenaltyLevel::Normal);

        let out = tracker.record(Gesture::Bad);
        assert!(out.level_changed);
        assert_eq!(out.penalty_level, PenaltyLevel::HighWarning);
        assert!(out.face_mosaic_enabled);
        assert_eq!(tracker.disallowed_count(), 2);

        tracker.reset();
        assert_eq!(tracker.disallowed_count(), 0);
    }

    #[test]
    fn test_count_saturates() {
        let mut state = EscalationState::fresh(day(1));
        state.disallowed_count = u32::MAX;

        let mut tracker =
            EscalationTracker::with_date_source(5, Box::new(MemoryStore::with_state(state)), fixed(1));
        let out = tracker.record(Gesture::Bad);
        assert_eq!(tracker.disallowed_count(), u32::MAX);
        assert_eq!(out.penalty_level, PenaltyLevel::Shutdown);
    }

    #[test]
    fn test_timestamp_without_offset() {
        let state: EscalationState = serde_json::from_str(
            r#"{"date": "2024-03-01", "bad_gesture_count": 7, "face_mosaic_enabled": true,
                "last_update": "2024-03-01T10:15:00.123456"}"#,
        )
        .unwrap();
        assert_eq!(state.disallowed_count, 7);
        assert_eq!(
            state.last_update.naive_local(),
            day(1).and_hms_micro_opt(10, 15, 0, 123456).unwrap()
        );
    }

    #[test]
    fn test_missing_fields_default() {
        let state: EscalationState = serde_json::from_str(r#"{"date": "2024-03-01"}"#).unwrap();
        assert_eq!(state.disallowed_count, 0);
        assert!(!state.face_mosaic_enabled);

        let state: EscalationState =
            serde_json::from_str(r#"{"date": "2024-03-01", "bad_gesture_count": 3, "last_update": "yesterday"}"#)
                .unwrap();
        assert_eq!(state.disallowed_count, 3);
    }
}
