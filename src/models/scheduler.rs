//! Three-grade spaced repetition scheduler.
//!
//! Each card carries an interval (days) and an ease factor:
//! - Hard: interval grows by a small fixed factor, ease drops
//! - Good: interval is multiplied by the ease, ease unchanged
//! - Easy: interval is multiplied by the ease and a bonus, ease rises
//! - Ease always stays within [min_ease, max_ease] and intervals never drop below one day
//!
//! Due dates are computed on the calendar of the zone `now` is expressed in, so
//! "two days from now" keeps the same wall-clock time across daylight saving
//! changes. Stored states always hold the instant in the local zone.

use super::{CardState, CardStats, DEFAULT_EASE_FACTOR, DEFAULT_INTERVAL};
use crate::error::{AlgorithmError, ConfigError, InvalidRating};
use chrono::{DateTime, Days, Duration, Local, TimeZone};
use serde::{Deserialize, Serialize};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;
/// Longest run of nonexistent wall-clock time searched past (a whole skipped day plus slack)
const MAX_GAP_HOURS: i64 = 48;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Rating {
    Hard = 1,
    Good = 2,
    Easy = 3,
}

impl Rating {
    pub const ALL: [Rating; 3] = [Rating::Hard, Rating::Good, Rating::Easy];

    pub fn label(self) -> &'static str {
        match self {
            Rating::Hard => "Hard",
            Rating::Good => "Good",
            Rating::Easy => "Easy",
        }
    }
}

impl TryFrom<u8> for Rating {
    type Error = InvalidRating;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Rating::Hard),
            2 => Ok(Rating::Good),
            3 => Ok(Rating::Easy),
            other => Err(InvalidRating(other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub min_ease: f64,
    pub max_ease: f64,
    pub hard_factor: f64,
    pub easy_bonus: f64,
    pub ease_change: f64,
    pub initial_ease: f64,
    pub initial_interval: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_ease: 1.3,
            max_ease: 3.0,
            hard_factor: 1.2,
            easy_bonus: 1.3,
            ease_change: 0.15,
            initial_ease: DEFAULT_EASE_FACTOR,
            initial_interval: DEFAULT_INTERVAL,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let values = [
            ("min_ease", self.min_ease),
            ("max_ease", self.max_ease),
            ("hard_factor", self.hard_factor),
            ("easy_bonus", self.easy_bonus),
            ("initial_ease", self.initial_ease),
        ];
        for (name, value) in values {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        if !self.ease_change.is_finite() || self.ease_change < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "ease_change must not be negative, got {}",
                self.ease_change
            )));
        }
        if self.min_ease > self.max_ease {
            return Err(ConfigError::Invalid(format!(
                "min_ease ({}) is greater than max_ease ({})",
                self.min_ease, self.max_ease
            )));
        }
        if self.initial_ease < self.min_ease || self.initial_ease > self.max_ease {
            return Err(ConfigError::Invalid(format!(
                "initial_ease ({}) is outside [{}, {}]",
                self.initial_ease, self.min_ease, self.max_ease
            )));
        }
        if self.initial_interval == 0 {
            return Err(ConfigError::Invalid(
                "initial_interval must be at least 1 day".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Calculates the state a card moves to after being rated.
    /// rating: 1 = hard, 2 = good, 3 = easy
    pub fn calculate_next_review<Tz: TimeZone>(
        &self,
        card_id: &str,
        rating: u8,
        current: Option<&CardState>,
        now: DateTime<Tz>,
    ) -> Result<CardState, AlgorithmError> {
        let rating = Rating::try_from(rating)?;
        self.schedule(card_id, rating, current, now)
    }

    pub fn schedule<Tz: TimeZone>(
        &self,
        card_id: &str,
        rating: Rating,
        current: Option<&CardState>,
        now: DateTime<Tz>,
    ) -> Result<CardState, AlgorithmError> {
        let cfg = &self.config;
        let (interval, ease, repetitions) = match current {
            Some(state) => (state.interval.max(1), state.ease_factor, state.repetitions),
            None => (cfg.initial_interval, cfg.initial_ease, 0),
        };

        if !ease.is_finite() {
            return Err(AlgorithmError::Internal(format!(
                "card {} has a non-finite ease factor",
                card_id
            )));
        }

        let interval = interval as f64;
        let (raw_interval, new_ease) = match rating {
            Rating::Hard => (interval * cfg.hard_factor, ease - cfg.ease_change),
            Rating::Good => (interval * ease, ease),
            Rating::Easy => (interval * ease * cfg.easy_bonus, ease + cfg.ease_change),
        };

        // `as` saturates, so absurd products stay representable and fail below
        let next_interval = (raw_interval.floor() as u32).max(1);
        let ease_factor = new_ease.clamp(cfg.min_ease, cfg.max_ease);
        let due_date = add_calendar_days(&now, next_interval)?.with_timezone(&Local);

        Ok(CardState {
            card_id: card_id.to_string(),
            due_date,
            interval: next_interval,
            ease_factor,
            repetitions: repetitions.saturating_add(1),
        })
    }
}

/// New cards (no stored state) are always due.
pub fn is_due(state: Option<&CardState>, now: DateTime<Local>) -> bool {
    match state {
        None => true,
        Some(state) => state.due_date <= now,
    }
}

pub fn get_stats(state: Option<&CardState>, now: DateTime<Local>) -> CardStats {
    let Some(state) = state else {
        return CardStats::new_card();
    };

    let remaining_ms = (state.due_date - now).num_milliseconds();
    // ceiling division for positive values; anything overdue reads as zero
    let days_until_review = if remaining_ms <= 0 {
        0
    } else {
        (remaining_ms + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
    };

    CardStats {
        is_new: false,
        days_until_review,
        total_reviews: state.repetitions,
    }
}

/// Moves `now` forward by whole calendar days in its own zone, keeping the wall-clock time.
///
/// A wall time that does not exist on the target day resolves to the first valid
/// hour after it; an ambiguous one resolves to its earlier instant.
fn add_calendar_days<Tz: TimeZone>(
    now: &DateTime<Tz>,
    days: u32,
) -> Result<DateTime<Tz>, AlgorithmError> {
    let out_of_range =
        || AlgorithmError::Internal(format!("due date {} days ahead is out of range", days));

    let date = now
        .date_naive()
        .checked_add_days(Days::new(u64::from(days)))
        .ok_or_else(out_of_range)?;
    let naive = date.and_time(now.time());
    let tz = now.timezone();

    for hours in 0..=MAX_GAP_HOURS {
        let Some(candidate) = naive.checked_add_signed(Duration::hours(hours)) else {
            break;
        };
        if let Some(due) = tz.from_local_datetime(&candidate).earliest() {
            return Ok(due);
        }
    }
    log::warn!("No valid local time found {} days ahead, using elapsed days", days);
    now.clone()
        .checked_add_signed(Duration::days(i64::from(days)))
        .ok_or_else(out_of_range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, LocalResult, NaiveDate, NaiveDateTime, Offset};
    use proptest::prelude::*;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap()
    }

    fn state(interval: u32, ease_factor: f64, repetitions: u32) -> CardState {
        CardState {
            card_id: "1".to_string(),
            due_date: now(),
            interval,
            ease_factor,
            repetitions,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    /// Zones with hardcoded transitions, so offset changes behave the same on every machine
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum TestZone {
        /// US Eastern in 2024: EDT from Mar 10 07:00 UTC until Nov 3 06:00 UTC, EST otherwise
        NewYork2024,
        /// Samoa at the end of 2011: UTC-10 until Dec 30 10:00 UTC, then UTC+14; Dec 30 never happens
        Apia2011,
    }

    #[derive(Clone, Copy, Debug)]
    struct TestOffset {
        zone: TestZone,
        fixed: FixedOffset,
    }

    impl Offset for TestOffset {
        fn fix(&self) -> FixedOffset {
            self.fixed
        }
    }

    impl std::fmt::Display for TestOffset {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.fixed)
        }
    }

    fn naive(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    impl TestZone {
        fn offsets(self) -> [i32; 2] {
            match self {
                TestZone::NewYork2024 => [-5 * 3600, -4 * 3600],
                TestZone::Apia2011 => [-10 * 3600, 14 * 3600],
            }
        }

        fn offset_at(self, at_utc: &NaiveDateTime) -> TestOffset {
            let hours = match self {
                TestZone::NewYork2024 => {
                    let edt = *at_utc >= naive(2024, 3, 10, 7, 0) && *at_utc < naive(2024, 11, 3, 6, 0);
                    if edt { -4 } else { -5 }
                }
                TestZone::Apia2011 => {
                    if *at_utc >= naive(2011, 12, 30, 10, 0) { 14 } else { -10 }
                }
            };
            TestOffset {
                zone: self,
                fixed: FixedOffset::east_opt(hours * 3600).unwrap(),
            }
        }
    }

    impl TimeZone for TestZone {
        type Offset = TestOffset;

        fn from_offset(offset: &TestOffset) -> Self {
            offset.zone
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<TestOffset> {
            self.offset_from_local_datetime(&local.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<TestOffset> {
            let mut matches: Vec<(NaiveDateTime, TestOffset)> = self
                .offsets()
                .iter()
                .filter_map(|&secs| {
                    let at_utc = *local - Duration::seconds(i64::from(secs));
                    let offset = self.offset_at(&at_utc);
                    (offset.fixed.local_minus_utc() == secs).then_some((at_utc, offset))
                })
                .collect();
            matches.sort_by_key(|(at_utc, _)| *at_utc);
            match matches.as_slice() {
                [] => LocalResult::None,
                [(_, only)] => LocalResult::Single(*only),
                [(_, earlier), (_, later)] => LocalResult::Ambiguous(*earlier, *later),
                _ => unreachable!("a zone with two offsets has at most two matches"),
            }
        }

        fn offset_from_utc_date(&self, at: &NaiveDate) -> TestOffset {
            self.offset_at(&at.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_utc_datetime(&self, at: &NaiveDateTime) -> TestOffset {
            self.offset_at(at)
        }
    }

    fn zoned(zone: TestZone, local: NaiveDateTime) -> DateTime<TestZone> {
        zone.from_local_datetime(&local).single().unwrap()
    }

    fn offset_hours(at: &DateTime<TestZone>) -> i32 {
        at.offset().fix().local_minus_utc() / 3600
    }

    #[test]
    fn test_good_across_spring_forward_keeps_wall_time() {
        let now = zoned(TestZone::NewYork2024, naive(2024, 3, 9, 9, 0));
        let next = Scheduler::default()
            .calculate_next_review("1", 2, None, now)
            .unwrap();
        let due = next.due_date.with_timezone(&TestZone::NewYork2024);

        assert_eq!(next.interval, 2);
        assert_eq!(due.naive_local(), naive(2024, 3, 11, 9, 0));
        assert_eq!(offset_hours(&due), -4);
        assert_eq!((due - now).num_hours(), 47);
    }

    #[test]
    fn test_good_across_fall_back_keeps_wall_time() {
        let now = zoned(TestZone::NewYork2024, naive(2024, 11, 2, 9, 0));
        let next = Scheduler::default()
            .calculate_next_review("1", 2, None, now)
            .unwrap();
        let due = next.due_date.with_timezone(&TestZone::NewYork2024);

        assert_eq!(due.naive_local(), naive(2024, 11, 4, 9, 0));
        assert_eq!(offset_hours(&due), -5);
        assert_eq!((due - now).num_hours(), 49);
    }

    #[test]
    fn test_due_in_skipped_hour_moves_past_gap() {
        let now = zoned(TestZone::NewYork2024, naive(2024, 3, 9, 2, 30));
        let next = Scheduler::default()
            .calculate_next_review("1", 1, None, now)
            .unwrap();
        let due = next.due_date.with_timezone(&TestZone::NewYork2024);

        assert_eq!(next.interval, 1);
        assert_eq!(due.naive_local(), naive(2024, 3, 10, 3, 30));
        assert_eq!(offset_hours(&due), -4);
        assert_eq!((due - now).num_hours(), 24);
    }

    #[test]
    fn test_due_in_repeated_hour_takes_earlier_instant() {
        let now = zoned(TestZone::NewYork2024, naive(2024, 11, 2, 1, 30));
        let next = Scheduler::default()
            .calculate_next_review("1", 1, None, now)
            .unwrap();
        let due = next.due_date.with_timezone(&TestZone::NewYork2024);

        assert_eq!(due.naive_local(), naive(2024, 11, 3, 1, 30));
        assert_eq!(offset_hours(&due), -4);
    }

    #[test]
    fn test_due_on_skipped_day_lands_on_next_valid_time() {
        let now = zoned(TestZone::Apia2011, naive(2011, 12, 29, 10, 0));
        let next = Scheduler::default()
            .calculate_next_review("1", 1, None, now)
            .unwrap();
        let due = next.due_date.with_timezone(&TestZone::Apia2011);

        assert_eq!(next.interval, 1);
        assert_eq!(due.naive_local(), naive(2011, 12, 31, 0, 0));
        assert_eq!(offset_hours(&due), 14);
        assert_eq!((due - now).num_hours(), 14);
    }

    #[test]
    fn test_good_on_fresh_card() {
        let scheduler = Scheduler::default();
        let next = scheduler
            .calculate_next_review("1", 2, Some(&state(1, 2.5, 0)), now())
            .unwrap();

        assert_eq!(next.interval, 2);
        assert!(close(next.ease_factor, 2.5));
        assert_eq!(next.repetitions, 1);
        assert_eq!(
            next.due_date.date_naive(),
            NaiveDate::from_ymd_opt(2024, 1, 12).unwrap()
        );
        assert_eq!(next.due_date.time(), now().time());
    }

    #[test]
    fn test_new_card_uses_defaults() {
        let scheduler = Scheduler::default();
        let implicit = scheduler.calculate_next_review("1", 2, None, now()).unwrap();
        let explicit = scheduler
            .calculate_next_review("1", 2, Some(&state(1, 2.5, 0)), now())
            .unwrap();

        assert_eq!(implicit, explicit);
    }

    #[test]
    fn test_hard_lowers_ease() {
        let scheduler = Scheduler::default();
        let next = scheduler
            .calculate_next_review("1", 1, Some(&state(10, 2.0, 3)), now())
            .unwrap();

        assert_eq!(next.interval, 12);
        assert!(close(next.ease_factor, 1.85));
        assert_eq!(next.repetitions, 4);
    }

    #[test]
    fn test_easy_raises_ease() {
        let scheduler = Scheduler::default();
        let next = scheduler
            .calculate_next_review("1", 3, Some(&state(4, 2.5, 2)), now())
            .unwrap();

        assert_eq!(next.interval, 13);
        assert!(close(next.ease_factor, 2.65));
    }

    #[test]
    fn test_ease_floor_and_ceiling() {
        let scheduler = Scheduler::default();

        let hard = scheduler
            .calculate_next_review("1", 1, Some(&state(1, 1.3, 1)), now())
            .unwrap();
        assert!(close(hard.ease_factor, 1.3));
        assert_eq!(hard.interval, 1);

        let easy = scheduler
            .calculate_next_review("1", 3, Some(&state(1, 3.0, 1)), now())
            .unwrap();
        assert!(close(easy.ease_factor, 3.0));
    }

    #[test]
    fn test_out_of_range_ratings_fail() {
        let scheduler = Scheduler::default();
        for rating in [0, 4] {
            let err = scheduler
                .calculate_next_review("1", rating, Some(&state(1, 2.5, 0)), now())
                .unwrap_err();
            assert_eq!(err, AlgorithmError::InvalidRating(InvalidRating(rating)));
        }
    }

    #[test]
    fn test_non_finite_ease_is_internal_error() {
        let scheduler = Scheduler::default();
        let err = scheduler
            .calculate_next_review("1", 2, Some(&state(1, f64::NAN, 0)), now())
            .unwrap_err();
        assert!(matches!(err, AlgorithmError::Internal(_)));
    }

    #[test]
    fn test_due_date_overflow_is_internal_error() {
        let scheduler = Scheduler::default();
        let err = scheduler
            .calculate_next_review("1", 3, Some(&state(u32::MAX, 3.0, 0)), now())
            .unwrap_err();
        assert!(matches!(err, AlgorithmError::Internal(_)));
    }

    #[test]
    fn test_is_due() {
        assert!(is_due(None, now()));

        let mut s = state(1, 2.5, 1);
        s.due_date = now() - Duration::seconds(1);
        assert!(is_due(Some(&s), now()));

        s.due_date = now() + Duration::days(1);
        assert!(!is_due(Some(&s), now()));
    }

    #[test]
    fn test_stats() {
        assert_eq!(get_stats(None, now()), CardStats::new_card());

        let mut s = state(3, 2.5, 5);
        s.due_date = now() + Duration::days(2) + Duration::hours(1);
        let stats = get_stats(Some(&s), now());
        assert_eq!(
            stats,
            CardStats {
                is_new: false,
                days_until_review: 3,
                total_reviews: 5,
            }
        );
        assert_eq!(get_stats(Some(&s), now()), stats);

        s.due_date = now() - Duration::days(4);
        assert_eq!(get_stats(Some(&s), now()).days_until_review, 0);
    }

    #[test]
    fn test_config_validation() {
        assert!(SchedulerConfig::default().validate().is_ok());

        let inverted = SchedulerConfig {
            min_ease: 3.0,
            max_ease: 1.3,
            ..SchedulerConfig::default()
        };
        assert!(Scheduler::new(inverted).is_err());

        let zero_interval = SchedulerConfig {
            initial_interval: 0,
            ..SchedulerConfig::default()
        };
        assert!(zero_interval.validate().is_err());
    }

    proptest! {
        #[test]
        fn prop_next_state_respects_invariants(
            rating in 1u8..=3,
            interval in 1u32..=3650,
            ease in 1.3f64..=3.0,
            repetitions in 0u32..10_000,
        ) {
            let scheduler = Scheduler::default();
            let current = state(interval, ease, repetitions);
            let next = scheduler
                .calculate_next_review("1", rating, Some(&current), now())
                .unwrap();

            prop_assert!(next.interval >= 1);
            prop_assert!(next.ease_factor >= 1.3 && next.ease_factor <= 3.0);
            prop_assert_eq!(next.repetitions, repetitions + 1);
            prop_assert!(next.due_date > now());
        }

        #[test]
        fn prop_rating_parse_matches_range(value in any::<u8>()) {
            prop_assert_eq!(Rating::try_from(value).is_ok(), (1..=3).contains(&value));
        }
    }
}
