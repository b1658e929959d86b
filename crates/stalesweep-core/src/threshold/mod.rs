/// Threshold resolution — turns an expiration criterion into one cutoff instant.
///
/// Every accepted way of saying "how old is too old" is a variant of
/// [`ExpirationCriterion`]. Loosely-typed input (CLI flags, config values) is
/// converted exactly once through [`CriterionSpec`]; the rest of the pipeline
/// only ever sees the resolved cutoff.
///
/// "Now" is always passed in. Nothing in this module reads the clock, so a
/// resolution is reproducible in tests.
pub mod filename_date;

pub use filename_date::DatePattern;

use crate::error::{Result, SweepError};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};
use std::fmt;

/// How the cutoff instant is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpirationCriterion {
    /// Files older than this exact instant.
    Before(DateTime<Utc>),
    /// Files older than `now - age`.
    OlderThan(TimeDelta),
    /// Files older than `reference - age`. The age is always subtracted.
    OlderThanRelativeTo {
        reference: DateTime<Utc>,
        age: TimeDelta,
    },
    /// Files older than `now - days * 24h`.
    Days(i64),
}

impl ExpirationCriterion {
    /// Resolve to the absolute cutoff. A file strictly older than the cutoff
    /// is expired.
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        match *self {
            Self::Before(instant) => Ok(instant),
            Self::OlderThan(age) => subtract(now, checked_age(age)?),
            Self::OlderThanRelativeTo { reference, age } => {
                subtract(reference, checked_age(age)?)
            }
            Self::Days(days) => subtract(now, days_to_age(days)?),
        }
    }
}

impl fmt::Display for ExpirationCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before(instant) => write!(f, "modified before {}", instant.to_rfc3339()),
            Self::OlderThan(age) => write!(f, "older than {}", describe_age(*age)),
            Self::OlderThanRelativeTo { reference, age } => write!(
                f,
                "older than {} before {}",
                describe_age(*age),
                reference.to_rfc3339()
            ),
            Self::Days(1) => write!(f, "older than 1 day"),
            Self::Days(days) => write!(f, "older than {days} days"),
        }
    }
}

fn checked_age(age: TimeDelta) -> Result<TimeDelta> {
    if age < TimeDelta::zero() {
        return Err(SweepError::InvalidCriterion(format!(
            "age must not be negative (got {age})"
        )));
    }
    Ok(age)
}

fn days_to_age(days: i64) -> Result<TimeDelta> {
    if days < 0 {
        return Err(SweepError::InvalidCriterion(format!(
            "day count must not be negative (got {days})"
        )));
    }
    TimeDelta::try_days(days).ok_or_else(|| {
        SweepError::InvalidCriterion(format!("{days} days is out of range"))
    })
}

fn subtract(from: DateTime<Utc>, age: TimeDelta) -> Result<DateTime<Utc>> {
    from.checked_sub_signed(age).ok_or_else(|| {
        SweepError::InvalidCriterion(format!(
            "cutoff {age} before {} is out of range",
            from.to_rfc3339()
        ))
    })
}

fn describe_age(age: TimeDelta) -> String {
    let secs = age.num_seconds();
    if secs != 0 && secs % 86_400 == 0 {
        format!("{} days", secs / 86_400)
    } else if secs != 0 && secs % 3_600 == 0 {
        format!("{} hours", secs / 3_600)
    } else {
        format!("{secs} seconds")
    }
}

/// Untyped threshold input as it arrives from a command line or config file.
///
/// Exactly one of `days`, `older_than` and `before` must be set.
/// `relative_to` anchors an age threshold to an explicit instant instead of
/// "now" and is only meaningful together with `days` or `older_than`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CriterionSpec {
    pub days: Option<i64>,
    pub older_than: Option<TimeDelta>,
    pub before: Option<DateTime<Utc>>,
    pub relative_to: Option<DateTime<Utc>>,
}

impl TryFrom<CriterionSpec> for ExpirationCriterion {
    type Error = SweepError;

    fn try_from(spec: CriterionSpec) -> Result<Self> {
        let given = [
            spec.days.is_some(),
            spec.older_than.is_some(),
            spec.before.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count();

        if given == 0 {
            return Err(SweepError::InvalidCriterion(
                "no threshold given: expected a day count, an age, or an absolute instant".into(),
            ));
        }
        if given > 1 {
            return Err(SweepError::InvalidCriterion(
                "only one of a day count, an age, or an absolute instant may be given".into(),
            ));
        }

        if let Some(before) = spec.before {
            if spec.relative_to.is_some() {
                return Err(SweepError::InvalidCriterion(
                    "a reference instant requires an age threshold, not an absolute one".into(),
                ));
            }
            return Ok(Self::Before(before));
        }

        let criterion = match (spec.days, spec.older_than, spec.relative_to) {
            (Some(days), None, None) => {
                days_to_age(days)?;
                Self::Days(days)
            }
            (Some(days), None, Some(reference)) => Self::OlderThanRelativeTo {
                reference,
                age: days_to_age(days)?,
            },
            (None, Some(age), None) => Self::OlderThan(checked_age(age)?),
            (None, Some(age), Some(reference)) => Self::OlderThanRelativeTo {
                reference,
                age: checked_age(age)?,
            },
            _ => unreachable!("exactly one threshold is set"),
        };
        Ok(criterion)
    }
}

/// Parse an instant from user input.
///
/// Accepts RFC 3339 (`2025-01-01T12:00:00Z`, `2025-01-01T12:00:00+09:00`),
/// a naive date-time (`2025-01-01T12:00:00` or with a space separator) and a
/// bare date (`2025-01-01`, midnight). Naive forms are read as local time.
pub fn parse_instant(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| {
            SweepError::InvalidCriterion(format!(
                "cannot parse {input:?} as a date or date-time"
            ))
        })?;

    local_to_utc(naive).ok_or_else(|| {
        SweepError::InvalidCriterion(format!("{input:?} does not exist in the local time zone"))
    })
}

/// Interpret a wall-clock reading in the local zone. On a DST fold the
/// earlier of the two instants wins.
pub(crate) fn local_to_utc(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn absolute_instant_is_its_own_cutoff() {
        let instant = at("2024-06-01T00:00:00Z");
        let now = at("2025-01-01T00:00:00Z");
        assert_eq!(
            ExpirationCriterion::Before(instant).resolve(now).unwrap(),
            instant
        );
    }

    #[test]
    fn age_is_subtracted_from_now() {
        let now = at("2025-01-11T00:00:00Z");
        let cutoff = ExpirationCriterion::OlderThan(TimeDelta::try_days(10).unwrap())
            .resolve(now)
            .unwrap();
        assert_eq!(cutoff, at("2025-01-01T00:00:00Z"));
    }

    #[test]
    fn days_match_equivalent_age() {
        let now = at("2025-03-15T08:30:00Z");
        let by_days = ExpirationCriterion::Days(5).resolve(now).unwrap();
        let by_age = ExpirationCriterion::OlderThan(TimeDelta::try_days(5).unwrap())
            .resolve(now)
            .unwrap();
        assert_eq!(by_days, by_age);
    }

    #[test]
    fn relative_criterion_ignores_now() {
        let reference = at("2020-01-10T00:00:00Z");
        let criterion = ExpirationCriterion::OlderThanRelativeTo {
            reference,
            age: TimeDelta::try_days(9).unwrap(),
        };
        let a = criterion.resolve(at("2025-01-01T00:00:00Z")).unwrap();
        let b = criterion.resolve(at("2030-01-01T00:00:00Z")).unwrap();
        assert_eq!(a, at("2020-01-01T00:00:00Z"));
        assert_eq!(a, b);
    }

    #[test]
    fn negative_values_are_rejected() {
        let now = Utc::now();
        assert!(matches!(
            ExpirationCriterion::Days(-1).resolve(now),
            Err(SweepError::InvalidCriterion(_))
        ));
        assert!(matches!(
            ExpirationCriterion::OlderThan(TimeDelta::try_seconds(-1).unwrap()).resolve(now),
            Err(SweepError::InvalidCriterion(_))
        ));
    }

    #[test]
    fn huge_day_count_is_out_of_range_not_a_panic() {
        let err = ExpirationCriterion::Days(i64::MAX).resolve(Utc::now());
        assert!(matches!(err, Err(SweepError::InvalidCriterion(_))));
    }

    #[test]
    fn zero_age_cutoff_is_now() {
        let now = at("2025-01-01T00:00:00Z");
        assert_eq!(ExpirationCriterion::Days(0).resolve(now).unwrap(), now);
    }

    #[test]
    fn spec_requires_exactly_one_threshold() {
        let none = ExpirationCriterion::try_from(CriterionSpec::default());
        assert!(matches!(none, Err(SweepError::InvalidCriterion(_))));

        let both = ExpirationCriterion::try_from(CriterionSpec {
            days: Some(3),
            before: Some(at("2025-01-01T00:00:00Z")),
            ..Default::default()
        });
        assert!(matches!(both, Err(SweepError::InvalidCriterion(_))));
    }

    #[test]
    fn spec_reference_needs_an_age() {
        let err = ExpirationCriterion::try_from(CriterionSpec {
            before: Some(at("2025-01-01T00:00:00Z")),
            relative_to: Some(at("2025-02-01T00:00:00Z")),
            ..Default::default()
        });
        assert!(matches!(err, Err(SweepError::InvalidCriterion(_))));

        let ok = ExpirationCriterion::try_from(CriterionSpec {
            days: Some(2),
            relative_to: Some(at("2025-02-01T00:00:00Z")),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            ok.resolve(Utc::now()).unwrap(),
            at("2025-01-30T00:00:00Z")
        );
    }

    #[test]
    fn spec_negative_days_fail_before_resolution() {
        let err = ExpirationCriterion::try_from(CriterionSpec {
            days: Some(-1),
            ..Default::default()
        });
        assert!(matches!(err, Err(SweepError::InvalidCriterion(_))));
    }

    #[test]
    fn parse_instant_accepts_rfc3339_with_offset() {
        let parsed = parse_instant("2025-01-01T09:00:00+09:00").unwrap();
        assert_eq!(parsed, at("2025-01-01T00:00:00Z"));
    }

    #[test]
    fn parse_instant_reads_bare_dates_as_local_midnight() {
        let parsed = parse_instant("2025-05-28").unwrap();
        let expected = Local
            .with_ymd_and_hms(2025, 5, 28, 0, 0, 0)
            .earliest()
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(parsed, expected);
    }

    #[test]
    fn parse_instant_rejects_garbage() {
        assert!(matches!(
            parse_instant("last tuesday"),
            Err(SweepError::InvalidCriterion(_))
        ));
    }

    #[test]
    fn display_reads_naturally() {
        assert_eq!(ExpirationCriterion::Days(30).to_string(), "older than 30 days");
        assert_eq!(
            ExpirationCriterion::OlderThan(TimeDelta::try_hours(36).unwrap()).to_string(),
            "older than 36 hours"
        );
    }
}
