/// Dates embedded in file names (`backup_20250528.tar`, `app-2025-05-28.log`).
///
/// A [`DatePattern`] is a small strftime-like template. Supported specifiers:
///
/// | code | meaning            | width |
/// |------|--------------------|-------|
/// | `%Y` | four-digit year    | 4     |
/// | `%y` | year in 2000–2099  | 2     |
/// | `%m` | month              | 2     |
/// | `%d` | day of month       | 2     |
/// | `%H` | hour (24h)         | 2     |
/// | `%M` | minute             | 2     |
/// | `%S` | second             | 2     |
/// | `%%` | literal `%`        | 1     |
///
/// Every field has a fixed width, so the template has a fixed width too and
/// matching is a left-to-right scan over windows of the file name. The first
/// window whose shape fits (literals equal, fields all ASCII digits) decides
/// the result. If that window holds an impossible date the name has no date;
/// later windows are not tried.
use crate::error::{Result, SweepError};
use crate::threshold::local_to_utc;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Year4,
    Year2,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl Field {
    fn width(self) -> usize {
        match self {
            Field::Year4 => 4,
            _ => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Literal(char),
    Field(Field),
}

/// A compiled file-name date template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DatePattern {
    source: String,
    tokens: Vec<Token>,
    width: usize,
}

/// Field values read from one window. Duplicated specifiers must agree.
#[derive(Default)]
struct Captured {
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
    hour: Option<u32>,
    minute: Option<u32>,
    second: Option<u32>,
}

impl Captured {
    fn set(&mut self, field: Field, value: u32) -> bool {
        let slot = match field {
            Field::Year4 | Field::Year2 => {
                let year = if field == Field::Year2 {
                    2000 + value as i32
                } else {
                    value as i32
                };
                return match self.year {
                    Some(existing) => existing == year,
                    None => {
                        self.year = Some(year);
                        true
                    }
                };
            }
            Field::Month => &mut self.month,
            Field::Day => &mut self.day,
            Field::Hour => &mut self.hour,
            Field::Minute => &mut self.minute,
            Field::Second => &mut self.second,
        };
        match *slot {
            Some(existing) => existing == value,
            None => {
                *slot = Some(value);
                true
            }
        }
    }

    fn to_instant(&self) -> Option<DateTime<Utc>> {
        let date = NaiveDate::from_ymd_opt(
            self.year?,
            self.month.unwrap_or(1),
            self.day.unwrap_or(1),
        )?;
        let naive = date.and_hms_opt(
            self.hour.unwrap_or(0),
            self.minute.unwrap_or(0),
            self.second.unwrap_or(0),
        )?;
        local_to_utc(naive)
    }
}

impl DatePattern {
    /// Compile a template. Fails on unknown specifiers, a trailing `%`, or a
    /// template without a year.
    pub fn new(pattern: &str) -> Result<Self> {
        let invalid = |reason: &str| SweepError::InvalidDatePattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        let mut tokens = Vec::new();
        let mut chars = pattern.chars();
        while let Some(c) = chars.next() {
            if c != '%' {
                tokens.push(Token::Literal(c));
                continue;
            }
            let token = match chars.next() {
                Some('Y') => Token::Field(Field::Year4),
                Some('y') => Token::Field(Field::Year2),
                Some('m') => Token::Field(Field::Month),
                Some('d') => Token::Field(Field::Day),
                Some('H') => Token::Field(Field::Hour),
                Some('M') => Token::Field(Field::Minute),
                Some('S') => Token::Field(Field::Second),
                Some('%') => Token::Literal('%'),
                Some(other) => return Err(invalid(&format!("unsupported specifier %{other}"))),
                None => return Err(invalid("pattern ends with a lone %")),
            };
            tokens.push(token);
        }

        let has_year = tokens
            .iter()
            .any(|t| matches!(t, Token::Field(Field::Year4 | Field::Year2)));
        if !has_year {
            return Err(invalid("pattern needs a year (%Y or %y)"));
        }

        let width = tokens
            .iter()
            .map(|t| match t {
                Token::Literal(_) => 1,
                Token::Field(f) => f.width(),
            })
            .sum();

        Ok(Self {
            source: pattern.to_string(),
            tokens,
            width,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Find the date in `name`, interpreted as local wall-clock time.
    pub fn extract(&self, name: &str) -> Option<DateTime<Utc>> {
        let chars: Vec<char> = name.chars().collect();
        if chars.len() < self.width {
            return None;
        }
        (0..=chars.len() - self.width)
            .find_map(|start| self.capture(&chars[start..start + self.width]))
            .and_then(|captured| captured.to_instant())
    }

    /// Match the template against one window. `None` means the shape did not fit.
    fn capture(&self, window: &[char]) -> Option<Captured> {
        let mut captured = Captured::default();
        let mut pos = 0;
        for token in &self.tokens {
            match *token {
                Token::Literal(c) => {
                    if window[pos] != c {
                        return None;
                    }
                    pos += 1;
                }
                Token::Field(field) => {
                    let digits = &window[pos..pos + field.width()];
                    if !digits.iter().all(char::is_ascii_digit) {
                        return None;
                    }
                    let value = digits
                        .iter()
                        .fold(0u32, |acc, d| acc * 10 + d.to_digit(10).unwrap_or(0));
                    if !captured.set(field, value) {
                        return None;
                    }
                    pos += field.width();
                }
            }
        }
        Some(captured)
    }
}

impl fmt::Display for DatePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl TryFrom<String> for DatePattern {
    type Error = SweepError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<DatePattern> for String {
    fn from(pattern: DatePattern) -> Self {
        pattern.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    fn local(y: i32, m: u32, d: u32, hh: u32, mm: u32, ss: u32) -> DateTime<Utc> {
        Local
            .with_ymd_and_hms(y, m, d, hh, mm, ss)
            .earliest()
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn compact_and_separated_dates() {
        let compact = DatePattern::new("%Y%m%d").unwrap();
        assert_eq!(
            compact.extract("file_20250528.txt"),
            Some(local(2025, 5, 28, 0, 0, 0))
        );

        let dashed = DatePattern::new("%Y-%m-%d").unwrap();
        assert_eq!(
            dashed.extract("file_2025-05-28.txt"),
            Some(local(2025, 5, 28, 0, 0, 0))
        );

        let underscored = DatePattern::new("%Y_%m_%d").unwrap();
        assert_eq!(
            underscored.extract("2025_05_28_file.log"),
            Some(local(2025, 5, 28, 0, 0, 0))
        );
    }

    #[test]
    fn names_without_a_date() {
        let compact = DatePattern::new("%Y%m%d").unwrap();
        assert_eq!(compact.extract("file.txt"), None);
        assert_eq!(compact.extract("log_2024-02-15.log"), None);

        let dashed = DatePattern::new("%Y-%m-%d").unwrap();
        assert_eq!(dashed.extract("nodate_file.log"), None);
    }

    #[test]
    fn impossible_dates_are_not_dates() {
        let compact = DatePattern::new("%Y%m%d").unwrap();
        assert_eq!(compact.extract("file_20252528.txt"), None);
        assert_eq!(compact.extract("file_20250230.txt"), None);

        let dashed = DatePattern::new("%Y-%m-%d").unwrap();
        assert_eq!(dashed.extract("file_2025-13-28.txt"), None);
    }

    #[test]
    fn time_fields_and_literals() {
        let pattern = DatePattern::new("log_%Y-%m-%d_%H:%M:%S.txt").unwrap();
        assert_eq!(
            pattern.extract("log_2025-05-28_14:30:45.txt"),
            Some(local(2025, 5, 28, 14, 30, 45))
        );

        let bracketed = DatePattern::new("[%Y](%m){%d}").unwrap();
        assert_eq!(
            bracketed.extract("[2025](05){28}"),
            Some(local(2025, 5, 28, 0, 0, 0))
        );
    }

    #[test]
    fn two_digit_years_are_this_century() {
        let pattern = DatePattern::new("%y%m%d").unwrap();
        assert_eq!(
            pattern.extract("snap-240101"),
            Some(local(2024, 1, 1, 0, 0, 0))
        );
    }

    #[test]
    fn repeated_fields_must_agree() {
        let pattern = DatePattern::new("%Y%m%d-%Y%m%d").unwrap();
        assert!(pattern.extract("20250101-20250101").is_some());
        assert_eq!(pattern.extract("20250101-20260101"), None);
    }

    #[test]
    fn invalid_templates_are_rejected() {
        for bad in ["invalid", "", "log.txt", "%m%d", "%Y%q", "%Y%"] {
            assert!(
                matches!(DatePattern::new(bad), Err(SweepError::InvalidDatePattern { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn non_ascii_names_do_not_panic() {
        let pattern = DatePattern::new("%Y%m%d").unwrap();
        assert_eq!(
            pattern.extract("ログ_20250528.txt"),
            Some(local(2025, 5, 28, 0, 0, 0))
        );
        assert_eq!(pattern.extract("日"), None);
    }

    #[test]
    fn serde_round_trips_through_the_template_string() {
        let pattern: DatePattern = serde_json::from_str("\"%Y-%m-%d\"").unwrap();
        assert_eq!(pattern.as_str(), "%Y-%m-%d");
        assert!(serde_json::from_str::<DatePattern>("\"nope\"").is_err());
    }
}
