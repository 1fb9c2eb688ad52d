//! A signed time span split into per-unit components.

use serde::{Deserialize, Serialize};

use super::unit::{
    Unit, MICROSECONDS_IN_DAY, MICROSECONDS_IN_HOUR, MICROSECONDS_IN_MILLISECOND,
    MICROSECONDS_IN_MINUTE, MICROSECONDS_IN_MONTH, MICROSECONDS_IN_SECOND, MICROSECONDS_IN_WEEK,
    MICROSECONDS_IN_YEAR,
};

/// Direction of a time span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    #[default]
    Positive,
    Negative,
}

impl Sign {
    pub fn of(microseconds: i64) -> Self {
        if microseconds >= 0 {
            Sign::Positive
        } else {
            Sign::Negative
        }
    }

    pub fn as_i64(&self) -> i64 {
        match self {
            Sign::Positive => 1,
            Sign::Negative => -1,
        }
    }
}

/// A time span partitioned into units.
///
/// A component is `None` when the unit was not tracked (the template has no
/// placeholder for it, or a parsed string did not mention it). Absent
/// components contribute nothing to the totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeValue {
    sign: Sign,
    years: Option<i64>,
    months: Option<i64>,
    weeks: Option<i64>,
    days: Option<i64>,
    hours: Option<i64>,
    minutes: Option<i64>,
    seconds: Option<i64>,
    milliseconds: Option<i64>,
    microseconds: Option<i64>,
}

impl TimeValue {
    /// An empty, positive time value.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy with `unit` set to `value`.
    pub fn with(mut self, unit: Unit, value: i64) -> Self {
        self.set(unit, Some(value));
        self
    }

    /// Return a copy with the given sign.
    pub fn with_sign(mut self, sign: Sign) -> Self {
        self.sign = sign;
        self
    }

    pub fn get(&self, unit: Unit) -> Option<i64> {
        match unit {
            Unit::Year => self.years,
            Unit::Month => self.months,
            Unit::Week => self.weeks,
            Unit::Day => self.days,
            Unit::Hour => self.hours,
            Unit::Minute => self.minutes,
            Unit::Second => self.seconds,
            Unit::Millisecond => self.milliseconds,
            Unit::Microsecond => self.microseconds,
        }
    }

    pub(crate) fn set(&mut self, unit: Unit, value: Option<i64>) {
        let slot = match unit {
            Unit::Year => &mut self.years,
            Unit::Month => &mut self.months,
            Unit::Week => &mut self.weeks,
            Unit::Day => &mut self.days,
            Unit::Hour => &mut self.hours,
            Unit::Minute => &mut self.minutes,
            Unit::Second => &mut self.seconds,
            Unit::Millisecond => &mut self.milliseconds,
            Unit::Microsecond => &mut self.microseconds,
        };
        *slot = value;
    }

    pub(crate) fn set_sign(&mut self, sign: Sign) {
        self.sign = sign;
    }

    pub fn sign(&self) -> Sign {
        self.sign
    }

    pub fn years(&self) -> Option<i64> {
        self.years
    }

    pub fn months(&self) -> Option<i64> {
        self.months
    }

    pub fn weeks(&self) -> Option<i64> {
        self.weeks
    }

    pub fn days(&self) -> Option<i64> {
        self.days
    }

    pub fn hours(&self) -> Option<i64> {
        self.hours
    }

    pub fn minutes(&self) -> Option<i64> {
        self.minutes
    }

    pub fn seconds(&self) -> Option<i64> {
        self.seconds
    }

    pub fn milliseconds(&self) -> Option<i64> {
        self.milliseconds
    }

    pub fn microseconds(&self) -> Option<i64> {
        self.microseconds
    }

    /// Signed total of all present components, in microseconds.
    pub fn total_microseconds(&self) -> i128 {
        let magnitude: i128 = Unit::ALL
            .iter()
            .map(|unit| {
                i128::from(self.get(*unit).unwrap_or(0)) * i128::from(unit.microseconds())
            })
            .sum();
        magnitude * i128::from(self.sign.as_i64())
    }

    /// Signed total expressed in `unit`.
    pub fn total_in(&self, unit: Unit) -> f64 {
        self.total_microseconds() as f64 / unit.microseconds() as f64
    }

    pub fn total_milliseconds(&self) -> f64 {
        self.total_microseconds() as f64 / MICROSECONDS_IN_MILLISECOND as f64
    }

    pub fn total_seconds(&self) -> f64 {
        self.total_microseconds() as f64 / MICROSECONDS_IN_SECOND as f64
    }

    pub fn total_minutes(&self) -> f64 {
        self.total_microseconds() as f64 / MICROSECONDS_IN_MINUTE as f64
    }

    pub fn total_hours(&self) -> f64 {
        self.total_microseconds() as f64 / MICROSECONDS_IN_HOUR as f64
    }

    pub fn total_days(&self) -> f64 {
        self.total_microseconds() as f64 / MICROSECONDS_IN_DAY as f64
    }

    pub fn total_weeks(&self) -> f64 {
        self.total_microseconds() as f64 / MICROSECONDS_IN_WEEK as f64
    }

    pub fn total_months(&self) -> f64 {
        self.total_microseconds() as f64 / MICROSECONDS_IN_MONTH as f64
    }

    pub fn total_years(&self) -> f64 {
        self.total_microseconds() as f64 / MICROSECONDS_IN_YEAR as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_value_is_zero() {
        let value = TimeValue::new();
        assert_eq!(value.total_microseconds(), 0);
        assert_eq!(value.sign(), Sign::Positive);
        assert!(Unit::ALL.iter().all(|u| value.get(*u).is_none()));
    }

    #[test]
    fn test_total_microseconds() {
        let value = TimeValue::new()
            .with(Unit::Week, 1)
            .with(Unit::Day, 2)
            .with(Unit::Hour, 3);
        assert_eq!(
            value.total_microseconds(),
            i128::from(MICROSECONDS_IN_WEEK + 2 * MICROSECONDS_IN_DAY + 3 * MICROSECONDS_IN_HOUR)
        );
    }

    #[test]
    fn test_negative_sign_applies_to_total() {
        let value = TimeValue::new()
            .with(Unit::Hour, 1)
            .with(Unit::Minute, 30)
            .with_sign(Sign::Negative);
        assert_eq!(value.total_microseconds(), -5_400_000_000);
        assert_eq!(value.total_hours(), -1.5);
    }

    #[test]
    fn test_negative_component() {
        let value = TimeValue::new().with(Unit::Day, 1).with(Unit::Hour, -1);
        assert_eq!(value.total_hours(), 23.0);
    }

    #[test]
    fn test_total_in_units() {
        let value = TimeValue::new().with(Unit::Year, 1);
        assert_eq!(value.total_days(), 360.0);
        assert_eq!(value.total_months(), 12.0);
        assert_eq!(value.total_in(Unit::Year), 1.0);
        assert_eq!(value.total_seconds(), 31_104_000.0);
    }

    #[test]
    fn test_accessors() {
        let value = TimeValue::new().with(Unit::Millisecond, 7);
        assert_eq!(value.milliseconds(), Some(7));
        assert_eq!(value.seconds(), None);
        assert_eq!(value.get(Unit::Millisecond), Some(7));
    }

    #[test]
    fn test_serialization() {
        let value = TimeValue::new().with(Unit::Day, 2).with_sign(Sign::Negative);
        let json = serde_json::to_string(&value).unwrap();
        assert!(json.contains("\"sign\":\"negative\""));
        assert!(json.contains("\"days\":2"));

        let parsed: TimeValue = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, value);
    }
}
