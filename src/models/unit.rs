//! Unit table: base unit symbols, their sizes in microseconds, and the plural
//! decorator symbols.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const MICROSECONDS_IN_MILLISECOND: i64 = 1_000;
pub const MICROSECONDS_IN_SECOND: i64 = 1_000_000;
pub const MICROSECONDS_IN_MINUTE: i64 = MICROSECONDS_IN_SECOND * 60;
pub const MICROSECONDS_IN_HOUR: i64 = MICROSECONDS_IN_MINUTE * 60;
pub const MICROSECONDS_IN_DAY: i64 = MICROSECONDS_IN_HOUR * 24;
pub const MICROSECONDS_IN_WEEK: i64 = MICROSECONDS_IN_DAY * 7;
/// Months are a fixed 30 days.
pub const MICROSECONDS_IN_MONTH: i64 = MICROSECONDS_IN_DAY * 30;
/// Years are a fixed 12 months (360 days).
pub const MICROSECONDS_IN_YEAR: i64 = MICROSECONDS_IN_MONTH * 12;

/// Template symbol of the sign flag.
pub const SIGN_SYMBOL: &str = "z";

/// A unit of time a template can display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Year,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
    Microsecond,
}

impl Unit {
    /// Every unit, coarsest first.
    pub const ALL: [Unit; 9] = [
        Unit::Year,
        Unit::Month,
        Unit::Week,
        Unit::Day,
        Unit::Hour,
        Unit::Minute,
        Unit::Second,
        Unit::Millisecond,
        Unit::Microsecond,
    ];

    /// The placeholder symbol used in templates.
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Year => "y",
            Unit::Month => "M",
            Unit::Week => "w",
            Unit::Day => "d",
            Unit::Hour => "h",
            Unit::Minute => "m",
            Unit::Second => "S",
            Unit::Millisecond => "s",
            Unit::Microsecond => "u",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Unit::ALL.into_iter().find(|unit| unit.symbol() == symbol)
    }

    /// Size of one of this unit in microseconds.
    pub fn microseconds(&self) -> i64 {
        match self {
            Unit::Year => MICROSECONDS_IN_YEAR,
            Unit::Month => MICROSECONDS_IN_MONTH,
            Unit::Week => MICROSECONDS_IN_WEEK,
            Unit::Day => MICROSECONDS_IN_DAY,
            Unit::Hour => MICROSECONDS_IN_HOUR,
            Unit::Minute => MICROSECONDS_IN_MINUTE,
            Unit::Second => MICROSECONDS_IN_SECOND,
            Unit::Millisecond => MICROSECONDS_IN_MILLISECOND,
            Unit::Microsecond => 1,
        }
    }

    /// Plural English name, e.g. "hours".
    pub fn name(&self) -> &'static str {
        match self {
            Unit::Year => "years",
            Unit::Month => "months",
            Unit::Week => "weeks",
            Unit::Day => "days",
            Unit::Hour => "hours",
            Unit::Minute => "minutes",
            Unit::Second => "seconds",
            Unit::Millisecond => "milliseconds",
            Unit::Microsecond => "microseconds",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A placeholder that may open a flag: either the sign or a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseFlag {
    Sign,
    Unit(Unit),
}

impl BaseFlag {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        if symbol == SIGN_SYMBOL {
            return Some(BaseFlag::Sign);
        }
        Unit::from_symbol(symbol).map(BaseFlag::Unit)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BaseFlag::Sign => SIGN_SYMBOL,
            BaseFlag::Unit(unit) => unit.symbol(),
        }
    }

    pub fn unit(&self) -> Option<Unit> {
        match self {
            BaseFlag::Sign => None,
            BaseFlag::Unit(unit) => Some(*unit),
        }
    }
}

impl fmt::Display for BaseFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A plural decorator. Renders its suffix when the parent value is not ±1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PluralFlag {
    /// `p` -> "s"
    Lower,
    /// `P` -> "S"
    Upper,
    /// `ep` -> "es"
    LowerE,
    /// `eP` -> "eS"
    LowerEUpper,
    /// `Ep` -> "Es"
    UpperELower,
    /// `EP` -> "ES"
    UpperE,
}

impl PluralFlag {
    pub const ALL: [PluralFlag; 6] = [
        PluralFlag::Lower,
        PluralFlag::Upper,
        PluralFlag::LowerE,
        PluralFlag::LowerEUpper,
        PluralFlag::UpperELower,
        PluralFlag::UpperE,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            PluralFlag::Lower => "p",
            PluralFlag::Upper => "P",
            PluralFlag::LowerE => "ep",
            PluralFlag::LowerEUpper => "eP",
            PluralFlag::UpperELower => "Ep",
            PluralFlag::UpperE => "EP",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        PluralFlag::ALL.into_iter().find(|p| p.symbol() == symbol)
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            PluralFlag::Lower => "s",
            PluralFlag::Upper => "S",
            PluralFlag::LowerE => "es",
            PluralFlag::LowerEUpper => "eS",
            PluralFlag::UpperELower => "Es",
            PluralFlag::UpperE => "ES",
        }
    }

    /// Text to render for a parent value.
    pub fn resolve(&self, value: i64) -> &'static str {
        if value == 1 || value == -1 {
            ""
        } else {
            self.suffix()
        }
    }
}

impl fmt::Display for PluralFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
