//! `Countdown`: a compiled template bundled with its options and defaults.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use crate::format::{compile, CompiledFormat, TemplateError};
use crate::models::{
    Defaults, TimeValue, Unit, MICROSECONDS_IN_DAY, MICROSECONDS_IN_HOUR,
    MICROSECONDS_IN_MILLISECOND, MICROSECONDS_IN_MINUTE, MICROSECONDS_IN_SECOND,
    MICROSECONDS_IN_WEEK,
};
use crate::parse::{parse, ParseError};
use crate::render::{render, RenderError, RenderOptions};

/// Template used by [`Countdown::default_formatter`].
pub const DEFAULT_TEMPLATE: &str = "{w}{wd}{d}{dd}{h}{hd}{m}{md}{S}{Sd}";

/// Formats time spans with one template. Cheap to clone and safe to share.
#[derive(Debug, Clone)]
pub struct Countdown {
    compiled: CompiledFormat,
    options: RenderOptions,
    defaults: Defaults,
}

impl Countdown {
    /// Compile `template` with default options and no extra defaults.
    pub fn new(template: &str) -> Result<Self, TemplateError> {
        Ok(Self {
            compiled: compile(template)?,
            options: RenderOptions::default(),
            defaults: Defaults::new(),
        })
    }

    /// `"1w 2d 3h 4m 5s"` style output.
    pub fn default_formatter() -> Self {
        Self {
            compiled: compile(DEFAULT_TEMPLATE).expect("default template is valid"),
            options: RenderOptions::default(),
            defaults: Defaults::new()
                .with_literal("wd", "w ")
                .with_literal("dd", "d ")
                .with_literal("hd", "h ")
                .with_literal("md", "m ")
                .with_literal("Sd", "s "),
        }
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_defaults(mut self, defaults: Defaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn compiled(&self) -> &CompiledFormat {
        &self.compiled
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    /// Render a span given in whole microseconds.
    pub fn format(&self, microseconds: i64) -> Result<String, RenderError> {
        render(&self.compiled, microseconds, &self.options, &self.defaults)
    }

    /// Scale a possibly fractional quantity to microseconds, truncating once.
    fn format_scaled(&self, quantity: f64, scale: i64) -> Result<String, RenderError> {
        let microseconds = quantity * scale as f64;
        if !microseconds.is_finite() || microseconds.abs() >= i64::MAX as f64 {
            return Err(RenderError::OutOfRange(format!("{} microseconds", microseconds)));
        }
        self.format(microseconds as i64)
    }

    pub fn format_microseconds(&self, microseconds: f64) -> Result<String, RenderError> {
        self.format_scaled(microseconds, 1)
    }

    pub fn format_milliseconds(&self, milliseconds: f64) -> Result<String, RenderError> {
        self.format_scaled(milliseconds, MICROSECONDS_IN_MILLISECOND)
    }

    pub fn format_seconds(&self, seconds: f64) -> Result<String, RenderError> {
        self.format_scaled(seconds, MICROSECONDS_IN_SECOND)
    }

    pub fn format_minutes(&self, minutes: f64) -> Result<String, RenderError> {
        self.format_scaled(minutes, MICROSECONDS_IN_MINUTE)
    }

    pub fn format_hours(&self, hours: f64) -> Result<String, RenderError> {
        self.format_scaled(hours, MICROSECONDS_IN_HOUR)
    }

    pub fn format_days(&self, days: f64) -> Result<String, RenderError> {
        self.format_scaled(days, MICROSECONDS_IN_DAY)
    }

    pub fn format_weeks(&self, weeks: f64) -> Result<String, RenderError> {
        self.format_scaled(weeks, MICROSECONDS_IN_WEEK)
    }

    /// Render the total of a value built from individual components.
    pub fn format_time(&self, value: &TimeValue) -> Result<String, RenderError> {
        let total = value.total_microseconds();
        let microseconds = i64::try_from(total)
            .map_err(|_| RenderError::OutOfRange(format!("{} microseconds", total)))?;
        self.format(microseconds)
    }

    /// Render the sum of possibly fractional, possibly negative components,
    /// e.g. `[(Unit::Week, 1.5), (Unit::Hour, -2.0)]`. Summed in microseconds
    /// and truncated once.
    pub fn format_components(&self, components: &[(Unit, f64)]) -> Result<String, RenderError> {
        let microseconds: f64 = components
            .iter()
            .map(|(unit, quantity)| quantity * unit.microseconds() as f64)
            .sum();
        self.format_scaled(microseconds, 1)
    }

    pub fn format_std_duration(&self, duration: std::time::Duration) -> Result<String, RenderError> {
        let microseconds = i64::try_from(duration.as_micros())
            .map_err(|_| RenderError::OutOfRange(format!("{:?}", duration)))?;
        self.format(microseconds)
    }

    pub fn format_timedelta(&self, delta: TimeDelta) -> Result<String, RenderError> {
        let microseconds = delta
            .num_microseconds()
            .ok_or_else(|| RenderError::OutOfRange(delta.to_string()))?;
        self.format(microseconds)
    }

    /// Render `end - start`; negative when `end` is earlier.
    pub fn format_datetime<Tz: TimeZone>(
        &self,
        start: &DateTime<Tz>,
        end: &DateTime<Tz>,
    ) -> Result<String, RenderError> {
        self.format_timedelta(end.clone().signed_duration_since(start.clone()))
    }

    /// Time remaining until `target`; negative once it has passed.
    pub fn format_until<Tz: TimeZone>(&self, target: &DateTime<Tz>) -> Result<String, RenderError> {
        let now = Utc::now().with_timezone(&target.timezone());
        self.format_datetime(&now, target)
    }

    /// Parse text produced by this countdown.
    pub fn parse(&self, text: &str) -> Result<TimeValue, ParseError> {
        parse(&self.compiled, text, &self.options, &self.defaults)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    const TEMPLATE: &str = "T{z}{wL.w}{p.w}{wR.w}{w}{wL}{p}{wR}{d}{dL}{P}{dR}{h}{hL}{ep}{hR}\
                            {m}{mL}{eP}{mR}{S}{SL}{Ep}{SR}{s}{sL}{EP}{sR}{u}";

    fn countdown() -> Countdown {
        let defaults = Defaults::new()
            .with_literal("wL", "w[")
            .with_literal("wR", "] ")
            .with_literal("dL", "d[")
            .with_literal("dR", "] ")
            .with_literal("hL", "h[")
            .with_literal("hR", "] ")
            .with_literal("mL", "m[")
            .with_literal("mR", "] ")
            .with_literal("SL", "s[")
            .with_literal("SR", "] ")
            .with_literal("sL", "ms[")
            .with_literal("sR", "] ");
        Countdown::new(TEMPLATE).unwrap().with_defaults(defaults)
    }

    fn utc(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn test_format_integer_microseconds() {
        assert_eq!(
            countdown().format(123_456_792_123_456_789).unwrap(),
            "T+w[s] 204128w[s] 2d[S] 1h[] 22m[eS] 3s[Es] 456ms[ES] 789"
        );
        assert_eq!(
            countdown().format_microseconds(9_876_543_210.0).unwrap(),
            "T+2h[es] 44m[eS] 36s[Es] 543ms[ES] 210"
        );
    }

    #[test]
    fn test_format_datetime() {
        let start = utc(2022, 12, 1);
        let end = utc(2023, 1, 15);
        assert_eq!(
            countdown().format_datetime(&start, &end).unwrap(),
            "T+w[s] 6w[s] 3d[S]"
        );
        assert_eq!(
            countdown().format_datetime(&end, &start).unwrap(),
            "T-w[s] 6w[s] 3d[S]"
        );
    }

    #[test]
    fn test_format_fractional_inputs() {
        let c = countdown();
        assert_eq!(
            c.format_weeks(1.56671).unwrap(),
            "T+w[] 1w[] 3d[S] 23h[es] 12m[eS] 26s[Es] 208ms[ES]"
        );
        assert_eq!(c.format_days(-1.0).unwrap(), "T-1d[]");
        assert_eq!(
            c.format_hours(241.77).unwrap(),
            "T+w[] 1w[] 3d[S] 1h[] 46m[eS] 12s[Es]"
        );
        assert_eq!(
            c.format_minutes(71.49999001).unwrap(),
            "T+1h[] 11m[eS] 29s[Es] 999ms[ES] 400"
        );
        assert_eq!(c.format_seconds(86400.0001).unwrap(), "T+1d[] 100");
        assert_eq!(
            c.format_milliseconds(-86400.0001).unwrap(),
            "T-1m[] 26s[Es] 400ms[ES]"
        );
    }

    #[test]
    fn test_format_out_of_range() {
        assert!(matches!(
            countdown().format_weeks(f64::INFINITY),
            Err(RenderError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_format_time_components() {
        let value = TimeValue::new()
            .with(Unit::Week, 1)
            .with(Unit::Day, 2)
            .with(Unit::Hour, -1)
            .with(Unit::Minute, 1)
            .with(Unit::Second, 1)
            .with(Unit::Millisecond, 1)
            .with(Unit::Microsecond, 1);
        let expected = "T+w[] 1w[] 1d[] 23h[es] 1m[] 1s[] 1ms[] 1";

        assert_eq!(countdown().format_time(&value).unwrap(), expected);

        let delta = TimeDelta::weeks(1) + TimeDelta::days(2) - TimeDelta::hours(1)
            + TimeDelta::minutes(1)
            + TimeDelta::seconds(1)
            + TimeDelta::milliseconds(1)
            + TimeDelta::microseconds(1);
        assert_eq!(countdown().format_timedelta(delta).unwrap(), expected);
    }

    #[test]
    fn test_format_fractional_components() {
        let c = countdown();
        let components = [
            (Unit::Week, 1.0),
            (Unit::Day, 2.5),
            (Unit::Hour, -1.0),
            (Unit::Minute, 0.5),
        ];
        assert_eq!(
            c.format_components(&components).unwrap(),
            "T+w[] 1w[] 2d[S] 11h[es] 30s[Es]"
        );
        assert_eq!(
            c.format_components(&[(Unit::Day, -0.5)]).unwrap(),
            "T-12h[es]"
        );
        assert!(matches!(
            c.format_components(&[(Unit::Year, f64::NAN)]),
            Err(RenderError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_format_std_duration() {
        let c = Countdown::default_formatter();
        let duration = std::time::Duration::from_secs(90_061);
        assert_eq!(c.format_std_duration(duration).unwrap(), "1d 1h 1m 1s");
    }

    #[test]
    fn test_default_formatter() {
        let c = Countdown::default_formatter();
        assert_eq!(c.format_seconds(694_861.0).unwrap(), "1w 1d 1h 1m 1s");
        assert_eq!(c.format_seconds(59.0).unwrap(), "59s");
    }

    #[test]
    fn test_format_until_past_target_is_negative() {
        let c = Countdown::new("{z}{d}d").unwrap();
        let out = c.format_until(&utc(2000, 1, 1)).unwrap();
        assert!(out.starts_with('-'), "got '{}'", out);
    }

    #[test]
    fn test_parse_round_trip() {
        let c = countdown();
        let rendered = c.format(123_456_792_123_456_789).unwrap();
        let value = c.parse(&rendered).unwrap();
        assert_eq!(value.total_microseconds(), 123_456_792_123_456_789);
    }

    #[test]
    fn test_countdown_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Countdown>();
    }
}
