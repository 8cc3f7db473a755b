//! Accumulates what a set of co-displayed widgets needs from upstream.
//!
//! Widgets declare their variables and day windows through [`WidgetNeeds`]
//! and [`RequirementSet::register`]. The set is built fresh per page visit,
//! consumed once by the request builder, then dropped.

use crate::{
    params::{self, Granularity, Source},
    window::{self, TimeWindow},
};

/// Insertion-ordered list of unique variable names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableList(Vec<String>);

impl VariableList {
    /// Append `name` unless already present.
    fn insert(&mut self, name: &str) {
        if !self.0.iter().any(|held| held == name) {
            self.0.push(name.to_owned());
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// A variable name that matched none of the parameter tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejected {
    pub granularity: Granularity,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
struct Capabilities {
    forecast: VariableList,
    historical: VariableList,
}

impl Capabilities {
    fn list(&self, source: Source) -> &VariableList {
        match source {
            Source::Forecast => &self.forecast,
            Source::Historical => &self.historical,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RequirementSet {
    current: VariableList,
    hourly: Capabilities,
    daily: Capabilities,
    hourly_window: Option<TimeWindow>,
    daily_window: Option<TimeWindow>,
}

impl RequirementSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `name` for `granularity`.
    ///
    /// Windowed variables go into every capability list whose table contains
    /// them. Returns `false` if no table knows the name; callers should treat
    /// that as a configuration mistake.
    pub fn add_variable(&mut self, granularity: Granularity, name: &str) -> bool {
        let caps = match granularity {
            Granularity::Current => {
                if !params::supports_current(name) {
                    tracing::warn!(name, "rejected unknown current variable");
                    return false;
                }
                self.current.insert(name);
                return true;
            }
            Granularity::Hourly => &mut self.hourly,
            Granularity::Daily => &mut self.daily,
        };

        let mut accepted = false;
        if params::supports(Source::Forecast, granularity, name) {
            caps.forecast.insert(name);
            accepted = true;
        }
        if params::supports(Source::Historical, granularity, name) {
            caps.historical.insert(name);
            accepted = true;
        }

        if !accepted {
            tracing::warn!(name, %granularity, "rejected unknown variable");
        }
        accepted
    }

    /// Bulk form of [`add_variable`](Self::add_variable); returns the names
    /// that were rejected, in input order.
    pub fn add_variables<'a, I>(&mut self, granularity: Granularity, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .filter(|name| !self.add_variable(granularity, name))
            .map(str::to_owned)
            .collect()
    }

    pub fn add_current(&mut self, name: &str) -> bool {
        self.add_variable(Granularity::Current, name)
    }

    pub fn add_hourly(&mut self, name: &str) -> bool {
        self.add_variable(Granularity::Hourly, name)
    }

    pub fn add_daily(&mut self, name: &str) -> bool {
        self.add_variable(Granularity::Daily, name)
    }

    /// Widen the hourly window to the convex hull of itself and `window`.
    pub fn add_hourly_window(&mut self, window: TimeWindow) {
        self.hourly_window = Some(window::widen(self.hourly_window, window));
    }

    /// Widen the daily window to the convex hull of itself and `window`.
    pub fn add_daily_window(&mut self, window: TimeWindow) {
        self.daily_window = Some(window::widen(self.daily_window, window));
    }

    /// Widen the window for `granularity`. Current conditions are always
    /// "now" and carry no window, so `Current` returns `false`.
    pub fn add_window(&mut self, granularity: Granularity, window: TimeWindow) -> bool {
        match granularity {
            Granularity::Current => false,
            Granularity::Hourly => {
                self.add_hourly_window(window);
                true
            }
            Granularity::Daily => {
                self.add_daily_window(window);
                true
            }
        }
    }

    /// Apply everything a widget declared. Returns every rejected variable.
    pub fn register(&mut self, needs: &WidgetNeeds) -> Vec<Rejected> {
        let mut rejected = Vec::new();
        for (granularity, names) in [
            (Granularity::Current, &needs.current),
            (Granularity::Hourly, &needs.hourly),
            (Granularity::Daily, &needs.daily),
        ] {
            rejected.extend(
                self.add_variables(granularity, names.iter().map(String::as_str))
                    .into_iter()
                    .map(|name| Rejected { granularity, name }),
            );
        }

        if let Some(window) = needs.hourly_window {
            self.add_hourly_window(window);
        }
        if let Some(window) = needs.daily_window {
            self.add_daily_window(window);
        }

        rejected
    }

    pub fn current_variables(&self) -> &[String] {
        self.current.as_slice()
    }

    /// Variables tracked for a windowed granularity and source.
    pub fn variables(&self, source: Source, granularity: Granularity) -> &[String] {
        match granularity {
            Granularity::Current => match source {
                Source::Forecast => self.current.as_slice(),
                Source::Historical => &[],
            },
            Granularity::Hourly => self.hourly.list(source).as_slice(),
            Granularity::Daily => self.daily.list(source).as_slice(),
        }
    }

    pub fn window(&self, granularity: Granularity) -> Option<TimeWindow> {
        match granularity {
            Granularity::Current => None,
            Granularity::Hourly => self.hourly_window,
            Granularity::Daily => self.daily_window,
        }
    }

    pub fn hourly_window(&self) -> Option<TimeWindow> {
        self.hourly_window
    }

    pub fn daily_window(&self) -> Option<TimeWindow> {
        self.daily_window
    }

    /// True when nothing would be requested.
    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
            && self.hourly.forecast.is_empty()
            && self.hourly.historical.is_empty()
            && self.daily.forecast.is_empty()
            && self.daily.historical.is_empty()
    }
}

/// What one presentation unit needs: variables per granularity plus windows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WidgetNeeds {
    pub current: Vec<String>,
    pub hourly: Vec<String>,
    pub daily: Vec<String>,
    pub hourly_window: Option<TimeWindow>,
    pub daily_window: Option<TimeWindow>,
}

impl WidgetNeeds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.current.extend(names.into_iter().map(str::to_owned));
        self
    }

    pub fn hourly<'a>(
        mut self,
        names: impl IntoIterator<Item = &'a str>,
        window: TimeWindow,
    ) -> Self {
        self.hourly.extend(names.into_iter().map(str::to_owned));
        self.hourly_window = Some(window::widen(self.hourly_window, window));
        self
    }

    pub fn daily<'a>(
        mut self,
        names: impl IntoIterator<Item = &'a str>,
        window: TimeWindow,
    ) -> Self {
        self.daily.extend(names.into_iter().map(str::to_owned));
        self.daily_window = Some(window::widen(self.daily_window, window));
        self
    }

    /// Current conditions plus today's min/max.
    pub fn current_conditions() -> Self {
        Self::new()
            .current(["temperature_2m", "weather_code", "apparent_temperature"])
            .daily(["temperature_2m_min", "temperature_2m_max"], TimeWindow::day(0))
    }

    /// Hour-by-hour strip for the reference day and the next.
    pub fn hourly_outlook() -> Self {
        Self::new().hourly(
            [
                "temperature_2m",
                "weather_code",
                "precipitation_probability",
                "precipitation",
            ],
            HOURLY_SPAN,
        )
    }

    /// Day list from three days before to ten days after the reference date.
    pub fn ten_day_outlook() -> Self {
        Self::new().daily(
            ["temperature_2m_mean", "weather_code", "precipitation_sum"],
            DAILY_SPAN,
        )
    }

    /// Side-by-side hourly comparison of two places/dates.
    pub fn hourly_comparison() -> Self {
        Self::new().hourly(["temperature_2m", "weather_code", "precipitation"], HOURLY_SPAN)
    }

    /// Side-by-side daily comparison of two places/dates.
    pub fn daily_comparison() -> Self {
        Self::ten_day_outlook()
    }
}

const HOURLY_SPAN: TimeWindow = TimeWindow::ordered(0, 1);
const DAILY_SPAN: TimeWindow = TimeWindow::ordered(-3, 10);
