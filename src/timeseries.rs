use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::InsightsError;
use crate::mock::MockDataSource;
use crate::models::{ActivityProfile, GrowthSummary, HourlyActivity, TimeSeriesPoint};

const WEEKEND_DAMPENING: f64 = 0.5;
const MAX_DAILY_GROWTH: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
    #[serde(rename = "1y")]
    Year,
}

impl TimeRange {
    pub fn days(&self) -> u32 {
        match self {
            TimeRange::Week => 7,
            TimeRange::Month => 30,
            TimeRange::Quarter => 90,
            TimeRange::Year => 365,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Week => "7d",
            TimeRange::Month => "30d",
            TimeRange::Quarter => "90d",
            TimeRange::Year => "1y",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = InsightsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "7d" => Ok(TimeRange::Week),
            "30d" => Ok(TimeRange::Month),
            "90d" => Ok(TimeRange::Quarter),
            "1y" => Ok(TimeRange::Year),
            other => Err(InsightsError::UnknownTimeRange(other.to_string())),
        }
    }
}

/// Synthetic membership growth ending on `today`, one point per day in
/// ascending date order.
pub fn growth_series(
    range: TimeRange,
    today: NaiveDate,
    source: &mut impl MockDataSource,
) -> Vec<TimeSeriesPoint> {
    let days = range.days();
    let mut cumulative = (source.sample() * 100.0 + 50.0).floor() as u32;
    let mut points = Vec::with_capacity(days as usize);

    for offset in (0..days).rev() {
        let date = today - Duration::days(i64::from(offset));
        let factor = if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            WEEKEND_DAMPENING
        } else {
            1.0
        };
        let new_members = (source.sample() * MAX_DAILY_GROWTH * factor).floor() as u32;
        cumulative += new_members;
        points.push(TimeSeriesPoint {
            date,
            value: new_members,
            cumulative: Some(cumulative),
        });
    }

    points
}

/// Growth relative to the first day's cumulative total.
pub fn growth_summary(series: &[TimeSeriesPoint]) -> GrowthSummary {
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return GrowthSummary {
            total_growth: 0,
            growth_rate: 0.0,
            average_daily: 0.0,
        };
    };

    let start = i64::from(first.cumulative.unwrap_or(first.value));
    let end = i64::from(last.cumulative.unwrap_or(last.value));
    let total_growth = end - start;
    let growth_rate = if start > 0 {
        total_growth as f64 / start as f64 * 100.0
    } else {
        0.0
    };
    let average_daily =
        series.iter().map(|p| f64::from(p.value)).sum::<f64>() / series.len() as f64;

    GrowthSummary {
        total_growth,
        growth_rate,
        average_daily,
    }
}

pub fn hour_multiplier(hour: u32) -> f64 {
    match hour {
        0..=5 => 0.2,
        9..=17 => 0.8,
        18..=21 => 1.2,
        _ => 0.6,
    }
}

/// Hour-of-day activity estimate for a community of `members` people.
pub fn activity_profile(
    members: usize,
    posts: usize,
    source: &mut impl MockDataSource,
) -> ActivityProfile {
    let base = members as f64 * 0.1;
    let mut hours = Vec::with_capacity(24);
    let mut peak_hour = 0;
    let mut peak_activity = 0;

    for hour in 0..24 {
        let jitter = 0.75 + source.sample() * 0.5;
        let activity = (base * hour_multiplier(hour) * jitter).round() as u32;
        if activity > peak_activity {
            peak_activity = activity;
            peak_hour = hour;
        }
        hours.push(HourlyActivity { hour, activity });
    }

    let recently_active = if posts > 0 {
        (members as f64 * 0.3).floor() as u32
    } else {
        0
    };

    ActivityProfile {
        hours,
        peak_hour,
        recently_active,
    }
}
