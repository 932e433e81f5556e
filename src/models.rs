use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::InsightsError;

#[derive(Debug, Clone, Serialize)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: Uuid,
    pub group_id: Uuid,
    pub author_id: Uuid,
    pub like_count: u32,
    pub reply_count: u32,
    pub posted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Member {
    pub id: Uuid,
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub id: Uuid,
    pub group_id: Uuid,
    pub title: String,
    pub starts_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Poll {
    pub id: Uuid,
    pub group_id: Uuid,
    pub question: String,
}

/// Read-only view of one community as returned by the service layer.
#[derive(Debug, Clone, Serialize)]
pub struct GroupSnapshot {
    pub group: Group,
    pub posts: Vec<Post>,
    pub members: Vec<Member>,
    pub events: Vec<Event>,
    pub polls: Vec<Poll>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngagementBreakdown {
    pub posts: usize,
    pub comments: u64,
    pub likes: u64,
    pub events: usize,
    pub polls: usize,
    pub score: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthScore {
    pub engagement: u32,
    pub growth: u32,
    pub activity: u32,
    pub retention: u32,
    pub overall: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    pub date: NaiveDate,
    pub value: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cumulative: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GrowthSummary {
    pub total_growth: i64,
    pub growth_rate: f64,
    pub average_daily: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourlyActivity {
    pub hour: u32,
    pub activity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityProfile {
    pub hours: Vec<HourlyActivity>,
    pub peak_hour: u32,
    pub recently_active: u32,
}

/// Stage of the citizen journey used to tag content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Education,
    Career,
    Professional,
    Lifelong,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::Education,
        Phase::Career,
        Phase::Professional,
        Phase::Lifelong,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Education => "education",
            Phase::Career => "career",
            Phase::Professional => "professional",
            Phase::Lifelong => "lifelong",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = InsightsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Phase::ALL
            .into_iter()
            .find(|phase| phase.as_str() == normalized)
            .ok_or_else(|| InsightsError::UnknownPhase(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchDocument {
    pub id: String,
    pub title: String,
    pub description: String,
    pub phase: Phase,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub relevance_score: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    Active,
    Completed,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Active => "active",
            GoalStatus::Completed => "completed",
        }
    }
}

impl FromStr for GoalStatus {
    type Err = InsightsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(GoalStatus::Active),
            "completed" => Ok(GoalStatus::Completed),
            other => Err(InsightsError::InvalidRecord(format!(
                "unknown goal status '{other}'"
            ))),
        }
    }
}

/// A mentorship goal tracked for one mentor/mentee relationship.
#[derive(Debug, Clone, Serialize)]
pub struct Goal {
    pub id: Uuid,
    pub relationship_id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub progress: u32,
    pub status: GoalStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SuccessAnalytics {
    pub total_goals: usize,
    pub completed_goals: usize,
    pub completion_rate: u32,
    pub average_progress: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_parses_case_insensitively() {
        assert_eq!("Career".parse::<Phase>().unwrap(), Phase::Career);
        assert_eq!(" lifelong ".parse::<Phase>().unwrap(), Phase::Lifelong);
        assert!("retirement".parse::<Phase>().is_err());
    }

    #[test]
    fn time_series_point_serializes_iso_date() {
        let point = TimeSeriesPoint {
            date: NaiveDate::from_ymd_opt(2026, 3, 9).unwrap(),
            value: 4,
            cumulative: None,
        };
        let json = serde_json::to_string(&point).unwrap();
        assert_eq!(json, r#"{"date":"2026-03-09","value":4}"#);
    }

    #[test]
    fn goal_status_round_trips_through_str() {
        let status: GoalStatus = GoalStatus::Completed.as_str().parse().unwrap();
        assert_eq!(status, GoalStatus::Completed);
        assert!("paused".parse::<GoalStatus>().is_err());
    }
}
