use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{
    ActivityProfile, EngagementBreakdown, GroupSnapshot, GrowthSummary, HealthScore,
};
use crate::timeseries::TimeRange;

pub struct ReportInput<'a> {
    pub snapshot: &'a GroupSnapshot,
    pub generated_on: NaiveDate,
    pub health: HealthScore,
    pub engagement: EngagementBreakdown,
    pub recommendations: &'a [String],
    pub range: TimeRange,
    pub growth: GrowthSummary,
    pub activity: &'a ActivityProfile,
}

fn format_hour(hour: u32) -> String {
    format!("{hour:02}:00")
}

pub fn build_report(input: &ReportInput<'_>) -> String {
    let mut output = String::new();
    let group = &input.snapshot.group;

    let _ = writeln!(output, "# Community Health Report: {}", group.name);
    let _ = writeln!(output, "Generated on {}", input.generated_on);
    if !group.description.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "_{}_", group.description);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Health Score: {}/100", input.health.overall);
    let _ = writeln!(output, "- Engagement: {}", input.health.engagement);
    let _ = writeln!(output, "- Growth: {}", input.health.growth);
    let _ = writeln!(output, "- Activity: {}", input.health.activity);
    let _ = writeln!(output, "- Retention: {}", input.health.retention);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Engagement");
    let engagement = &input.engagement;
    let _ = writeln!(
        output,
        "Score {} from {} posts, {} comments, {} likes, {} events and {} polls.",
        engagement.score,
        engagement.posts,
        engagement.comments,
        engagement.likes,
        engagement.events,
        engagement.polls
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recommendations");
    for recommendation in input.recommendations {
        let _ = writeln!(output, "- {recommendation}");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Growth ({})", input.range);
    let _ = writeln!(
        output,
        "{:+} members ({:.1}% vs first day), {:.1} new members per day on average.",
        input.growth.total_growth, input.growth.growth_rate, input.growth.average_daily
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Member Activity");
    if input.snapshot.members.is_empty() {
        let _ = writeln!(output, "No members yet.");
    } else {
        let _ = writeln!(
            output,
            "Peak hour {} with {} members recently active out of {}.",
            format_hour(input.activity.peak_hour),
            input.activity.recently_active,
            input.snapshot.members.len()
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Upcoming Events");
    let mut events: Vec<_> = input
        .snapshot
        .events
        .iter()
        .filter(|event| event.starts_at.date_naive() >= input.generated_on)
        .collect();
    events.sort_by(|a, b| a.starts_at.cmp(&b.starts_at));
    if events.is_empty() {
        let _ = writeln!(output, "No events scheduled.");
    } else {
        for event in events.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} on {}",
                event.title,
                event.starts_at.date_naive()
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{self, ActivityCounts};
    use crate::mock::Scripted;
    use crate::models::{Event, Group, Member, Post};
    use crate::timeseries;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn snapshot(members: usize) -> GroupSnapshot {
        let group_id = Uuid::new_v4();
        GroupSnapshot {
            group: Group {
                id: group_id,
                name: "Heritage Keepers".to_string(),
                description: "Preserving Emirati crafts".to_string(),
            },
            posts: vec![Post {
                id: Uuid::new_v4(),
                group_id,
                author_id: Uuid::new_v4(),
                like_count: 3,
                reply_count: 2,
                posted_at: Utc::now(),
            }],
            members: (0..members)
                .map(|_| Member {
                    id: Uuid::new_v4(),
                    group_id,
                    user_id: Uuid::new_v4(),
                    joined_at: Utc::now() - Duration::days(10),
                })
                .collect(),
            events: vec![Event {
                id: Uuid::new_v4(),
                group_id,
                title: "Sadu weaving circle".to_string(),
                starts_at: Utc::now() + Duration::days(4),
            }],
            polls: Vec::new(),
        }
    }

    fn render(snapshot: &GroupSnapshot) -> String {
        let counts = ActivityCounts::from_snapshot(snapshot);
        let health = metrics::health_score(&counts, 0.5);
        let recommendations = metrics::recommendations(&health);
        let mut source = Scripted::constant(0.5);
        let today = Utc::now().date_naive();
        let series = timeseries::growth_series(TimeRange::Week, today, &mut source);
        let activity =
            timeseries::activity_profile(snapshot.members.len(), snapshot.posts.len(), &mut source);
        build_report(&ReportInput {
            snapshot,
            generated_on: today,
            health,
            engagement: metrics::engagement_breakdown(&counts),
            recommendations: &recommendations,
            range: TimeRange::Week,
            growth: timeseries::growth_summary(&series),
            activity: &activity,
        })
    }

    #[test]
    fn report_includes_every_section() {
        let report = render(&snapshot(50));
        assert!(report.starts_with("# Community Health Report: Heritage Keepers"));
        assert!(report.contains("## Health Score"));
        assert!(report.contains("Score 10 from 1 posts, 2 comments, 3 likes, 1 events"));
        assert!(report.contains("## Recommendations"));
        assert!(report.contains("## Growth (7d)"));
        assert!(report.contains("Peak hour 18:00 with 15 members recently active out of 50."));
        assert!(report.contains("- Sadu weaving circle on"));
    }

    #[test]
    fn past_events_are_not_listed_as_upcoming() {
        let mut past = snapshot(5);
        past.events.push(Event {
            id: Uuid::new_v4(),
            group_id: past.group.id,
            title: "Last month's majlis".to_string(),
            starts_at: Utc::now() - Duration::days(30),
        });
        let report = render(&past);
        assert!(report.contains("- Sadu weaving circle on"));
        assert!(!report.contains("Last month's majlis"));

        past.events.retain(|event| event.title != "Sadu weaving circle");
        let report = render(&past);
        assert!(report.contains("No events scheduled."));
    }

    #[test]
    fn empty_community_reports_no_members() {
        let report = render(&snapshot(0));
        assert!(report.contains("No members yet."));
        assert!(report.contains("- Retention: 0"));
    }
}
