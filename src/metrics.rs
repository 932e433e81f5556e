use crate::models::{
    EngagementBreakdown, Goal, GoalStatus, GroupSnapshot, HealthScore, SuccessAnalytics,
};

const ENGAGEMENT_POST_WEIGHT: f64 = 2.0;
const ENGAGEMENT_COMMENT_WEIGHT: f64 = 1.5;
const ENGAGEMENT_LIKE_WEIGHT: f64 = 0.5;
const ENGAGEMENT_EVENT_WEIGHT: f64 = 3.0;
const ENGAGEMENT_POLL_WEIGHT: f64 = 2.0;

const W_ENGAGEMENT: f64 = 0.3;
const W_GROWTH: f64 = 0.25;
const W_ACTIVITY: f64 = 0.25;
const W_RETENTION: f64 = 0.2;

const MAX_FACTOR: u32 = 100;

/// Raw activity counts a community snapshot reduces to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityCounts {
    pub posts: usize,
    pub comments: u64,
    pub likes: u64,
    pub events: usize,
    pub polls: usize,
    pub members: usize,
}

impl ActivityCounts {
    pub fn from_snapshot(snapshot: &GroupSnapshot) -> Self {
        Self {
            posts: snapshot.posts.len(),
            comments: snapshot.posts.iter().map(|p| u64::from(p.reply_count)).sum(),
            likes: snapshot.posts.iter().map(|p| u64::from(p.like_count)).sum(),
            events: snapshot.events.len(),
            polls: snapshot.polls.len(),
            members: snapshot.members.len(),
        }
    }
}

pub fn engagement_score(counts: &ActivityCounts) -> u64 {
    let raw = counts.posts as f64 * ENGAGEMENT_POST_WEIGHT
        + counts.comments as f64 * ENGAGEMENT_COMMENT_WEIGHT
        + counts.likes as f64 * ENGAGEMENT_LIKE_WEIGHT
        + counts.events as f64 * ENGAGEMENT_EVENT_WEIGHT
        + counts.polls as f64 * ENGAGEMENT_POLL_WEIGHT;
    raw.round() as u64
}

pub fn engagement_breakdown(counts: &ActivityCounts) -> EngagementBreakdown {
    EngagementBreakdown {
        posts: counts.posts,
        comments: counts.comments,
        likes: counts.likes,
        events: counts.events,
        polls: counts.polls,
        score: engagement_score(counts),
    }
}

fn capped(raw: f64) -> u32 {
    raw.round().clamp(0.0, f64::from(MAX_FACTOR)) as u32
}

/// Four-factor community health. `retention_sample` is a draw in `[0, 1)`
/// and only counts when the community has members.
pub fn health_score(counts: &ActivityCounts, retention_sample: f64) -> HealthScore {
    let posts = counts.posts as f64;
    let likes = counts.likes as f64;
    let comments = counts.comments as f64;

    let engagement = capped(posts * 5.0 + likes * 2.0 + comments * 3.0);
    let growth = capped(counts.members as f64 / 10.0 * 10.0);
    let activity =
        capped(posts * 10.0 + counts.events as f64 * 15.0 + counts.polls as f64 * 12.0);
    let retention = if counts.members > 0 {
        capped(75.0 + retention_sample.clamp(0.0, 1.0) * 25.0)
    } else {
        0
    };

    let overall = capped(
        f64::from(engagement) * W_ENGAGEMENT
            + f64::from(growth) * W_GROWTH
            + f64::from(activity) * W_ACTIVITY
            + f64::from(retention) * W_RETENTION,
    );

    HealthScore {
        engagement,
        growth,
        activity,
        retention,
        overall,
    }
}

pub fn recommendations(score: &HealthScore) -> Vec<String> {
    let rules: [(bool, &str); 4] = [
        (
            score.engagement < 60,
            "Encourage more discussions by posting questions and replying to members",
        ),
        (
            score.growth < 50,
            "Invite colleagues and share the community on your profile to grow membership",
        ),
        (
            score.activity < 50,
            "Schedule events or start polls to keep the community active",
        ),
        (
            score.retention < 80,
            "Reach out to quiet members with welcome messages and mentorship offers",
        ),
    ];

    let messages: Vec<String> = rules
        .iter()
        .filter(|(fires, _)| *fires)
        .map(|(_, message)| message.to_string())
        .collect();

    if messages.is_empty() {
        vec!["Your community is thriving. Keep up the great work!".to_string()]
    } else {
        messages
    }
}

pub fn goal_completion_rate(goals: &[Goal]) -> u32 {
    if goals.is_empty() {
        return 0;
    }
    let completed = goals
        .iter()
        .filter(|goal| goal.status == GoalStatus::Completed)
        .count();
    capped(completed as f64 / goals.len() as f64 * 100.0)
}

pub fn success_analytics(goals: &[Goal]) -> SuccessAnalytics {
    let completed_goals = goals
        .iter()
        .filter(|goal| goal.status == GoalStatus::Completed)
        .count();
    let average_progress = if goals.is_empty() {
        0.0
    } else {
        goals.iter().map(|goal| f64::from(goal.progress)).sum::<f64>() / goals.len() as f64
    };

    SuccessAnalytics {
        total_goals: goals.len(),
        completed_goals,
        completion_rate: goal_completion_rate(goals),
        average_progress,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn counts(posts: usize, comments: u64, likes: u64, events: usize, polls: usize) -> ActivityCounts {
        ActivityCounts {
            posts,
            comments,
            likes,
            events,
            polls,
            members: 0,
        }
    }

    fn goal(progress: u32, status: GoalStatus) -> Goal {
        Goal {
            id: Uuid::new_v4(),
            relationship_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: "Publish a research summary".to_string(),
            progress,
            status,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn single_post_engagement_matches_worked_example() {
        // one post with 3 likes and 2 replies: 2 + 3 + 1.5 = 6.5
        assert_eq!(engagement_score(&counts(1, 2, 3, 0, 0)), 7);
    }

    #[test]
    fn empty_inputs_score_zero() {
        let empty = ActivityCounts::default();
        assert_eq!(engagement_score(&empty), 0);
        let health = health_score(&empty, 0.9);
        assert_eq!(
            health,
            HealthScore {
                engagement: 0,
                growth: 0,
                activity: 0,
                retention: 0,
                overall: 0,
            }
        );
    }

    #[test]
    fn engagement_never_decreases_when_an_input_grows() {
        for posts in 0..4usize {
            for comments in 0..4u64 {
                for likes in 0..4u64 {
                    for events in 0..3usize {
                        for polls in 0..3usize {
                            let base = engagement_score(&counts(posts, comments, likes, events, polls));
                            let bumped = [
                                counts(posts + 1, comments, likes, events, polls),
                                counts(posts, comments + 1, likes, events, polls),
                                counts(posts, comments, likes + 1, events, polls),
                                counts(posts, comments, likes, events + 1, polls),
                                counts(posts, comments, likes, events, polls + 1),
                            ];
                            for next in bumped {
                                assert!(engagement_score(&next) >= base);
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn health_factors_stay_within_bounds() {
        let samples = [0.0, 0.25, 0.5, 0.999];
        for posts in [0usize, 1, 7, 40, 500] {
            for members in [0usize, 3, 99, 150, 10_000] {
                for &sample in &samples {
                    let input = ActivityCounts {
                        posts,
                        comments: posts as u64 * 3,
                        likes: posts as u64 * 11,
                        events: posts / 2,
                        polls: posts / 3,
                        members,
                    };
                    let health = health_score(&input, sample);
                    for factor in [
                        health.engagement,
                        health.growth,
                        health.activity,
                        health.retention,
                        health.overall,
                    ] {
                        assert!(factor <= 100);
                    }
                }
            }
        }
    }

    #[test]
    fn no_members_zeroes_growth_and_retention() {
        let input = ActivityCounts {
            posts: 2,
            comments: 1,
            likes: 4,
            events: 1,
            polls: 0,
            members: 0,
        };
        let health = health_score(&input, 0.8);
        assert_eq!(health.growth, 0);
        assert_eq!(health.retention, 0);
        // engagement 10 + 8 + 3 = 21, activity 20 + 15 = 35
        assert_eq!(health.engagement, 21);
        assert_eq!(health.activity, 35);
        let expected = (21.0 * 0.3 + 35.0 * 0.25_f64).round() as u32;
        assert_eq!(health.overall, expected);
    }

    #[test]
    fn retention_spans_seventy_five_to_one_hundred() {
        let input = ActivityCounts {
            members: 12,
            ..ActivityCounts::default()
        };
        assert_eq!(health_score(&input, 0.0).retention, 75);
        assert_eq!(health_score(&input, 0.5).retention, 88);
        assert_eq!(health_score(&input, 0.9999).retention, 100);
        assert_eq!(health_score(&input, 0.0).growth, 12);
    }

    #[test]
    fn weak_factors_produce_rules_in_order() {
        let score = HealthScore {
            engagement: 10,
            growth: 90,
            activity: 20,
            retention: 95,
            overall: 40,
        };
        let messages = recommendations(&score);
        assert_eq!(messages.len(), 2);
        assert!(messages[0].starts_with("Encourage more discussions"));
        assert!(messages[1].starts_with("Schedule events"));
    }

    #[test]
    fn healthy_community_gets_single_affirmation() {
        let score = HealthScore {
            engagement: 100,
            growth: 60,
            activity: 80,
            retention: 90,
            overall: 84,
        };
        let messages = recommendations(&score);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("thriving"));
    }

    #[test]
    fn completion_rate_counts_completed_goals() {
        let goals = vec![
            goal(100, GoalStatus::Completed),
            goal(40, GoalStatus::Active),
            goal(10, GoalStatus::Active),
        ];
        assert_eq!(goal_completion_rate(&goals), 33);
        let analytics = success_analytics(&goals);
        assert_eq!(analytics.total_goals, 3);
        assert_eq!(analytics.completed_goals, 1);
        assert!((analytics.average_progress - 50.0).abs() < 0.001);
        assert_eq!(goal_completion_rate(&[]), 0);
    }
}
