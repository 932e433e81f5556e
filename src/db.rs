use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::InsightsError;
use crate::models::{Event, Goal, GoalStatus, Group, GroupSnapshot, Member, Poll, Post};
use crate::session::ActorContext;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

fn count_from_db(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

async fn upsert_group(pool: &PgPool, id: Uuid, name: &str, description: &str) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO community_insights.groups AS g (id, name, description)
        VALUES ($1, $2, $3)
        ON CONFLICT (name) DO UPDATE
        SET description = CASE
            WHEN EXCLUDED.description = '' THEN g.description
            ELSE EXCLUDED.description
        END
        RETURNING id
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .fetch_one(pool)
    .await?
    .get("id");
    Ok(id)
}

async fn ensure_member(
    pool: &PgPool,
    group_id: Uuid,
    user_id: Uuid,
    joined_at: DateTime<Utc>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO community_insights.members (id, group_id, user_id, joined_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (group_id, user_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(group_id)
    .bind(user_id)
    .bind(joined_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let now = Utc::now();
    let groups = vec![
        (
            Uuid::parse_str("7b1f3c2e-5d44-4a8b-9c61-2f0e8d9a4b17")?,
            "Young Innovators Dubai",
            "Students and graduates building technology projects",
        ),
        (
            Uuid::parse_str("c4e2a9d8-1b37-4f6a-8e05-93d1c7b2e640")?,
            "Heritage Keepers",
            "Senior citizens preserving Emirati crafts and stories",
        ),
    ];

    let members = vec![
        ("Young Innovators Dubai", "3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2", 40),
        ("Young Innovators Dubai", "0c22f1f1-9184-4fd4-9b21-28c68a6a89dc", 21),
        ("Young Innovators Dubai", "d5a0a1a2-2a3c-44c2-8f73-60b7897a9dd2", 5),
        ("Heritage Keepers", "0c22f1f1-9184-4fd4-9b21-28c68a6a89dc", 120),
        ("Heritage Keepers", "9e8d7c6b-5a49-4382-a1b0-c9d8e7f6a5b4", 64),
    ];

    let posts = vec![
        ("seed-post-001", "Young Innovators Dubai", "3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2", "Hackathon team formation", 14, 6, 2),
        ("seed-post-002", "Young Innovators Dubai", "0c22f1f1-9184-4fd4-9b21-28c68a6a89dc", "Robotics kit recommendations", 5, 3, 6),
        ("seed-post-003", "Young Innovators Dubai", "d5a0a1a2-2a3c-44c2-8f73-60b7897a9dd2", "Internship interview tips", 9, 4, 11),
        ("seed-post-004", "Heritage Keepers", "9e8d7c6b-5a49-4382-a1b0-c9d8e7f6a5b4", "Recording Sadu weaving patterns", 22, 8, 3),
    ];

    let mut group_ids = std::collections::HashMap::new();
    for (id, name, description) in groups {
        let id = upsert_group(pool, id, name, description).await?;
        group_ids.insert(name, id);
    }

    for (group, user_id, days_ago) in members {
        let group_id = *group_ids.get(group).context("seed group missing")?;
        ensure_member(pool, group_id, Uuid::parse_str(user_id)?, now - Duration::days(days_ago)).await?;
    }

    for (source_key, group, author, title, likes, replies, days_ago) in posts {
        let group_id = *group_ids.get(group).context("seed group missing")?;
        sqlx::query(
            r#"
            INSERT INTO community_insights.posts
            (id, group_id, author_id, title, like_count, reply_count, posted_at, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(group_id)
        .bind(Uuid::parse_str(author)?)
        .bind(title)
        .bind(likes)
        .bind(replies)
        .bind(now - Duration::days(days_ago))
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    let young = *group_ids
        .get("Young Innovators Dubai")
        .context("seed group missing")?;
    let existing: i64 = sqlx::query(
        "SELECT COUNT(*) AS total FROM community_insights.events WHERE group_id = $1",
    )
    .bind(young)
    .fetch_one(pool)
    .await?
    .get("total");

    if existing == 0 {
        sqlx::query(
            "INSERT INTO community_insights.events (id, group_id, title, starts_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(young)
        .bind("Virtual demo day")
        .bind(now + Duration::days(9))
        .execute(pool)
        .await?;
        sqlx::query(
            "INSERT INTO community_insights.polls (id, group_id, question) VALUES ($1, $2, $3)",
        )
        .bind(Uuid::new_v4())
        .bind(young)
        .bind("Which workshop should we run next?")
        .execute(pool)
        .await?;
    }

    tracing::info!(groups = group_ids.len(), "seed data applied");
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct PostCsvRow {
    pub group_name: String,
    pub author_id: Uuid,
    pub title: String,
    pub like_count: Option<u32>,
    pub reply_count: Option<u32>,
    pub posted_at: DateTime<Utc>,
    pub source_key: Option<String>,
}

pub fn read_post_rows<R: std::io::Read>(input: R) -> anyhow::Result<Vec<PostCsvRow>> {
    let mut reader = csv::Reader::from_reader(input);
    let mut rows = Vec::new();
    for (index, result) in reader.deserialize::<PostCsvRow>().enumerate() {
        let row = result.with_context(|| format!("invalid post row {}", index + 1))?;
        rows.push(row);
    }
    Ok(rows)
}

pub async fn import_posts_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let rows = read_post_rows(file)?;
    let mut inserted = 0usize;

    for row in rows {
        let group_id = upsert_group(pool, Uuid::new_v4(), &row.group_name, "").await?;
        ensure_member(pool, group_id, row.author_id, row.posted_at).await?;

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO community_insights.posts
            (id, group_id, author_id, title, like_count, reply_count, posted_at, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(group_id)
        .bind(row.author_id)
        .bind(&row.title)
        .bind(i32::try_from(row.like_count.unwrap_or(0)).unwrap_or(i32::MAX))
        .bind(i32::try_from(row.reply_count.unwrap_or(0)).unwrap_or(i32::MAX))
        .bind(row.posted_at)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        } else {
            tracing::debug!(title = %row.title, "post already imported");
        }
    }

    Ok(inserted)
}

#[derive(Debug, Clone)]
pub struct GroupListing {
    pub name: String,
    pub description: String,
    pub member_count: i64,
    pub post_count: i64,
}

pub async fn list_groups(pool: &PgPool) -> anyhow::Result<Vec<GroupListing>> {
    let rows = sqlx::query(
        "SELECT g.name, g.description, \
         (SELECT COUNT(*) FROM community_insights.members m WHERE m.group_id = g.id) AS member_count, \
         (SELECT COUNT(*) FROM community_insights.posts p WHERE p.group_id = g.id) AS post_count \
         FROM community_insights.groups g ORDER BY g.name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| GroupListing {
            name: row.get("name"),
            description: row.get("description"),
            member_count: row.get("member_count"),
            post_count: row.get("post_count"),
        })
        .collect())
}

pub async fn fetch_group_snapshot(pool: &PgPool, group_name: &str) -> anyhow::Result<GroupSnapshot> {
    let group = sqlx::query(
        "SELECT id, name, description FROM community_insights.groups WHERE name = $1",
    )
    .bind(group_name)
    .fetch_optional(pool)
    .await?
    .map(|row| Group {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
    })
    .ok_or_else(|| InsightsError::GroupNotFound {
        name: group_name.to_string(),
    })?;

    let posts = sqlx::query(
        "SELECT id, group_id, author_id, like_count, reply_count, posted_at \
         FROM community_insights.posts WHERE group_id = $1 ORDER BY posted_at",
    )
    .bind(group.id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|row| Post {
        id: row.get("id"),
        group_id: row.get("group_id"),
        author_id: row.get("author_id"),
        like_count: count_from_db(row.get("like_count")),
        reply_count: count_from_db(row.get("reply_count")),
        posted_at: row.get("posted_at"),
    })
    .collect();

    let members = sqlx::query(
        "SELECT id, group_id, user_id, joined_at FROM community_insights.members WHERE group_id = $1",
    )
    .bind(group.id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|row| Member {
        id: row.get("id"),
        group_id: row.get("group_id"),
        user_id: row.get("user_id"),
        joined_at: row.get("joined_at"),
    })
    .collect();

    let events = sqlx::query(
        "SELECT id, group_id, title, starts_at FROM community_insights.events WHERE group_id = $1",
    )
    .bind(group.id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|row| Event {
        id: row.get("id"),
        group_id: row.get("group_id"),
        title: row.get("title"),
        starts_at: row.get("starts_at"),
    })
    .collect();

    let polls = sqlx::query(
        "SELECT id, group_id, question FROM community_insights.polls WHERE group_id = $1",
    )
    .bind(group.id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|row| Poll {
        id: row.get("id"),
        group_id: row.get("group_id"),
        question: row.get("question"),
    })
    .collect();

    let snapshot = GroupSnapshot {
        group,
        posts,
        members,
        events,
        polls,
    };
    tracing::debug!(
        group = %snapshot.group.name,
        posts = snapshot.posts.len(),
        members = snapshot.members.len(),
        "loaded group snapshot"
    );
    Ok(snapshot)
}

fn goal_from_row(row: PgRow) -> anyhow::Result<Goal> {
    let status: String = row.get("status");
    Ok(Goal {
        id: row.get("id"),
        relationship_id: row.get("relationship_id"),
        owner_id: row.get("owner_id"),
        title: row.get("title"),
        progress: count_from_db(row.get("progress")),
        status: status.parse::<GoalStatus>()?,
        updated_at: row.get("updated_at"),
    })
}

const GOAL_COLUMNS: &str = "id, relationship_id, owner_id, title, progress, status, updated_at";

pub async fn fetch_goals(pool: &PgPool, relationship_id: Uuid) -> anyhow::Result<Vec<Goal>> {
    let query = format!(
        "SELECT {GOAL_COLUMNS} FROM community_insights.goals \
         WHERE relationship_id = $1 ORDER BY created_at"
    );
    sqlx::query(&query)
        .bind(relationship_id)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(goal_from_row)
        .collect()
}

pub async fn create_goal(
    pool: &PgPool,
    actor: &ActorContext,
    relationship_id: Uuid,
    title: &str,
) -> anyhow::Result<Goal> {
    let query = format!(
        "INSERT INTO community_insights.goals \
         (id, relationship_id, owner_id, title, progress, status, created_by, updated_by) \
         VALUES ($1, $2, $3, $4, 0, 'active', $3, $3) \
         RETURNING {GOAL_COLUMNS}"
    );
    let row = sqlx::query(&query)
        .bind(Uuid::new_v4())
        .bind(relationship_id)
        .bind(actor.user_id)
        .bind(title)
        .fetch_one(pool)
        .await
        .context("failed to create goal")?;
    goal_from_row(row)
}

pub async fn update_goal_progress(
    pool: &PgPool,
    actor: &ActorContext,
    goal_id: Uuid,
    progress: u32,
) -> anyhow::Result<Goal> {
    let query = format!(
        "UPDATE community_insights.goals \
         SET progress = $2, updated_by = $3, updated_at = now() \
         WHERE id = $1 RETURNING {GOAL_COLUMNS}"
    );
    let row = sqlx::query(&query)
        .bind(goal_id)
        .bind(progress.min(100) as i32)
        .bind(actor.user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(InsightsError::GoalNotFound { id: goal_id })?;
    goal_from_row(row)
}

pub async fn complete_goal(pool: &PgPool, actor: &ActorContext, goal_id: Uuid) -> anyhow::Result<Goal> {
    let query = format!(
        "UPDATE community_insights.goals \
         SET progress = 100, status = 'completed', updated_by = $2, updated_at = now() \
         WHERE id = $1 RETURNING {GOAL_COLUMNS}"
    );
    let row = sqlx::query(&query)
        .bind(goal_id)
        .bind(actor.user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(InsightsError::GoalNotFound { id: goal_id })?;
    goal_from_row(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_counts_read_as_zero() {
        assert_eq!(count_from_db(-3), 0);
        assert_eq!(count_from_db(12), 12);
    }

    #[test]
    fn parses_post_rows_with_defaults() {
        let csv = "group_name,author_id,title,like_count,reply_count,posted_at,source_key\n\
                   Heritage Keepers,9e8d7c6b-5a49-4382-a1b0-c9d8e7f6a5b4,Pearl diving stories,7,2,2026-02-01T10:00:00Z,hk-001\n\
                   Heritage Keepers,9e8d7c6b-5a49-4382-a1b0-c9d8e7f6a5b4,Falconry meetup,,,2026-02-03T18:30:00Z,\n";
        let rows = read_post_rows(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].like_count, Some(7));
        assert_eq!(rows[0].source_key.as_deref(), Some("hk-001"));
        assert_eq!(rows[1].like_count, None);
        assert!(rows[1].source_key.is_none());
    }

    #[test]
    fn bad_row_reports_its_position() {
        let csv = "group_name,author_id,title,like_count,reply_count,posted_at,source_key\n\
                   Heritage Keepers,not-a-uuid,Broken,1,1,2026-02-01T10:00:00Z,x\n";
        let err = read_post_rows(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }
}
