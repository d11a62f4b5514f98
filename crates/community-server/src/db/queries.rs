//! Database queries (PostgreSQL)

use crate::models::{
    Comment, CreateNotificationRequest, CreatePostRequest, DashboardResponse, EventTypeCount,
    LikeResponse, Notification, NotificationKind, Post, Role, TrackEventRequest,
    UpdatePostRequest, UpdateUserRequest, User, UserAnalyticsResponse,
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;
use tokio_postgres::types::ToSql;
use tokio_postgres::Row;
use uuid::Uuid;

// ============================================================================
// USERS
// ============================================================================

const USER_COLUMNS: &str = "id, nickname, email, password_hash, bio, profile_image_url, role, is_active, created_at, updated_at";

fn user_from_row(row: &Row) -> User {
    User {
        id: row.get(0),
        nickname: row.get(1),
        email: row.get(2),
        password_hash: row.get(3),
        bio: row.get(4),
        profile_image_url: row.get(5),
        role: Role::from(row.get::<_, String>(6).as_str()),
        is_active: row.get(7),
        created_at: row.get::<_, DateTime<Utc>>(8).timestamp(),
        updated_at: row.get::<_, DateTime<Utc>>(9).timestamp(),
    }
}

pub async fn create_user(
    pool: &Pool,
    nickname: &str,
    email: &str,
    password_hash: &str,
) -> Result<User> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            &format!(
                "INSERT INTO users (nickname, email, password_hash)
                 VALUES ($1, $2, $3)
                 RETURNING {}",
                USER_COLUMNS
            ),
            &[&nickname, &email, &password_hash],
        )
        .await?;
    Ok(user_from_row(&row))
}

pub async fn get_user_by_id(pool: &Pool, id: Uuid) -> Result<Option<User>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            &format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS),
            &[&id],
        )
        .await?;
    Ok(row.as_ref().map(user_from_row))
}

pub async fn get_user_by_email(pool: &Pool, email: &str) -> Result<Option<User>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            &format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS),
            &[&email],
        )
        .await?;
    Ok(row.as_ref().map(user_from_row))
}

pub async fn email_exists(pool: &Pool, email: &str) -> Result<bool> {
    let client = pool.get().await?;
    let row = client
        .query_opt("SELECT 1 FROM users WHERE email = $1", &[&email])
        .await?;
    Ok(row.is_some())
}

/// `exclude` skips a user's own row so renaming to the current nickname
/// is not reported as a collision.
pub async fn nickname_exists(pool: &Pool, nickname: &str, exclude: Option<Uuid>) -> Result<bool> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            "SELECT 1 FROM users WHERE nickname = $1 AND ($2::uuid IS NULL OR id <> $2)",
            &[&nickname, &exclude],
        )
        .await?;
    Ok(row.is_some())
}

pub async fn list_users(pool: &Pool, page: i64, limit: i64) -> Result<(Vec<User>, i64)> {
    let client = pool.get().await?;
    let total: i64 = client
        .query_one("SELECT COUNT(*) FROM users WHERE is_active = TRUE", &[])
        .await?
        .get(0);

    let offset = (page - 1) * limit;
    let rows = client
        .query(
            &format!(
                "SELECT {} FROM users WHERE is_active = TRUE
                 ORDER BY created_at DESC LIMIT $1 OFFSET $2",
                USER_COLUMNS
            ),
            &[&limit, &offset],
        )
        .await?;
    Ok((rows.iter().map(user_from_row).collect(), total))
}

pub async fn update_user_profile(
    pool: &Pool,
    id: Uuid,
    req: &UpdateUserRequest,
) -> Result<Option<User>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            &format!(
                "UPDATE users SET
                    nickname = COALESCE($2, nickname),
                    bio = COALESCE($3, bio),
                    profile_image_url = COALESCE($4, profile_image_url),
                    updated_at = NOW()
                 WHERE id = $1 AND is_active = TRUE
                 RETURNING {}",
                USER_COLUMNS
            ),
            &[&id, &req.nickname, &req.bio, &req.profile_image_url],
        )
        .await?;
    Ok(row.as_ref().map(user_from_row))
}

pub async fn update_user_role(pool: &Pool, id: Uuid, role: Role) -> Result<Option<User>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            &format!(
                "UPDATE users SET role = $2, updated_at = NOW()
                 WHERE id = $1 RETURNING {}",
                USER_COLUMNS
            ),
            &[&id, &role.as_str()],
        )
        .await?;
    Ok(row.as_ref().map(user_from_row))
}

pub async fn deactivate_user(pool: &Pool, id: Uuid) -> Result<bool> {
    let client = pool.get().await?;
    let n = client
        .execute(
            "UPDATE users SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
            &[&id],
        )
        .await?;
    Ok(n > 0)
}

pub async fn update_password(pool: &Pool, id: Uuid, password_hash: &str) -> Result<bool> {
    let client = pool.get().await?;
    let n = client
        .execute(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
            &[&id, &password_hash],
        )
        .await?;
    Ok(n > 0)
}

// ============================================================================
// REFRESH TOKENS
// ============================================================================

pub async fn store_refresh_token(
    pool: &Pool,
    user_id: Uuid,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            "INSERT INTO refresh_tokens (user_id, token_hash, expires_at)
             VALUES ($1, $2, $3)
             ON CONFLICT (user_id) DO UPDATE SET
                token_hash = EXCLUDED.token_hash,
                expires_at = EXCLUDED.expires_at,
                created_at = NOW()",
            &[&user_id, &token_hash, &expires_at],
        )
        .await?;
    Ok(())
}

pub async fn get_refresh_token_hash(pool: &Pool, user_id: Uuid) -> Result<Option<String>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            "SELECT token_hash FROM refresh_tokens
             WHERE user_id = $1 AND expires_at > NOW()",
            &[&user_id],
        )
        .await?;
    Ok(row.map(|r| r.get(0)))
}

pub async fn delete_refresh_token(pool: &Pool, user_id: Uuid) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute("DELETE FROM refresh_tokens WHERE user_id = $1", &[&user_id])
        .await?;
    Ok(())
}

// ============================================================================
// POSTS
// ============================================================================

const POST_COLUMNS: &str = "id, title, content, author_id, author_nickname, category, tags, like_count, view_count, is_active, created_at, updated_at";

fn post_from_row(row: &Row) -> Post {
    Post {
        id: row.get(0),
        title: row.get(1),
        content: row.get(2),
        author_id: row.get(3),
        author_nickname: row.get(4),
        category: row.get(5),
        tags: row.get(6),
        like_count: row.get(7),
        view_count: row.get(8),
        is_active: row.get(9),
        created_at: row.get::<_, DateTime<Utc>>(10).timestamp(),
        updated_at: row.get::<_, DateTime<Utc>>(11).timestamp(),
    }
}

pub async fn create_post(
    pool: &Pool,
    author_id: Uuid,
    author_nickname: &str,
    req: &CreatePostRequest,
) -> Result<Post> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            &format!(
                "INSERT INTO posts (title, content, author_id, author_nickname, category, tags)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 RETURNING {}",
                POST_COLUMNS
            ),
            &[
                &req.title,
                &req.content,
                &author_id,
                &author_nickname,
                &req.category,
                &req.tags,
            ],
        )
        .await?;
    Ok(post_from_row(&row))
}

pub async fn get_post(pool: &Pool, id: Uuid) -> Result<Option<Post>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            &format!(
                "SELECT {} FROM posts WHERE id = $1 AND is_active = TRUE",
                POST_COLUMNS
            ),
            &[&id],
        )
        .await?;
    Ok(row.as_ref().map(post_from_row))
}

pub async fn increment_view_count(pool: &Pool, id: Uuid) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            "UPDATE posts SET view_count = view_count + 1 WHERE id = $1",
            &[&id],
        )
        .await?;
    Ok(())
}

/// Filters for post listings; all optional, combined with AND
#[derive(Debug, Default)]
pub struct PostFilter {
    pub category: Option<String>,
    pub author_id: Option<Uuid>,
    pub search: Option<String>,
    pub tag: Option<String>,
}

pub async fn list_posts(
    pool: &Pool,
    filter: &PostFilter,
    page: i64,
    limit: i64,
) -> Result<(Vec<Post>, i64)> {
    let client = pool.get().await?;

    let mut where_sql = "is_active = TRUE".to_string();
    let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();
    let search_pattern = filter.search.as_ref().map(|s| format!("%{}%", s));

    if let Some(ref category) = filter.category {
        params.push(category);
        where_sql.push_str(&format!(" AND category = ${}", params.len()));
    }
    if let Some(ref author_id) = filter.author_id {
        params.push(author_id);
        where_sql.push_str(&format!(" AND author_id = ${}", params.len()));
    }
    if let Some(ref pattern) = search_pattern {
        params.push(pattern);
        let n = params.len();
        where_sql.push_str(&format!(" AND (title ILIKE ${} OR content ILIKE ${})", n, n));
    }
    if let Some(ref tag) = filter.tag {
        params.push(tag);
        where_sql.push_str(&format!(" AND ${} = ANY(tags)", params.len()));
    }

    let total: i64 = client
        .query_one(
            &format!("SELECT COUNT(*) FROM posts WHERE {}", where_sql),
            &params,
        )
        .await?
        .get(0);

    let offset = (page - 1) * limit;
    params.push(&limit);
    params.push(&offset);
    let rows = client
        .query(
            &format!(
                "SELECT {} FROM posts WHERE {} ORDER BY created_at DESC LIMIT ${} OFFSET ${}",
                POST_COLUMNS,
                where_sql,
                params.len() - 1,
                params.len()
            ),
            &params,
        )
        .await?;

    Ok((rows.iter().map(post_from_row).collect(), total))
}

pub async fn update_post(pool: &Pool, id: Uuid, req: &UpdatePostRequest) -> Result<Option<Post>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            &format!(
                "UPDATE posts SET
                    title = COALESCE($2, title),
                    content = COALESCE($3, content),
                    category = COALESCE($4, category),
                    tags = COALESCE($5, tags),
                    updated_at = NOW()
                 WHERE id = $1 AND is_active = TRUE
                 RETURNING {}",
                POST_COLUMNS
            ),
            &[&id, &req.title, &req.content, &req.category, &req.tags],
        )
        .await?;
    Ok(row.as_ref().map(post_from_row))
}

pub async fn soft_delete_post(pool: &Pool, id: Uuid) -> Result<bool> {
    let client = pool.get().await?;
    let n = client
        .execute(
            "UPDATE posts SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
            &[&id],
        )
        .await?;
    Ok(n > 0)
}

/// Toggle a like. The join table and the denormalized counter move
/// together inside one transaction.
pub async fn toggle_post_like(pool: &Pool, post_id: Uuid, user_id: Uuid) -> Result<LikeResponse> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let removed = tx
        .execute(
            "DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2",
            &[&post_id, &user_id],
        )
        .await?;

    let (liked, like_count) = if removed > 0 {
        let row = tx
            .query_one(
                "UPDATE posts SET like_count = GREATEST(like_count - 1, 0)
                 WHERE id = $1 RETURNING like_count",
                &[&post_id],
            )
            .await?;
        (false, row.get(0))
    } else {
        tx.execute(
            "INSERT INTO post_likes (post_id, user_id) VALUES ($1, $2)",
            &[&post_id, &user_id],
        )
        .await?;
        let row = tx
            .query_one(
                "UPDATE posts SET like_count = like_count + 1
                 WHERE id = $1 RETURNING like_count",
                &[&post_id],
            )
            .await?;
        (true, row.get(0))
    };

    tx.commit().await?;
    Ok(LikeResponse { liked, like_count })
}

// ============================================================================
// COMMENTS
// ============================================================================

const COMMENT_COLUMNS: &str = "id, post_id, parent_id, depth, author_id, author_nickname, content, like_count, is_deleted, created_at, updated_at";

fn comment_from_row(row: &Row) -> Comment {
    Comment {
        id: row.get(0),
        post_id: row.get(1),
        parent_id: row.get(2),
        depth: row.get(3),
        author_id: row.get(4),
        author_nickname: row.get(5),
        content: row.get(6),
        like_count: row.get(7),
        is_deleted: row.get(8),
        created_at: row.get::<_, DateTime<Utc>>(9).timestamp(),
        updated_at: row.get::<_, DateTime<Utc>>(10).timestamp(),
    }
}

#[allow(clippy::too_many_arguments)]
pub async fn create_comment(
    pool: &Pool,
    post_id: Uuid,
    parent_id: Option<Uuid>,
    depth: i32,
    author_id: Uuid,
    author_nickname: &str,
    content: &str,
) -> Result<Comment> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            &format!(
                "INSERT INTO comments (post_id, parent_id, depth, author_id, author_nickname, content)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 RETURNING {}",
                COMMENT_COLUMNS
            ),
            &[
                &post_id,
                &parent_id,
                &depth,
                &author_id,
                &author_nickname,
                &content,
            ],
        )
        .await?;
    Ok(comment_from_row(&row))
}

pub async fn get_comment(pool: &Pool, id: Uuid) -> Result<Option<Comment>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            &format!("SELECT {} FROM comments WHERE id = $1", COMMENT_COLUMNS),
            &[&id],
        )
        .await?;
    Ok(row.as_ref().map(comment_from_row))
}

pub async fn list_comments_by_post(pool: &Pool, post_id: Uuid) -> Result<Vec<Comment>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            &format!(
                "SELECT {} FROM comments WHERE post_id = $1 ORDER BY created_at ASC",
                COMMENT_COLUMNS
            ),
            &[&post_id],
        )
        .await?;
    Ok(rows.iter().map(comment_from_row).collect())
}

pub async fn count_comments(pool: &Pool, post_id: Uuid) -> Result<i64> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            "SELECT COUNT(*) FROM comments WHERE post_id = $1 AND is_deleted = FALSE",
            &[&post_id],
        )
        .await?;
    Ok(row.get(0))
}

pub async fn update_comment(pool: &Pool, id: Uuid, content: &str) -> Result<Option<Comment>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            &format!(
                "UPDATE comments SET content = $2, updated_at = NOW()
                 WHERE id = $1 AND is_deleted = FALSE
                 RETURNING {}",
                COMMENT_COLUMNS
            ),
            &[&id, &content],
        )
        .await?;
    Ok(row.as_ref().map(comment_from_row))
}

pub async fn soft_delete_comment(pool: &Pool, id: Uuid) -> Result<bool> {
    let client = pool.get().await?;
    let n = client
        .execute(
            "UPDATE comments SET is_deleted = TRUE, updated_at = NOW() WHERE id = $1",
            &[&id],
        )
        .await?;
    Ok(n > 0)
}

pub async fn toggle_comment_like(
    pool: &Pool,
    comment_id: Uuid,
    user_id: Uuid,
) -> Result<LikeResponse> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let removed = tx
        .execute(
            "DELETE FROM comment_likes WHERE comment_id = $1 AND user_id = $2",
            &[&comment_id, &user_id],
        )
        .await?;

    let (liked, like_count) = if removed > 0 {
        let row = tx
            .query_one(
                "UPDATE comments SET like_count = GREATEST(like_count - 1, 0)
                 WHERE id = $1 RETURNING like_count",
                &[&comment_id],
            )
            .await?;
        (false, row.get(0))
    } else {
        tx.execute(
            "INSERT INTO comment_likes (comment_id, user_id) VALUES ($1, $2)",
            &[&comment_id, &user_id],
        )
        .await?;
        let row = tx
            .query_one(
                "UPDATE comments SET like_count = like_count + 1
                 WHERE id = $1 RETURNING like_count",
                &[&comment_id],
            )
            .await?;
        (true, row.get(0))
    };

    tx.commit().await?;
    Ok(LikeResponse { liked, like_count })
}

// ============================================================================
// NOTIFICATIONS
// ============================================================================

const NOTIFICATION_COLUMNS: &str = "id, user_id, title, message, kind, is_read, related_id, created_at";

fn notification_from_row(row: &Row) -> Notification {
    Notification {
        id: row.get(0),
        user_id: row.get(1),
        title: row.get(2),
        message: row.get(3),
        kind: NotificationKind::from(row.get::<_, String>(4).as_str()),
        is_read: row.get(5),
        related_id: row.get(6),
        created_at: row.get::<_, DateTime<Utc>>(7).timestamp(),
    }
}

pub async fn create_notification(
    pool: &Pool,
    req: &CreateNotificationRequest,
) -> Result<Notification> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            &format!(
                "INSERT INTO notifications (user_id, title, message, kind, related_id)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING {}",
                NOTIFICATION_COLUMNS
            ),
            &[
                &req.user_id,
                &req.title,
                &req.message,
                &req.kind.as_str(),
                &req.related_id,
            ],
        )
        .await?;
    Ok(notification_from_row(&row))
}

pub async fn list_notifications(
    pool: &Pool,
    user_id: Uuid,
    unread_only: bool,
) -> Result<Vec<Notification>> {
    let client = pool.get().await?;
    let filter = if unread_only {
        " AND is_read = FALSE"
    } else {
        ""
    };
    let rows = client
        .query(
            &format!(
                "SELECT {} FROM notifications WHERE user_id = $1{}
                 ORDER BY created_at DESC LIMIT 100",
                NOTIFICATION_COLUMNS, filter
            ),
            &[&user_id],
        )
        .await?;
    Ok(rows.iter().map(notification_from_row).collect())
}

pub async fn unread_notification_count(pool: &Pool, user_id: Uuid) -> Result<i64> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
            &[&user_id],
        )
        .await?;
    Ok(row.get(0))
}

/// Marks a notification read; scoped to the owner so users cannot touch
/// each other's notifications.
pub async fn mark_notification_read(
    pool: &Pool,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<Notification>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            &format!(
                "UPDATE notifications SET is_read = TRUE
                 WHERE id = $1 AND user_id = $2
                 RETURNING {}",
                NOTIFICATION_COLUMNS
            ),
            &[&id, &user_id],
        )
        .await?;
    Ok(row.as_ref().map(notification_from_row))
}

pub async fn mark_all_notifications_read(pool: &Pool, user_id: Uuid) -> Result<u64> {
    let client = pool.get().await?;
    let n = client
        .execute(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE",
            &[&user_id],
        )
        .await?;
    Ok(n)
}

// ============================================================================
// ANALYTICS
// ============================================================================

pub async fn insert_analytics_event(
    pool: &Pool,
    user_id: Option<Uuid>,
    source_ip: Option<&str>,
    user_agent: Option<&str>,
    req: &TrackEventRequest,
) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            "INSERT INTO analytics_events
                (user_id, session_id, event_type, entity_type, entity_id,
                 source_ip, user_agent, properties, value)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            &[
                &user_id,
                &req.session_id,
                &req.event_type,
                &req.entity_type,
                &req.entity_id,
                &source_ip,
                &user_agent,
                &req.properties,
                &req.value,
            ],
        )
        .await?;
    Ok(())
}

/// Insert a batch atomically: either every event lands or none do.
pub async fn insert_analytics_events(
    pool: &Pool,
    user_id: Option<Uuid>,
    source_ip: Option<&str>,
    user_agent: Option<&str>,
    events: &[TrackEventRequest],
) -> Result<()> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let stmt = tx
        .prepare(
            "INSERT INTO analytics_events
                (user_id, session_id, event_type, entity_type, entity_id,
                 source_ip, user_agent, properties, value)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .await?;
    for req in events {
        tx.execute(
            &stmt,
            &[
                &user_id,
                &req.session_id,
                &req.event_type,
                &req.entity_type,
                &req.entity_id,
                &source_ip,
                &user_agent,
                &req.properties,
                &req.value,
            ],
        )
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

pub async fn dashboard_analytics(pool: &Pool) -> Result<DashboardResponse> {
    let client = pool.get().await?;

    let total_users: i64 = client
        .query_one("SELECT COUNT(*) FROM users WHERE is_active = TRUE", &[])
        .await?
        .get(0);
    let total_posts: i64 = client
        .query_one("SELECT COUNT(*) FROM posts WHERE is_active = TRUE", &[])
        .await?
        .get(0);
    let total_comments: i64 = client
        .query_one(
            "SELECT COUNT(*) FROM comments WHERE is_deleted = FALSE",
            &[],
        )
        .await?
        .get(0);

    let rows = client
        .query(
            "SELECT event_type, COUNT(*) FROM analytics_events
             WHERE created_at >= NOW() - INTERVAL '24 hours'
             GROUP BY event_type ORDER BY COUNT(*) DESC",
            &[],
        )
        .await?;
    let events_last_24h = rows
        .iter()
        .map(|row| EventTypeCount {
            event_type: row.get(0),
            count: row.get(1),
        })
        .collect();

    Ok(DashboardResponse {
        total_users,
        total_posts,
        total_comments,
        events_last_24h,
    })
}

pub async fn user_analytics(pool: &Pool, user_id: Uuid) -> Result<UserAnalyticsResponse> {
    let client = pool.get().await?;

    let post_count: i64 = client
        .query_one(
            "SELECT COUNT(*) FROM posts WHERE author_id = $1 AND is_active = TRUE",
            &[&user_id],
        )
        .await?
        .get(0);
    let comment_count: i64 = client
        .query_one(
            "SELECT COUNT(*) FROM comments WHERE author_id = $1 AND is_deleted = FALSE",
            &[&user_id],
        )
        .await?
        .get(0);

    let rows = client
        .query(
            "SELECT event_type, COUNT(*) FROM analytics_events
             WHERE user_id = $1 GROUP BY event_type ORDER BY COUNT(*) DESC",
            &[&user_id],
        )
        .await?;
    let events_by_type = rows
        .iter()
        .map(|row| EventTypeCount {
            event_type: row.get(0),
            count: row.get(1),
        })
        .collect();

    Ok(UserAnalyticsResponse {
        user_id,
        post_count,
        comment_count,
        events_by_type,
    })
}

// ============================================================================
// AUDIT TRAIL
// ============================================================================

pub async fn log_audit_event(
    pool: &Pool,
    event_type: &str,
    entity_type: Option<&str>,
    entity_id: Option<&str>,
    payload: Option<&serde_json::Value>,
    actor_id: Option<&str>,
) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            "INSERT INTO audit_events (event_type, entity_type, entity_id, payload, actor_id)
             VALUES ($1, $2, $3, $4, $5)",
            &[&event_type, &entity_type, &entity_id, &payload, &actor_id],
        )
        .await?;
    Ok(())
}
