//! Data models and DTOs for the community server

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// ============================================================================
// RESPONSE ENVELOPE
// ============================================================================

/// Uniform response envelope for all endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    pub timestamp: i64,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error_code: None,
            timestamp: now_millis(),
        }
    }

    pub fn message(message: &str) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.to_string()),
            error_code: None,
            timestamp: now_millis(),
        }
    }

    pub fn error(code: &str, message: &str) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.to_string()),
            error_code: Some(code.to_string()),
            timestamp: now_millis(),
        }
    }
}

/// Paged listing envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    /// Clamp to sane bounds: page >= 1, 1 <= limit <= MAX_PAGE_SIZE
    pub fn normalize(&self) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        (page, limit)
    }
}

// ============================================================================
// USERS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Moderator,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Moderator | Role::Admin)
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        match s {
            "admin" => Role::Admin,
            "moderator" => Role::Moderator,
            _ => Role::User,
        }
    }
}

/// Full user row, password hash included. Never serialized to clients.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub nickname: String,
    pub email: String,
    pub password_hash: String,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub nickname: String,
    pub email: String,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
    pub role: Role,
    pub created_at: i64,
}

impl From<&User> for UserResponse {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            nickname: u.nickname.clone(),
            email: u.email.clone(),
            bio: u.bio.clone(),
            profile_image_url: u.profile_image_url.clone(),
            role: u.role,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserRequest {
    pub nickname: Option<String>,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(ref nickname) = self.nickname {
            if nickname.len() < 2 || nickname.len() > 50 {
                return Err(ApiError::InvalidInput(
                    "Nickname must be between 2 and 50 characters".to_string(),
                ));
            }
        }
        if let Some(ref bio) = self.bio {
            if bio.len() > 500 {
                return Err(ApiError::InvalidInput(
                    "Bio must be less than 500 characters".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

// ============================================================================
// AUTH
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub nickname: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if !self.email.contains('@') || !self.email.contains('.') || self.email.len() > 100 {
            return Err(ApiError::InvalidInput("Invalid email format".to_string()));
        }
        if self.password.len() < 8 || self.password.len() > 100 {
            return Err(ApiError::InvalidInput(
                "Password must be between 8 and 100 characters".to_string(),
            ));
        }
        if self.nickname.len() < 2 || self.nickname.len() > 50 {
            return Err(ApiError::InvalidInput(
                "Nickname must be between 2 and 50 characters".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenRefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordChangeRequest {
    pub current_password: String,
    pub new_password: String,
}

impl PasswordChangeRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.new_password.len() < 8 || self.new_password.len() > 100 {
            return Err(ApiError::InvalidInput(
                "Password must be between 8 and 100 characters".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// POSTS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
    pub author_nickname: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub like_count: i64,
    pub view_count: i64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CreatePostRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.title.is_empty() || self.title.len() > 200 {
            return Err(ApiError::InvalidInput(
                "Title must be between 1 and 200 characters".to_string(),
            ));
        }
        if self.content.is_empty() || self.content.len() > 5000 {
            return Err(ApiError::InvalidInput(
                "Content must be between 1 and 5000 characters".to_string(),
            ));
        }
        if let Some(ref category) = self.category {
            if category.len() > 50 {
                return Err(ApiError::InvalidInput(
                    "Category must be less than 50 characters".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl UpdatePostRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(ref title) = self.title {
            if title.is_empty() || title.len() > 200 {
                return Err(ApiError::InvalidInput(
                    "Title must be between 1 and 200 characters".to_string(),
                ));
            }
        }
        if let Some(ref content) = self.content {
            if content.is_empty() || content.len() > 5000 {
                return Err(ApiError::InvalidInput(
                    "Content must be between 1 and 5000 characters".to_string(),
                ));
            }
        }
        if let Some(ref category) = self.category {
            if category.len() > 50 {
                return Err(ApiError::InvalidInput(
                    "Category must be less than 50 characters".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListPostsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub category: Option<String>,
    pub author_id: Option<Uuid>,
    pub search: Option<String>,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeResponse {
    pub liked: bool,
    pub like_count: i64,
}

// ============================================================================
// COMMENTS
// ============================================================================

#[derive(Debug, Clone)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub depth: i32,
    pub author_id: Uuid,
    pub author_nickname: String,
    pub content: String,
    pub like_count: i64,
    pub is_deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub post_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub depth: i32,
    pub author_id: Uuid,
    pub author_nickname: String,
    pub content: String,
    pub like_count: i64,
    pub is_deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default)]
    pub children: Vec<CommentResponse>,
}

impl From<&Comment> for CommentResponse {
    fn from(c: &Comment) -> Self {
        // Deleted comments keep their place in the thread but mask identity
        let (author_nickname, content) = if c.is_deleted {
            (
                "Deleted".to_string(),
                "This comment has been deleted.".to_string(),
            )
        } else {
            (c.author_nickname.clone(), c.content.clone())
        };
        Self {
            id: c.id,
            post_id: c.post_id,
            parent_id: c.parent_id,
            depth: c.depth,
            author_id: c.author_id,
            author_nickname,
            content,
            like_count: c.like_count,
            is_deleted: c.is_deleted,
            created_at: c.created_at,
            updated_at: c.updated_at,
            children: Vec::new(),
        }
    }
}

/// Assemble a flat, chronologically ordered comment list into a thread tree.
/// Children of a missing parent surface at the root rather than vanish.
pub fn build_comment_tree(comments: Vec<CommentResponse>) -> Vec<CommentResponse> {
    let ids: Vec<Uuid> = comments.iter().map(|c| c.id).collect();
    let mut by_id: HashMap<Uuid, CommentResponse> =
        comments.into_iter().map(|c| (c.id, c)).collect();
    let mut roots = Vec::new();

    // Walk newest-first so every child is attached before its parent moves
    for id in ids.iter().rev() {
        let node = match by_id.remove(id) {
            Some(n) => n,
            None => continue,
        };
        match node.parent_id.and_then(|p| by_id.get_mut(&p)) {
            Some(parent) => parent.children.insert(0, node),
            None => roots.insert(0, node),
        }
    }
    roots
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCommentRequest {
    pub post_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub content: String,
}

impl CreateCommentRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.content.is_empty() || self.content.len() > 2000 {
            return Err(ApiError::InvalidInput(
                "Content must be between 1 and 2000 characters".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}

// ============================================================================
// NOTIFICATIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    PostCreated,
    CommentAdded,
    LikeReceived,
    SystemAnnouncement,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::PostCreated => "post_created",
            NotificationKind::CommentAdded => "comment_added",
            NotificationKind::LikeReceived => "like_received",
            NotificationKind::SystemAnnouncement => "system_announcement",
        }
    }
}

impl From<&str> for NotificationKind {
    fn from(s: &str) -> Self {
        match s {
            "post_created" => NotificationKind::PostCreated,
            "comment_added" => NotificationKind::CommentAdded,
            "like_received" => NotificationKind::LikeReceived,
            _ => NotificationKind::SystemAnnouncement,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub is_read: bool,
    pub related_id: Option<Uuid>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateNotificationRequest {
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub related_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnreadCountResponse {
    pub unread_count: i64,
}

// ============================================================================
// ANALYTICS
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct TrackEventRequest {
    pub event_type: String,
    pub session_id: Option<String>,
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
    pub properties: Option<serde_json::Value>,
    pub value: Option<f64>,
}

impl TrackEventRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.event_type.is_empty() || self.event_type.len() > 64 {
            return Err(ApiError::InvalidInput(
                "event_type must be between 1 and 64 characters".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub total_users: i64,
    pub total_posts: i64,
    pub total_comments: i64,
    pub events_last_24h: Vec<EventTypeCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventTypeCount {
    pub event_type: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAnalyticsResponse {
    pub user_id: Uuid,
    pub post_count: i64,
    pub comment_count: i64,
    pub events_by_type: Vec<EventTypeCount>,
}

// ============================================================================
// WEBSOCKET EVENTS
// ============================================================================

/// Events pushed to connected clients over the WebSocket feed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsEvent {
    Ping,
    PostCreated {
        post_id: Uuid,
        author_id: Uuid,
        title: String,
    },
    CommentAdded {
        post_id: Uuid,
        comment_id: Uuid,
        author_id: Uuid,
    },
    Notification {
        user_id: Uuid,
        notification: Notification,
    },
}

impl WsEvent {
    /// Events addressed to a single user are only delivered to that user
    pub fn target_user(&self) -> Option<Uuid> {
        match self {
            WsEvent::Notification { user_id, .. } => Some(*user_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: u128, parent: Option<u128>, created_at: i64) -> CommentResponse {
        CommentResponse {
            id: Uuid::from_u128(id),
            post_id: Uuid::from_u128(999),
            parent_id: parent.map(Uuid::from_u128),
            depth: if parent.is_some() { 1 } else { 0 },
            author_id: Uuid::from_u128(1),
            author_nickname: "alice".to_string(),
            content: "hi".to_string(),
            like_count: 0,
            is_deleted: false,
            created_at,
            updated_at: created_at,
            children: Vec::new(),
        }
    }

    #[test]
    fn test_comment_tree_nesting() {
        let flat = vec![
            comment(1, None, 100),
            comment(2, None, 200),
            comment(3, Some(1), 300),
            comment(4, Some(3), 400),
        ];
        let tree = build_comment_tree(flat);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].id, Uuid::from_u128(1));
        assert_eq!(tree[0].children.len(), 1);
        assert_eq!(tree[0].children[0].id, Uuid::from_u128(3));
        assert_eq!(tree[0].children[0].children[0].id, Uuid::from_u128(4));
        assert!(tree[1].children.is_empty());
    }

    #[test]
    fn test_comment_tree_orphan_surfaces_at_root() {
        let flat = vec![comment(1, None, 100), comment(2, Some(42), 200)];
        let tree = build_comment_tree(flat);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[1].id, Uuid::from_u128(2));
    }

    #[test]
    fn test_deleted_comment_is_masked() {
        let c = Comment {
            id: Uuid::from_u128(1),
            post_id: Uuid::from_u128(2),
            parent_id: None,
            depth: 0,
            author_id: Uuid::from_u128(3),
            author_nickname: "alice".to_string(),
            content: "secret".to_string(),
            like_count: 5,
            is_deleted: true,
            created_at: 0,
            updated_at: 0,
        };
        let resp = CommentResponse::from(&c);
        assert_eq!(resp.author_nickname, "Deleted");
        assert!(!resp.content.contains("secret"));
        assert_eq!(resp.like_count, 5);
    }

    #[test]
    fn test_page_query_normalize() {
        let q = PageQuery {
            page: None,
            limit: None,
        };
        assert_eq!(q.normalize(), (1, DEFAULT_PAGE_SIZE));

        let q = PageQuery {
            page: Some(0),
            limit: Some(10_000),
        };
        assert_eq!(q.normalize(), (1, MAX_PAGE_SIZE));
    }

    #[test]
    fn test_register_request_validation() {
        let ok = RegisterRequest {
            email: "alice@example.com".to_string(),
            password: "hunter2hunter2".to_string(),
            nickname: "alice".to_string(),
        };
        assert!(ok.validate().is_ok());

        let bad_email = RegisterRequest {
            email: "not-an-email".to_string(),
            ..ok.clone()
        };
        assert!(bad_email.validate().is_err());

        let short_password = RegisterRequest {
            password: "short".to_string(),
            ..ok.clone()
        };
        assert!(short_password.validate().is_err());

        let short_nickname = RegisterRequest {
            nickname: "a".to_string(),
            ..ok
        };
        assert!(short_nickname.validate().is_err());
    }

    #[test]
    fn test_heartbeat_ping_wire_shape() {
        let json = serde_json::to_string(&WsEvent::Ping).unwrap();
        assert_eq!(json, r#"{"type":"ping"}"#);
        assert!(WsEvent::Ping.target_user().is_none());
    }

    #[test]
    fn test_ws_event_targeting_and_serde() {
        let event = WsEvent::PostCreated {
            post_id: Uuid::from_u128(1),
            author_id: Uuid::from_u128(2),
            title: "gm".to_string(),
        };
        assert!(event.target_user().is_none());
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"post_created\""));

        let notif = WsEvent::Notification {
            user_id: Uuid::from_u128(7),
            notification: Notification {
                id: Uuid::from_u128(8),
                user_id: Uuid::from_u128(7),
                title: "t".to_string(),
                message: "m".to_string(),
                kind: NotificationKind::LikeReceived,
                is_read: false,
                related_id: None,
                created_at: 0,
            },
        };
        assert_eq!(notif.target_user(), Some(Uuid::from_u128(7)));
    }

    #[test]
    fn test_api_response_error_shape() {
        let resp = ApiResponse::<()>::error("A001", "Invalid credentials");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error_code"], "A001");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!(Role::from("admin"), Role::Admin);
        assert_eq!(Role::from("garbage"), Role::User);
        assert!(Role::Moderator.is_staff());
        assert!(!Role::User.is_staff());
    }
}
