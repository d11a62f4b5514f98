//! Typed HTTP client for the community platform

use crate::error::ClientError;
use crate::types::*;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

pub struct CommunityClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl CommunityClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Use a token obtained elsewhere instead of calling `login`
    pub fn set_token(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut req = self.http.request(method, self.url(path));
        if let Some(ref token) = self.token {
            req = req.bearer_auth(token);
        }
        req
    }

    /// Unwrap the response envelope; a `success: false` body becomes
    /// `ClientError::Api` with the server's code and message.
    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let envelope: ApiResponse<T> = req.send().await?.json().await?;
        if !envelope.success {
            return Err(ClientError::Api {
                code: envelope.error_code.unwrap_or_else(|| "C002".to_string()),
                message: envelope
                    .message
                    .unwrap_or_else(|| "Unknown error".to_string()),
            });
        }
        envelope
            .data
            .ok_or_else(|| ClientError::InvalidResponse("missing data field".to_string()))
    }

    /// Like `send`, for endpoints that answer with a message and no data
    async fn send_empty(&self, req: RequestBuilder) -> Result<(), ClientError> {
        let envelope: ApiResponse<serde_json::Value> = req.send().await?.json().await?;
        if !envelope.success {
            return Err(ClientError::Api {
                code: envelope.error_code.unwrap_or_else(|| "C002".to_string()),
                message: envelope
                    .message
                    .unwrap_or_else(|| "Unknown error".to_string()),
            });
        }
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send(self.request(Method::GET, path)).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.send(self.request(Method::PUT, path).json(body)).await
    }

    // ------------------------------------------------------------------
    // Auth
    // ------------------------------------------------------------------

    /// Register a new account; the returned tokens are stored on the client
    pub async fn register(&mut self, req: &RegisterRequest) -> Result<LoginResponse, ClientError> {
        let resp: LoginResponse = self.post("/api/v1/auth/register", req).await?;
        self.token = Some(resp.access_token.clone());
        Ok(resp)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let req = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let resp: LoginResponse = self.post("/api/v1/auth/login", &req).await?;
        self.token = Some(resp.access_token.clone());
        Ok(resp)
    }

    pub async fn refresh(&mut self, refresh_token: &str) -> Result<LoginResponse, ClientError> {
        let body = serde_json::json!({ "refresh_token": refresh_token });
        let resp: LoginResponse = self.post("/api/v1/auth/refresh", &body).await?;
        self.token = Some(resp.access_token.clone());
        Ok(resp)
    }

    pub async fn logout(&mut self) -> Result<(), ClientError> {
        if self.token.is_none() {
            return Err(ClientError::NotAuthenticated);
        }
        self.send_empty(self.request(Method::POST, "/api/v1/auth/logout"))
            .await?;
        self.token = None;
        Ok(())
    }

    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ClientError> {
        let body = serde_json::json!({
            "current_password": current_password,
            "new_password": new_password,
        });
        self.send_empty(self.request(Method::PUT, "/api/v1/auth/password").json(&body))
            .await
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    pub async fn me(&self) -> Result<UserResponse, ClientError> {
        self.get("/api/v1/users/me").await
    }

    pub async fn update_me(&self, req: &UpdateUserRequest) -> Result<UserResponse, ClientError> {
        self.put("/api/v1/users/me", req).await
    }

    pub async fn get_user(&self, id: Uuid) -> Result<UserResponse, ClientError> {
        self.get(&format!("/api/v1/users/{}", id)).await
    }

    pub async fn list_users(
        &self,
        page: i64,
        limit: i64,
    ) -> Result<Page<UserResponse>, ClientError> {
        self.get(&format!("/api/v1/users?page={}&limit={}", page, limit))
            .await
    }

    // ------------------------------------------------------------------
    // Posts
    // ------------------------------------------------------------------

    pub async fn create_post(&self, req: &CreatePostRequest) -> Result<Post, ClientError> {
        self.post("/api/v1/posts", req).await
    }

    pub async fn get_post(&self, id: Uuid) -> Result<Post, ClientError> {
        self.get(&format!("/api/v1/posts/{}", id)).await
    }

    pub async fn list_posts(&self, query: &ListPostsQuery) -> Result<Page<Post>, ClientError> {
        let req = self
            .request(Method::GET, "/api/v1/posts")
            .query(&query.to_query());
        self.send(req).await
    }

    pub async fn update_post(
        &self,
        id: Uuid,
        req: &UpdatePostRequest,
    ) -> Result<Post, ClientError> {
        self.put(&format!("/api/v1/posts/{}", id), req).await
    }

    pub async fn delete_post(&self, id: Uuid) -> Result<(), ClientError> {
        self.send_empty(self.request(Method::DELETE, &format!("/api/v1/posts/{}", id)))
            .await
    }

    pub async fn like_post(&self, id: Uuid) -> Result<LikeResponse, ClientError> {
        self.send(self.request(Method::POST, &format!("/api/v1/posts/{}/like", id)))
            .await
    }

    // ------------------------------------------------------------------
    // Comments
    // ------------------------------------------------------------------

    pub async fn create_comment(
        &self,
        req: &CreateCommentRequest,
    ) -> Result<CommentResponse, ClientError> {
        self.post("/api/v1/comments", req).await
    }

    /// Comments for a post, already assembled into a thread tree
    pub async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentResponse>, ClientError> {
        self.get(&format!("/api/v1/posts/{}/comments", post_id))
            .await
    }

    pub async fn count_comments(&self, post_id: Uuid) -> Result<i64, ClientError> {
        self.get(&format!("/api/v1/posts/{}/comments/count", post_id))
            .await
    }

    pub async fn update_comment(
        &self,
        id: Uuid,
        content: &str,
    ) -> Result<CommentResponse, ClientError> {
        let body = serde_json::json!({ "content": content });
        self.put(&format!("/api/v1/comments/{}", id), &body).await
    }

    pub async fn delete_comment(&self, id: Uuid) -> Result<(), ClientError> {
        self.send_empty(self.request(Method::DELETE, &format!("/api/v1/comments/{}", id)))
            .await
    }

    pub async fn like_comment(&self, id: Uuid) -> Result<LikeResponse, ClientError> {
        self.send(self.request(Method::POST, &format!("/api/v1/comments/{}/like", id)))
            .await
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    pub async fn notifications(&self) -> Result<Vec<Notification>, ClientError> {
        self.get("/api/v1/notifications").await
    }

    pub async fn unread_notifications(&self) -> Result<Vec<Notification>, ClientError> {
        self.get("/api/v1/notifications/unread").await
    }

    pub async fn unread_count(&self) -> Result<UnreadCountResponse, ClientError> {
        self.get("/api/v1/notifications/unread/count").await
    }

    pub async fn mark_notification_read(&self, id: Uuid) -> Result<Notification, ClientError> {
        self.send(self.request(Method::PUT, &format!("/api/v1/notifications/{}/read", id)))
            .await
    }

    pub async fn mark_all_notifications_read(&self) -> Result<(), ClientError> {
        self.send_empty(self.request(Method::PUT, "/api/v1/notifications/read-all"))
            .await
    }

    // ------------------------------------------------------------------
    // Analytics
    // ------------------------------------------------------------------

    pub async fn track_event(&self, req: &TrackEventRequest) -> Result<(), ClientError> {
        self.send_empty(self.request(Method::POST, "/api/v1/analytics/events").json(req))
            .await
    }

    pub async fn dashboard(&self) -> Result<DashboardResponse, ClientError> {
        self.get("/api/v1/analytics/dashboard").await
    }

    pub async fn my_analytics(&self) -> Result<UserAnalyticsResponse, ClientError> {
        self.get("/api/v1/analytics/me").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let client = CommunityClient::new("http://localhost:8080/");
        assert_eq!(client.url("/health"), "http://localhost:8080/health");
    }

    #[test]
    fn test_list_posts_query_serialization() {
        let query = ListPostsQuery {
            page: Some(2),
            search: Some("defi".to_string()),
            ..Default::default()
        };
        let q = query.to_query();
        assert_eq!(q.len(), 2);
        assert!(q.contains(&("page", "2".to_string())));
        assert!(q.contains(&("search", "defi".to_string())));
    }

    #[test]
    fn test_envelope_error_parsing() {
        let json = r#"{
            "success": false,
            "message": "Invalid credentials",
            "error_code": "A001",
            "timestamp": 1700000000000
        }"#;
        let envelope: ApiResponse<LoginResponse> = serde_json::from_str(json).unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.error_code.as_deref(), Some("A001"));
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_envelope_data_parsing() {
        let json = r#"{
            "success": true,
            "data": { "unread_count": 3 },
            "timestamp": 1700000000000
        }"#;
        let envelope: ApiResponse<UnreadCountResponse> = serde_json::from_str(json).unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.data.unwrap().unread_count, 3);
    }
}
