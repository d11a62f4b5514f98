//! Observability - Sentry integration, audit trail, Prometheus metrics
//!
//! Provides:
//! - Sentry error tracking (enabled via SENTRY_DSN env var)
//! - Structured audit logging persisted to the audit_events table
//! - Prometheus request metrics exposed at /metrics

use crate::db::queries;
use crate::state::AppState;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, span, warn, Level};

/// Initialize Sentry if SENTRY_DSN is set
pub fn init_sentry() -> Option<sentry::ClientInitGuard> {
    let dsn = std::env::var("SENTRY_DSN").ok()?;

    if dsn.is_empty() {
        info!("Sentry DSN is empty, error tracking disabled");
        return None;
    }

    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: std::env::var("ENVIRONMENT").ok().map(|s| s.into()),
            traces_sample_rate: 0.1,
            ..Default::default()
        },
    ));

    info!("Sentry initialized for error tracking");
    Some(guard)
}

// ============================================================================
// PROMETHEUS METRICS
// ============================================================================

/// HTTP request metrics, recorded by the metrics middleware
#[derive(Clone)]
pub struct HttpMetrics {
    registry: Registry,
    pub requests_total: IntCounterVec,
    pub request_duration_seconds: HistogramVec,
}

impl HttpMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests handled"),
            &["method", "path", "status"],
        )
        .expect("metric definition");
        let request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request latency in seconds",
            ),
            &["method", "path"],
        )
        .expect("metric definition");

        registry
            .register(Box::new(requests_total.clone()))
            .expect("metric registration");
        registry
            .register(Box::new(request_duration_seconds.clone()))
            .expect("metric registration");

        Self {
            registry,
            requests_total,
            request_duration_seconds,
        }
    }

    /// Render the registry in Prometheus text exposition format
    pub fn encode(&self) -> String {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buf) {
            error!("Failed to encode metrics: {}", e);
            return String::new();
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}

impl Default for HttpMetrics {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// AUDIT TRAIL
// ============================================================================

/// Audit event types for the data-access trail
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    // Authentication
    AuthSuccess,
    AuthFailed,
    TokenRefreshed,
    LoggedOut,
    PasswordChanged,

    // Users
    UserRegistered,
    UserUpdated,
    UserDeactivated,
    RoleChanged,

    // Content
    PostCreated,
    PostUpdated,
    PostDeleted,
    CommentCreated,
    CommentUpdated,
    CommentDeleted,

    // Notifications
    NotificationSent,

    // Security
    RateLimitExceeded,
    UnauthorizedAccess,
}

impl std::fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_string(self).unwrap_or_else(|_| "unknown".to_string());
        write!(f, "{}", s.trim_matches('"'))
    }
}

/// Structured audit entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub event_type: AuditEventType,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub actor_id: Option<String>,
    pub payload: Option<serde_json::Value>,
    pub success: bool,
    pub error_message: Option<String>,
}

impl AuditEntry {
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            event_type,
            entity_type: None,
            entity_id: None,
            actor_id: None,
            payload: None,
            success: true,
            error_message: None,
        }
    }

    pub fn entity(mut self, entity_type: &str, entity_id: &str) -> Self {
        self.entity_type = Some(entity_type.to_string());
        self.entity_id = Some(entity_id.to_string());
        self
    }

    pub fn actor(mut self, actor_id: &str) -> Self {
        self.actor_id = Some(actor_id.to_string());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn failed(mut self, error: &str) -> Self {
        self.success = false;
        self.error_message = Some(error.to_string());
        self
    }
}

/// Audit logger for structured logging and persistence
pub struct AuditLogger;

impl AuditLogger {
    /// Log an audit event to both tracing and the database
    pub async fn log(state: &AppState, entry: AuditEntry) {
        let span = span!(
            Level::INFO,
            "audit",
            event_type = %entry.event_type,
            entity_type = ?entry.entity_type,
            entity_id = ?entry.entity_id,
            actor = ?entry.actor_id,
            success = entry.success,
        );
        let _guard = span.enter();

        if entry.success {
            info!(
                event = %entry.event_type,
                entity = ?entry.entity_id,
                actor = ?entry.actor_id,
                "Audit event"
            );
        } else {
            warn!(
                event = %entry.event_type,
                entity = ?entry.entity_id,
                actor = ?entry.actor_id,
                error = ?entry.error_message,
                "Audit event failed"
            );

            if let Some(ref msg) = entry.error_message {
                sentry::capture_message(
                    &format!("{}: {}", entry.event_type, msg),
                    sentry::Level::Warning,
                );
            }
        }

        if let Err(e) = queries::log_audit_event(
            &state.db,
            &entry.event_type.to_string(),
            entry.entity_type.as_deref(),
            entry.entity_id.as_deref(),
            entry.payload.as_ref(),
            entry.actor_id.as_deref(),
        )
        .await
        {
            error!(error = %e, "Failed to persist audit event");
        }
    }

    /// Log an authentication event
    pub async fn auth(state: &AppState, email: &str, success: bool, error: Option<&str>) {
        let mut entry = AuditEntry::new(if success {
            AuditEventType::AuthSuccess
        } else {
            AuditEventType::AuthFailed
        })
        .actor(email);

        if let Some(e) = error {
            entry = entry.failed(e);
        }

        Self::log(state, entry).await;
    }

    /// Log a content lifecycle event (posts, comments)
    pub async fn content(
        state: &AppState,
        event: AuditEventType,
        entity_type: &str,
        entity_id: &str,
        actor_id: &str,
    ) {
        let entry = AuditEntry::new(event)
            .entity(entity_type, entity_id)
            .actor(actor_id);
        Self::log(state, entry).await;
    }

    /// Log a security event; always reported to Sentry
    pub async fn security(state: &AppState, event: AuditEventType, actor: &str, details: &str) {
        let event_str = event.to_string();
        let entry = AuditEntry::new(event).actor(actor).failed(details);
        Self::log(state, entry).await;

        sentry::capture_message(
            &format!("Security event: {} - {} - {}", event_str, actor, details),
            sentry::Level::Warning,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_entry_builder() {
        let entry = AuditEntry::new(AuditEventType::PostCreated)
            .entity("post", "post-123")
            .actor("user-9")
            .with_payload(serde_json::json!({"title": "gm"}));

        assert!(entry.success);
        assert_eq!(entry.entity_id, Some("post-123".to_string()));
        assert_eq!(entry.actor_id, Some("user-9".to_string()));
    }

    #[test]
    fn test_audit_entry_failed() {
        let entry = AuditEntry::new(AuditEventType::AuthFailed)
            .actor("alice@example.com")
            .failed("Invalid credentials");

        assert!(!entry.success);
        assert_eq!(
            entry.error_message,
            Some("Invalid credentials".to_string())
        );
    }

    #[test]
    fn test_event_type_display_is_snake_case() {
        assert_eq!(AuditEventType::RateLimitExceeded.to_string(), "rate_limit_exceeded");
        assert_eq!(AuditEventType::PostCreated.to_string(), "post_created");
    }

    #[test]
    fn test_metrics_encode() {
        let metrics = HttpMetrics::new();
        metrics
            .requests_total
            .with_label_values(&["GET", "/health", "200"])
            .inc();
        let text = metrics.encode();
        assert!(text.contains("http_requests_total"));
    }
}
