//! crates/study_client/src/toast.rs
//!
//! Transient notifications that expire on their own.

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

/// How long each kind of toast stays visible.
#[derive(Debug, Clone, Copy)]
pub struct ToastTimeouts {
    pub success: Duration,
    pub error: Duration,
    pub info: Duration,
}

impl Default for ToastTimeouts {
    fn default() -> Self {
        Self {
            success: Duration::seconds(3),
            error: Duration::seconds(5),
            info: Duration::seconds(3),
        }
    }
}

impl ToastTimeouts {
    fn for_kind(&self, kind: ToastKind) -> Duration {
        match kind {
            ToastKind::Success => self.success,
            ToastKind::Error => self.error,
            ToastKind::Info => self.info,
        }
    }
}

#[derive(Debug, Default)]
pub struct ToastCenter {
    timeouts: ToastTimeouts,
    next_id: u64,
    toasts: Vec<Toast>,
}

impl ToastCenter {
    pub fn new(timeouts: ToastTimeouts) -> Self {
        Self {
            timeouts,
            next_id: 0,
            toasts: Vec::new(),
        }
    }

    pub fn push(&mut self, kind: ToastKind, message: impl Into<String>, now: DateTime<Utc>) -> u64 {
        self.next_id += 1;
        self.toasts.push(Toast {
            id: self.next_id,
            kind,
            message: message.into(),
            expires_at: now + self.timeouts.for_kind(kind),
        });
        self.next_id
    }

    pub fn success(&mut self, message: impl Into<String>, now: DateTime<Utc>) -> u64 {
        self.push(ToastKind::Success, message, now)
    }

    pub fn error(&mut self, message: impl Into<String>, now: DateTime<Utc>) -> u64 {
        self.push(ToastKind::Error, message, now)
    }

    pub fn info(&mut self, message: impl Into<String>, now: DateTime<Utc>) -> u64 {
        self.push(ToastKind::Info, message, now)
    }

    /// Removes a toast early. Returns false if it was already gone.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.id != id);
        self.toasts.len() != before
    }

    /// Drops expired toasts and returns the rest, oldest first.
    pub fn active(&mut self, now: DateTime<Utc>) -> &[Toast] {
        self.toasts.retain(|t| t.expires_at > now);
        &self.toasts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toasts_expire_by_kind() {
        let t0 = Utc::now();
        let mut center = ToastCenter::default();
        center.success("Saved", t0);
        center.error("Upload failed", t0);

        assert_eq!(center.active(t0 + Duration::seconds(2)).len(), 2);
        let remaining = center.active(t0 + Duration::seconds(3));
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].kind, ToastKind::Error);
        assert!(center.active(t0 + Duration::seconds(5)).is_empty());
    }

    #[test]
    fn test_dismiss_before_expiry() {
        let t0 = Utc::now();
        let mut center = ToastCenter::new(ToastTimeouts {
            info: Duration::seconds(60),
            ..Default::default()
        });
        let id = center.info("Generating quiz...", t0);
        assert!(center.dismiss(id));
        assert!(!center.dismiss(id));
        assert!(center.active(t0).is_empty());
    }
}
