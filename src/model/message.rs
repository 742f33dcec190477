//! The top-level message.

use chrono::{DateTime, Utc};

use super::attachment::Attachments;
use super::recipient::Recipients;

/// `PR_IMPORTANCE` levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Importance {
    Low,
    #[default]
    Normal,
    High,
}

impl Importance {
    pub const fn code(self) -> i32 {
        match self {
            Importance::Low => 0,
            Importance::Normal => 1,
            Importance::High => 2,
        }
    }
}

/// Sender of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub display_name: String,
    pub email: String,
}

/// An email message ready to be written as `.msg`.
///
/// Recipients and attachments are validated as they are added, so a
/// `Message` is always in a writable state.
#[derive(Debug, Default)]
pub struct Message {
    pub subject: String,
    pub sender: Option<Sender>,
    /// Plain-text body.
    pub body: String,
    /// HTML body, written alongside the plain text when present.
    pub html_body: Option<String>,
    /// The `Message-ID` header value.
    pub message_id: Option<String>,
    pub importance: Importance,
    /// When the message was sent. Defaults to the build time.
    pub sent_time: Option<DateTime<Utc>>,
    pub recipients: Recipients,
    pub attachments: Attachments,
}

impl Message {
    pub fn new(subject: &str) -> Self {
        Self {
            subject: subject.to_string(),
            ..Self::default()
        }
    }

    pub fn with_sender(mut self, email: &str, display_name: &str) -> Self {
        self.sender = Some(Sender {
            display_name: display_name.to_string(),
            email: email.to_string(),
        });
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    pub fn with_html_body(mut self, html: &str) -> Self {
        self.html_body = Some(html.to_string());
        self
    }
}
