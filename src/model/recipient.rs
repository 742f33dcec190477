//! Message recipients.

use crate::error::{MsgError, Result};

/// Which header line a recipient belongs to (`PR_RECIPIENT_TYPE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipientKind {
    To,
    Cc,
    Bcc,
}

impl RecipientKind {
    pub const fn code(self) -> i32 {
        match self {
            RecipientKind::To => 1,
            RecipientKind::Cc => 2,
            RecipientKind::Bcc => 3,
        }
    }
}

/// A single recipient. Only built through [`Recipient::new`] or the
/// parsers, so the address is never empty.
///
/// # Examples
/// - `"Ana Pérez <ana@example.com>"` → display name `"Ana Pérez"`, address `"ana@example.com"`
/// - `"bob@example.com"` → display name `""`, address `"bob@example.com"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    display_name: String,
    email: String,
    kind: RecipientKind,
}

impl Recipient {
    /// Create a recipient; the address must be non-empty.
    pub fn new(email: &str, display_name: &str, kind: RecipientKind) -> Result<Self> {
        let email = email.trim();
        if email.is_empty() {
            return Err(MsgError::InvalidRecipient(format!(
                "empty address (display name '{display_name}')"
            )));
        }
        Ok(Self {
            display_name: display_name.trim().to_string(),
            email: email.to_string(),
            kind,
        })
    }

    /// Parse `"Name <addr>"`, `"<addr>"` or a bare address.
    pub fn parse(raw: &str, kind: RecipientKind) -> Result<Self> {
        let trimmed = raw.trim();
        match (trimmed.rfind('<'), trimmed.rfind('>')) {
            (Some(open), Some(close)) if close > open => {
                let name = trimmed[..open].trim().trim_matches('"').trim();
                Self::new(&trimmed[open + 1..close], name, kind)
            }
            _ => Self::new(trimmed, "", kind),
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn kind(&self) -> RecipientKind {
        self.kind
    }

    /// Parse a comma-separated list, honouring quoted commas.
    pub fn parse_list(raw: &str, kind: RecipientKind) -> Result<Vec<Self>> {
        let mut out = Vec::new();
        let mut start = 0;
        let mut in_quotes = false;
        let mut in_angle = false;
        for (i, ch) in raw.char_indices() {
            match ch {
                '"' => in_quotes = !in_quotes,
                '<' if !in_quotes => in_angle = true,
                '>' if !in_quotes => in_angle = false,
                ',' if !in_quotes && !in_angle => {
                    if !raw[start..i].trim().is_empty() {
                        out.push(Self::parse(&raw[start..i], kind)?);
                    }
                    start = i + 1;
                }
                _ => {}
            }
        }
        if in_quotes {
            return Err(MsgError::InvalidRecipient(format!(
                "unterminated quote in '{}'",
                raw[start..].trim()
            )));
        }
        if !raw[start..].trim().is_empty() {
            out.push(Self::parse(&raw[start..], kind)?);
        }
        Ok(out)
    }

    /// Name shown in display lists; falls back to the address.
    pub fn shown_name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.email
        } else {
            &self.display_name
        }
    }
}

/// Ordered recipients. Insertion order is the storage index order.
#[derive(Debug, Clone, Default)]
pub struct Recipients {
    items: Vec<Recipient>,
}

impl Recipients {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, email: &str, display_name: &str, kind: RecipientKind) -> Result<()> {
        self.push(Recipient::new(email, display_name, kind)?);
        Ok(())
    }

    pub fn push(&mut self, recipient: Recipient) {
        self.items.push(recipient);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recipient> {
        self.items.iter()
    }

    /// `"; "`-joined names of every recipient of `kind`, as Outlook shows them.
    pub fn display_list(&self, kind: RecipientKind) -> String {
        self.items
            .iter()
            .filter(|r| r.kind == kind)
            .map(Recipient::shown_name)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl IntoIterator for Recipients {
    type Item = Recipient;
    type IntoIter = std::vec::IntoIter<Recipient>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
