//! Top-level message properties.

use crate::model::message::Message;
use crate::model::recipient::RecipientKind;
use crate::property::tag::*;
use crate::property::PropertySet;

use super::BuildOptions;

const MSGFLAG_READ: i32 = 0x0000_0001;
const MSGFLAG_HASATTACH: i32 = 0x0000_0010;

/// Build the message root's property set.
///
/// Reads the recipient and attachment collections for display lists and
/// flags but does not consume them.
pub fn message_properties(message: &Message, options: &BuildOptions) -> PropertySet {
    let has_attachments = !message.attachments.is_empty();
    let sent = message.sent_time.unwrap_or(options.now);

    let mut flags = MSGFLAG_READ;
    if has_attachments {
        flags |= MSGFLAG_HASATTACH;
    }

    let mut set = PropertySet::new();
    set.push(PR_MESSAGE_CLASS, options.message_class.as_str());
    set.push(PR_SUBJECT, message.subject.as_str());
    set.push(PR_CONVERSATION_TOPIC, message.subject.as_str());
    set.push(PR_BODY, message.body.as_str());
    if let Some(html) = &message.html_body {
        set.push(PR_BODY_HTML, html.as_bytes().to_vec());
    }
    if let Some(sender) = &message.sender {
        let name = if sender.display_name.is_empty() {
            sender.email.as_str()
        } else {
            sender.display_name.as_str()
        };
        set.push(PR_SENDER_NAME, name);
        set.push(PR_SENDER_EMAIL_ADDRESS, sender.email.as_str());
        set.push(PR_SENDER_ADDRTYPE, "SMTP");
        set.push(PR_SENT_REPRESENTING_NAME, name);
        set.push(PR_SENT_REPRESENTING_EMAIL_ADDRESS, sender.email.as_str());
    }
    if let Some(id) = &message.message_id {
        set.push(PR_INTERNET_MESSAGE_ID, id.as_str());
    }
    set.push(PR_DISPLAY_TO, message.recipients.display_list(RecipientKind::To));
    set.push(PR_DISPLAY_CC, message.recipients.display_list(RecipientKind::Cc));
    set.push(PR_DISPLAY_BCC, message.recipients.display_list(RecipientKind::Bcc));
    set.push(PR_CLIENT_SUBMIT_TIME, sent);
    set.push(PR_MESSAGE_DELIVERY_TIME, sent);
    set.push(PR_CREATION_TIME, options.now);
    set.push(PR_LAST_MODIFICATION_TIME, options.now);
    set.push(PR_IMPORTANCE, message.importance.code());
    set.push(PR_MESSAGE_FLAGS, flags);
    set.push(PR_HASATTACH, has_attachments);
    set.push(PR_STORE_SUPPORT_MASK, options.store_support_mask);
    set.push(PR_INTERNET_CPID, options.internet_code_page);
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::PropValue;
    use chrono::{TimeZone, Utc};
    use std::io::Cursor;

    fn options() -> BuildOptions {
        BuildOptions::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_minimal_message() {
        let msg = Message::new("Hello");
        let set = message_properties(&msg, &options());
        assert_eq!(
            set.get(PR_MESSAGE_CLASS),
            Some(&PropValue::String("IPM.Note".into()))
        );
        assert_eq!(set.get(PR_SUBJECT), Some(&PropValue::String("Hello".into())));
        assert_eq!(set.get(PR_HASATTACH), Some(&PropValue::Boolean(false)));
        assert_eq!(set.get(PR_MESSAGE_FLAGS), Some(&PropValue::Long(MSGFLAG_READ)));
        assert!(set.get(PR_SENDER_NAME).is_none());
        assert!(set.get(PR_BODY_HTML).is_none());
    }

    #[test]
    fn test_full_message() {
        let mut msg = Message::new("Quarterly")
            .with_sender("boss@example.com", "The Boss")
            .with_body("See attached.")
            .with_html_body("<p>See attached.</p>");
        msg.recipients
            .add("a@example.com", "Alice", RecipientKind::To)
            .unwrap();
        msg.recipients
            .add("c@example.com", "Carol", RecipientKind::Cc)
            .unwrap();
        msg.attachments
            .add(Cursor::new(vec![1u8]), "q.pdf", false, None)
            .unwrap();

        let set = message_properties(&msg, &options());
        assert_eq!(set.get(PR_DISPLAY_TO), Some(&PropValue::String("Alice".into())));
        assert_eq!(set.get(PR_DISPLAY_CC), Some(&PropValue::String("Carol".into())));
        assert_eq!(set.get(PR_HASATTACH), Some(&PropValue::Boolean(true)));
        assert_eq!(
            set.get(PR_MESSAGE_FLAGS),
            Some(&PropValue::Long(MSGFLAG_READ | MSGFLAG_HASATTACH))
        );
        assert_eq!(
            set.get(PR_SENDER_NAME),
            Some(&PropValue::String("The Boss".into()))
        );
        assert_eq!(
            set.get(PR_BODY_HTML),
            Some(&PropValue::Binary(b"<p>See attached.</p>".to_vec()))
        );
    }

    #[test]
    fn test_sent_time_defaults_to_build_time() {
        let opts = options();
        let msg = Message::new("x");
        let set = message_properties(&msg, &opts);
        assert_eq!(set.get(PR_CLIENT_SUBMIT_TIME), Some(&PropValue::Time(opts.now)));

        let mut msg = Message::new("x");
        let sent = Utc.with_ymd_and_hms(2019, 6, 1, 8, 0, 0).unwrap();
        msg.sent_time = Some(sent);
        let set = message_properties(&msg, &opts);
        assert_eq!(set.get(PR_CLIENT_SUBMIT_TIME), Some(&PropValue::Time(sent)));
        assert_eq!(set.get(PR_CREATION_TIME), Some(&PropValue::Time(opts.now)));
    }
}
