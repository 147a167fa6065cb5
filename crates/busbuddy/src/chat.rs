//! Route chat.
//!
//! An append-only message log shared by the driver and parents of a route.
//! Messages stay local; nothing is delivered anywhere.

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::navigation::Role;

/// Sender name used for driver messages.
pub const TEACHER_SENDER: &str = "Teacher";

/// Canned replies offered to the driver.
const DRIVER_QUICK_REPLIES: [&str; 3] = [
    "Traffic jam - 10m delay 🚦",
    "Arrival in 5 mins! 🚌",
    "Route changed 🚧",
];

/// Canned replies offered to everyone else.
const PARENT_QUICK_REPLIES: [&str; 3] = [
    "My child is sick 🤒",
    "Running late! 🏃",
    "Thank you! 🙏",
];

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Creation time in Unix milliseconds, bumped to stay strictly increasing.
    pub id: i64,
    /// Display name of the author.
    pub sender: String,
    /// Message body.
    pub text: String,
    /// Wall-clock time the message was sent, e.g. `08:15 AM`.
    pub time: String,
    /// Set for messages from the driver, which go to every parent.
    pub is_broadcast: bool,
}

/// Quick replies for a role, in display order.
#[must_use]
pub fn quick_replies(role: Role) -> &'static [&'static str] {
    if role == Role::Driver {
        &DRIVER_QUICK_REPLIES
    } else {
        &PARENT_QUICK_REPLIES
    }
}

/// Whether `message` was written by someone in `role`.
#[must_use]
pub fn is_mine(message: &Message, role: Role) -> bool {
    let marker = if role == Role::Driver {
        TEACHER_SENDER
    } else {
        "Parent"
    };
    message.sender.contains(marker)
}

/// Format a timestamp the way messages show it.
#[must_use]
pub fn format_clock<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%I:%M %p").to_string()
}

/// Ordered, append-only list of messages.
#[derive(Debug, Clone)]
pub struct MessageLog {
    messages: Vec<Message>,
    parent_name: String,
    last_id: i64,
}

impl MessageLog {
    /// Create an empty log.
    #[must_use]
    pub fn new(parent_name: impl Into<String>) -> Self {
        Self {
            messages: Vec::new(),
            parent_name: parent_name.into(),
            last_id: 0,
        }
    }

    /// Create a log holding the two greeting messages.
    #[must_use]
    pub fn seeded(parent_name: impl Into<String>) -> Self {
        let parent_name = parent_name.into();
        let messages = vec![
            Message {
                id: 1,
                sender: TEACHER_SENDER.to_string(),
                text: "Good morning! Bus is departing on time.".to_string(),
                time: "08:00 AM".to_string(),
                is_broadcast: true,
            },
            Message {
                id: 2,
                sender: parent_name.clone(),
                text: "Emily will be at the stop 2 mins late.".to_string(),
                time: "08:15 AM".to_string(),
                is_broadcast: false,
            },
        ];
        Self {
            messages,
            parent_name,
            last_id: 2,
        }
    }

    /// Send a message as `role`, stamped with the current time.
    ///
    /// Blank text is ignored and yields `None`.
    pub fn send(&mut self, text: &str, role: Role) -> Option<&Message> {
        self.send_at(text, role, Local::now())
    }

    /// Send a message as `role`, stamped with `at`.
    pub fn send_at<Tz: TimeZone>(
        &mut self,
        text: &str,
        role: Role,
        at: DateTime<Tz>,
    ) -> Option<&Message>
    where
        Tz::Offset: std::fmt::Display,
    {
        if text.trim().is_empty() {
            return None;
        }

        let id = at.timestamp_millis().max(self.last_id + 1);
        self.last_id = id;

        let is_broadcast = role == Role::Driver;
        let sender = if is_broadcast {
            TEACHER_SENDER.to_string()
        } else {
            self.parent_name.clone()
        };

        debug!(id, sender = %sender, is_broadcast, "message appended");
        self.messages.push(Message {
            id,
            sender,
            text: text.to_string(),
            time: format_clock(&at),
            is_broadcast,
        });
        self.messages.last()
    }

    /// Send the `index`-th quick reply for `role`.
    ///
    /// Out-of-range indices are ignored.
    pub fn send_quick_reply(&mut self, index: usize, role: Role) -> Option<&Message> {
        let text = quick_replies(role).get(index)?;
        self.send(text, role)
    }

    /// All messages in the order they were sent.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The most recent message.
    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 14, 5, 0).unwrap()
    }

    #[test]
    fn test_seeded_log() {
        let log = MessageLog::seeded("Parent (Emily)");
        assert_eq!(log.len(), 2);
        assert!(log.messages()[0].is_broadcast);
        assert_eq!(log.messages()[0].sender, "Teacher");
        assert!(!log.messages()[1].is_broadcast);
    }

    #[test]
    fn test_driver_message_is_broadcast() {
        let mut log = MessageLog::new("Parent (Emily)");
        let msg = log.send_at("Leaving now", Role::Driver, fixed_time()).unwrap();

        assert!(msg.is_broadcast);
        assert_eq!(msg.sender, "Teacher");
    }

    #[test]
    fn test_non_driver_message_is_not_broadcast() {
        for role in [Role::Parent, Role::Admin] {
            let mut log = MessageLog::new("Parent (Emily)");
            let msg = log.send_at("Hello", role, fixed_time()).unwrap();

            assert!(!msg.is_broadcast);
            assert_eq!(msg.sender, "Parent (Emily)");
        }
    }

    #[test]
    fn test_blank_text_is_ignored() {
        let mut log = MessageLog::seeded("Parent (Emily)");
        assert!(log.send("", Role::Parent).is_none());
        assert!(log.send("   ", Role::Driver).is_none());
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_text_is_kept_as_typed() {
        let mut log = MessageLog::new("P");
        let msg = log.send_at("  on my way ", Role::Parent, fixed_time()).unwrap();
        assert_eq!(msg.text, "  on my way ");
    }

    #[test]
    fn test_time_format() {
        let mut log = MessageLog::new("P");
        let msg = log.send_at("hi", Role::Parent, fixed_time()).unwrap();
        assert_eq!(msg.time, "02:05 PM");
    }

    #[test]
    fn test_ids_strictly_increase_within_same_millisecond() {
        let mut log = MessageLog::new("P");
        let at = fixed_time();
        let first = log.send_at("a", Role::Parent, at).unwrap().id;
        let second = log.send_at("b", Role::Parent, at).unwrap().id;
        let third = log.send_at("c", Role::Parent, at).unwrap().id;

        assert_eq!(first, at.timestamp_millis());
        assert_eq!(second, first + 1);
        assert_eq!(third, second + 1);
    }

    #[test]
    fn test_insertion_order_kept() {
        let mut log = MessageLog::new("P");
        log.send("one", Role::Parent);
        log.send("two", Role::Driver);
        log.send("one", Role::Parent);

        let texts: Vec<&str> = log.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two", "one"]);
    }

    #[test]
    fn test_quick_replies_differ_by_role() {
        assert_eq!(quick_replies(Role::Driver)[1], "Arrival in 5 mins! 🚌");
        assert_eq!(quick_replies(Role::Parent)[1], "Running late! 🏃");
        assert_eq!(quick_replies(Role::Admin), quick_replies(Role::Parent));
    }

    #[test]
    fn test_send_quick_reply() {
        let mut log = MessageLog::new("P");
        let msg = log.send_quick_reply(0, Role::Driver).unwrap();
        assert_eq!(msg.text, "Traffic jam - 10m delay 🚦");

        assert!(log.send_quick_reply(3, Role::Driver).is_none());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_is_mine() {
        let log = MessageLog::seeded("Parent (Emily)");
        let teacher = &log.messages()[0];
        let parent = &log.messages()[1];

        assert!(is_mine(teacher, Role::Driver));
        assert!(!is_mine(parent, Role::Driver));
        assert!(is_mine(parent, Role::Parent));
        assert!(!is_mine(teacher, Role::Parent));
    }

    #[test]
    fn test_message_json_field_names() {
        let log = MessageLog::seeded("P");
        let json = serde_json::to_string(&log.messages()[0]).unwrap();
        assert!(json.contains("\"isBroadcast\":true"));
    }
}
