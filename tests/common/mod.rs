//! Common test utilities and helpers

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use rapport_core::{ContextAssembler, JsonFileStore, Message, RapportConfig};
use tempfile::TempDir;

/// Fixed reference time (a Monday, inside business hours)
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 6, 11, 0, 0).unwrap()
}

/// Message from a contact at `t0() + offset`
pub fn inbound(contact: &str, body: &str, offset: Duration) -> Message {
    Message::new(contact, contact, body, t0() + offset)
}

/// Message written by the local user in a contact's chat
pub fn outbound(contact: &str, body: &str, offset: Duration) -> Message {
    Message::new(contact, "me", body, t0() + offset).from_self()
}

pub fn create_test_assembler() -> ContextAssembler {
    ContextAssembler::new(RapportConfig::default())
}

/// JSON store rooted in a fresh temporary directory
///
/// The directory is removed when the returned guard is dropped.
pub fn create_test_store() -> (TempDir, JsonFileStore) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = JsonFileStore::open(dir.path().join("profiles"))
        .expect("Failed to open test store");
    (dir, store)
}

/// A short back-and-forth with one contact
pub fn seed_conversation(assembler: &ContextAssembler, contact: &str) {
    let script = [
        (false, "Hey! Are we still on for dinner tonight?", 0),
        (true, "Yes, looking forward to it", 5),
        (false, "Great, thanks so much. See you at 7", 9),
        (true, "Perfect, see you then!", 12),
        (false, "Can you send me the project budget tomorrow?", 60 * 20),
    ];
    for (from_self, body, minutes) in script {
        let offset = Duration::minutes(minutes);
        let message = if from_self {
            outbound(contact, body, offset)
        } else {
            inbound(contact, body, offset)
        };
        assembler.process_message(&message);
    }
}
