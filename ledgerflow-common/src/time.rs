//! Timestamp helpers, matching the teacher's `tos_common::time` style of a
//! thin wrapper around the system clock so call sites never reach for
//! `SystemTime` directly.

use chrono::{DateTime, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn now_unix_seconds() -> i64 {
    Utc::now().timestamp()
}
