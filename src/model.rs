// Message data model
// Wire shapes for submitted messages and the listing payload

use serde::Serialize;
use std::fmt;

/// Timestamp layout stamped on every message
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A submitted message. Built per request and only ever logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Message {
    pub user: String,
    pub msg: String,
    pub cate: String,
    pub time: String,
    #[serde(rename = "IP")]
    pub ip: String,
}

impl Message {
    /// Build a message stamped with the current local time
    pub fn new(user: String, msg: String, cate: String, ip: String) -> Self {
        Self {
            user,
            msg,
            cate,
            time: chrono::Local::now().format(TIME_FORMAT).to_string(),
            ip,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "user={} cate={} ip={} time=\"{}\" msg={:?}",
            self.user, self.cate, self.ip, self.time, self.msg
        )
    }
}

/// Listing payload, `{"Msgs": [...]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MessageList {
    #[serde(rename = "Msgs")]
    pub msgs: Vec<Message>,
}
