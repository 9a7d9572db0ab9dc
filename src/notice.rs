//! Raw notification wire schema
//!
//! The shapes the browser delivers, before any filtering:
//! - Navigation notices (before-navigate, DOM-content-loaded, completed)
//! - Tab registry notices (removed, replaced)
//!
//! Payload fields keep the browser's camelCase names on the wire (`tabId`,
//! `frameId`, `timeStamp`), so captures of real notification traffic replay
//! unmodified. The [`RawNotice`] envelope adds a `notice` tag naming the
//! kind, which is what a recorder writes one-per-line into an NDJSON
//! capture.

use serde::{Deserialize, Serialize};

use crate::error::FeedError;

/// A navigation notification for one frame of one tab.
///
/// `frame_id == 0` is the top (root) frame; any other value is a sub-frame
/// and is filtered out downstream. Integer fields default on
/// deserialization, so a notice missing `tabId` comes out as `0` and gets
/// dropped by the tab id check rather than failing the parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationNotice {
    /// Id of the tab being navigated
    #[serde(default)]
    pub tab_id: i64,
    /// Destination url; absent on some speculative navigations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Frame within the tab; 0 is the top frame
    #[serde(default)]
    pub frame_id: i64,
    /// Fractional milliseconds since the Unix epoch
    #[serde(default)]
    pub time_stamp: f64,
}

impl NavigationNotice {
    /// A top-frame notice with a url, the common case in tests and demos
    pub fn top_frame(tab_id: i64, url: impl Into<String>, time_stamp: f64) -> Self {
        NavigationNotice {
            tab_id,
            url: Some(url.into()),
            frame_id: 0,
            time_stamp,
        }
    }

    /// Same notice with a different frame id
    pub fn with_frame_id(mut self, frame_id: i64) -> Self {
        self.frame_id = frame_id;
        self
    }
}

/// A tab was removed (closed by the user or the browser)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabRemovedNotice {
    #[serde(default)]
    pub tab_id: i64,
}

/// A tab was replaced, typically when a pre-rendered invisible tab is
/// swapped in for an existing one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabReplacedNotice {
    /// The tab that took over
    #[serde(default)]
    pub added_tab_id: i64,
    /// The tab that went away
    #[serde(default)]
    pub removed_tab_id: i64,
}

/// Recording envelope: one raw notification plus the kind it arrived as
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum RawNotice {
    BeforeNavigate(NavigationNotice),
    DomContentLoaded(NavigationNotice),
    Completed(NavigationNotice),
    TabRemoved(TabRemovedNotice),
    TabReplaced(TabReplacedNotice),
}

impl RawNotice {
    /// The envelope tag for this notice kind
    pub fn kind(&self) -> &'static str {
        match self {
            RawNotice::BeforeNavigate(_) => "before_navigate",
            RawNotice::DomContentLoaded(_) => "dom_content_loaded",
            RawNotice::Completed(_) => "completed",
            RawNotice::TabRemoved(_) => "tab_removed",
            RawNotice::TabReplaced(_) => "tab_replaced",
        }
    }

    /// Parse a JSON string containing an array of raw notices
    pub fn parse_array(json: &str) -> Result<Vec<RawNotice>, FeedError> {
        let notices: Vec<RawNotice> = serde_json::from_str(json)?;
        Ok(notices)
    }

    /// Parse NDJSON (newline-delimited JSON) containing raw notices
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<RawNotice>, FeedError> {
        let mut notices = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<RawNotice>(trimmed) {
                Ok(notice) => notices.push(notice),
                Err(e) => {
                    return Err(FeedError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(notices)
    }
}
