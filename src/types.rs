//! Canonical tab lifecycle event model
//!
//! This module defines the events emitted by the normalizer: the four
//! lifecycle kinds, their payloads, and the validated tab identifier that
//! every payload carries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a browser tab, known to be valid at construction time.
///
/// Raw notifications carry bare integers that may be zero (missing) or the
/// registry's "no tab" sentinel; [`TabId::checked`] is the only way to turn
/// one of those into a `TabId` for an event payload, so every emitted event
/// carries a usable id. Deserialization trusts the feed it reads, since that
/// feed was produced under the same rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(i64);

impl TabId {
    /// Validate a raw tab id against the registry's sentinel.
    ///
    /// Returns `None` when `raw` is zero (the placeholder a missing field
    /// deserializes to) or equal to `no_tab_id`.
    pub fn checked(raw: i64, no_tab_id: i64) -> Option<TabId> {
        if raw == 0 || raw == no_tab_id {
            None
        } else {
            Some(TabId(raw))
        }
    }

    /// The underlying integer id
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The four canonical lifecycle event kinds
///
/// The serialized names double as the subscription names consumers use on
/// the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    TabStart,
    TabEnd,
    Dom,
    Completed,
}

impl EventKind {
    /// All kinds, in lifecycle order
    pub const ALL: [EventKind; 4] = [
        EventKind::TabStart,
        EventKind::TabEnd,
        EventKind::Dom,
        EventKind::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::TabStart => "tab_start",
            EventKind::TabEnd => "tab_end",
            EventKind::Dom => "dom",
            EventKind::Completed => "completed",
        }
    }

    /// Look up a kind by its subscription name
    pub fn from_name(name: &str) -> Option<EventKind> {
        match name {
            "tab_start" => Some(EventKind::TabStart),
            "tab_end" => Some(EventKind::TabEnd),
            "dom" => Some(EventKind::Dom),
            "completed" => Some(EventKind::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A canonical tab lifecycle event
///
/// Produced synchronously from a single raw notification and handed to the
/// publish interface; nothing is retained afterwards. `tsm` is the raw
/// notification timestamp floored to whole milliseconds since the Unix
/// epoch, with no other transformation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TabEvent {
    /// A tab started loading a new url (top frame navigation began)
    TabStart { tab_id: TabId, url: String, tsm: i64 },
    /// A tab went away, by removal or by replacement
    TabEnd { tab_id: TabId },
    /// The tab's DOM finished loading
    Dom { tab_id: TabId, tsm: i64 },
    /// The tab's page finished loading completely
    Completed { tab_id: TabId, tsm: i64 },
}

impl TabEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            TabEvent::TabStart { .. } => EventKind::TabStart,
            TabEvent::TabEnd { .. } => EventKind::TabEnd,
            TabEvent::Dom { .. } => EventKind::Dom,
            TabEvent::Completed { .. } => EventKind::Completed,
        }
    }

    pub fn tab_id(&self) -> TabId {
        match self {
            TabEvent::TabStart { tab_id, .. }
            | TabEvent::TabEnd { tab_id }
            | TabEvent::Dom { tab_id, .. }
            | TabEvent::Completed { tab_id, .. } => *tab_id,
        }
    }

    /// Floored millisecond timestamp; `None` for `TabEnd`, which carries no time
    pub fn tsm(&self) -> Option<i64> {
        match self {
            TabEvent::TabStart { tsm, .. }
            | TabEvent::Dom { tsm, .. }
            | TabEvent::Completed { tsm, .. } => Some(*tsm),
            TabEvent::TabEnd { .. } => None,
        }
    }

    /// The event time as a UTC datetime, for consumers that want wall-clock time
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        self.tsm().and_then(DateTime::from_timestamp_millis)
    }
}
