//! Pipeline orchestration
//!
//! This module provides the one-call public API for replaying a recorded
//! capture: a [`ReplaySource`] stands in for both live sources, a
//! [`TabLifecycleNormalizer`] applies the rules, and a [`CollectingSink`]
//! gathers what was published. The same wiring works against live sources;
//! only the source and sink implementations change.

use std::rc::Rc;

use crate::bus::CollectingSink;
use crate::error::FeedError;
use crate::normalizer::TabLifecycleNormalizer;
use crate::notice::RawNotice;
use crate::replay::ReplaySource;
use crate::sources::NO_TAB_ID;
use crate::types::TabEvent;

/// Replay recorded notices into canonical lifecycle events.
///
/// # Arguments
/// * `notices` - Recorded raw notices, in delivery order
///
/// # Returns
/// The canonical events in emission order, at most one per notice
///
/// # Example
/// ```ignore
/// let notices = RawNotice::parse_ndjson(&capture)?;
/// let events = replay_notices(notices);
/// ```
pub fn replay_notices(notices: Vec<RawNotice>) -> Vec<TabEvent> {
    replay_with_no_tab_id(notices, NO_TAB_ID)
}

/// Replay against a registry that reports a different "no tab" sentinel
pub fn replay_with_no_tab_id(notices: Vec<RawNotice>, no_tab_id: i64) -> Vec<TabEvent> {
    let source = Rc::new(ReplaySource::with_no_tab_id(no_tab_id));
    let sink = Rc::new(CollectingSink::new());

    let normalizer = TabLifecycleNormalizer::new(source.clone(), source.clone(), sink.clone());
    normalizer.start();

    source.dispatch_all(notices);
    sink.take()
}

/// Parse an NDJSON capture and replay it
pub fn replay_ndjson(ndjson: &str) -> Result<Vec<TabEvent>, FeedError> {
    Ok(replay_notices(RawNotice::parse_ndjson(ndjson)?))
}

/// Parse a JSON array capture and replay it
pub fn replay_array(json: &str) -> Result<Vec<TabEvent>, FeedError> {
    Ok(replay_notices(RawNotice::parse_array(json)?))
}
