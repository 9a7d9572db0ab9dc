//! Tab lifecycle normalization
//!
//! This module decides which raw notifications are meaningful and what each
//! one becomes:
//! - a before-navigate on the top frame starts a tab's stream (`tab_start`)
//! - DOM-content-loaded and completed mark load progress (`dom`, `completed`)
//! - removal and replacement end the stream (`tab_end`)
//!
//! The rules are pure functions over a single notice; at most one event
//! comes out of one notice. [`TabLifecycleNormalizer`] wires the rules to
//! live sources. A notice that fails a precondition is dropped silently in
//! the live path; the [`DropReason`] it evaluates to exists for tests and
//! the validation tooling. No per-tab ordering is enforced: consumers
//! reconstruct each tab's lifecycle from the feed.

use std::fmt;
use std::rc::Rc;

use serde::Serialize;

use crate::bus::EventSink;
use crate::notice::{NavigationNotice, RawNotice, TabRemovedNotice, TabReplacedNotice};
use crate::sources::{NavigationEvents, TabRegistryEvents};
use crate::types::{TabEvent, TabId};

/// Why a raw notice produced no event.
///
/// Dropping is normal filtering, not a fault. The live wiring discards the
/// reason; tests and the `validate` command report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// The notice came from a sub-frame, not the top frame
    SubFrame,
    /// The navigation carried no url, or an empty one
    MissingUrl,
    /// The tab id was zero or the registry's "no tab" sentinel
    InvalidTabId,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::SubFrame => "sub_frame",
            DropReason::MissingUrl => "missing_url",
            DropReason::InvalidTabId => "invalid_tab_id",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Apply the rule for a notice's kind.
///
/// # Arguments
/// * `notice` - One recorded or live raw notification
/// * `no_tab_id` - The tab registry's "no tab" sentinel
///
/// # Returns
/// The single canonical event the notice maps to, or the reason it was
/// filtered out.
pub fn normalize(notice: &RawNotice, no_tab_id: i64) -> Result<TabEvent, DropReason> {
    match notice {
        RawNotice::BeforeNavigate(nav) => normalize_before_navigate(nav, no_tab_id),
        RawNotice::DomContentLoaded(nav) => normalize_dom_content_loaded(nav, no_tab_id),
        RawNotice::Completed(nav) => normalize_completed(nav, no_tab_id),
        RawNotice::TabRemoved(removed) => normalize_tab_removed(removed, no_tab_id),
        RawNotice::TabReplaced(replaced) => normalize_tab_replaced(replaced, no_tab_id),
    }
}

/// A tab is navigating to a url: the start of that tab's stream
pub fn normalize_before_navigate(
    notice: &NavigationNotice,
    no_tab_id: i64,
) -> Result<TabEvent, DropReason> {
    let tsm = floor_tsm(notice.time_stamp);

    // Top frame only
    if notice.frame_id != 0 {
        return Err(DropReason::SubFrame);
    }

    // Speculative navigations may carry no url
    let url = match notice.url.as_deref() {
        Some(url) if !url.is_empty() => url.to_string(),
        _ => return Err(DropReason::MissingUrl),
    };

    let tab_id = TabId::checked(notice.tab_id, no_tab_id).ok_or(DropReason::InvalidTabId)?;

    Ok(TabEvent::TabStart { tab_id, url, tsm })
}

/// The tab's DOM finished loading
pub fn normalize_dom_content_loaded(
    notice: &NavigationNotice,
    no_tab_id: i64,
) -> Result<TabEvent, DropReason> {
    let tab_id = TabId::checked(notice.tab_id, no_tab_id).ok_or(DropReason::InvalidTabId)?;

    if notice.frame_id != 0 {
        return Err(DropReason::SubFrame);
    }

    Ok(TabEvent::Dom {
        tab_id,
        tsm: floor_tsm(notice.time_stamp),
    })
}

/// The tab's page finished loading completely
pub fn normalize_completed(
    notice: &NavigationNotice,
    no_tab_id: i64,
) -> Result<TabEvent, DropReason> {
    let tab_id = TabId::checked(notice.tab_id, no_tab_id).ok_or(DropReason::InvalidTabId)?;

    if notice.frame_id != 0 {
        return Err(DropReason::SubFrame);
    }

    Ok(TabEvent::Completed {
        tab_id,
        tsm: floor_tsm(notice.time_stamp),
    })
}

/// A tab was removed: the end of its stream
pub fn normalize_tab_removed(
    notice: &TabRemovedNotice,
    no_tab_id: i64,
) -> Result<TabEvent, DropReason> {
    let tab_id = TabId::checked(notice.tab_id, no_tab_id).ok_or(DropReason::InvalidTabId)?;

    Ok(TabEvent::TabEnd { tab_id })
}

/// A tab was replaced by a pre-rendered one: the old tab's stream ends.
///
/// The added tab never appears in the emitted event; its own navigation
/// produces its `tab_start`.
pub fn normalize_tab_replaced(
    notice: &TabReplacedNotice,
    no_tab_id: i64,
) -> Result<TabEvent, DropReason> {
    let tab_id = TabId::checked(notice.removed_tab_id, no_tab_id).ok_or(DropReason::InvalidTabId)?;

    Ok(TabEvent::TabEnd { tab_id })
}

/// Floor to whole milliseconds. Never clamped: a pre-epoch timestamp stays
/// negative.
fn floor_tsm(time_stamp: f64) -> i64 {
    time_stamp.floor() as i64
}

/// Normalizes raw tab and navigation notifications into the canonical feed.
///
/// Holds the two injected sources and the publish interface, nothing else.
/// All state lives with the collaborators; the normalizer itself keeps no
/// per-tab memory.
pub struct TabLifecycleNormalizer {
    navigation: Rc<dyn NavigationEvents>,
    tabs: Rc<dyn TabRegistryEvents>,
    sink: Rc<dyn EventSink>,
}

impl TabLifecycleNormalizer {
    pub fn new(
        navigation: Rc<dyn NavigationEvents>,
        tabs: Rc<dyn TabRegistryEvents>,
        sink: Rc<dyn EventSink>,
    ) -> Self {
        TabLifecycleNormalizer {
            navigation,
            tabs,
            sink,
        }
    }

    /// Subscribe to both sources.
    ///
    /// Reads the registry's sentinel once, then registers one handler per
    /// raw notification kind (five in total). Each handler runs the matching
    /// rule and publishes on success. Calling `start` again registers a
    /// second set of handlers; callers own idempotence.
    pub fn start(&self) {
        let no_tab_id = self.tabs.no_tab_id();

        // Tab starts come from the navigation source rather than tab-created
        // or tab-updated notifications: navigation fires when a page starts
        // pre-rendering in an invisible tab, which tab notifications miss,
        // and it stays quiet when only the hash part of the url changes.
        let sink = Rc::clone(&self.sink);
        self.navigation.on_before_navigate(Box::new(move |notice| {
            if let Ok(event) = normalize_before_navigate(&notice, no_tab_id) {
                sink.publish(event);
            }
        }));

        let sink = Rc::clone(&self.sink);
        self.navigation.on_dom_content_loaded(Box::new(move |notice| {
            if let Ok(event) = normalize_dom_content_loaded(&notice, no_tab_id) {
                sink.publish(event);
            }
        }));

        let sink = Rc::clone(&self.sink);
        self.navigation.on_completed(Box::new(move |notice| {
            if let Ok(event) = normalize_completed(&notice, no_tab_id) {
                sink.publish(event);
            }
        }));

        let sink = Rc::clone(&self.sink);
        self.tabs.on_removed(Box::new(move |notice| {
            if let Ok(event) = normalize_tab_removed(&notice, no_tab_id) {
                sink.publish(event);
            }
        }));

        let sink = Rc::clone(&self.sink);
        self.tabs.on_replaced(Box::new(move |notice| {
            if let Ok(event) = normalize_tab_replaced(&notice, no_tab_id) {
                sink.publish(event);
            }
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::CollectingSink;
    use crate::replay::ReplaySource;
    use pretty_assertions::assert_eq;

    fn nav(tab_id: i64, url: Option<&str>, frame_id: i64, time_stamp: f64) -> NavigationNotice {
        NavigationNotice {
            tab_id,
            url: url.map(String::from),
            frame_id,
            time_stamp,
        }
    }

    fn tab(id: i64) -> TabId {
        TabId::checked(id, -1).unwrap()
    }

    #[test]
    fn test_before_navigate_emits_tab_start_with_floored_timestamp() {
        let notice = nav(12, Some("https://example.com/"), 0, 1000.7);

        let event = normalize_before_navigate(&notice, -1).unwrap();
        assert_eq!(
            event,
            TabEvent::TabStart {
                tab_id: tab(12),
                url: "https://example.com/".to_string(),
                tsm: 1000,
            }
        );
    }

    #[test]
    fn test_before_navigate_drops_sub_frame() {
        let notice =
            NavigationNotice::top_frame(12, "https://example.com/frame", 1000.0).with_frame_id(5);

        assert_eq!(
            normalize_before_navigate(&notice, -1),
            Err(DropReason::SubFrame)
        );
    }

    #[test]
    fn test_before_navigate_drops_missing_or_empty_url() {
        let missing = nav(12, None, 0, 1000.0);
        let empty = nav(12, Some(""), 0, 1000.0);

        assert_eq!(
            normalize_before_navigate(&missing, -1),
            Err(DropReason::MissingUrl)
        );
        assert_eq!(
            normalize_before_navigate(&empty, -1),
            Err(DropReason::MissingUrl)
        );
    }

    #[test]
    fn test_before_navigate_drops_invalid_tab_id() {
        let zero = nav(0, Some("https://example.com/"), 0, 1000.0);
        let sentinel = nav(-1, Some("https://example.com/"), 0, 1000.0);

        assert_eq!(
            normalize_before_navigate(&zero, -1),
            Err(DropReason::InvalidTabId)
        );
        assert_eq!(
            normalize_before_navigate(&sentinel, -1),
            Err(DropReason::InvalidTabId)
        );
    }

    #[test]
    fn test_dom_content_loaded_emits_dom() {
        let notice = nav(3, None, 0, 1000.7);

        let event = normalize_dom_content_loaded(&notice, -1).unwrap();
        assert_eq!(
            event,
            TabEvent::Dom {
                tab_id: tab(3),
                tsm: 1000,
            }
        );
    }

    #[test]
    fn test_dom_content_loaded_drops_sub_frame() {
        let notice = nav(3, None, 2, 1000.0);

        assert_eq!(
            normalize_dom_content_loaded(&notice, -1),
            Err(DropReason::SubFrame)
        );
    }

    #[test]
    fn test_completed_drops_sub_frame() {
        let notice = nav(3, None, 1, 1000.0);

        assert_eq!(normalize_completed(&notice, -1), Err(DropReason::SubFrame));
    }

    #[test]
    fn test_check_order_differs_by_notification_kind() {
        // A sub-frame notice with an invalid tab id: the navigate rule looks
        // at the frame first, the load-progress rules look at the tab first.
        let notice = nav(0, Some("https://example.com/"), 5, 1000.0);

        assert_eq!(
            normalize_before_navigate(&notice, -1),
            Err(DropReason::SubFrame)
        );
        assert_eq!(
            normalize_dom_content_loaded(&notice, -1),
            Err(DropReason::InvalidTabId)
        );
        assert_eq!(
            normalize_completed(&notice, -1),
            Err(DropReason::InvalidTabId)
        );
    }

    #[test]
    fn test_pre_epoch_timestamp_floors_down() {
        let notice = nav(3, None, 0, -0.5);

        let event = normalize_dom_content_loaded(&notice, -1).unwrap();
        assert_eq!(event.tsm(), Some(-1));
    }

    #[test]
    fn test_tab_removed_emits_tab_end() {
        let event = normalize_tab_removed(&TabRemovedNotice { tab_id: 7 }, -1).unwrap();
        assert_eq!(event, TabEvent::TabEnd { tab_id: tab(7) });
    }

    #[test]
    fn test_tab_removed_drops_invalid_tab_id() {
        assert_eq!(
            normalize_tab_removed(&TabRemovedNotice { tab_id: 0 }, -1),
            Err(DropReason::InvalidTabId)
        );
        assert_eq!(
            normalize_tab_removed(&TabRemovedNotice { tab_id: -1 }, -1),
            Err(DropReason::InvalidTabId)
        );
    }

    #[test]
    fn test_tab_replaced_ends_removed_tab_only() {
        let notice = TabReplacedNotice {
            added_tab_id: 9,
            removed_tab_id: 7,
        };

        let event = normalize_tab_replaced(&notice, -1).unwrap();
        assert_eq!(event, TabEvent::TabEnd { tab_id: tab(7) });
        assert_ne!(event.tab_id().get(), 9);
    }

    #[test]
    fn test_tab_replaced_drops_invalid_removed_id() {
        let notice = TabReplacedNotice {
            added_tab_id: 9,
            removed_tab_id: -1,
        };

        assert_eq!(
            normalize_tab_replaced(&notice, -1),
            Err(DropReason::InvalidTabId)
        );
    }

    #[test]
    fn test_sentinel_substitution() {
        // With a registry whose sentinel is 42, tab 42 is invalid and the
        // conventional -1 is an ordinary id.
        let at_sentinel = nav(42, Some("https://example.com/"), 0, 1000.0);
        let negative = nav(-1, Some("https://example.com/"), 0, 1000.0);

        assert_eq!(
            normalize_before_navigate(&at_sentinel, 42),
            Err(DropReason::InvalidTabId)
        );

        let event = normalize_before_navigate(&negative, 42).unwrap();
        assert_eq!(event.tab_id().get(), -1);
    }

    #[test]
    fn test_normalize_dispatches_by_kind() {
        let cases = vec![
            (
                RawNotice::BeforeNavigate(nav(12, Some("https://example.com/"), 0, 1000.7)),
                TabEvent::TabStart {
                    tab_id: tab(12),
                    url: "https://example.com/".to_string(),
                    tsm: 1000,
                },
            ),
            (
                RawNotice::DomContentLoaded(nav(12, None, 0, 1200.2)),
                TabEvent::Dom {
                    tab_id: tab(12),
                    tsm: 1200,
                },
            ),
            (
                RawNotice::Completed(nav(12, None, 0, 1500.9)),
                TabEvent::Completed {
                    tab_id: tab(12),
                    tsm: 1500,
                },
            ),
            (
                RawNotice::TabRemoved(TabRemovedNotice { tab_id: 12 }),
                TabEvent::TabEnd { tab_id: tab(12) },
            ),
            (
                RawNotice::TabReplaced(TabReplacedNotice {
                    added_tab_id: 9,
                    removed_tab_id: 12,
                }),
                TabEvent::TabEnd { tab_id: tab(12) },
            ),
        ];

        for (notice, expected) in cases {
            assert_eq!(normalize(&notice, -1), Ok(expected));
        }
    }

    #[test]
    fn test_start_wires_sources_to_sink() {
        let source = Rc::new(ReplaySource::new());
        let sink = Rc::new(CollectingSink::new());
        let normalizer =
            TabLifecycleNormalizer::new(source.clone(), source.clone(), sink.clone());
        normalizer.start();

        source.dispatch(RawNotice::BeforeNavigate(nav(
            12,
            Some("https://example.com/"),
            0,
            1000.7,
        )));
        source.dispatch(RawNotice::DomContentLoaded(nav(12, None, 0, 1200.2)));
        source.dispatch(RawNotice::BeforeNavigate(nav(
            12,
            Some("https://example.com/ad"),
            3,
            1300.0,
        )));
        source.dispatch(RawNotice::Completed(nav(12, None, 0, 1500.9)));
        source.dispatch(RawNotice::TabRemoved(TabRemovedNotice { tab_id: 12 }));

        // Five notices in, four events out: the sub-frame navigation is
        // dropped without a trace.
        assert_eq!(
            sink.events(),
            vec![
                TabEvent::TabStart {
                    tab_id: tab(12),
                    url: "https://example.com/".to_string(),
                    tsm: 1000,
                },
                TabEvent::Dom {
                    tab_id: tab(12),
                    tsm: 1200,
                },
                TabEvent::Completed {
                    tab_id: tab(12),
                    tsm: 1500,
                },
                TabEvent::TabEnd { tab_id: tab(12) },
            ]
        );
    }

    #[test]
    fn test_start_twice_doubles_emission() {
        let source = Rc::new(ReplaySource::new());
        let sink = Rc::new(CollectingSink::new());
        let normalizer =
            TabLifecycleNormalizer::new(source.clone(), source.clone(), sink.clone());

        normalizer.start();
        normalizer.start();

        source.dispatch(RawNotice::TabRemoved(TabRemovedNotice { tab_id: 7 }));
        assert_eq!(sink.events().len(), 2);
    }

    #[test]
    fn test_start_uses_registry_sentinel() {
        let source = Rc::new(ReplaySource::with_no_tab_id(42));
        let sink = Rc::new(CollectingSink::new());
        let normalizer =
            TabLifecycleNormalizer::new(source.clone(), source.clone(), sink.clone());
        normalizer.start();

        source.dispatch(RawNotice::TabRemoved(TabRemovedNotice { tab_id: 42 }));
        source.dispatch(RawNotice::TabRemoved(TabRemovedNotice { tab_id: 7 }));

        assert_eq!(sink.events(), vec![TabEvent::TabEnd { tab_id: tab(7) }]);
    }
}
