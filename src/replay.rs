//! Scripted notification sources
//!
//! [`ReplaySource`] plays recorded raw notices into whatever handlers are
//! registered, standing in for the live navigation source and tab registry
//! at once. It drives the replay pipeline and the CLI, and doubles as the
//! test double for anything that needs sources.

use std::cell::RefCell;

use crate::notice::RawNotice;
use crate::sources::{
    NavigationEvents, NavigationHandler, TabRegistryEvents, TabRemovedHandler,
    TabReplacedHandler, NO_TAB_ID,
};

/// Source that delivers recorded notices on demand.
///
/// Handlers registered through the trait methods are kept per subscription
/// point; [`dispatch`](ReplaySource::dispatch) fans one notice out to the
/// handlers for its kind, synchronously and in registration order. The
/// registry sentinel defaults to [`NO_TAB_ID`].
pub struct ReplaySource {
    no_tab_id: i64,
    before_navigate: RefCell<Vec<NavigationHandler>>,
    dom_content_loaded: RefCell<Vec<NavigationHandler>>,
    completed: RefCell<Vec<NavigationHandler>>,
    removed: RefCell<Vec<TabRemovedHandler>>,
    replaced: RefCell<Vec<TabReplacedHandler>>,
}

impl ReplaySource {
    pub fn new() -> Self {
        Self::with_no_tab_id(NO_TAB_ID)
    }

    /// A source whose registry reports a different "no tab" sentinel
    pub fn with_no_tab_id(no_tab_id: i64) -> Self {
        ReplaySource {
            no_tab_id,
            before_navigate: RefCell::new(Vec::new()),
            dom_content_loaded: RefCell::new(Vec::new()),
            completed: RefCell::new(Vec::new()),
            removed: RefCell::new(Vec::new()),
            replaced: RefCell::new(Vec::new()),
        }
    }

    /// Deliver one notice to the handlers registered for its kind
    pub fn dispatch(&self, notice: RawNotice) {
        match notice {
            RawNotice::BeforeNavigate(nav) => {
                for handler in self.before_navigate.borrow().iter() {
                    handler(nav.clone());
                }
            }
            RawNotice::DomContentLoaded(nav) => {
                for handler in self.dom_content_loaded.borrow().iter() {
                    handler(nav.clone());
                }
            }
            RawNotice::Completed(nav) => {
                for handler in self.completed.borrow().iter() {
                    handler(nav.clone());
                }
            }
            RawNotice::TabRemoved(removed) => {
                for handler in self.removed.borrow().iter() {
                    handler(removed.clone());
                }
            }
            RawNotice::TabReplaced(replaced) => {
                for handler in self.replaced.borrow().iter() {
                    handler(replaced.clone());
                }
            }
        }
    }

    /// Deliver a whole capture in order
    pub fn dispatch_all(&self, notices: impl IntoIterator<Item = RawNotice>) {
        for notice in notices {
            self.dispatch(notice);
        }
    }
}

impl Default for ReplaySource {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationEvents for ReplaySource {
    fn on_before_navigate(&self, handler: NavigationHandler) {
        self.before_navigate.borrow_mut().push(handler);
    }

    fn on_dom_content_loaded(&self, handler: NavigationHandler) {
        self.dom_content_loaded.borrow_mut().push(handler);
    }

    fn on_completed(&self, handler: NavigationHandler) {
        self.completed.borrow_mut().push(handler);
    }
}

impl TabRegistryEvents for ReplaySource {
    fn no_tab_id(&self) -> i64 {
        self.no_tab_id
    }

    fn on_removed(&self, handler: TabRemovedHandler) {
        self.removed.borrow_mut().push(handler);
    }

    fn on_replaced(&self, handler: TabReplacedHandler) {
        self.replaced.borrow_mut().push(handler);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::{NavigationNotice, TabRemovedNotice, TabReplacedNotice};
    use pretty_assertions::assert_eq;
    use std::rc::Rc;

    #[test]
    fn test_dispatch_routes_by_kind() {
        let source = ReplaySource::new();

        let navigations = Rc::new(RefCell::new(Vec::new()));
        let removals = Rc::new(RefCell::new(Vec::new()));

        let seen = Rc::clone(&navigations);
        source.on_before_navigate(Box::new(move |notice| {
            seen.borrow_mut().push(notice.tab_id);
        }));
        let seen = Rc::clone(&removals);
        source.on_removed(Box::new(move |notice| {
            seen.borrow_mut().push(notice.tab_id);
        }));

        source.dispatch_all(vec![
            RawNotice::BeforeNavigate(NavigationNotice::top_frame(12, "https://a.example/", 1.0)),
            RawNotice::TabRemoved(TabRemovedNotice { tab_id: 7 }),
            RawNotice::TabReplaced(TabReplacedNotice {
                added_tab_id: 9,
                removed_tab_id: 7,
            }),
            RawNotice::BeforeNavigate(NavigationNotice::top_frame(9, "https://b.example/", 2.0)),
        ]);

        assert_eq!(*navigations.borrow(), vec![12, 9]);
        assert_eq!(*removals.borrow(), vec![7]);
    }

    #[test]
    fn test_every_registered_handler_is_invoked() {
        let source = ReplaySource::new();
        let count = Rc::new(RefCell::new(0usize));

        for _ in 0..2 {
            let counter = Rc::clone(&count);
            source.on_removed(Box::new(move |_| *counter.borrow_mut() += 1));
        }

        source.dispatch(RawNotice::TabRemoved(TabRemovedNotice { tab_id: 7 }));
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn test_reports_configured_sentinel() {
        assert_eq!(ReplaySource::new().no_tab_id(), NO_TAB_ID);
        assert_eq!(ReplaySource::with_no_tab_id(42).no_tab_id(), 42);
    }
}
