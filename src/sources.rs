//! Injected notification sources
//!
//! This module defines the two collaborator seams the normalizer subscribes
//! to: a navigation source (per-frame navigation notices) and a tab registry
//! (tab removal and replacement notices). Production wiring adapts the
//! browser extension surface behind these traits; tests and the replay
//! tooling use [`crate::replay::ReplaySource`].

use crate::notice::{NavigationNotice, TabRemovedNotice, TabReplacedNotice};

/// Callback registered for navigation notices
pub type NavigationHandler = Box<dyn Fn(NavigationNotice)>;

/// Callback registered for tab-removed notices
pub type TabRemovedHandler = Box<dyn Fn(TabRemovedNotice)>;

/// Callback registered for tab-replaced notices
pub type TabReplacedHandler = Box<dyn Fn(TabReplacedNotice)>;

/// The conventional "no tab" sentinel browsers report when a notification
/// is not associated with any tab. Sources may override it through
/// [`TabRegistryEvents::no_tab_id`].
pub const NO_TAB_ID: i64 = -1;

/// Source of frame navigation notifications.
///
/// Registration takes `&self` so a source can be shared behind `Rc`;
/// implementations keep their handler lists in interior mutability. Handlers
/// are invoked synchronously, one notification at a time, in registration
/// order.
pub trait NavigationEvents {
    /// A frame is about to navigate to a url
    fn on_before_navigate(&self, handler: NavigationHandler);

    /// A frame's DOM finished loading
    fn on_dom_content_loaded(&self, handler: NavigationHandler);

    /// A frame finished loading completely
    fn on_completed(&self, handler: NavigationHandler);
}

/// Source of tab registry notifications.
///
/// Also supplies the registry's "no tab" sentinel, so the filter rules never
/// hard-code it and tests can substitute their own.
pub trait TabRegistryEvents {
    /// The id value this registry uses to mean "no tab"
    fn no_tab_id(&self) -> i64;

    /// A tab was removed
    fn on_removed(&self, handler: TabRemovedHandler);

    /// A tab was replaced by another (pre-rendered) tab
    fn on_replaced(&self, handler: TabReplacedHandler);
}
