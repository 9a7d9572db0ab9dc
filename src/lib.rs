//! tabfeed - Canonical tab lifecycle feed from raw browser notifications
//!
//! tabfeed turns the noisy notification surface of a browser (per-frame
//! navigations, tab removals, tab replacements) into a small feed of four
//! canonical lifecycle events: `tab_start`, `dom`, `completed`, `tab_end`.
//! Sub-frame traffic, url-less speculative navigations and notices without
//! a usable tab id are filtered out on the way.
//!
//! ## Modules
//!
//! - **Normalizer**: the per-notification filter rules and the component
//!   that wires them to injected notification sources
//! - **Bus**: the publish interface plus a synchronous in-process event bus
//!   with per-kind subscriptions
//! - **Replay**: scripted sources and a one-call pipeline for running
//!   recorded NDJSON captures through the normalizer

pub mod bus;
pub mod error;
pub mod normalizer;
pub mod notice;
pub mod pipeline;
pub mod replay;
pub mod sources;
pub mod types;

pub use bus::{CollectingSink, EventBus, EventSink, SubscriptionId};
pub use error::FeedError;
pub use normalizer::{normalize, DropReason, TabLifecycleNormalizer};
pub use notice::{NavigationNotice, RawNotice, TabRemovedNotice, TabReplacedNotice};
pub use pipeline::{replay_array, replay_ndjson, replay_notices, replay_with_no_tab_id};
pub use replay::ReplaySource;
pub use sources::{NavigationEvents, TabRegistryEvents, NO_TAB_ID};
pub use types::{EventKind, TabEvent, TabId};

/// tabfeed version, embedded in CLI reports
pub const TABFEED_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for CLI reports
pub const PRODUCER_NAME: &str = "tabfeed";
