//! # Event Bus System
//!
//! Event-driven notifications for the explore core using `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! The controller commits its results into the explore store and, alongside
//! each commit, announces what happened on the bus so UI layers can refresh
//! without polling:
//! - **Event Types**: [`ExploreEvent`] for run progress, [`SessionEvent`] for
//!   session invalidation
//! - **EventBus**: central broadcast channel
//! - **EventStream**: receiver wrapper with optional filtering
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────┐  emit   ┌───────────┐  subscribe  ┌────────────┐
//! │ ExploreController  ├────────>│ EventBus  ├────────────>│ UI / host  │
//! └────────────────────┘         │ (broadcast│             └────────────┘
//!                                │  channel) │  subscribe  ┌────────────┐
//!                                │           ├────────────>│ Subscriber │
//!                                └───────────┘             └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, ExploreEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Explore(ExploreEvent::GenreFeedFetched {
//!         genre: "jazz".to_string(),
//!         album_count: 12,
//!     }))
//!     .ok();
//!
//! let event = stream.recv().await.unwrap();
//! assert!(matches!(event, CoreEvent::Explore(_)));
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events. Non-fatal;
//!   re-read the store snapshot to catch up.
//! - **`RecvError::Closed`**: all senders dropped. Treat as shutdown.
//!
//! Emitting with no subscribers returns an error; publishers ignore it with
//! `.ok()`.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// A bootstrap run emits one event per added artist, album batch and genre,
/// so 100 covers a full pass for a subscriber that wakes up late.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Discovery run progress
    Explore(ExploreEvent),
    /// Session lifecycle
    Session(SessionEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Explore(e) => e.description(),
            CoreEvent::Session(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Explore(ExploreEvent::RunCancelled { .. }) => EventSeverity::Warning,
            CoreEvent::Session(SessionEvent::Invalidated { .. }) => EventSeverity::Warning,
            CoreEvent::Explore(ExploreEvent::RunCompleted { .. }) => EventSeverity::Info,
            CoreEvent::Explore(ExploreEvent::RunStarted { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Explore Events
// ============================================================================

/// Progress of a discovery run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum ExploreEvent {
    /// A run passed its preconditions and holds the running flag.
    RunStarted {
        generation: u64,
        seed_count: usize,
        /// Whether the state had already completed a bootstrap pass
        bootstrapped: bool,
    },
    /// A run was not started.
    RunSkipped {
        /// One of `already_running`, `no_seeds`, `no_connection`
        reason: String,
    },
    /// A new similar artist was committed.
    ArtistAdded {
        artist_id: String,
        name: String,
        /// Seed whose similarity list produced the artist
        seed_id: String,
    },
    /// Albums were appended to a similar artist.
    AlbumsAppended { artist_id: String, count: usize },
    /// A seed's similarity lookup was committed.
    SeedExpanded { seed_id: String, similar_count: usize },
    /// A genre feed was fetched and marked terminal.
    GenreFeedFetched { genre: String, album_count: usize },
    /// Both stages ran to completion.
    RunCompleted {
        generation: u64,
        artists_added: usize,
        genres_fetched: usize,
        bootstrapped: bool,
    },
    /// The run noticed a newer generation and stopped.
    RunCancelled { generation: u64 },
}

impl ExploreEvent {
    fn description(&self) -> &str {
        match self {
            ExploreEvent::RunStarted { .. } => "Explore run started",
            ExploreEvent::RunSkipped { .. } => "Explore run skipped",
            ExploreEvent::ArtistAdded { .. } => "Similar artist added",
            ExploreEvent::AlbumsAppended { .. } => "Albums appended to similar artist",
            ExploreEvent::SeedExpanded { .. } => "Seed artist expanded",
            ExploreEvent::GenreFeedFetched { .. } => "Genre feed fetched",
            ExploreEvent::RunCompleted { .. } => "Explore run completed",
            ExploreEvent::RunCancelled { .. } => "Explore run cancelled",
        }
    }
}

// ============================================================================
// Session Events
// ============================================================================

/// Session lifecycle events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SessionEvent {
    /// The session generation advanced; in-flight runs are superseded.
    Invalidated {
        /// The new generation
        generation: u64,
    },
}

impl SessionEvent {
    fn description(&self) -> &str {
        match self {
            SessionEvent::Invalidated { .. } => "Explore session invalidated",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central broadcast channel for [`CoreEvent`]s.
///
/// Cheap to clone; every clone publishes into the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// Subscribers that fall behind by more than `capacity` events receive
    /// `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let event_bus = EventBus::new(100);
/// let explore_only = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Explore(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map(|f| f(event)).unwrap_or(true)
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without waiting.
    ///
    /// Returns `None` if no matching event is currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
