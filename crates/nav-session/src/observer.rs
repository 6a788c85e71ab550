//! Multi-subscriber fan-out for session events.
//!
//! Each event class has its own [`Channel`]: a listener list plus the last
//! published value.  A new subscriber receives the retained value
//! immediately.  Publishing iterates a copy of the listener list taken under
//! the lock and invokes listeners with the lock released, so a listener may
//! subscribe or unsubscribe (itself or others) from inside its callback.
//! Changes made during a dispatch take effect from the next publish.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use nav_core::{Location, SubscriptionId};
use nav_progress::{LocationMatcherResult, RouteProgress};
use nav_route::{BannerInstruction, VoiceInstruction};

/// Session lifecycle state.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SessionState {
    #[default]
    Stopped,
    Started,
}

/// Fallback map-data availability, relayed from the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FallbackVersionsEvent {
    /// The engine switched to fallback data; these versions are available.
    Found(Vec<String>),
    /// The latest map version is usable again.
    CanReturnToLatest(String),
}

pub type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

// ── Channel ───────────────────────────────────────────────────────────────────

struct ChannelInner<T> {
    listeners: Vec<(SubscriptionId, Listener<T>)>,
    retained:  Option<T>,
}

/// One event class: listeners and the retained last value.
pub struct Channel<T> {
    inner: Mutex<ChannelInner<T>>,
    ids:   Arc<AtomicU64>,
}

impl<T: Clone> Channel<T> {
    fn new(ids: Arc<AtomicU64>, initial: Option<T>) -> Self {
        Self {
            inner: Mutex::new(ChannelInner { listeners: Vec::new(), retained: initial }),
            ids,
        }
    }

    /// Add a listener.  If a value has been retained, the listener is called
    /// with it before this returns.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.ids.fetch_add(1, Ordering::Relaxed));
        let listener: Listener<T> = Arc::new(listener);
        let replay = {
            let mut inner = self.inner.lock();
            inner.listeners.push((id, Arc::clone(&listener)));
            inner.retained.clone()
        };
        if let Some(value) = replay {
            listener(&value);
        }
        id
    }

    /// Remove one listener.  Returns `false` if `id` was not subscribed here.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.listeners.len();
        inner.listeners.retain(|(sid, _)| *sid != id);
        inner.listeners.len() != before
    }

    pub fn unsubscribe_all(&self) {
        self.inner.lock().listeners.clear();
    }

    pub fn listener_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }

    /// The value a new subscriber would be replayed.
    pub fn latest(&self) -> Option<T> {
        self.inner.lock().retained.clone()
    }

    /// Retain `value` and deliver it to every current listener.
    pub(crate) fn publish(&self, value: T) {
        let listeners: Vec<Listener<T>> = {
            let mut inner = self.inner.lock();
            inner.retained = Some(value.clone());
            inner.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
        };
        for listener in listeners {
            listener(&value);
        }
    }

    /// Replace the retained value without notifying anyone.
    pub(crate) fn set_retained(&self, value: Option<T>) {
        self.inner.lock().retained = value;
    }
}

// ── TripObserver ──────────────────────────────────────────────────────────────

/// Receives every session event class through one object.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.  Register with
/// [`ObserverRegistry::register`].
pub trait TripObserver: Send + Sync {
    fn on_raw_location(&self, _location: &Location) {}
    fn on_matched_location(&self, _result: &LocationMatcherResult) {}
    fn on_route_progress(&self, _progress: &RouteProgress) {}
    fn on_off_route_changed(&self, _off_route: bool) {}
    fn on_session_state(&self, _state: SessionState) {}
    fn on_banner_instruction(&self, _banner: &BannerInstruction) {}
    fn on_voice_instruction(&self, _voice: &VoiceInstruction) {}
    fn on_fallback_versions(&self, _event: &FallbackVersionsEvent) {}
}

/// The subscriptions created by [`ObserverRegistry::register`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ObserverHandle {
    raw_location:      SubscriptionId,
    matched_location:  SubscriptionId,
    route_progress:    SubscriptionId,
    off_route:         SubscriptionId,
    session_state:     SubscriptionId,
    banner:            SubscriptionId,
    voice:             SubscriptionId,
    fallback_versions: SubscriptionId,
}

// ── ObserverRegistry ──────────────────────────────────────────────────────────

/// The session's event channels.
///
/// Subscribing and unsubscribing are safe from any thread.  Publishing is
/// crate-internal: only the session's processor publishes.
pub struct ObserverRegistry {
    raw_location:      Channel<Location>,
    matched_location:  Channel<LocationMatcherResult>,
    route_progress:    Channel<RouteProgress>,
    off_route:         Channel<bool>,
    session_state:     Channel<SessionState>,
    banner:            Channel<BannerInstruction>,
    voice:             Channel<VoiceInstruction>,
    fallback_versions: Channel<FallbackVersionsEvent>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        let ids = Arc::new(AtomicU64::new(1));
        Self {
            raw_location:      Channel::new(Arc::clone(&ids), None),
            matched_location:  Channel::new(Arc::clone(&ids), None),
            route_progress:    Channel::new(Arc::clone(&ids), None),
            off_route:         Channel::new(Arc::clone(&ids), Some(false)),
            session_state:     Channel::new(Arc::clone(&ids), Some(SessionState::Stopped)),
            banner:            Channel::new(Arc::clone(&ids), None),
            voice:             Channel::new(Arc::clone(&ids), None),
            fallback_versions: Channel::new(ids, None),
        }
    }

    pub fn raw_location(&self) -> &Channel<Location> { &self.raw_location }
    pub fn matched_location(&self) -> &Channel<LocationMatcherResult> { &self.matched_location }
    pub fn route_progress(&self) -> &Channel<RouteProgress> { &self.route_progress }
    pub fn off_route(&self) -> &Channel<bool> { &self.off_route }
    pub fn session_state(&self) -> &Channel<SessionState> { &self.session_state }
    pub fn banner(&self) -> &Channel<BannerInstruction> { &self.banner }
    pub fn voice(&self) -> &Channel<VoiceInstruction> { &self.voice }
    pub fn fallback_versions(&self) -> &Channel<FallbackVersionsEvent> { &self.fallback_versions }

    /// Subscribe `observer` to every channel.  Retained values are replayed
    /// channel by channel in declaration order.
    pub fn register(&self, observer: Arc<dyn TripObserver>) -> ObserverHandle {
        let o = Arc::clone(&observer);
        let raw_location = self.raw_location.subscribe(move |v| o.on_raw_location(v));
        let o = Arc::clone(&observer);
        let matched_location = self.matched_location.subscribe(move |v| o.on_matched_location(v));
        let o = Arc::clone(&observer);
        let route_progress = self.route_progress.subscribe(move |v| o.on_route_progress(v));
        let o = Arc::clone(&observer);
        let off_route = self.off_route.subscribe(move |v| o.on_off_route_changed(*v));
        let o = Arc::clone(&observer);
        let session_state = self.session_state.subscribe(move |v| o.on_session_state(*v));
        let o = Arc::clone(&observer);
        let banner = self.banner.subscribe(move |v| o.on_banner_instruction(v));
        let o = Arc::clone(&observer);
        let voice = self.voice.subscribe(move |v| o.on_voice_instruction(v));
        let o = observer;
        let fallback_versions = self.fallback_versions.subscribe(move |v| o.on_fallback_versions(v));

        ObserverHandle {
            raw_location,
            matched_location,
            route_progress,
            off_route,
            session_state,
            banner,
            voice,
            fallback_versions,
        }
    }

    pub fn unregister(&self, handle: &ObserverHandle) {
        self.raw_location.unsubscribe(handle.raw_location);
        self.matched_location.unsubscribe(handle.matched_location);
        self.route_progress.unsubscribe(handle.route_progress);
        self.off_route.unsubscribe(handle.off_route);
        self.session_state.unsubscribe(handle.session_state);
        self.banner.unsubscribe(handle.banner);
        self.voice.unsubscribe(handle.voice);
        self.fallback_versions.unsubscribe(handle.fallback_versions);
    }
}

impl Default for ObserverRegistry {
    fn default() -> Self {
        Self::new()
    }
}
