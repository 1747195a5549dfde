//! Playback session: timing, quartiles, skip eligibility and tracking.
//!
//! A session is fed explicit signals by whoever owns the media handle. Every
//! tracked event except `click` is dispatched at most once per session.

use crate::beacon::{BeaconDispatcher, expand_error_code};
use crate::error::AdError;
use crate::models::{AdDescriptor, EventKind};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Lifecycle of one playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Loading,
    Ready,
    Playing,
    Completed,
    Skipped,
    Errored,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::Skipped | SessionState::Errored
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Loading => "loading",
            SessionState::Ready => "ready",
            SessionState::Playing => "playing",
            SessionState::Completed => "completed",
            SessionState::Skipped => "skipped",
            SessionState::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// Where the skip offset comes from
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipPolicy {
    /// Use the descriptor's `skipoffset`
    #[default]
    FromDescriptor,
    /// Never skippable, whatever the descriptor says
    Disabled,
    /// Skippable after this many seconds
    Override(f64),
}

/// State machine wrapping one ad playback
pub struct PlaybackSession {
    descriptor: Option<Arc<AdDescriptor>>,
    dispatcher: Arc<dyn BeaconDispatcher>,
    skip_policy: SkipPolicy,
    state: SessionState,
    current_time: f64,
    duration: f64,
    fired: HashSet<EventKind>,
    impression_fired: bool,
    error_fired: bool,
    destroyed: bool,
}

impl PlaybackSession {
    pub fn new(dispatcher: Arc<dyn BeaconDispatcher>) -> Self {
        Self {
            descriptor: None,
            dispatcher,
            skip_policy: SkipPolicy::FromDescriptor,
            state: SessionState::Idle,
            current_time: 0.0,
            duration: 0.0,
            fired: HashSet::new(),
            impression_fired: false,
            error_fired: false,
            destroyed: false,
        }
    }

    pub fn with_skip_policy(mut self, policy: SkipPolicy) -> Self {
        self.skip_policy = policy;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn descriptor(&self) -> Option<&AdDescriptor> {
        self.descriptor.as_deref()
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn percent_complete(&self) -> f64 {
        if self.duration > 0.0 {
            self.current_time / self.duration * 100.0
        } else {
            0.0
        }
    }

    /// Whether `kind` has been dispatched at least once
    pub fn has_fired(&self, kind: EventKind) -> bool {
        self.fired.contains(&kind)
    }

    pub fn fired_events(&self) -> &HashSet<EventKind> {
        &self.fired
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn accepts_calls(&self) -> bool {
        !self.destroyed && !self.state.is_terminal()
    }

    /// Idle -> Loading
    pub fn begin_load(&mut self) -> bool {
        if self.destroyed || self.state != SessionState::Idle {
            return false;
        }
        self.transition(SessionState::Loading);
        true
    }

    /// Loading -> Ready once the descriptor is parsed and the media is bound
    pub fn attach(&mut self, descriptor: Arc<AdDescriptor>) -> bool {
        if self.destroyed || self.state != SessionState::Loading {
            return false;
        }
        self.descriptor = Some(descriptor);
        self.transition(SessionState::Ready);
        true
    }

    /// Enter `Errored`; fires the descriptor's error URL once if there is one
    pub fn fail(&mut self, error: &AdError) -> bool {
        if !self.accepts_calls() {
            return false;
        }
        info!("Ad session failed [{}]: {}", error.code(), error);
        self.transition(SessionState::Errored);

        if !self.error_fired {
            self.error_fired = true;
            if let Some(url) = self.descriptor.as_ref().and_then(|d| d.error_url.clone()) {
                self.dispatcher
                    .send(&expand_error_code(&url, error.vast_error_code()));
            }
        }
        true
    }

    /// Record a new playback position and fire any quartiles it reaches
    ///
    /// Returns the quartile events fired by this call in ascending order.
    /// A non-positive or non-finite duration makes the call a no-op.
    pub fn advance_time(&mut self, now_seconds: f64, duration_seconds: f64) -> Vec<EventKind> {
        let mut fired = Vec::new();
        if !matches!(self.state, SessionState::Ready | SessionState::Playing) || self.destroyed {
            return fired;
        }
        if !duration_seconds.is_finite() || duration_seconds <= 0.0 || !now_seconds.is_finite() {
            return fired;
        }

        self.current_time = now_seconds.max(0.0);
        self.duration = duration_seconds;
        let percent = self.percent_complete();

        for (threshold, kind) in EventKind::QUARTILES {
            if percent >= threshold && self.fire(kind) {
                fired.push(kind);
            }
        }
        fired
    }

    /// First play signal: Ready -> Playing, fires impression and `start` once
    pub fn notify_started(&mut self) -> bool {
        if self.destroyed || self.state != SessionState::Ready {
            return false;
        }
        self.transition(SessionState::Playing);

        if !self.impression_fired {
            self.impression_fired = true;
            if let Some(url) = self.descriptor.as_ref().and_then(|d| d.impression_url.clone()) {
                self.dispatcher.send(&url);
            }
        }
        self.fire(EventKind::Start)
    }

    /// Natural end of playback; terminal
    pub fn notify_completed(&mut self) -> bool {
        if !self.accepts_calls() || !matches!(self.state, SessionState::Ready | SessionState::Playing) {
            return false;
        }
        self.transition(SessionState::Completed);
        self.fire(EventKind::Complete)
    }

    pub fn skip_offset(&self) -> Option<f64> {
        match self.skip_policy {
            SkipPolicy::Disabled => None,
            SkipPolicy::Override(seconds) => Some(seconds),
            SkipPolicy::FromDescriptor => self.descriptor.as_ref()?.skip_offset_seconds,
        }
    }

    /// Whether the viewer may skip right now
    pub fn is_skippable(&self) -> bool {
        if !matches!(self.state, SessionState::Ready | SessionState::Playing) || self.destroyed {
            return false;
        }
        self.skip_offset()
            .is_some_and(|offset| self.current_time >= offset)
    }

    /// Seconds until skipping unlocks; zero when not skippable at all
    pub fn skip_remaining_seconds(&self) -> f64 {
        match self.skip_offset() {
            Some(offset) => (offset - self.current_time).max(0.0),
            None => 0.0,
        }
    }

    /// User skip; ignored until the skip offset is reached
    pub fn skip(&mut self) -> bool {
        if !self.is_skippable() {
            debug!("Skip ignored in state {} at {:.2}s", self.state, self.current_time);
            return false;
        }
        self.transition(SessionState::Skipped);
        self.fire(EventKind::Skip)
    }

    /// User click: fires `click` and the click-tracking URL every time
    ///
    /// Returns the click-through URL to open, if any.
    pub fn register_click(&mut self) -> Option<String> {
        if self.destroyed || self.state == SessionState::Errored {
            return None;
        }
        let descriptor = self.descriptor.clone()?;
        self.fire(EventKind::Click);
        if let Some(url) = &descriptor.click_tracking_url {
            self.dispatcher.send(url);
        }
        descriptor.click_through_url.clone()
    }

    /// Mark the session as torn down; safe to call repeatedly from any state
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        debug!("Session destroyed in state {}", self.state);
    }

    /// Dispatch `kind` unless it already fired; returns whether it fired now
    fn fire(&mut self, kind: EventKind) -> bool {
        if !self.fired.insert(kind) && !kind.is_repeatable() {
            return false;
        }

        match self.descriptor.as_ref().and_then(|d| d.tracking_url(kind)) {
            Some(url) => {
                debug!("Tracking {} -> {}", kind, url);
                self.dispatcher.send(url);
            }
            None => debug!("Tracking {} (no URL)", kind),
        }
        true
    }

    fn transition(&mut self, to: SessionState) {
        debug!("Session state {} -> {}", self.state, to);
        self.state = to;
    }
}
