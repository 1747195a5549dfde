//! Standard inline player.
//!
//! Binds a [`PlaybackSession`] to a host surface and media element, renders the
//! "Ad" label and skip control, and turns host media signals into session calls.

use crate::beacon::BeaconDispatcher;
use crate::config::PlayerConfig;
use crate::error::{AdError, Result};
use crate::fetch::VastFetcher;
use crate::host::{MediaEvent, MediaHost, SkipControl, Surface};
use crate::parser;
use crate::session::{PlaybackSession, SessionState};
use log::{debug, info, warn};
use std::sync::Arc;

/// Lifecycle transitions reported to whoever drives the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Started,
    Completed,
    Skipped,
    Errored,
}

/// Issued by [`StandardPlayer::begin_load`]; only the latest ticket can finish a load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Descriptor parsed, media bound, player rendered
    Ready,
    /// The player was destroyed or reloaded while the document was in flight
    Discarded,
}

/// Caller notifications
#[derive(Default)]
pub struct PlayerCallbacks {
    on_complete: Option<Box<dyn FnMut()>>,
    on_skip: Option<Box<dyn FnMut()>>,
    on_error: Option<Box<dyn FnMut(&AdError)>>,
}

impl PlayerCallbacks {
    pub fn on_complete(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    pub fn on_skip(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_skip = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnMut(&AdError) + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }
}

pub struct StandardPlayer<S: Surface, M: MediaHost> {
    config: PlayerConfig,
    session: PlaybackSession,
    surface: S,
    media: M,
    callbacks: PlayerCallbacks,
    generation: u64,
    skip_control_visible: bool,
    destroyed: bool,
}

impl<S: Surface, M: MediaHost> StandardPlayer<S, M> {
    pub fn new(
        config: PlayerConfig,
        mut surface: S,
        media: M,
        dispatcher: Arc<dyn BeaconDispatcher>,
    ) -> Result<Self> {
        config.validate()?;
        surface.set_size(config.width, config.height);
        let session = PlaybackSession::new(dispatcher).with_skip_policy(config.skip_policy);

        Ok(Self {
            config,
            session,
            surface,
            media,
            callbacks: PlayerCallbacks::default(),
            generation: 0,
            skip_control_visible: false,
            destroyed: false,
        })
    }

    pub fn with_callbacks(mut self, callbacks: PlayerCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Start a load; hand the fetched document back through [`Self::finish_load`]
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        if !self.session.begin_load() {
            debug!("Load requested in state {}", self.session.state());
        }
        LoadTicket {
            generation: self.generation,
        }
    }

    /// Apply a fetched VAST document
    ///
    /// Results for a stale ticket, a destroyed player or a session that is no
    /// longer loading are dropped without touching anything.
    pub fn finish_load(&mut self, ticket: LoadTicket, fetched: Result<String>) -> Result<LoadOutcome> {
        if self.destroyed
            || ticket.generation != self.generation
            || self.session.state() != SessionState::Loading
        {
            debug!("Discarding VAST load for ticket {}", ticket.generation);
            return Ok(LoadOutcome::Discarded);
        }

        let descriptor = match fetched.and_then(|xml| parser::parse(&xml)) {
            Ok(descriptor) => Arc::new(descriptor),
            Err(e) => return Err(self.fail(e)),
        };
        self.session.attach(descriptor.clone());

        if let Err(e) = self.media.bind(&descriptor) {
            return Err(self.fail(e));
        }
        self.media.set_autoplay(self.config.is_autoplay());
        self.media.set_muted(self.config.is_muted());

        self.surface.show_ad_label();
        if self.session.skip_offset().is_some() {
            self.skip_control_visible = true;
            self.refresh_skip_control();
        }

        info!("Ad ready: {}", descriptor.media_url);

        if self.config.is_autoplay() {
            if let Err(e) = self.media.play() {
                return Err(self.fail(e));
            }
        }
        Ok(LoadOutcome::Ready)
    }

    /// Fetch the configured source and load it
    pub async fn load<F: VastFetcher>(&mut self, fetcher: &F) -> Result<LoadOutcome> {
        let ticket = self.begin_load();
        let fetched = fetcher.fetch(&self.config.source).await;
        self.finish_load(ticket, fetched)
    }

    /// Forward a host media signal
    pub fn handle_media_event(&mut self, event: MediaEvent) -> Option<Lifecycle> {
        if self.destroyed || self.session.state().is_terminal() {
            return None;
        }

        match event {
            MediaEvent::Playing => self.session.notify_started().then_some(Lifecycle::Started),
            MediaEvent::TimeUpdate { position, duration } => {
                self.session.advance_time(position, duration);
                self.refresh_skip_control();
                None
            }
            MediaEvent::Ended => {
                if !self.session.notify_completed() {
                    return None;
                }
                if let Some(on_complete) = self.callbacks.on_complete.as_mut() {
                    on_complete();
                }
                Some(Lifecycle::Completed)
            }
            MediaEvent::Error(reason) => {
                self.fail(AdError::MediaLoad(reason));
                Some(Lifecycle::Errored)
            }
        }
    }

    /// Viewer pressed the skip control
    pub fn skip(&mut self) -> Option<Lifecycle> {
        if self.destroyed || !self.session.skip() {
            return None;
        }
        self.media.pause();
        self.skip_control_visible = false;
        if let Some(on_skip) = self.callbacks.on_skip.as_mut() {
            on_skip();
        }
        Some(Lifecycle::Skipped)
    }

    /// Viewer clicked the video; returns the click-through URL to open
    pub fn click(&mut self) -> Option<String> {
        if self.destroyed {
            return None;
        }
        self.session.register_click()
    }

    /// Release the media and clear the surface; safe to call repeatedly
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.generation += 1;
        self.skip_control_visible = false;
        self.session.destroy();
        self.media.release();
        self.surface.clear();
        debug!("Player destroyed");
    }

    fn refresh_skip_control(&mut self) {
        if !self.skip_control_visible {
            return;
        }
        let control = SkipControl::for_remaining(
            self.session.skip_remaining_seconds(),
            self.session.is_skippable(),
        );
        self.surface.render_skip_control(&control);
    }

    /// Move to `Errored`, remove everything rendered and report to the caller
    fn fail(&mut self, error: AdError) -> AdError {
        warn!("Ad player error: {}", error);
        self.session.fail(&error);
        self.skip_control_visible = false;
        self.media.release();
        self.surface.clear();
        if let Some(on_error) = self.callbacks.on_error.as_mut() {
            on_error(&error);
        }
        error
    }
}
