//! Outstream video: loads when scrolled into view, collapses when done.

use crate::beacon::BeaconDispatcher;
use crate::config::{OutstreamConfig, PlayerConfig};
use crate::error::Result;
use crate::fetch::VastFetcher;
use crate::host::{MediaEvent, MediaHost, Surface, VisibilityDetector};
use crate::player::{Lifecycle, LoadOutcome, LoadTicket, StandardPlayer};
use log::{debug, info};
use std::sync::Arc;

pub struct OutstreamAd<S: Surface, M: MediaHost, V: VisibilityDetector> {
    player: StandardPlayer<S, M>,
    detector: V,
    config: OutstreamConfig,
    observing: bool,
    triggered: bool,
    collapsed: bool,
}

impl<S: Surface, M: MediaHost, V: VisibilityDetector> OutstreamAd<S, M, V> {
    pub fn new(
        config: PlayerConfig,
        outstream: OutstreamConfig,
        surface: S,
        media: M,
        detector: V,
        dispatcher: Arc<dyn BeaconDispatcher>,
    ) -> Result<Self> {
        outstream.validate()?;
        let config = config.with_mode_defaults(true, true);
        let player = StandardPlayer::new(config, surface, media, dispatcher)?;
        Ok(Self {
            player,
            detector,
            config: outstream,
            observing: false,
            triggered: false,
            collapsed: false,
        })
    }

    pub fn player(&self) -> &StandardPlayer<S, M> {
        &self.player
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    /// Start watching the surface
    pub fn attach(&mut self) {
        if self.observing || self.triggered {
            return;
        }
        self.observing = true;
        self.detector.observe(self.config.visibility_threshold);
    }

    /// Visibility changed; the first qualifying report starts the load, later ones are ignored
    pub fn on_visibility(&mut self, visible_ratio: f64) -> Option<LoadTicket> {
        if self.triggered || self.player.is_destroyed() {
            return None;
        }
        if visible_ratio.is_nan() || visible_ratio < self.config.visibility_threshold {
            debug!("Outstream surface {:.0}% visible, waiting", visible_ratio * 100.0);
            return None;
        }

        self.triggered = true;
        self.stop_observing();
        info!("Outstream surface visible, loading ad");
        Some(self.player.begin_load())
    }

    pub fn finish_load(&mut self, ticket: LoadTicket, fetched: Result<String>) -> Result<LoadOutcome> {
        self.player.finish_load(ticket, fetched)
    }

    /// Convenience for hosts that can await inside the visibility callback
    pub async fn on_visibility_load<F: VastFetcher>(
        &mut self,
        visible_ratio: f64,
        fetcher: &F,
    ) -> Result<Option<LoadOutcome>> {
        let Some(ticket) = self.on_visibility(visible_ratio) else {
            return Ok(None);
        };
        let fetched = fetcher.fetch(&self.player.config().source).await;
        self.finish_load(ticket, fetched).map(Some)
    }

    pub fn handle_media_event(&mut self, event: MediaEvent) -> Option<Lifecycle> {
        let lifecycle = self.player.handle_media_event(event);
        if lifecycle == Some(Lifecycle::Completed) && !self.collapsed {
            self.collapsed = true;
            self.player
                .surface_mut()
                .collapse(self.config.collapse_transition());
            debug!("Outstream surface collapsed");
        }
        lifecycle
    }

    pub fn destroy(&mut self) {
        self.stop_observing();
        self.player.destroy();
    }

    fn stop_observing(&mut self) {
        if self.observing {
            self.observing = false;
            self.detector.disconnect();
        }
    }
}
