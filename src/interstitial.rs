//! Countdown-gated full-screen interstitial.
//!
//! Wraps an externally served placement. The close control only appears once
//! the countdown reaches zero; the host drives the countdown by calling
//! [`Interstitial::tick`] once per second.

use crate::config::InterstitialConfig;
use crate::error::{AdError, Result};
use crate::host::{Overlay, Ticker};
use log::{debug, info, warn};
use std::time::Duration;

const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterstitialState {
    /// Created, overlay not yet opened
    Pending,
    Shown { countdown: u32 },
    Dismissible,
    Closed,
}

pub struct Interstitial<O: Overlay, T: Ticker> {
    config: InterstitialConfig,
    overlay: O,
    ticker: T,
    state: InterstitialState,
    on_close: Option<Box<dyn FnOnce()>>,
    on_error: Option<Box<dyn FnOnce(&AdError)>>,
}

impl<O: Overlay, T: Ticker> Interstitial<O, T> {
    pub fn new(config: InterstitialConfig, overlay: O, ticker: T) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            overlay,
            ticker,
            state: InterstitialState::Pending,
            on_close: None,
            on_error: None,
        })
    }

    /// Invoked exactly once when the viewer closes the interstitial
    pub fn on_close(mut self, f: impl FnOnce() + 'static) -> Self {
        self.on_close = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnOnce(&AdError) + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    pub fn state(&self) -> InterstitialState {
        self.state
    }

    pub fn overlay(&self) -> &O {
        &self.overlay
    }

    /// Open the overlay, embed the placement and start the countdown
    pub fn show(&mut self) {
        if self.state != InterstitialState::Pending {
            return;
        }
        self.overlay.open();
        self.overlay.embed(&self.config.placement_url);
        info!("Interstitial shown: {}", self.config.placement_url);

        if self.config.countdown_seconds == 0 {
            self.make_dismissible();
        } else {
            self.state = InterstitialState::Shown {
                countdown: self.config.countdown_seconds,
            };
            self.overlay.show_countdown(self.config.countdown_seconds);
            self.ticker.start(TICK_PERIOD);
        }
    }

    /// One second elapsed
    pub fn tick(&mut self) {
        let InterstitialState::Shown { countdown } = self.state else {
            return;
        };
        let remaining = countdown.saturating_sub(1);
        if remaining == 0 {
            self.make_dismissible();
        } else {
            self.state = InterstitialState::Shown {
                countdown: remaining,
            };
            self.overlay.show_countdown(remaining);
        }
    }

    /// Close the interstitial; ignored until the countdown has finished
    pub fn close(&mut self) -> bool {
        if self.state != InterstitialState::Dismissible {
            debug!("Interstitial close ignored in state {:?}", self.state);
            return false;
        }
        self.teardown();
        if let Some(on_close) = self.on_close.take() {
            on_close();
        }
        true
    }

    /// The placement failed to load: remove the overlay and report
    pub fn fail(&mut self, error: AdError) {
        match self.state {
            InterstitialState::Closed => return,
            InterstitialState::Pending => self.state = InterstitialState::Closed,
            _ => self.teardown(),
        }
        warn!("Interstitial failed: {}", error);
        if let Some(on_error) = self.on_error.take() {
            on_error(&error);
        }
    }

    fn make_dismissible(&mut self) {
        self.ticker.cancel();
        self.state = InterstitialState::Dismissible;
        self.overlay.show_close_control();
    }

    fn teardown(&mut self) {
        self.ticker.cancel();
        self.overlay.remove();
        self.state = InterstitialState::Closed;
    }
}
