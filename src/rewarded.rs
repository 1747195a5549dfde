//! Rewarded video: a non-skippable player inside a full-screen overlay.
//!
//! The reward is granted once, only after the video plays to its natural end,
//! and only after a short confirmation message has been shown.

use crate::beacon::BeaconDispatcher;
use crate::config::{PlayerConfig, RewardConfig};
use crate::error::{AdError, Result};
use crate::fetch::VastFetcher;
use crate::host::{MediaEvent, MediaHost, Overlay, Surface, Ticker};
use crate::player::{Lifecycle, LoadOutcome, LoadTicket, StandardPlayer};
use crate::session::SkipPolicy;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Payload handed to the reward callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub reward_type: String,
    pub reward_amount: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardedState {
    Pending,
    Playing,
    /// Video completed, confirmation message visible
    Confirming,
    Rewarded,
    Closed,
}

pub struct RewardedAd<S: Surface, M: MediaHost, O: Overlay, T: Ticker> {
    player: StandardPlayer<S, M>,
    overlay: O,
    ticker: T,
    reward: RewardConfig,
    state: RewardedState,
    granted: bool,
    on_reward: Option<Box<dyn FnOnce(Reward)>>,
    on_error: Option<Box<dyn FnOnce(&AdError)>>,
}

impl<S: Surface, M: MediaHost, O: Overlay, T: Ticker> RewardedAd<S, M, O, T> {
    pub fn new(
        config: PlayerConfig,
        reward: RewardConfig,
        surface: S,
        media: M,
        overlay: O,
        ticker: T,
        dispatcher: Arc<dyn BeaconDispatcher>,
    ) -> Result<Self> {
        let config = PlayerConfig {
            skip_policy: SkipPolicy::Disabled,
            ..config.with_mode_defaults(true, false)
        };
        let player = StandardPlayer::new(config, surface, media, dispatcher)?;
        Ok(Self {
            player,
            overlay,
            ticker,
            reward,
            state: RewardedState::Pending,
            granted: false,
            on_reward: None,
            on_error: None,
        })
    }

    pub fn on_reward(mut self, f: impl FnOnce(Reward) + 'static) -> Self {
        self.on_reward = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnOnce(&AdError) + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    pub fn state(&self) -> RewardedState {
        self.state
    }

    pub fn player(&self) -> &StandardPlayer<S, M> {
        &self.player
    }

    pub fn overlay(&self) -> &O {
        &self.overlay
    }

    /// Open the overlay and start loading the video
    pub fn begin_load(&mut self) -> Option<LoadTicket> {
        if self.state != RewardedState::Pending {
            return None;
        }
        self.overlay.open();
        self.state = RewardedState::Playing;
        Some(self.player.begin_load())
    }

    pub fn finish_load(&mut self, ticket: LoadTicket, fetched: Result<String>) -> Result<LoadOutcome> {
        match self.player.finish_load(ticket, fetched) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    pub async fn load<F: VastFetcher>(&mut self, fetcher: &F) -> Result<LoadOutcome> {
        let Some(ticket) = self.begin_load() else {
            return Ok(LoadOutcome::Discarded);
        };
        let fetched = fetcher.fetch(&self.player.config().source).await;
        self.finish_load(ticket, fetched)
    }

    pub fn handle_media_event(&mut self, event: MediaEvent) -> Option<Lifecycle> {
        if self.state != RewardedState::Playing {
            return None;
        }
        let reason = match &event {
            MediaEvent::Error(reason) => reason.clone(),
            _ => String::new(),
        };
        let lifecycle = self.player.handle_media_event(event);
        match lifecycle {
            Some(Lifecycle::Completed) => self.confirm(),
            Some(Lifecycle::Errored) => self.fail(&AdError::MediaLoad(reason)),
            _ => (),
        }
        lifecycle
    }

    /// The confirmation message has been shown long enough
    pub fn confirmation_elapsed(&mut self) {
        if self.state != RewardedState::Confirming {
            return;
        }
        self.ticker.cancel();
        self.grant();
        self.state = RewardedState::Rewarded;
        self.teardown();
    }

    /// Viewer closed the overlay
    ///
    /// Before completion this forfeits the reward. The confirmation cannot be
    /// dismissed; only [`RewardedAd::confirmation_elapsed`] grants the reward.
    pub fn dismiss(&mut self) {
        match self.state {
            RewardedState::Confirming => debug!("Rewarded dismiss ignored during confirmation"),
            RewardedState::Pending | RewardedState::Playing => {
                info!("Rewarded ad dismissed before completion");
                self.state = RewardedState::Closed;
                self.teardown();
            }
            RewardedState::Rewarded | RewardedState::Closed => (),
        }
    }

    fn confirm(&mut self) {
        self.state = RewardedState::Confirming;
        self.overlay.show_message(&format!(
            "Reward earned: {} {}",
            self.reward.reward_amount, self.reward.reward_type
        ));
        self.ticker.start(self.reward.confirmation());
        debug!("Rewarded ad completed; confirming for {:?}", self.reward.confirmation());
    }

    fn grant(&mut self) {
        if self.granted {
            return;
        }
        self.granted = true;
        let reward = Reward {
            reward_type: self.reward.reward_type.clone(),
            reward_amount: self.reward.reward_amount,
        };
        info!("Granting reward {} x{}", reward.reward_type, reward.reward_amount);
        if let Some(on_reward) = self.on_reward.take() {
            on_reward(reward);
        }
    }

    fn fail(&mut self, error: &AdError) {
        self.state = RewardedState::Closed;
        self.teardown();
        if let Some(on_error) = self.on_error.take() {
            on_error(error);
        }
    }

    fn teardown(&mut self) {
        self.ticker.cancel();
        self.player.destroy();
        self.overlay.remove();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionState;
    use crate::testing::{
        FakeMedia, FakeOverlay, FakeSurface, FakeTicker, RecordingDispatcher, StaticFetcher, sample_vast,
    };
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    type TestRewarded = RewardedAd<FakeSurface, FakeMedia, FakeOverlay, FakeTicker>;

    struct Harness {
        ad: TestRewarded,
        overlay: FakeOverlay,
        ticker: FakeTicker,
        rewards: Rc<RefCell<Vec<Reward>>>,
        errors: Rc<RefCell<Vec<String>>>,
    }

    fn harness(media: FakeMedia) -> Harness {
        let overlay = FakeOverlay::new();
        let ticker = FakeTicker::new();
        let rewards = Rc::new(RefCell::new(Vec::new()));
        let errors = Rc::new(RefCell::new(Vec::new()));
        let (reward_sink, error_sink) = (rewards.clone(), errors.clone());

        let ad = RewardedAd::new(
            PlayerConfig::rewarded("vast.xml"),
            RewardConfig {
                reward_type: "gems".to_string(),
                reward_amount: 10,
                confirmation_ms: 1500,
            },
            FakeSurface::new(),
            media,
            overlay.clone(),
            ticker.clone(),
            Arc::new(RecordingDispatcher::new()),
        )
        .unwrap()
        .on_reward(move |r| reward_sink.borrow_mut().push(r))
        .on_error(move |e| error_sink.borrow_mut().push(e.to_string()));

        Harness {
            ad,
            overlay,
            ticker,
            rewards,
            errors,
        }
    }

    #[tokio::test]
    async fn completion_grants_reward_once() {
        let mut h = harness(FakeMedia::new());
        h.ad.load(&StaticFetcher::new(sample_vast(Some("00:00:01")))).await.unwrap();
        assert!(h.overlay.state().open);

        h.ad.handle_media_event(MediaEvent::Playing);
        h.ad.handle_media_event(MediaEvent::TimeUpdate { position: 10.0, duration: 30.0 });
        assert!(!h.ad.player().session().is_skippable());

        assert_eq!(h.ad.handle_media_event(MediaEvent::Ended), Some(Lifecycle::Completed));
        assert_eq!(h.ad.state(), RewardedState::Confirming);
        assert_eq!(h.overlay.state().message.as_deref(), Some("Reward earned: 10 gems"));
        assert_eq!(h.ticker.state().period, Some(Duration::from_millis(1500)));
        assert!(h.rewards.borrow().is_empty());

        h.ad.confirmation_elapsed();
        h.ad.confirmation_elapsed();
        h.ad.dismiss();

        assert_eq!(
            *h.rewards.borrow(),
            vec![Reward {
                reward_type: "gems".to_string(),
                reward_amount: 10
            }]
        );
        assert_eq!(h.ad.state(), RewardedState::Rewarded);
        assert!(!h.overlay.state().open);
        assert!(h.ad.player().is_destroyed());
        assert!(h.errors.borrow().is_empty());
    }

    #[tokio::test]
    async fn skip_is_always_disabled() {
        let mut h = harness(FakeMedia::new());
        h.ad.load(&StaticFetcher::new(sample_vast(Some("00:00:01")))).await.unwrap();
        h.ad.handle_media_event(MediaEvent::Playing);
        h.ad.handle_media_event(MediaEvent::TimeUpdate { position: 20.0, duration: 30.0 });
        let session = h.ad.player().session();
        assert_eq!(session.skip_offset(), None);
        assert!(!session.is_skippable());
        assert!(h.ad.player().surface().state().skip_control.is_none());
    }

    #[tokio::test]
    async fn load_error_never_rewards() {
        let mut h = harness(FakeMedia::failing("unsupported codec"));
        let result = h.ad.load(&StaticFetcher::new(sample_vast(None))).await;
        assert!(matches!(result, Err(AdError::MediaLoad(_))));

        assert_eq!(h.errors.borrow().len(), 1);
        assert!(h.rewards.borrow().is_empty());
        assert_eq!(h.ad.state(), RewardedState::Closed);
        assert!(!h.overlay.state().open);

        h.ad.handle_media_event(MediaEvent::Ended);
        h.ad.confirmation_elapsed();
        assert!(h.rewards.borrow().is_empty());
        assert_eq!(h.errors.borrow().len(), 1);
    }

    #[tokio::test]
    async fn playback_error_never_rewards() {
        let mut h = harness(FakeMedia::new());
        h.ad.load(&StaticFetcher::new(sample_vast(None))).await.unwrap();
        h.ad.handle_media_event(MediaEvent::Playing);
        assert_eq!(
            h.ad.handle_media_event(MediaEvent::Error("network".into())),
            Some(Lifecycle::Errored)
        );
        assert_eq!(h.ad.player().state(), SessionState::Errored);
        assert_eq!(h.errors.borrow().len(), 1);
        assert!(h.rewards.borrow().is_empty());
    }

    #[tokio::test]
    async fn dismiss_before_completion_forfeits() {
        let mut h = harness(FakeMedia::new());
        h.ad.load(&StaticFetcher::new(sample_vast(None))).await.unwrap();
        h.ad.handle_media_event(MediaEvent::Playing);
        h.ad.dismiss();
        assert_eq!(h.ad.handle_media_event(MediaEvent::Ended), None);
        h.ad.confirmation_elapsed();
        assert!(h.rewards.borrow().is_empty());
        assert_eq!(h.ad.state(), RewardedState::Closed);
    }

    #[tokio::test]
    async fn dismiss_while_confirming_waits_for_confirmation() {
        let mut h = harness(FakeMedia::new());
        h.ad.load(&StaticFetcher::new(sample_vast(None))).await.unwrap();
        h.ad.handle_media_event(MediaEvent::Playing);
        h.ad.handle_media_event(MediaEvent::Ended);

        h.ad.dismiss();
        assert!(h.rewards.borrow().is_empty());
        assert_eq!(h.ad.state(), RewardedState::Confirming);
        assert!(h.overlay.state().open);
        assert!(h.ticker.state().is_running());

        h.ad.confirmation_elapsed();
        assert_eq!(h.rewards.borrow().len(), 1);
        assert_eq!(h.ad.state(), RewardedState::Rewarded);
    }

    #[tokio::test]
    async fn source_only_config_autoplays_with_sound() {
        let media = FakeMedia::new();
        let config: PlayerConfig = serde_json::from_str(r#"{"source": "vast.xml"}"#).unwrap();
        let mut ad = RewardedAd::new(
            config,
            RewardConfig::default(),
            FakeSurface::new(),
            media.clone(),
            FakeOverlay::new(),
            FakeTicker::new(),
            Arc::new(RecordingDispatcher::new()),
        )
        .unwrap();
        ad.load(&StaticFetcher::new(sample_vast(None))).await.unwrap();

        let state = media.state();
        assert!(state.autoplay && !state.muted && state.playing);
    }
}
