use crate::error::{AdError, Result};
use crate::session::SkipPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Options for a standard player and the formats built on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerConfig {
    /// URL or path of the VAST document
    pub source: String,

    /// Render width in pixels
    pub width: u32,

    /// Render height in pixels
    pub height: u32,

    /// Start playback as soon as the media is bound. Unset means the
    /// presentation mode decides: off for the standard player.
    pub autoplay: Option<bool>,

    /// Start muted. Unset means the presentation mode decides: on for the
    /// standard player.
    pub muted: Option<bool>,

    /// Where the skip offset comes from
    pub skip_policy: SkipPolicy,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            source: String::new(),
            width: 640,
            height: 360,
            autoplay: None,
            muted: None,
            skip_policy: SkipPolicy::FromDescriptor,
        }
    }
}

impl PlayerConfig {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    /// Rewarded video: autoplay with sound, never skippable
    pub fn rewarded(source: impl Into<String>) -> Self {
        Self {
            autoplay: Some(true),
            muted: Some(false),
            skip_policy: SkipPolicy::Disabled,
            ..Self::new(source)
        }
    }

    /// Outstream video: autoplay, muted
    pub fn outstream(source: impl Into<String>) -> Self {
        Self {
            autoplay: Some(true),
            muted: Some(true),
            ..Self::new(source)
        }
    }

    pub fn is_autoplay(&self) -> bool {
        self.autoplay.unwrap_or(false)
    }

    pub fn is_muted(&self) -> bool {
        self.muted.unwrap_or(true)
    }

    /// Fill in autoplay and mute left unset by the caller
    pub fn with_mode_defaults(mut self, autoplay: bool, muted: bool) -> Self {
        self.autoplay.get_or_insert(autoplay);
        self.muted.get_or_insert(muted);
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_skip_offset(mut self, seconds: f64) -> Self {
        self.skip_policy = SkipPolicy::Override(seconds);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.source.trim().is_empty() {
            return Err(AdError::Config("a VAST source URL is required".to_string()));
        }
        if let SkipPolicy::Override(seconds) = self.skip_policy {
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(AdError::Config(format!("invalid skip offset: {}", seconds)));
            }
        }
        Ok(())
    }
}

/// Countdown-gated full-screen placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InterstitialConfig {
    /// Externally served placement shown inside the overlay
    pub placement_url: String,

    /// Seconds before the close control appears
    pub countdown_seconds: u32,
}

impl Default for InterstitialConfig {
    fn default() -> Self {
        Self {
            placement_url: String::new(),
            countdown_seconds: 5,
        }
    }
}

impl InterstitialConfig {
    pub fn new(placement_url: impl Into<String>) -> Self {
        Self {
            placement_url: placement_url.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.placement_url.trim().is_empty() {
            return Err(AdError::Config("a placement URL is required".to_string()));
        }
        Ok(())
    }
}

/// What a completed rewarded video grants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RewardConfig {
    pub reward_type: String,
    pub reward_amount: u32,
    /// How long the confirmation message stays up before the reward is handed out
    pub confirmation_ms: u64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            reward_type: "coins".to_string(),
            reward_amount: 1,
            confirmation_ms: 2000,
        }
    }
}

impl RewardConfig {
    pub fn confirmation(&self) -> Duration {
        Duration::from_millis(self.confirmation_ms)
    }
}

/// Visibility trigger and collapse behavior for outstream placements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OutstreamConfig {
    /// Fraction of the surface that must be in the viewport before loading
    pub visibility_threshold: f64,
    pub collapse_transition_ms: u64,
}

impl Default for OutstreamConfig {
    fn default() -> Self {
        Self {
            visibility_threshold: 0.5,
            collapse_transition_ms: 300,
        }
    }
}

impl OutstreamConfig {
    pub fn validate(&self) -> Result<()> {
        let threshold = self.visibility_threshold;
        if !threshold.is_finite() || threshold <= 0.0 || threshold > 1.0 {
            return Err(AdError::Config(format!(
                "visibility threshold must be in (0, 1], got {}",
                threshold
            )));
        }
        Ok(())
    }

    pub fn collapse_transition(&self) -> Duration {
        Duration::from_millis(self.collapse_transition_ms)
    }
}
