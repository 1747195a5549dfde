//! Host environment collaborators.
//!
//! The engine never touches a real page. Whatever embeds it implements these
//! traits and forwards media signals as [`MediaEvent`] values.

use crate::error::Result;
use crate::models::AdDescriptor;
use std::time::Duration;

/// State of the skip button shown over a skippable ad
#[derive(Debug, Clone, PartialEq)]
pub struct SkipControl {
    pub enabled: bool,
    pub label: String,
}

impl SkipControl {
    /// Button state for the given number of seconds left before skipping unlocks
    pub fn for_remaining(remaining_seconds: f64, skippable: bool) -> Self {
        if skippable {
            Self {
                enabled: true,
                label: "Skip Ad →".to_string(),
            }
        } else {
            Self {
                enabled: false,
                label: format!("Skip in {}s", remaining_seconds.ceil().max(0.0) as u64),
            }
        }
    }
}

/// The element a player renders into
pub trait Surface {
    fn set_size(&mut self, width: u32, height: u32);
    /// Show the "Ad" badge
    fn show_ad_label(&mut self);
    fn render_skip_control(&mut self, control: &SkipControl);
    /// Animate the surface height to zero, leaving the element in place
    fn collapse(&mut self, transition: Duration);
    /// Remove everything the player rendered
    fn clear(&mut self);
}

/// Playable media element owned by a player
pub trait MediaHost {
    /// Point the element at the descriptor's media file
    fn bind(&mut self, descriptor: &AdDescriptor) -> Result<()>;
    fn set_autoplay(&mut self, autoplay: bool);
    fn set_muted(&mut self, muted: bool);
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self);
    /// Detach the media resource; must tolerate repeated calls
    fn release(&mut self);
}

/// Signals reported by a [`MediaHost`]
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    Playing,
    TimeUpdate { position: f64, duration: f64 },
    Ended,
    Error(String),
}

/// Full-screen layer used by the interstitial and rewarded formats
pub trait Overlay {
    fn open(&mut self);
    /// Embed an externally served placement
    fn embed(&mut self, placement_url: &str);
    fn show_countdown(&mut self, seconds: u32);
    fn show_close_control(&mut self);
    fn show_message(&mut self, text: &str);
    fn remove(&mut self);
}

/// Periodic timer; the host calls back into the owner on every period
pub trait Ticker {
    fn start(&mut self, period: Duration);
    /// Stop the timer; must tolerate repeated calls
    fn cancel(&mut self);
}

/// Viewport visibility observer for a surface
pub trait VisibilityDetector {
    /// Start reporting when the visible area ratio crosses `threshold`
    fn observe(&mut self, threshold: f64);
    fn disconnect(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_control_labels() {
        let waiting = SkipControl::for_remaining(2.2, false);
        assert!(!waiting.enabled);
        assert_eq!(waiting.label, "Skip in 3s");

        let ready = SkipControl::for_remaining(0.0, true);
        assert!(ready.enabled);
        assert_eq!(ready.label, "Skip Ad →");
    }
}
