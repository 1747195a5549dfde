use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Tracked playback events a session can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    Start,
    FirstQuartile,
    Midpoint,
    ThirdQuartile,
    Complete,
    Skip,
    Click,
}

impl EventKind {
    /// Quartile events paired with the percentage that triggers them, ascending
    pub const QUARTILES: [(f64, EventKind); 3] = [
        (25.0, EventKind::FirstQuartile),
        (50.0, EventKind::Midpoint),
        (75.0, EventKind::ThirdQuartile),
    ];

    /// The `event` attribute value used by VAST `<Tracking>` elements
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Start => "start",
            EventKind::FirstQuartile => "firstQuartile",
            EventKind::Midpoint => "midpoint",
            EventKind::ThirdQuartile => "thirdQuartile",
            EventKind::Complete => "complete",
            EventKind::Skip => "skip",
            EventKind::Click => "click",
        }
    }

    /// Whether the event may fire more than once per session
    pub fn is_repeatable(&self) -> bool {
        matches!(self, EventKind::Click)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(EventKind::Start),
            "firstQuartile" => Ok(EventKind::FirstQuartile),
            "midpoint" => Ok(EventKind::Midpoint),
            "thirdQuartile" => Ok(EventKind::ThirdQuartile),
            "complete" => Ok(EventKind::Complete),
            "skip" => Ok(EventKind::Skip),
            "click" => Ok(EventKind::Click),
            other => Err(format!("unsupported tracking event: {}", other)),
        }
    }
}

/// Everything the player needs from one VAST document
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct AdDescriptor {
    /// The media file URL
    pub media_url: String,

    /// The media file MIME type
    pub media_type: Option<String>,

    /// The media file width
    pub media_width: Option<u32>,

    /// The media file height
    pub media_height: Option<u32>,

    /// The click-through URL opened when the viewer clicks the ad
    pub click_through_url: Option<String>,

    /// Click tracking URL fired on every click
    pub click_tracking_url: Option<String>,

    /// Impression tracking URL
    pub impression_url: Option<String>,

    /// Seconds of playback before the ad can be skipped; `None` means never
    pub skip_offset_seconds: Option<f64>,

    /// One tracking URL per event kind; a later `<Tracking>` for the same kind replaces an earlier one
    pub tracking_events: BTreeMap<EventKind, String>,

    /// The ad title
    pub ad_title: Option<String>,

    /// Declared creative duration in seconds
    pub duration_seconds: Option<f64>,

    /// Error tracking URL, may contain `[ERRORCODE]`
    pub error_url: Option<String>,
}

impl AdDescriptor {
    pub fn tracking_url(&self, kind: EventKind) -> Option<&str> {
        self.tracking_events.get(&kind).map(String::as_str)
    }

    pub fn is_skippable(&self) -> bool {
        self.skip_offset_seconds.is_some()
    }
}
