//! In-memory host collaborators.
//!
//! Each fake is a cheap handle over shared state, so a clone kept by the caller
//! observes everything the player or orchestrator did with the original.

use crate::beacon::BeaconDispatcher;
use crate::error::{AdError, Result};
use crate::fetch::VastFetcher;
use crate::host::{MediaHost, Overlay, SkipControl, Surface, Ticker, VisibilityDetector};
use crate::models::AdDescriptor;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records every beacon URL instead of sending it
#[derive(Debug, Clone, Default)]
pub struct RecordingDispatcher {
    urls: Arc<Mutex<Vec<String>>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn count(&self, url: &str) -> usize {
        self.urls().iter().filter(|u| u.as_str() == url).count()
    }
}

impl BeaconDispatcher for RecordingDispatcher {
    fn send(&self, url: &str) {
        self.urls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(url.to_string());
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SurfaceState {
    pub size: Option<(u32, u32)>,
    pub ad_label: bool,
    pub skip_control: Option<SkipControl>,
    pub collapsed: Option<Duration>,
    pub clear_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FakeSurface {
    state: Rc<RefCell<SurfaceState>>,
}

impl FakeSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SurfaceState {
        self.state.borrow().clone()
    }
}

impl Surface for FakeSurface {
    fn set_size(&mut self, width: u32, height: u32) {
        self.state.borrow_mut().size = Some((width, height));
    }

    fn show_ad_label(&mut self) {
        self.state.borrow_mut().ad_label = true;
    }

    fn render_skip_control(&mut self, control: &SkipControl) {
        self.state.borrow_mut().skip_control = Some(control.clone());
    }

    fn collapse(&mut self, transition: Duration) {
        self.state.borrow_mut().collapsed = Some(transition);
    }

    fn clear(&mut self) {
        let mut state = self.state.borrow_mut();
        state.ad_label = false;
        state.skip_control = None;
        state.clear_count += 1;
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct MediaState {
    pub bound: Option<String>,
    pub autoplay: bool,
    pub muted: bool,
    pub playing: bool,
    pub release_count: usize,
}

/// Media element that records calls; can be told to fail binding
#[derive(Debug, Clone, Default)]
pub struct FakeMedia {
    state: Rc<RefCell<MediaState>>,
    bind_error: Option<String>,
}

impl FakeMedia {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            bind_error: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn state(&self) -> MediaState {
        self.state.borrow().clone()
    }
}

impl MediaHost for FakeMedia {
    fn bind(&mut self, descriptor: &AdDescriptor) -> Result<()> {
        if let Some(reason) = &self.bind_error {
            return Err(AdError::MediaLoad(reason.clone()));
        }
        self.state.borrow_mut().bound = Some(descriptor.media_url.clone());
        Ok(())
    }

    fn set_autoplay(&mut self, autoplay: bool) {
        self.state.borrow_mut().autoplay = autoplay;
    }

    fn set_muted(&mut self, muted: bool) {
        self.state.borrow_mut().muted = muted;
    }

    fn play(&mut self) -> Result<()> {
        self.state.borrow_mut().playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.state.borrow_mut().playing = false;
    }

    fn release(&mut self) {
        let mut state = self.state.borrow_mut();
        state.bound = None;
        state.playing = false;
        state.release_count += 1;
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct OverlayState {
    pub open: bool,
    pub placement: Option<String>,
    pub countdown: Option<u32>,
    pub close_control: bool,
    pub message: Option<String>,
    pub remove_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FakeOverlay {
    state: Rc<RefCell<OverlayState>>,
}

impl FakeOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> OverlayState {
        self.state.borrow().clone()
    }
}

impl Overlay for FakeOverlay {
    fn open(&mut self) {
        self.state.borrow_mut().open = true;
    }

    fn embed(&mut self, placement_url: &str) {
        self.state.borrow_mut().placement = Some(placement_url.to_string());
    }

    fn show_countdown(&mut self, seconds: u32) {
        self.state.borrow_mut().countdown = Some(seconds);
    }

    fn show_close_control(&mut self) {
        let mut state = self.state.borrow_mut();
        state.countdown = None;
        state.close_control = true;
    }

    fn show_message(&mut self, text: &str) {
        self.state.borrow_mut().message = Some(text.to_string());
    }

    fn remove(&mut self) {
        let mut state = self.state.borrow_mut();
        state.open = false;
        state.remove_count += 1;
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct TickerState {
    pub period: Option<Duration>,
    pub start_count: usize,
    pub cancel_count: usize,
}

impl TickerState {
    pub fn is_running(&self) -> bool {
        self.period.is_some()
    }
}

/// Timer that only records; tests call the owner's tick method themselves
#[derive(Debug, Clone, Default)]
pub struct FakeTicker {
    state: Rc<RefCell<TickerState>>,
}

impl FakeTicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TickerState {
        self.state.borrow().clone()
    }
}

impl Ticker for FakeTicker {
    fn start(&mut self, period: Duration) {
        let mut state = self.state.borrow_mut();
        state.period = Some(period);
        state.start_count += 1;
    }

    fn cancel(&mut self) {
        let mut state = self.state.borrow_mut();
        state.period = None;
        state.cancel_count += 1;
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct VisibilityState {
    pub threshold: Option<f64>,
    pub disconnect_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FakeVisibility {
    state: Rc<RefCell<VisibilityState>>,
}

impl FakeVisibility {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> VisibilityState {
        self.state.borrow().clone()
    }
}

impl VisibilityDetector for FakeVisibility {
    fn observe(&mut self, threshold: f64) {
        self.state.borrow_mut().threshold = Some(threshold);
    }

    fn disconnect(&mut self) {
        let mut state = self.state.borrow_mut();
        state.threshold = None;
        state.disconnect_count += 1;
    }
}

/// Serves one fixed document (or a fetch failure) for every source
#[derive(Debug, Clone)]
pub struct StaticFetcher {
    document: std::result::Result<String, String>,
}

impl StaticFetcher {
    pub fn new(xml: impl Into<String>) -> Self {
        Self {
            document: Ok(xml.into()),
        }
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            document: Err(reason.into()),
        }
    }
}

impl VastFetcher for StaticFetcher {
    async fn fetch(&self, _source: &str) -> Result<String> {
        self.document.clone().map_err(AdError::Fetch)
    }
}

/// A small skippable VAST document with every tracked event present
pub fn sample_vast(skip_offset: Option<&str>) -> String {
    let skip = skip_offset
        .map(|value| format!(r#" skipoffset="{}""#, value))
        .unwrap_or_default();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<VAST version="3.0">
  <Ad id="sample">
    <InLine>
      <AdSystem>Sample</AdSystem>
      <AdTitle>Sample Ad</AdTitle>
      <Impression>https://t.example.com/impression</Impression>
      <Error>https://t.example.com/error?code=[ERRORCODE]</Error>
      <Creatives>
        <Creative>
          <Linear{skip}>
            <Duration>00:00:30</Duration>
            <TrackingEvents>
              <Tracking event="start">https://t.example.com/start</Tracking>
              <Tracking event="firstQuartile">https://t.example.com/firstQuartile</Tracking>
              <Tracking event="midpoint">https://t.example.com/midpoint</Tracking>
              <Tracking event="thirdQuartile">https://t.example.com/thirdQuartile</Tracking>
              <Tracking event="complete">https://t.example.com/complete</Tracking>
              <Tracking event="skip">https://t.example.com/skip</Tracking>
            </TrackingEvents>
            <VideoClicks>
              <ClickThrough>https://advertiser.example.com/landing</ClickThrough>
              <ClickTracking>https://t.example.com/click</ClickTracking>
            </VideoClicks>
            <MediaFiles>
              <MediaFile delivery="progressive" type="video/mp4" width="640" height="360">https://cdn.example.com/ad.mp4</MediaFile>
            </MediaFiles>
          </Linear>
        </Creative>
      </Creatives>
    </InLine>
  </Ad>
</VAST>"#
    )
}
