//! End-to-end playback scenarios through the public API

use std::sync::Arc;

use vast_player::testing::{
    FakeMedia, FakeOverlay, FakeSurface, FakeTicker, FakeVisibility, RecordingDispatcher,
    StaticFetcher, sample_vast,
};
use vast_player::{
    AdError, EventKind, Lifecycle, LoadOutcome, MediaEvent, OutstreamAd, OutstreamConfig,
    PlaybackSession, PlayerConfig, RewardConfig, RewardedAd, SessionState, StandardPlayer,
    async_api, parser,
};

// =============================================================================
// Parser
// =============================================================================

#[test]
fn test_parse_skip_offsets() {
    let timestamp = parser::parse(&sample_vast(Some("00:00:05"))).unwrap();
    assert_eq!(timestamp.skip_offset_seconds, Some(5.0));

    let integer = parser::parse(&sample_vast(Some("12"))).unwrap();
    assert_eq!(integer.skip_offset_seconds, Some(12.0));

    let absent = parser::parse(&sample_vast(None)).unwrap();
    assert_eq!(absent.skip_offset_seconds, None);
}

#[tokio::test]
async fn test_load_descriptor_propagates_fetch_errors() {
    let err = async_api::load_descriptor(&StaticFetcher::failing("timeout"), "https://ads.example.com/vast")
        .await
        .unwrap_err();
    assert!(matches!(err, AdError::Fetch(_)));

    let descriptor = async_api::load_descriptor(&StaticFetcher::new(sample_vast(None)), "x")
        .await
        .unwrap();
    assert_eq!(descriptor.ad_title.as_deref(), Some("Sample Ad"));
    assert_eq!(descriptor.duration_seconds, Some(30.0));
}

// =============================================================================
// Session
// =============================================================================

#[test]
fn test_skip_scenario() {
    let recorder = RecordingDispatcher::new();
    let mut session = PlaybackSession::new(Arc::new(recorder.clone()));
    session.begin_load();
    session.attach(Arc::new(parser::parse(&sample_vast(Some("5"))).unwrap()));
    session.notify_started();

    session.advance_time(3.0, 30.0);
    assert!(!session.is_skippable());
    assert_eq!(session.skip_remaining_seconds(), 2.0);

    session.advance_time(6.0, 30.0);
    assert!(session.is_skippable());
    assert!(session.skip());
    assert!(!session.skip());
    assert_eq!(session.state(), SessionState::Skipped);
    assert_eq!(recorder.count("https://t.example.com/skip"), 1);
}

#[test]
fn test_at_most_once_under_bursty_updates() {
    let recorder = RecordingDispatcher::new();
    let mut session = PlaybackSession::new(Arc::new(recorder.clone()));
    session.begin_load();
    session.attach(Arc::new(parser::parse(&sample_vast(None)).unwrap()));

    for _ in 0..3 {
        session.notify_started();
    }
    let mut fired = Vec::new();
    for position in [1.0, 3.0, 27.0, 2.0, 27.0, 28.0, 29.9] {
        fired.extend(session.advance_time(position, 30.0));
        fired.extend(session.advance_time(position, 30.0));
    }
    session.notify_completed();
    session.notify_completed();

    assert_eq!(
        fired,
        vec![EventKind::FirstQuartile, EventKind::Midpoint, EventKind::ThirdQuartile]
    );
    for url in [
        "https://t.example.com/impression",
        "https://t.example.com/start",
        "https://t.example.com/firstQuartile",
        "https://t.example.com/midpoint",
        "https://t.example.com/thirdQuartile",
        "https://t.example.com/complete",
    ] {
        assert_eq!(recorder.count(url), 1, "{}", url);
    }
}

// =============================================================================
// Standard player
// =============================================================================

#[tokio::test]
async fn test_standard_player_full_playback() {
    let recorder = RecordingDispatcher::new();
    let surface = FakeSurface::new();
    let media = FakeMedia::new();
    let mut player = StandardPlayer::new(
        PlayerConfig::new("https://ads.example.com/vast.xml").with_size(300, 250),
        surface.clone(),
        media.clone(),
        Arc::new(recorder.clone()),
    )
    .unwrap();

    assert_eq!(
        player.load(&StaticFetcher::new(sample_vast(Some("00:00:05")))).await.unwrap(),
        LoadOutcome::Ready
    );
    assert_eq!(surface.state().size, Some((300, 250)));

    player.handle_media_event(MediaEvent::Playing);
    for second in 1..=30 {
        player.handle_media_event(MediaEvent::TimeUpdate {
            position: f64::from(second),
            duration: 30.0,
        });
    }
    assert_eq!(player.handle_media_event(MediaEvent::Ended), Some(Lifecycle::Completed));
    assert_eq!(player.state(), SessionState::Completed);
    assert_eq!(recorder.urls().len(), 6);

    player.destroy();
    player.destroy();
    assert_eq!(media.state().release_count, 1);
    assert!(!surface.state().ad_label);
}

// =============================================================================
// Orchestrators
// =============================================================================

#[tokio::test]
async fn test_rewarded_completion_and_error() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let rewards = Rc::new(RefCell::new(Vec::new()));
    let sink = rewards.clone();
    let mut ad = RewardedAd::new(
        PlayerConfig::rewarded("vast.xml"),
        RewardConfig::default(),
        FakeSurface::new(),
        FakeMedia::new(),
        FakeOverlay::new(),
        FakeTicker::new(),
        Arc::new(RecordingDispatcher::new()),
    )
    .unwrap()
    .on_reward(move |reward| sink.borrow_mut().push(reward));

    ad.load(&StaticFetcher::new(sample_vast(None))).await.unwrap();
    ad.handle_media_event(MediaEvent::Playing);
    ad.handle_media_event(MediaEvent::Ended);
    ad.confirmation_elapsed();
    assert_eq!(rewards.borrow().len(), 1);
    assert_eq!(rewards.borrow()[0].reward_type, "coins");
    assert_eq!(rewards.borrow()[0].reward_amount, 1);

    let errors = Rc::new(RefCell::new(0));
    let error_sink = errors.clone();
    let no_reward = Rc::new(RefCell::new(0));
    let reward_sink = no_reward.clone();
    let mut failing = RewardedAd::new(
        PlayerConfig::rewarded("vast.xml"),
        RewardConfig::default(),
        FakeSurface::new(),
        FakeMedia::failing("404"),
        FakeOverlay::new(),
        FakeTicker::new(),
        Arc::new(RecordingDispatcher::new()),
    )
    .unwrap()
    .on_reward(move |_| *reward_sink.borrow_mut() += 1)
    .on_error(move |_| *error_sink.borrow_mut() += 1);

    assert!(failing.load(&StaticFetcher::new(sample_vast(None))).await.is_err());
    failing.handle_media_event(MediaEvent::Ended);
    failing.confirmation_elapsed();
    assert_eq!(*errors.borrow(), 1);
    assert_eq!(*no_reward.borrow(), 0);
}

#[tokio::test]
async fn test_outstream_visibility_trigger_once() {
    let detector = FakeVisibility::new();
    let mut ad = OutstreamAd::new(
        PlayerConfig::outstream("vast.xml"),
        OutstreamConfig::default(),
        FakeSurface::new(),
        FakeMedia::new(),
        detector.clone(),
        Arc::new(RecordingDispatcher::new()),
    )
    .unwrap();
    ad.attach();

    let fetcher = StaticFetcher::new(sample_vast(None));
    let mut loads = 0;
    for ratio in [0.0, 0.3, 0.6, 0.0, 0.8, 0.0, 1.0] {
        if ad.on_visibility_load(ratio, &fetcher).await.unwrap().is_some() {
            loads += 1;
        }
    }
    assert_eq!(loads, 1);
    assert_eq!(ad.player().state(), SessionState::Ready);
}
