//! VAST video ad playback and tracking.
//!
//! A VAST document is parsed into an [`AdDescriptor`], driven through a
//! [`PlaybackSession`] that fires each tracking beacon at most once (clicks
//! excepted), and presented by a [`StandardPlayer`] or one of the wrapping
//! formats: [`Interstitial`], [`RewardedAd`] and [`OutstreamAd`].
//!
//! The host page is abstracted behind the traits in [`host`].

pub mod beacon;
pub mod config;
pub mod error;
pub mod fetch;
pub mod host;
pub mod interstitial;
pub mod models;
pub mod outstream;
pub mod parser;
pub mod player;
pub mod rewarded;
pub mod session;
pub mod testing;

pub use beacon::{BeaconConfig, BeaconDispatcher, HttpBeaconDispatcher, LogDispatcher};
pub use config::{InterstitialConfig, OutstreamConfig, PlayerConfig, RewardConfig};
pub use error::{AdError, Result};
pub use fetch::{FetchConfig, HttpFetcher, VastFetcher};
pub use host::{MediaEvent, MediaHost, Overlay, SkipControl, Surface, Ticker, VisibilityDetector};
pub use interstitial::{Interstitial, InterstitialState};
pub use models::{AdDescriptor, EventKind};
pub use outstream::OutstreamAd;
pub use player::{Lifecycle, LoadOutcome, LoadTicket, PlayerCallbacks, StandardPlayer};
pub use rewarded::{Reward, RewardedAd, RewardedState};
pub use session::{PlaybackSession, SessionState, SkipPolicy};

pub mod async_api {
    use crate::error::Result;
    use crate::fetch::VastFetcher;
    use crate::models::AdDescriptor;

    /// Fetch a VAST document and parse it
    pub async fn load_descriptor<F: VastFetcher>(fetcher: &F, source: &str) -> Result<AdDescriptor> {
        let xml = fetcher.fetch(source).await?;
        // Parsing is CPU-bound and small, so it runs inline
        crate::parser::parse(&xml)
    }
}
