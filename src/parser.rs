use crate::error::{AdError, Result};
use crate::models::{AdDescriptor, EventKind};
use log::debug;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::str::from_utf8;

/// Skip offset used when a `skipoffset` attribute is present but unreadable
pub const DEFAULT_SKIP_OFFSET_SECONDS: f64 = 5.0;

/// Element whose text content is being collected
enum Field {
    MediaFile {
        mime_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
    },
    ClickThrough,
    ClickTracking,
    Impression,
    Tracking(Option<EventKind>),
    AdTitle,
    Duration,
    Error,
}

struct Capture {
    name: Vec<u8>,
    field: Field,
    text: String,
}

/// Parse a VAST XML string into an AdDescriptor
///
/// Fields are looked up by element name anywhere in the document and the first
/// match wins, except `<Tracking>` entries which fold into one URL per event
/// kind with the last one winning. Wrappers and ad pods are not followed.
pub fn parse(xml: &str) -> Result<AdDescriptor> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    reader.check_end_names(true);

    let mut buf = Vec::new();
    let mut descriptor = AdDescriptor::default();
    let mut capture: Option<Capture> = None;
    let mut skip_offset_seen = false;
    let mut depth: usize = 0;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                depth += 1;
                if e.local_name().as_ref() == b"Linear" && !skip_offset_seen {
                    if let Some(raw) = attribute(e, b"skipoffset") {
                        descriptor.skip_offset_seconds = Some(parse_skip_offset(&raw));
                        skip_offset_seen = true;
                    }
                }
                if capture.is_none() {
                    capture = start_capture(e, &descriptor);
                }
            }
            Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() == b"Linear" && !skip_offset_seen {
                    if let Some(raw) = attribute(e, b"skipoffset") {
                        descriptor.skip_offset_seconds = Some(parse_skip_offset(&raw));
                        skip_offset_seen = true;
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(capture) = capture.as_mut() {
                    // URLs with a bare `&` outside CDATA are common; keep them raw
                    match e.unescape() {
                        Ok(text) => capture.text.push_str(&text),
                        Err(_) => {
                            if let Ok(raw) = from_utf8(&e) {
                                capture.text.push_str(raw);
                            }
                        }
                    }
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(capture) = capture.as_mut() {
                    if let Ok(value) = from_utf8(&e) {
                        capture.text.push_str(value);
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                depth = depth.saturating_sub(1);
                let closes_capture = capture
                    .as_ref()
                    .is_some_and(|c| c.name.as_slice() == e.name().as_ref());
                if closes_capture {
                    if let Some(done) = capture.take() {
                        finish_capture(done, &mut descriptor);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(AdError::Xml(e)),
            _ => (),
        }
        buf.clear();
    }

    if depth != 0 {
        return Err(AdError::Parse("unexpected end of document".to_string()));
    }

    if descriptor.media_url.is_empty() {
        return Err(AdError::Parse("no MediaFile element found".to_string()));
    }

    debug!(
        "Parsed VAST descriptor: media={} skip_offset={:?} tracking_events={}",
        descriptor.media_url,
        descriptor.skip_offset_seconds,
        descriptor.tracking_events.len()
    );

    Ok(descriptor)
}

/// Decide whether an opening tag starts a field we still need
fn start_capture(e: &BytesStart, descriptor: &AdDescriptor) -> Option<Capture> {
    let field = match e.local_name().as_ref() {
        b"MediaFile" if descriptor.media_url.is_empty() => Field::MediaFile {
            mime_type: attribute(e, b"type"),
            width: attribute(e, b"width").and_then(|v| v.trim().parse().ok()),
            height: attribute(e, b"height").and_then(|v| v.trim().parse().ok()),
        },
        b"ClickThrough" if descriptor.click_through_url.is_none() => Field::ClickThrough,
        b"ClickTracking" if descriptor.click_tracking_url.is_none() => Field::ClickTracking,
        b"Impression" if descriptor.impression_url.is_none() => Field::Impression,
        b"Tracking" => {
            let event = attribute(e, b"event");
            let kind = event.as_deref().and_then(|name| match name.parse() {
                Ok(kind) => Some(kind),
                Err(reason) => {
                    debug!("Ignoring tracking element: {}", reason);
                    None
                }
            });
            Field::Tracking(kind)
        }
        b"AdTitle" if descriptor.ad_title.is_none() => Field::AdTitle,
        b"Duration" if descriptor.duration_seconds.is_none() => Field::Duration,
        b"Error" if descriptor.error_url.is_none() => Field::Error,
        _ => return None,
    };

    Some(Capture {
        name: e.name().as_ref().to_vec(),
        field,
        text: String::new(),
    })
}

/// Store the collected text in the descriptor
fn finish_capture(capture: Capture, descriptor: &mut AdDescriptor) {
    let text = capture.text.trim();
    if text.is_empty() {
        return;
    }
    let text = text.to_string();

    match capture.field {
        Field::MediaFile {
            mime_type,
            width,
            height,
        } => {
            descriptor.media_url = text;
            descriptor.media_type = mime_type;
            descriptor.media_width = width;
            descriptor.media_height = height;
        }
        Field::ClickThrough => descriptor.click_through_url = Some(text),
        Field::ClickTracking => descriptor.click_tracking_url = Some(text),
        Field::Impression => descriptor.impression_url = Some(text),
        Field::Tracking(Some(kind)) => {
            descriptor.tracking_events.insert(kind, text);
        }
        Field::Tracking(None) => (),
        Field::AdTitle => descriptor.ad_title = Some(text),
        Field::Duration => descriptor.duration_seconds = parse_timestamp(&text),
        Field::Error => descriptor.error_url = Some(text),
    }
}

/// Read an attribute value by name
fn attribute(e: &BytesStart, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            return match attr.unescape_value() {
                Ok(value) => Some(value.into_owned()),
                Err(_) => from_utf8(&attr.value).ok().map(str::to_string),
            };
        }
    }
    None
}

/// Convert a `skipoffset` value to seconds
///
/// Accepts `HH:MM:SS` (seconds may carry a fraction) or a bare integer.
/// Anything else falls back to [`DEFAULT_SKIP_OFFSET_SECONDS`].
pub fn parse_skip_offset(raw: &str) -> f64 {
    let raw = raw.trim();
    if raw.contains(':') {
        return parse_timestamp(raw).unwrap_or(DEFAULT_SKIP_OFFSET_SECONDS);
    }
    match raw.parse::<u32>() {
        Ok(seconds) => f64::from(seconds),
        Err(_) => DEFAULT_SKIP_OFFSET_SECONDS,
    }
}

/// Parse `HH:MM:SS[.mmm]` into seconds
pub fn parse_timestamp(raw: &str) -> Option<f64> {
    let mut parts = raw.trim().split(':');
    let hours = parts.next()?.trim().parse::<u32>().ok()?;
    let minutes = parts.next()?.trim().parse::<u32>().ok()?;
    let seconds = parts.next()?.trim().parse::<f64>().ok()?;
    if parts.next().is_some() || !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some(f64::from(hours) * 3600.0 + f64::from(minutes) * 60.0 + seconds)
}
