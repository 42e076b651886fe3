//! Audio sources - where the analysed signal comes from
//!
//! A [`SampleSource`] is one tapped signal inside the analysis graph. It is
//! pulled once per frame for the most recent window of samples.

use std::collections::VecDeque;
use std::f32::consts::TAU;
use std::sync::Arc;
use std::time::Duration;

use marionette_core::{MarionetteError, MarionetteResult};
use parking_lot::Mutex;

/// Default test-tone frequency, in Hz
pub const DEFAULT_TONE_FREQUENCY: f32 = 220.0;

/// Default test-tone volume
pub const DEFAULT_TONE_VOLUME: f32 = 0.3;

/// Lowest volume a tapped media element is left at
pub const MEDIA_ELEMENT_MIN_VOLUME: f32 = 0.5;

/// One tapped signal in the analysis graph
pub trait SampleSource: Send {
    /// Advance by `elapsed` and fill `window` with the most recent samples,
    /// oldest first. Missing history reads as silence.
    fn read_window(&mut self, elapsed: Duration, sample_rate: u32, window: &mut [f32]);

    /// Disconnect from the graph; further reads produce silence
    fn disconnect(&mut self);

    /// Short label for logs
    fn kind(&self) -> &'static str;
}

/// A playable audio element that can be tapped (a browser `<audio>` or a
/// native player)
pub trait MediaElement {
    fn volume(&self) -> f32;

    fn set_volume(&mut self, volume: f32);

    /// Create a source tapping this element's output
    fn create_source(&mut self) -> MarionetteResult<Box<dyn SampleSource>>;
}

/// A live capture stream (e.g. a microphone)
pub trait MediaStream {
    /// Create a source tapping this stream
    fn create_source(&self) -> MarionetteResult<Box<dyn SampleSource>>;
}

// ---- Test tone ----

/// Sine oscillator through a gain stage
#[derive(Debug, Clone)]
pub struct TestTone {
    frequency: f32,
    volume: f32,
    /// Oscillator phase in cycles, [0, 1)
    phase: f32,
    connected: bool,
}

impl TestTone {
    pub fn new(frequency: f32, volume: f32) -> MarionetteResult<Self> {
        if !(frequency > 0.0) || !frequency.is_finite() {
            return Err(MarionetteError::AudioGraph(format!(
                "oscillator frequency {frequency} is not positive"
            )));
        }
        if !(0.0..=1.0).contains(&volume) {
            return Err(MarionetteError::AudioGraph(format!(
                "gain {volume} outside [0, 1]"
            )));
        }
        Ok(Self {
            frequency,
            volume,
            phase: 0.0,
            connected: true,
        })
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }
}

impl Default for TestTone {
    fn default() -> Self {
        Self {
            frequency: DEFAULT_TONE_FREQUENCY,
            volume: DEFAULT_TONE_VOLUME,
            phase: 0.0,
            connected: true,
        }
    }
}

impl SampleSource for TestTone {
    fn read_window(&mut self, elapsed: Duration, sample_rate: u32, window: &mut [f32]) {
        if !self.connected || sample_rate == 0 {
            window.fill(0.0);
            return;
        }
        let inc = self.frequency / sample_rate as f32;
        // The window ends at the current phase
        self.phase = (self.phase + inc * elapsed.as_secs_f32() * sample_rate as f32).fract();
        let start = (self.phase - inc * window.len() as f32).rem_euclid(1.0);
        for (i, sample) in window.iter_mut().enumerate() {
            let p = start + inc * i as f32;
            *sample = (p * TAU).sin() * self.volume;
        }
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    fn kind(&self) -> &'static str {
        "test_tone"
    }
}

// ---- Sample feed ----

#[derive(Debug)]
struct FeedBuffer {
    samples: VecDeque<f32>,
    capacity: usize,
    connected: bool,
}

/// Shared ring buffer of pushed samples.
///
/// The producer side (a capture callback, a decoder, a test script) pushes
/// samples; the graph reads the most recent window. Clones share the buffer.
#[derive(Debug, Clone)]
pub struct SampleFeed {
    inner: Arc<Mutex<FeedBuffer>>,
}

impl SampleFeed {
    /// Feed keeping at most `capacity` samples of history
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FeedBuffer {
                samples: VecDeque::with_capacity(capacity),
                capacity: capacity.max(1),
                connected: true,
            })),
        }
    }

    pub fn push(&self, samples: &[f32]) {
        let mut buf = self.inner.lock();
        for &s in samples {
            if buf.samples.len() == buf.capacity {
                buf.samples.pop_front();
            }
            buf.samples.push_back(s);
        }
    }

    /// Push `count` samples of a constant-amplitude square signal, whose
    /// RMS equals `amplitude`
    pub fn push_level(&self, amplitude: f32, count: usize) {
        let samples: Vec<f32> = (0..count)
            .map(|i| if i % 2 == 0 { amplitude } else { -amplitude })
            .collect();
        self.push(&samples);
    }

    /// Drop all buffered samples
    pub fn clear(&self) {
        self.inner.lock().samples.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_connected(&self) -> bool {
        self.inner.lock().connected
    }
}

impl SampleSource for SampleFeed {
    fn read_window(&mut self, _elapsed: Duration, _sample_rate: u32, window: &mut [f32]) {
        let buf = self.inner.lock();
        if !buf.connected {
            window.fill(0.0);
            return;
        }
        let available = buf.samples.len().min(window.len());
        let pad = window.len() - available;
        window[..pad].fill(0.0);
        let skip = buf.samples.len() - available;
        for (dst, src) in window[pad..].iter_mut().zip(buf.samples.iter().skip(skip)) {
            *dst = *src;
        }
    }

    fn disconnect(&mut self) {
        self.inner.lock().connected = false;
    }

    fn kind(&self) -> &'static str {
        "feed"
    }
}

impl MediaStream for SampleFeed {
    fn create_source(&self) -> MarionetteResult<Box<dyn SampleSource>> {
        let mut buf = self.inner.lock();
        buf.connected = true;
        drop(buf);
        Ok(Box::new(self.clone()))
    }
}

// ---- Clip player ----

#[derive(Debug)]
struct ClipState {
    samples: Vec<f32>,
    position: usize,
    volume: f32,
    playing: bool,
}

/// In-memory media element playing a mono clip.
///
/// Playback advances with the analysed time, so a frame-driven host hears
/// the clip at the rate the stage clock runs. Clones share playback state.
#[derive(Debug, Clone)]
pub struct ClipPlayer {
    state: Arc<Mutex<ClipState>>,
}

impl ClipPlayer {
    pub fn new(samples: Vec<f32>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ClipState {
                samples,
                position: 0,
                volume: 1.0,
                playing: false,
            })),
        }
    }

    pub fn play(&self) {
        self.state.lock().playing = true;
    }

    pub fn pause(&self) {
        self.state.lock().playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    /// Samples played so far
    pub fn position(&self) -> usize {
        self.state.lock().position
    }
}

impl MediaElement for ClipPlayer {
    fn volume(&self) -> f32 {
        self.state.lock().volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.state.lock().volume = volume.clamp(0.0, 1.0);
    }

    fn create_source(&mut self) -> MarionetteResult<Box<dyn SampleSource>> {
        Ok(Box::new(ClipTap {
            state: Arc::clone(&self.state),
            connected: true,
        }))
    }
}

/// Source tapping a [`ClipPlayer`]
#[derive(Debug)]
struct ClipTap {
    state: Arc<Mutex<ClipState>>,
    connected: bool,
}

impl SampleSource for ClipTap {
    fn read_window(&mut self, elapsed: Duration, sample_rate: u32, window: &mut [f32]) {
        window.fill(0.0);
        if !self.connected {
            return;
        }
        let mut clip = self.state.lock();
        if !clip.playing {
            return;
        }
        let advance = (elapsed.as_secs_f64() * sample_rate as f64).round() as usize;
        clip.position = (clip.position + advance).min(clip.samples.len());
        if clip.position == clip.samples.len() {
            clip.playing = false;
        }

        let end = clip.position;
        let start = end.saturating_sub(window.len());
        let pad = window.len() - (end - start);
        let volume = clip.volume;
        for (dst, src) in window[pad..].iter_mut().zip(&clip.samples[start..end]) {
            *dst = *src * volume;
        }
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    fn kind(&self) -> &'static str {
        "media_element"
    }
}
