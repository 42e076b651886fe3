//! Analysis graph - one attached source feeding a fixed-size window
//!
//! The graph is the native counterpart of an audio context with a single
//! analyser node: it can be opened and closed, holds at most one source,
//! and hands out the latest time-domain window once per frame.

use std::fmt;
use std::time::Duration;

use marionette_core::{MarionetteError, MarionetteResult};
use tracing::debug;

use crate::{SampleSource, FFT_SIZES};

/// Identifies one attachment; stale ids are ignored on detach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttachmentId(pub u64);

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attachment-{}", self.0)
    }
}

/// Lifecycle of the analysis graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphState {
    /// Never opened, or released by `close`
    Closed,
    Open,
}

/// Single-analyser audio graph
pub struct AnalysisGraph {
    state: GraphState,
    sample_rate: u32,
    window: Vec<f32>,
    source: Option<(AttachmentId, Box<dyn SampleSource>)>,
    next_id: u64,
}

impl AnalysisGraph {
    pub fn new(fft_size: usize, sample_rate: u32) -> MarionetteResult<Self> {
        if !FFT_SIZES.contains(&fft_size) {
            return Err(MarionetteError::AudioGraph(format!(
                "analyser window {fft_size} not supported"
            )));
        }
        if sample_rate == 0 {
            return Err(MarionetteError::AudioGraph("sample rate is zero".into()));
        }
        Ok(Self {
            state: GraphState::Closed,
            sample_rate,
            window: vec![0.0; fft_size],
            source: None,
            next_id: 0,
        })
    }

    /// Open (or reopen) the graph; no-op when already open
    pub fn open(&mut self) {
        if self.state == GraphState::Closed {
            debug!(fft_size = self.window.len(), sample_rate = self.sample_rate, "analysis graph opened");
            self.state = GraphState::Open;
        }
    }

    /// Attach a source, disconnecting any previous one
    pub fn attach(&mut self, source: Box<dyn SampleSource>) -> AttachmentId {
        self.open();
        self.disconnect_current();
        self.next_id += 1;
        let id = AttachmentId(self.next_id);
        debug!(id = %id, kind = source.kind(), "source attached");
        self.source = Some((id, source));
        id
    }

    /// Disconnect the source if `id` is still the current attachment
    pub fn detach(&mut self, id: AttachmentId) -> bool {
        if self.current() == Some(id) {
            self.disconnect_current();
            true
        } else {
            false
        }
    }

    fn disconnect_current(&mut self) {
        if let Some((id, mut source)) = self.source.take() {
            source.disconnect();
            debug!(id = %id, kind = source.kind(), "source disconnected");
        }
    }

    /// Pull the latest window; `None` when closed or nothing is attached
    pub fn read(&mut self, elapsed: Duration) -> Option<&[f32]> {
        if self.state != GraphState::Open {
            return None;
        }
        let (_, source) = self.source.as_mut()?;
        source.read_window(elapsed, self.sample_rate, &mut self.window);
        Some(self.window.as_slice())
    }

    /// Disconnect everything and release the graph
    pub fn close(&mut self) {
        self.disconnect_current();
        if self.state == GraphState::Open {
            debug!("analysis graph closed");
        }
        self.state = GraphState::Closed;
        self.window.fill(0.0);
    }

    pub fn state(&self) -> GraphState {
        self.state
    }

    pub fn current(&self) -> Option<AttachmentId> {
        self.source.as_ref().map(|(id, _)| *id)
    }

    pub fn fft_size(&self) -> usize {
        self.window.len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl fmt::Debug for AnalysisGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisGraph")
            .field("state", &self.state)
            .field("fft_size", &self.window.len())
            .field("source", &self.source.as_ref().map(|(id, s)| (*id, s.kind())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MediaStream, SampleFeed};

    #[test]
    fn test_attach_is_exclusive() {
        let mut graph = AnalysisGraph::new(256, 48_000).unwrap();
        let first = SampleFeed::new(512);
        let second = SampleFeed::new(512);

        let a = graph.attach(first.create_source().unwrap());
        let b = graph.attach(second.create_source().unwrap());
        assert_ne!(a, b);
        assert!(!first.is_connected());
        assert!(second.is_connected());
        assert_eq!(graph.current(), Some(b));

        // Stale id is ignored
        assert!(!graph.detach(a));
        assert!(second.is_connected());
        assert!(graph.detach(b));
        assert!(!second.is_connected());
        assert_eq!(graph.current(), None);
    }

    #[test]
    fn test_read_requires_open_and_source() {
        let mut graph = AnalysisGraph::new(256, 48_000).unwrap();
        assert_eq!(graph.state(), GraphState::Closed);
        assert!(graph.read(Duration::ZERO).is_none());

        let feed = SampleFeed::new(512);
        feed.push(&[0.5; 256]);
        graph.attach(feed.create_source().unwrap());
        assert_eq!(graph.state(), GraphState::Open);
        assert_eq!(graph.read(Duration::ZERO).map(|w| w.len()), Some(256));

        graph.close();
        assert!(graph.read(Duration::ZERO).is_none());
        assert!(!feed.is_connected());
        graph.close();
    }

    #[test]
    fn test_unsupported_window() {
        assert!(matches!(
            AnalysisGraph::new(300, 48_000),
            Err(MarionetteError::AudioGraph(_))
        ));
    }
}
