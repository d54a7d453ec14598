//! Annotation storage for decoder output
//!
//! Protocol decoders produce time-scoped labels ("annotations") for a channel.
//! This module keeps them per channel, sorted, and answers the range and
//! nearest queries the rendering layer issues on every repaint.
//!
//! # Main Types
//!
//! - [`AnnotationPayload`] - Capability required from a decoder's payload type
//! - [`AnnotationValue`] - Ready-made payload for decoders without their own type
//! - [`Annotation`] - A payload attached to a channel and an inclusive sample span
//! - [`AnnotationStore`] - Thread-safe per-channel containers
//! - [`AnnotationRange`] - Restartable result of a range query
//! - [`DecoderFeed`] - Channel-based hand-off from decoder workers
//!
//! # Concurrency
//!
//! Decoder runs may execute on a worker thread while the interaction thread
//! queries. The store follows a single writer / multiple readers discipline:
//! each channel lives behind an `Arc` snapshot inside an `RwLock`. A query
//! clones the snapshot and releases the lock, so it keeps observing exactly
//! the state it started with. Writers copy-on-write any snapshot still held
//! by a reader.
//!
//! # Query Cost
//!
//! Annotations are sorted by `(start, end, payload)`. Next to them each
//! channel keeps the running maximum of `end`, which is monotone and so can
//! be binary searched too. Range and nearest lookups are two binary searches
//! plus the scan over the matching slice.

pub mod feed;

pub use feed::{DecodeEvent, DecoderFeed, DecoderSender};

use crate::error::{NavError, Result};
use crate::types::{SampleRange, MAX_CHANNELS};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Capability required from an annotation payload: a total order and a string form
pub trait AnnotationPayload: Ord + fmt::Display + Clone + Send + Sync + 'static {}

impl<T> AnnotationPayload for T where T: Ord + fmt::Display + Clone + Send + Sync + 'static {}

/// Generic decoder payload
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnnotationValue {
    /// A decoded data word (rendered as hex)
    Data(u64),
    /// Free-form text
    Text(String),
    /// A protocol event, e.g. "START" or "ACK"
    Event(String),
    /// A protocol violation detected by the decoder
    Error(String),
}

impl fmt::Display for AnnotationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotationValue::Data(value) => write!(f, "0x{:02X}", value),
            AnnotationValue::Text(text) => write!(f, "{}", text),
            AnnotationValue::Event(event) => write!(f, "{}", event),
            AnnotationValue::Error(message) => write!(f, "ERROR: {}", message),
        }
    }
}

/// A decoder-produced label attached to one channel
///
/// The span is inclusive: `start..=end`. Annotations compare by
/// `(start, end, channel, payload)`, which within one channel is position
/// order with the payload as tie-break.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Annotation<T> {
    start: i64,
    end: i64,
    channel: usize,
    payload: T,
}

impl<T: AnnotationPayload> Annotation<T> {
    /// Create a new annotation; an inverted span is normalized
    pub fn new(channel: usize, payload: T, start: i64, end: i64) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
            channel,
            payload,
        }
    }

    /// Create an annotation covering a single sample
    pub fn at(channel: usize, payload: T, sample: i64) -> Self {
        Self::new(channel, payload, sample, sample)
    }

    /// Channel this annotation belongs to
    pub fn channel(&self) -> usize {
        self.channel
    }

    /// The decoder payload
    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// First sample covered
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Last sample covered (inclusive)
    pub fn end(&self) -> i64 {
        self.end
    }

    /// Covered samples as a half-open range
    pub fn span(&self) -> SampleRange {
        SampleRange::new(self.start, self.end.saturating_add(1))
    }

    /// Check if the annotation covers a sample
    pub fn contains(&self, sample: i64) -> bool {
        sample >= self.start && sample <= self.end
    }

    /// Distance in samples from the span to a sample (0 when contained)
    pub fn distance_to(&self, sample: i64) -> u64 {
        if sample < self.start {
            self.start.abs_diff(sample)
        } else if sample > self.end {
            sample.abs_diff(self.end)
        } else {
            0
        }
    }
}

impl<T: fmt::Display> fmt::Display for Annotation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.payload)
    }
}

/// Sorted annotations of one channel
#[derive(Debug, Clone)]
struct ChannelAnnotations<T> {
    items: Vec<Annotation<T>>,
    /// `max_end[i]` is the largest `end` among `items[..=i]`
    max_end: Vec<i64>,
}

impl<T> Default for ChannelAnnotations<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            max_end: Vec::new(),
        }
    }
}

impl<T: AnnotationPayload> ChannelAnnotations<T> {
    fn from_unsorted(mut items: Vec<Annotation<T>>) -> Self {
        // stable, so equal annotations keep submission order
        items.sort();
        let mut channel = Self {
            items,
            max_end: Vec::new(),
        };
        channel.rebuild_max_end(0);
        channel
    }

    fn insert(&mut self, annotation: Annotation<T>) {
        let idx = self.items.partition_point(|a| a <= &annotation);
        self.items.insert(idx, annotation);
        self.rebuild_max_end(idx);
    }

    fn extend(&mut self, annotations: Vec<Annotation<T>>) {
        if annotations.is_empty() {
            return;
        }
        self.items.extend(annotations);
        self.items.sort();
        self.rebuild_max_end(0);
    }

    fn rebuild_max_end(&mut self, from: usize) {
        self.max_end.truncate(from);
        let mut reach = if from == 0 {
            i64::MIN
        } else {
            self.max_end[from - 1]
        };
        for annotation in &self.items[from..] {
            reach = reach.max(annotation.end);
            self.max_end.push(reach);
        }
    }

    /// Index bounds of the candidates that may intersect `range`
    fn bounds(&self, range: &SampleRange) -> (usize, usize) {
        if range.is_empty() {
            return (0, 0);
        }
        let hi = self.items.partition_point(|a| a.start < range.end);
        let lo = self.max_end[..hi].partition_point(|&reach| reach < range.start);
        (lo, hi)
    }

    fn nearest(&self, sample: i64) -> Option<&Annotation<T>> {
        let after = self.items.partition_point(|a| a.start <= sample);

        let before = if after > 0 {
            let reach = self.max_end[after - 1];
            let target = reach.min(sample);
            // first annotation whose end reaches `target`; it contains the
            // sample when `reach >= sample`
            let idx = self.max_end[..after].partition_point(|&e| e < target);
            Some(&self.items[idx])
        } else {
            None
        };

        let next = self.items.get(after);
        match (before, next) {
            (Some(b), Some(n)) if n.distance_to(sample) < b.distance_to(sample) => Some(n),
            (Some(b), _) => Some(b),
            (None, n) => n,
        }
    }
}

/// Result of a range query: a restartable, lazily filtered view of a snapshot
///
/// The range keeps the channel snapshot alive, so iterating it later (or
/// several times) always yields the same annotations even if a decoder
/// commits a new run meanwhile.
#[derive(Debug, Clone)]
pub struct AnnotationRange<T> {
    snapshot: Arc<ChannelAnnotations<T>>,
    lo: usize,
    hi: usize,
    query: SampleRange,
}

impl<T: AnnotationPayload> AnnotationRange<T> {
    /// Iterate the matching annotations in ascending position order
    pub fn iter(&self) -> AnnotationIter<'_, T> {
        AnnotationIter {
            inner: self.snapshot.items[self.lo..self.hi].iter(),
            from: self.query.start,
        }
    }

    /// Check if no annotation intersects the query
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// The queried sample range
    pub fn query(&self) -> SampleRange {
        self.query
    }

    /// Collect the matching annotations
    pub fn to_vec(&self) -> Vec<Annotation<T>> {
        self.iter().cloned().collect()
    }
}

impl<'a, T: AnnotationPayload> IntoIterator for &'a AnnotationRange<T> {
    type Item = &'a Annotation<T>;
    type IntoIter = AnnotationIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over an [`AnnotationRange`]
#[derive(Debug, Clone)]
pub struct AnnotationIter<'a, T> {
    inner: std::slice::Iter<'a, Annotation<T>>,
    from: i64,
}

impl<'a, T> Iterator for AnnotationIter<'a, T> {
    type Item = &'a Annotation<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let from = self.from;
        self.inner.find(|a| a.end >= from)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.inner.size_hint().1)
    }
}

/// Per-channel annotation containers shared between decoder workers and readers
#[derive(Debug)]
pub struct AnnotationStore<T> {
    channels: RwLock<Vec<Arc<ChannelAnnotations<T>>>>,
    channel_count: usize,
    /// Bumped for every new capture; decoder output is tagged with it
    generation: AtomicU64,
}

impl<T: AnnotationPayload> Default for AnnotationStore<T> {
    fn default() -> Self {
        Self::new(MAX_CHANNELS)
    }
}

impl<T: AnnotationPayload> AnnotationStore<T> {
    /// Create a store for `channel_count` channels (clamped to `1..=MAX_CHANNELS`)
    pub fn new(channel_count: usize) -> Self {
        let channel_count = channel_count.clamp(1, MAX_CHANNELS);
        Self {
            channels: RwLock::new(empty_channels(channel_count)),
            channel_count,
            generation: AtomicU64::new(0),
        }
    }

    /// Number of channels this store accepts
    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    fn check_channel(&self, channel: usize) -> Result<()> {
        if channel >= self.channel_count {
            return Err(NavError::InvalidChannel {
                channel,
                max: self.channel_count,
            });
        }
        Ok(())
    }

    fn snapshot(&self, channel: usize) -> Result<Arc<ChannelAnnotations<T>>> {
        self.check_channel(channel)?;
        let channels = self.channels.read().unwrap_or_else(PoisonError::into_inner);
        Ok(channels[channel].clone())
    }

    /// Insert one annotation into its channel, keeping the channel sorted
    pub fn add_annotation(&self, annotation: Annotation<T>) -> Result<()> {
        self.check_channel(annotation.channel)?;
        let mut channels = self.channels.write().unwrap_or_else(PoisonError::into_inner);
        let channel = annotation.channel;
        Arc::make_mut(&mut channels[channel]).insert(annotation);
        Ok(())
    }

    /// Insert a batch of annotations in one write
    ///
    /// The batch is validated up front; on an invalid channel nothing is inserted.
    pub fn add_annotations<I>(&self, annotations: I) -> Result<usize>
    where
        I: IntoIterator<Item = Annotation<T>>,
    {
        let grouped = self.group_by_channel(annotations)?;
        let count = grouped.iter().map(Vec::len).sum();

        let mut channels = self.channels.write().unwrap_or_else(PoisonError::into_inner);
        for (channel, batch) in grouped.into_iter().enumerate() {
            if !batch.is_empty() {
                Arc::make_mut(&mut channels[channel]).extend(batch);
            }
        }
        drop(channels);

        tracing::debug!("Added {} annotations", count);
        Ok(count)
    }

    /// Atomically replace the contents of every channel with a new decoder run
    ///
    /// Readers observe either the previous run or the complete new one.
    pub fn replace_all<I>(&self, annotations: I) -> Result<usize>
    where
        I: IntoIterator<Item = Annotation<T>>,
    {
        let grouped = self.group_by_channel(annotations)?;
        let count = grouped.iter().map(Vec::len).sum();
        let replacement: Vec<_> = grouped
            .into_iter()
            .map(|batch| Arc::new(ChannelAnnotations::from_unsorted(batch)))
            .collect();

        *self.channels.write().unwrap_or_else(PoisonError::into_inner) = replacement;

        tracing::debug!("Replaced annotations with a run of {}", count);
        Ok(count)
    }

    fn group_by_channel<I>(&self, annotations: I) -> Result<Vec<Vec<Annotation<T>>>>
    where
        I: IntoIterator<Item = Annotation<T>>,
    {
        let mut grouped: Vec<Vec<Annotation<T>>> = vec![Vec::new(); self.channel_count];
        for annotation in annotations {
            self.check_channel(annotation.channel)?;
            grouped[annotation.channel].push(annotation);
        }
        Ok(grouped)
    }

    /// Remove every annotation of one channel
    pub fn clear_channel(&self, channel: usize) -> Result<()> {
        self.check_channel(channel)?;
        let mut channels = self.channels.write().unwrap_or_else(PoisonError::into_inner);
        channels[channel] = Arc::default();
        tracing::debug!("Cleared annotations of channel {}", channel);
        Ok(())
    }

    /// Remove every annotation of all channels
    pub fn clear_all(&self) {
        *self.channels.write().unwrap_or_else(PoisonError::into_inner) =
            empty_channels(self.channel_count);
        tracing::debug!("Cleared all annotations");
    }

    /// Current capture generation
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Clear every channel and start a new generation for a newly loaded capture
    ///
    /// Decoder output produced for an earlier generation is no longer committed.
    pub fn reset_for_capture(&self) -> u64 {
        let mut channels = self.channels.write().unwrap_or_else(PoisonError::into_inner);
        *channels = empty_channels(self.channel_count);
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        drop(channels);
        tracing::debug!("Annotation store reset, generation {}", generation);
        generation
    }

    /// Annotations of `channel` whose span intersects `[start, end)`
    pub fn annotations_in_range(
        &self,
        channel: usize,
        start: i64,
        end: i64,
    ) -> Result<AnnotationRange<T>> {
        let snapshot = self.snapshot(channel)?;
        let query = SampleRange::new(start, end);
        let (lo, hi) = snapshot.bounds(&query);
        tracing::trace!(
            "Range query on channel {} {}: {} candidates",
            channel,
            query,
            hi.saturating_sub(lo)
        );
        Ok(AnnotationRange {
            snapshot,
            lo,
            hi: hi.max(lo),
            query,
        })
    }

    /// The annotation containing `sample`, or else the one closest to it
    ///
    /// On equal distance the annotation before the sample wins.
    pub fn nearest_annotation(&self, channel: usize, sample: i64) -> Result<Option<Annotation<T>>> {
        let snapshot = self.snapshot(channel)?;
        Ok(snapshot.nearest(sample).cloned())
    }

    /// Number of annotations on a channel
    pub fn len(&self, channel: usize) -> Result<usize> {
        Ok(self.snapshot(channel)?.items.len())
    }

    /// Total number of annotations across all channels
    pub fn total_len(&self) -> usize {
        let channels = self.channels.read().unwrap_or_else(PoisonError::into_inner);
        channels.iter().map(|c| c.items.len()).sum()
    }

    /// Check if no channel holds any annotation
    pub fn is_empty(&self) -> bool {
        self.total_len() == 0
    }
}

fn empty_channels<T>(count: usize) -> Vec<Arc<ChannelAnnotations<T>>> {
    (0..count).map(|_| Arc::default()).collect()
}
