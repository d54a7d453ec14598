//! Hand-off of decoder output to the annotation store
//!
//! Decoders run on worker threads and report their results through a
//! crossbeam channel. The interaction thread pumps the feed; a run only
//! becomes visible once the decoder reports it finished, and then replaces
//! the previous run in one atomic commit.
//!
//! A sender is bound to the store generation current when it was created.
//! Loading a new capture bumps the generation, so output still in flight
//! for the previous capture is discarded instead of committed.

use super::{Annotation, AnnotationPayload, AnnotationStore};
use crate::error::Result;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::Arc;

/// Message sent from a decoder worker to the feed
#[derive(Debug, Clone)]
pub enum DecodeEvent<T> {
    /// A new decoder run begins; any unfinished run is discarded
    Started,
    /// One decoded annotation
    Annotation(Annotation<T>),
    /// The run completed and should replace the stored annotations
    Finished,
    /// The run was cancelled; its annotations are dropped
    Aborted,
}

type Tagged<T> = (u64, DecodeEvent<T>);

/// Worker-side handle for reporting decoder output
#[derive(Debug, Clone)]
pub struct DecoderSender<T> {
    tx: Sender<Tagged<T>>,
    generation: u64,
}

impl<T: AnnotationPayload> DecoderSender<T> {
    fn send(&self, event: DecodeEvent<T>) -> bool {
        self.tx.send((self.generation, event)).is_ok()
    }

    /// Store generation this sender reports for
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Announce the start of a decoder run
    pub fn start(&self) -> bool {
        self.send(DecodeEvent::Started)
    }

    /// Report one annotation as a `(channel, payload, start, end)` tuple
    pub fn annotate(&self, channel: usize, payload: T, start: i64, end: i64) -> bool {
        self.send(DecodeEvent::Annotation(Annotation::new(
            channel, payload, start, end,
        )))
    }

    /// Mark the run as complete
    pub fn finish(&self) -> bool {
        self.send(DecodeEvent::Finished)
    }

    /// Cancel the current run
    pub fn abort(&self) -> bool {
        self.send(DecodeEvent::Aborted)
    }
}

/// Interaction-side end of the decoder channel
pub struct DecoderFeed<T> {
    tx: Sender<Tagged<T>>,
    rx: Receiver<Tagged<T>>,
    store: Arc<AnnotationStore<T>>,
    pending: Vec<Annotation<T>>,
    pending_generation: u64,
    in_run: bool,
}

impl<T: AnnotationPayload> DecoderFeed<T> {
    /// Create a feed committing into `store`
    pub fn new(store: Arc<AnnotationStore<T>>) -> Self {
        let (tx, rx) = unbounded();
        Self {
            tx,
            rx,
            store,
            pending: Vec::new(),
            pending_generation: 0,
            in_run: false,
        }
    }

    /// Create a sender for a decoder worker, bound to the current capture
    pub fn sender(&self) -> DecoderSender<T> {
        DecoderSender {
            tx: self.tx.clone(),
            generation: self.store.generation(),
        }
    }

    /// Check if a run has started but not yet finished
    pub fn is_decoding(&self) -> bool {
        self.in_run
    }

    /// Number of annotations received for the unfinished run
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drain all queued events, committing finished runs
    ///
    /// Returns the number of runs committed. A run containing an annotation
    /// for an invalid channel is dropped as a whole and the error returned
    /// after the remaining events have been processed. Events sent for an
    /// earlier store generation are dropped.
    pub fn pump(&mut self) -> Result<usize> {
        let mut committed = 0;
        let mut first_error = None;
        let current = self.store.generation();

        if self.in_run && self.pending_generation != current {
            tracing::debug!(
                "Discarding decoder run of a previous capture ({} annotations)",
                self.pending.len()
            );
            self.pending.clear();
            self.in_run = false;
        }

        let mut stale = 0usize;
        while let Ok((generation, event)) = self.rx.try_recv() {
            if generation != current {
                stale += 1;
                continue;
            }
            self.pending_generation = generation;
            match event {
                DecodeEvent::Started => {
                    if self.in_run && !self.pending.is_empty() {
                        tracing::debug!(
                            "Discarding unfinished decoder run ({} annotations)",
                            self.pending.len()
                        );
                    }
                    self.pending.clear();
                    self.in_run = true;
                }
                DecodeEvent::Annotation(annotation) => {
                    // annotations without a Started marker belong to an implicit run
                    self.in_run = true;
                    self.pending.push(annotation);
                }
                DecodeEvent::Finished => {
                    let run = std::mem::take(&mut self.pending);
                    self.in_run = false;
                    match self.store.replace_all(run) {
                        Ok(count) => {
                            tracing::debug!("Committed decoder run with {} annotations", count);
                            committed += 1;
                        }
                        Err(e) => {
                            tracing::warn!("Rejected decoder run: {}", e);
                            first_error.get_or_insert(e);
                        }
                    }
                }
                DecodeEvent::Aborted => {
                    tracing::debug!("Decoder run aborted");
                    self.pending.clear();
                    self.in_run = false;
                }
            }
        }

        if stale > 0 {
            tracing::debug!("Dropped {} decoder events of a previous capture", stale);
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(committed),
        }
    }
}
