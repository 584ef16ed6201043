//! Background tracking loop and the snapshot slot it publishes into.
//!
//! One dedicated thread owns the [`EngineContext`], pulls frames from a
//! [`FrameSource`], and replaces the slot content with each complete
//! [`FrameResult`]. Readers only ever see whole frames. Commands and the
//! stop flag are checked between frames; a frame in progress always
//! finishes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use log::{info, warn};
use marker_pose_core::FrameObservations;

use crate::engine::{EngineCommand, EngineContext, FrameResult};

/// Single-writer, multi-reader slot holding the latest snapshot.
#[derive(Debug)]
pub struct SnapshotSlot<T> {
    inner: Arc<Mutex<Option<Arc<T>>>>,
}

impl<T> Clone for SnapshotSlot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for SnapshotSlot<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(None)),
        }
    }
}

impl<T> SnapshotSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    // The slot only ever holds whole values, so a poisoned lock is still
    // consistent.
    fn lock(&self) -> MutexGuard<'_, Option<Arc<T>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the current snapshot.
    pub fn publish(&self, value: T) {
        let value = Arc::new(value);
        *self.lock() = Some(value);
    }

    /// Latest published snapshot, if any.
    pub fn latest(&self) -> Option<Arc<T>> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().take();
    }
}

/// Supplier of per-frame observations. `Ok(None)` ends the loop.
pub trait FrameSource {
    type Error: std::error::Error + Send + 'static;

    fn next_frame(&mut self) -> Result<Option<FrameObservations>, Self::Error>;
}

impl FrameSource for std::vec::IntoIter<FrameObservations> {
    type Error = std::convert::Infallible;

    fn next_frame(&mut self) -> Result<Option<FrameObservations>, Self::Error> {
        Ok(self.next())
    }
}

/// What the loop publishes.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedFrame {
    /// 0-based index of the frame within this loop.
    pub index: u64,
    pub result: FrameResult,
}

#[derive(thiserror::Error, Debug)]
pub enum TrackingLoopError<E: std::error::Error + 'static> {
    #[error("frame source failed: {0}")]
    Source(#[source] E),
    #[error("failed to spawn tracking thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("tracking loop is no longer running")]
    Stopped,
    #[error("tracking thread panicked")]
    Panicked,
}

/// Entry point for starting a background loop.
pub struct TrackingLoop;

impl TrackingLoop {
    /// Start processing `source` on a new thread.
    pub fn spawn<S>(
        engine: EngineContext,
        source: S,
        slot: SnapshotSlot<TrackedFrame>,
    ) -> Result<TrackingHandle<S::Error>, TrackingLoopError<S::Error>>
    where
        S: FrameSource + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let (commands, rx) = mpsc::channel();

        let worker = LoopWorker {
            engine,
            source,
            slot,
            stop: Arc::clone(&stop),
            commands: rx,
        };
        let join = thread::Builder::new()
            .name("marker-pose-tracking".to_string())
            .spawn(move || worker.run())
            .map_err(TrackingLoopError::Spawn)?;

        Ok(TrackingHandle {
            stop,
            commands,
            join,
        })
    }
}

struct LoopWorker<S: FrameSource> {
    engine: EngineContext,
    source: S,
    slot: SnapshotSlot<TrackedFrame>,
    stop: Arc<AtomicBool>,
    commands: Receiver<EngineCommand>,
}

impl<S: FrameSource> LoopWorker<S> {
    fn run(mut self) -> Result<EngineContext, TrackingLoopError<S::Error>> {
        let mut index = 0u64;
        loop {
            for cmd in self.commands.try_iter() {
                if let Err(err) = self.engine.apply(cmd) {
                    warn!("command rejected: {err}");
                }
            }
            if self.stop.load(Ordering::Acquire) {
                info!("tracking loop stopped after {index} frames");
                break;
            }
            match self.source.next_frame() {
                Ok(Some(frame)) => {
                    let result = self.engine.process_frame(&frame);
                    self.slot.publish(TrackedFrame { index, result });
                    index += 1;
                }
                Ok(None) => {
                    info!("frame source exhausted after {index} frames");
                    break;
                }
                Err(err) => return Err(TrackingLoopError::Source(err)),
            }
        }
        Ok(self.engine)
    }
}

/// Control handle for a running loop.
pub struct TrackingHandle<E: std::error::Error + 'static> {
    stop: Arc<AtomicBool>,
    commands: Sender<EngineCommand>,
    join: JoinHandle<Result<EngineContext, TrackingLoopError<E>>>,
}

impl<E: std::error::Error + 'static> TrackingHandle<E> {
    /// Ask the loop to stop before its next frame.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Queue a command for the next frame boundary.
    pub fn send(&self, command: EngineCommand) -> Result<(), TrackingLoopError<E>> {
        self.commands
            .send(command)
            .map_err(|_| TrackingLoopError::Stopped)
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the loop to end and take the engine back.
    pub fn join(self) -> Result<EngineContext, TrackingLoopError<E>> {
        self.join.join().map_err(|_| TrackingLoopError::Panicked)?
    }
}
