//! Main-thread marshalling for engine state access.
//!
//! A game engine's state is only safe to touch from its single logical
//! thread while connection handlers run concurrently. [`EngineThread`]
//! gives the engine that owning thread and [`EngineHandle`] marshals
//! closures onto it, blocking the caller until the closure has run.
//! Mutations are total-ordered by arrival at the channel.
//!
//! Hosts that are single-threaded end-to-end may use
//! [`EngineHandle::direct`] instead; it is an explicit constructor choice
//! that logs its safety gap at creation, never an automatic fallback.

use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tracing::{debug, warn};

use crate::control::EngineControl;

const SHIM_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::shim");

type EngineTask = Box<dyn FnOnce(&mut dyn EngineControl) + Send>;

enum EngineMessage {
    Task(EngineTask),
    Shutdown,
}

/// Errors surfaced when a marshalled call cannot complete.
///
/// A dead engine thread is reported as-is; it never triggers a silent
/// direct invocation.
#[derive(Debug, Error)]
pub enum ShimError {
    /// The engine thread has exited; no further calls can run.
    #[error("engine thread is gone")]
    EngineGone,
    /// A prior direct-mode handler panicked while holding the engine.
    #[error("engine state poisoned by a panicked handler")]
    Poisoned,
}

/// Background thread owning a boxed engine and draining marshalled tasks.
#[derive(Debug)]
pub struct EngineThread {
    sender: Sender<EngineMessage>,
    handle: Option<JoinHandle<()>>,
}

impl EngineThread {
    /// Moves the engine onto a dedicated thread and starts draining tasks.
    #[must_use]
    pub fn spawn(engine: Box<dyn EngineControl>) -> Self {
        let (sender, receiver) = channel::<EngineMessage>();
        let handle = thread::Builder::new()
            .name("pilot-engine".to_owned())
            .spawn(move || run_engine_loop(engine, &receiver))
            .ok();
        if handle.is_none() {
            warn!(target: SHIM_TARGET, "failed to spawn engine thread");
        }
        Self { sender, handle }
    }

    /// A handle that marshals closures onto the engine thread.
    #[must_use]
    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            inner: HandleInner::Marshalled(self.sender.clone()),
        }
    }

    /// Stops the engine thread after the tasks already queued have run.
    pub fn join(mut self) {
        let _ = self.sender.send(EngineMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!(target: SHIM_TARGET, "engine thread panicked during drain");
            }
        }
    }
}

fn run_engine_loop(mut engine: Box<dyn EngineControl>, receiver: &Receiver<EngineMessage>) {
    debug!(target: SHIM_TARGET, "engine thread active");
    while let Ok(message) = receiver.recv() {
        match message {
            EngineMessage::Task(task) => task(engine.as_mut()),
            EngineMessage::Shutdown => break,
        }
    }
    debug!(target: SHIM_TARGET, "engine thread drained");
}

/// Cloneable handle serialising all engine access.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    inner: HandleInner,
}

#[derive(Clone)]
enum HandleInner {
    Marshalled(Sender<EngineMessage>),
    Direct(Arc<Mutex<Box<dyn EngineControl>>>),
}

impl std::fmt::Debug for HandleInner {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Marshalled(_) => formatter.write_str("Marshalled"),
            Self::Direct(_) => formatter.write_str("Direct"),
        }
    }
}

impl EngineHandle {
    /// Wraps the engine for direct synchronous invocation.
    ///
    /// Correct only when the host is effectively single-threaded end to
    /// end. The widened safety gap is logged once at creation.
    #[must_use]
    pub fn direct(engine: Box<dyn EngineControl>) -> Self {
        warn!(
            target: SHIM_TARGET,
            "engine handle created in direct mode: engine state is only safe \
             if the host is single-threaded end-to-end"
        );
        Self {
            inner: HandleInner::Direct(Arc::new(Mutex::new(engine))),
        }
    }

    /// Runs `f` with exclusive access to the engine, blocking the calling
    /// thread until it has executed on the engine's owning thread.
    ///
    /// # Errors
    ///
    /// [`ShimError::EngineGone`] when the engine thread has exited and
    /// [`ShimError::Poisoned`] when a direct-mode handler panicked.
    pub fn with_engine<F, R>(&self, f: F) -> Result<R, ShimError>
    where
        F: FnOnce(&mut dyn EngineControl) -> R + Send + 'static,
        R: Send + 'static,
    {
        match &self.inner {
            HandleInner::Marshalled(sender) => {
                let (reply, result) = channel();
                let task: EngineTask = Box::new(move |engine| {
                    let _ = reply.send(f(engine));
                });
                sender
                    .send(EngineMessage::Task(task))
                    .map_err(|_| ShimError::EngineGone)?;
                result.recv().map_err(|_| ShimError::EngineGone)
            }
            HandleInner::Direct(engine) => {
                let mut guard = engine.lock().map_err(|_| ShimError::Poisoned)?;
                Ok(f(&mut **guard))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::scripted::ScriptedEngine;

    use super::*;

    #[test]
    fn marshalled_call_returns_result() {
        let thread = EngineThread::spawn(Box::new(ScriptedEngine::new("Test Story")));
        let handle = thread.handle();
        let identity = handle
            .with_engine(|engine| engine.identity())
            .expect("engine thread alive");
        assert_eq!(identity.engine, "scripted");
        thread.join();
    }

    #[test]
    fn concurrent_writes_are_serialised_with_correct_acks() {
        let thread = EngineThread::spawn(Box::new(ScriptedEngine::new("Test Story")));
        let writers: Vec<_> = (0..2)
            .map(|i| {
                let handle = thread.handle();
                thread::spawn(move || {
                    handle
                        .with_engine(move |engine| {
                            engine
                                .write_variable("route", json!(i))
                                .expect("settable variable");
                            engine.read_variable("route")
                        })
                        .expect("engine thread alive")
                })
            })
            .collect();
        let mut acked = Vec::new();
        for (i, writer) in writers.into_iter().enumerate() {
            let read_back = writer.join().expect("writer thread");
            // Each caller observes the value it wrote, inside its own turn.
            assert_eq!(read_back, Some(json!(i)));
            acked.push(read_back);
        }
        let final_value = thread
            .handle()
            .with_engine(|engine| engine.read_variable("route"))
            .expect("engine thread alive");
        assert!(acked.contains(&final_value));
        thread.join();
    }

    #[test]
    fn calls_after_join_report_engine_gone() {
        let thread = EngineThread::spawn(Box::new(ScriptedEngine::new("Test Story")));
        let handle = thread.handle();
        thread.join();
        let error = handle
            .with_engine(|engine| engine.identity())
            .expect_err("engine thread drained");
        assert!(matches!(error, ShimError::EngineGone));
    }

    #[test]
    fn direct_handle_invokes_synchronously() {
        let handle = EngineHandle::direct(Box::new(ScriptedEngine::new("Test Story")));
        let identity = handle
            .with_engine(|engine| engine.identity())
            .expect("direct call");
        assert_eq!(identity.game, "Test Story");
    }
}
