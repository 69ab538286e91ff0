use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded, unbounded};
use thiserror::Error;

use crate::{DocumentEngine, ViewId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("document engine sequence is closed")]
    SequenceClosed,
    #[error("failed to start document engine thread: {0}")]
    Spawn(String),
}

type Task<E> = Box<dyn FnOnce(&mut E) + Send>;

enum Message<E> {
    Task(Task<E>),
    Shutdown,
}

/// Owns the thread every engine call runs on. Tasks run one at a time in the order
/// they were posted. Dropping the sequence stops the thread after queued tasks.
pub struct EngineSequence<E: DocumentEngine> {
    sender: Sender<Message<E>>,
    thread: Option<JoinHandle<()>>,
}

impl<E: DocumentEngine> EngineSequence<E> {
    pub fn spawn(mut engine: E) -> Result<Self, EngineError> {
        let (sender, receiver) = unbounded::<Message<E>>();
        let thread = thread::Builder::new()
            .name("document-engine".to_owned())
            .spawn(move || {
                while let Ok(message) = receiver.recv() {
                    match message {
                        Message::Task(task) => task(&mut engine),
                        Message::Shutdown => break,
                    }
                }
                tracing::debug!("[engine] sequence stopped");
            })
            .map_err(|err| EngineError::Spawn(err.to_string()))?;
        Ok(Self {
            sender,
            thread: Some(thread),
        })
    }

    pub fn access(&self) -> ViewAccess<E> {
        ViewAccess {
            sender: self.sender.clone(),
        }
    }
}

impl<E: DocumentEngine> Drop for EngineSequence<E> {
    fn drop(&mut self) {
        let _ = self.sender.send(Message::Shutdown);
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            tracing::error!("[engine] sequence thread panicked");
        }
    }
}

/// View-scoped entry point to the engine sequence.
///
/// Every call names its view; selecting the view and running the call happen in the
/// same task, so calls from different owners never observe each other's selection.
pub struct ViewAccess<E: DocumentEngine> {
    sender: Sender<Message<E>>,
}

impl<E: DocumentEngine> Clone for ViewAccess<E> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<E: DocumentEngine> ViewAccess<E> {
    pub fn create_view(&self) -> Result<ViewId, EngineError> {
        self.call(|engine| engine.create_view())
    }

    /// The engine's selected view, for adopting a view created elsewhere.
    pub fn current_view(&self) -> Result<Option<ViewId>, EngineError> {
        self.call(|engine| engine.current_view())
    }

    pub fn views_count(&self) -> Result<usize, EngineError> {
        self.call(|engine| engine.views_count())
    }

    pub fn destroy_view(&self, view: ViewId) -> Result<(), EngineError> {
        self.call(move |engine| engine.destroy_view(view))
    }

    /// Selects `view`, runs `f` and waits for its result.
    pub fn with_view<R, F>(&self, view: ViewId, f: F) -> Result<R, EngineError>
    where
        R: Send + 'static,
        F: FnOnce(&mut E) -> R + Send + 'static,
    {
        self.call(move |engine| {
            engine.set_view(view);
            f(engine)
        })
    }

    /// Like `with_view` without waiting.
    pub fn post_with_view<F>(&self, view: ViewId, f: F) -> Result<(), EngineError>
    where
        F: FnOnce(&mut E) + Send + 'static,
    {
        self.post(move |engine| {
            engine.set_view(view);
            f(engine)
        })
    }

    /// Like `with_view`, returning a handle the caller can wait on with a deadline.
    pub fn dispatch_with_view<R, F>(&self, view: ViewId, f: F) -> Result<Pending<R>, EngineError>
    where
        R: Send + 'static,
        F: FnOnce(&mut E) -> R + Send + 'static,
    {
        let (reply, receiver) = bounded(1);
        self.post(move |engine| {
            engine.set_view(view);
            let _ = reply.send(f(engine));
        })?;
        Ok(Pending { receiver })
    }

    fn post<F>(&self, f: F) -> Result<(), EngineError>
    where
        F: FnOnce(&mut E) + Send + 'static,
    {
        self.sender
            .send(Message::Task(Box::new(f)))
            .map_err(|_| EngineError::SequenceClosed)
    }

    fn call<R, F>(&self, f: F) -> Result<R, EngineError>
    where
        R: Send + 'static,
        F: FnOnce(&mut E) -> R + Send + 'static,
    {
        let (reply, receiver) = bounded(1);
        self.post(move |engine| {
            let _ = reply.send(f(engine));
        })?;
        receiver.recv().map_err(|_| EngineError::SequenceClosed)
    }
}

/// Result of a dispatched call that may still be running.
#[derive(Debug)]
pub struct Pending<R> {
    receiver: Receiver<R>,
}

impl<R> Pending<R> {
    /// Waits until `deadline`. `Ok(None)` means the call is still running.
    pub fn wait_until(&self, deadline: Instant) -> Result<Option<R>, EngineError> {
        match self.receiver.recv_deadline(deadline) {
            Ok(value) => Ok(Some(value)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(EngineError::SequenceClosed),
        }
    }

    pub fn try_take(&self) -> Result<Option<R>, EngineError> {
        match self.receiver.try_recv() {
            Ok(value) => Ok(Some(value)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(EngineError::SequenceClosed),
        }
    }
}
