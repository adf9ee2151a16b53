use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;

use crate::error::{Result, SessionError};
use crate::session::{Session, SessionState};

/// A [`Session`] that several threads can use.
///
/// Each call holds the lock for the whole write-then-read exchange, so the
/// counter a caller's frame carries and the acknowledgement it gets back
/// belong to the same caller.
#[derive(Debug, Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<Session>>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    pub fn subscribe(&self) -> Result<()> {
        self.lock()?.subscribe()
    }

    pub fn unsubscribe(&self) -> Result<()> {
        self.lock()?.unsubscribe();
        Ok(())
    }

    pub fn state(&self) -> Result<SessionState> {
        Ok(self.lock()?.state())
    }

    pub fn counter(&self) -> Result<u16> {
        Ok(self.lock()?.counter())
    }

    /// Frame `body` under identity `id`, send it and read the
    /// acknowledgement, all under one lock.
    pub fn exchange(&self, id: u8, body: &[u8]) -> Result<Bytes> {
        self.lock()?.exchange(id, body)
    }

    /// Run `f` with exclusive access to the session.
    pub fn with_session<R>(&self, f: impl FnOnce(&mut Session) -> R) -> Result<R> {
        let mut guard = self.lock()?;
        Ok(f(&mut guard))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Session>> {
        self.inner.lock().map_err(|_| SessionError::LockPoisoned)
    }
}
