//! Scoped ownership of the database-access backend for one run.

use anyhow::Result;

use crate::access::DatabaseAccess;

/// Owns the backend for a run. The loader and the runner both borrow it
/// mutably, so only one of them can use the connection at a time.
///
/// The backend is released exactly once: by [`Session::close`] on the happy
/// path, or on drop for every other exit.
pub struct Session<D: DatabaseAccess> {
    backend: D,
    closed: bool,
}

impl<D: DatabaseAccess> Session<D> {
    pub fn open(backend: D) -> Self {
        log::debug!("Session opened");
        Self {
            backend,
            closed: false,
        }
    }

    pub fn backend(&mut self) -> &mut D {
        &mut self.backend
    }

    /// Release the backend and surface any error from doing so.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        log::debug!("Session closed");
        self.backend.close()
    }
}

impl<D: DatabaseAccess> Drop for Session<D> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.backend.close() {
            log::warn!("Failed to release database session: {e}");
        } else {
            log::debug!("Session released on drop");
        }
    }
}
