// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Owned, reloadable constitution.
//!
//! Readers take an `Arc<Constitution>` snapshot and evaluate against it
//! without holding any lock; reload swaps the snapshot atomically. A call
//! that took its snapshot before a reload finishes against the old
//! document.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use crate::error::ConstitutionError;
use crate::loader;
use crate::model::{Constitution, Priority, Role, RuleMeta};

/// The loaded constitution plus where it came from.
#[derive(Debug)]
pub struct ConstitutionSource {
    /// Backing file, if loaded from disk.
    path: Option<PathBuf>,
    /// Current snapshot.
    current: RwLock<Arc<Constitution>>,
    /// Bumped on every successful load.
    generation: AtomicU64,
}

impl ConstitutionSource {
    /// Load from a JSON or YAML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConstitutionError> {
        let path = path.as_ref().to_path_buf();
        let constitution = loader::load_file(&path)?;
        info!(
            path = %path.display(),
            version = %constitution.version,
            roles = constitution.roles.len(),
            "loaded constitution"
        );
        Ok(Self {
            path: Some(path),
            current: RwLock::new(Arc::new(constitution)),
            generation: AtomicU64::new(1),
        })
    }

    /// Wrap an already-built document. Such a source cannot [`reload`].
    ///
    /// [`reload`]: ConstitutionSource::reload
    pub fn from_document(constitution: Constitution) -> Result<Self, ConstitutionError> {
        constitution.validate()?;
        Ok(Self {
            path: None,
            current: RwLock::new(Arc::new(constitution)),
            generation: AtomicU64::new(1),
        })
    }

    /// Source backed by the built-in default document.
    pub fn builtin() -> Self {
        Self {
            path: None,
            current: RwLock::new(Arc::new(Constitution::default())),
            generation: AtomicU64::new(1),
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<Constitution> {
        let guard = self
            .current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&*guard)
    }

    /// Re-read the backing file and swap it in.
    ///
    /// On any failure the previous snapshot stays active.
    pub fn reload(&self) -> Result<Arc<Constitution>, ConstitutionError> {
        let path = self.path.as_ref().ok_or(ConstitutionError::NoBackingFile)?;
        match loader::load_file(path) {
            Ok(constitution) => Ok(self.install(constitution)),
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "constitution reload failed, keeping previous version"
                );
                Err(err)
            }
        }
    }

    /// Validate and swap in a new document.
    pub fn replace(&self, constitution: Constitution) -> Result<Arc<Constitution>, ConstitutionError> {
        constitution.validate()?;
        Ok(self.install(constitution))
    }

    fn install(&self, constitution: Constitution) -> Arc<Constitution> {
        let next = Arc::new(constitution);
        {
            let mut guard = self
                .current
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *guard = Arc::clone(&next);
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        info!(
            version = %next.version,
            generation,
            roles = next.roles.len(),
            "constitution installed"
        );
        next
    }

    /// Number of successful loads so far (1 after construction).
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Backing file path, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Version string of the current snapshot.
    pub fn version(&self) -> String {
        self.snapshot().version.clone()
    }

    /// Clone of a role from the current snapshot.
    pub fn role(&self, id: &str) -> Option<Role> {
        self.snapshot().role(id).cloned()
    }

    /// All roles in the current snapshot.
    pub fn roles(&self) -> Vec<Role> {
        self.snapshot().roles.clone()
    }

    /// Priorities in the current snapshot, ordered by id.
    pub fn priorities(&self) -> Vec<Priority> {
        let mut priorities = self.snapshot().priorities.clone();
        priorities.sort_by_key(|p| p.id);
        priorities
    }

    /// Rule metadata in the current snapshot.
    pub fn rules(&self) -> Vec<RuleMeta> {
        self.snapshot().rules.clone()
    }
}
