//! Session-backed cache of user enrichment data
//!
//! The host application owns the session store and is responsible for
//! attaching a [`Session`] handle to request extensions (typically from
//! its session layer, keyed by the session cookie). The case-load and
//! allocation middleware treat a missing handle as a fatal
//! misconfiguration rather than silently skipping their work.
//!
//! The handle is a cheap clone over shared state, so mutations made by
//! one middleware are visible to later middleware and to the host when
//! it persists the session at the end of the request.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::types::{AllocationJobResponsibility, CaseLoad};

/// Cached per-session fields
///
/// `None` means "not cached yet"; each field is populated once per
/// session and refreshed whenever upstream shared data is present on the
/// current request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    /// Case loads, with administrative ("APP") entries already removed
    #[serde(default)]
    pub case_loads: Option<Vec<CaseLoad>>,
    /// The currently active case load
    #[serde(default)]
    pub active_case_load: Option<CaseLoad>,
    /// Shorthand for the active case load's identifier
    #[serde(default)]
    pub active_case_load_id: Option<String>,
    /// Allocation job responsibilities
    #[serde(default)]
    pub allocation_job_responsibilities: Option<Vec<AllocationJobResponsibility>>,
}

/// Cloneable handle to the session cache
#[derive(Debug, Clone, Default)]
pub struct Session {
    inner: Arc<RwLock<SessionData>>,
}

impl Session {
    /// Create a session handle around existing session data
    #[must_use]
    pub fn new(data: SessionData) -> Self {
        Self {
            inner: Arc::new(RwLock::new(data)),
        }
    }

    /// Cached case loads, if populated
    #[must_use]
    pub fn case_loads(&self) -> Option<Vec<CaseLoad>> {
        self.inner.read().case_loads.clone()
    }

    /// Cached active case load, if populated
    #[must_use]
    pub fn active_case_load(&self) -> Option<CaseLoad> {
        self.inner.read().active_case_load.clone()
    }

    /// Cached active case load identifier, if populated
    #[must_use]
    pub fn active_case_load_id(&self) -> Option<String> {
        self.inner.read().active_case_load_id.clone()
    }

    /// Cached allocation job responsibilities, if populated
    #[must_use]
    pub fn allocation_job_responsibilities(&self) -> Option<Vec<AllocationJobResponsibility>> {
        self.inner.read().allocation_job_responsibilities.clone()
    }

    /// Replace the cached case-load fields
    ///
    /// The active case load identifier is derived from `active_case_load`
    /// so the three fields cannot drift apart.
    pub fn set_case_loads(&self, case_loads: Vec<CaseLoad>, active_case_load: Option<CaseLoad>) {
        let mut data = self.inner.write();
        data.active_case_load_id = active_case_load
            .as_ref()
            .map(|case_load| case_load.case_load_id.clone());
        data.active_case_load = active_case_load;
        data.case_loads = Some(case_loads);
    }

    /// Replace the cached allocation job responsibilities
    ///
    /// Accepts `None` so an upstream shared-data refresh that carries no
    /// responsibilities clears the stale value instead of keeping it.
    pub fn set_allocation_job_responsibilities(
        &self,
        responsibilities: Option<Vec<AllocationJobResponsibility>>,
    ) {
        self.inner.write().allocation_job_responsibilities = responsibilities;
    }

    /// Copy of the underlying session data, for hosts persisting the
    /// session at the end of a request
    #[must_use]
    pub fn snapshot(&self) -> SessionData {
        self.inner.read().clone()
    }
}
