//! Application state - one field per slice
//!
//! The set of slices is fixed when the store is built. Slices never read each
//! other; a slice's reducer only sees its own value and the action.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use nsdash_dispatch::Patch;
use serde::Serialize;

use crate::error::ErrorInfo;
use crate::records::{
    AnnotationRow, Contributions, LocusAlleles, SchemaRow, SequenceSearch, SpeciesRow,
    UniprotRow, UserProfile,
};
use crate::series::SeriesRecord;

/// Identity of one invocation of a remote operation.
///
/// Each `start` hands out a fresh id; a terminal action carrying an older id
/// is stale and leaves the slice untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RequestId(u64);

impl RequestId {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A remotely loaded value with its loading/error lifecycle.
///
/// `loading` is true strictly between `start` and the terminal action of the
/// latest request. `data` is only ever replaced by a fresh `Arc`, so
/// consumers can compare snapshots with [`Arc::ptr_eq`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Remote<T> {
    pub loading: bool,
    pub error: Option<ErrorInfo>,
    pub data: Arc<T>,
    #[serde(skip)]
    latest: RequestId,
}

impl<T> Remote<T> {
    /// Enter the pending state for a new request and return its id.
    pub fn start(&mut self) -> RequestId {
        self.latest = self.latest.next();
        self.loading = true;
        self.error = None;
        self.latest
    }

    pub fn latest(&self) -> RequestId {
        self.latest
    }

    pub fn is_current(&self, request: RequestId) -> bool {
        self.latest == request
    }

    /// Store the result of `request`. Returns `false` (and changes nothing)
    /// when a newer request has started since.
    pub fn succeed(&mut self, request: RequestId, data: Arc<T>) -> bool {
        if !self.is_current(request) {
            return false;
        }
        self.loading = false;
        self.error = None;
        self.data = data;
        true
    }

    /// Record the failure of `request`; previous data is kept.
    pub fn fail(&mut self, request: RequestId, error: ErrorInfo) -> bool {
        if !self.is_current(request) {
            return false;
        }
        self.loading = false;
        self.error = Some(error);
        true
    }
}

impl<T: Default> Remote<T> {
    /// Back to empty. Requests still in flight become stale.
    pub fn reset(&mut self) {
        self.latest = self.latest.next();
        self.loading = false;
        self.error = None;
        self.data = Arc::new(T::default());
    }
}

/// An authenticated session. The token never leaves the process in
/// serialized state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    #[serde(skip)]
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Time left before expiry, zero once expired.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).to_std().unwrap_or(Duration::ZERO)
    }
}

pub const DEFAULT_REDIRECT: &str = "/";

#[derive(Debug, Clone, PartialEq, Serialize, Patch)]
pub struct AuthState {
    pub loading: bool,
    pub error: Option<ErrorInfo>,
    /// `None` while anonymous
    pub session: Option<Session>,
    /// Where the view goes after signing in
    pub redirect_path: String,
    /// Last informational message from the password endpoints
    pub notice: Option<String>,
    #[serde(skip)]
    pub latest: RequestId,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            loading: false,
            error: None,
            session: None,
            redirect_path: DEFAULT_REDIRECT.to_string(),
            notice: None,
            latest: RequestId::default(),
        }
    }
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.token.as_str())
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.session.as_ref().map(|s| s.expires_at)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsState {
    pub species: Remote<Vec<SpeciesRow>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpeciesState {
    pub schemas: Remote<Vec<SchemaRow>>,
    pub loci_alleles: Remote<Vec<SeriesRecord>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaState {
    pub modes: Remote<Vec<SeriesRecord>>,
    pub lengths: Remote<Vec<SeriesRecord>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LocusState {
    pub alleles: Remote<LocusAlleles>,
    pub uniprot: Remote<Vec<UniprotRow>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnnotationsState {
    pub rows: Remote<Vec<AnnotationRow>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DescriptionsState {
    pub text: Remote<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SequencesState {
    pub search: Remote<SequenceSearch>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContributionsState {
    pub rows: Remote<Contributions>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileState {
    pub user: Remote<Option<UserProfile>>,
}

/// The whole state tree
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppState {
    pub auth: AuthState,
    pub stats: StatsState,
    pub species: SpeciesState,
    pub schema: SchemaState,
    pub locus: LocusState,
    pub annotations: AnnotationsState,
    pub descriptions: DescriptionsState,
    pub sequences: SequencesState,
    pub contributions: ContributionsState,
    pub profile: ProfileState,
}

impl AppState {
    /// True while any slice waits on a remote call
    pub fn is_loading(&self) -> bool {
        self.auth.loading
            || self.stats.species.loading
            || self.species.schemas.loading
            || self.species.loci_alleles.loading
            || self.schema.modes.loading
            || self.schema.lengths.loading
            || self.locus.alleles.loading
            || self.locus.uniprot.loading
            || self.annotations.rows.loading
            || self.descriptions.text.loading
            || self.sequences.search.loading
            || self.contributions.rows.loading
            || self.profile.user.loading
    }
}
