//! Actions grouped by slice
//!
//! The leading word names the slice (`StatsFetch`, `StatsDidLoad` -> "stats").
//! Intent actions start work; `Did*` actions carry a result back, tagged with
//! the [`RequestId`] handed out when the work started.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use nsdash_dispatch::ActionSummary;

use crate::error::ErrorInfo;
use crate::records::{
    AnnotationRow, Contributions, LocusAlleles, SchemaRow, SequenceSearch, SpeciesRow,
    UniprotRow, UserProfile, UserProfilePatch,
};
use crate::series::SeriesRecord;
use crate::state::{RequestId, Session};

#[derive(nsdash_dispatch::Action, Clone, Debug, PartialEq)]
#[action(infer_categories)]
pub enum Action {
    // ===== Auth =====
    AuthLogin {
        email: String,
        password: String,
    },
    AuthRegister {
        username: String,
        email: String,
        password: String,
    },
    AuthForgotPassword {
        email: String,
    },
    AuthResetPassword {
        token: String,
        password: String,
    },
    AuthDidLogin {
        request: RequestId,
        session: Session,
    },
    /// Password endpoints answered, possibly with a message for the user
    AuthDidNotify {
        request: RequestId,
        message: Option<String>,
    },
    AuthDidError {
        request: RequestId,
        error: ErrorInfo,
    },
    /// Restore a persisted session at startup
    AuthResume,
    AuthDidResume(Session),
    AuthLogout,
    /// The expiry timer of the session ending at `expires_at` fired
    AuthDidExpire {
        expires_at: DateTime<Utc>,
    },
    AuthRedirectSet(String),

    // ===== Stats =====
    StatsFetch,
    StatsDidLoad {
        request: RequestId,
        rows: Arc<Vec<SpeciesRow>>,
    },
    StatsDidError {
        request: RequestId,
        error: ErrorInfo,
    },

    // ===== Species =====
    SpeciesSchemasFetch {
        species: String,
    },
    SpeciesSchemasDidLoad {
        request: RequestId,
        rows: Arc<Vec<SchemaRow>>,
    },
    SpeciesSchemasDidError {
        request: RequestId,
        error: ErrorInfo,
    },
    SpeciesLociFetch {
        species: String,
    },
    SpeciesLociDidLoad {
        request: RequestId,
        series: Arc<Vec<SeriesRecord>>,
    },
    SpeciesLociDidError {
        request: RequestId,
        error: ErrorInfo,
    },

    // ===== Schema =====
    SchemaModesFetch {
        species: String,
        schema: String,
    },
    SchemaModesDidLoad {
        request: RequestId,
        series: Arc<Vec<SeriesRecord>>,
    },
    SchemaModesDidError {
        request: RequestId,
        error: ErrorInfo,
    },
    SchemaLengthsFetch {
        species: String,
        schema: String,
    },
    SchemaLengthsDidLoad {
        request: RequestId,
        series: Arc<Vec<SeriesRecord>>,
    },
    SchemaLengthsDidError {
        request: RequestId,
        error: ErrorInfo,
    },

    // ===== Locus =====
    LocusFastaFetch {
        locus: String,
    },
    LocusFastaDidLoad {
        request: RequestId,
        alleles: Arc<LocusAlleles>,
    },
    LocusFastaDidError {
        request: RequestId,
        error: ErrorInfo,
    },
    LocusUniprotFetch {
        locus: String,
    },
    LocusUniprotDidLoad {
        request: RequestId,
        rows: Arc<Vec<UniprotRow>>,
    },
    LocusUniprotDidError {
        request: RequestId,
        error: ErrorInfo,
    },

    // ===== Annotations =====
    AnnotationsFetch {
        species: String,
        schema: String,
    },
    AnnotationsDidLoad {
        request: RequestId,
        rows: Arc<Vec<AnnotationRow>>,
    },
    AnnotationsDidError {
        request: RequestId,
        error: ErrorInfo,
    },

    // ===== Descriptions =====
    DescriptionsFetch {
        species: String,
        schema: String,
    },
    DescriptionsDidLoad {
        request: RequestId,
        text: Arc<String>,
    },
    DescriptionsDidError {
        request: RequestId,
        error: ErrorInfo,
    },

    // ===== Sequences =====
    SequencesSearch {
        sequence: String,
    },
    SequencesDidLoad {
        request: RequestId,
        search: Arc<SequenceSearch>,
    },
    SequencesDidError {
        request: RequestId,
        error: ErrorInfo,
    },

    // ===== Contributions =====
    ContributionsFetch {
        species: String,
        schema: String,
    },
    ContributionsDidLoad {
        request: RequestId,
        contributions: Arc<Contributions>,
    },
    ContributionsDidError {
        request: RequestId,
        error: ErrorInfo,
    },

    // ===== Profile =====
    ProfileFetch,
    ProfileDidLoad {
        request: RequestId,
        user: UserProfile,
    },
    ProfileUpdate(UserProfilePatch),
    ProfileDidUpdate {
        request: RequestId,
        patch: UserProfilePatch,
    },
    ProfileDidError {
        request: RequestId,
        error: ErrorInfo,
    },
}

impl Action {
    /// Request id of a terminal action
    pub fn request(&self) -> Option<RequestId> {
        use Action::*;
        match self {
            AuthDidLogin { request, .. }
            | AuthDidNotify { request, .. }
            | AuthDidError { request, .. }
            | StatsDidLoad { request, .. }
            | StatsDidError { request, .. }
            | SpeciesSchemasDidLoad { request, .. }
            | SpeciesSchemasDidError { request, .. }
            | SpeciesLociDidLoad { request, .. }
            | SpeciesLociDidError { request, .. }
            | SchemaModesDidLoad { request, .. }
            | SchemaModesDidError { request, .. }
            | SchemaLengthsDidLoad { request, .. }
            | SchemaLengthsDidError { request, .. }
            | LocusFastaDidLoad { request, .. }
            | LocusFastaDidError { request, .. }
            | LocusUniprotDidLoad { request, .. }
            | LocusUniprotDidError { request, .. }
            | AnnotationsDidLoad { request, .. }
            | AnnotationsDidError { request, .. }
            | DescriptionsDidLoad { request, .. }
            | DescriptionsDidError { request, .. }
            | SequencesDidLoad { request, .. }
            | SequencesDidError { request, .. }
            | ContributionsDidLoad { request, .. }
            | ContributionsDidError { request, .. }
            | ProfileDidLoad { request, .. }
            | ProfileDidUpdate { request, .. }
            | ProfileDidError { request, .. } => Some(*request),
            _ => None,
        }
    }

    /// Error descriptor of a failure action
    pub fn error(&self) -> Option<&ErrorInfo> {
        use Action::*;
        match self {
            AuthDidError { error, .. }
            | StatsDidError { error, .. }
            | SpeciesSchemasDidError { error, .. }
            | SpeciesLociDidError { error, .. }
            | SchemaModesDidError { error, .. }
            | SchemaLengthsDidError { error, .. }
            | LocusFastaDidError { error, .. }
            | LocusUniprotDidError { error, .. }
            | AnnotationsDidError { error, .. }
            | DescriptionsDidError { error, .. }
            | SequencesDidError { error, .. }
            | ContributionsDidError { error, .. }
            | ProfileDidError { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Counts instead of payloads, and never a password or token
impl ActionSummary for Action {
    fn summary(&self) -> String {
        use Action::*;
        match self {
            AuthLogin { email, .. } => format!("AuthLogin {{ email: {email:?} }}"),
            AuthRegister {
                username, email, ..
            } => format!("AuthRegister {{ username: {username:?}, email: {email:?} }}"),
            AuthResetPassword { .. } => "AuthResetPassword".to_string(),
            AuthDidLogin { request, session } => format!(
                "AuthDidLogin {{ request: {request}, expires_at: {} }}",
                session.expires_at
            ),
            AuthDidResume(session) => {
                format!("AuthDidResume {{ expires_at: {} }}", session.expires_at)
            }
            StatsDidLoad { request, rows } => rows_summary("StatsDidLoad", *request, rows.len()),
            SpeciesSchemasDidLoad { request, rows } => {
                rows_summary("SpeciesSchemasDidLoad", *request, rows.len())
            }
            SpeciesLociDidLoad { request, series }
            | SchemaModesDidLoad { request, series }
            | SchemaLengthsDidLoad { request, series } => {
                format!("{} {{ request: {request}, series: {} }}", self_name(self), series.len())
            }
            LocusFastaDidLoad { request, alleles } => {
                rows_summary("LocusFastaDidLoad", *request, alleles.rows.len())
            }
            LocusUniprotDidLoad { request, rows } => {
                rows_summary("LocusUniprotDidLoad", *request, rows.len())
            }
            AnnotationsDidLoad { request, rows } => {
                rows_summary("AnnotationsDidLoad", *request, rows.len())
            }
            DescriptionsDidLoad { request, text } => {
                format!("DescriptionsDidLoad {{ request: {request}, chars: {} }}", text.len())
            }
            SequencesSearch { sequence } => {
                format!("SequencesSearch {{ length: {} }}", sequence.len())
            }
            SequencesDidLoad { request, search } => {
                rows_summary("SequencesDidLoad", *request, search.hits.len())
            }
            ContributionsDidLoad {
                request,
                contributions,
            } => rows_summary("ContributionsDidLoad", *request, contributions.rows.len()),
            _ => format!("{self:?}"),
        }
    }
}

fn self_name(action: &Action) -> &'static str {
    nsdash_dispatch::Action::name(action)
}

fn rows_summary(name: &str, request: RequestId, rows: usize) -> String {
    format!("{name} {{ request: {request}, rows: {rows} }}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use nsdash_dispatch::{Action as _, ActionCategory};

    #[test]
    fn test_categories_follow_slice_names() {
        assert_eq!(Action::StatsFetch.category(), Some("stats"));
        assert_eq!(
            Action::SpeciesLociFetch { species: "1".into() }.category(),
            Some("species")
        );
        assert_eq!(Action::AuthLogout.category(), Some("auth"));
        assert!(Action::ProfileFetch.is_profile());
        assert_eq!(
            ActionCategory::category(&Action::SequencesSearch {
                sequence: "ATG".into()
            }),
            Some("sequences")
        );
    }

    #[test]
    fn test_summary_hides_credentials() {
        let login = Action::AuthLogin {
            email: "a@b.org".into(),
            password: "hunter2".into(),
        };
        assert!(!login.summary().contains("hunter2"));
        assert_eq!(login.name(), "AuthLogin");

        let reset = Action::AuthResetPassword {
            token: "tok".into(),
            password: "pw".into(),
        };
        assert_eq!(reset.summary(), "AuthResetPassword");
    }

    #[test]
    fn test_summary_counts_rows() {
        let action = Action::StatsDidLoad {
            request: RequestId::default().next(),
            rows: Arc::new(vec![]),
        };
        assert_eq!(action.summary(), "StatsDidLoad { request: #1, rows: 0 }");
    }

    #[test]
    fn test_request_and_error_accessors() {
        let request = RequestId::default().next();
        let failed = Action::LocusFastaDidError {
            request,
            error: ErrorInfo::session_expired(),
        };
        assert_eq!(failed.request(), Some(request));
        assert!(failed.error().is_some_and(ErrorInfo::is_session_expired));
        assert_eq!(Action::StatsFetch.request(), None);
    }
}
