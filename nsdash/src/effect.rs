//! Effects - side effects declared by the reducers
//!
//! Reducers return these; the [`Orchestrator`](crate::orchestrator::Orchestrator)
//! performs them. Nothing here touches the network, the clock or storage.

use std::borrow::Cow;

use serde_json::json;

use crate::action::Action;
use crate::api::ApiRequest;
use crate::error::{AppError, AppResult, ErrorInfo};
use crate::records::UserProfilePatch;
use crate::state::{RequestId, Session};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Perform one remote call and report back with `request`
    Remote { request: RequestId, call: RemoteCall },
    /// Persist `session` and (re)arm its expiry timer
    SessionBegin(Session),
    /// Cancel the expiry timer and forget the persisted session
    SessionEnd,
    /// Load a persisted session, if one is still valid
    SessionResume,
    /// Cache species id -> name for label lookups
    CacheSpeciesNames(Vec<(String, String)>),
}

/// The remote operations, one per endpoint
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    SpeciesRoster,
    SpeciesSchemas { species: String },
    LociAlleles { species: String },
    AlleleModes { species: String, schema: String },
    LengthStats { species: String, schema: String },
    Annotations { species: String, schema: String },
    Description { species: String, schema: String },
    Contributions { species: String, schema: String },
    LocusFasta { locus: String },
    LocusUniprot { locus: String },
    SequenceSearch { sequence: String },
    Login { email: String, password: String },
    Register { username: String, email: String, password: String },
    ForgotPassword { email: String },
    ResetPassword { token: String, password: String },
    Profile,
    UpdateProfile(UserProfilePatch),
}

impl RemoteCall {
    /// The request to send, without credentials
    ///
    /// Identifiers are percent-encoded as single path segments.
    pub fn api_request(&self) -> AppResult<ApiRequest> {
        use RemoteCall::*;
        let request = match self {
            SpeciesRoster => ApiRequest::get("stats/species"),
            SpeciesSchemas { species } => {
                ApiRequest::get(format!("stats/species/{}", segment(species)))
            }
            LociAlleles { species } => ApiRequest::get(format!(
                "stats/species/{}/schema/loci/nr_alleles",
                segment(species)
            )),
            AlleleModes { species, schema } => {
                ApiRequest::get(schema_stats(species, schema, "modes"))
            }
            LengthStats { species, schema } => {
                ApiRequest::get(schema_stats(species, schema, "lengthStats"))
            }
            Annotations { species, schema } => {
                ApiRequest::get(schema_stats(species, schema, "annotations"))
            }
            Description { species, schema } => ApiRequest::get(format!(
                "species/{}/schemas/{}/description",
                segment(species),
                segment(schema)
            )),
            Contributions { species, schema } => {
                ApiRequest::get(schema_stats(species, schema, "contributions"))
            }
            LocusFasta { locus } => ApiRequest::get(format!("loci/{}/fasta", segment(locus))),
            LocusUniprot { locus } => ApiRequest::get(format!("loci/{}/uniprot", segment(locus))),
            SequenceSearch { sequence } => {
                ApiRequest::get("sequences/seq_info").with_query("sequence", sequence.as_str())
            }
            Login { email, password } => ApiRequest::post(
                "auth/login",
                json!({ "email": email, "password": password }),
            ),
            Register {
                username,
                email,
                password,
            } => ApiRequest::post(
                "user/register_user",
                json!({ "username": username, "email": email, "password": password }),
            ),
            ForgotPassword { email } => ApiRequest::post("auth/forget", json!({ "email": email })),
            ResetPassword { token, password } => ApiRequest::put(
                "auth/reset_password",
                json!({ "token": token, "password": password }),
            ),
            Profile => ApiRequest::get("user/current_user"),
            UpdateProfile(patch) => {
                let body =
                    serde_json::to_value(patch).map_err(|e| AppError::Encode(e.to_string()))?;
                ApiRequest::put("user/current_user", body)
            }
        };
        Ok(request)
    }

    /// Calls that carry the session token
    pub fn requires_auth(&self) -> bool {
        matches!(self, RemoteCall::Profile | RemoteCall::UpdateProfile(_))
    }

    /// The failure action for this call
    pub fn fail(&self, request: RequestId, error: ErrorInfo) -> Action {
        use RemoteCall::*;
        match self {
            SpeciesRoster => Action::StatsDidError { request, error },
            SpeciesSchemas { .. } => Action::SpeciesSchemasDidError { request, error },
            LociAlleles { .. } => Action::SpeciesLociDidError { request, error },
            AlleleModes { .. } => Action::SchemaModesDidError { request, error },
            LengthStats { .. } => Action::SchemaLengthsDidError { request, error },
            Annotations { .. } => Action::AnnotationsDidError { request, error },
            Description { .. } => Action::DescriptionsDidError { request, error },
            Contributions { .. } => Action::ContributionsDidError { request, error },
            LocusFasta { .. } => Action::LocusFastaDidError { request, error },
            LocusUniprot { .. } => Action::LocusUniprotDidError { request, error },
            SequenceSearch { .. } => Action::SequencesDidError { request, error },
            Login { .. } | Register { .. } | ForgotPassword { .. } | ResetPassword { .. } => {
                Action::AuthDidError { request, error }
            }
            Profile | UpdateProfile(_) => Action::ProfileDidError { request, error },
        }
    }
}

fn segment(raw: &str) -> Cow<'_, str> {
    urlencoding::encode(raw)
}

fn schema_stats(species: &str, schema: &str, stat: &str) -> String {
    format!(
        "stats/species/{}/schema/{}/{stat}",
        segment(species),
        segment(schema)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Method;
    use crate::error::ErrorKind;

    #[test]
    fn test_routes() {
        let request = RemoteCall::AlleleModes {
            species: "1".into(),
            schema: "4".into(),
        }
        .api_request()
        .unwrap();
        assert_eq!(request.route(), "GET stats/species/1/schema/4/modes");

        let request = RemoteCall::ResetPassword {
            token: "t".into(),
            password: "p".into(),
        }
        .api_request()
        .unwrap();
        assert_eq!(request.method, Method::Put);
        assert_eq!(request.body, Some(json!({ "token": "t", "password": "p" })));
    }

    #[test]
    fn test_identifiers_are_single_path_segments() {
        let request = RemoteCall::LocusFasta {
            locus: "a/b c".into(),
        }
        .api_request()
        .unwrap();
        assert_eq!(request.path, "loci/a%2Fb%20c/fasta");

        let request = RemoteCall::Description {
            species: "1?x=2".into(),
            schema: "../4".into(),
        }
        .api_request()
        .unwrap();
        assert_eq!(
            request.route(),
            "GET species/1%3Fx%3D2/schemas/..%2F4/description"
        );
    }

    #[test]
    fn test_search_sequence_is_a_query_parameter() {
        let request = RemoteCall::SequenceSearch {
            sequence: "ATG CAT".into(),
        }
        .api_request()
        .unwrap();
        assert_eq!(request.path, "sequences/seq_info");
        assert_eq!(request.query_string().as_deref(), Some("sequence=ATG%20CAT"));
    }

    #[test]
    fn test_profile_update_sends_present_fields() {
        let patch = UserProfilePatch {
            username: Some(Some("editor".into())),
            ..Default::default()
        };
        let request = RemoteCall::UpdateProfile(patch).api_request().unwrap();
        assert_eq!(request.body, Some(json!({ "username": "editor" })));
        assert!(RemoteCall::Profile.requires_auth());
        assert!(!RemoteCall::SpeciesRoster.requires_auth());
    }

    #[test]
    fn test_encode_failure_reaches_profile_slice() {
        let request = RequestId::default().next();
        let err = AppError::Encode("key must be a string".into());
        let action = RemoteCall::UpdateProfile(UserProfilePatch::default())
            .fail(request, ErrorInfo::from(&err));
        match action {
            Action::ProfileDidError { error, .. } => {
                assert_eq!(error.kind, ErrorKind::Encode);
                assert_eq!(error.message, "could not encode request: key must be a string");
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn test_fail_targets_owning_slice() {
        let request = RequestId::default().next();
        let action = RemoteCall::LocusUniprot { locus: "9".into() }
            .fail(request, ErrorInfo::session_expired());
        assert!(action.is_locus());
        assert_eq!(action.request(), Some(request));
    }
}
