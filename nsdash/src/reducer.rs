//! Reducers - pure functions: (slice, action) -> slice'
//!
//! The root reducer hands every action to every slice reducer. A slice reducer
//! only sees its own slice and returns whether it changed plus the effects it
//! wants performed. Results are merged in slice order.

use std::sync::Arc;

use nsdash_dispatch::{DispatchResult, Merge};

use crate::action::Action;
use crate::effect::{Effect, RemoteCall};
use crate::error::ErrorInfo;
use crate::state::{
    AnnotationsState, AppState, AuthState, AuthStatePatch, ContributionsState, DescriptionsState,
    LocusState, ProfileState, Remote, RequestId, SchemaState, SequencesState, SpeciesState,
    StatsState,
};

pub fn reducer(state: &mut AppState, action: Action) -> DispatchResult<Effect> {
    // Expiry of the current session is a logout for every slice
    let action = match action {
        Action::AuthDidExpire { expires_at } if state.auth.expires_at() == Some(expires_at) => {
            Action::AuthLogout
        }
        other => other,
    };
    let action = &action;
    reduce_auth(&mut state.auth, action)
        .merge(reduce_stats(&mut state.stats, action))
        .merge(reduce_species(&mut state.species, action))
        .merge(reduce_schema(&mut state.schema, action))
        .merge(reduce_locus(&mut state.locus, action))
        .merge(reduce_annotations(&mut state.annotations, action))
        .merge(reduce_descriptions(&mut state.descriptions, action))
        .merge(reduce_sequences(&mut state.sequences, action))
        .merge(reduce_contributions(&mut state.contributions, action))
        .merge(reduce_profile(&mut state.profile, action))
}

/// Start a request on `remote` and ask for the call.
fn fetch<T>(remote: &mut Remote<T>, call: RemoteCall) -> DispatchResult<Effect> {
    let request = remote.start();
    DispatchResult::changed_with(Effect::Remote { request, call })
}

fn loaded<T>(remote: &mut Remote<T>, request: RequestId, data: &Arc<T>) -> DispatchResult<Effect> {
    DispatchResult::from_changed(remote.succeed(request, Arc::clone(data)))
}

fn failed<T>(
    remote: &mut Remote<T>,
    request: RequestId,
    error: &ErrorInfo,
) -> DispatchResult<Effect> {
    DispatchResult::from_changed(remote.fail(request, error.clone()))
}

// ===== Auth =====

pub fn reduce_auth(state: &mut AuthState, action: &Action) -> DispatchResult<Effect> {
    match action {
        Action::AuthLogin { email, password } => start_auth(
            state,
            RemoteCall::Login {
                email: email.clone(),
                password: password.clone(),
            },
        ),
        Action::AuthRegister {
            username,
            email,
            password,
        } => start_auth(
            state,
            RemoteCall::Register {
                username: username.clone(),
                email: email.clone(),
                password: password.clone(),
            },
        ),
        Action::AuthForgotPassword { email } => start_auth(
            state,
            RemoteCall::ForgotPassword {
                email: email.clone(),
            },
        ),
        Action::AuthResetPassword { token, password } => start_auth(
            state,
            RemoteCall::ResetPassword {
                token: token.clone(),
                password: password.clone(),
            },
        ),

        Action::AuthDidLogin { request, session } => {
            if *request != state.latest {
                return DispatchResult::unchanged();
            }
            *state = state.merge(AuthStatePatch {
                loading: Some(false),
                error: Some(None),
                session: Some(Some(session.clone())),
                ..Default::default()
            });
            DispatchResult::changed_with(Effect::SessionBegin(session.clone()))
        }

        Action::AuthDidNotify { request, message } => {
            if *request != state.latest {
                return DispatchResult::unchanged();
            }
            *state = state.merge(AuthStatePatch {
                loading: Some(false),
                error: Some(None),
                notice: Some(message.clone()),
                ..Default::default()
            });
            DispatchResult::changed()
        }

        Action::AuthDidError { request, error } => {
            if *request != state.latest {
                return DispatchResult::unchanged();
            }
            *state = state.merge(AuthStatePatch {
                loading: Some(false),
                error: Some(Some(error.clone())),
                ..Default::default()
            });
            DispatchResult::changed()
        }

        Action::AuthResume => DispatchResult::effect(Effect::SessionResume),

        Action::AuthDidResume(session) => {
            state.session = Some(session.clone());
            DispatchResult::changed_with(Effect::SessionBegin(session.clone()))
        }

        Action::AuthLogout => end_session(state),

        // The root reducer turns a current expiry into `AuthLogout`; what
        // reaches here is a timer left over from an earlier session
        Action::AuthDidExpire { expires_at } => {
            if state.expires_at() == Some(*expires_at) {
                end_session(state)
            } else {
                DispatchResult::unchanged()
            }
        }

        Action::AuthRedirectSet(path) => {
            if state.redirect_path == *path {
                return DispatchResult::unchanged();
            }
            state.redirect_path = path.clone();
            DispatchResult::changed()
        }

        _ => DispatchResult::unchanged(),
    }
}

fn start_auth(state: &mut AuthState, call: RemoteCall) -> DispatchResult<Effect> {
    let request = state.latest.next();
    *state = state.merge(AuthStatePatch {
        loading: Some(true),
        error: Some(None),
        notice: Some(None),
        latest: Some(request),
        ..Default::default()
    });
    DispatchResult::changed_with(Effect::Remote { request, call })
}

fn end_session(state: &mut AuthState) -> DispatchResult<Effect> {
    if state.session.is_none() {
        return DispatchResult::unchanged();
    }
    state.session = None;
    DispatchResult::changed_with(Effect::SessionEnd)
}

// ===== Data slices =====

pub fn reduce_stats(state: &mut StatsState, action: &Action) -> DispatchResult<Effect> {
    match action {
        Action::StatsFetch => fetch(&mut state.species, RemoteCall::SpeciesRoster),
        Action::StatsDidLoad { request, rows } => {
            if !state.species.succeed(*request, Arc::clone(rows)) {
                return DispatchResult::unchanged();
            }
            let names = rows
                .iter()
                .map(|row| (row.id.clone(), row.name.clone()))
                .collect();
            DispatchResult::changed_with(Effect::CacheSpeciesNames(names))
        }
        Action::StatsDidError { request, error } => failed(&mut state.species, *request, error),
        _ => DispatchResult::unchanged(),
    }
}

pub fn reduce_species(state: &mut SpeciesState, action: &Action) -> DispatchResult<Effect> {
    match action {
        Action::SpeciesSchemasFetch { species } => fetch(
            &mut state.schemas,
            RemoteCall::SpeciesSchemas {
                species: species.clone(),
            },
        ),
        Action::SpeciesSchemasDidLoad { request, rows } => {
            loaded(&mut state.schemas, *request, rows)
        }
        Action::SpeciesSchemasDidError { request, error } => {
            failed(&mut state.schemas, *request, error)
        }
        Action::SpeciesLociFetch { species } => fetch(
            &mut state.loci_alleles,
            RemoteCall::LociAlleles {
                species: species.clone(),
            },
        ),
        Action::SpeciesLociDidLoad { request, series } => {
            loaded(&mut state.loci_alleles, *request, series)
        }
        Action::SpeciesLociDidError { request, error } => {
            failed(&mut state.loci_alleles, *request, error)
        }
        _ => DispatchResult::unchanged(),
    }
}

pub fn reduce_schema(state: &mut SchemaState, action: &Action) -> DispatchResult<Effect> {
    match action {
        Action::SchemaModesFetch { species, schema } => fetch(
            &mut state.modes,
            RemoteCall::AlleleModes {
                species: species.clone(),
                schema: schema.clone(),
            },
        ),
        Action::SchemaModesDidLoad { request, series } => {
            loaded(&mut state.modes, *request, series)
        }
        Action::SchemaModesDidError { request, error } => failed(&mut state.modes, *request, error),
        Action::SchemaLengthsFetch { species, schema } => fetch(
            &mut state.lengths,
            RemoteCall::LengthStats {
                species: species.clone(),
                schema: schema.clone(),
            },
        ),
        Action::SchemaLengthsDidLoad { request, series } => {
            loaded(&mut state.lengths, *request, series)
        }
        Action::SchemaLengthsDidError { request, error } => {
            failed(&mut state.lengths, *request, error)
        }
        _ => DispatchResult::unchanged(),
    }
}

pub fn reduce_locus(state: &mut LocusState, action: &Action) -> DispatchResult<Effect> {
    match action {
        Action::LocusFastaFetch { locus } => fetch(
            &mut state.alleles,
            RemoteCall::LocusFasta {
                locus: locus.clone(),
            },
        ),
        Action::LocusFastaDidLoad { request, alleles } => {
            loaded(&mut state.alleles, *request, alleles)
        }
        Action::LocusFastaDidError { request, error } => {
            failed(&mut state.alleles, *request, error)
        }
        Action::LocusUniprotFetch { locus } => fetch(
            &mut state.uniprot,
            RemoteCall::LocusUniprot {
                locus: locus.clone(),
            },
        ),
        Action::LocusUniprotDidLoad { request, rows } => loaded(&mut state.uniprot, *request, rows),
        Action::LocusUniprotDidError { request, error } => {
            failed(&mut state.uniprot, *request, error)
        }
        _ => DispatchResult::unchanged(),
    }
}

pub fn reduce_annotations(state: &mut AnnotationsState, action: &Action) -> DispatchResult<Effect> {
    match action {
        Action::AnnotationsFetch { species, schema } => fetch(
            &mut state.rows,
            RemoteCall::Annotations {
                species: species.clone(),
                schema: schema.clone(),
            },
        ),
        Action::AnnotationsDidLoad { request, rows } => loaded(&mut state.rows, *request, rows),
        Action::AnnotationsDidError { request, error } => failed(&mut state.rows, *request, error),
        _ => DispatchResult::unchanged(),
    }
}

pub fn reduce_descriptions(
    state: &mut DescriptionsState,
    action: &Action,
) -> DispatchResult<Effect> {
    match action {
        Action::DescriptionsFetch { species, schema } => fetch(
            &mut state.text,
            RemoteCall::Description {
                species: species.clone(),
                schema: schema.clone(),
            },
        ),
        Action::DescriptionsDidLoad { request, text } => loaded(&mut state.text, *request, text),
        Action::DescriptionsDidError { request, error } => failed(&mut state.text, *request, error),
        _ => DispatchResult::unchanged(),
    }
}

pub fn reduce_sequences(state: &mut SequencesState, action: &Action) -> DispatchResult<Effect> {
    match action {
        Action::SequencesSearch { sequence } => fetch(
            &mut state.search,
            RemoteCall::SequenceSearch {
                sequence: sequence.clone(),
            },
        ),
        Action::SequencesDidLoad { request, search } => loaded(&mut state.search, *request, search),
        Action::SequencesDidError { request, error } => failed(&mut state.search, *request, error),
        _ => DispatchResult::unchanged(),
    }
}

pub fn reduce_contributions(
    state: &mut ContributionsState,
    action: &Action,
) -> DispatchResult<Effect> {
    match action {
        Action::ContributionsFetch { species, schema } => fetch(
            &mut state.rows,
            RemoteCall::Contributions {
                species: species.clone(),
                schema: schema.clone(),
            },
        ),
        Action::ContributionsDidLoad {
            request,
            contributions,
        } => loaded(&mut state.rows, *request, contributions),
        Action::ContributionsDidError { request, error } => {
            failed(&mut state.rows, *request, error)
        }
        _ => DispatchResult::unchanged(),
    }
}

pub fn reduce_profile(state: &mut ProfileState, action: &Action) -> DispatchResult<Effect> {
    match action {
        Action::ProfileFetch => fetch(&mut state.user, RemoteCall::Profile),
        Action::ProfileDidLoad { request, user } => DispatchResult::from_changed(
            state.user.succeed(*request, Arc::new(Some(user.clone()))),
        ),
        Action::ProfileUpdate(patch) => {
            fetch(&mut state.user, RemoteCall::UpdateProfile(patch.clone()))
        }
        Action::ProfileDidUpdate { request, patch } => {
            let next = (*state.user.data)
                .as_ref()
                .map(|user| user.merge(patch.clone()));
            DispatchResult::from_changed(state.user.succeed(*request, Arc::new(next)))
        }
        Action::ProfileDidError { request, error } => failed(&mut state.user, *request, error),
        // The signed-out view must not show the previous user, but keeps
        // the failure that caused the logout
        Action::AuthLogout => {
            if state.user.data.is_none() && !state.user.loading {
                return DispatchResult::unchanged();
            }
            let error = state.user.error.take();
            state.user.reset();
            state.user.error = error;
            DispatchResult::changed()
        }
        _ => DispatchResult::unchanged(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::records::{SpeciesRow, UserProfile, UserProfilePatch};
    use crate::series::Scalar;
    use crate::state::Session;
    use chrono::{DateTime, TimeDelta, Utc};

    fn session(token: &str, secs: i64) -> Session {
        Session::new(token, DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(secs))
    }

    fn remote_request(result: &DispatchResult<Effect>) -> RequestId {
        match result.effects.as_slice() {
            [Effect::Remote { request, .. }] => *request,
            other => panic!("expected one remote effect, got {other:?}"),
        }
    }

    fn species_row(id: &str, name: &str) -> SpeciesRow {
        SpeciesRow {
            id: id.into(),
            name: name.into(),
            schemas: Scalar::Int(1),
        }
    }

    #[test]
    fn test_reducer_is_deterministic() {
        let mut state = AppState::default();
        let rows = Arc::new(vec![species_row("2", "B")]);

        let actions = vec![
            Action::StatsFetch,
            Action::StatsDidLoad {
                request: RequestId::default().next(),
                rows: Arc::clone(&rows),
            },
            Action::AuthLogin {
                email: "a@b.org".into(),
                password: "pw".into(),
            },
            Action::AuthLogout,
            Action::LocusFastaFetch { locus: "7".into() },
        ];

        for action in actions {
            // `before` shares every data Arc with `state`
            let before = state.clone();
            let mut replay = state.clone();

            let r1 = reducer(&mut state, action.clone());
            let r2 = reducer(&mut replay, action);

            assert_eq!(state, replay);
            assert_eq!(r1, r2);
            if !Arc::ptr_eq(&before.stats.species.data, &state.stats.species.data) {
                assert!(before.stats.species.data.is_empty());
            }
        }

        // Success swaps in the payload itself rather than copying into the old Vec
        assert!(Arc::ptr_eq(&state.stats.species.data, &rows));
    }

    #[test]
    fn test_fetch_enters_loading_and_requests_call() {
        let mut state = AppState::default();
        let result = reducer(
            &mut state,
            Action::SchemaModesFetch {
                species: "1".into(),
                schema: "4".into(),
            },
        );

        assert!(result.changed);
        assert!(state.schema.modes.loading);
        assert!(state.is_loading());
        assert_eq!(
            result.effects,
            vec![Effect::Remote {
                request: state.schema.modes.latest(),
                call: RemoteCall::AlleleModes {
                    species: "1".into(),
                    schema: "4".into()
                }
            }]
        );
    }

    #[test]
    fn test_only_the_latest_request_lands() {
        let mut state = AppState::default();
        let first = remote_request(&reducer(&mut state, Action::StatsFetch));
        let second = remote_request(&reducer(&mut state, Action::StatsFetch));

        let fresh = Arc::new(vec![species_row("1", "fresh")]);
        let result = reducer(
            &mut state,
            Action::StatsDidLoad {
                request: second,
                rows: fresh.clone(),
            },
        );
        assert!(result.changed);

        let result = reducer(
            &mut state,
            Action::StatsDidLoad {
                request: first,
                rows: Arc::new(vec![species_row("1", "stale")]),
            },
        );
        assert!(!result.changed);
        assert!(result.effects.is_empty());
        assert!(Arc::ptr_eq(&state.stats.species.data, &fresh));
    }

    #[test]
    fn test_roster_load_caches_names() {
        let mut state = AppState::default();
        let request = remote_request(&reducer(&mut state, Action::StatsFetch));

        let result = reducer(
            &mut state,
            Action::StatsDidLoad {
                request,
                rows: Arc::new(vec![species_row("2", "Escherichia coli")]),
            },
        );

        assert!(!state.stats.species.loading);
        assert_eq!(
            result.effects,
            vec![Effect::CacheSpeciesNames(vec![(
                "2".into(),
                "Escherichia coli".into()
            )])]
        );
    }

    #[test]
    fn test_failure_keeps_data_and_next_start_clears_error() {
        let mut state = AppState::default();
        let request = remote_request(&reducer(&mut state, Action::StatsFetch));
        reducer(
            &mut state,
            Action::StatsDidError {
                request,
                error: ErrorInfo::from(AppError::malformed("missing `message`")),
            },
        );
        assert!(!state.stats.species.loading);
        assert!(state.stats.species.error.is_some());

        reducer(&mut state, Action::StatsFetch);
        assert!(state.stats.species.error.is_none());
    }

    #[test]
    fn test_login_begins_session_and_keeps_redirect() {
        let mut state = AppState::default();
        reducer(&mut state, Action::AuthRedirectSet("/profile".into()));

        let result = reducer(
            &mut state,
            Action::AuthLogin {
                email: "a@b.org".into(),
                password: "pw".into(),
            },
        );
        let request = remote_request(&result);
        assert!(state.auth.loading);

        let result = reducer(
            &mut state,
            Action::AuthDidLogin {
                request,
                session: session("tok", 3600),
            },
        );
        assert_eq!(result.effects, vec![Effect::SessionBegin(session("tok", 3600))]);
        assert!(state.auth.is_authenticated());
        assert_eq!(state.auth.token(), Some("tok"));
        assert_eq!(state.auth.redirect_path, "/profile");
        assert!(!state.auth.loading);
    }

    #[test]
    fn test_logout_is_idempotent() {
        let mut state = AppState::default();
        let result = reducer(&mut state, Action::AuthLogout);
        assert!(!result.changed);
        assert!(result.effects.is_empty());

        reducer(&mut state, Action::AuthDidResume(session("tok", 60)));
        let result = reducer(&mut state, Action::AuthLogout);
        assert!(result.changed);
        assert_eq!(result.effects, vec![Effect::SessionEnd]);
        assert!(!state.auth.is_authenticated());

        let result = reducer(&mut state, Action::AuthLogout);
        assert!(!result.changed);
        assert!(result.effects.is_empty());
    }

    #[test]
    fn test_stale_expiry_is_ignored() {
        let mut state = AppState::default();
        reducer(&mut state, Action::AuthDidResume(session("second", 7200)));

        let result = reducer(
            &mut state,
            Action::AuthDidExpire {
                expires_at: session("first", 3600).expires_at,
            },
        );
        assert!(!result.changed);
        assert!(state.auth.is_authenticated());

        let result = reducer(
            &mut state,
            Action::AuthDidExpire {
                expires_at: session("second", 7200).expires_at,
            },
        );
        assert_eq!(result.effects, vec![Effect::SessionEnd]);
        assert!(!state.auth.is_authenticated());
    }

    #[test]
    fn test_password_notice() {
        let mut state = AppState::default();
        let request = remote_request(&reducer(
            &mut state,
            Action::AuthForgotPassword {
                email: "a@b.org".into(),
            },
        ));
        reducer(
            &mut state,
            Action::AuthDidNotify {
                request,
                message: Some("Check your inbox".into()),
            },
        );
        assert_eq!(state.auth.notice.as_deref(), Some("Check your inbox"));
        assert!(!state.auth.is_authenticated());
    }

    #[test]
    fn test_profile_update_merges_and_logout_clears() {
        let mut state = AppState::default();
        let request = remote_request(&reducer(&mut state, Action::ProfileFetch));
        reducer(
            &mut state,
            Action::ProfileDidLoad {
                request,
                user: UserProfile {
                    id: Scalar::Int(1),
                    username: Some("curator".into()),
                    email: Some("c@example.org".into()),
                    role: None,
                    validated: Some(true),
                    date_registered: None,
                    last_login: None,
                },
            },
        );

        let patch = UserProfilePatch {
            username: Some(Some("editor".into())),
            ..Default::default()
        };
        let request = remote_request(&reducer(&mut state, Action::ProfileUpdate(patch.clone())));
        reducer(&mut state, Action::ProfileDidUpdate { request, patch });

        let user = (*state.profile.user.data).clone().unwrap();
        assert_eq!(user.username.as_deref(), Some("editor"));
        assert_eq!(user.email.as_deref(), Some("c@example.org"));

        reducer(&mut state, Action::AuthLogout);
        assert!(state.profile.user.data.is_none());
    }

    fn signed_in_with_profile() -> AppState {
        let mut state = AppState::default();
        reducer(&mut state, Action::AuthDidResume(session("tok", 60)));
        let request = remote_request(&reducer(&mut state, Action::ProfileFetch));
        reducer(
            &mut state,
            Action::ProfileDidLoad {
                request,
                user: UserProfile {
                    id: Scalar::Int(7),
                    username: Some("ana".into()),
                    email: Some("ana@example.org".into()),
                    role: None,
                    validated: None,
                    date_registered: None,
                    last_login: None,
                },
            },
        );
        state
    }

    #[test]
    fn test_expiry_signs_out_like_logout() {
        let mut expired = signed_in_with_profile();
        let mut logged_out = expired.clone();
        assert!(expired.profile.user.data.is_some());

        let by_timer = reducer(
            &mut expired,
            Action::AuthDidExpire {
                expires_at: session("tok", 60).expires_at,
            },
        );
        let by_user = reducer(&mut logged_out, Action::AuthLogout);

        assert_eq!(expired, logged_out);
        assert_eq!(by_timer, by_user);
        assert!(expired.profile.user.data.is_none());
        assert!(!expired.auth.is_authenticated());
    }

    #[test]
    fn test_stale_expiry_keeps_profile() {
        let mut state = signed_in_with_profile();
        let result = reducer(
            &mut state,
            Action::AuthDidExpire {
                expires_at: session("old", 30).expires_at,
            },
        );

        assert!(!result.changed);
        assert!(state.auth.is_authenticated());
        assert!(state.profile.user.data.is_some());
    }

    #[test]
    fn test_logout_keeps_expiry_error() {
        let mut state = AppState::default();
        reducer(&mut state, Action::AuthDidResume(session("tok", 60)));
        let request = remote_request(&reducer(&mut state, Action::ProfileFetch));
        reducer(
            &mut state,
            Action::ProfileDidError {
                request,
                error: ErrorInfo::session_expired(),
            },
        );

        reducer(&mut state, Action::AuthLogout);
        assert!(!state.auth.is_authenticated());
        assert!(state
            .profile
            .user
            .error
            .as_ref()
            .is_some_and(ErrorInfo::is_session_expired));
    }
}
