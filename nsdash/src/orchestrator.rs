//! Effect handler: remote calls, session persistence, timers
//!
//! Every remote call runs as a detached task: it is never cancelled and
//! always ends with exactly one terminal action (`*DidLoad`/`*DidError`, or
//! the auth equivalents). Authenticated calls that find the session gone,
//! or get a 401, additionally send `AuthLogout`.

use std::sync::Arc;

use nsdash_dispatch::{EffectContext, EffectHandler};
use serde_json::{Map, Value};
use tokio::sync::mpsc;

use crate::action::Action;
use crate::api::Transport;
use crate::effect::{Effect, RemoteCall};
use crate::error::{AppError, AppResult, ErrorInfo};
use crate::normalize;
use crate::session::SessionLifecycle;
use crate::state::RequestId;
use crate::storage::SPECIES_NAMES_KEY;

#[derive(Debug, Clone)]
pub struct Orchestrator {
    transport: Arc<dyn Transport>,
    session: SessionLifecycle,
    site_base: Arc<str>,
}

impl Orchestrator {
    pub fn new(
        transport: Arc<dyn Transport>,
        session: SessionLifecycle,
        site_base: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            transport,
            session,
            site_base: site_base.into(),
        }
    }

    pub fn session(&self) -> &SessionLifecycle {
        &self.session
    }

    fn start_remote(
        &self,
        request: RequestId,
        call: RemoteCall,
        ctx: &mut EffectContext<'_, Action>,
    ) {
        let this = self.clone();
        ctx.tasks()
            .detach_with(move |tx| async move { this.perform(request, call, tx).await });
    }

    async fn perform(
        self,
        request: RequestId,
        call: RemoteCall,
        tx: mpsc::UnboundedSender<Action>,
    ) {
        let mut api_request = match call.api_request() {
            Ok(api_request) => api_request,
            Err(err) => {
                tracing::error!(%request, error = %err, "Could not build request");
                let _ = tx.send(call.fail(request, ErrorInfo::from(&err)));
                return;
            }
        };
        let route = api_request.route();

        if call.requires_auth() {
            match self.session.current() {
                Some(session) => api_request = api_request.with_token(session.token),
                None => {
                    tracing::warn!(%route, %request, "No live session for authenticated call");
                    let _ = tx.send(call.fail(request, ErrorInfo::session_expired()));
                    let _ = tx.send(Action::AuthLogout);
                    return;
                }
            }
        }

        let outcome = match self.transport.send(api_request).await {
            Ok(payload) => self.resolve(request, &call, &payload),
            Err(err) => Err(err),
        };

        match outcome {
            Ok(action) => {
                tracing::debug!(%route, %request, "Remote call succeeded");
                let _ = tx.send(action);
            }
            Err(err) => {
                let expired = call.requires_auth()
                    && (err == AppError::SessionExpired || err.status() == Some(401));
                tracing::warn!(
                    %route,
                    %request,
                    status = ?err.status(),
                    error = %err,
                    "Remote call failed"
                );

                let info = if expired {
                    ErrorInfo::session_expired()
                } else {
                    ErrorInfo::from(&err)
                };
                let _ = tx.send(call.fail(request, info));
                if expired {
                    let _ = tx.send(Action::AuthLogout);
                }
            }
        }
    }

    /// Normalize a successful payload into the call's success action.
    fn resolve(&self, request: RequestId, call: &RemoteCall, payload: &Value) -> AppResult<Action> {
        use RemoteCall::*;
        Ok(match call {
            SpeciesRoster => Action::StatsDidLoad {
                request,
                rows: Arc::new(normalize::species_roster(payload)?),
            },
            SpeciesSchemas { .. } => Action::SpeciesSchemasDidLoad {
                request,
                rows: Arc::new(normalize::species_schemas(payload)?),
            },
            LociAlleles { .. } => Action::SpeciesLociDidLoad {
                request,
                series: Arc::new(normalize::loci_alleles(payload)?),
            },
            AlleleModes { .. } => Action::SchemaModesDidLoad {
                request,
                series: Arc::new(normalize::allele_modes(payload)?),
            },
            LengthStats { .. } => Action::SchemaLengthsDidLoad {
                request,
                series: Arc::new(normalize::length_stats(payload)?),
            },
            Annotations { .. } => Action::AnnotationsDidLoad {
                request,
                rows: Arc::new(normalize::annotations(payload)?),
            },
            Description { .. } => Action::DescriptionsDidLoad {
                request,
                text: Arc::new(normalize::description(payload)?),
            },
            Contributions { .. } => Action::ContributionsDidLoad {
                request,
                contributions: Arc::new(normalize::contributions(payload)?),
            },
            LocusFasta { .. } => Action::LocusFastaDidLoad {
                request,
                alleles: Arc::new(normalize::fasta(payload)?),
            },
            LocusUniprot { .. } => Action::LocusUniprotDidLoad {
                request,
                rows: Arc::new(normalize::uniprot(payload)?),
            },
            SequenceSearch { .. } => Action::SequencesDidLoad {
                request,
                search: Arc::new(normalize::sequence_search(payload, &self.site_base)?),
            },
            Login { .. } | Register { .. } => Action::AuthDidLogin {
                request,
                session: self.session.new_session(normalize::token(payload)?),
            },
            ForgotPassword { .. } | ResetPassword { .. } => Action::AuthDidNotify {
                request,
                message: normalize::notice(payload),
            },
            Profile => Action::ProfileDidLoad {
                request,
                user: normalize::profile(payload)?,
            },
            UpdateProfile(patch) => Action::ProfileDidUpdate {
                request,
                patch: patch.clone(),
            },
        })
    }

    fn cache_species_names(&self, names: Vec<(String, String)>) {
        let map: Map<String, Value> = names
            .into_iter()
            .map(|(id, name)| (id, Value::String(name)))
            .collect();
        let result = self
            .session
            .storage()
            .set(SPECIES_NAMES_KEY, &Value::Object(map).to_string());
        if let Err(err) = result {
            tracing::warn!(error = %err, "Failed to cache species names");
        }
    }
}

impl EffectHandler<Action, Effect> for Orchestrator {
    fn handle(&mut self, effect: Effect, ctx: &mut EffectContext<'_, Action>) {
        match effect {
            Effect::Remote { request, call } => self.start_remote(request, call, ctx),
            Effect::SessionBegin(session) => self.session.begin(&session, ctx.tasks()),
            Effect::SessionEnd => self.session.end(ctx.tasks()),
            Effect::SessionResume => {
                if let Some(session) = self.session.resume() {
                    ctx.emit(Action::AuthDidResume(session));
                }
            }
            Effect::CacheSpeciesNames(names) => self.cache_species_names(names),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::TransportError;
    use crate::storage::{ClientStorage, MemoryStorage, TOKEN_KEY};
    use crate::testing::MockTransport;
    use chrono::TimeDelta;
    use nsdash_dispatch::{assert_emitted, TestHarness};
    use serde_json::json;

    fn setup(transport: &MockTransport) -> (Orchestrator, MemoryStorage) {
        let storage = MemoryStorage::new();
        let session = SessionLifecycle::new(
            Arc::new(storage.clone()),
            Arc::new(ManualClock::default()),
            TimeDelta::seconds(3600),
        );
        let orchestrator =
            Orchestrator::new(Arc::new(transport.clone()), session, "http://site");
        (orchestrator, storage)
    }

    fn harness() -> TestHarness<(), Action> {
        TestHarness::new(())
    }

    fn request() -> RequestId {
        RequestId::default().next()
    }

    #[tokio::test]
    async fn test_success_dispatches_normalized_payload() {
        let transport = MockTransport::new();
        transport.reply(
            "GET stats/species",
            Ok(json!({ "message": [
                { "species": { "value": "http://ns/species/30" }, "name": { "value": "C" } },
                { "species": { "value": "http://ns/species/2" }, "name": { "value": "A" } }
            ]})),
        );
        let (mut orchestrator, _) = setup(&transport);
        let mut harness = harness();

        harness.handle(
            &mut orchestrator,
            Effect::Remote {
                request: request(),
                call: RemoteCall::SpeciesRoster,
            },
        );

        let action = harness.next_emitted().await.expect("terminal action");
        let Action::StatsDidLoad { rows, .. } = action else {
            panic!("unexpected {action:?}");
        };
        let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "30"]);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_becomes_descriptor() {
        let transport = MockTransport::new();
        transport.reply(
            "GET loci/7/fasta",
            Err(TransportError::new(Some(500), "boom").into()),
        );
        let (mut orchestrator, _) = setup(&transport);
        let mut harness = harness();

        harness.handle(
            &mut orchestrator,
            Effect::Remote {
                request: request(),
                call: RemoteCall::LocusFasta { locus: "7".into() },
            },
        );

        let action = harness.next_emitted().await.expect("terminal action");
        let error = action.error().expect("failure action");
        assert_eq!(error.status, Some(500));
        assert_eq!(error.message, "boom");
        assert!(action.is_locus());
    }

    #[tokio::test]
    async fn test_missing_container_is_malformed_failure() {
        let transport = MockTransport::new();
        transport.reply("GET stats/species", Ok(json!({ "unexpected": true })));
        let (mut orchestrator, _) = setup(&transport);
        let mut harness = harness();

        harness.handle(
            &mut orchestrator,
            Effect::Remote {
                request: request(),
                call: RemoteCall::SpeciesRoster,
            },
        );

        let action = harness.next_emitted().await.expect("terminal action");
        assert_eq!(
            action.error().map(|e| e.kind),
            Some(crate::error::ErrorKind::MalformedResponse)
        );
    }

    #[tokio::test]
    async fn test_authenticated_call_without_session_logs_out() {
        let transport = MockTransport::new();
        let (mut orchestrator, _) = setup(&transport);
        let mut harness = harness();

        harness.handle(
            &mut orchestrator,
            Effect::Remote {
                request: request(),
                call: RemoteCall::Profile,
            },
        );

        let failure = harness.next_emitted().await.expect("failure");
        assert!(failure.error().is_some_and(ErrorInfo::is_session_expired));
        assert_eq!(harness.next_emitted().await, Some(Action::AuthLogout));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_unauthorized_response_expires_session() {
        let transport = MockTransport::new();
        transport.reply(
            "GET user/current_user",
            Err(TransportError::new(Some(401), "token expired").into()),
        );
        let (mut orchestrator, storage) = setup(&transport);
        let mut harness = harness();
        let session = orchestrator.session().new_session("tok");
        harness.handle(&mut orchestrator, Effect::SessionBegin(session));

        harness.handle(
            &mut orchestrator,
            Effect::Remote {
                request: request(),
                call: RemoteCall::Profile,
            },
        );

        let failure = harness.next_emitted().await.expect("failure");
        assert!(failure.error().is_some_and(ErrorInfo::is_session_expired));
        assert_eq!(harness.next_emitted().await, Some(Action::AuthLogout));
        assert_eq!(transport.requests()[0].token.as_deref(), Some("tok"));
        assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn test_login_builds_session_from_clock() {
        let transport = MockTransport::new();
        transport.reply("POST auth/login", Ok(json!({ "access_token": "abc" })));
        let (mut orchestrator, _) = setup(&transport);
        let mut harness = harness();

        harness.handle(
            &mut orchestrator,
            Effect::Remote {
                request: request(),
                call: RemoteCall::Login {
                    email: "a@b.org".into(),
                    password: "pw".into(),
                },
            },
        );

        let action = harness.next_emitted().await.expect("terminal action");
        let Action::AuthDidLogin { session, .. } = action else {
            panic!("unexpected {action:?}");
        };
        assert_eq!(session.token, "abc");
        assert_eq!(
            session.expires_at,
            chrono::DateTime::<chrono::Utc>::UNIX_EPOCH + TimeDelta::seconds(3600)
        );
    }

    #[tokio::test]
    async fn test_resume_emits_persisted_session() {
        let transport = MockTransport::new();
        let (mut orchestrator, _) = setup(&transport);
        let mut harness = harness();

        harness.handle(&mut orchestrator, Effect::SessionResume);
        assert!(!harness.has_emitted());

        let session = orchestrator.session().new_session("tok");
        harness.handle(&mut orchestrator, Effect::SessionBegin(session.clone()));
        harness.handle(&mut orchestrator, Effect::SessionResume);

        let emitted = harness.drain_emitted();
        assert_emitted!(emitted, Action::AuthDidResume(s) if *s == session);
    }

    #[tokio::test]
    async fn test_species_names_cached() {
        let transport = MockTransport::new();
        let (mut orchestrator, storage) = setup(&transport);
        let mut harness = harness();

        harness.handle(
            &mut orchestrator,
            Effect::CacheSpeciesNames(vec![("2".into(), "Escherichia coli".into())]),
        );

        let cached: Value =
            serde_json::from_str(&storage.get(SPECIES_NAMES_KEY).unwrap()).unwrap();
        assert_eq!(cached, json!({ "2": "Escherichia coli" }));
    }
}
