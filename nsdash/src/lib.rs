//! nsdash: headless core of a nomenclature server dashboard
//!
//! Holds the client state tree ([`AppState`]), the actions that change it,
//! and the orchestrator that turns reducer effects into API calls, session
//! timers and client-storage writes. Raw API payloads are normalized into
//! display-ready records before they reach any slice.
//!
//! # Example
//! ```ignore
//! use std::sync::Arc;
//! use nsdash::{Action, Dashboard, HttpTransport, FileStorage, Settings, SystemClock};
//!
//! let settings = nsdash::load_settings(None)?;
//! let mut dashboard = Dashboard::new(
//!     &settings,
//!     Arc::new(HttpTransport::new(&settings)?),
//!     Arc::new(FileStorage::open(settings.storage_path())?),
//!     Arc::new(SystemClock),
//! );
//! dashboard.resume_session();
//! dashboard.dispatch(Action::StatsFetch);
//! dashboard.settle().await;
//! println!("{:?}", dashboard.state().stats.species.data);
//! ```

pub mod action;
pub mod api;
pub mod app;
pub mod clock;
pub mod config;
pub mod creators;
pub mod effect;
pub mod error;
pub mod normalize;
pub mod orchestrator;
pub mod records;
pub mod reducer;
pub mod series;
pub mod session;
pub mod state;
pub mod storage;
pub mod testing;

pub use action::Action;
pub use api::{ApiRequest, HttpTransport, Method, Transport};
pub use app::{Dashboard, DashboardStore};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{load_settings, Settings};
pub use effect::{Effect, RemoteCall};
pub use error::{AppError, AppResult, ErrorInfo, ErrorKind, TransportError, ValidationError};
pub use orchestrator::Orchestrator;
pub use reducer::reducer;
pub use series::{Scalar, SeriesKind, SeriesRecord};
pub use session::SessionLifecycle;
pub use state::{AppState, AuthState, Remote, RequestId, Session};
pub use storage::{ClientStorage, FileStorage, MemoryStorage};
