//! Node-pool configuration reconciliation.
//!
//! This library keeps a node pool's editable configuration consistent with
//! its parent cluster while a user edits it. Key concepts:
//!
//! - **Edit**: a single field change coming from the form.
//! - **Reaction**: a rule that runs when a field it depends on changes.
//! - **Deferred task**: work that waits until the current batch settles.
//! - **Derived value**: read-only state recomputed from the configuration.
//!
//! # Invariants
//!
//! - Autoscaling bounds are present iff autoscaling is enabled
//! - The raw OAuth scope list is the expansion of the current scope selection
//! - Version syncs never downgrade and never leave the selectable bound
//! - Reconciliation never fails; missing inputs degrade derived values to
//!   their defaults

pub mod autoscaling;
pub mod dispatch;
pub mod error;
pub mod machine;
pub mod model;
pub mod nodes;
pub mod queue;
pub mod reconciler;
pub mod session;
pub mod version;

pub use autoscaling::{DEFAULT_MAX_NODE_COUNT, DEFAULT_MIN_NODE_COUNT};
pub use dispatch::{Edit, Field, FieldSet};
pub use error::{ReconcileError, Rejection};
pub use machine::MachineChoice;
pub use model::*;
pub use queue::DeferredTask;
pub use reconciler::{BatchOutcome, DerivedView, Reconciler};
pub use session::{EditBatch, SessionFile, SessionFormat};

pub use gkepool_scopes::{
    GoogleCatalog, OauthScopesSelection, OptionCatalog, ScopeConfig, ScopeMapper, ScopeSelection,
};
pub use gkepool_version::{KubeVersion, VersionChoice};
