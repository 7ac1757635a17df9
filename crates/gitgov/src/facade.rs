// SPDX-License-Identifier: MIT OR Apache-2.0
//! Assembles every adapter into one [`GitGov`] facade.
//!
//! Construction order follows spec.md §9's cyclic-ownership note: whatever
//! wires the system builds [`FeedbackAdapter`] before [`BacklogAdapter`],
//! since Backlog holds a reference to Feedback but Feedback never holds one
//! back to Backlog (it only publishes events Backlog subscribes to).

use std::path::Path;
use std::sync::Arc;

use gitgov_agent::AgentAdapter;
use gitgov_backlog::{BacklogAdapter, BacklogConfig};
use gitgov_config::{GitGovConfig, MethodologySource};
use gitgov_eventbus::EventBus;
use gitgov_factory::{
    ActorPayload, AgentPayload, ChangelogPayload, CyclePayload, ExecutionPayload, FeedbackPayload, TaskPayload,
};
use gitgov_feedback::FeedbackAdapter;
use gitgov_identity::IdentityAdapter;
use gitgov_metrics::MetricsAdapter;
use gitgov_store::{
    FsKeyProvider, FsSessionManager, FsStore, KeyProvider, MemoryKeyProvider, MemorySessionManager, MemoryStore,
    RecordStore, SessionManager,
};
use gitgov_workflow::WorkflowMethodology;

use crate::error::Result;

/// Every adapter, wired and ready. Cheaply cloneable — every field is
/// itself `Arc`-backed or (for [`BacklogAdapter`]) an `Arc`-backed facade.
#[derive(Clone)]
pub struct GitGov {
    /// Actor identity, key rotation, and record signing.
    pub identity: Arc<IdentityAdapter>,
    /// Agent manifest CRUD.
    pub agent: Arc<AgentAdapter>,
    /// Feedback creation, resolution, and the duplicate-assignment guard.
    pub feedback: Arc<FeedbackAdapter>,
    /// The loaded workflow methodology (kanban by default).
    pub workflow: Arc<WorkflowMethodology>,
    /// Task/cycle lifecycle, link maintenance, and reactive event handlers.
    pub backlog: BacklogAdapter,
    /// Read-only health/throughput/collaboration aggregations.
    pub metrics: Arc<MetricsAdapter>,
    /// The shared event bus every adapter publishes to and subscribes on.
    pub bus: EventBus,
}

fn methodology_from_config(source: &MethodologySource) -> Result<WorkflowMethodology> {
    Ok(match source {
        MethodologySource::Bundled { name } if name == "scrum" => WorkflowMethodology::create_scrum(),
        MethodologySource::Bundled { .. } => WorkflowMethodology::create_default(),
        MethodologySource::File { path } => {
            let text = std::fs::read_to_string(path).map_err(gitgov_store::StoreError::Io)?;
            WorkflowMethodology::from_json(&text)?
        }
    })
}

impl GitGov {
    /// Wire a facade from arbitrary store/key/session backends — the
    /// building block [`GitGov::open_in_memory`]/[`GitGov::open_fs`]
    /// specialize. Useful for embedders bringing their own persistence.
    #[allow(clippy::too_many_arguments)]
    pub async fn assemble(
        task_store: Arc<dyn RecordStore<TaskPayload>>,
        cycle_store: Arc<dyn RecordStore<CyclePayload>>,
        execution_store: Arc<dyn RecordStore<ExecutionPayload>>,
        changelog_store: Arc<dyn RecordStore<ChangelogPayload>>,
        feedback_store: Arc<dyn RecordStore<FeedbackPayload>>,
        actor_store: Arc<dyn RecordStore<ActorPayload>>,
        agent_store: Arc<dyn RecordStore<AgentPayload>>,
        keys: Arc<dyn KeyProvider>,
        session: Arc<dyn SessionManager>,
        config: GitGovConfig,
    ) -> Result<Self> {
        let bus = EventBus::new();
        let workflow = Arc::new(methodology_from_config(&config.methodology_source)?);

        let identity = Arc::new(IdentityAdapter::new(actor_store, keys.clone(), session, bus.clone()));
        let agent = Arc::new(AgentAdapter::new(agent_store.clone(), keys, identity.clone(), bus.clone()));

        // Feedback before Backlog — see module docs.
        let feedback = Arc::new(FeedbackAdapter::new(feedback_store, identity.clone(), bus.clone()));

        let metrics = Arc::new(MetricsAdapter::new(
            task_store.clone(),
            feedback.clone(),
            Some(execution_store.clone()),
            Some(agent_store),
            config.health_thresholds,
        ));

        let backlog = BacklogAdapter::new(
            task_store,
            cycle_store,
            execution_store,
            changelog_store,
            identity.clone(),
            feedback.clone(),
            metrics.clone(),
            workflow.clone(),
            bus.clone(),
            BacklogConfig { health_thresholds: config.health_thresholds },
        )
        .await;

        Ok(Self { identity, agent, feedback, workflow, backlog, metrics, bus })
    }

    /// Wire a facade entirely in memory — the backend every test and
    /// short-lived embedding uses.
    pub async fn open_in_memory(config: GitGovConfig) -> Result<Self> {
        Self::assemble(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryKeyProvider::new()),
            Arc::new(MemorySessionManager::new()),
            config,
        )
        .await
    }

    /// Wire a facade against an on-disk `.gitgov/` layout rooted at `root`
    /// (created lazily on first write by the underlying `FsStore`s).
    pub async fn open_fs(root: impl AsRef<Path>, config: GitGovConfig) -> Result<Self> {
        let root = root.as_ref();
        Self::assemble(
            Arc::new(FsStore::new(root.join("tasks"))),
            Arc::new(FsStore::new(root.join("cycles"))),
            Arc::new(FsStore::new(root.join("executions"))),
            Arc::new(FsStore::new(root.join("changelogs"))),
            Arc::new(FsStore::new(root.join("feedback"))),
            Arc::new(FsStore::new(root.join("actors"))),
            Arc::new(FsStore::new(root.join("agents"))),
            Arc::new(FsKeyProvider::new(root.join(".keys"))),
            Arc::new(FsSessionManager::new(root)),
            config,
        )
        .await
    }
}
