// Copyright (c) 2025 - Cowboy AI, Inc.
//! Composition Root
//!
//! Wires stores, managers, cascades, mirror synchronizers and the outbox
//! dispatcher into one [`CatalogueEngine`].
//!
//! ```text
//!            ┌──────────── LifecycleManager<Service> ──cascade──▶ Datasource, Helpdesk,
//!            │                                                   Monitoring, RIR, CTI stores
//! callers ──▶├──────────── LifecycleManager<TrainingResource> ──▶ RIR, CTI stores
//!            ├──────────── LifecycleManager<InteroperabilityRecord>
//!            ├──────────── LifecycleManager<Datasource>
//!            └──────────── ProviderSuspensionCoordinator ──▶ the four managers
//!                              │ events
//!                              ▼
//!                        EventDispatcher (outbox)
//!                    ├─ mirror-sync   ──▶ PublicMirrorSynchronizer per kind
//!                    ├─ notifications ──▶ Notifier
//!                    └─ extra handlers (nats, ...)
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::adapters::memory::{InMemoryMoveJournal, InMemoryOutbox, InMemoryResourceStore, StaticVocabulary, TracingNotifier};
use crate::cascade::{
    CascadeCoordinator, OwnedResourceSuspension, ProviderSuspensionCoordinator,
    ProviderSuspensionReport, StoreCascade, SubProfileCascade,
};
use crate::config::CatalogueConfig;
use crate::dispatch::{
    DispatchReport, DispatcherHandle, EventDispatcher, EventHandler, EventSink, MirrorSyncHandler,
    NotificationHandler,
};
use crate::domain::{
    ConfigurationTemplateInstance, Datasource, Helpdesk, InteroperabilityRecord, Monitoring, Payload,
    Provider, ResourceInteroperabilityRecord, ResourceKind, Service, TrainingResource,
};
use crate::errors::CatalogueResult;
use crate::identity::{Actor, InternalCapability};
use crate::lifecycle::{LifecycleManager, ReconcileReport};
use crate::mirror::{MirrorSync, PublicMirrorSynchronizer, ResyncReport};
use crate::ports::{Clock, MigrationCollaborator, Notifier, ResourceStore, SystemClock, VocabularyGateway};

/// One in-memory store per payload kind
#[derive(Clone, Default)]
pub struct CatalogueStores {
    pub providers: Arc<InMemoryResourceStore<Provider>>,
    pub services: Arc<InMemoryResourceStore<Service>>,
    pub datasources: Arc<InMemoryResourceStore<Datasource>>,
    pub training_resources: Arc<InMemoryResourceStore<TrainingResource>>,
    pub interoperability_records: Arc<InMemoryResourceStore<InteroperabilityRecord>>,
    pub helpdesks: Arc<InMemoryResourceStore<Helpdesk>>,
    pub monitorings: Arc<InMemoryResourceStore<Monitoring>>,
    pub resource_interoperability_records: Arc<InMemoryResourceStore<ResourceInteroperabilityRecord>>,
    pub configuration_template_instances: Arc<InMemoryResourceStore<ConfigurationTemplateInstance>>,
}

impl CatalogueStores {
    pub fn in_memory() -> Self {
        Self::default()
    }
}

fn cascade_to<P: Payload>(store: &Arc<InMemoryResourceStore<P>>) -> Arc<dyn SubProfileCascade> {
    Arc::new(StoreCascade::<P>::new(store.clone()))
}

fn mirror_of<P: Payload>(store: &Arc<InMemoryResourceStore<P>>) -> Arc<dyn MirrorSync> {
    Arc::new(PublicMirrorSynchronizer::<P>::new(store.clone()))
}

/// Collaborators and options for [`CatalogueEngine`]
pub struct EngineBuilder {
    config: CatalogueConfig,
    stores: CatalogueStores,
    vocabulary: Arc<dyn VocabularyGateway>,
    notifier: Arc<dyn Notifier>,
    migration: Option<Arc<dyn MigrationCollaborator>>,
    clock: Arc<dyn Clock>,
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EngineBuilder {
    pub fn new(config: CatalogueConfig) -> Self {
        Self {
            config,
            stores: CatalogueStores::in_memory(),
            vocabulary: Arc::new(StaticVocabulary::with_catalogue_defaults()),
            notifier: Arc::new(TracingNotifier),
            migration: None,
            clock: Arc::new(SystemClock),
            handlers: Vec::new(),
        }
    }

    pub fn with_stores(mut self, stores: CatalogueStores) -> Self {
        self.stores = stores;
        self
    }

    pub fn with_vocabulary(mut self, vocabulary: Arc<dyn VocabularyGateway>) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_migration(mut self, migration: Arc<dyn MigrationCollaborator>) -> Self {
        self.migration = Some(migration);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Register an additional outbox handler, e.g. [`crate::nats::NatsEventPublisher`]
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn build(self) -> CatalogueEngine {
        let stores = self.stores;
        let providers: Arc<dyn ResourceStore<Provider>> = stores.providers.clone();

        let mirrors = MirrorSyncHandler::new()
            .with_synchronizer(mirror_of(&stores.providers))
            .with_synchronizer(mirror_of(&stores.services))
            .with_synchronizer(mirror_of(&stores.datasources))
            .with_synchronizer(mirror_of(&stores.training_resources))
            .with_synchronizer(mirror_of(&stores.interoperability_records))
            .with_synchronizer(mirror_of(&stores.helpdesks))
            .with_synchronizer(mirror_of(&stores.monitorings))
            .with_synchronizer(mirror_of(&stores.resource_interoperability_records))
            .with_synchronizer(mirror_of(&stores.configuration_template_instances));
        let mirror_handler = Arc::new(mirrors);

        let outbox = Arc::new(InMemoryOutbox::new());
        let mut dispatcher = EventDispatcher::new(outbox.clone(), self.config.retry_policy())
            .with_clock(self.clock.clone())
            .with_batch_size(self.config.dispatcher.batch_size)
            .with_handler(mirror_handler.clone())
            .with_handler(Arc::new(NotificationHandler::new(providers.clone(), self.notifier)));
        for handler in self.handlers {
            dispatcher = dispatcher.with_handler(handler);
        }
        let dispatcher = Arc::new(dispatcher);
        let sink: Arc<dyn EventSink> = dispatcher.clone();

        let moves = Arc::new(InMemoryMoveJournal::new());
        let service_cascade = CascadeCoordinator::new()
            .with_cascade(cascade_to(&stores.datasources))
            .with_cascade(cascade_to(&stores.helpdesks))
            .with_cascade(cascade_to(&stores.monitorings))
            .with_cascade(cascade_to(&stores.resource_interoperability_records))
            .with_cascade(cascade_to(&stores.configuration_template_instances));
        let training_cascade = CascadeCoordinator::new()
            .with_cascade(cascade_to(&stores.resource_interoperability_records))
            .with_cascade(cascade_to(&stores.configuration_template_instances));

        let manager = |cascade: CascadeCoordinator| ManagerParts {
            providers: providers.clone(),
            vocabulary: self.vocabulary.clone(),
            sink: sink.clone(),
            clock: self.clock.clone(),
            migration: self.migration.clone(),
            moves: moves.clone(),
            cascade,
        };

        let services = Arc::new(manager(service_cascade).build(stores.services.clone()));
        let training_resources = Arc::new(manager(training_cascade).build(stores.training_resources.clone()));
        let interoperability_records =
            Arc::new(manager(CascadeCoordinator::new()).build(stores.interoperability_records.clone()));
        let datasources = Arc::new(manager(CascadeCoordinator::new()).build(stores.datasources.clone()));

        let owned: [Arc<dyn OwnedResourceSuspension>; 4] = [
            services.clone(),
            training_resources.clone(),
            interoperability_records.clone(),
            datasources.clone(),
        ];
        let provider_suspension = owned.into_iter().fold(
            ProviderSuspensionCoordinator::new(providers, sink).with_clock(self.clock.clone()),
            |coordinator, owned| coordinator.with_owned(owned),
        );

        info!(
            catalogue_id = %self.config.catalogue_id,
            handlers = ?dispatcher.handler_names(),
            "Catalogue engine assembled"
        );

        CatalogueEngine {
            capability: InternalCapability::issue("catalogue-engine"),
            config: self.config,
            stores,
            services,
            training_resources,
            interoperability_records,
            datasources,
            provider_suspension,
            mirrors: mirror_handler,
            dispatcher,
            outbox,
            moves,
        }
    }
}

struct ManagerParts {
    providers: Arc<dyn ResourceStore<Provider>>,
    vocabulary: Arc<dyn VocabularyGateway>,
    sink: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    migration: Option<Arc<dyn MigrationCollaborator>>,
    moves: Arc<InMemoryMoveJournal>,
    cascade: CascadeCoordinator,
}

impl ManagerParts {
    fn build<P: crate::domain::Relocatable>(self, store: Arc<InMemoryResourceStore<P>>) -> LifecycleManager<P> {
        let manager = LifecycleManager::new(store, self.providers, self.vocabulary, self.sink)
            .with_cascade(self.cascade)
            .with_clock(self.clock)
            .with_move_journal(self.moves);
        match self.migration {
            Some(migration) => manager.with_migration(migration),
            None => manager,
        }
    }
}

/// Fully wired lifecycle engine over in-memory stores
pub struct CatalogueEngine {
    pub config: CatalogueConfig,
    pub stores: CatalogueStores,
    pub services: Arc<LifecycleManager<Service>>,
    pub training_resources: Arc<LifecycleManager<TrainingResource>>,
    pub interoperability_records: Arc<LifecycleManager<InteroperabilityRecord>>,
    pub datasources: Arc<LifecycleManager<Datasource>>,
    pub provider_suspension: ProviderSuspensionCoordinator,
    pub dispatcher: Arc<EventDispatcher>,
    pub outbox: Arc<InMemoryOutbox>,
    pub moves: Arc<InMemoryMoveJournal>,
    mirrors: Arc<MirrorSyncHandler>,
    capability: InternalCapability,
}

impl CatalogueEngine {
    pub fn builder(config: CatalogueConfig) -> EngineBuilder {
        EngineBuilder::new(config)
    }

    /// Engine with default collaborators
    pub fn in_memory(config: CatalogueConfig) -> Self {
        EngineBuilder::new(config).build()
    }

    /// Credential the engine runs its own background work under
    pub fn capability(&self) -> &InternalCapability {
        &self.capability
    }

    pub fn system_actor(&self) -> Actor {
        Actor::System(self.capability.clone())
    }

    /// Suspend or unsuspend a provider and everything it owns
    pub async fn suspend_provider(
        &self,
        provider_id: &str,
        catalogue_id: &str,
        suspended: bool,
        actor: &Actor,
    ) -> CatalogueResult<ProviderSuspensionReport> {
        self.provider_suspension
            .suspend_provider(provider_id, catalogue_id, suspended, actor)
            .await
    }

    /// Deliver every due outbox entry
    pub async fn drain_events(&self) -> CatalogueResult<DispatchReport> {
        self.dispatcher.run_once().await
    }

    /// Start the background dispatcher at the configured poll interval
    pub fn spawn_dispatcher(&self) -> DispatcherHandle {
        self.dispatcher
            .clone()
            .spawn(self.config.dispatcher.poll_interval())
    }

    /// Finish or abandon every interrupted ownership move
    pub async fn reconcile_moves(&self) -> CatalogueResult<ReconcileReport> {
        let reports = [
            self.services.reconcile_moves(&self.capability).await?,
            self.training_resources.reconcile_moves(&self.capability).await?,
            self.interoperability_records.reconcile_moves(&self.capability).await?,
            self.datasources.reconcile_moves(&self.capability).await?,
        ];
        Ok(reports.into_iter().fold(ReconcileReport::default(), |mut total, report| {
            total.completed += report.completed;
            total.abandoned += report.abandoned;
            total.still_pending += report.still_pending;
            total
        }))
    }

    /// Rebuild mirrors of every kind in `catalogue_id`
    ///
    /// A kind whose resync fails is logged and left out of the result.
    pub async fn resync_mirrors(&self, catalogue_id: &str) -> BTreeMap<ResourceKind, ResyncReport> {
        let mut reports = BTreeMap::new();
        for synchronizer in self.mirrors.synchronizers() {
            match synchronizer.resync(catalogue_id).await {
                Ok(report) => {
                    reports.insert(synchronizer.kind(), report);
                }
                Err(err) => warn!(
                    kind = synchronizer.kind().as_str(),
                    catalogue_id = %catalogue_id,
                    error = %err,
                    "Mirror resync failed"
                ),
            }
        }
        reports
    }
}
