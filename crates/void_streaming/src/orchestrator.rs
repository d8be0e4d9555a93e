//! Loading orchestrator - keeps the right set of levels resident
//!
//! Given a target level, the orchestrator works out which levels should be
//! loaded under its `Strategy`, diffs that against the residency set and
//! drives the asynchronous loads and unloads to completion.
//!
//! Scheduling is cooperative and single-threaded: every batch fans out one
//! future per level and joins them all; a failing level never cancels its
//! siblings. Within one call, every unload is joined before the first load is
//! issued. Residency and controller registries are only mutated synchronously
//! right after a suspension resumes.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::{Rc, Weak};

use futures_util::future::join_all;
use void_level_graph::{clamp_depth, LevelCatalog, LevelId, NeighborExpansion};

use crate::error::{LevelError, LevelResult};
use crate::events::LevelEventBus;
use crate::lifecycle::{LevelController, LevelRegistry, LevelState, SharedController, WeakController};
use crate::loader::{AssetLoader, LevelInstanceScanner};
use crate::residency::{LevelResidencySet, LoadHandle, ResidencyScope};

/// Residency policy, fixed per orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Keep levels within `depth` hops of the target resident
    Neighbours(u32),
    /// Keep the target's whole world resident
    Worlds,
    /// Keep the target's whole area resident
    Areas,
}

impl Strategy {
    /// Neighbour strategy with the depth clamped to the accepted range
    pub fn neighbours(depth: u32) -> Self {
        let clamped = clamp_depth(depth);
        if clamped != depth {
            log::warn!("Strategy: neighbour depth {} clamped to {}", depth, clamped);
        }
        Self::Neighbours(clamped)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Neighbours(depth) => write!(f, "neighbours({})", depth),
            Self::Worlds => write!(f, "worlds"),
            Self::Areas => write!(f, "areas"),
        }
    }
}

/// Outcome of a single load request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    AlreadyResident,
    AlreadyInFlight,
}

/// Outcome of a single unload request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnloadOutcome {
    Unloaded,
    NotResident,
    AlreadyInFlight,
}

/// What an `ensure_residency` call did
#[derive(Debug, Default)]
pub struct ResidencyReport {
    pub loaded: Vec<LevelId>,
    pub unloaded: Vec<LevelId>,
    /// Requests that turned out to be no-ops
    pub skipped: Vec<LevelId>,
    /// Per-level failures; siblings were unaffected
    pub failed: Vec<LevelError>,
}

impl ResidencyReport {
    /// Every requested operation succeeded
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of loads and unloads actually attempted
    pub fn operation_count(&self) -> usize {
        self.loaded.len() + self.unloaded.len() + self.failed.len()
    }

    fn record_load(&mut self, id: &LevelId, result: LevelResult<LoadOutcome>) {
        match result {
            Ok(LoadOutcome::Loaded) => self.loaded.push(id.clone()),
            Ok(_) => self.skipped.push(id.clone()),
            Err(err) => self.failed.push(err),
        }
    }

    fn record_unload(&mut self, id: &LevelId, result: LevelResult<UnloadOutcome>) {
        match result {
            Ok(UnloadOutcome::Unloaded) => self.unloaded.push(id.clone()),
            Ok(_) => self.skipped.push(id.clone()),
            Err(err) => self.failed.push(err),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum GroupKind {
    World,
    Area,
}

/// Level graph loading/unloading orchestrator
pub struct LoadingOrchestrator {
    catalog: Rc<LevelCatalog>,
    loader: Rc<dyn AssetLoader>,
    scanner: Rc<dyn LevelInstanceScanner>,
    events: Rc<LevelEventBus>,
    strategy: Strategy,
    residency: RefCell<LevelResidencySet>,
    registry: RefCell<LevelRegistry>,
    expansion: RefCell<NeighborExpansion>,
    current: RefCell<WeakController>,
    current_group: RefCell<Option<String>>,
}

impl LoadingOrchestrator {
    /// Create an orchestrator for one universe root
    pub fn new(
        catalog: Rc<LevelCatalog>,
        loader: Rc<dyn AssetLoader>,
        scanner: Rc<dyn LevelInstanceScanner>,
        events: Rc<LevelEventBus>,
        strategy: Strategy,
    ) -> Self {
        for (from, to) in catalog.asymmetric_links() {
            log::warn!("LoadingOrchestrator: {} lists {} as neighbour but not the reverse", from, to);
        }
        for (from, to) in catalog.dangling_links() {
            log::warn!("LoadingOrchestrator: {} lists unknown neighbour {}", from, to);
        }
        log::info!(
            "LoadingOrchestrator: {} levels, strategy {}",
            catalog.len(),
            strategy
        );

        Self {
            catalog,
            loader,
            scanner,
            events,
            strategy,
            residency: RefCell::new(LevelResidencySet::new()),
            registry: RefCell::new(LevelRegistry::new()),
            expansion: RefCell::new(NeighborExpansion::new()),
            current: RefCell::new(Weak::new()),
            current_group: RefCell::new(None),
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn catalog(&self) -> &Rc<LevelCatalog> {
        &self.catalog
    }

    pub fn events(&self) -> &Rc<LevelEventBus> {
        &self.events
    }

    /// Make the level set required by `target` resident
    pub async fn ensure_residency(&self, target: &LevelId) -> LevelResult<ResidencyReport> {
        let Some(record) = self.catalog.get(target) else {
            log::error!("LoadingOrchestrator: cannot ensure residency, unknown level {}", target);
            return Err(LevelError::UnknownLevel(target.clone()));
        };

        if record.standalone {
            let mut report = ResidencyReport::default();
            let result = self.load_one(target, ResidencyScope::Standalone).await;
            report.record_load(target, result);
            return Ok(report);
        }

        match self.strategy {
            Strategy::Neighbours(depth) => Ok(self.ensure_neighbours(target, depth).await),
            Strategy::Worlds => {
                let world = record.world_id.clone();
                self.ensure_group(GroupKind::World, world).await
            }
            Strategy::Areas => {
                let Some(area) = record.area_id.clone() else {
                    log::error!("LoadingOrchestrator: level {} belongs to no area", target);
                    return Err(LevelError::NoArea(target.clone()));
                };
                self.ensure_group(GroupKind::Area, area).await
            }
        }
    }

    async fn ensure_neighbours(&self, target: &LevelId, depth: u32) -> ResidencyReport {
        self.current_group.borrow_mut().take();

        let ordered: Vec<LevelId> = self
            .expansion
            .borrow_mut()
            .expand(&self.catalog, target, depth)
            .into_iter()
            .filter(|id| self.catalog.get(id).map_or(false, |record| !record.standalone))
            .collect();
        let wanted: BTreeSet<LevelId> = ordered.iter().cloned().collect();

        let stale: Vec<LevelId> = self
            .residency
            .borrow()
            .all_loaded(ResidencyScope::Universe)
            .difference(&wanted)
            .cloned()
            .collect();

        let mut report = ResidencyReport::default();
        self.unload_batch(&stale, ResidencyScope::Universe, &mut report).await;

        let missing: Vec<LevelId> = ordered
            .into_iter()
            .filter(|id| !self.residency.borrow().is_resident_anywhere(id))
            .collect();
        self.load_batch(&missing, ResidencyScope::Universe, &mut report).await;

        log::debug!(
            "LoadingOrchestrator: around {} unloaded {}, loaded {}, failed {}",
            target,
            report.unloaded.len(),
            report.loaded.len(),
            report.failed.len()
        );
        report
    }

    /// Replace the universe scope with every level of `world_id`
    pub async fn load_world(&self, world_id: &str) -> LevelResult<ResidencyReport> {
        self.ensure_group(GroupKind::World, world_id.to_string()).await
    }

    /// Replace the universe scope with every level of `area_id`
    pub async fn load_area(&self, area_id: &str) -> LevelResult<ResidencyReport> {
        self.ensure_group(GroupKind::Area, area_id.to_string()).await
    }

    /// World or area whose levels currently fill the universe scope
    pub fn current_group(&self) -> Option<String> {
        self.current_group.borrow().clone()
    }

    async fn ensure_group(&self, kind: GroupKind, group: String) -> LevelResult<ResidencyReport> {
        let ids = match kind {
            GroupKind::World => self.catalog.universe_ids_in_world(&group),
            GroupKind::Area => self.catalog.universe_ids_in_area(&group),
        };
        if ids.is_empty() {
            log::error!("LoadingOrchestrator: {:?} '{}' has no levels to load", kind, group);
            return Err(match kind {
                GroupKind::World => LevelError::EmptyWorld(group),
                GroupKind::Area => LevelError::EmptyArea(group),
            });
        }

        let mut report = ResidencyReport::default();
        if self.current_group.borrow().as_deref() == Some(group.as_str()) {
            let missing: Vec<LevelId> = ids
                .into_iter()
                .filter(|id| !self.residency.borrow().is_resident_anywhere(id))
                .collect();
            if !missing.is_empty() {
                log::info!(
                    "LoadingOrchestrator: loading {} missing levels of {:?} '{}'",
                    missing.len(),
                    kind,
                    group
                );
            }
            self.load_batch(&missing, ResidencyScope::Universe, &mut report).await;
            return Ok(report);
        }

        log::info!("LoadingOrchestrator: switching to {:?} '{}'", kind, group);
        self.deactivate_current();

        // Levels whose unload fails stay resident with their controllers
        let resident: Vec<LevelId> = self
            .residency
            .borrow()
            .all_loaded(ResidencyScope::Universe)
            .into_iter()
            .collect();
        self.unload_batch(&resident, ResidencyScope::Universe, &mut report).await;
        *self.current_group.borrow_mut() = Some(group);

        let ids: Vec<LevelId> = ids.into_iter().collect();
        self.load_batch(&ids, ResidencyScope::Universe, &mut report).await;
        Ok(report)
    }

    async fn load_batch(&self, ids: &[LevelId], scope: ResidencyScope, report: &mut ResidencyReport) {
        let results = join_all(ids.iter().map(|id| self.load_one(id, scope))).await;
        for (id, result) in ids.iter().zip(results) {
            report.record_load(id, result);
        }
    }

    async fn unload_batch(&self, ids: &[LevelId], scope: ResidencyScope, report: &mut ResidencyReport) {
        let results = join_all(ids.iter().map(|id| self.unload_one(id, scope))).await;
        for (id, result) in ids.iter().zip(results) {
            report.record_unload(id, result);
        }
    }

    /// Load a single level into `scope`. No automatic retry on failure.
    pub async fn load_one(&self, id: &LevelId, scope: ResidencyScope) -> LevelResult<LoadOutcome> {
        let Some(record) = self.catalog.get(id) else {
            log::error!("LoadingOrchestrator: cannot load unknown level {}", id);
            return Err(LevelError::UnknownLevel(id.clone()));
        };

        {
            let mut residency = self.residency.borrow_mut();
            if residency.is_resident_anywhere(id) {
                return Ok(LoadOutcome::AlreadyResident);
            }
            let other = match scope {
                ResidencyScope::Universe => ResidencyScope::Standalone,
                ResidencyScope::Standalone => ResidencyScope::Universe,
            };
            if residency.is_in_flight(id, other) || !residency.begin_load(id, scope) {
                return Ok(LoadOutcome::AlreadyInFlight);
            }
        }

        log::debug!("LoadingOrchestrator: loading {} from '{}'", id, record.load_address);
        let result = if record.scene_backed {
            self.loader.load_scene(&record.load_address).await.map(LoadHandle::Scene)
        } else {
            self.loader.load_object(&record.load_address).await.map(LoadHandle::Object)
        };

        match result {
            Ok(handle) => {
                self.residency.borrow_mut().commit_load(id, scope, handle);
                let layout = self.scanner.scan(id, &handle);
                let controller = LevelController::discover(id.clone(), layout, self.events.clone());
                self.registry.borrow_mut().register(controller);
                log::info!("LoadingOrchestrator: loaded {} ({:?}, {:?})", id, handle.kind(), scope);
                Ok(LoadOutcome::Loaded)
            }
            Err(source) => {
                self.residency.borrow_mut().abort_load(id, scope);
                log::error!("LoadingOrchestrator: failed to load {}: {}", id, source);
                Err(LevelError::Load {
                    level: id.clone(),
                    source,
                })
            }
        }
    }

    /// Unload a single level from `scope`
    pub async fn unload_one(&self, id: &LevelId, scope: ResidencyScope) -> LevelResult<UnloadOutcome> {
        let handle = {
            let mut residency = self.residency.borrow_mut();
            if residency.is_in_flight(id, scope) {
                return Ok(UnloadOutcome::AlreadyInFlight);
            }
            match residency.begin_unload(id, scope) {
                Some(handle) => handle,
                None => return Ok(UnloadOutcome::NotResident),
            }
        };

        let controller = self.registry.borrow().get(id);
        if let Some(controller) = controller {
            if controller.state() == LevelState::Active {
                log::warn!("LoadingOrchestrator: unloading active level {}", id);
                if let Err(err) = controller.deactivate() {
                    log::error!("LoadingOrchestrator: could not deactivate {} before unloading: {}", id, err);
                }
            }
        }

        match handle {
            LoadHandle::Object(object) => self.loader.destroy_object(object),
            LoadHandle::Scene(scene) => {
                if let Err(source) = self.loader.unload_scene(scene).await {
                    self.residency.borrow_mut().abort_unload(id, scope);
                    log::error!("LoadingOrchestrator: failed to unload {}: {}", id, source);
                    return Err(LevelError::Unload {
                        level: id.clone(),
                        source,
                    });
                }
            }
        }

        self.residency.borrow_mut().unload(id, scope);
        self.registry.borrow_mut().remove(id);
        log::info!("LoadingOrchestrator: unloaded {} ({:?})", id, scope);
        Ok(UnloadOutcome::Unloaded)
    }

    /// Unload every standalone level
    pub async fn unload_standalone_all(&self) -> ResidencyReport {
        let ids: Vec<LevelId> = self
            .residency
            .borrow()
            .all_loaded(ResidencyScope::Standalone)
            .into_iter()
            .collect();
        let mut report = ResidencyReport::default();
        self.unload_batch(&ids, ResidencyScope::Standalone, &mut report).await;
        report
    }

    /// Controller of a loaded level
    pub fn controller(&self, id: &LevelId) -> Option<SharedController> {
        self.registry.borrow().get(id)
    }

    /// Ids with a live controller, sorted
    pub fn controller_ids(&self) -> Vec<LevelId> {
        self.registry.borrow().ids()
    }

    /// The level subjects are currently in, if it is still loaded
    pub fn current_level(&self) -> Option<SharedController> {
        self.current.borrow().upgrade()
    }

    /// Point the current-level reference at `controller` without owning it
    pub fn set_current(&self, controller: &SharedController) {
        *self.current.borrow_mut() = Rc::downgrade(controller);
    }

    pub fn clear_current(&self) {
        *self.current.borrow_mut() = Weak::new();
    }

    /// Deactivate the current level if it is active, and forget it
    pub fn deactivate_current(&self) {
        if let Some(controller) = self.current_level() {
            if controller.state() == LevelState::Active {
                if let Err(err) = controller.deactivate() {
                    log::error!("LoadingOrchestrator: could not deactivate {}: {}", controller.id(), err);
                }
            }
        }
        self.clear_current();
    }

    pub fn is_loaded(&self, id: &LevelId, scope: ResidencyScope) -> bool {
        self.residency.borrow().is_loaded(id, scope)
    }

    pub fn loaded_ids(&self, scope: ResidencyScope) -> BTreeSet<LevelId> {
        self.residency.borrow().all_loaded(scope)
    }

    /// Number of resident entries across both scopes
    pub fn resident_count(&self) -> usize {
        self.residency.borrow().len()
    }
}

impl fmt::Debug for LoadingOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadingOrchestrator")
            .field("strategy", &self.strategy)
            .field("levels", &self.catalog.len())
            .field("resident", &self.resident_count())
            .field("current_group", &self.current_group.borrow())
            .finish()
    }
}
