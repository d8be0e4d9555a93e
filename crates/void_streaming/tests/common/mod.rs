//! Recording collaborators shared by the integration tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use glam::{Vec2, Vec3};
use parking_lot::Mutex;

use void_streaming::prelude::*;
use void_streaming::{AssetResult, LoadHandle, ObjectHandle, SceneHandle};

/// Shared, ordered log of collaborator calls
#[derive(Default)]
pub struct Journal {
    entries: Mutex<Vec<String>>,
}

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.entries.lock().iter().filter(|e| e.starts_with(prefix)).count()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries.lock().iter().position(|e| e == entry)
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// Asset loader that yields once per call and records every request
pub struct MockLoader {
    journal: Rc<Journal>,
    next_handle: Mutex<u64>,
    addresses: Mutex<HashMap<u64, String>>,
    failing_loads: Mutex<HashSet<String>>,
    failing_unloads: Mutex<HashSet<String>>,
}

impl MockLoader {
    pub fn new(journal: Rc<Journal>) -> Self {
        Self {
            journal,
            next_handle: Mutex::new(0),
            addresses: Mutex::new(HashMap::new()),
            failing_loads: Mutex::new(HashSet::new()),
            failing_unloads: Mutex::new(HashSet::new()),
        }
    }

    pub fn fail_load(&self, address: &str) {
        self.failing_loads.lock().insert(address.to_string());
    }

    pub fn fail_unload(&self, address: &str) {
        self.failing_unloads.lock().insert(address.to_string());
    }

    pub fn heal(&self) {
        self.failing_loads.lock().clear();
        self.failing_unloads.lock().clear();
    }

    fn allocate(&self, address: &str) -> u64 {
        let mut next = self.next_handle.lock();
        *next += 1;
        self.addresses.lock().insert(*next, address.to_string());
        *next
    }

    fn address_of(&self, handle: u64) -> String {
        self.addresses.lock().get(&handle).cloned().unwrap_or_default()
    }
}

#[async_trait(?Send)]
impl AssetLoader for MockLoader {
    async fn load_object(&self, address: &str) -> AssetResult<ObjectHandle> {
        self.journal.push(format!("load {}", address));
        tokio::task::yield_now().await;
        if self.failing_loads.lock().contains(address) {
            return Err(AssetLoadError::InvalidKey(address.to_string()));
        }
        Ok(ObjectHandle(self.allocate(address)))
    }

    async fn load_scene(&self, key: &str) -> AssetResult<SceneHandle> {
        self.journal.push(format!("load {}", key));
        tokio::task::yield_now().await;
        if self.failing_loads.lock().contains(key) {
            return Err(AssetLoadError::OperationFailed(key.to_string()));
        }
        Ok(SceneHandle(self.allocate(key)))
    }

    async fn unload_scene(&self, handle: SceneHandle) -> AssetResult<()> {
        let address = self.address_of(handle.0);
        self.journal.push(format!("unload {}", address));
        tokio::task::yield_now().await;
        if self.failing_unloads.lock().contains(&address) {
            return Err(AssetLoadError::Faulted(address));
        }
        Ok(())
    }

    fn destroy_object(&self, handle: ObjectHandle) {
        let address = self.address_of(handle.0);
        self.journal.push(format!("unload {}", address));
    }
}

/// Scanner returning canned layouts; unknown levels get a single main spot
#[derive(Default)]
pub struct MockScanner {
    layouts: Mutex<HashMap<LevelId, LevelLayout>>,
}

impl MockScanner {
    pub fn with_layout(self, id: &str, layout: LevelLayout) -> Self {
        self.layouts.lock().insert(id.into(), layout);
        self
    }
}

impl LevelInstanceScanner for MockScanner {
    fn scan(&self, id: &LevelId, _handle: &LoadHandle) -> LevelLayout {
        self.layouts
            .lock()
            .get(id)
            .cloned()
            .unwrap_or_else(|| LevelLayout::new(0.0).with_element(Spot::new("main", Vec2::ZERO).main()))
    }
}

/// Subject recording placements and enter/exit notifications
pub struct MockSubject {
    name: String,
    journal: Rc<Journal>,
    pub last_position: Mutex<Option<(Vec3, Facing)>>,
}

impl MockSubject {
    pub fn new(name: &str, journal: Rc<Journal>) -> Self {
        Self {
            name: name.to_string(),
            journal,
            last_position: Mutex::new(None),
        }
    }
}

impl PlacementSubject for MockSubject {
    fn name(&self) -> &str {
        &self.name
    }

    fn place_in_level(&self, position: Vec3, facing: Facing) {
        self.journal.push(format!("place {}", self.name));
        *self.last_position.lock() = Some((position, facing));
    }

    fn on_level_enter(&self) {
        self.journal.push(format!("enter {}", self.name));
    }

    fn on_level_exit(&self) {
        self.journal.push(format!("exit {}", self.name));
    }
}

/// Input bridge tracking whether input is currently revoked
pub struct MockInput {
    journal: Rc<Journal>,
    pub revoked: Mutex<bool>,
}

impl MockInput {
    pub fn new(journal: Rc<Journal>) -> Self {
        Self {
            journal,
            revoked: Mutex::new(false),
        }
    }

    pub fn is_revoked(&self) -> bool {
        *self.revoked.lock()
    }
}

impl InputControl for MockInput {
    fn revoke_input(&self) {
        self.journal.push("revoke");
        *self.revoked.lock() = true;
    }

    fn restore_input(&self) {
        self.journal.push("restore");
        *self.revoked.lock() = false;
    }
}

/// Curtain effect that yields on both edges
pub struct MockEffect {
    name: String,
    journal: Rc<Journal>,
}

impl MockEffect {
    pub fn new(name: &str, journal: Rc<Journal>) -> Self {
        Self {
            name: name.to_string(),
            journal,
        }
    }
}

#[async_trait(?Send)]
impl TransitionEffect for MockEffect {
    async fn close(&self) {
        tokio::task::yield_now().await;
        self.journal.push(format!("close {}", self.name));
    }

    async fn open(&self) {
        tokio::task::yield_now().await;
        self.journal.push(format!("open {}", self.name));
    }
}

/// Timer that records the requested wait without sleeping
pub struct MockTimer {
    journal: Rc<Journal>,
}

impl MockTimer {
    pub fn new(journal: Rc<Journal>) -> Self {
        Self { journal }
    }
}

#[async_trait(?Send)]
impl Timer for MockTimer {
    async fn wait(&self, duration: Duration) {
        self.journal.push(format!("wait {}", duration.as_millis()));
        tokio::task::yield_now().await;
    }
}

/// Five levels in a row: a <-> b <-> c <-> d <-> e, all in world "w"
pub fn chain_catalog() -> LevelCatalog {
    LevelCatalog::new(vec![
        LevelRecord::new("a", "w").with_neighbor("b"),
        LevelRecord::new("b", "w").with_neighbors(["a", "c"]),
        LevelRecord::new("c", "w").with_neighbors(["b", "d"]),
        LevelRecord::new("d", "w").with_neighbors(["c", "e"]),
        LevelRecord::new("e", "w").with_neighbor("d"),
    ])
}

/// Everything a test needs to drive an orchestrator
pub struct Harness {
    pub journal: Rc<Journal>,
    pub loader: Rc<MockLoader>,
    pub events: Rc<LevelEventBus>,
    pub orchestrator: Rc<LoadingOrchestrator>,
}

impl Harness {
    pub fn new(catalog: LevelCatalog, strategy: Strategy) -> Self {
        Self::with_scanner(catalog, strategy, MockScanner::default())
    }

    pub fn with_scanner(catalog: LevelCatalog, strategy: Strategy, scanner: MockScanner) -> Self {
        let journal = Rc::new(Journal::default());
        let loader = Rc::new(MockLoader::new(journal.clone()));
        let events = Rc::new(LevelEventBus::new());
        let orchestrator = Rc::new(LoadingOrchestrator::new(
            Rc::new(catalog),
            loader.clone(),
            Rc::new(scanner),
            events.clone(),
            strategy,
        ));
        Self {
            journal,
            loader,
            events,
            orchestrator,
        }
    }

    pub fn universe(&self) -> Vec<String> {
        self.orchestrator
            .loaded_ids(ResidencyScope::Universe)
            .into_iter()
            .map(|id| id.to_string())
            .collect()
    }
}
