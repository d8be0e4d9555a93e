//! Level residency - which levels are loaded, and under which scope
//!
//! Entries only appear after a load reports success. In-flight markers keep a
//! second load (or unload) of the same `(id, scope)` from being issued while
//! the first one is suspended in the asset loader.

use std::collections::{BTreeSet, HashMap};

use void_level_graph::LevelId;

/// Who manages a resident level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResidencyScope {
    /// Managed by the neighbour/world/area graph policy
    Universe,
    /// Loaded and unloaded independently of the graph
    Standalone,
}

/// What kind of engine instance backs a resident level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResidencyKind {
    /// Instantiated object/prefab
    Object,
    /// Additively loaded scene
    Scene,
}

/// Opaque handle to an instantiated level object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHandle(pub u64);

/// Opaque handle to an additively loaded scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneHandle(pub u64);

/// Handle returned by a successful load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadHandle {
    Object(ObjectHandle),
    Scene(SceneHandle),
}

impl LoadHandle {
    /// Kind of instance behind the handle
    pub fn kind(&self) -> ResidencyKind {
        match self {
            Self::Object(_) => ResidencyKind::Object,
            Self::Scene(_) => ResidencyKind::Scene,
        }
    }
}

/// A loaded level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidencyEntry {
    pub id: LevelId,
    pub handle: LoadHandle,
    pub scope: ResidencyScope,
}

impl ResidencyEntry {
    pub fn kind(&self) -> ResidencyKind {
        self.handle.kind()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InFlight {
    Loading,
    Unloading,
}

type ResidencyKey = (LevelId, ResidencyScope);

/// Set of loaded level handles keyed by `(id, scope)`
#[derive(Debug, Default)]
pub struct LevelResidencySet {
    entries: HashMap<ResidencyKey, ResidencyEntry>,
    in_flight: HashMap<ResidencyKey, InFlight>,
}

impl LevelResidencySet {
    /// Create an empty residency set
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a level is loaded in `scope`
    pub fn is_loaded(&self, id: &LevelId, scope: ResidencyScope) -> bool {
        self.entries.contains_key(&(id.clone(), scope))
    }

    /// Check if a level is loaded in any scope
    pub fn is_resident_anywhere(&self, id: &LevelId) -> bool {
        self.is_loaded(id, ResidencyScope::Universe) || self.is_loaded(id, ResidencyScope::Standalone)
    }

    /// Check if a load or unload is pending for `(id, scope)`
    pub fn is_in_flight(&self, id: &LevelId, scope: ResidencyScope) -> bool {
        self.in_flight.contains_key(&(id.clone(), scope))
    }

    /// Mark a load as started. Returns `false` when the level is already
    /// loaded or an operation for the same key is already pending.
    pub fn begin_load(&mut self, id: &LevelId, scope: ResidencyScope) -> bool {
        let key = (id.clone(), scope);
        if self.entries.contains_key(&key) || self.in_flight.contains_key(&key) {
            return false;
        }
        self.in_flight.insert(key, InFlight::Loading);
        true
    }

    /// Store the entry for a load that reported success
    pub fn commit_load(&mut self, id: &LevelId, scope: ResidencyScope, handle: LoadHandle) {
        let key = (id.clone(), scope);
        if self.in_flight.get(&key) == Some(&InFlight::Loading) {
            self.in_flight.remove(&key);
        }
        if self.entries.contains_key(&key) {
            log::warn!("LevelResidencySet: {} already resident in {:?}, keeping first handle", id, scope);
            return;
        }
        self.entries.insert(
            key,
            ResidencyEntry {
                id: id.clone(),
                handle,
                scope,
            },
        );
    }

    /// Forget a failed load so it can be retried
    pub fn abort_load(&mut self, id: &LevelId, scope: ResidencyScope) {
        let key = (id.clone(), scope);
        if self.in_flight.get(&key) == Some(&InFlight::Loading) {
            self.in_flight.remove(&key);
        }
    }

    /// Mark an unload as started and return the handle to release. The entry
    /// stays until `unload` is called after the release completes.
    pub fn begin_unload(&mut self, id: &LevelId, scope: ResidencyScope) -> Option<LoadHandle> {
        let key = (id.clone(), scope);
        if self.in_flight.contains_key(&key) {
            return None;
        }
        let handle = self.entries.get(&key)?.handle;
        self.in_flight.insert(key, InFlight::Unloading);
        Some(handle)
    }

    /// Keep the entry after a failed unload
    pub fn abort_unload(&mut self, id: &LevelId, scope: ResidencyScope) {
        let key = (id.clone(), scope);
        if self.in_flight.get(&key) == Some(&InFlight::Unloading) {
            self.in_flight.remove(&key);
        }
    }

    /// Remove and return the entry's handle
    pub fn unload(&mut self, id: &LevelId, scope: ResidencyScope) -> Option<LoadHandle> {
        let key = (id.clone(), scope);
        if self.in_flight.get(&key) == Some(&InFlight::Unloading) {
            self.in_flight.remove(&key);
        }
        self.entries.remove(&key).map(|entry| entry.handle)
    }

    /// Get an entry
    pub fn entry(&self, id: &LevelId, scope: ResidencyScope) -> Option<&ResidencyEntry> {
        self.entries.get(&(id.clone(), scope))
    }

    /// All levels loaded in `scope`
    pub fn all_loaded(&self, scope: ResidencyScope) -> BTreeSet<LevelId> {
        self.entries
            .values()
            .filter(|entry| entry.scope == scope)
            .map(|entry| entry.id.clone())
            .collect()
    }

    /// Number of entries across both scopes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is loaded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
