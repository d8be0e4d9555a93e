//! Level lifecycle - one controller per loaded level instance
//!
//! A controller owns the navigation registries discovered when its instance
//! was loaded, plus the subjects prepared into it. Legal transitions:
//!
//! ```text
//! Inactive --prepare--> Prepared --activate--> Active --deactivate--> Inactive
//! ```
//!
//! Anything else is logged and rejected without changing state.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use glam::Vec2;
use void_level_graph::LevelId;

use crate::error::{LevelError, LevelResult};
use crate::events::{LevelEvent, LevelEventBus};
use crate::loader::LevelLayout;
use crate::navigation::{Connection, Facing, NavigationElement, PlacementSpec, Portal, Spot, Trail};
use crate::subject::{same_subject, PlacementSubject};

/// Lifecycle state of a level instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LevelState {
    #[default]
    Inactive,
    Prepared,
    Active,
}

/// Id-keyed element list that keeps discovery order
#[derive(Debug, Clone)]
struct ElementRegistry<T> {
    entries: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Default for ElementRegistry<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> ElementRegistry<T> {
    /// Returns `false` (and keeps the existing element) on a repeated id
    fn insert(&mut self, id: &str, element: T) -> bool {
        if self.index.contains_key(id) {
            return false;
        }
        self.index.insert(id.to_string(), self.entries.len());
        self.entries.push(element);
        true
    }

    fn get(&self, id: &str) -> Option<&T> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.entries.iter_mut()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Runtime controller of one loaded level instance
///
/// Methods take `&self`; state lives in cells, and no cell borrow is held
/// while events are emitted or subject callbacks run. Subscribers and
/// subjects may therefore read the controller that is notifying them.
pub struct LevelController {
    id: LevelId,
    depth: f32,
    state: Cell<LevelState>,
    spots: ElementRegistry<Spot>,
    connections: RefCell<ElementRegistry<Connection>>,
    portals: RefCell<ElementRegistry<Portal>>,
    subjects: RefCell<Vec<Rc<dyn PlacementSubject>>>,
    events: Rc<LevelEventBus>,
}

impl LevelController {
    /// Build the navigation registries from a scanned layout
    pub fn discover(id: LevelId, layout: LevelLayout, events: Rc<LevelEventBus>) -> Self {
        let mut spots = ElementRegistry::default();
        let mut connections = ElementRegistry::default();
        let mut portals = ElementRegistry::default();

        for element in layout.elements {
            let (kind, inserted, element_id) = match element {
                NavigationElement::Spot(spot) => {
                    let element_id = spot.id.clone();
                    ("spot", spots.insert(&element_id, spot), element_id)
                }
                NavigationElement::Connection(mut connection) => {
                    connection.enabled = false;
                    let element_id = connection.id.clone();
                    ("connection", connections.insert(&element_id, connection), element_id)
                }
                NavigationElement::Portal(mut portal) => {
                    portal.enabled = false;
                    let element_id = portal.id.clone();
                    ("portal", portals.insert(&element_id, portal), element_id)
                }
            };
            if !inserted {
                log::warn!(
                    "LevelController {}: duplicate {} id '{}', keeping the first one",
                    id,
                    kind,
                    element_id
                );
            }
        }

        log::debug!(
            "LevelController {}: {} spots, {} connections, {} portals",
            id,
            spots.len(),
            connections.len(),
            portals.len()
        );

        Self {
            id,
            depth: layout.depth,
            state: Cell::new(LevelState::Inactive),
            spots,
            connections: RefCell::new(connections),
            portals: RefCell::new(portals),
            subjects: RefCell::new(Vec::new()),
            events,
        }
    }

    pub fn id(&self) -> &LevelId {
        &self.id
    }

    pub fn state(&self) -> LevelState {
        self.state.get()
    }

    /// Z depth of the level root
    pub fn depth(&self) -> f32 {
        self.depth
    }

    pub fn spot(&self, id: &str) -> Option<&Spot> {
        self.spots.get(id)
    }

    pub fn connection(&self, id: &str) -> Option<Connection> {
        self.connections.borrow().get(id).cloned()
    }

    pub fn portal(&self, id: &str) -> Option<Portal> {
        self.portals.borrow().get(id).cloned()
    }

    pub fn spots(&self) -> impl Iterator<Item = &Spot> {
        self.spots.iter()
    }

    /// Snapshot of the connections in discovery order
    pub fn connections(&self) -> Vec<Connection> {
        self.connections.borrow().iter().cloned().collect()
    }

    pub fn portals(&self) -> Vec<Portal> {
        self.portals.borrow().iter().cloned().collect()
    }

    /// Subjects prepared into this level and not yet released
    pub fn subject_count(&self) -> usize {
        self.subjects.borrow().len()
    }

    /// Dispatch to the prepare variant matching `spec`
    pub fn prepare(&self, subject: &Rc<dyn PlacementSubject>, spec: &PlacementSpec) -> LevelResult<Trail> {
        match spec {
            PlacementSpec::MainSpot => self.prepare_at_main_spot(subject),
            PlacementSpec::Spot(spot_id) => self.prepare_at_spot(subject, spot_id),
            PlacementSpec::Connection(connection) => self.prepare_via_connection(subject, connection),
            PlacementSpec::Portal(portal) => self.prepare_via_portal(subject, portal),
            PlacementSpec::Point { position, facing } => self.prepare_at_point(subject, *position, *facing),
        }
    }

    /// Place at the main spot, or any spot when no main spot exists
    pub fn prepare_at_main_spot(&self, subject: &Rc<dyn PlacementSubject>) -> LevelResult<Trail> {
        self.check_preparable()?;

        let spot = match self.spots.iter().find(|spot| spot.is_main) {
            Some(spot) => spot.clone(),
            None => match self.spots.iter().next() {
                Some(spot) => {
                    log::warn!(
                        "LevelController {}: no main spot, falling back to '{}'",
                        self.id,
                        spot.id
                    );
                    spot.clone()
                }
                None => {
                    log::error!("LevelController {}: cannot prepare, level has no spots", self.id);
                    return Err(LevelError::NoSpots(self.id.clone()));
                }
            },
        };

        Ok(self.place(subject, spot.position, spot.facing))
    }

    /// Place at a named spot
    pub fn prepare_at_spot(&self, subject: &Rc<dyn PlacementSubject>, spot_id: &str) -> LevelResult<Trail> {
        self.check_preparable()?;

        let Some(spot) = self.spots.get(spot_id).cloned() else {
            log::error!("LevelController {}: unknown spot '{}'", self.id, spot_id);
            return Err(LevelError::UnknownSpot {
                level: self.id.clone(),
                spot: spot_id.to_string(),
            });
        };

        Ok(self.place(subject, spot.position, spot.facing))
    }

    /// Place at the local end of `connection`, which belongs to the level the
    /// subject is leaving
    pub fn prepare_via_connection(
        &self,
        subject: &Rc<dyn PlacementSubject>,
        connection: &Connection,
    ) -> LevelResult<Trail> {
        self.check_preparable()?;

        if connection.target_level != self.id {
            log::warn!(
                "LevelController {}: connection '{}' targets level {}",
                self.id,
                connection.id,
                connection.target_level
            );
        }

        let Some(local) = self.connection(&connection.target_id) else {
            log::error!(
                "LevelController {}: no connection '{}' to arrive through",
                self.id,
                connection.target_id
            );
            return Err(LevelError::UnknownConnection {
                level: self.id.clone(),
                connection: connection.target_id.clone(),
            });
        };

        Ok(self.place(subject, local.spot.position, local.spot.facing))
    }

    /// Place at the local end of `portal`
    pub fn prepare_via_portal(&self, subject: &Rc<dyn PlacementSubject>, portal: &Portal) -> LevelResult<Trail> {
        self.check_preparable()?;

        if portal.target_level != self.id {
            log::warn!(
                "LevelController {}: portal '{}' targets level {}",
                self.id,
                portal.id,
                portal.target_level
            );
        }

        let Some(local) = self.portal(&portal.target_id) else {
            log::error!(
                "LevelController {}: no portal '{}' to arrive through",
                self.id,
                portal.target_id
            );
            return Err(LevelError::UnknownPortal {
                level: self.id.clone(),
                portal: portal.target_id.clone(),
            });
        };

        Ok(self.place(subject, local.spot.position, local.spot.facing))
    }

    /// Place at an explicit point
    pub fn prepare_at_point(
        &self,
        subject: &Rc<dyn PlacementSubject>,
        position: Vec2,
        facing: Facing,
    ) -> LevelResult<Trail> {
        self.check_preparable()?;
        Ok(self.place(subject, position, facing))
    }

    /// Enable navigation and notify prepared subjects
    pub fn activate(&self) -> LevelResult<()> {
        if self.state.get() != LevelState::Prepared {
            return Err(self.illegal("activate"));
        }

        self.set_navigation_enabled(true);
        let subjects = self.subjects.borrow().clone();
        for subject in &subjects {
            subject.on_level_enter();
        }
        self.state.set(LevelState::Active);

        log::info!("LevelController {}: activated", self.id);
        self.events.emit(LevelEvent::Activated { level: self.id.clone() });
        Ok(())
    }

    /// Disable navigation, notify and release subjects
    pub fn deactivate(&self) -> LevelResult<()> {
        if self.state.get() != LevelState::Active {
            return Err(self.illegal("deactivate"));
        }

        self.set_navigation_enabled(false);
        let released = std::mem::take(&mut *self.subjects.borrow_mut());
        for subject in &released {
            subject.on_level_exit();
        }
        self.state.set(LevelState::Inactive);

        log::info!("LevelController {}: deactivated", self.id);
        self.events.emit(LevelEvent::Deactivated { level: self.id.clone() });
        Ok(())
    }

    fn place(&self, subject: &Rc<dyn PlacementSubject>, point: Vec2, facing: Facing) -> Trail {
        self.events.emit(LevelEvent::PreparationStarted {
            level: self.id.clone(),
            subject: subject.name().to_string(),
            point,
        });

        subject.place_in_level(point.extend(self.depth), facing);

        let registered = self.subjects.borrow().iter().any(|s| same_subject(s, subject));
        if registered {
            log::warn!(
                "LevelController {}: subject '{}' already registered",
                self.id,
                subject.name()
            );
        } else {
            self.subjects.borrow_mut().push(subject.clone());
        }
        self.state.set(LevelState::Prepared);

        let trail = Trail::new(self.id.clone(), point, facing);
        self.events.emit(LevelEvent::Prepared {
            level: self.id.clone(),
            subject: subject.name().to_string(),
            trail: trail.clone(),
        });
        trail
    }

    fn check_preparable(&self) -> LevelResult<()> {
        if self.state.get() == LevelState::Active {
            return Err(self.illegal("prepare"));
        }
        Ok(())
    }

    fn illegal(&self, action: &'static str) -> LevelError {
        let from = self.state.get();
        log::error!("LevelController {}: cannot {} while {:?}", self.id, action, from);
        LevelError::IllegalTransition {
            level: self.id.clone(),
            from,
            action,
        }
    }

    fn set_navigation_enabled(&self, enabled: bool) {
        for connection in self.connections.borrow_mut().iter_mut() {
            connection.enabled = enabled;
        }
        for portal in self.portals.borrow_mut().iter_mut() {
            portal.enabled = enabled;
        }
    }
}

impl std::fmt::Debug for LevelController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LevelController")
            .field("id", &self.id)
            .field("state", &self.state.get())
            .field("spots", &self.spots.len())
            .field("connections", &self.connections.borrow().len())
            .field("portals", &self.portals.borrow().len())
            .field("subjects", &self.subjects.borrow().len())
            .finish()
    }
}

/// Shared controller handle
pub type SharedController = Rc<LevelController>;

/// Non-owning controller reference
pub type WeakController = Weak<LevelController>;

/// Live level instances mapped to their controllers
#[derive(Debug, Default)]
pub struct LevelRegistry {
    controllers: HashMap<LevelId, SharedController>,
}

impl LevelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a controller. The first registration for an id wins.
    pub fn register(&mut self, controller: LevelController) -> SharedController {
        let id = controller.id().clone();
        if let Some(existing) = self.controllers.get(&id) {
            log::warn!("LevelRegistry: level {} registered twice, keeping the first controller", id);
            return existing.clone();
        }
        let shared = Rc::new(controller);
        self.controllers.insert(id, shared.clone());
        shared
    }

    pub fn get(&self, id: &LevelId) -> Option<SharedController> {
        self.controllers.get(id).cloned()
    }

    pub fn remove(&mut self, id: &LevelId) -> Option<SharedController> {
        self.controllers.remove(id)
    }

    pub fn contains(&self, id: &LevelId) -> bool {
        self.controllers.contains_key(id)
    }

    pub fn ids(&self) -> Vec<LevelId> {
        let mut ids: Vec<_> = self.controllers.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn clear(&mut self) {
        self.controllers.clear();
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}
