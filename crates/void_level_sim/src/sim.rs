//! In-memory collaborators and the route runner

use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use glam::{Vec2, Vec3};

use void_level_graph::LevelId;
use void_streaming::prelude::*;
use void_streaming::{AssetResult, LoadHandle, ObjectHandle, SceneHandle};

use crate::scenario::{LevelDef, PassageDef, RouteStep, Scenario, ScenarioResult};

/// Loader that hands out sequential handles, yielding once per async call
#[derive(Debug, Default)]
pub struct MemoryLoader {
    next_handle: Cell<u64>,
    failing: HashSet<String>,
}

impl MemoryLoader {
    pub fn new(failing: HashSet<String>) -> Self {
        Self {
            next_handle: Cell::new(0),
            failing,
        }
    }

    fn allocate(&self, address: &str) -> AssetResult<u64> {
        if self.failing.contains(address) {
            return Err(AssetLoadError::InvalidKey(address.to_string()));
        }
        let handle = self.next_handle.get() + 1;
        self.next_handle.set(handle);
        Ok(handle)
    }
}

#[async_trait(?Send)]
impl AssetLoader for MemoryLoader {
    async fn load_object(&self, address: &str) -> AssetResult<ObjectHandle> {
        tokio::task::yield_now().await;
        self.allocate(address).map(ObjectHandle)
    }

    async fn load_scene(&self, key: &str) -> AssetResult<SceneHandle> {
        tokio::task::yield_now().await;
        self.allocate(key).map(SceneHandle)
    }

    async fn unload_scene(&self, handle: SceneHandle) -> AssetResult<()> {
        tokio::task::yield_now().await;
        log::debug!("MemoryLoader: released scene {:?}", handle);
        Ok(())
    }

    fn destroy_object(&self, handle: ObjectHandle) {
        log::debug!("MemoryLoader: destroyed object {:?}", handle);
    }
}

/// Scanner reporting layouts declared in the scenario
#[derive(Debug, Default)]
pub struct LayoutScanner {
    layouts: HashMap<LevelId, LevelLayout>,
}

impl LayoutScanner {
    pub fn from_levels(levels: &[LevelDef]) -> Self {
        let layouts = levels
            .iter()
            .map(|level| (level.record.id.clone(), layout_of(level)))
            .collect();
        Self { layouts }
    }
}

impl LevelInstanceScanner for LayoutScanner {
    fn scan(&self, id: &LevelId, _handle: &LoadHandle) -> LevelLayout {
        self.layouts.get(id).cloned().unwrap_or_default()
    }
}

fn layout_of(level: &LevelDef) -> LevelLayout {
    let mut layout = LevelLayout::new(level.depth);
    for spot in &level.spots {
        let mut element = Spot::new(&spot.id, Vec2::from(spot.position)).with_facing(Facing::from_sign(spot.facing));
        if spot.main {
            element = element.main();
        }
        layout = layout.with_element(element);
    }
    for passage in &level.connections {
        let (target, spot) = arrival(passage);
        layout = layout.with_element(Connection::new(&passage.id, target, &passage.target_id, spot));
    }
    for passage in &level.portals {
        let (target, spot) = arrival(passage);
        layout = layout.with_element(Portal::new(&passage.id, target, &passage.target_id, spot));
    }
    layout
}

fn arrival(passage: &PassageDef) -> (LevelId, Spot) {
    let spot = Spot::new(format!("{}_arrival", passage.id), Vec2::from(passage.arrival))
        .with_facing(Facing::from_sign(passage.facing));
    (LevelId::from(passage.target_level.as_str()), spot)
}

/// Subject that only reports where it was placed
#[derive(Debug)]
pub struct SimSubject {
    name: String,
    position: Cell<Vec3>,
}

impl SimSubject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: Cell::new(Vec3::ZERO),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position.get()
    }
}

impl PlacementSubject for SimSubject {
    fn name(&self) -> &str {
        &self.name
    }

    fn place_in_level(&self, position: Vec3, facing: Facing) {
        log::info!("{} placed at {} facing {:?}", self.name, position, facing);
        self.position.set(position);
    }

    fn on_level_enter(&self) {
        log::debug!("{} entered level", self.name);
    }

    fn on_level_exit(&self) {
        log::debug!("{} left level", self.name);
    }
}

/// Input bridge that tracks the freeze flag
#[derive(Debug, Default)]
pub struct SimInput {
    revoked: Cell<bool>,
}

impl SimInput {
    pub fn is_revoked(&self) -> bool {
        self.revoked.get()
    }
}

impl InputControl for SimInput {
    fn revoke_input(&self) {
        self.revoked.set(true);
    }

    fn restore_input(&self) {
        self.revoked.set(false);
    }
}

/// Curtain that takes `duration` to close or open
#[derive(Debug)]
pub struct Curtain {
    duration: Duration,
}

#[async_trait(?Send)]
impl TransitionEffect for Curtain {
    async fn close(&self) {
        TokioTimer.wait(self.duration).await;
    }

    async fn open(&self) {
        TokioTimer.wait(self.duration).await;
    }
}

/// Result of walking a route
#[derive(Debug, Default)]
pub struct RouteSummary {
    pub trails: Vec<Trail>,
    pub failures: Vec<String>,
    pub resident: Vec<LevelId>,
    pub final_position: Vec3,
}

impl RouteSummary {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Walk the scenario route through a fresh streaming stack
pub async fn run(scenario: &Scenario) -> ScenarioResult<RouteSummary> {
    let catalog = Rc::new(scenario.catalog()?);
    let failing = scenario
        .levels
        .iter()
        .filter(|level| level.fail_load)
        .filter_map(|level| catalog.get(&level.record.id))
        .map(|record| record.load_address.clone())
        .collect();

    let events = Rc::new(LevelEventBus::new());
    events.subscribe(|event| log::debug!("event: {:?}", event));

    let orchestrator = Rc::new(LoadingOrchestrator::new(
        catalog,
        Rc::new(MemoryLoader::new(failing)),
        Rc::new(LayoutScanner::from_levels(&scenario.levels)),
        events,
        scenario.config.strategy(),
    ));
    let input = Rc::new(SimInput::default());
    let mut coordinator = TransitionCoordinator::new(orchestrator.clone(), input.clone())
        .with_timer(Rc::new(TokioTimer), scenario.config.blend_wait());
    if scenario.fade_ms > 0 {
        coordinator = coordinator.with_effect(Rc::new(Curtain {
            duration: Duration::from_millis(scenario.fade_ms),
        }));
    }

    let hero = Rc::new(SimSubject::new(&scenario.subject));
    let subject: Rc<dyn PlacementSubject> = hero.clone();
    let mut summary = RouteSummary::default();

    for (index, step) in scenario.route.iter().enumerate() {
        let spec = match placement(&orchestrator, step) {
            Ok(spec) => spec,
            Err(reason) => {
                log::error!("step {}: {}", index, reason);
                summary.failures.push(reason);
                continue;
            }
        };

        match coordinator.transition_to(&step.level.as_str().into(), &subject, &spec).await {
            Ok(trail) => {
                log::info!("step {}: arrived in {} at {}", index, trail.level_id, trail.spawn_position);
                summary.trails.push(trail);
            }
            Err(err) => {
                log::error!("step {}: {}", index, err);
                summary.failures.push(err.to_string());
            }
        }
    }

    if input.is_revoked() {
        log::warn!("route ended with input still revoked");
    }
    summary.resident = orchestrator.controller_ids();
    summary.final_position = hero.position();
    Ok(summary)
}

/// Translate a route step into a placement request
fn placement(orchestrator: &LoadingOrchestrator, step: &RouteStep) -> Result<PlacementSpec, String> {
    if let Some(via) = &step.via {
        let current = orchestrator
            .current_level()
            .ok_or_else(|| format!("no current level to leave through connection '{}'", via))?;
        return current
            .connection(via)
            .map(PlacementSpec::Connection)
            .ok_or_else(|| format!("level {} has no connection '{}'", current.id(), via));
    }
    if let Some(portal) = &step.portal {
        let current = orchestrator
            .current_level()
            .ok_or_else(|| format!("no current level to leave through portal '{}'", portal))?;
        return current
            .portal(portal)
            .map(PlacementSpec::Portal)
            .ok_or_else(|| format!("level {} has no portal '{}'", current.id(), portal));
    }
    if let Some(spot) = &step.spot {
        return Ok(PlacementSpec::Spot(spot.clone()));
    }
    if let Some(point) = step.point {
        return Ok(PlacementSpec::Point {
            position: Vec2::from(point),
            facing: Facing::Neutral,
        });
    }
    Ok(PlacementSpec::MainSpot)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROUTE: &str = r#"
        [streaming]
        strategy = "neighbours"
        depth = 1

        [[levels]]
        id = "meadow"
        world_id = "overworld"
        neighbor_ids = ["river"]
        depth = -1.0
        spots = [{ id = "start", main = true, position = [2.0, 1.0] }]
        connections = [{ id = "east", target_level = "river", target_id = "west", arrival = [15.0, 1.0], facing = -1 }]

        [[levels]]
        id = "river"
        world_id = "overworld"
        neighbor_ids = ["meadow", "falls"]
        spots = [{ id = "bank", position = [5.0, 0.0] }]
        connections = [{ id = "west", target_level = "meadow", target_id = "east", arrival = [0.5, 1.0], facing = 1 }]

        [[levels]]
        id = "falls"
        world_id = "overworld"
        neighbor_ids = ["river"]
        fail_load = true

        [[route]]
        level = "meadow"

        [[route]]
        level = "river"
        via = "east"

        [[route]]
        level = "meadow"
        via = "west"
    "#;

    #[tokio::test]
    async fn test_route_through_connections() {
        let scenario = Scenario::from_toml_str(ROUTE).unwrap();

        let summary = run(&scenario).await.unwrap();

        assert!(summary.is_clean(), "failures: {:?}", summary.failures);
        assert_eq!(summary.trails.len(), 3);
        assert_eq!(summary.trails[0].spawn_position, Vec2::new(2.0, 1.0));
        assert_eq!(summary.trails[1].level_id, LevelId::from("river"));
        assert_eq!(summary.trails[1].spawn_position, Vec2::new(0.5, 1.0));
        assert_eq!(summary.trails[1].facing, Facing::Right);
        assert_eq!(summary.trails[2].spawn_position, Vec2::new(15.0, 1.0));
        assert_eq!(summary.resident, vec![LevelId::from("meadow"), LevelId::from("river")]);
        assert_eq!(summary.final_position, Vec3::new(15.0, 1.0, -1.0));
    }

    #[tokio::test]
    async fn test_bad_step_is_reported() {
        let mut scenario = Scenario::from_toml_str(ROUTE).unwrap();
        scenario.route[2].via = Some("north".to_string());

        let summary = run(&scenario).await.unwrap();

        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.trails.len(), 2);
    }

    #[test]
    fn test_layout_from_definition() {
        let scenario = Scenario::from_toml_str(ROUTE).unwrap();
        let layout = layout_of(&scenario.levels[0]);

        assert_eq!(layout.depth, -1.0);
        assert_eq!(layout.elements.len(), 2);
        assert_eq!(layout.elements[1].id(), "east");
    }
}
