//! Physics engine state.
//!
//! [`PhysicsWorld`] owns every rapier structure needed to step the world and
//! keeps the mapping from engine colliders back to body entities. Positions
//! cross this boundary in world pixels; the engine itself works in meters.
//!
//! During [`PhysicsWorld::step`] rapier's event handler and physics hooks are
//! bridged to a [`ContactSink`], which only ever sees entities.

use bevy_ecs::prelude::*;
use log::trace;
use rapier2d::prelude::*;
use rustc_hash::FxHashMap;
use std::num::NonZeroUsize;

use crate::components::bodykind::BodyKind;
use crate::components::physicsbody::PhysicsBody;
use crate::components::pose::Pose;
use crate::resources::contactdispatcher::SolverResponse;
use crate::resources::simulationconfig::PhysicsConfig;

/// Receiver of contact notifications, already translated to entities.
///
/// Called synchronously from inside the engine step, on the stepping thread.
pub trait ContactSink: Sync {
    fn begin_contact(&self, a: Entity, b: Entity);
    fn end_contact(&self, a: Entity, b: Entity);
    fn pre_solve(&self, a: Entity, b: Entity, manifold: &ContactManifold) -> SolverResponse;
    fn post_solve(&self, a: Entity, b: Entity, impulse: Real);
}

#[derive(Resource)]
pub struct PhysicsWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    owners: FxHashMap<ColliderHandle, Entity>,
    pixels_per_meter: Real,
}

impl PhysicsWorld {
    pub fn new(config: &PhysicsConfig) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = config.timestep();
        integration_parameters.num_solver_iterations =
            NonZeroUsize::new(config.velocity_iterations).unwrap_or(NonZeroUsize::MIN);
        integration_parameters.num_internal_stabilization_iterations = config.position_iterations;

        Self {
            gravity: Vector::new(config.gravity.0, config.gravity.1),
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            owners: FxHashMap::default(),
            pixels_per_meter: config.pixels_per_meter,
        }
    }

    /// Set the length of the next steps in seconds.
    pub fn set_timestep(&mut self, dt: Real) {
        self.integration_parameters.dt = dt;
    }

    pub fn timestep(&self) -> Real {
        self.integration_parameters.dt
    }

    /// Create the engine side of a body: a rigid body centered on `(x, y)`
    /// with one box collider of the given full size. All values in pixels.
    ///
    /// The collider reports begin/end events and contact forces, and asks for
    /// the solver-contact hook, so every dispatcher callback can fire for it.
    pub fn insert_body(
        &mut self,
        owner: Entity,
        kind: BodyKind,
        x: Real,
        y: Real,
        width: Real,
        height: Real,
    ) -> PhysicsBody {
        let builder = match kind {
            BodyKind::Static => RigidBodyBuilder::fixed(),
            BodyKind::Dynamic => RigidBodyBuilder::dynamic(),
        };
        let rigid_body = builder
            .translation(Vector::new(self.to_meters(x), self.to_meters(y)))
            .build();
        let body = self.bodies.insert(rigid_body);

        let collider = ColliderBuilder::cuboid(
            self.to_meters(width * 0.5),
            self.to_meters(height * 0.5),
        )
        .density(1.0)
        .active_events(ActiveEvents::COLLISION_EVENTS | ActiveEvents::CONTACT_FORCE_EVENTS)
        .active_hooks(ActiveHooks::MODIFY_SOLVER_CONTACTS)
        .contact_force_event_threshold(0.0)
        .build();
        let collider = self
            .colliders
            .insert_with_parent(collider, body, &mut self.bodies);

        self.owners.insert(collider, owner);
        PhysicsBody { body, collider }
    }

    /// Remove a body and its collider. Returns false when the engine no
    /// longer knows the body.
    pub fn remove_body(&mut self, handle: &PhysicsBody) -> bool {
        self.owners.remove(&handle.collider);
        self.bodies
            .remove(
                handle.body,
                &mut self.island_manager,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }

    /// Current pose of a body in pixels and radians.
    pub fn pose(&self, handle: &PhysicsBody) -> Option<Pose> {
        let body = self.bodies.get(handle.body)?;
        let translation = body.translation();
        Some(Pose::new(
            self.to_pixels(translation.x),
            self.to_pixels(translation.y),
            body.rotation().angle(),
        ))
    }

    /// Linear velocity in pixels per second and angular velocity in radians
    /// per second.
    pub fn velocity(&self, handle: &PhysicsBody) -> Option<(Vector<Real>, Real)> {
        let body = self.bodies.get(handle.body)?;
        Some((body.linvel() * self.pixels_per_meter, body.angvel()))
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Entity owning the given collider, if it is still alive.
    pub fn owner(&self, collider: ColliderHandle) -> Option<Entity> {
        self.owners.get(&collider).copied()
    }

    /// Advance the engine by one timestep, forwarding every contact
    /// notification to `sink` before returning.
    pub fn step(&mut self, sink: &dyn ContactSink) {
        let bridge = EngineBridge {
            owners: &self.owners,
            sink,
        };
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &bridge,
            &bridge,
        );
    }

    fn to_meters(&self, pixels: Real) -> Real {
        pixels / self.pixels_per_meter
    }

    fn to_pixels(&self, meters: Real) -> Real {
        meters * self.pixels_per_meter
    }
}

/// Adapter installed in rapier's listener slots for one step.
struct EngineBridge<'a> {
    owners: &'a FxHashMap<ColliderHandle, Entity>,
    sink: &'a dyn ContactSink,
}

impl EngineBridge<'_> {
    fn pair(&self, c1: ColliderHandle, c2: ColliderHandle) -> Option<(Entity, Entity)> {
        match (self.owners.get(&c1), self.owners.get(&c2)) {
            (Some(a), Some(b)) => Some((*a, *b)),
            _ => {
                // Happens for the stop event of a pair whose body was destroyed.
                trace!("Contact between {:?} and {:?} has no live owner", c1, c2);
                None
            }
        }
    }
}

impl EventHandler for EngineBridge<'_> {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        let Some((a, b)) = self.pair(event.collider1(), event.collider2()) else {
            return;
        };
        if event.started() {
            self.sink.begin_contact(a, b);
        } else {
            self.sink.end_contact(a, b);
        }
    }

    fn handle_contact_force_event(
        &self,
        dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        contact_pair: &ContactPair,
        total_force_magnitude: Real,
    ) {
        if let Some((a, b)) = self.pair(contact_pair.collider1, contact_pair.collider2) {
            self.sink.post_solve(a, b, total_force_magnitude * dt);
        }
    }
}

impl PhysicsHooks for EngineBridge<'_> {
    fn modify_solver_contacts(&self, context: &mut ContactModificationContext) {
        let Some((a, b)) = self.pair(context.collider1, context.collider2) else {
            return;
        };
        if self.sink.pre_solve(a, b, context.manifold) == SolverResponse::Disable {
            context.solver_contacts.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        begins: Mutex<Vec<(Entity, Entity)>>,
    }

    impl ContactSink for Recorder {
        fn begin_contact(&self, a: Entity, b: Entity) {
            self.begins.lock().unwrap().push((a, b));
        }
        fn end_contact(&self, _a: Entity, _b: Entity) {}
        fn pre_solve(&self, _a: Entity, _b: Entity, _m: &ContactManifold) -> SolverResponse {
            SolverResponse::Keep
        }
        fn post_solve(&self, _a: Entity, _b: Entity, _impulse: Real) {}
    }

    #[test]
    fn insert_converts_pixels_to_meters_and_back() {
        let mut world = World::new();
        let owner = world.spawn_empty().id();
        let mut physics = PhysicsWorld::new(&PhysicsConfig::default());

        let handle = physics.insert_body(owner, BodyKind::Static, 320.0, 430.0, 640.0, 30.0);
        let pose = physics.pose(&handle).unwrap();
        assert!((pose.position.x - 320.0).abs() < 1e-3);
        assert!((pose.position.y - 430.0).abs() < 1e-3);
        assert_eq!(physics.owner(handle.collider), Some(owner));
        assert_eq!(physics.body_count(), 1);
    }

    #[test]
    fn remove_is_reported_once() {
        let mut world = World::new();
        let owner = world.spawn_empty().id();
        let mut physics = PhysicsWorld::new(&PhysicsConfig::default());

        let handle = physics.insert_body(owner, BodyKind::Dynamic, 0.0, 0.0, 20.0, 20.0);
        assert!(physics.remove_body(&handle));
        assert!(!physics.remove_body(&handle));
        assert_eq!(physics.owner(handle.collider), None);
        assert!(physics.pose(&handle).is_none());
    }

    #[test]
    fn overlapping_bodies_begin_contact_on_first_step() {
        let mut world = World::new();
        let a = world.spawn_empty().id();
        let b = world.spawn_empty().id();
        let mut physics = PhysicsWorld::new(&PhysicsConfig::default());
        physics.insert_body(a, BodyKind::Dynamic, 100.0, 100.0, 20.0, 20.0);
        physics.insert_body(b, BodyKind::Dynamic, 105.0, 105.0, 20.0, 20.0);

        let recorder = Recorder::default();
        physics.step(&recorder);

        let begins = recorder.begins.lock().unwrap();
        assert_eq!(begins.len(), 1);
        let (x, y) = begins[0];
        assert!((x == a && y == b) || (x == b && y == a));
    }

    #[test]
    fn dynamic_body_falls_under_gravity() {
        let mut world = World::new();
        let owner = world.spawn_empty().id();
        let mut physics = PhysicsWorld::new(&PhysicsConfig::default());
        let handle = physics.insert_body(owner, BodyKind::Dynamic, 100.0, 100.0, 20.0, 20.0);

        let recorder = Recorder::default();
        for _ in 0..10 {
            physics.step(&recorder);
        }
        let pose = physics.pose(&handle).unwrap();
        assert!(pose.position.y > 100.0);
        assert!((pose.position.x - 100.0).abs() < 1e-3);

        // velocity is reported in pixels per second, downward
        let (linvel, angvel) = physics.velocity(&handle).unwrap();
        assert!(linvel.y > 9.81 * 40.0 * 0.2);
        assert!(linvel.x.abs() < 1e-3);
        assert!(angvel.abs() < 1e-3);
    }
}
