//! Simulation loop integration tests: stepping, contact dispatch, deferred
//! destruction and the spawner, driven through a fully built world.

use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use rapier2d::prelude::{ContactManifold, Real};
use std::sync::{Arc, Mutex};

use boxdrop::components::bodykind::BodyKind;
use boxdrop::components::physicsbody::PhysicsBody;
use boxdrop::error::SimulationError;
use boxdrop::events::contact::ContactEvent;
use boxdrop::events::spawn::SpawnRequest;
use boxdrop::game;
use boxdrop::policies::RemoveOnContact;
use boxdrop::registry;
use boxdrop::resources::contactdispatcher::{
    BodyRef, ContactContext, ContactDispatcher, ContactPhase, ContactPolicy, SolverResponse,
};
use boxdrop::resources::pendingdeletions::PendingDeletions;
use boxdrop::resources::physicsworld::PhysicsWorld;
use boxdrop::resources::simulationconfig::SimulationConfig;
use boxdrop::resources::simulationphase::SimulationPhase;
use boxdrop::resources::simulationtime::SimulationTime;
use boxdrop::systems::simulation::{advance, tick};
use boxdrop::systems::spawner::on_spawn_request;

const DT: f32 = 1.0 / 30.0;
const POSE_EPSILON: f32 = 1e-3;

/// Everything a recorder policy saw from inside the engine step.
#[derive(Default)]
struct Seen {
    intents: Vec<Entity>,
    intent_phases: Vec<SimulationPhase>,
    alive_at_intent: Vec<bool>,
    ends: usize,
    pre_solves: usize,
    post_solves: usize,
    max_impulse: Real,
}

#[derive(Clone, Default)]
struct Recorder {
    seen: Arc<Mutex<Seen>>,
    remove: bool,
    pass_through: bool,
}

impl ContactPolicy for Recorder {
    fn deletion_intent(&self, ctx: &ContactContext<'_>, body: BodyRef, _other: BodyRef) {
        let mut seen = self.seen.lock().unwrap();
        seen.intents.push(body.entity);
        seen.intent_phases.push(ctx.phase());
        seen.alive_at_intent.push(ctx.is_alive(body.entity));
        if self.remove {
            ctx.flag_for_deletion(body.entity);
        }
    }

    fn end_contact(&self, _ctx: &ContactContext<'_>, _a: BodyRef, _b: BodyRef) {
        self.seen.lock().unwrap().ends += 1;
    }

    fn pre_solve(
        &self,
        _ctx: &ContactContext<'_>,
        _a: BodyRef,
        _b: BodyRef,
        _manifold: &ContactManifold,
    ) -> SolverResponse {
        self.seen.lock().unwrap().pre_solves += 1;
        if self.pass_through {
            SolverResponse::Disable
        } else {
            SolverResponse::Keep
        }
    }

    fn post_solve(&self, _ctx: &ContactContext<'_>, _a: BodyRef, _b: BodyRef, impulse: Real) {
        let mut seen = self.seen.lock().unwrap();
        seen.post_solves += 1;
        seen.max_impulse = seen.max_impulse.max(impulse);
    }
}

fn make_world(recorder: &Recorder) -> (World, Entity) {
    let mut world = game::build_world_with_policy(SimulationConfig::new(), Box::new(recorder.clone()));
    let ground = game::create_ground(&mut world).expect("ground");
    (world, ground)
}

fn run(world: &mut World, ticks: usize) -> Vec<boxdrop::systems::simulation::TickReport> {
    (0..ticks).map(|_| tick(world, DT).expect("tick")).collect()
}

#[test]
fn static_ground_alone_never_moves() {
    let recorder = Recorder::default();
    let (mut world, ground) = make_world(&recorder);

    for report in run(&mut world, 100) {
        assert!(report.contacts.is_empty());
    }

    assert_eq!(registry::body_count(&mut world), 1);
    let view = registry::body(&world, ground).unwrap();
    assert!((view.pose.position.x - 320.0).abs() < POSE_EPSILON);
    assert!((view.pose.position.y - 430.0).abs() < POSE_EPSILON);
    assert!(view.pose.angle.abs() < POSE_EPSILON);
    assert_eq!(registry::kind_of(&world, ground), Ok(BodyKind::Static));
    assert_eq!(world.resource::<SimulationTime>().tick_count, 100);
}

#[test]
fn dropped_block_settles_on_ground() {
    let recorder = Recorder::default();
    let (mut world, ground) = make_world(&recorder);
    let block = on_spawn_request(&mut world, 320.0, 300.0).unwrap();

    let reports = run(&mut world, 300);
    let begins: usize = reports.iter().map(|r| r.begin_count()).sum();
    assert!(begins >= 1);

    // ground top is 430 - 15, block half height is 10
    let view = registry::body(&world, block).unwrap();
    assert!((view.pose.position.y - 405.0).abs() < 1.0, "y = {}", view.pose.position.y);
    assert!((view.pose.position.x - 320.0).abs() < 1.0);
    assert!(view.pose.angle.abs() < 0.01);

    let handle = *world.get::<PhysicsBody>(block).unwrap();
    let (linvel, angvel) = world.resource::<PhysicsWorld>().velocity(&handle).unwrap();
    assert!(linvel.norm() < 1.0, "linvel = {linvel:?}");
    assert!(angvel.abs() < 0.05);

    let seen = recorder.seen.lock().unwrap();
    assert!(!seen.intents.is_empty());
    assert!(seen.intents.iter().all(|e| *e == block));
    assert!(seen.pre_solves > 0);
    assert!(seen.post_solves > 0);
    assert!(seen.max_impulse > 0.0);
    assert_eq!(registry::kind_of(&world, ground), Ok(BodyKind::Static));
}

#[test]
fn overlapping_blocks_begin_before_end() {
    let recorder = Recorder::default();
    let (mut world, _ground) = make_world(&recorder);
    let a = on_spawn_request(&mut world, 100.0, 100.0).unwrap();
    let b = on_spawn_request(&mut world, 110.0, 105.0).unwrap();

    let first = tick(&mut world, DT).unwrap();
    let begin_at = first
        .contacts
        .iter()
        .position(|n| n.phase == ContactPhase::Begin && n.involves_pair(a, b))
        .expect("begin contact on the first step");

    let mut all = first.contacts.clone();
    for report in run(&mut world, 60) {
        all.extend(report.contacts);
    }
    if let Some(end_at) = all
        .iter()
        .position(|n| n.phase == ContactPhase::End && n.involves_pair(a, b))
    {
        assert!(end_at > begin_at);
    }

    // one intent per dynamic participant of that begin contact
    let seen = recorder.seen.lock().unwrap();
    assert!(seen.intents.iter().filter(|e| **e == a).count() >= 1);
    assert!(seen.intents.iter().filter(|e| **e == b).count() >= 1);
    let ends = all.iter().filter(|n| n.phase == ContactPhase::End).count();
    assert_eq!(seen.ends, ends);
}

#[test]
fn intents_match_dynamic_participants_of_begin_contacts() {
    let recorder = Recorder::default();
    let (mut world, _ground) = make_world(&recorder);
    on_spawn_request(&mut world, 300.0, 390.0).unwrap();
    on_spawn_request(&mut world, 340.0, 300.0).unwrap();
    on_spawn_request(&mut world, 345.0, 250.0).unwrap();

    let mut expected = 0;
    for report in run(&mut world, 200) {
        expected += report
            .contacts
            .iter()
            .filter(|n| n.phase == ContactPhase::Begin)
            .map(|n| n.a.kind.is_dynamic() as usize + n.b.kind.is_dynamic() as usize)
            .sum::<usize>();
    }

    let seen = recorder.seen.lock().unwrap();
    assert!(expected > 0);
    assert_eq!(seen.intents.len(), expected);
}

#[test]
fn destruction_is_deferred_until_after_the_step() {
    let recorder = Recorder {
        remove: true,
        ..Recorder::default()
    };
    let (mut world, ground) = make_world(&recorder);
    let block = on_spawn_request(&mut world, 320.0, 380.0).unwrap();

    let mut destroyed_at = None;
    for (i, report) in run(&mut world, 120).into_iter().enumerate() {
        if report.destroyed.contains(&block) {
            assert!(report.begin_count() >= 1);
            destroyed_at = Some(i);
            break;
        }
    }
    assert!(destroyed_at.is_some());

    let seen = recorder.seen.lock().unwrap();
    assert!(!seen.intents.is_empty());
    assert!(seen.intent_phases.iter().all(|p| *p == SimulationPhase::Stepping));
    assert!(seen.alive_at_intent.iter().all(|alive| *alive));
    drop(seen);

    assert_eq!(*world.resource::<SimulationPhase>(), SimulationPhase::Idle);
    assert!(world.resource::<PendingDeletions>().is_empty());
    assert_eq!(
        registry::kind_of(&world, block),
        Err(SimulationError::UnknownBody(block))
    );
    assert_eq!(
        registry::destroy_body(&mut world, block),
        Err(SimulationError::UnknownBody(block))
    );
    assert_eq!(registry::kind_of(&world, ground), Ok(BodyKind::Static));
    assert_eq!(registry::body_count(&mut world), 1);
    assert_eq!(world.resource::<PhysicsWorld>().body_count(), 1);
}

#[test]
fn remove_on_contact_policy_clears_landed_blocks() {
    let mut config = SimulationConfig::new();
    config.remove_on_contact = true;
    let mut world = game::setup(config).unwrap();
    on_spawn_request(&mut world, 200.0, 350.0).unwrap();
    on_spawn_request(&mut world, 400.0, 300.0).unwrap();

    let destroyed: usize = run(&mut world, 150).iter().map(|r| r.destroyed.len()).sum();
    assert_eq!(destroyed, 2);
    assert_eq!(registry::body_count(&mut world), 1);
}

#[test]
fn explicit_policy_matches_config_switch() {
    let mut world =
        game::build_world_with_policy(SimulationConfig::new(), Box::new(RemoveOnContact));
    game::create_ground(&mut world).unwrap();
    let block = on_spawn_request(&mut world, 320.0, 390.0).unwrap();

    let destroyed: Vec<Entity> = run(&mut world, 60)
        .into_iter()
        .flat_map(|r| r.destroyed)
        .collect();
    assert_eq!(destroyed, vec![block]);
}

#[test]
fn pre_solve_disable_lets_block_fall_through() {
    let recorder = Recorder {
        pass_through: true,
        ..Recorder::default()
    };
    let (mut world, _ground) = make_world(&recorder);
    let block = on_spawn_request(&mut world, 320.0, 380.0).unwrap();

    run(&mut world, 120);

    let view = registry::body(&world, block).unwrap();
    assert!(view.pose.position.y > 480.0, "y = {}", view.pose.position.y);
    assert!(recorder.seen.lock().unwrap().pre_solves > 0);
}

#[test]
fn observer_despawn_removes_engine_body() {
    let recorder = Recorder::default();
    let (mut world, ground) = make_world(&recorder);
    let first = on_spawn_request(&mut world, 320.0, 380.0).unwrap();

    world.add_observer(move |trigger: On<ContactEvent>, mut commands: Commands| {
        let event = trigger.event();
        if event.phase == ContactPhase::Begin
            && (event.a.entity == first || event.b.entity == first)
        {
            commands.entity(first).try_despawn();
        }
    });
    world.flush();

    run(&mut world, 60);
    assert_eq!(
        registry::kind_of(&world, first),
        Err(SimulationError::UnknownBody(first))
    );
    assert_eq!(
        world.resource::<PhysicsWorld>().body_count(),
        registry::body_count(&mut world)
    );

    // a second block dropped on the same spot lands on the ground itself
    let second = on_spawn_request(&mut world, 320.0, 380.0).unwrap();
    let reports = run(&mut world, 300);
    assert!(reports.iter().any(|r| r
        .contacts
        .iter()
        .any(|n| n.phase == ContactPhase::Begin && n.involves_pair(second, ground))));
    assert!(recorder.seen.lock().unwrap().intents.contains(&second));

    let view = registry::body(&world, second).unwrap();
    assert!((view.pose.position.y - 405.0).abs() < 1.0, "y = {}", view.pose.position.y);
    assert_eq!(world.resource::<PhysicsWorld>().body_count(), 2);
}

#[test]
fn contact_events_reach_observers() {
    let recorder = Recorder::default();
    let (mut world, _ground) = make_world(&recorder);

    let begins = Arc::new(Mutex::new(0usize));
    let counter = begins.clone();
    world.add_observer(move |trigger: On<ContactEvent>| {
        if trigger.event().phase == ContactPhase::Begin {
            *counter.lock().unwrap() += 1;
        }
    });
    world.flush();

    on_spawn_request(&mut world, 320.0, 380.0).unwrap();
    let reported: usize = run(&mut world, 90).iter().map(|r| r.begin_count()).sum();

    assert!(reported >= 1);
    assert_eq!(*begins.lock().unwrap(), reported);
}

#[test]
fn spawn_request_event_creates_block() {
    let recorder = Recorder::default();
    let (mut world, _ground) = make_world(&recorder);

    world.trigger(SpawnRequest { x: 50.0, y: 60.0 });
    world.flush();

    assert_eq!(registry::body_count(&mut world), 2);
    let mut dynamic = Vec::new();
    registry::for_each_body(&mut world, |b| {
        if b.kind.is_dynamic() {
            dynamic.push(b);
        }
    });
    assert_eq!(dynamic.len(), 1);
    assert_eq!(dynamic[0].shape.width(), 20.0);
}

#[test]
fn reentrant_tick_is_rejected() {
    let recorder = Recorder::default();
    let (mut world, _ground) = make_world(&recorder);

    world.insert_resource(SimulationPhase::Stepping);
    assert_eq!(
        tick(&mut world, DT),
        Err(SimulationError::InvalidMutationWindow)
    );
}

#[test]
fn missing_dispatcher_is_a_fault_and_leaves_loop_idle() {
    let recorder = Recorder::default();
    let (mut world, _ground) = make_world(&recorder);
    world.remove_resource::<ContactDispatcher>();

    let err = tick(&mut world, DT).unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(*world.resource::<SimulationPhase>(), SimulationPhase::Idle);
}

#[test]
fn advance_runs_whole_steps_and_carries_remainder() {
    let recorder = Recorder::default();
    let (mut world, _ground) = make_world(&recorder);

    let report = advance(&mut world, 0.05, 5).unwrap();
    assert_eq!(report.ticks, 1);
    let report = advance(&mut world, 0.02, 5).unwrap();
    assert_eq!(report.ticks, 1);
    let report = advance(&mut world, 0.001, 5).unwrap();
    assert_eq!(report.ticks, 0);
    assert_eq!(world.resource::<SimulationTime>().tick_count, 2);
}

#[test]
fn advance_caps_substeps_and_drops_backlog() {
    let recorder = Recorder::default();
    let (mut world, _ground) = make_world(&recorder);

    let report = advance(&mut world, 10.0, 5).unwrap();
    assert_eq!(report.ticks, 5);
    assert_eq!(world.resource::<SimulationTime>().accumulator, 0.0);
}
