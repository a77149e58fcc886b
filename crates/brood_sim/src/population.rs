//! # Population Update Pipeline
//!
//! One frame of culling and spawning:
//!
//! ```text
//! ┌─ plan (read-only, concurrent) ─────────────────────────────┐
//! │  cull pass:  tagged population → doomed ids                 │
//! │  spawn pass: spawners → template groups + placements        │
//! └──────────────────────────── join ──────────────────────────┘
//!   apply deletions    (doomed ids, in plan order)
//!   apply spawns       (one contiguous instance run per group)
//!   write positions    (parallel, disjoint slots)
//! ```
//!
//! Every random draw is keyed by a query rank and the frame key, so the
//! plan is a pure function of the world and the frame.

use brood_core::{
    run_pair, Access, Component, ComponentSet, EcsError, EntityId, FixedList, Pass, PopulationTag,
    Position, RandomSource, SpawnRequest, Tag, TemplateId, World,
};
use rayon::prelude::*;

use crate::config::SimConfig;
use crate::error::{SimError, SimResult};

/// Slots per parallel chunk in the position write.
const POSITION_CHUNK: usize = 4096;

/// Entities subject to culling.
const POPULATION: ComponentSet = ComponentSet::of(&[PopulationTag::ID]);

/// Entities that spawn.
const SPAWNERS: ComponentSet = ComponentSet::of(&[SpawnRequest::ID, Position::ID]);

/// Adjacent spawners sharing a template, merged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnGroup {
    /// Template to instantiate.
    pub template: TemplateId,
    /// Instances of the group.
    pub count: usize,
}

/// Output of the spawn pass.
#[derive(Clone, Debug, Default)]
pub struct SpawnPlan {
    /// Groups in discovery order.
    pub groups: Vec<SpawnGroup>,
    /// One placement per instance, group after group.
    pub positions: Vec<Position>,
}

impl SpawnPlan {
    /// Total instances across all groups.
    #[must_use]
    pub fn total(&self) -> usize {
        self.groups.iter().map(|g| g.count).sum()
    }
}

/// Both halves of a frame's plan.
#[derive(Debug)]
pub struct PopulationPlan {
    /// Population members to destroy.
    pub doomed: FixedList<EntityId>,
    /// Instances to create.
    pub spawns: SpawnPlan,
}

/// Counts from one pipeline run.
///
/// `population_after == population_before - doomed + spawned`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PopulationReport {
    /// Alive entities before deletions.
    pub population_before: usize,
    /// Entities culled.
    pub doomed: usize,
    /// Entities instantiated.
    pub spawned: usize,
    /// Alive entities after spawning.
    pub population_after: usize,
}

/// Culls and spawns.
#[derive(Clone, Copy, Debug)]
pub struct PopulationPipeline {
    source: RandomSource,
    threshold: u32,
    extent: f32,
}

impl PopulationPipeline {
    /// Creates the pipeline from a validated configuration.
    #[must_use]
    pub fn new(config: &SimConfig) -> Self {
        Self {
            source: RandomSource::new(config.seed),
            threshold: config.cull_threshold(),
            extent: config.spawn_extent,
        }
    }

    /// Plans, joins, then applies one frame.
    ///
    /// # Errors
    ///
    /// Configuration errors from planning (no mutation has happened), or
    /// store errors from applying.
    pub fn run(&self, world: &mut World, frame_key: u32) -> SimResult<PopulationReport> {
        let plan = self.plan(world, frame_key)?;
        self.apply(world, plan)
    }

    /// Runs the cull and spawn passes concurrently over a shared world.
    ///
    /// # Errors
    ///
    /// [`SimError::UnresolvedTemplate`] if any spawner names an unregistered
    /// template, or a bounds error if the plan cannot fit the store.
    pub fn plan(&self, world: &World, frame_key: u32) -> SimResult<PopulationPlan> {
        let cull = Pass::new("plan_culls", Access::read(&[PopulationTag::ID]), || {
            self.plan_culls(world, frame_key)
        });
        let spawn = Pass::new(
            "plan_spawns",
            Access::read(&[SpawnRequest::ID, Position::ID]),
            || self.plan_spawns(world, frame_key),
        );

        let (doomed, spawns) = run_pair(cull, spawn);
        Ok(PopulationPlan {
            doomed: doomed?,
            spawns: spawns?,
        })
    }

    /// Decides, per population member, whether it is culled this frame.
    ///
    /// # Errors
    ///
    /// A bounds error if the doomed list overflows the population count.
    pub fn plan_culls(&self, world: &World, frame_key: u32) -> SimResult<FixedList<EntityId>> {
        let population: Vec<EntityId> = world.query(POPULATION).collect();

        let culled: Vec<EntityId> = population
            .par_iter()
            .enumerate()
            .filter(|&(rank, _)| self.source.stream(rank, frame_key).next_u32() < self.threshold)
            .map(|(_, &id)| id)
            .collect();

        let mut doomed = FixedList::with_capacity(population.len());
        doomed.try_extend(culled)?;

        tracing::trace!(
            population = population.len(),
            doomed = doomed.len(),
            "cull plan"
        );
        Ok(doomed)
    }

    /// Groups spawners and generates one placement per instance.
    ///
    /// # Errors
    ///
    /// [`SimError::UnresolvedTemplate`] for an unregistered template, or
    /// `CapacityExhausted` if the requested instances exceed the store's
    /// capacity. Free slots are checked again when the plan is applied.
    pub fn plan_spawns(&self, world: &World, frame_key: u32) -> SimResult<SpawnPlan> {
        let requests = world.column::<SpawnRequest>();
        let origins = world.column::<Position>();

        let spawners: Vec<(SpawnRequest, Position)> = world
            .query(SPAWNERS)
            .map(|id| (requests[id.slot()], origins[id.slot()]))
            .collect();

        let mut groups: Vec<SpawnGroup> = Vec::new();
        for (id, (request, _)) in world.query(SPAWNERS).zip(&spawners) {
            if !world.templates().contains(request.template) {
                return Err(SimError::UnresolvedTemplate {
                    spawner: id,
                    template: request.template,
                });
            }
            let count = request.count_per_frame as usize;
            match groups.last_mut() {
                Some(group) if group.template == request.template => group.count += count,
                _ => groups.push(SpawnGroup {
                    template: request.template,
                    count,
                }),
            }
        }

        let total: usize = groups.iter().map(|g| g.count).sum();
        if total > world.capacity() {
            return Err(EcsError::CapacityExhausted {
                capacity: world.capacity(),
            }
            .into());
        }

        let extent = self.extent;
        let positions: Vec<Position> = spawners
            .par_iter()
            .enumerate()
            .flat_map_iter(|(rank, &(request, origin))| {
                let mut stream = self.source.stream(rank, frame_key);
                (0..request.count_per_frame).map(move |_| {
                    let [dx, dz] = stream.next_offset(extent);
                    Position::on_plane(origin.x + dx, origin.z + dz)
                })
            })
            .collect();

        if positions.len() != total {
            return Err(EcsError::LengthMismatch {
                expected: total,
                actual: positions.len(),
            }
            .into());
        }

        tracing::trace!(
            spawners = spawners.len(),
            groups = groups.len(),
            instances = total,
            "spawn plan"
        );
        Ok(SpawnPlan { groups, positions })
    }

    /// Applies a plan: deletions, then instantiation, then placement.
    ///
    /// The plan is checked against the store first: stale doomed ids, a
    /// placement count that differs from the instance count, or more
    /// instances than the slots free after deletions all fail the frame
    /// before anything is destroyed or created.
    ///
    /// # Errors
    ///
    /// Store errors (stale doomed id, unknown template, capacity, length
    /// mismatch).
    pub fn apply(&self, world: &mut World, plan: PopulationPlan) -> SimResult<PopulationReport> {
        let population_before = world.alive_count();
        let PopulationPlan { doomed, spawns } = plan;

        let total = spawns.total();
        if spawns.positions.len() != total {
            return Err(EcsError::LengthMismatch {
                expected: total,
                actual: spawns.positions.len(),
            }
            .into());
        }
        if total > world.free_count() + doomed.len() {
            return Err(EcsError::CapacityExhausted {
                capacity: world.capacity(),
            }
            .into());
        }

        let templates = world.templates();
        if let Some(group) = spawns.groups.iter().find(|g| !templates.contains(g.template)) {
            return Err(EcsError::UnknownTemplate(group.template).into());
        }

        let destroyed = world.despawn_batch(doomed.as_slice())?;

        let SpawnPlan { groups, positions } = spawns;
        let mut instances = FixedList::with_capacity(positions.len());
        for group in &groups {
            let run = instances.reserve_run(group.count, EntityId::NULL)?;
            world.instantiate(group.template, run)?;
        }

        write_positions(world, instances.as_slice(), &positions);

        let report = PopulationReport {
            population_before,
            doomed: destroyed,
            spawned: instances.len(),
            population_after: world.alive_count(),
        };
        tracing::debug!(
            before = report.population_before,
            doomed = report.doomed,
            spawned = report.spawned,
            after = report.population_after,
            "population updated"
        );
        Ok(report)
    }
}

/// Writes `positions[i]` to `instances[i]` in parallel.
///
/// The Position column is split into chunks; each chunk only touches the
/// sorted assignments falling inside it, so writes never alias.
fn write_positions(world: &mut World, instances: &[EntityId], positions: &[Position]) {
    let mut assignments: Vec<(usize, Position)> = instances
        .iter()
        .zip(positions)
        .map(|(id, &position)| (id.slot(), position))
        .collect();
    assignments.par_sort_unstable_by_key(|&(slot, _)| slot);

    let (Some(&(lo, _)), Some(&(hi, _))) = (assignments.first(), assignments.last()) else {
        return;
    };

    let column = &mut world.column_mut::<Position>()[lo..=hi];
    column
        .par_chunks_mut(POSITION_CHUNK)
        .enumerate()
        .for_each(|(chunk_index, chunk)| {
            let base = lo + chunk_index * POSITION_CHUNK;
            let start = assignments.partition_point(|&(slot, _)| slot < base);
            let end = assignments.partition_point(|&(slot, _)| slot < base + chunk.len());
            for &(slot, position) in &assignments[start..end] {
                chunk[slot - base] = position;
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use brood_core::Blueprint;

    fn config(seed: u64) -> SimConfig {
        SimConfig {
            seed,
            workers: 1,
            capacity: 4096,
            ..SimConfig::default()
        }
    }

    fn spawner(world: &mut World, at: Position, template: TemplateId, count: u32) -> EntityId {
        let id = world.spawn().unwrap();
        world.insert(id, at).unwrap();
        world.attach_spawn_request(id, template, count).unwrap();
        id
    }

    #[test]
    fn test_adjacent_groups_merge() {
        let mut world = World::new(64);
        let a = world.register_template(Blueprint::default().with_population());
        let b = world.register_template(Blueprint::default());
        spawner(&mut world, Position::default(), a, 2);
        spawner(&mut world, Position::default(), a, 3);
        spawner(&mut world, Position::default(), b, 1);
        spawner(&mut world, Position::default(), a, 4);

        let plan = PopulationPipeline::new(&config(1))
            .plan_spawns(&world, 10)
            .unwrap();
        assert_eq!(
            plan.groups,
            vec![
                SpawnGroup { template: a, count: 5 },
                SpawnGroup { template: b, count: 1 },
                SpawnGroup { template: a, count: 4 },
            ]
        );
        assert_eq!(plan.positions.len(), 10);
        assert_eq!(plan.total(), 10);
    }

    #[test]
    fn test_placements_stay_in_extent() {
        let mut world = World::new(256);
        let subject = world.register_template(Blueprint::default());
        let origin = Position::new(50.0, 7.0, -20.0);
        spawner(&mut world, origin, subject, 200);

        let plan = PopulationPipeline::new(&config(3))
            .plan_spawns(&world, 0)
            .unwrap();
        for p in &plan.positions {
            assert_eq!(p.y, 0.0);
            assert!((p.x - origin.x).abs() <= 100.0);
            assert!((p.z - origin.z).abs() <= 100.0);
        }
    }

    #[test]
    fn test_unresolved_template_rejected_before_mutation() {
        let mut world = World::new(16);
        let bad = spawner(&mut world, Position::default(), TemplateId(5), 1);
        let alive = world.alive_count();

        let err = PopulationPipeline::new(&config(0))
            .run(&mut world, 3)
            .unwrap_err();
        assert!(matches!(
            err,
            SimError::UnresolvedTemplate { spawner, template: TemplateId(5) } if spawner == bad
        ));
        assert_eq!(world.alive_count(), alive);
    }

    #[test]
    fn test_no_spawners_is_empty_plan() {
        let world = World::new(8);
        let plan = PopulationPipeline::new(&config(0))
            .plan_spawns(&world, 0)
            .unwrap();
        assert!(plan.groups.is_empty());
        assert!(plan.positions.is_empty());
    }

    #[test]
    fn test_instances_get_planned_positions() {
        let mut world = World::new(128);
        let subject = world.register_template(Blueprint::default().with_countdown(5));
        spawner(&mut world, Position::new(10.0, 0.0, 10.0), subject, 6);
        spawner(&mut world, Position::new(-10.0, 0.0, -10.0), subject, 4);

        let pipeline = PopulationPipeline::new(&config(9));
        let plan = pipeline.plan(&world, 42).unwrap();
        let expected = plan.spawns.positions.clone();
        let report = pipeline.apply(&mut world, plan).unwrap();
        assert_eq!(report.spawned, 10);

        let placed: Vec<Position> = world
            .query(ComponentSet::of(&[brood_core::Countdown::ID]))
            .map(|id| world.component::<Position>(id).unwrap())
            .collect();
        assert_eq!(placed, expected);
    }

    #[test]
    fn test_conservation_and_cull_of_population() {
        let mut world = World::new(2048);
        let subject = world.register_template(Blueprint::default().with_population());
        let mut seeded = [EntityId::NULL; 1000];
        world.instantiate(subject, &mut seeded).unwrap();
        spawner(&mut world, Position::default(), subject, 25);

        let report = PopulationPipeline::new(&config(11))
            .run(&mut world, 119)
            .unwrap();
        assert_eq!(
            report.population_after,
            report.population_before - report.doomed + report.spawned
        );
        assert_eq!(report.spawned, 25);
        assert!(report.doomed > 650 && report.doomed < 850, "{report:?}");
        // The spawner itself is not part of the population
        assert_eq!(world.count(SPAWNERS), 1);
    }

    #[test]
    fn test_plan_is_pure() {
        let mut world = World::new(64);
        let subject = world.register_template(Blueprint::default().with_population());
        let mut ids = [EntityId::NULL; 4];
        world.instantiate(subject, &mut ids).unwrap();
        for (i, id) in ids.iter().enumerate() {
            world
                .insert(*id, Position::on_plane(i as f32, 0.0))
                .unwrap();
        }

        let pipeline = PopulationPipeline::new(&config(7));
        let first = pipeline.plan_culls(&world, 0).unwrap();
        let second = pipeline.plan_culls(&world, 0).unwrap();
        assert_eq!(first.as_slice(), second.as_slice());
    }

    #[test]
    fn test_plan_does_not_exceed_capacity() {
        let mut world = World::new(8);
        let subject = world.register_template(Blueprint::default());
        spawner(&mut world, Position::default(), subject, 100);
        let err = PopulationPipeline::new(&config(0))
            .plan_spawns(&world, 0)
            .unwrap_err();
        assert!(matches!(
            err,
            SimError::Ecs(EcsError::CapacityExhausted { .. })
        ));
    }

    #[test]
    fn test_frame_that_cannot_fit_leaves_store_untouched() {
        let mut world = World::new(10);
        let a = world.register_template(Blueprint::default().with_population());
        let b = world.register_template(Blueprint::default());
        let mut members = [EntityId::NULL; 4];
        world.instantiate(a, &mut members).unwrap();
        spawner(&mut world, Position::default(), a, 3);
        spawner(&mut world, Position::default(), b, 5);
        let alive = world.alive_count();

        let keep_everyone = SimConfig {
            cull_fraction: 0.0,
            ..config(4)
        };
        let err = PopulationPipeline::new(&keep_everyone)
            .run(&mut world, 1)
            .unwrap_err();
        assert!(matches!(
            err,
            SimError::Ecs(EcsError::CapacityExhausted { capacity: 10 })
        ));
        assert_eq!(world.alive_count(), alive);
        assert!(members.iter().all(|id| world.is_alive(*id)));
    }

    #[test]
    fn test_culled_slots_make_room_for_spawns() {
        let mut world = World::new(10);
        let subject = world.register_template(Blueprint::default().with_population());
        let mut members = [EntityId::NULL; 6];
        world.instantiate(subject, &mut members).unwrap();
        spawner(&mut world, Position::default(), subject, 5);

        let cull_everyone = SimConfig {
            cull_fraction: 1.0,
            ..config(4)
        };
        let report = PopulationPipeline::new(&cull_everyone)
            .run(&mut world, 1)
            .unwrap();
        assert_eq!(report.doomed, 6);
        assert_eq!(report.spawned, 5);
        assert_eq!(world.alive_count(), 6);
    }
}
