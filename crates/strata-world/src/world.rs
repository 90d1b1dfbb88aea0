use crate::block::{BlockId, BlockRegistry, AIR};
use crate::chunk::{Chunk, ChunkUpdate};
use crate::diagnostics::Diagnostics;
use crate::engine::LightingEngine;
use crate::event::{Event, EventBatch, WorldUpdate};
use crate::lighting::{ChunkLightingUpdateData, LightLevel};
use crate::terrain::{ChunkPlacement, LightingOutcome, Terrain};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use strata_common::{BlockPosition, CardinalDirection, ChunkPosition};
use strata_logger::Logger;

/// Static facts about the world sent at login.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorldInfo {
    pub name: String,
    pub dimension: String,
    pub is_flat: bool,
    /// Time of day the dimension is locked to, if any.
    pub fixed_time: Option<i64>,
}

/// Length of a day-night cycle.
pub const TICKS_PER_DAY: u64 = 24_000;

#[derive(Debug, Default)]
struct WorldTime {
    age: i64,
    time_of_day: i64,
}

/// The client's copy of the world.
///
/// Chunks, chunks waiting for light and pending light data sit behind one
/// reader-writer lock. Packet decoding happens before any of these methods
/// are called; the write lock is only taken to install the result, and a
/// block change holds it through its lighting pass so no reader sees a block
/// without its light.
///
/// While batching is enabled, mutators queue an [`Event`] instead of
/// applying it, and [`World::process_batch`] applies the queue. Toggling
/// batching must not race with `process_batch`.
pub struct World {
    info: WorldInfo,
    terrain: RwLock<Terrain>,
    time: RwLock<WorldTime>,
    batch: Mutex<EventBatch>,
    batching: AtomicBool,
    subscribers: Mutex<Vec<Sender<WorldUpdate>>>,
    registry: Arc<BlockRegistry>,
    logger: Arc<dyn Logger>,
    diagnostics: Diagnostics,
}

impl World {
    /// An empty world with default [`WorldInfo`].
    pub fn new(registry: Arc<BlockRegistry>, logger: Arc<dyn Logger>) -> Self {
        World::with_info(WorldInfo::default(), registry, logger)
    }

    pub fn with_info(info: WorldInfo, registry: Arc<BlockRegistry>, logger: Arc<dyn Logger>) -> Self {
        World {
            info,
            terrain: RwLock::new(Terrain::new()),
            time: RwLock::new(WorldTime::default()),
            batch: Mutex::new(EventBatch::new()),
            batching: AtomicBool::new(false),
            subscribers: Mutex::new(Vec::new()),
            registry,
            logger,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn info(&self) -> &WorldInfo {
        &self.info
    }

    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.registry
    }

    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    /// Counters for data the world dropped or held back.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Read access to all chunks at once. Every lookup made through the
    /// guard sees the same state; writers wait until it is dropped.
    pub fn read_terrain(&self) -> RwLockReadGuard<'_, Terrain> {
        self.terrain.read()
    }

    /// Receives a [`WorldUpdate`] for every mutation applied from now on.
    pub fn subscribe(&self) -> Receiver<WorldUpdate> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        self.subscribers.lock().push(sender);
        receiver
    }

    fn broadcast(&self, update: WorldUpdate) {
        self.subscribers
            .lock()
            .retain(|subscriber| subscriber.send(update.clone()).is_ok());
    }

    // Batching

    /// Queues later mutations until [`World::process_batch`].
    pub fn enable_batching(&self) {
        self.batching.store(true, Ordering::SeqCst);
    }

    /// Later mutations apply immediately. Events already queued wait for the
    /// next [`World::process_batch`].
    pub fn disable_batching(&self) {
        self.batching.store(false, Ordering::SeqCst);
    }

    pub fn is_batching(&self) -> bool {
        self.batching.load(Ordering::SeqCst)
    }

    pub fn pending_event_count(&self) -> usize {
        self.batch.lock().len()
    }

    /// Queues the event while batching, applies it otherwise.
    pub fn handle_event(&self, event: Event) {
        if self.is_batching() {
            self.batch.lock().push(event);
        } else {
            self.apply_event(event);
        }
    }

    /// Swaps out the queued events and applies, in order, those `filter`
    /// accepts (all of them without a filter). Rejected events go back to
    /// the front of the queue in their original order. Returns the updates
    /// the applied events produced.
    pub fn process_batch(&self, filter: Option<&dyn Fn(&Event) -> bool>) -> Vec<WorldUpdate> {
        let events = std::mem::take(&mut *self.batch.lock()).into_events();

        let (accepted, rejected): (Vec<Event>, Vec<Event>) = events
            .into_iter()
            .partition(|event| filter.map_or(true, |accept| accept(event)));
        self.batch.lock().requeue_front(rejected);

        accepted
            .into_iter()
            .flat_map(|event| self.apply_event(event))
            .collect()
    }

    fn apply_event(&self, event: Event) -> Vec<WorldUpdate> {
        let updates = match event {
            Event::AddChunk { position, chunk } => self.apply_add_chunk(position, *chunk),
            Event::RemoveChunk { position } => self.apply_remove_chunk(position),
            Event::SetBlock { position, block_id } => self.apply_set_block(position, block_id),
            Event::SetBlocks { updates } => self.apply_set_blocks(&updates),
            Event::UpdateChunkLighting { position, data } => {
                self.apply_update_chunk_lighting(position, data)
            }
            Event::UpdateChunk { position, update } => self.apply_update_chunk(position, *update),
        };
        for update in &updates {
            self.broadcast(update.clone());
        }
        updates
    }

    // Mutators

    /// Installs a decoded chunk. Light data that arrived before it is
    /// applied first. A chunk that is still unlit afterwards is held back,
    /// invisible to queries and subscribers, until its light data arrives.
    pub fn add_chunk(&self, position: ChunkPosition, chunk: Chunk) {
        self.handle_event(Event::AddChunk {
            position,
            chunk: Box::new(chunk),
        });
    }

    /// Unloads a chunk, held or visible, along with light data waiting for it.
    pub fn remove_chunk(&self, position: ChunkPosition) {
        self.handle_event(Event::RemoveChunk { position });
    }

    /// Changes one block and relights around it. A missing chunk is logged
    /// and otherwise ignored.
    pub fn set_block_id(&self, position: BlockPosition, block_id: BlockId) {
        self.handle_event(Event::SetBlock { position, block_id });
    }

    /// Changes many blocks with a single lighting pass.
    pub fn set_blocks(&self, updates: Vec<(BlockPosition, BlockId)>) {
        self.handle_event(Event::SetBlocks { updates });
    }

    /// Applies server light data, holding it back if the chunk is not loaded.
    pub fn update_chunk_lighting(&self, position: ChunkPosition, data: ChunkLightingUpdateData) {
        self.handle_event(Event::UpdateChunkLighting { position, data });
    }

    /// Applies a partial chunk packet to a loaded chunk.
    pub fn update_chunk(&self, position: ChunkPosition, update: ChunkUpdate) {
        self.handle_event(Event::UpdateChunk {
            position,
            update: Box::new(update),
        });
    }

    fn apply_add_chunk(&self, position: ChunkPosition, chunk: Chunk) -> Vec<WorldUpdate> {
        let placement = self.terrain.write().add_chunk(position, chunk);
        match placement {
            ChunkPlacement::Visible { replaced } => {
                if replaced {
                    self.logger
                        .debug(&format!("Replaced already loaded chunk at {}", position));
                }
                vec![WorldUpdate::ChunkAdded(position)]
            }
            ChunkPlacement::Unlit { hid } => {
                self.logger.debug(&format!(
                    "Holding chunk {} until its light data arrives",
                    position
                ));
                if hid {
                    vec![WorldUpdate::ChunkRemoved(position)]
                } else {
                    Vec::new()
                }
            }
        }
    }

    fn apply_remove_chunk(&self, position: ChunkPosition) -> Vec<WorldUpdate> {
        match self.terrain.write().remove_chunk(position) {
            Some(_) => vec![WorldUpdate::ChunkRemoved(position)],
            None => Vec::new(),
        }
    }

    fn apply_set_block(&self, position: BlockPosition, block_id: BlockId) -> Vec<WorldUpdate> {
        let mut terrain = self.terrain.write();
        match self.set_block_locked(&mut terrain, position, block_id) {
            BlockWrite::Visible => {
                LightingEngine::new().update_lighting(&mut terrain, &self.registry, &[position]);
                vec![WorldUpdate::BlockChanged { position, block_id }]
            }
            BlockWrite::Held | BlockWrite::Ignored => Vec::new(),
        }
    }

    fn apply_set_blocks(&self, updates: &[(BlockPosition, BlockId)]) -> Vec<WorldUpdate> {
        let mut terrain = self.terrain.write();
        let applied: Vec<(BlockPosition, BlockId)> = updates
            .iter()
            .copied()
            .filter(|(position, block_id)| {
                self.set_block_locked(&mut terrain, *position, *block_id) == BlockWrite::Visible
            })
            .collect();
        if applied.is_empty() {
            return Vec::new();
        }

        let positions: Vec<BlockPosition> = applied.iter().map(|(position, _)| *position).collect();
        LightingEngine::new().update_lighting(&mut terrain, &self.registry, &positions);
        vec![WorldUpdate::BlocksChanged(applied)]
    }

    fn set_block_locked(
        &self,
        terrain: &mut Terrain,
        position: BlockPosition,
        block_id: BlockId,
    ) -> BlockWrite {
        let chunk_position = position.chunk();
        let visible = terrain.contains_chunk(chunk_position);
        let chunk = if visible {
            terrain.chunk_mut(chunk_position)
        } else {
            terrain.unlit_chunk_mut(chunk_position)
        };
        let chunk = match chunk {
            Some(chunk) => chunk,
            None => {
                self.diagnostics.record_orphaned_block_update();
                self.logger.warning(&format!(
                    "Ignoring block change at {} in unloaded chunk {}",
                    position, chunk_position
                ));
                return BlockWrite::Ignored;
            }
        };

        match chunk.set_block_id(position.relative_to_chunk(), block_id, &self.registry) {
            Ok(_) if visible => BlockWrite::Visible,
            Ok(_) => BlockWrite::Held,
            Err(err) => {
                self.logger.warning(&format!("Ignoring block change: {}", err));
                BlockWrite::Ignored
            }
        }
    }

    fn apply_update_chunk_lighting(
        &self,
        position: ChunkPosition,
        data: ChunkLightingUpdateData,
    ) -> Vec<WorldUpdate> {
        let outcome = self.terrain.write().apply_lighting(position, data);
        match outcome {
            LightingOutcome::Updated => vec![WorldUpdate::ChunkLightingUpdated(position)],
            LightingOutcome::Revealed => vec![
                WorldUpdate::ChunkAdded(position),
                WorldUpdate::ChunkLightingUpdated(position),
            ],
            LightingOutcome::Deferred => {
                self.diagnostics.record_deferred_lighting_update();
                self.logger.debug(&format!(
                    "Holding light data for chunk {} until it is loaded",
                    position
                ));
                Vec::new()
            }
        }
    }

    fn apply_update_chunk(&self, position: ChunkPosition, update: ChunkUpdate) -> Vec<WorldUpdate> {
        {
            let mut terrain = self.terrain.write();
            if let Some(chunk) = terrain.chunk_mut(position) {
                chunk.apply_update(update);
                return vec![WorldUpdate::ChunkUpdated(position)];
            }
            if let Some(chunk) = terrain.unlit_chunk_mut(position) {
                chunk.apply_update(update);
                return Vec::new();
            }
        }

        self.logger.warning(&format!(
            "Ignoring partial chunk data for unloaded chunk {}",
            position
        ));
        Vec::new()
    }

    /// Drops every chunk, held chunk, pending light data and queued event.
    pub fn reset(&self) {
        self.terrain.write().clear();
        *self.batch.lock() = EventBatch::new();
    }

    // Queries

    /// Air outside the world's height or in a chunk that is not visible.
    pub fn block_id(&self, position: BlockPosition) -> BlockId {
        if !(0..crate::chunk::CHUNK_HEIGHT).contains(&position.y) {
            return AIR;
        }
        self.terrain.read().block_id(position)
    }

    /// Whether a lit chunk is loaded at the position.
    pub fn contains_chunk(&self, position: ChunkPosition) -> bool {
        self.terrain.read().contains_chunk(position)
    }

    /// Runs `f` against a chunk under the read lock.
    pub fn with_chunk<R>(&self, position: ChunkPosition, f: impl FnOnce(&Chunk) -> R) -> Option<R> {
        self.terrain.read().chunk(position).map(f)
    }

    /// Visible chunks.
    pub fn chunk_count(&self) -> usize {
        self.terrain.read().chunk_count()
    }

    /// Loaded neighbours of a chunk.
    pub fn neighbours(&self, position: ChunkPosition) -> Vec<(CardinalDirection, ChunkPosition)> {
        let terrain = self.terrain.read();
        position
            .neighbours()
            .into_iter()
            .filter(|(_, neighbour)| terrain.contains_chunk(*neighbour))
            .collect()
    }

    /// All four cardinal neighbours are visible.
    pub fn has_all_neighbours(&self, position: ChunkPosition) -> bool {
        self.neighbours(position).len() == CardinalDirection::ALL.len()
    }

    /// Whether the chunk is visible with light data applied.
    pub fn is_chunk_lit(&self, position: ChunkPosition) -> bool {
        self.with_chunk(position, Chunk::is_lit).unwrap_or(false)
    }

    /// Whether a chunk at the position is held back waiting for light data.
    pub fn is_chunk_unlit(&self, position: ChunkPosition) -> bool {
        self.terrain.read().is_chunk_unlit(position)
    }

    pub fn is_position_loaded(&self, position: BlockPosition) -> bool {
        self.terrain.read().is_position_loaded(position)
    }

    /// Whether light data is waiting for its chunk.
    pub fn has_pending_lighting(&self, position: ChunkPosition) -> bool {
        self.terrain.read().has_pending_lighting(position)
    }

    // Lighting

    pub fn block_light_level(&self, position: BlockPosition) -> u8 {
        self.terrain.read().block_light_level(position)
    }

    pub fn sky_light_level(&self, position: BlockPosition) -> u8 {
        self.terrain.read().sky_light_level(position)
    }

    /// Both channels at once, read under a single lock.
    pub fn light_level(&self, position: BlockPosition) -> LightLevel {
        self.terrain.read().light_level(position)
    }

    /// Writes a level without propagating it.
    pub fn set_block_light_level(&self, position: BlockPosition, level: u8) {
        self.terrain.write().set_block_light_level(position, level);
    }

    /// Writes a level without propagating it.
    pub fn set_sky_light_level(&self, position: BlockPosition, level: u8) {
        self.terrain.write().set_sky_light_level(position, level);
    }

    // Time

    /// World age in ticks, as last sent by the server.
    pub fn age(&self) -> i64 {
        self.time.read().age
    }

    /// Current time within the day, in ticks. A negative value from the
    /// server means the daylight cycle is stopped, so its magnitude counts.
    pub fn time_of_day(&self) -> u64 {
        let raw = match self.info.fixed_time {
            Some(fixed) => fixed,
            None => self.time.read().time_of_day,
        };
        raw.unsigned_abs() % TICKS_PER_DAY
    }

    pub fn is_daylight_cycle_running(&self) -> bool {
        self.info.fixed_time.is_none() && self.time.read().time_of_day >= 0
    }

    /// Stores the values of a Time Update packet.
    pub fn set_time(&self, age: i64, time_of_day: i64) {
        let mut time = self.time.write();
        time.age = age;
        time.time_of_day = time_of_day;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockWrite {
    Visible,
    /// Written to a chunk waiting for light.
    Held,
    Ignored,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::LightMaterial;
    use crate::section::SECTION_VOLUME;
    use strata_logger::{LogSeverity, MemoryLogger};

    const TORCH: BlockId = 50;

    fn world() -> (World, Arc<MemoryLogger>) {
        let logger = Arc::new(MemoryLogger::new());
        let registry = Arc::new(BlockRegistry::new().with_block(TORCH, LightMaterial::new(0, 14)));
        (World::new(registry, logger.clone()), logger)
    }

    fn lit_chunk() -> Chunk {
        let mut chunk = Chunk::default();
        chunk.update_lighting(&ChunkLightingUpdateData::default());
        chunk
    }

    #[test]
    fn test_set_block_in_missing_chunk() {
        let (world, logger) = world();
        let updates = world.subscribe();

        world.set_block_id(BlockPosition::new(5, 64, 5), 1);

        assert!(logger.contains(LogSeverity::Warning, "unloaded chunk"));
        assert_eq!(world.chunk_count(), 0);
        assert_eq!(world.diagnostics().snapshot().orphaned_block_updates, 1);
        assert!(updates.try_recv().is_err());
    }

    #[test]
    fn test_set_block_relights_and_broadcasts() {
        let (world, _) = world();
        world.add_chunk(ChunkPosition::new(0, 0), lit_chunk());
        let updates = world.subscribe();

        let torch = BlockPosition::new(4, 20, 4);
        world.set_block_id(torch, TORCH);

        assert_eq!(world.block_id(torch), TORCH);
        assert_eq!(world.block_light_level(torch), 14);
        assert_eq!(world.block_light_level(BlockPosition::new(5, 20, 4)), 13);
        assert_eq!(
            updates.try_recv().ok(),
            Some(WorldUpdate::BlockChanged { position: torch, block_id: TORCH })
        );
    }

    #[test]
    fn test_out_of_range_block_change_is_ignored() {
        let (world, logger) = world();
        world.add_chunk(ChunkPosition::new(0, 0), lit_chunk());
        let updates = world.subscribe();

        world.set_block_id(BlockPosition::new(0, 300, 0), 1);
        assert!(logger.contains(LogSeverity::Warning, "outside the chunk"));
        assert_eq!(world.with_chunk(ChunkPosition::new(0, 0), Chunk::non_empty_section_count), Some(0));
        assert!(updates.try_recv().is_err());
    }

    #[test]
    fn test_lighting_before_chunk() {
        let (world, _) = world();
        let position = ChunkPosition::new(2, -1);
        let mut data = ChunkLightingUpdateData::default();
        data.block_light_arrays.insert(3, vec![6; SECTION_VOLUME]);

        world.update_chunk_lighting(position, data);
        assert!(world.has_pending_lighting(position));
        assert_eq!(world.diagnostics().snapshot().deferred_lighting_updates, 1);

        let updates = world.subscribe();
        world.add_chunk(position, Chunk::default());
        assert!(!world.has_pending_lighting(position));
        assert!(world.is_chunk_lit(position));
        assert!(!world.is_chunk_unlit(position));
        assert_eq!(world.block_light_level(BlockPosition::new(32, 50, -16)), 6);
        assert_eq!(updates.try_recv().ok(), Some(WorldUpdate::ChunkAdded(position)));
    }

    #[test]
    fn test_unlit_chunk_waits_for_light() {
        let (world, _) = world();
        let position = ChunkPosition::new(1, 2);
        let block = BlockPosition::new(17, 64, 40);
        let updates = world.subscribe();

        world.add_chunk(position, Chunk::default());
        assert!(world.is_chunk_unlit(position));
        assert!(!world.contains_chunk(position));
        assert!(updates.try_recv().is_err());

        // writes land in the held chunk without being announced
        world.set_block_id(block, TORCH);
        assert_eq!(world.block_id(block), AIR);
        assert_eq!(world.diagnostics().snapshot().orphaned_block_updates, 0);
        assert!(updates.try_recv().is_err());

        let mut data = ChunkLightingUpdateData::default();
        data.block_light_arrays.insert(4, vec![3; SECTION_VOLUME]);
        world.update_chunk_lighting(position, data);

        assert!(world.contains_chunk(position));
        assert!(!world.is_chunk_unlit(position));
        assert_eq!(world.block_id(block), TORCH);
        assert_eq!(world.block_light_level(block), 3);
        assert_eq!(
            updates.try_iter().collect::<Vec<_>>(),
            vec![
                WorldUpdate::ChunkAdded(position),
                WorldUpdate::ChunkLightingUpdated(position),
            ]
        );
        assert_eq!(world.diagnostics().snapshot().deferred_lighting_updates, 0);
    }

    #[test]
    fn test_unlit_chunk_hides_the_one_it_replaces() {
        let (world, _) = world();
        let position = ChunkPosition::new(0, 0);
        world.add_chunk(position, lit_chunk());
        let updates = world.subscribe();

        world.add_chunk(position, Chunk::default());
        assert!(!world.contains_chunk(position));
        assert_eq!(updates.try_recv().ok(), Some(WorldUpdate::ChunkRemoved(position)));

        world.remove_chunk(position);
        assert!(!world.is_chunk_unlit(position));
        assert!(updates.try_recv().is_err());
    }

    #[test]
    fn test_remove_chunk() {
        let (world, _) = world();
        let position = ChunkPosition::new(0, 0);
        world.add_chunk(position, lit_chunk());
        let updates = world.subscribe();

        world.remove_chunk(position);
        assert!(!world.contains_chunk(position));
        assert_eq!(updates.try_recv().ok(), Some(WorldUpdate::ChunkRemoved(position)));

        // nothing to remove, nothing broadcast
        world.remove_chunk(position);
        assert!(updates.try_recv().is_err());
    }

    #[test]
    fn test_set_blocks_single_pass() {
        let (world, _) = world();
        world.add_chunk(ChunkPosition::new(0, 0), lit_chunk());
        let updates = world.subscribe();

        world.set_blocks(vec![
            (BlockPosition::new(1, 1, 1), 1),
            (BlockPosition::new(2, 1, 1), TORCH),
            (BlockPosition::new(40, 1, 1), 1),
        ]);

        assert_eq!(world.block_id(BlockPosition::new(1, 1, 1)), 1);
        assert_eq!(world.block_light_level(BlockPosition::new(2, 1, 1)), 14);
        assert_eq!(world.diagnostics().snapshot().orphaned_block_updates, 1);
        assert_eq!(
            updates.try_recv().ok(),
            Some(WorldUpdate::BlocksChanged(vec![
                (BlockPosition::new(1, 1, 1), 1),
                (BlockPosition::new(2, 1, 1), TORCH),
            ]))
        );

        world.set_blocks(vec![(BlockPosition::new(40, 1, 1), 1)]);
        assert!(updates.try_recv().is_err());
    }

    #[test]
    fn test_batching_defers_until_processed() {
        let (world, _) = world();
        world.enable_batching();
        let position = ChunkPosition::new(0, 0);

        world.add_chunk(position, lit_chunk());
        world.set_block_id(BlockPosition::new(0, 0, 0), 1);
        assert!(!world.contains_chunk(position));
        assert_eq!(world.pending_event_count(), 2);

        let applied = world.process_batch(None);
        assert_eq!(
            applied,
            vec![
                WorldUpdate::ChunkAdded(position),
                WorldUpdate::BlockChanged { position: BlockPosition::new(0, 0, 0), block_id: 1 },
            ]
        );
        assert_eq!(world.block_id(BlockPosition::new(0, 0, 0)), 1);
        assert_eq!(world.pending_event_count(), 0);
    }

    #[test]
    fn test_batched_writes_that_miss_report_nothing() {
        let (world, _) = world();
        let updates = world.subscribe();
        world.enable_batching();

        world.set_block_id(BlockPosition::new(100, 10, 100), 1);
        world.remove_chunk(ChunkPosition::new(9, 9));
        world.update_chunk_lighting(ChunkPosition::new(9, 9), ChunkLightingUpdateData::default());
        world.add_chunk(ChunkPosition::new(8, 8), Chunk::default());
        assert_eq!(world.pending_event_count(), 4);

        assert!(world.process_batch(None).is_empty());
        assert!(updates.try_recv().is_err());
        assert_eq!(world.diagnostics().snapshot().orphaned_block_updates, 1);
        assert!(world.is_chunk_unlit(ChunkPosition::new(8, 8)));
    }

    #[test]
    fn test_rejected_events_are_retried_in_order() {
        let (world, _) = world();
        world.add_chunk(ChunkPosition::new(0, 0), lit_chunk());
        world.enable_batching();

        let first = BlockPosition::new(1, 0, 0);
        let second = BlockPosition::new(2, 0, 0);
        let third = BlockPosition::new(3, 0, 0);
        world.set_block_id(first, 1);
        world.set_block_id(second, 2);
        world.set_block_id(third, 3);

        let reject_second =
            |event: &Event| !matches!(event, Event::SetBlock { position, .. } if *position == second);
        let applied = world.process_batch(Some(&reject_second));
        assert_eq!(
            applied,
            vec![
                WorldUpdate::BlockChanged { position: first, block_id: 1 },
                WorldUpdate::BlockChanged { position: third, block_id: 3 },
            ]
        );
        assert_eq!(world.block_id(second), AIR);

        world.set_block_id(first, 4);
        let applied = world.process_batch(None);
        assert_eq!(
            applied,
            vec![
                WorldUpdate::BlockChanged { position: second, block_id: 2 },
                WorldUpdate::BlockChanged { position: first, block_id: 4 },
            ]
        );
        assert_eq!(world.block_id(second), 2);
    }

    #[test]
    fn test_disabling_batching_keeps_queued_events() {
        let (world, _) = world();
        world.enable_batching();
        world.add_chunk(ChunkPosition::new(0, 0), lit_chunk());
        world.disable_batching();

        world.add_chunk(ChunkPosition::new(1, 0), lit_chunk());
        assert!(world.contains_chunk(ChunkPosition::new(1, 0)));
        assert!(!world.contains_chunk(ChunkPosition::new(0, 0)));

        world.process_batch(None);
        assert!(world.contains_chunk(ChunkPosition::new(0, 0)));
    }

    #[test]
    fn test_time() {
        let (world, _) = world();
        world.set_time(1200, -6000);
        assert_eq!(world.age(), 1200);
        assert_eq!(world.time_of_day(), 6000);
        assert!(!world.is_daylight_cycle_running());

        world.set_time(1300, 30_000);
        assert_eq!(world.time_of_day(), 6000);
        assert!(world.is_daylight_cycle_running());

        let fixed = World::with_info(
            WorldInfo {
                fixed_time: Some(18000),
                ..Default::default()
            },
            Arc::new(BlockRegistry::new()),
            Arc::new(MemoryLogger::new()),
        );
        fixed.set_time(0, 100);
        assert_eq!(fixed.time_of_day(), 18000);
        assert!(!fixed.is_daylight_cycle_running());
    }

    #[test]
    fn test_time_of_day_extremes() {
        let (world, _) = world();
        world.set_time(0, i64::MIN);
        assert_eq!(world.time_of_day(), (1u64 << 63) % TICKS_PER_DAY);
        assert!(!world.is_daylight_cycle_running());

        world.set_time(0, i64::MAX);
        assert_eq!(world.time_of_day(), i64::MAX as u64 % TICKS_PER_DAY);
    }

    #[test]
    fn test_neighbours() {
        let (world, _) = world();
        let centre = ChunkPosition::new(0, 0);
        for (_, neighbour) in centre.neighbours() {
            world.add_chunk(neighbour, lit_chunk());
        }
        assert!(world.has_all_neighbours(centre));

        world.remove_chunk(ChunkPosition::new(1, 0));
        assert_eq!(world.neighbours(centre).len(), 3);
        assert!(!world.has_all_neighbours(centre));

        world.add_chunk(ChunkPosition::new(1, 0), Chunk::default());
        assert!(!world.has_all_neighbours(centre));
    }

    #[test]
    fn test_reset() {
        let (world, _) = world();
        world.add_chunk(ChunkPosition::new(0, 0), lit_chunk());
        world.add_chunk(ChunkPosition::new(1, 0), Chunk::default());
        world.update_chunk_lighting(ChunkPosition::new(5, 5), ChunkLightingUpdateData::default());
        world.reset();
        assert_eq!(world.chunk_count(), 0);
        assert!(!world.is_chunk_unlit(ChunkPosition::new(1, 0)));
        assert!(!world.has_pending_lighting(ChunkPosition::new(5, 5)));
    }
}
