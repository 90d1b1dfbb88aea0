use crate::block::BlockId;
use crate::chunk::{Chunk, ChunkUpdate};
use crate::lighting::ChunkLightingUpdateData;
use strata_common::{BlockPosition, ChunkPosition};

/// A queued world mutation, carrying what is needed to replay it.
#[derive(Debug, Clone)]
pub enum Event {
    AddChunk {
        position: ChunkPosition,
        chunk: Box<Chunk>,
    },
    RemoveChunk {
        position: ChunkPosition,
    },
    SetBlock {
        position: BlockPosition,
        block_id: BlockId,
    },
    SetBlocks {
        updates: Vec<(BlockPosition, BlockId)>,
    },
    UpdateChunkLighting {
        position: ChunkPosition,
        data: ChunkLightingUpdateData,
    },
    UpdateChunk {
        position: ChunkPosition,
        update: Box<ChunkUpdate>,
    },
}

/// Lightweight description of a change that reached the visible world, sent
/// to subscribers and returned from batch processing. Mutations that were
/// ignored, or only touched a chunk still waiting for light, produce none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldUpdate {
    ChunkAdded(ChunkPosition),
    ChunkRemoved(ChunkPosition),
    BlockChanged {
        position: BlockPosition,
        block_id: BlockId,
    },
    BlocksChanged(Vec<(BlockPosition, BlockId)>),
    ChunkLightingUpdated(ChunkPosition),
    ChunkUpdated(ChunkPosition),
}

/// FIFO of pending events.
#[derive(Debug, Default)]
pub struct EventBatch {
    events: Vec<Event>,
}

impl EventBatch {
    pub fn new() -> Self {
        EventBatch::default()
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Puts `events` ahead of everything already queued, keeping their order.
    pub fn requeue_front(&mut self, events: Vec<Event>) {
        if events.is_empty() {
            return;
        }
        let queued = std::mem::replace(&mut self.events, events);
        self.events.extend(queued);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_block(x: i32) -> Event {
        Event::SetBlock {
            position: BlockPosition::new(x, 0, 0),
            block_id: 1,
        }
    }

    fn order(batch: EventBatch) -> Vec<i32> {
        batch
            .into_events()
            .iter()
            .filter_map(|event| match event {
                Event::SetBlock { position, .. } => Some(position.x),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_requeue_front_keeps_order() {
        let mut batch = EventBatch::new();
        batch.push(set_block(3));
        batch.requeue_front(vec![set_block(1), set_block(2)]);
        assert_eq!(batch.len(), 3);
        assert_eq!(order(batch), vec![1, 2, 3]);
    }

    #[test]
    fn test_requeue_nothing() {
        let mut batch = EventBatch::new();
        batch.requeue_front(Vec::new());
        assert!(batch.is_empty());
        batch.push(set_block(7));
        batch.requeue_front(Vec::new());
        assert_eq!(order(batch), vec![7]);
    }
}
