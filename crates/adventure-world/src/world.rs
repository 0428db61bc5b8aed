//! Loaded chunks of one save.

use std::collections::BTreeMap;
use std::path::Path;

use adventure_json::CodecError;
use tracing::{debug, info};

use crate::chunk::{chunk_path, Chunk};
use crate::noise::{NoiseSampler, NoiseSeeds};
use crate::position::Position;
use crate::tile::Tile;

/// Everything chunk generation needs from the save: the noise fields and
/// the chunk seed modifier.
pub struct WorldContext {
    noise: NoiseSampler,
    chunk_seed_modifier: u64,
}

impl WorldContext {
    pub fn new(seeds: &NoiseSeeds, chunk_seed_modifier: u64) -> Self {
        Self {
            noise: NoiseSampler::new(seeds),
            chunk_seed_modifier,
        }
    }

    pub fn noise(&self) -> &NoiseSampler {
        &self.noise
    }

    pub fn chunk_seed_modifier(&self) -> u64 {
        self.chunk_seed_modifier
    }
}

/// Chunks held in memory, keyed by base position.
pub struct World {
    ctx: WorldContext,
    chunks: BTreeMap<Position, Chunk>,
}

impl World {
    pub fn new(ctx: WorldContext) -> Self {
        Self {
            ctx,
            chunks: BTreeMap::new(),
        }
    }

    pub fn context(&self) -> &WorldContext {
        &self.ctx
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn loaded_positions(&self) -> Vec<Position> {
        self.chunks.keys().copied().collect()
    }

    pub fn find_chunk(&self, position: Position) -> Option<&Chunk> {
        self.chunks.get(&position.chunk_base())
    }

    /// The chunk containing `position`: from memory, else from its file in
    /// `save_folder`, else freshly generated.
    pub fn get_or_load_chunk(&mut self, position: Position, save_folder: &Path) -> &mut Chunk {
        let base = position.chunk_base();
        let ctx = &self.ctx;
        self.chunks.entry(base).or_insert_with(|| {
            // Never-visited chunks have no file; skip the load and its error log.
            let loaded = if chunk_path(save_folder, base).is_file() {
                Chunk::load_from_file(base, save_folder, ctx)
                    .ok()
                    .map(|parsed| parsed.value)
            } else {
                None
            };
            loaded.unwrap_or_else(|| {
                debug!(base = %base, "Generating new chunk");
                Chunk::new(base, ctx)
            })
        })
    }

    /// The tile at `position`, loading or generating its chunk as needed.
    /// The flag reports whether the tile already existed.
    pub fn try_get_tile_all(&mut self, position: Position, save_folder: &Path) -> (bool, &mut Tile) {
        self.get_or_load_chunk(position, save_folder)
            .try_get_key(position.relative())
    }

    /// Regenerate the tile at `position`.
    pub fn generate_tile(&mut self, position: Position, save_folder: &Path) -> &mut Tile {
        self.get_or_load_chunk(position, save_folder)
            .generate_key(position.relative())
    }

    /// Fill every loaded chunk. Returns the number of tiles generated.
    pub fn fill_all_chunks(&mut self) -> usize {
        self.chunks.values_mut().map(Chunk::fill_chunk).sum()
    }

    /// Write every loaded chunk to `save_folder`, evicting them from memory
    /// when `clear` is set. Stops at the first failed write.
    pub fn save_all_chunks(&mut self, save_folder: &Path, clear: bool) -> Result<usize, CodecError> {
        for chunk in self.chunks.values() {
            chunk.save_to_file(save_folder)?;
        }
        let written = self.chunks.len();
        if clear {
            self.chunks.clear();
        }
        info!(written, cleared = clear, "Saved chunks");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::TILES_PER_CHUNK;
    use crate::random::RandomStream;
    use std::fs;
    use std::path::PathBuf;

    fn world() -> World {
        World::new(WorldContext::new(
            &NoiseSeeds::generate(&mut RandomStream::from_seed(123)),
            7,
        ))
    }

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("adventure_world_{}", rand::random::<u64>()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn tiles_load_their_chunk_once() {
        let dir = temp_dir();
        let mut world = world();

        let (existed, _) = world.try_get_tile_all(Position::new(3, 3), &dir);
        assert!(existed);
        world.try_get_tile_all(Position::new(8, 1), &dir);
        assert_eq!(world.chunk_count(), 1);

        world.try_get_tile_all(Position::new(-1, 3), &dir);
        assert_eq!(world.loaded_positions(), vec![Position::new(-10, 0), Position::new(0, 0)]);
        assert!(world.find_chunk(Position::new(5, 5)).is_some());
        assert_eq!(world.fill_all_chunks(), 0);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn saved_chunks_are_reloaded_with_changes() {
        let dir = temp_dir();
        let mut world = world();
        world.try_get_tile_all(Position::new(12, -4), &dir).1.visit("Bob");

        assert_eq!(world.save_all_chunks(&dir, true).unwrap(), 1);
        assert_eq!(world.chunk_count(), 0);

        let (_, tile) = world.try_get_tile_all(Position::new(12, -4), &dir);
        assert_eq!(tile.visited, 1);
        assert_eq!(world.find_chunk(Position::new(12, -4)).unwrap().tile_count(), TILES_PER_CHUNK);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn save_without_clear_keeps_chunks() {
        let dir = temp_dir();
        let mut world = world();
        world.get_or_load_chunk(Position::new(0, 0), &dir);
        world.get_or_load_chunk(Position::new(100, 0), &dir);
        assert_eq!(world.save_all_chunks(&dir, false).unwrap(), 2);
        assert_eq!(world.chunk_count(), 2);
        assert!(chunk_path(&dir, Position::new(100, 0)).is_file());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn tiles_at_the_ends_of_the_range() {
        let dir = temp_dir();
        let mut world = world();
        for position in [Position::new(i64::MAX, i64::MAX), Position::new(i64::MIN, i64::MIN)] {
            let (existed, tile) = world.try_get_tile_all(position, &dir);
            assert!(existed);
            assert_eq!(tile.absolute_position, position);
        }
        assert_eq!(world.chunk_count(), 2);
        assert_eq!(world.save_all_chunks(&dir, true).unwrap(), 2);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn generate_tile_resets_visits() {
        let dir = temp_dir();
        let mut world = world();
        world.try_get_tile_all(Position::new(1, 1), &dir).1.visit("Ann");
        assert_eq!(world.generate_tile(Position::new(1, 1), &dir).visited, 0);

        fs::remove_dir_all(&dir).ok();
    }
}
