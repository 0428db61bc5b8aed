//! World management: tiles, chunks, seeds and chunk files.
//!
//! The world is an unbounded grid of tiles split into square chunks of
//! [`CHUNK_SIZE`] tiles per side. Chunks are generated the first time they
//! are touched and saved to one file each.

pub mod chunk;
pub mod content;
pub mod noise;
pub mod position;
pub mod random;
pub mod seed;
pub mod tile;
pub mod world;

pub use chunk::{Chunk, ChunkLoadError, ChunkSource, CHUNKS_FOLDER};
pub use content::{ContentKind, ContentLayer, PopulationKind, StructureKind, TerrainKind};
pub use noise::{NoiseChannel, NoiseSampler, NoiseSeeds};
pub use position::{Position, TileKey, CHUNK_SIZE};
pub use random::{RandomState, RandomStream};
pub use tile::Tile;
pub use world::{World, WorldContext};
