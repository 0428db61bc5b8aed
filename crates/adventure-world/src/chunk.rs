//! Square blocks of tiles, generated and saved as a unit.

use std::collections::btree_map::{BTreeMap, Entry};
use std::path::{Path, PathBuf};

use adventure_json::codec::{self, SAVE_EXT};
use adventure_json::fields::{optional, required_array};
use adventure_json::{
    CodecError, JsonConvertable, JsonError, JsonMap, Parsed, SaveVersion, VersionCorrecter,
    CURRENT_SAVE_VERSION, OLDEST_SAVE_VERSION,
};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::position::{Position, TileKey, TILES_PER_CHUNK};
use crate::random::{RandomState, RandomStream};
use crate::seed;
use crate::tile::Tile;
use crate::world::WorldContext;

/// Folder inside a save that holds the chunk files.
pub const CHUNKS_FOLDER: &str = "chunks";
pub const CHUNK_FILE_NAME: &str = "chunk";
pub const CHUNK_FILE_NAME_SEP: &str = "_";

const FILE_VERSION_KEY: &str = "fileVersion";
const RANDOM_STATE_KEY: &str = "chunkRandomState";
const TILES_KEY: &str = "tiles";

const CHUNK_CORRECTERS: &[VersionCorrecter] = &[VersionCorrecter::new("2.1", |json| {
    adventure_json::fields::rename_key(json, "chunkRandom", RANDOM_STATE_KEY);
})];

#[derive(Debug, Error)]
pub enum ChunkLoadError {
    #[error("chunk file unreadable: {0}")]
    Codec(#[from] CodecError),

    #[error("chunk data invalid: {0}")]
    Json(#[from] JsonError),
}

/// File name of the chunk based at `base`, e.g. `chunk_-10_20.json`.
pub fn chunk_file_name(base: Position) -> String {
    format!(
        "{CHUNK_FILE_NAME}{CHUNK_FILE_NAME_SEP}{}{CHUNK_FILE_NAME_SEP}{}.{SAVE_EXT}",
        base.x, base.y
    )
}

/// Path of the file for the chunk containing `position`.
pub fn chunk_path(save_folder: &Path, position: Position) -> PathBuf {
    save_folder
        .join(CHUNKS_FOLDER)
        .join(chunk_file_name(position.chunk_base()))
}

/// What a chunk document is built against: the chunk it belongs to and the
/// world that re-derives lost streams and fills gaps.
#[derive(Clone, Copy)]
pub struct ChunkSource<'a> {
    pub position: Position,
    pub world: &'a WorldContext,
}

#[derive(Debug, PartialEq)]
pub struct Chunk {
    base_position: Position,
    tiles: BTreeMap<TileKey, Tile>,
    random: RandomStream,
    regenerated_tiles: usize,
}

impl Chunk {
    /// Build the chunk containing `position`.
    ///
    /// Without `random`, the stream is derived from the chunk seed. Supplied
    /// `tiles` are kept and only the gaps are generated; without them every
    /// slot is generated.
    pub fn create(
        position: Position,
        tiles: Option<BTreeMap<TileKey, Tile>>,
        random: Option<RandomStream>,
        ctx: &WorldContext,
    ) -> Self {
        let base_position = position.chunk_base();
        let random = random
            .unwrap_or_else(|| seed::chunk_random(base_position, ctx.noise(), ctx.chunk_seed_modifier()));
        let check_existing = tiles.is_some();

        let mut chunk = Self {
            base_position,
            tiles: tiles.unwrap_or_default(),
            random,
            regenerated_tiles: 0,
        };
        let generated = chunk.fill_chunk_with(check_existing);
        if check_existing {
            chunk.regenerated_tiles = generated;
        }
        debug!(base = %base_position, generated, "Chunk created");
        chunk
    }

    pub fn new(position: Position, ctx: &WorldContext) -> Self {
        Self::create(position, None, None, ctx)
    }

    pub fn base_position(&self) -> Position {
        self.base_position
    }

    pub fn random_stream(&self) -> &RandomStream {
        &self.random
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_full(&self) -> bool {
        self.tiles.len() >= TILES_PER_CHUNK
    }

    /// How many tiles were missing from the file and had to be generated.
    pub fn regenerated_tiles(&self) -> usize {
        self.regenerated_tiles
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    pub fn contains(&self, position: Position) -> bool {
        TileKey::within(self.base_position, position).is_some()
    }

    pub fn find_tile(&self, position: Position) -> Option<&Tile> {
        self.tiles.get(&TileKey::within(self.base_position, position)?)
    }

    pub fn find_tile_mut(&mut self, position: Position) -> Option<&mut Tile> {
        self.tiles.get_mut(&TileKey::within(self.base_position, position)?)
    }

    /// Generate the tile at `position` from the chunk stream, replacing any
    /// existing one. `None` if the position is outside this chunk.
    pub fn generate_tile(&mut self, position: Position) -> Option<&mut Tile> {
        let key = TileKey::within(self.base_position, position)?;
        Some(self.generate_key(key))
    }

    /// The tile at `position`, generating it if absent. The flag reports
    /// whether it already existed. `None` if the position is outside this
    /// chunk.
    pub fn try_get_tile(&mut self, position: Position) -> Option<(bool, &mut Tile)> {
        let key = TileKey::within(self.base_position, position)?;
        Some(self.try_get_key(key))
    }

    pub(crate) fn generate_key(&mut self, key: TileKey) -> &mut Tile {
        let tile = generate(self.base_position, key, &mut self.random);
        match self.tiles.entry(key) {
            Entry::Occupied(mut entry) => {
                entry.insert(tile);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(tile),
        }
    }

    pub(crate) fn try_get_key(&mut self, key: TileKey) -> (bool, &mut Tile) {
        match self.tiles.entry(key) {
            Entry::Occupied(entry) => (true, entry.into_mut()),
            Entry::Vacant(entry) => {
                let tile = generate(self.base_position, key, &mut self.random);
                (false, entry.insert(tile))
            }
        }
    }

    /// Generate every missing tile.
    pub fn fill_chunk(&mut self) -> usize {
        self.fill_chunk_with(true)
    }

    /// Walk the chunk x outer, y inner, generating each slot. With
    /// `check_existing`, slots that already hold a tile are skipped.
    /// Returns the number of tiles generated.
    pub fn fill_chunk_with(&mut self, check_existing: bool) -> usize {
        let mut generated = 0;
        for key in TileKey::all() {
            if check_existing && self.tiles.contains_key(&key) {
                continue;
            }
            let tile = generate(self.base_position, key, &mut self.random);
            self.tiles.insert(key, tile);
            generated += 1;
        }
        generated
    }

    /// Write the chunk to `<save_folder>/chunks/`.
    pub fn save_to_file(&self, save_folder: &Path) -> Result<PathBuf, CodecError> {
        let path = chunk_path(save_folder, self.base_position);
        codec::write_document(&path, &self.to_json())?;
        debug!(base = %self.base_position, path = %path.display(), "Chunk saved");
        Ok(path)
    }

    /// Load the chunk containing `position` from `save_folder`.
    ///
    /// Failures are logged and returned. A loaded chunk is incomplete when
    /// its version, stream or some tiles had to be recovered. Tiles missing
    /// from the file are generated by continuing the stored stream, so the
    /// result may differ from a chunk that was never damaged.
    pub fn load_from_file(
        position: Position,
        save_folder: &Path,
        ctx: &WorldContext,
    ) -> Result<Parsed<Self>, ChunkLoadError> {
        let base_position = position.chunk_base();
        let path = chunk_path(save_folder, base_position);

        let json = match codec::read_single(&path) {
            Ok(json) => json,
            Err(e) => {
                match &e {
                    CodecError::NotFound(path) => error!(path = %path.display(), "Chunk file not found"),
                    CodecError::FolderNotFound(folder) => {
                        error!(folder = %folder.display(), "Chunk folder not found")
                    }
                    _ => error!(path = %path.display(), error = %e, "Chunk parse error"),
                }
                return Err(e.into());
            }
        };

        let file_version = json
            .get(FILE_VERSION_KEY)
            .and_then(Value::as_str)
            .and_then(|label| SaveVersion::parse(label).ok());
        let versioned = file_version.is_some();
        let file_version = file_version.unwrap_or_else(|| {
            warn!(
                path = %path.display(),
                "Chunk has no readable \"{FILE_VERSION_KEY}\", assuming {OLDEST_SAVE_VERSION}"
            );
            SaveVersion::oldest()
        });

        let source = ChunkSource {
            position: base_position,
            world: ctx,
        };
        match Self::from_json(Some(json), &file_version, source) {
            Ok(mut parsed) => {
                parsed.complete &= versioned;
                Ok(parsed)
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Chunk parse error");
                Err(e.into())
            }
        }
    }
}

impl JsonConvertable for Chunk {
    const TYPE_NAME: &'static str = "chunk";
    type Context<'a> = ChunkSource<'a>;

    fn version_correcters() -> &'static [VersionCorrecter] {
        CHUNK_CORRECTERS
    }

    fn to_json(&self) -> JsonMap {
        let tiles = self
            .tiles
            .values()
            .map(|tile| Value::Object(tile.to_json()))
            .collect();

        let mut json = JsonMap::new();
        json.insert(FILE_VERSION_KEY.into(), Value::from(CURRENT_SAVE_VERSION));
        json.insert(RANDOM_STATE_KEY.into(), Value::from(self.random.state().encode()));
        json.insert(TILES_KEY.into(), Value::Array(tiles));
        json
    }

    fn from_json_without_correction(
        json: &JsonMap,
        file_version: &SaveVersion,
        source: ChunkSource<'_>,
    ) -> Result<Parsed<Self>, JsonError> {
        let base_position = source.position.chunk_base();
        let mut complete = true;

        let random = match optional::<RandomState>(json, Self::TYPE_NAME, RANDOM_STATE_KEY) {
            Some(state) => Some(state.to_stream()),
            None => {
                warn!(base = %base_position, "Chunk random state missing or invalid, re-deriving from seed");
                complete = false;
                None
            }
        };

        let entries = required_array(json, Self::TYPE_NAME, TILES_KEY)?;
        let mut tiles = BTreeMap::new();
        for entry in entries {
            let mut tile = match Tile::from_json_value(Some(entry), file_version, ()) {
                Ok(parsed) => {
                    complete &= parsed.complete;
                    parsed.value
                }
                Err(e) => {
                    warn!(base = %base_position, error = %e, "Skipping unreadable tile");
                    complete = false;
                    continue;
                }
            };
            let Some(key) = TileKey::within(base_position, tile.absolute_position) else {
                warn!(
                    base = %base_position,
                    tile = %tile.absolute_position,
                    "Skipping tile outside of its chunk"
                );
                complete = false;
                continue;
            };
            tile.relative_position = key;
            tiles.insert(key, tile);
        }

        if tiles.len() < TILES_PER_CHUNK {
            warn!(
                base = %base_position,
                "Loaded tiles: {}/{} Remaining tiles will be regenerated",
                tiles.len(),
                TILES_PER_CHUNK
            );
            complete = false;
        } else {
            debug!(base = %base_position, loaded = tiles.len(), "Loaded tiles");
        }

        let chunk = Self::create(base_position, Some(tiles), random, source.world);
        Ok(Parsed::with_complete(chunk, complete))
    }
}

fn generate(base: Position, key: TileKey, random: &mut RandomStream) -> Tile {
    let mut tile = Tile::generate(key.absolute(base), random);
    // Differs from the position's own key only where the grid wraps.
    tile.relative_position = key;
    debug!(
        position = %tile.absolute_position,
        terrain = tile.terrain.subtype_id(),
        structure = tile.structure.subtype_id(),
        population = tile.population.subtype_id(),
        "Generated tile"
    );
    tile
}
