//! The two documents of a save's data file.
//!
//! Document 0 is a small display header read when listing saves; document 1
//! holds everything needed to resume the game.

use adventure_json::fields::{optional, required, required_object};
use adventure_json::{JsonConvertable, JsonError, JsonMap, Parsed, SaveVersion, VersionCorrecter};
use adventure_world::{NoiseChannel, NoiseSeeds, RandomState};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::player::Player;

pub const DISPLAY_DOCUMENT: usize = 0;
pub const MAIN_DOCUMENT: usize = 1;

const SAVE_VERSION_KEY: &str = "saveVersion";
const SEEDS_KEY: &str = "seeds";
const CHUNK_SEED_MODIFIER_KEY: &str = "chunkSeedModifier";
const NOISE_SEEDS_KEY: &str = "tileTypeNoiseSeeds";

/// Listing header. Lenient on read: only the player name is mandatory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayData {
    #[serde(default)]
    pub save_version: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub last_access: Option<DateTime<Local>>,
    pub player_name: String,
}

impl DisplayData {
    pub fn new(display_name: &str, last_access: DateTime<Local>, player_name: &str) -> Self {
        Self {
            save_version: Some(SaveVersion::current().to_string()),
            display_name: Some(display_name.to_string()),
            last_access: Some(last_access),
            player_name: player_name.to_string(),
        }
    }

    pub fn from_json(json: JsonMap) -> Result<Self, JsonError> {
        Ok(serde_json::from_value(Value::Object(json))?)
    }

    pub fn to_json(&self) -> JsonMap {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => JsonMap::new(),
        }
    }

    pub fn is_current_version(&self) -> bool {
        self.save_version
            .as_deref()
            .and_then(|label| SaveVersion::parse(label).ok())
            .is_some_and(|version| version.is_current())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedData {
    pub main_random: RandomState,
    pub world_random: RandomState,
    /// May be missing channels if the file was damaged.
    pub noise_seeds: NoiseSeeds,
    pub chunk_seed_modifier: u64,
}

impl SeedData {
    fn to_json(&self) -> JsonMap {
        let mut noise = JsonMap::new();
        for (channel, seed) in self.noise_seeds.iter() {
            noise.insert(channel.id().into(), Value::from(seed));
        }

        let mut json = JsonMap::new();
        json.insert("mainRandom".into(), Value::from(self.main_random.encode()));
        json.insert("worldRandom".into(), Value::from(self.world_random.encode()));
        json.insert(NOISE_SEEDS_KEY.into(), Value::Object(noise));
        json.insert(CHUNK_SEED_MODIFIER_KEY.into(), Value::from(self.chunk_seed_modifier));
        json
    }

    fn from_json(json: &JsonMap) -> Result<Parsed<Self>, JsonError> {
        const TYPE_NAME: &str = "seeds";
        let main_random: RandomState = required(json, TYPE_NAME, "mainRandom")?;
        let world_random: RandomState = required(json, TYPE_NAME, "worldRandom")?;
        let chunk_seed_modifier: u64 = required(json, TYPE_NAME, CHUNK_SEED_MODIFIER_KEY)?;

        let mut complete = true;
        let mut noise_seeds = NoiseSeeds::default();
        match required_object(json, TYPE_NAME, NOISE_SEEDS_KEY) {
            Ok(entries) => {
                for (key, value) in entries {
                    match (NoiseChannel::from_id(key), noise_seed(value)) {
                        (Some(channel), Some(seed)) => noise_seeds.insert(channel, seed),
                        _ => {
                            warn!(key = %key, value = %value, "Dropping invalid noise seed entry");
                            complete = false;
                        }
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Noise seeds unreadable");
                complete = false;
            }
        }

        Ok(Parsed::with_complete(
            Self {
                main_random,
                world_random,
                noise_seeds,
                chunk_seed_modifier,
            },
            complete,
        ))
    }
}

/// A noise seed stored as a number or as a string of digits.
fn noise_seed(value: &Value) -> Option<u64> {
    match value {
        Value::String(text) => text.trim().parse().ok(),
        other => other.as_u64(),
    }
}

/// Saves older than 2.2 had no chunk seed modifier; 1 keeps their chunk
/// seeds unchanged.
fn insert_chunk_seed_modifier(json: &mut JsonMap) {
    if let Some(Value::Object(seeds)) = json.get_mut(SEEDS_KEY) {
        seeds
            .entry(CHUNK_SEED_MODIFIER_KEY)
            .or_insert_with(|| Value::from(1u64));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MainData {
    /// Version the document was written with.
    pub save_version: SaveVersion,
    pub display_name: String,
    pub last_access: DateTime<Local>,
    pub player: Player,
    pub seeds: SeedData,
}

impl MainData {
    /// Read the version label of a raw main document.
    pub fn read_version(json: &JsonMap) -> Option<SaveVersion> {
        json.get(SAVE_VERSION_KEY)
            .and_then(Value::as_str)
            .and_then(|label| SaveVersion::parse(label).ok())
    }
}

impl JsonConvertable for MainData {
    const TYPE_NAME: &'static str = "save data";
    type Context<'a> = ();

    fn version_correcters() -> &'static [VersionCorrecter] {
        const CORRECTERS: &[VersionCorrecter] =
            &[VersionCorrecter::new("2.2", insert_chunk_seed_modifier)];
        CORRECTERS
    }

    fn to_json(&self) -> JsonMap {
        let mut json = JsonMap::new();
        json.insert(SAVE_VERSION_KEY.into(), Value::from(SaveVersion::current().to_string()));
        json.insert("displayName".into(), Value::from(self.display_name.clone()));
        json.insert("lastAccess".into(), Value::from(self.last_access.to_rfc3339()));
        json.insert("player".into(), Value::Object(self.player.to_json()));
        json.insert(SEEDS_KEY.into(), Value::Object(self.seeds.to_json()));
        json
    }

    fn from_json_without_correction(
        json: &JsonMap,
        file_version: &SaveVersion,
        _ctx: (),
    ) -> Result<Parsed<Self>, JsonError> {
        let display_name: String = required(json, Self::TYPE_NAME, "displayName")?;
        let mut complete = true;

        let last_access = match optional::<DateTime<Local>>(json, Self::TYPE_NAME, "lastAccess") {
            Some(last_access) => last_access,
            None => {
                warn!(save = %display_name, "Save data has no last access time, using now");
                complete = false;
                Local::now()
            }
        };

        let player = Player::from_json_value(json.get("player"), file_version, ())?;
        let seeds = SeedData::from_json(required_object(json, Self::TYPE_NAME, SEEDS_KEY)?)?;
        complete &= player.complete && seeds.complete;

        Ok(Parsed::with_complete(
            Self {
                save_version: file_version.clone(),
                display_name,
                last_access,
                player: player.value,
                seeds: seeds.value,
            },
            complete,
        ))
    }
}
