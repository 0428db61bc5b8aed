//! The currently open save.

use std::path::PathBuf;

use adventure_json::SaveVersion;
use adventure_world::{NoiseSeeds, Position, RandomStream, World, WorldContext};
use chrono::{DateTime, Local};
use tracing::{info, warn};

use crate::dirs::SaveDirs;
use crate::player::{Facing, Player};
use crate::save_data::{DisplayData, MainData, SeedData};

pub struct SaveSession {
    pub save_name: String,
    pub display_name: String,
    pub last_access: DateTime<Local>,
    pub player: Player,
    pub main_random: RandomStream,
    pub world_random: RandomStream,
    noise_seeds: NoiseSeeds,
    chunk_seed_modifier: u64,
    pub world: World,
}

impl SaveSession {
    /// Start a new game. The world stream is split off the main stream and
    /// draws the noise seeds and chunk seed modifier.
    pub fn new_game(display_name: &str, player_name: &str, seed: u64, dirs: &SaveDirs) -> Self {
        let save_name = dirs.correct_save_name(display_name);
        let mut main_random = RandomStream::from_seed(seed);
        let mut world_random = main_random.split();
        let noise_seeds = NoiseSeeds::generate(&mut world_random);
        // Odd, so the multiplication never collapses seeds to zero.
        let chunk_seed_modifier = world_random.next_u64() | 1;

        let world = World::new(WorldContext::new(&noise_seeds, chunk_seed_modifier));
        let mut session = Self {
            save_name,
            display_name: display_name.trim().to_string(),
            last_access: Local::now(),
            player: Player::new(player_name),
            main_random,
            world_random,
            noise_seeds,
            chunk_seed_modifier,
            world,
        };

        let folder = session.save_folder(dirs);
        let position = session.player.position;
        session.world.try_get_tile_all(position, &folder);
        info!(save = %session.save_name, player = %session.player.name, "Created new save");
        session
    }

    /// Resume from a parsed main document. Noise channels missing from the
    /// file are drawn from the world stream.
    pub fn from_main_data(save_name: &str, data: MainData) -> Self {
        let SeedData {
            main_random,
            world_random,
            mut noise_seeds,
            chunk_seed_modifier,
        } = data.seeds;
        let main_random = main_random.to_stream();
        let mut world_random = world_random.to_stream();

        let missing = noise_seeds.missing();
        if !missing.is_empty() {
            warn!(save = save_name, missing = ?missing, "Noise seeds missing, generating new ones");
            noise_seeds.fill_missing(&mut world_random);
        }

        let world = World::new(WorldContext::new(&noise_seeds, chunk_seed_modifier));
        Self {
            save_name: save_name.to_string(),
            display_name: data.display_name,
            last_access: data.last_access,
            player: data.player,
            main_random,
            world_random,
            noise_seeds,
            chunk_seed_modifier,
            world,
        }
    }

    pub fn save_folder(&self, dirs: &SaveDirs) -> PathBuf {
        dirs.save_folder(&self.save_name)
    }

    pub fn noise_seeds(&self) -> &NoiseSeeds {
        &self.noise_seeds
    }

    pub fn chunk_seed_modifier(&self) -> u64 {
        self.chunk_seed_modifier
    }

    pub fn touch(&mut self) {
        self.last_access = Local::now();
    }

    pub fn display_data(&self) -> DisplayData {
        DisplayData::new(&self.display_name, self.last_access, &self.player.name)
    }

    pub fn main_data(&self) -> MainData {
        MainData {
            save_version: SaveVersion::current(),
            display_name: self.display_name.clone(),
            last_access: self.last_access,
            player: self.player.clone(),
            seeds: SeedData {
                main_random: self.main_random.state(),
                world_random: self.world_random.state(),
                noise_seeds: self.noise_seeds.clone(),
                chunk_seed_modifier: self.chunk_seed_modifier,
            },
        }
    }

    /// Step the player and visit the tile they land on.
    pub fn move_player(&mut self, facing: Facing, dirs: &SaveDirs) -> (Position, Vec<String>) {
        let position = self.player.step(facing);
        let texts = self.visit_current_tile(dirs);
        (position, texts)
    }

    pub fn visit_current_tile(&mut self, dirs: &SaveDirs) -> Vec<String> {
        let folder = self.save_folder(dirs);
        let (_, tile) = self.world.try_get_tile_all(self.player.position, &folder);
        tile.visit(&self.player.name)
    }
}
