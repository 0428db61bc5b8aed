//! The player character.

use adventure_json::fields::{optional, required};
use adventure_json::{JsonConvertable, JsonError, JsonMap, Parsed, SaveVersion, VersionCorrecter};
use adventure_world::Position;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

pub const DEFAULT_PLAYER_NAME: &str = "You";

const START_MAX_HP: i64 = 20;
const START_ATTACK: i64 = 10;
const START_DEFENCE: i64 = 10;
const START_AGILITY: i64 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    #[default]
    North,
    South,
    East,
    West,
}

impl Facing {
    pub fn offset(self) -> (i64, i64) {
        match self {
            Self::North => (0, 1),
            Self::South => (0, -1),
            Self::East => (1, 0),
            Self::West => (-1, 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub items: Vec<Item>,
}

impl Inventory {
    /// Add `amount` of `kind`, stacking onto an existing entry.
    pub fn add(&mut self, kind: &str, amount: u64) {
        match self.items.iter_mut().find(|item| item.kind == kind) {
            Some(item) => item.amount += amount,
            None => self.items.push(Item {
                kind: kind.to_string(),
                amount,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub name: String,
    pub position: Position,
    pub facing: Facing,
    pub base_max_hp: i64,
    pub current_hp: i64,
    pub attack: i64,
    pub defence: i64,
    pub agility: i64,
    pub inventory: Inventory,
}

impl Player {
    /// A fresh player at the origin with starting stats.
    pub fn new(name: &str) -> Self {
        Self {
            name: correct_name(name),
            position: Position::new(0, 0),
            facing: Facing::default(),
            base_max_hp: START_MAX_HP,
            current_hp: START_MAX_HP,
            attack: START_ATTACK,
            defence: START_DEFENCE,
            agility: START_AGILITY,
            inventory: Inventory::default(),
        }
    }

    /// Step one tile towards `facing`.
    pub fn step(&mut self, facing: Facing) -> Position {
        let (dx, dy) = facing.offset();
        self.facing = facing;
        self.position = self.position.offset(dx, dy);
        self.position
    }
}

/// Trimmed name, or [`DEFAULT_PLAYER_NAME`] if nothing is left.
pub fn correct_name(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        DEFAULT_PLAYER_NAME.to_string()
    } else {
        name.to_string()
    }
}

/// 2.0 stored the item list directly under "inventory".
fn wrap_inventory(json: &mut JsonMap) {
    let items = json.remove("inventory").unwrap_or(Value::Array(Vec::new()));
    let mut inventory = JsonMap::new();
    inventory.insert("items".into(), items);
    json.insert("inventory".into(), Value::Object(inventory));
}

impl JsonConvertable for Player {
    const TYPE_NAME: &'static str = "player";
    type Context<'a> = ();

    fn version_correcters() -> &'static [VersionCorrecter] {
        const CORRECTERS: &[VersionCorrecter] = &[VersionCorrecter::new("2.0.1", wrap_inventory)];
        CORRECTERS
    }

    fn to_json(&self) -> JsonMap {
        let mut json = JsonMap::new();
        json.insert("name".into(), Value::from(self.name.clone()));
        json.insert("xPos".into(), Value::from(self.position.x));
        json.insert("yPos".into(), Value::from(self.position.y));
        json.insert(
            "facing".into(),
            serde_json::to_value(self.facing).unwrap_or(Value::Null),
        );
        json.insert("baseMaxHp".into(), Value::from(self.base_max_hp));
        json.insert("currentHp".into(), Value::from(self.current_hp));
        json.insert("attack".into(), Value::from(self.attack));
        json.insert("defence".into(), Value::from(self.defence));
        json.insert("agility".into(), Value::from(self.agility));
        json.insert(
            "inventory".into(),
            serde_json::to_value(&self.inventory).unwrap_or(Value::Null),
        );
        json
    }

    fn from_json_without_correction(
        json: &JsonMap,
        _file_version: &SaveVersion,
        _ctx: (),
    ) -> Result<Parsed<Self>, JsonError> {
        let name: String = required(json, Self::TYPE_NAME, "name")?;
        let mut player = Player::new(&name);
        let mut complete = true;

        let mut field = |key: &str, target: &mut i64| match optional::<i64>(json, Self::TYPE_NAME, key) {
            Some(value) => *target = value,
            None => {
                warn!(player = %name, "Player parse error: missing \"{key}\", using default");
                complete = false;
            }
        };
        field("xPos", &mut player.position.x);
        field("yPos", &mut player.position.y);
        field("baseMaxHp", &mut player.base_max_hp);
        field("currentHp", &mut player.current_hp);
        field("attack", &mut player.attack);
        field("defence", &mut player.defence);
        field("agility", &mut player.agility);

        match optional::<Facing>(json, Self::TYPE_NAME, "facing") {
            Some(facing) => player.facing = facing,
            None => {
                warn!("Player parse error: missing \"facing\", using default");
                complete = false;
            }
        }
        match optional::<Inventory>(json, Self::TYPE_NAME, "inventory") {
            Some(inventory) => player.inventory = inventory,
            None => {
                warn!("Player parse error: missing \"inventory\", starting empty");
                complete = false;
            }
        }

        Ok(Parsed::with_complete(player, complete))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> JsonMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn new_player_has_starting_stats() {
        let player = Player::new("  Ann ");
        assert_eq!(player.name, "Ann");
        assert_eq!(player.base_max_hp, 20);
        assert_eq!(player.current_hp, 20);
        assert_eq!((player.attack, player.defence, player.agility), (10, 10, 10));
        assert_eq!(Player::new("   ").name, DEFAULT_PLAYER_NAME);
    }

    #[test]
    fn json_roundtrip() {
        let mut player = Player::new("Bob");
        player.step(Facing::East);
        player.inventory.add("wood", 3);
        player.inventory.add("wood", 2);
        let parsed = Player::from_json(Some(player.to_json()), &SaveVersion::current(), ()).unwrap();
        assert!(parsed.complete);
        assert_eq!(parsed.value, player);
        assert_eq!(parsed.value.inventory.items[0].amount, 5);
    }

    #[test]
    fn old_inventory_list_is_wrapped() {
        let json = obj(json!({
            "name": "Old", "xPos": 1, "yPos": -1, "facing": "west",
            "baseMaxHp": 25, "currentHp": 3, "attack": 1, "defence": 2, "agility": 3,
            "inventory": [{"type": "stone", "amount": 4}]
        }));
        let parsed = Player::from_json(Some(json), &SaveVersion::oldest(), ()).unwrap();
        assert!(parsed.complete);
        assert_eq!(parsed.value.facing, Facing::West);
        assert_eq!(
            parsed.value.inventory.items,
            vec![Item { kind: "stone".into(), amount: 4 }]
        );
    }

    #[test]
    fn missing_fields_default() {
        let parsed = Player::from_json(Some(obj(json!({"name": "Min"}))), &SaveVersion::current(), ()).unwrap();
        assert!(!parsed.complete);
        assert_eq!(parsed.value, Player::new("Min"));
    }

    #[test]
    fn missing_name_fails() {
        assert!(Player::from_json(Some(obj(json!({"xPos": 0}))), &SaveVersion::current(), ()).is_err());
    }
}
