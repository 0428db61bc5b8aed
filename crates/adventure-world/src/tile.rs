//! Single grid cells and their three content layers.

use adventure_json::fields::{optional, required, required_object};
use adventure_json::{JsonConvertable, JsonError, JsonMap, Parsed, SaveVersion, VersionCorrecter};
use serde_json::Value;
use tracing::warn;

use crate::content::{ContentLayer, Population, Structure, Terrain};
use crate::position::{Position, TileKey};
use crate::random::RandomStream;

const CONTENT_KEY: &str = "content";

/// One cell of the world grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub absolute_position: Position,
    pub relative_position: TileKey,
    pub visited: u64,
    pub terrain: Terrain,
    pub structure: Structure,
    pub population: Population,
}

impl Tile {
    /// Draw the three content layers, terrain first.
    pub fn generate(position: Position, random: &mut RandomStream) -> Self {
        let terrain = Terrain::generate(random);
        let structure = Structure::generate(random);
        let population = Population::generate(random);
        Self {
            absolute_position: position,
            relative_position: position.relative(),
            visited: 0,
            terrain,
            structure,
            population,
        }
    }

    /// Record a visit and collect each layer's text.
    pub fn visit(&mut self, visitor: &str) -> Vec<String> {
        self.visited += 1;
        let first_visit = self.visited == 1;
        [
            self.terrain.visit(visitor, first_visit),
            self.structure.visit(visitor, first_visit),
            self.population.visit(visitor, first_visit),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// Files older than 2.1 kept the layers at the top level.
fn nest_content(json: &mut JsonMap) {
    if json.contains_key(CONTENT_KEY) {
        return;
    }
    let mut content = JsonMap::new();
    for layer in ContentLayer::ALL {
        if let Some(value) = json.remove(layer.id()) {
            content.insert(layer.id().to_string(), value);
        }
    }
    json.insert(CONTENT_KEY.to_string(), Value::Object(content));
}

impl JsonConvertable for Tile {
    const TYPE_NAME: &'static str = "tile";
    type Context<'a> = ();

    fn version_correcters() -> &'static [VersionCorrecter] {
        const CORRECTERS: &[VersionCorrecter] = &[VersionCorrecter::new("2.1", nest_content)];
        CORRECTERS
    }

    fn to_json(&self) -> JsonMap {
        let mut content = JsonMap::new();
        content.insert(ContentLayer::Terrain.id().into(), Value::Object(self.terrain.to_json()));
        content.insert(ContentLayer::Structure.id().into(), Value::Object(self.structure.to_json()));
        content.insert(ContentLayer::Population.id().into(), Value::Object(self.population.to_json()));

        let mut json = JsonMap::new();
        json.insert("xPos".into(), Value::from(self.absolute_position.x));
        json.insert("yPos".into(), Value::from(self.absolute_position.y));
        json.insert("visited".into(), Value::from(self.visited));
        json.insert(CONTENT_KEY.into(), Value::Object(content));
        json
    }

    fn from_json_without_correction(
        json: &JsonMap,
        file_version: &SaveVersion,
        _ctx: (),
    ) -> Result<Parsed<Self>, JsonError> {
        let x: i64 = required(json, Self::TYPE_NAME, "xPos")?;
        let y: i64 = required(json, Self::TYPE_NAME, "yPos")?;
        let position = Position::new(x, y);
        let mut complete = true;

        let visited = match optional::<u64>(json, Self::TYPE_NAME, "visited") {
            Some(visited) => visited,
            None => {
                warn!(%position, "Tile parse error: missing \"visited\", assuming 0");
                complete = false;
                0
            }
        };

        let content = required_object(json, Self::TYPE_NAME, CONTENT_KEY)?;
        let terrain = Terrain::from_json_value(content.get(ContentLayer::Terrain.id()), file_version, ())?;
        let structure = Structure::from_json_value(content.get(ContentLayer::Structure.id()), file_version, ())?;
        let population = Population::from_json_value(content.get(ContentLayer::Population.id()), file_version, ())?;
        complete &= terrain.complete && structure.complete && population.complete;

        Ok(Parsed::with_complete(
            Self {
                absolute_position: position,
                relative_position: position.relative(),
                visited,
                terrain: terrain.value,
                structure: structure.value,
                population: population.value,
            },
            complete,
        ))
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
    fn generate_sets_positions() {
        let mut random = RandomStream::from_seed(1);
        let tile = Tile::generate(Position::new(-3, 14), &mut random);
        assert_eq!(tile.relative_position, TileKey { x: 7, y: 4 });
        assert_eq!(tile.visited, 0);
    }

    #[test]
    fn layers_are_drawn_in_order() {
        let mut a = RandomStream::from_seed(2);
        let mut b = RandomStream::from_seed(2);
        let tile = Tile::generate(Position::new(0, 0), &mut a);
        assert_eq!(tile.terrain, Terrain::generate(&mut b));
        assert_eq!(tile.structure, Structure::generate(&mut b));
        assert_eq!(tile.population, Population::generate(&mut b));
        assert_eq!(a, b);
    }

    #[test]
    fn visit_counts() {
        let mut tile = Tile::generate(Position::new(5, 5), &mut RandomStream::from_seed(3));
        let texts = tile.visit("Bob");
        assert!(!texts.is_empty());
        assert!(texts[0].starts_with("Bob"));
        tile.visit("Bob");
        assert_eq!(tile.visited, 2);
    }

    #[test]
    fn json_roundtrip() {
        let mut tile = Tile::generate(Position::new(12, -8), &mut RandomStream::from_seed(4));
        tile.visit("Ann");
        let parsed = Tile::from_json(Some(tile.to_json()), &SaveVersion::current(), ()).unwrap();
        assert!(parsed.complete);
        assert_eq!(parsed.value, tile);
    }

    #[test]
    fn old_flat_layout_is_nested() {
        let json = obj(json!({
            "xPos": 1, "yPos": 2, "visited": 3,
            "terrain": {"type": "terrain", "subtype": "field"},
            "structure": {"type": "structure", "subtype": "none"},
            "population": {"type": "population", "subtype": "human", "amount": 4}
        }));
        let parsed = Tile::from_json(Some(json), &SaveVersion::oldest(), ()).unwrap();
        assert!(parsed.complete);
        assert_eq!(parsed.value.visited, 3);
        assert_eq!(parsed.value.population.data.get("amount"), Some(&json!(4)));
    }

    #[test]
    fn missing_visited_is_partial() {
        let mut json = Tile::generate(Position::new(0, 0), &mut RandomStream::from_seed(5)).to_json();
        json.remove("visited");
        let parsed = Tile::from_json(Some(json), &SaveVersion::current(), ()).unwrap();
        assert!(!parsed.complete);
        assert_eq!(parsed.value.visited, 0);
    }

    #[test]
    fn missing_position_or_layer_fails() {
        let tile = Tile::generate(Position::new(0, 0), &mut RandomStream::from_seed(6));

        let mut json = tile.to_json();
        json.remove("xPos");
        assert!(Tile::from_json(Some(json), &SaveVersion::current(), ()).is_err());

        let mut json = tile.to_json();
        if let Some(Value::Object(content)) = json.get_mut("content") {
            content.remove("structure");
        }
        assert!(matches!(
            Tile::from_json(Some(json), &SaveVersion::current(), ()),
            Err(JsonError::MissingDocument { type_name: "structure" })
        ));
    }
}
