//! Tile content layers.
//!
//! Every tile carries one piece of content per layer. Each layer is a closed
//! set of subtypes with a fixed weighted table; generation picks a subtype
//! from the table and then draws any subtype-specific data from the same
//! stream.

use std::fmt;

use adventure_json::fields::{optional, required};
use adventure_json::{JsonConvertable, JsonError, JsonMap, Parsed, SaveVersion, VersionCorrecter};
use serde_json::Value;
use tracing::warn;

use crate::random::RandomStream;

const TYPE_KEY: &str = "type";
const SUBTYPE_KEY: &str = "subtype";
const NAME_KEY: &str = "name";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContentLayer {
    Terrain,
    Structure,
    Population,
}

impl ContentLayer {
    pub const ALL: [ContentLayer; 3] = [Self::Terrain, Self::Structure, Self::Population];

    pub const fn id(self) -> &'static str {
        match self {
            Self::Terrain => "terrain",
            Self::Structure => "structure",
            Self::Population => "population",
        }
    }
}

impl fmt::Display for ContentLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A subtype of one content layer.
pub trait ContentKind: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    const LAYER: ContentLayer;

    /// Every subtype with its generation weight.
    const TABLE: &'static [(Self, u32)];

    fn id(self) -> &'static str;

    fn display_name(self) -> &'static str;

    fn from_id(id: &str) -> Option<Self> {
        Self::TABLE
            .iter()
            .map(|&(kind, _)| kind)
            .find(|kind| kind.id() == id)
    }

    /// Subtype-specific data drawn right after the subtype itself.
    fn generate_data(self, _random: &mut RandomStream) -> JsonMap {
        JsonMap::new()
    }

    /// Optional proper name, drawn after the data.
    fn generate_name(self, _random: &mut RandomStream) -> Option<String> {
        None
    }

    /// Text shown when `visitor` steps onto the tile. `first_visit` is true
    /// exactly once per tile; first-visit effects update `data` in place.
    fn visit(self, visitor: &str, name: Option<&str>, data: &mut JsonMap, first_visit: bool) -> Option<String>;
}

fn data_u64(data: &JsonMap, key: &str) -> u64 {
    data.get(key).and_then(Value::as_u64).unwrap_or(0)
}

fn draw(data: &mut JsonMap, key: &str, random: &mut RandomStream, range: std::ops::RangeInclusive<u64>) {
    data.insert(key.to_string(), Value::from(random.gen_range(range)));
}

const NAME_HEADS: &[&str] = &["Ash", "Bel", "Cor", "Dun", "El", "Fen", "Gal", "Hol", "Ir", "Kel", "Mor", "Thal"];
const NAME_TAILS: &[&str] = &["ford", "wick", "holm", "dale", "mere", "stead", "gard", "ton"];

fn place_name(random: &mut RandomStream) -> String {
    let head = NAME_HEADS[random.gen_range(0..NAME_HEADS.len())];
    let tail = NAME_TAILS[random.gen_range(0..NAME_TAILS.len())];
    format!("{head}{tail}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerrainKind {
    Field,
    Mountain,
    Ocean,
    Shore,
}

impl ContentKind for TerrainKind {
    const LAYER: ContentLayer = ContentLayer::Terrain;
    const TABLE: &'static [(Self, u32)] = &[
        (Self::Field, 10),
        (Self::Mountain, 3),
        (Self::Ocean, 2),
        (Self::Shore, 2),
    ];

    fn id(self) -> &'static str {
        match self {
            Self::Field => "field",
            Self::Mountain => "mountain",
            Self::Ocean => "ocean",
            Self::Shore => "shore",
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            Self::Field => "Field",
            Self::Mountain => "Mountain",
            Self::Ocean => "Ocean",
            Self::Shore => "Shore",
        }
    }

    fn generate_data(self, random: &mut RandomStream) -> JsonMap {
        let mut data = JsonMap::new();
        match self {
            Self::Mountain => draw(&mut data, "height", random, 500..=10_000),
            Self::Ocean => draw(&mut data, "depth", random, 10..=5_000),
            Self::Field | Self::Shore => {}
        }
        data
    }

    fn visit(self, visitor: &str, _name: Option<&str>, data: &mut JsonMap, _first_visit: bool) -> Option<String> {
        Some(match self {
            Self::Field => format!("{visitor} entered a field."),
            Self::Mountain => format!(
                "{visitor} climbed a mountain {}m tall.",
                data_u64(data, "height")
            ),
            Self::Ocean => format!("{visitor} swam in an ocean {}m deep.", data_u64(data, "depth")),
            Self::Shore => format!("{visitor} walked along the shore."),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructureKind {
    None,
    BanditCamp,
    Village,
    Kingdom,
}

impl ContentKind for StructureKind {
    const LAYER: ContentLayer = ContentLayer::Structure;
    const TABLE: &'static [(Self, u32)] = &[
        (Self::None, 16),
        (Self::BanditCamp, 2),
        (Self::Village, 3),
        (Self::Kingdom, 1),
    ];

    fn id(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::BanditCamp => "bandit_camp",
            Self::Village => "village",
            Self::Kingdom => "kingdom",
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            Self::None => "Nothing",
            Self::BanditCamp => "Bandit camp",
            Self::Village => "Village",
            Self::Kingdom => "Kingdom",
        }
    }

    fn generate_data(self, random: &mut RandomStream) -> JsonMap {
        let mut data = JsonMap::new();
        match self {
            Self::None => {}
            Self::BanditCamp => draw(&mut data, "population", random, 10..=60),
            Self::Village => draw(&mut data, "population", random, 50..=800),
            Self::Kingdom => draw(&mut data, "population", random, 1_000..=20_000),
        }
        data
    }

    fn generate_name(self, random: &mut RandomStream) -> Option<String> {
        match self {
            Self::Village | Self::Kingdom => Some(place_name(random)),
            Self::None | Self::BanditCamp => None,
        }
    }

    fn visit(self, visitor: &str, name: Option<&str>, data: &mut JsonMap, _first_visit: bool) -> Option<String> {
        let population = data_u64(data, "population");
        let name = name.unwrap_or("an unnamed place");
        match self {
            Self::None => None,
            Self::BanditCamp => Some(format!(
                "{visitor} stumbled upon a bandit camp of {population}."
            )),
            Self::Village => Some(format!(
                "{visitor} arrived at the village of {name}, home to {population}."
            )),
            Self::Kingdom => Some(format!(
                "{visitor} entered the kingdom of {name}, ruling over {population}."
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PopulationKind {
    None,
    Human,
    Elf,
    Dwarf,
    Demon,
}

impl ContentKind for PopulationKind {
    const LAYER: ContentLayer = ContentLayer::Population;
    const TABLE: &'static [(Self, u32)] = &[
        (Self::None, 12),
        (Self::Human, 6),
        (Self::Elf, 2),
        (Self::Dwarf, 2),
        (Self::Demon, 1),
    ];

    fn id(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Human => "human",
            Self::Elf => "elf",
            Self::Dwarf => "dwarf",
            Self::Demon => "demon",
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            Self::None => "Nobody",
            Self::Human => "Humans",
            Self::Elf => "Elves",
            Self::Dwarf => "Dwarves",
            Self::Demon => "Demons",
        }
    }

    fn generate_data(self, random: &mut RandomStream) -> JsonMap {
        let mut data = JsonMap::new();
        if self != Self::None {
            draw(&mut data, "amount", random, 1..=200);
        }
        data
    }

    fn visit(self, visitor: &str, _name: Option<&str>, data: &mut JsonMap, first_visit: bool) -> Option<String> {
        if self == Self::None {
            return None;
        }
        let amount = data_u64(data, "amount");
        let group = self.display_name().to_lowercase();
        if first_visit {
            data.insert("met".to_string(), Value::Bool(true));
            Some(format!("{visitor} met {amount} {group} for the first time."))
        } else {
            Some(format!("{visitor} passed by {amount} {group}."))
        }
    }
}

/// One layer of a tile's content.
#[derive(Debug, Clone, PartialEq)]
pub struct Content<K: ContentKind> {
    pub subtype: K,
    pub name: Option<String>,
    pub data: JsonMap,
}

impl<K: ContentKind> Content<K> {
    pub fn new(subtype: K) -> Self {
        Self {
            subtype,
            name: None,
            data: JsonMap::new(),
        }
    }

    /// Pick a subtype from the layer's table, then its data and name.
    pub fn generate(random: &mut RandomStream) -> Self {
        let weights: Vec<u32> = K::TABLE.iter().map(|&(_, weight)| weight).collect();
        let subtype = K::TABLE[random.weighted_index(&weights)].0;
        let data = subtype.generate_data(random);
        let name = subtype.generate_name(random);
        Self { subtype, name, data }
    }

    pub fn subtype_id(&self) -> &'static str {
        self.subtype.id()
    }

    pub fn visit(&mut self, visitor: &str, first_visit: bool) -> Option<String> {
        self.subtype
            .visit(visitor, self.name.as_deref(), &mut self.data, first_visit)
    }
}

/// Lower-case legacy `UPPER_CASE` subtype ids.
fn lowercase_subtype(json: &mut JsonMap) {
    if let Some(Value::String(id)) = json.get_mut(SUBTYPE_KEY) {
        *id = id.to_lowercase();
    }
}

const CONTENT_CORRECTERS: &[VersionCorrecter] = &[VersionCorrecter::new("2.2", lowercase_subtype)];

impl<K: ContentKind> JsonConvertable for Content<K> {
    const TYPE_NAME: &'static str = K::LAYER.id();
    type Context<'a> = ();

    fn version_correcters() -> &'static [VersionCorrecter] {
        CONTENT_CORRECTERS
    }

    fn to_json(&self) -> JsonMap {
        let mut json = JsonMap::new();
        json.insert(TYPE_KEY.into(), Value::from(K::LAYER.id()));
        json.insert(SUBTYPE_KEY.into(), Value::from(self.subtype.id()));
        if let Some(name) = &self.name {
            json.insert(NAME_KEY.into(), Value::from(name.clone()));
        }
        for (key, value) in &self.data {
            json.entry(key.clone()).or_insert_with(|| value.clone());
        }
        json
    }

    fn from_json_without_correction(
        json: &JsonMap,
        _file_version: &SaveVersion,
        _ctx: (),
    ) -> Result<Parsed<Self>, JsonError> {
        let type_name = Self::TYPE_NAME;
        let id: String = required(json, type_name, SUBTYPE_KEY)?;
        let subtype = K::from_id(&id)
            .ok_or_else(|| JsonError::invalid(type_name, SUBTYPE_KEY, format!("unknown subtype {id:?}")))?;

        let mut complete = true;
        if let Some(layer) = optional::<String>(json, type_name, TYPE_KEY) {
            if layer != K::LAYER.id() {
                warn!(expected = K::LAYER.id(), found = %layer, "Content layer mismatch, ignoring stored type");
                complete = false;
            }
        }

        let name = optional::<String>(json, type_name, NAME_KEY);
        let data = json
            .iter()
            .filter(|(key, _)| !matches!(key.as_str(), TYPE_KEY | SUBTYPE_KEY | NAME_KEY))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(Parsed::with_complete(Self { subtype, name, data }, complete))
    }
}

pub type Terrain = Content<TerrainKind>;
pub type Structure = Content<StructureKind>;
pub type Population = Content<PopulationKind>;

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
    fn ids_are_unique_and_resolve() {
        fn check<K: ContentKind>() {
            let mut seen = std::collections::BTreeSet::new();
            for &(kind, weight) in K::TABLE {
                assert!(weight > 0);
                assert!(seen.insert(kind.id()), "duplicate id {}", kind.id());
                assert_eq!(K::from_id(kind.id()), Some(kind));
            }
        }
        check::<TerrainKind>();
        check::<StructureKind>();
        check::<PopulationKind>();
        assert_eq!(StructureKind::from_id("BANDIT_CAMP"), None);
    }

    #[test]
    fn generation_is_deterministic() {
        let mut a = RandomStream::from_seed(17);
        let mut b = RandomStream::from_seed(17);
        for _ in 0..50 {
            assert_eq!(Structure::generate(&mut a), Structure::generate(&mut b));
        }
    }

    #[test]
    fn generated_data_matches_subtype() {
        let mut random = RandomStream::from_seed(4);
        for _ in 0..300 {
            let terrain = Terrain::generate(&mut random);
            match terrain.subtype {
                TerrainKind::Mountain => assert!(terrain.data.contains_key("height")),
                TerrainKind::Ocean => assert!(terrain.data.contains_key("depth")),
                _ => assert!(terrain.data.is_empty()),
            }
            let structure = Structure::generate(&mut random);
            assert_eq!(
                structure.name.is_some(),
                matches!(structure.subtype, StructureKind::Village | StructureKind::Kingdom)
            );
        }
    }

    #[test]
    fn json_shape() {
        let content = Structure {
            subtype: StructureKind::Village,
            name: Some("Belford".into()),
            data: obj(json!({"population": 120})),
        };
        assert_eq!(
            Value::Object(content.to_json()),
            json!({"type": "structure", "subtype": "village", "name": "Belford", "population": 120})
        );
        let parsed = Structure::from_json(Some(content.to_json()), &SaveVersion::current(), ()).unwrap();
        assert!(parsed.complete);
        assert_eq!(parsed.value, content);
    }

    #[test]
    fn legacy_upper_case_ids_are_corrected() {
        let json = obj(json!({"type": "structure", "subtype": "BANDIT_CAMP", "population": 30}));
        let parsed = Structure::from_json(Some(json), &SaveVersion::parse("2.1").unwrap(), ()).unwrap();
        assert_eq!(parsed.value.subtype, StructureKind::BanditCamp);
        assert_eq!(parsed.value.data.get("population"), Some(&json!(30)));
    }

    #[test]
    fn unknown_subtype_fails() {
        let json = obj(json!({"type": "terrain", "subtype": "volcano"}));
        assert!(matches!(
            Terrain::from_json(Some(json), &SaveVersion::current(), ()),
            Err(JsonError::InvalidField { .. })
        ));
        let json = obj(json!({"type": "terrain"}));
        assert!(matches!(
            Terrain::from_json(Some(json), &SaveVersion::current(), ()),
            Err(JsonError::MissingField { .. })
        ));
    }

    #[test]
    fn population_first_visit_marks_met() {
        let mut population = Population {
            subtype: PopulationKind::Elf,
            name: None,
            data: obj(json!({"amount": 7})),
        };
        let first = population.visit("Ann", true).unwrap();
        assert!(first.contains("7 elves"));
        assert_eq!(population.data.get("met"), Some(&json!(true)));

        let again = population.visit("Ann", false).unwrap();
        assert!(again.contains("passed by"));
        assert!(Population::new(PopulationKind::None).visit("Ann", true).is_none());
    }
}
