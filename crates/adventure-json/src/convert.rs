//! Version correction chain and the [`JsonConvertable`] contract.

use tracing::{debug, error};

use crate::error::JsonError;
use crate::version::SaveVersion;
use crate::JsonMap;

/// One migration step: reshapes a raw document written before `target` into
/// the layout `target` expects.
///
/// Steps only reshape data and never fail. If a document cannot be made
/// valid, the structured build that runs afterwards reports it.
#[derive(Debug, Clone, Copy)]
pub struct VersionCorrecter {
    pub target: &'static str,
    pub correct: fn(&mut JsonMap),
}

impl VersionCorrecter {
    pub const fn new(target: &'static str, correct: fn(&mut JsonMap)) -> Self {
        Self { target, correct }
    }
}

/// Bring `json` from `file_version` up to the current version in place.
///
/// Runs every correcter whose target is newer than `file_version` and not
/// newer than the current version, in ascending target order. Returns the
/// number of steps applied. A document already at the current version is
/// left untouched.
pub fn correct_json_data(
    type_name: &str,
    json: &mut JsonMap,
    correcters: &[VersionCorrecter],
    file_version: &SaveVersion,
) -> usize {
    let current = SaveVersion::current();
    let mut pending: Vec<(SaveVersion, &VersionCorrecter)> = correcters
        .iter()
        .map(|step| (SaveVersion::from_static(step.target), step))
        .filter(|(target, _)| target > file_version && *target <= current)
        .collect();
    // Stable: steps declared for the same target keep their declared order.
    pending.sort_by(|a, b| a.0.cmp(&b.0));

    let mut from = file_version.clone();
    for (target, step) in &pending {
        (step.correct)(json);
        debug!(type_name, from = %from, to = %target, "Corrected json data");
        from = target.clone();
    }
    pending.len()
}

/// The result of a structured build.
///
/// `complete` is false when the document was accepted with warnings (fields
/// defaulted, entries skipped). Hard failures are returned as errors instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub value: T,
    pub complete: bool,
}

impl<T> Parsed<T> {
    pub fn complete(value: T) -> Self {
        Self {
            value,
            complete: true,
        }
    }

    pub fn with_complete(value: T, complete: bool) -> Self {
        Self { value, complete }
    }
}

/// A type persisted as a versioned JSON object.
pub trait JsonConvertable: Sized {
    /// Name used in diagnostics, e.g. `"tile"`.
    const TYPE_NAME: &'static str;

    /// What the build needs besides the document itself. `()` for most
    /// types; a chunk needs its position and the world it belongs to.
    type Context<'a>: Copy;

    /// Migration steps for this type, ordered by ascending target version.
    /// New versions are appended; existing steps are never edited.
    fn version_correcters() -> &'static [VersionCorrecter] {
        &[]
    }

    fn to_json(&self) -> JsonMap;

    /// Build the value from an already corrected document.
    fn from_json_without_correction(
        json: &JsonMap,
        file_version: &SaveVersion,
        ctx: Self::Context<'_>,
    ) -> Result<Parsed<Self>, JsonError>;

    /// Correct `json` from `file_version` to the current layout, then build.
    fn from_json(
        json: Option<JsonMap>,
        file_version: &SaveVersion,
        ctx: Self::Context<'_>,
    ) -> Result<Parsed<Self>, JsonError> {
        let Some(mut json) = json else {
            error!(type_name = Self::TYPE_NAME, "{} parse error: json is null", Self::TYPE_NAME);
            return Err(JsonError::MissingDocument {
                type_name: Self::TYPE_NAME,
            });
        };
        correct_json_data(Self::TYPE_NAME, &mut json, Self::version_correcters(), file_version);
        Self::from_json_without_correction(&json, file_version, ctx)
    }

    /// [`from_json`](Self::from_json) for a nested value that should be an object.
    fn from_json_value(
        value: Option<&serde_json::Value>,
        file_version: &SaveVersion,
        ctx: Self::Context<'_>,
    ) -> Result<Parsed<Self>, JsonError> {
        match value {
            None | Some(serde_json::Value::Null) => Self::from_json(None, file_version, ctx),
            Some(serde_json::Value::Object(map)) => Self::from_json(Some(map.clone()), file_version, ctx),
            Some(other) => Err(JsonError::invalid(
                Self::TYPE_NAME,
                "<root>",
                format!("expected an object, got {other}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn obj(value: Value) -> JsonMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    fn push_trail(json: &mut JsonMap, step: &str) {
        let trail = json
            .entry("trail")
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = trail {
            items.push(Value::from(step));
        }
    }

    const STEPS: &[VersionCorrecter] = &[
        VersionCorrecter::new("2.0.1", |json| push_trail(json, "2.0.1")),
        VersionCorrecter::new("2.1", |json| push_trail(json, "2.1")),
        VersionCorrecter::new("2.2", |json| push_trail(json, "2.2")),
        // Written by a newer build than this one: never applied.
        VersionCorrecter::new("9.0", |json| push_trail(json, "9.0")),
    ];

    fn trail(json: &JsonMap) -> Vec<String> {
        json.get("trail")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn current_version_is_a_no_op() {
        let original = obj(json!({"a": 1, "nested": {"b": [1, 2]}}));
        let mut doc = original.clone();
        let applied = correct_json_data("test", &mut doc, STEPS, &SaveVersion::current());
        assert_eq!(applied, 0);
        assert_eq!(doc, original);
    }

    #[test]
    fn only_newer_steps_run_in_order() {
        let mut doc = JsonMap::new();
        let applied = correct_json_data("test", &mut doc, STEPS, &SaveVersion::parse("2.0.1").unwrap());
        assert_eq!(applied, 2);
        assert_eq!(trail(&doc), ["2.1", "2.2"]);
    }

    #[test]
    fn oldest_version_runs_full_chain() {
        let mut doc = JsonMap::new();
        correct_json_data("test", &mut doc, STEPS, &SaveVersion::oldest());
        assert_eq!(trail(&doc), ["2.0.1", "2.1", "2.2"]);
    }

    #[test]
    fn declaration_order_does_not_matter() {
        const SHUFFLED: &[VersionCorrecter] = &[
            VersionCorrecter::new("2.2", |json| push_trail(json, "2.2")),
            VersionCorrecter::new("2.0.1", |json| push_trail(json, "2.0.1")),
            VersionCorrecter::new("2.1", |json| push_trail(json, "2.1")),
        ];
        let mut doc = JsonMap::new();
        correct_json_data("test", &mut doc, SHUFFLED, &SaveVersion::oldest());
        assert_eq!(trail(&doc), ["2.0.1", "2.1", "2.2"]);
    }

    #[test]
    fn newer_file_runs_nothing() {
        let mut doc = JsonMap::new();
        let applied = correct_json_data("test", &mut doc, STEPS, &SaveVersion::parse("3.0").unwrap());
        assert_eq!(applied, 0);
        assert!(trail(&doc).is_empty());
    }

    #[derive(Debug, PartialEq)]
    struct Named {
        name: String,
    }

    impl JsonConvertable for Named {
        const TYPE_NAME: &'static str = "named";
        type Context<'a> = ();

        fn version_correcters() -> &'static [VersionCorrecter] {
            const CORRECTERS: &[VersionCorrecter] = &[VersionCorrecter::new("2.1", |json| {
                if let Some(old) = json.remove("title") {
                    json.insert("name".into(), old);
                }
            })];
            CORRECTERS
        }

        fn to_json(&self) -> JsonMap {
            obj(json!({"name": self.name}))
        }

        fn from_json_without_correction(
            json: &JsonMap,
            _file_version: &SaveVersion,
            _ctx: (),
        ) -> Result<Parsed<Self>, JsonError> {
            let name = crate::fields::required::<String>(json, Self::TYPE_NAME, "name")?;
            Ok(Parsed::complete(Self { name }))
        }
    }

    #[test]
    fn from_json_corrects_before_building() {
        let old = obj(json!({"title": "Bob"}));
        let parsed = Named::from_json(Some(old), &SaveVersion::oldest(), ()).unwrap();
        assert_eq!(parsed.value.name, "Bob");
        assert!(parsed.complete);
    }

    #[test]
    fn from_json_missing_document_fails() {
        let err = Named::from_json(None, &SaveVersion::current(), ()).unwrap_err();
        assert!(matches!(err, JsonError::MissingDocument { type_name: "named" }));
    }

    #[test]
    fn from_json_value_rejects_non_objects() {
        let value = json!([1, 2, 3]);
        assert!(Named::from_json_value(Some(&value), &SaveVersion::current(), ()).is_err());
        let value = json!({"name": "Ann"});
        let parsed = Named::from_json_value(Some(&value), &SaveVersion::current(), ()).unwrap();
        assert_eq!(parsed.value, Named { name: "Ann".into() });
    }

    #[test]
    fn steps_already_applied_are_not_rerun() {
        // A 2.1 file already has "name"; the 2.1 step must not touch it.
        let doc = obj(json!({"name": "Keep", "title": "Stale"}));
        let parsed = Named::from_json(Some(doc), &SaveVersion::parse("2.1").unwrap(), ()).unwrap();
        assert_eq!(parsed.value.name, "Keep");
    }
}
