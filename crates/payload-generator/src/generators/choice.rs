//! Random selection among literal template values.

use rand::seq::IndexedRandom;
use rand::Rng;
use serde_json::Value as JsonValue;

/// Pick one of `choices` uniformly, or `None` when there is nothing to pick.
pub fn one_of<'a, R: Rng + ?Sized>(rng: &mut R, choices: &'a [JsonValue]) -> Option<&'a JsonValue> {
    choices.choose(rng)
}

/// Render a literal template value as payload text.
///
/// Strings are emitted without quotes; everything else uses its JSON form.
pub fn json_to_text(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
