use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

use crate::models::{IngredientDetail, Recipe, RecipeEntry};

const DELIMITER: char = '|';
const NO_EFFECT: &str = "none";

// Canonical identity of a cook request inside the dish store
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    // Short hash of the key for log lines and headers; keys themselves can be long
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        let full = format!("{:x}", hasher.finalize());
        full[..12].to_string()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.0
    }
}

// degraded: a nested recipe had no canonical order and kept the client's order,
// so the same lineage sent in another order can land on another key
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyDerivation {
    pub key: CacheKey,
    pub degraded: bool,
}

// "ingredients|method|effect", ingredient blob = JSON records sorted by name.
// Fields are trimmed and lower-cased; each segment is escaped so a literal '|' can't
// pass for the delimiter.
pub fn derive_key(
    ingredients: &[IngredientDetail],
    method: &str,
    method_effect: Option<&str>,
) -> KeyDerivation {
    let mut degraded = false;

    let mut records: Vec<(String, String)> = ingredients
        .iter()
        .map(|ing| {
            let (record, unordered) = canonical_ingredient(ing);
            degraded |= unordered;
            let name = normalize(&ing.name);
            (name, serialize(&record))
        })
        .collect();
    records.sort();

    let blob = format!(
        "[{}]",
        records
            .into_iter()
            .map(|(_, json)| json)
            .collect::<Vec<_>>()
            .join(",")
    );

    let method = normalize(method);
    let effect = normalize_effect(method_effect);

    let key = [blob, method, effect]
        .iter()
        .map(|segment| escape_segment(segment))
        .collect::<Vec<_>>()
        .join(&DELIMITER.to_string());

    KeyDerivation {
        key: CacheKey(key),
        degraded,
    }
}

pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

// A blank tag is the same as no tag
fn normalize_tag(tag: Option<&str>) -> Option<String> {
    tag.map(normalize).filter(|t| !t.is_empty())
}

fn normalize_effect(effect: Option<&str>) -> String {
    match effect.map(normalize) {
        Some(e) if !e.is_empty() => e,
        _ => NO_EFFECT.to_string(),
    }
}

// 500.0 -> "500"; f64 Display is shortest round-trip and never uses exponents
pub fn canonical_quantity(quantity: f64) -> String {
    format!("{quantity}")
}

fn escape_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for c in segment.chars() {
        if c == '\\' || c == DELIMITER {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// BTreeMap keeps record keys sorted no matter how serde_json is configured
fn canonical_ingredient(ing: &IngredientDetail) -> (BTreeMap<&'static str, Value>, bool) {
    let mut record = BTreeMap::new();
    record.insert("name", Value::String(normalize(&ing.name)));
    record.insert("quantity", Value::String(canonical_quantity(ing.quantity)));
    record.insert("unit", Value::String(normalize(&ing.unit)));
    if let Some(tag) = normalize_tag(ing.tag.as_deref()) {
        record.insert("tag", Value::String(tag));
    }

    let mut degraded = false;
    if let Some(recipe) = &ing.recipe {
        let (value, unordered) = canonical_recipe(recipe);
        if unordered {
            warn!(
                ingredient = %ing.name,
                "recipe lineage has entries with no canonical order; keeping client order"
            );
        }
        degraded = unordered;
        record.insert("recipe", value);
    }
    (record, degraded)
}

fn canonical_recipe(recipe: &Recipe) -> (Value, bool) {
    let mut entries: Vec<&RecipeEntry> = recipe.ingredients.iter().collect();

    let orderable = entries
        .iter()
        .all(|e| e.quantity.is_none_or(|q| q.is_finite()));
    if orderable {
        entries.sort_by(|a, b| compare_entries(a, b));
    }

    let ingredients = entries.into_iter().map(canonical_entry).collect();

    let mut map = Map::new();
    map.insert("ingredients".into(), Value::Array(ingredients));
    map.insert("method".into(), Value::String(normalize(&recipe.method)));
    map.insert(
        "method_effect".into(),
        Value::String(normalize_effect(recipe.method_effect.as_deref())),
    );
    (Value::Object(map), !orderable)
}

fn compare_entries(a: &RecipeEntry, b: &RecipeEntry) -> Ordering {
    normalize(&a.name)
        .cmp(&normalize(&b.name))
        .then_with(|| {
            let (qa, qb) = (a.quantity.unwrap_or(0.0), b.quantity.unwrap_or(0.0));
            qa.partial_cmp(&qb).unwrap_or(Ordering::Equal)
        })
        .then_with(|| a.quantity.is_some().cmp(&b.quantity.is_some()))
        .then_with(|| a.unit.as_deref().map(normalize).cmp(&b.unit.as_deref().map(normalize)))
        .then_with(|| normalize_tag(a.tag.as_deref()).cmp(&normalize_tag(b.tag.as_deref())))
        .then_with(|| serialize(&canonical_extra(&a.extra)).cmp(&serialize(&canonical_extra(&b.extra))))
}

fn canonical_entry(entry: &RecipeEntry) -> Value {
    let mut record: BTreeMap<String, Value> = canonical_extra(&entry.extra);
    record.insert("name".into(), Value::String(normalize(&entry.name)));
    if let Some(q) = entry.quantity {
        record.insert("quantity".into(), Value::String(canonical_quantity(q)));
    }
    if let Some(unit) = &entry.unit {
        record.insert("unit".into(), Value::String(normalize(unit)));
    }
    if let Some(tag) = normalize_tag(entry.tag.as_deref()) {
        record.insert("tag".into(), Value::String(tag));
    }
    sorted_object(record)
}

fn canonical_extra(extra: &BTreeMap<String, Value>) -> BTreeMap<String, Value> {
    extra
        .iter()
        .map(|(k, v)| (k.clone(), canonical_value(v)))
        .collect()
}

// Rebuild nested objects with keys inserted in sorted order
fn canonical_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), canonical_value(v)))
                .collect();
            sorted_object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical_value).collect()),
        other => other.clone(),
    }
}

fn sorted_object(sorted: BTreeMap<String, Value>) -> Value {
    Value::Object(sorted.into_iter().collect::<Map<String, Value>>())
}

fn serialize<T: serde::Serialize>(value: &T) -> String {
    // Maps with string keys and JSON values always serialize
    serde_json::to_string(value).unwrap_or_default()
}
