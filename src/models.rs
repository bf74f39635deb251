use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// Where an ingredient came from: raw pantry item or the result of an earlier cook
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IngredientKind {
    #[default]
    Base,
    Derived,
}

// One ingredient that went into a derived ingredient's own recipe.
// Unknown keys sent by clients are kept so they still take part in the key.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct RecipeEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

// Lineage of a derived ingredient: what it was cooked from and how
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct Recipe {
    #[serde(default)]
    pub ingredients: Vec<RecipeEntry>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_effect: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct IngredientDetail {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    #[serde(rename = "type", default)]
    pub kind: IngredientKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe: Option<Recipe>,
}

#[cfg(test)]
impl IngredientDetail {
    pub fn new(name: impl Into<String>, quantity: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit: unit.into(),
            kind: IngredientKind::Base,
            tag: None,
            recipe: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_recipe(mut self, recipe: Recipe) -> Self {
        self.kind = IngredientKind::Derived;
        self.recipe = Some(recipe);
        self
    }
}

// Inbound /cook payload
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct CookRequest {
    #[serde(default)]
    pub ingredients: Vec<IngredientDetail>,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub method_effect: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quality {
    Poor,
    Decent,
    Good,
    Excellent,
    Dubious,
}

impl Quality {
    pub const ALL: [Quality; 5] = [
        Quality::Poor,
        Quality::Decent,
        Quality::Good,
        Quality::Excellent,
        Quality::Dubious,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Poor => "Poor",
            Quality::Decent => "Decent",
            Quality::Good => "Good",
            Quality::Excellent => "Excellent",
            Quality::Dubious => "Dubious",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Quality::ALL
            .into_iter()
            .find(|q| q.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown quality: {s}"))
    }
}

// Result of a cook, as stored in the cache and returned to the client
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Dish {
    pub name: String,
    #[serde(default)]
    pub modifier: Option<String>,
    pub description: String,
    pub quality: Quality,
    #[serde(default)]
    pub rationale: Option<String>,
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub protein: Option<f64>,
    #[serde(default)]
    pub fat: Option<f64>,
    #[serde(default)]
    pub carbohydrates: Option<f64>,
    #[serde(default)]
    pub is_new_discovery: bool,
}

// /cook reply
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct CookResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dish: Option<Dish>,
}

impl CookResponse {
    pub fn cooked(dish: Dish) -> Self {
        Self {
            success: true,
            message: None,
            dish: Some(dish),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            dish: None,
        }
    }
}
