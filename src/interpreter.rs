// Reads the model's labelled reply into a Dish. A field runs from its label
// ("Name:", "**Quality:**", "Protein (g):", anywhere in a line) to the next
// label or the end of the reply; the first occurrence of a label wins.

use clap::ValueEnum;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::models::{Dish, Quality};

pub const PLACEHOLDER_NAME: &str = "Uncertain Result";
pub const UNAVAILABLE_NAME: &str = "Dubious Mess";

lazy_static! {
    static ref LABEL: Regex = Regex::new(
        r"\b(Name|Modifier|Description|Quality|Rationale|Calories|Protein|Fat|Carbohydrates|Carbs)(?:\s*\([^)\n]*\))?\s*\**\s*:"
    )
    .unwrap();
}

// What the generation service handed back
#[derive(Clone, Debug, PartialEq)]
pub enum Completion {
    Text(String),
    // safety filter, empty candidate list, ...
    Blocked { reason: String },
}

// Which set of labels the prompt asked for
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// Name, Modifier, Description, Quality
    Basic,
    /// Basic plus Rationale and macro estimates
    #[default]
    Extended,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
    Name,
    Modifier,
    Description,
    Quality,
    Rationale,
    Calories,
    Protein,
    Fat,
    Carbohydrates,
}

impl Field {
    fn from_label(label: &str) -> Option<Self> {
        let field = match label {
            "Name" => Field::Name,
            "Modifier" => Field::Modifier,
            "Description" => Field::Description,
            "Quality" => Field::Quality,
            "Rationale" => Field::Rationale,
            "Calories" => Field::Calories,
            "Protein" => Field::Protein,
            "Fat" => Field::Fat,
            "Carbohydrates" | "Carbs" => Field::Carbohydrates,
            _ => return None,
        };
        Some(field)
    }

    // Description and Rationale keep every line, the rest only their first
    fn is_multiline(self) -> bool {
        matches!(self, Field::Description | Field::Rationale)
    }
}

struct Section {
    field: Field,
    lines: Vec<String>,
}

impl Section {
    fn value(&self) -> String {
        let mut lines = self.lines.iter().map(|l| clean(l)).filter(|l| !l.is_empty());
        if self.field.is_multiline() {
            lines.collect::<Vec<_>>().join(" ")
        } else {
            lines.next().unwrap_or_default().to_string()
        }
    }
}

// Drop bullets and markdown emphasis left around a fragment
fn clean(fragment: &str) -> &str {
    let trimmed = fragment
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '*' | '#' | '•' | '>'));
    match trimmed.strip_prefix('-') {
        Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => {
            clean(rest)
        }
        _ => trimmed,
    }
}

fn sections(text: &str) -> Vec<Section> {
    let mut out: Vec<Section> = Vec::new();
    for line in text.lines() {
        let mut cursor = 0;
        for caps in LABEL.captures_iter(line) {
            let (Some(whole), Some(label)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let Some(field) = Field::from_label(label.as_str()) else {
                continue;
            };
            // text before the first label is preamble and is dropped
            if let Some(current) = out.last_mut() {
                current.lines.push(line[cursor..whole.start()].to_string());
            }
            out.push(Section {
                field,
                lines: Vec::new(),
            });
            cursor = whole.end();
        }
        if let Some(current) = out.last_mut() {
            current.lines.push(line[cursor..].to_string());
        }
    }
    out
}

fn first(sections: &[Section], field: Field) -> Option<String> {
    sections
        .iter()
        .find(|s| s.field == field)
        .map(Section::value)
        .filter(|v| !v.is_empty())
}

fn parse_quality(sections: &[Section]) -> Option<Quality> {
    sections
        .iter()
        .filter(|s| s.field == Field::Quality)
        .find_map(|s| {
            let value = s.value();
            let word = value
                .split(|c: char| !c.is_ascii_alphabetic())
                .find(|w| !w.is_empty())?;
            word.parse::<Quality>().ok()
        })
}

fn parse_modifier(raw: Option<String>) -> Option<String> {
    raw.filter(|m| !m.eq_ignore_ascii_case("none"))
}

// "approx. 250 kcal" -> 250; N/A and anything unreadable -> None (unknown, never zero)
pub fn parse_macro(raw: &str) -> Option<f64> {
    let mut value = raw.trim().trim_matches('*').trim().to_ascii_lowercase();

    if matches!(value.as_str(), "n/a" | "na" | "not applicable" | "none" | "unknown")
        || value.starts_with("n/a")
        || value.starts_with("not applicable")
    {
        return None;
    }

    loop {
        let stripped = ["approximately", "approx.", "approx", "about", "around", "~", "≈"]
            .iter()
            .find_map(|prefix| value.strip_prefix(prefix));
        match stripped {
            Some(rest) => value = rest.trim_start().to_string(),
            None => break,
        }
    }

    let number: String = value
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .filter(|c| *c != ',')
        .collect();
    let number = number.trim_end_matches('.');
    if number.is_empty() {
        return None;
    }
    number.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ResponseInterpreter {
    format: ResponseFormat,
}

impl ResponseInterpreter {
    pub fn new(format: ResponseFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> ResponseFormat {
        self.format
    }

    // None: nothing usable came back. Text missing required fields: placeholder.
    pub fn interpret(&self, completion: &Completion) -> Option<Dish> {
        let text = match completion {
            Completion::Blocked { reason } => {
                warn!(%reason, "generation returned no content");
                return None;
            }
            Completion::Text(text) if text.trim().is_empty() => {
                warn!("generation returned empty text");
                return None;
            }
            Completion::Text(text) => text,
        };

        match self.parse(text) {
            Some(dish) => {
                debug!(name = %dish.name, quality = %dish.quality, "parsed dish");
                Some(dish)
            }
            None => {
                warn!(raw = %text, "reply is missing required fields, using placeholder");
                Some(placeholder_dish())
            }
        }
    }

    fn parse(&self, text: &str) -> Option<Dish> {
        let sections = sections(text);

        let name = first(&sections, Field::Name)?;
        let description = first(&sections, Field::Description)?;
        let quality = parse_quality(&sections)?;
        let modifier = parse_modifier(first(&sections, Field::Modifier));

        let mut dish = Dish {
            name,
            modifier,
            description,
            quality,
            rationale: None,
            calories: None,
            protein: None,
            fat: None,
            carbohydrates: None,
            is_new_discovery: true,
        };

        if self.format == ResponseFormat::Extended {
            dish.rationale = Some(first(&sections, Field::Rationale)?);
            let macro_of = |field| first(&sections, field).as_deref().and_then(parse_macro);
            dish.calories = macro_of(Field::Calories);
            dish.protein = macro_of(Field::Protein);
            dish.fat = macro_of(Field::Fat);
            dish.carbohydrates = macro_of(Field::Carbohydrates);
        } else {
            dish.rationale = first(&sections, Field::Rationale);
        }

        Some(dish)
    }
}

// Stand-in for a reply that could not be read. Cached like a real result.
pub fn placeholder_dish() -> Dish {
    Dish {
        name: PLACEHOLDER_NAME.to_string(),
        modifier: None,
        description: "The outcome of this combination is unclear based on standard cooking."
            .to_string(),
        quality: Quality::Dubious,
        rationale: Some("The kitchen's notes for this combination could not be read.".to_string()),
        calories: None,
        protein: None,
        fat: None,
        carbohydrates: None,
        is_new_discovery: true,
    }
}

// Served when the service refused to answer. Never cached.
pub fn unavailable_dish() -> Dish {
    Dish {
        name: UNAVAILABLE_NAME.to_string(),
        modifier: None,
        description: "Something went wrong in the cosmic kitchen. The result is... questionable."
            .to_string(),
        quality: Quality::Dubious,
        rationale: Some("No result could be generated for this combination.".to_string()),
        calories: None,
        protein: None,
        fat: None,
        carbohydrates: None,
        is_new_discovery: true,
    }
}
