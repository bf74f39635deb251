use crate::interpreter::ResponseFormat;
use crate::key::canonical_quantity;
use crate::models::{CookRequest, IngredientDetail, Recipe};

const PREAMBLE: &str = "You are a knowledgeable home chef focused on real-world culinary techniques and existing dishes.
When given ingredients with amounts, a cooking method, and details on how the method is applied, you determine what common cooking step or intermediate product this resembles, or what simple dish it might create.
Some ingredients were cooked earlier; their own recipe is shown after '<-'.
Your goal is to identify a plausible outcome based on standard recipes. If the combination is nonsensical or extremely unconventional for the ingredients, classify it as 'Poor' or 'Dubious'.

RULES:
1. Base the result on known culinary practices. Think \"What would this combination likely produce in a real kitchen?\".
2. Generate a concise Name for the resulting item (e.g., \"Creamed Butter\", \"Basic Marinara Sauce\", \"Sauteed Mushrooms\", \"Unpleasant Sludge\").
3. Generate a Modifier (starting with 'w/' or similar) listing the key distinguishing ingredients used, especially if the Name is generic. If the name is very specific or it's a simple single-ingredient prep, output \"Modifier: None\".
4. Provide a short, factual but quirky Description of the result.
5. Estimate a Quality: Poor (likely mistake/bad combo), Decent (basic/ok), Good (standard successful step/dish), Excellent (perfect execution/combo), or Dubious (weird but maybe edible).";

const BASIC_RULES: &str = "6. The output MUST strictly follow this format:
   Name: [Generated Name]
   Modifier: [Generated Modifier or None]
   Description: [Generated Description]
   Quality: [Poor/Decent/Good/Excellent/Dubious]";

const EXTENDED_RULES: &str = "6. Give a one or two sentence Rationale explaining the Quality.
7. Estimate the macros of the whole result from the amounts given: Calories (kcal), Protein, Fat and Carbohydrates (grams). Use plain numbers, optionally prefixed with 'approx.'. Write N/A if the result is not food.
8. The output MUST strictly follow this format:
   Name: [Generated Name]
   Modifier: [Generated Modifier or None]
   Description: [Generated Description]
   Quality: [Poor/Decent/Good/Excellent/Dubious]
   Rationale: [Why this quality]
   Calories: [number or N/A]
   Protein: [number or N/A]
   Fat: [number or N/A]
   Carbohydrates: [number or N/A]";

const BASIC_EXAMPLES: &str = "Ingredients: butter (100 g), shortening (50 g), granulated sugar (100 g), brown sugar (100 g)
Method: cream
Method Effect: Until well-combined
Name: Creamed Butter Mixture
Modifier: w/ shortening, granulated sugar, brown sugar
Description: A standard base for cookies or cakes, combining fats and sugars.
Quality: Good

Ingredients: mushrooms (200 g), butter (20 g), garlic (2 clove)
Method: saute
Method Effect: until tender
Name: Sauteed Mushrooms
Modifier: w/ butter and garlic
Description: Mushrooms cooked until soft in butter and garlic.
Quality: Good

Ingredients: flour (100 g), rocks (3 pc), water (50 ml)
Method: mix
Method Effect: vigorously
Name: Gritty Rock Paste
Modifier: w/ flour and rocks
Description: An inedible, abrasive paste likely to damage cookware.
Quality: Poor";

const EXTENDED_EXAMPLES: &str = "Ingredients: mushrooms (200 g), butter (20 g), garlic (2 clove)
Method: saute
Method Effect: until tender
Name: Sauteed Mushrooms
Modifier: w/ butter and garlic
Description: Mushrooms cooked until soft in butter and garlic.
Quality: Good
Rationale: A classic side; butter and garlic are the textbook pairing for mushrooms.
Calories: approx. 210
Protein: 7
Fat: 17
Carbohydrates: 9

Ingredients: canned tomatoes (400 g), garlic (3 clove), oregano (1 tsp)
Method: simmer
Method Effect: for 20 minutes
Name: Basic Marinara Sauce Base
Modifier: w/ garlic and oregano
Description: A simple tomato sauce foundation, ready for pasta or other dishes.
Quality: Decent
Rationale: Works, but lacks the oil and salt a proper marinara would have.
Calories: approx. 110
Protein: 5
Fat: 1
Carbohydrates: 22

Ingredients: flour (100 g), rocks (3 pc), water (50 ml)
Method: mix
Method Effect: vigorously
Name: Gritty Rock Paste
Modifier: w/ flour and rocks
Description: An inedible, abrasive paste likely to damage cookware.
Quality: Poor
Rationale: Rocks are not food.
Calories: N/A
Protein: N/A
Fat: N/A
Carbohydrates: N/A";

fn amount(quantity: f64, unit: &str) -> String {
    let unit = unit.trim();
    if unit.is_empty() {
        canonical_quantity(quantity)
    } else {
        format!("{} {}", canonical_quantity(quantity), unit)
    }
}

// "knead, until smooth: flour 500 g, water 300 ml"
fn render_lineage(recipe: &Recipe) -> String {
    let parts = recipe
        .ingredients
        .iter()
        .map(|entry| {
            let mut part = entry.name.trim().to_string();
            if let Some(q) = entry.quantity {
                part.push(' ');
                part.push_str(&amount(q, entry.unit.as_deref().unwrap_or_default()));
            }
            part
        })
        .collect::<Vec<_>>()
        .join(", ");

    let method = recipe.method.trim();
    match recipe.method_effect.as_deref().map(str::trim) {
        Some(effect) if !effect.is_empty() => format!("{method}, {effect}: {parts}"),
        _ => format!("{method}: {parts}"),
    }
}

/// `name [tag] (quantity unit)`, plus `<- lineage` for derived ingredients.
pub fn render_ingredient(ing: &IngredientDetail) -> String {
    let mut line = ing.name.trim().to_string();
    if let Some(tag) = ing.tag.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        line.push_str(&format!(" [{tag}]"));
    }
    line.push_str(&format!(" ({})", amount(ing.quantity, &ing.unit)));
    if let Some(recipe) = &ing.recipe {
        line.push_str(" <- ");
        line.push_str(&render_lineage(recipe));
    }
    line
}

pub fn render_prompt(request: &CookRequest, format: ResponseFormat) -> String {
    let (rules, examples) = match format {
        ResponseFormat::Basic => (BASIC_RULES, BASIC_EXAMPLES),
        ResponseFormat::Extended => (EXTENDED_RULES, EXTENDED_EXAMPLES),
    };

    let ingredients = request
        .ingredients
        .iter()
        .map(render_ingredient)
        .collect::<Vec<_>>()
        .join(", ");
    let effect = request
        .method_effect
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .unwrap_or("N/A");

    format!(
        "{PREAMBLE}\n{rules}\n\nEXAMPLES:\n{examples}\n\nNOW, YOUR TASK:\nIngredients: {ingredients}\nMethod: {method}\nMethod Effect: {effect}\n",
        method = request.method.trim(),
    )
}
