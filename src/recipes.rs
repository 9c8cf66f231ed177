use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: u32,
    pub name: String,
    pub ingredients: Vec<String>,
    pub instructions: String,
}

impl Recipe {
    fn new(id: u32, name: &str, ingredients: &[&str], instructions: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
            instructions: instructions.to_string(),
        }
    }
}

// Demo data; not matched against detected ingredients.
static RECIPES: LazyLock<Vec<Recipe>> = LazyLock::new(|| {
    vec![
        Recipe::new(
            1,
            "Pasta with Tomato Sauce",
            &["pasta", "tomatoes", "garlic", "olive oil"],
            "Cook pasta, make sauce, combine and serve",
        ),
        Recipe::new(
            2,
            "Vegetable Stir Fry",
            &["rice", "vegetables", "soy sauce", "oil"],
            "Stir fry vegetables, cook rice, combine and serve",
        ),
    ]
});

pub fn all() -> &'static [Recipe] {
    &RECIPES
}
