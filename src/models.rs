//! Core data types: the drink entity and its two serialization views

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Drink identifier (auto-assigned primary key)
pub type DrinkId = i64;

/// One line of a recipe, usually `{color, name, parts}`.
///
/// The record is kept exactly as the client sent it: no key is required,
/// extra keys survive, and values keep their JSON representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ingredient(pub Map<String, Value>);

impl Ingredient {
    pub fn color(&self) -> Option<&Value> {
        self.0.get("color")
    }

    pub fn name(&self) -> Option<&Value> {
        self.0.get("name")
    }

    pub fn parts(&self) -> Option<&Value> {
        self.0.get("parts")
    }
}

impl From<Map<String, Value>> for Ingredient {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Recipe line as exposed by the public listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShortIngredient {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parts: Option<Value>,
}

/// A stored drink
#[derive(Debug, Clone, PartialEq)]
pub struct Drink {
    pub id: DrinkId,
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

/// Short view: colors and proportions only
#[derive(Debug, Clone, Serialize)]
pub struct ShortDrink {
    pub id: DrinkId,
    pub title: String,
    pub recipe: Vec<ShortIngredient>,
}

/// Long view: the full recipe
#[derive(Debug, Clone, Serialize)]
pub struct LongDrink {
    pub id: DrinkId,
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

impl Drink {
    pub fn short(&self) -> ShortDrink {
        ShortDrink {
            id: self.id,
            title: self.title.clone(),
            recipe: self
                .recipe
                .iter()
                .map(|ingredient| ShortIngredient {
                    color: ingredient.color().cloned(),
                    parts: ingredient.parts().cloned(),
                })
                .collect(),
        }
    }

    pub fn long(&self) -> LongDrink {
        LongDrink {
            id: self.id,
            title: self.title.clone(),
            recipe: self.recipe.clone(),
        }
    }
}

/// Drink fields as sent by POST and PATCH.
///
/// Both fields are optional on purpose. POST hands missing values to the
/// store, whose `NOT NULL` constraints reject them; PATCH requires a title
/// and leaves the recipe alone when it is absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DrinkInput {
    pub title: Option<String>,
    pub recipe: Option<Vec<Ingredient>>,
}

/// Values for a drink that has not been stored yet
pub type NewDrink = DrinkInput;

/// Partial update applied by PATCH
pub type DrinkPatch = DrinkInput;

impl DrinkInput {
    /// Apply as a patch to `drink`, returning `false` when no title was supplied.
    pub fn apply_to(self, drink: &mut Drink) -> bool {
        let Some(title) = self.title else {
            return false;
        };
        drink.title = title;
        if let Some(recipe) = self.recipe {
            drink.recipe = recipe;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ingredient(value: Value) -> Ingredient {
        serde_json::from_value(value).unwrap()
    }

    fn margarita() -> Drink {
        Drink {
            id: 7,
            title: "Margarita".to_string(),
            recipe: vec![
                ingredient(json!({"color": "green", "name": "lime", "parts": 1})),
                ingredient(json!({"color": "yellow", "name": "tequila", "parts": 2.5})),
            ],
        }
    }

    #[test]
    fn test_short_view_hides_ingredient_names() {
        let value = serde_json::to_value(margarita().short()).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 7,
                "title": "Margarita",
                "recipe": [
                    {"color": "green", "parts": 1},
                    {"color": "yellow", "parts": 2.5}
                ]
            })
        );
    }

    #[test]
    fn test_short_view_skips_absent_fields() {
        let drink = Drink {
            id: 1,
            title: "Tonic".to_string(),
            recipe: vec![ingredient(json!({"name": "tonic", "parts": "1"}))],
        };
        let value = serde_json::to_value(drink.short()).unwrap();
        assert_eq!(value["recipe"], json!([{"parts": "1"}]));
    }

    #[test]
    fn test_long_view_keeps_full_recipe() {
        let value = serde_json::to_value(margarita().long()).unwrap();
        assert_eq!(value["recipe"][0]["name"], "lime");
        assert_eq!(value["recipe"][1]["parts"], json!(2.5));
    }

    #[test]
    fn test_recipe_text_round_trips_unchanged() {
        let text = r#"[{"color":"red","name":"n","parts":1,"id":3},{"parts":"2","garnish":true}]"#;
        let recipe: Vec<Ingredient> = serde_json::from_str(text).unwrap();
        assert_eq!(recipe[0].name(), Some(&json!("n")));
        assert_eq!(serde_json::to_string(&recipe).unwrap(), text);
    }

    #[test]
    fn test_non_object_entries_are_rejected() {
        assert!(serde_json::from_str::<Vec<Ingredient>>("[1, 2]").is_err());
        assert!(serde_json::from_str::<Vec<Ingredient>>(r#"{"color":"red"}"#).is_err());
    }

    #[test]
    fn test_patch_requires_title() {
        let mut drink = margarita();
        let patch = DrinkPatch {
            title: None,
            recipe: Some(vec![]),
        };
        assert!(!patch.apply_to(&mut drink));
        assert_eq!(drink, margarita());
    }

    #[test]
    fn test_patch_keeps_recipe_when_absent() {
        let mut drink = margarita();
        let patch = DrinkPatch {
            title: Some("Frozen Margarita".to_string()),
            recipe: None,
        };
        assert!(patch.apply_to(&mut drink));
        assert_eq!(drink.title, "Frozen Margarita");
        assert_eq!(drink.recipe, margarita().recipe);
    }
}
