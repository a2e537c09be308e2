//! Drink records.

use serde::{Deserialize, Serialize};

/// One recipe line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub color: String,
    pub parts: u32,
}

/// A drink on the menu. `id` is assigned by storage and never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drink {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

/// Validated input for a new drink.
#[derive(Debug, Clone)]
pub struct NewDrink {
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

/// Partial update; `None` fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct DrinkPatch {
    pub title: Option<String>,
    pub recipe: Option<Vec<Ingredient>>,
}

impl DrinkPatch {
    pub fn apply(&self, drink: &mut Drink) {
        if let Some(title) = &self.title {
            drink.title.clone_from(title);
        }
        if let Some(recipe) = &self.recipe {
            drink.recipe.clone_from(recipe);
        }
    }
}

/// Row as stored; `recipe` is a JSON array.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct DrinkRow {
    pub id: i64,
    pub title: String,
    pub recipe: String,
}

impl TryFrom<DrinkRow> for Drink {
    type Error = serde_json::Error;

    fn try_from(row: DrinkRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            title: row.title,
            recipe: serde_json::from_str(&row.recipe)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn water() -> Drink {
        Drink {
            id: 1,
            title: "Water".to_string(),
            recipe: vec![Ingredient {
                name: "water".to_string(),
                color: "blue".to_string(),
                parts: 1,
            }],
        }
    }

    #[test]
    fn patch_replaces_only_supplied_fields() {
        let mut drink = water();
        let patch = DrinkPatch {
            title: Some("Still Water".to_string()),
            recipe: None,
        };
        patch.apply(&mut drink);
        patch.apply(&mut drink);

        assert_eq!(drink.title, "Still Water");
        assert_eq!(drink.recipe, water().recipe);
        assert_eq!(drink.id, 1);
    }

    #[test]
    fn row_decodes_recipe_json() {
        let row = DrinkRow {
            id: 7,
            title: "Latte".to_string(),
            recipe: r#"[{"name":"milk","color":"grey","parts":3},{"name":"coffee","color":"brown","parts":1}]"#
                .to_string(),
        };
        let drink = Drink::try_from(row).unwrap();
        assert_eq!(drink.recipe.len(), 2);
        assert_eq!(drink.recipe[0].parts, 3);
    }

    #[test]
    fn row_with_bad_recipe_fails() {
        let row = DrinkRow {
            id: 7,
            title: "Broken".to_string(),
            recipe: "not json".to_string(),
        };
        assert!(Drink::try_from(row).is_err());
    }
}
