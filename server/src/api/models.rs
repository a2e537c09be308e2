use serde::{Deserialize, Serialize};

use crate::db::{Drink, DrinkPatch, Ingredient, NewDrink};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: u16,
    pub message: String,
}

/// Recipe line as exposed in the short view: no `parts`.
#[derive(Debug, Serialize, Deserialize)]
pub struct IngredientSummary {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShortDrink {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<IngredientSummary>,
}

impl From<&Drink> for ShortDrink {
    fn from(drink: &Drink) -> Self {
        Self {
            id: drink.id,
            title: drink.title.clone(),
            recipe: drink
                .recipe
                .iter()
                .map(|i| IngredientSummary {
                    name: i.name.clone(),
                    color: i.color.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LongDrink {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

impl From<Drink> for LongDrink {
    fn from(drink: Drink) -> Self {
        Self {
            id: drink.id,
            title: drink.title,
            recipe: drink.recipe,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DrinksResponse<T> {
    pub success: bool,
    pub drinks: Vec<T>,
}

impl<T> DrinksResponse<T> {
    pub const fn new(drinks: Vec<T>) -> Self {
        Self {
            success: true,
            drinks,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub delete: i64,
}

/// Recipe line as submitted. `parts` is checked after parsing so that
/// zero or negative values are reported as unprocessable input.
#[derive(Debug, Serialize, Deserialize)]
pub struct IngredientRequest {
    pub name: String,
    pub color: String,
    pub parts: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateDrinkRequest {
    pub title: String,
    pub recipe: Vec<IngredientRequest>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateDrinkRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe: Option<Vec<IngredientRequest>>,
}

fn validate_title(title: &str) -> Result<String, String> {
    let title = title.trim();
    if title.is_empty() {
        return Err("title must not be empty".to_string());
    }
    Ok(title.to_string())
}

fn validate_recipe(recipe: Vec<IngredientRequest>) -> Result<Vec<Ingredient>, String> {
    if recipe.is_empty() {
        return Err("recipe must contain at least one ingredient".to_string());
    }

    recipe
        .into_iter()
        .map(|item| {
            if item.name.trim().is_empty() {
                return Err("ingredient name must not be empty".to_string());
            }
            let parts = u32::try_from(item.parts)
                .ok()
                .filter(|p| *p >= 1)
                .ok_or_else(|| format!("invalid parts for {}: {}", item.name, item.parts))?;
            Ok(Ingredient {
                name: item.name,
                color: item.color,
                parts,
            })
        })
        .collect()
}

impl TryFrom<CreateDrinkRequest> for NewDrink {
    type Error = String;

    fn try_from(req: CreateDrinkRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            title: validate_title(&req.title)?,
            recipe: validate_recipe(req.recipe)?,
        })
    }
}

impl TryFrom<UpdateDrinkRequest> for DrinkPatch {
    type Error = String;

    fn try_from(req: UpdateDrinkRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            title: req.title.as_deref().map(validate_title).transpose()?,
            recipe: req.recipe.map(validate_recipe).transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn latte() -> Drink {
        Drink {
            id: 3,
            title: "Latte".to_string(),
            recipe: vec![
                Ingredient {
                    name: "milk".to_string(),
                    color: "grey".to_string(),
                    parts: 3,
                },
                Ingredient {
                    name: "coffee".to_string(),
                    color: "brown".to_string(),
                    parts: 1,
                },
            ],
        }
    }

    #[test]
    fn short_view_hides_parts() {
        let json = serde_json::to_value(ShortDrink::from(&latte())).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["recipe"][0]["name"], "milk");
        assert_eq!(json["recipe"][1]["color"], "brown");
        assert!(json["recipe"][0].get("parts").is_none());
    }

    #[test]
    fn long_view_keeps_parts() {
        let json = serde_json::to_value(LongDrink::from(latte())).unwrap();
        assert_eq!(json["recipe"][0]["parts"], 3);
        assert_eq!(json["recipe"][1]["parts"], 1);
    }

    #[test]
    fn update_request_fields_are_optional() {
        let req: UpdateDrinkRequest = serde_json::from_str(r#"{"title":"NewName"}"#).unwrap();
        assert_eq!(req.title.as_deref(), Some("NewName"));
        assert!(req.recipe.is_none());
    }

    fn line(name: &str, parts: i64) -> IngredientRequest {
        IngredientRequest {
            name: name.to_string(),
            color: "blue".to_string(),
            parts,
        }
    }

    #[test]
    fn create_request_is_validated() {
        let ok = NewDrink::try_from(CreateDrinkRequest {
            title: "  Water ".to_string(),
            recipe: vec![line("water", 1)],
        })
        .unwrap();
        assert_eq!(ok.title, "Water");
        assert_eq!(ok.recipe[0].parts, 1);

        for (title, recipe) in [
            ("", vec![line("water", 1)]),
            ("Water", vec![]),
            ("Water", vec![line("water", 0)]),
            ("Water", vec![line("water", -2)]),
            ("Water", vec![line(" ", 1)]),
        ] {
            let req = CreateDrinkRequest {
                title: title.to_string(),
                recipe,
            };
            assert!(NewDrink::try_from(req).is_err());
        }
    }

    #[test]
    fn update_request_validates_only_supplied_fields() {
        let patch = DrinkPatch::try_from(UpdateDrinkRequest::default()).unwrap();
        assert!(patch.title.is_none() && patch.recipe.is_none());

        let bad = UpdateDrinkRequest {
            title: None,
            recipe: Some(vec![]),
        };
        assert!(DrinkPatch::try_from(bad).is_err());
    }
}
