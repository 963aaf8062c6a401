//! Catalog seeding
//!
//! Loads dishes, ingredients, recipes and tables from a JSON file in one
//! transaction. A database that already holds a catalog is left untouched,
//! so restarting with the same `SEED_FILE` never resets stock levels.
//!
//! ```json
//! {
//!   "ingredients": [{ "id": 1, "name": "Flour", "unit": "kg", "quantity": "25", "min_quantity": "5" }],
//!   "dishes": [{ "id": 1, "category_id": 1, "name": "Margherita", "price": "8.50", "is_active": true }],
//!   "recipes": [{ "dish_id": 1, "ingredient_id": 1, "qty_per_unit": "0.25" }],
//!   "tables": [{ "id": 1, "name": "T1", "status": "free" }]
//! }
//! ```

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use shared::models::{DiningTable, Dish, Ingredient, RecipeLine};

use crate::core::{Result, ServerError};
use crate::orders::{OrderBackend, RedbBackend, StoreTxn};

/// Seed file contents
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SeedFile {
    pub dishes: Vec<Dish>,
    pub ingredients: Vec<Ingredient>,
    pub recipes: Vec<RecipeLine>,
    pub tables: Vec<DiningTable>,
}

impl SeedFile {
    pub fn from_json(json: &str) -> Result<Self> {
        let seed: SeedFile = serde_json::from_str(json)
            .map_err(|e| ServerError::Seed(format!("invalid seed JSON: {e}")))?;
        seed.validate()?;
        Ok(seed)
    }

    /// 引用完整性与数量检查
    fn validate(&self) -> Result<()> {
        for ingredient in &self.ingredients {
            if ingredient.quantity < Decimal::ZERO || ingredient.min_quantity < Decimal::ZERO {
                return Err(ServerError::Seed(format!(
                    "ingredient {} has a negative quantity",
                    ingredient.id
                )));
            }
        }
        for dish in &self.dishes {
            if dish.price < Decimal::ZERO {
                return Err(ServerError::Seed(format!(
                    "dish {} has a negative price",
                    dish.id
                )));
            }
        }
        for line in &self.recipes {
            if !self.dishes.iter().any(|d| d.id == line.dish_id) {
                return Err(ServerError::Seed(format!(
                    "recipe references unknown dish {}",
                    line.dish_id
                )));
            }
            if !self.ingredients.iter().any(|i| i.id == line.ingredient_id) {
                return Err(ServerError::Seed(format!(
                    "recipe for dish {} references unknown ingredient {}",
                    line.dish_id, line.ingredient_id
                )));
            }
            if line.qty_per_unit < Decimal::ZERO {
                return Err(ServerError::Seed(format!(
                    "recipe for dish {} has a negative quantity",
                    line.dish_id
                )));
            }
        }
        Ok(())
    }
}

/// Read and apply a seed file
pub fn load_seed_file(backend: &RedbBackend, path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)?;
    let seed = SeedFile::from_json(&json)?;
    let applied = apply_seed(backend, &seed)?;
    if applied {
        tracing::info!(
            path = %path.display(),
            dishes = seed.dishes.len(),
            ingredients = seed.ingredients.len(),
            recipes = seed.recipes.len(),
            tables = seed.tables.len(),
            "Catalog seeded"
        );
    } else {
        tracing::info!(path = %path.display(), "Catalog already present, seed skipped");
    }
    Ok(applied)
}

/// Write the seed in one transaction; returns `false` if a catalog already exists
pub fn apply_seed(backend: &RedbBackend, seed: &SeedFile) -> Result<bool> {
    let mut txn = backend.begin()?;
    if txn.has_catalog()? {
        return Ok(false);
    }

    for ingredient in &seed.ingredients {
        txn.put_ingredient(ingredient)?;
    }
    for dish in &seed.dishes {
        txn.put_dish(dish)?;
    }
    for line in &seed.recipes {
        txn.put_recipe_line(line)?;
    }
    for table in &seed.tables {
        txn.put_table(table)?;
    }
    txn.commit()?;
    Ok(true)
}
