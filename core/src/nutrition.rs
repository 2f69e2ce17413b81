use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Display label of the aggregate row returned by totals.
pub const TOTALS_LABEL: &str = "Your recipe";

/// The five tracked nutrients.
///
/// Catalog rows hold these per 100 g; ledger entries hold them scaled to the
/// requested grams. Values are never rounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct NutrientFacts {
    pub calories: f64,
    pub proteins: f64,
    pub carbs: f64,
    pub fats: f64,
    pub fiber: f64,
}

impl NutrientFacts {
    /// Scale per-100g facts to an absolute amount for `grams`.
    pub fn scale(&self, grams: f64) -> Self {
        Self {
            calories: scale(self.calories, grams),
            proteins: scale(self.proteins, grams),
            carbs: scale(self.carbs, grams),
            fats: scale(self.fats, grams),
            fiber: scale(self.fiber, grams),
        }
    }
}

impl Add for NutrientFacts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            calories: self.calories + rhs.calories,
            proteins: self.proteins + rhs.proteins,
            carbs: self.carbs + rhs.carbs,
            fats: self.fats + rhs.fats,
            fiber: self.fiber + rhs.fiber,
        }
    }
}

impl AddAssign for NutrientFacts {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// `per_hundred_grams * grams / 100`
pub fn scale(per_hundred_grams: f64, grams: f64) -> f64 {
    per_hundred_grams * grams / 100.0
}

/// Unscaled request shape: a name and an amount, before catalog lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TemplateIngredient {
    pub name: String,
    pub grams: f64,
}

/// An ingredient resolved against the catalog, nutrients scaled to `grams`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Ingredient {
    pub name: String,
    #[serde(default)]
    pub grams: f64,
    #[serde(flatten)]
    pub nutrients: NutrientFacts,
}

impl Ingredient {
    pub fn from_per_100g(name: impl Into<String>, grams: f64, per_100g: &NutrientFacts) -> Self {
        Self {
            name: name.into(),
            grams,
            nutrients: per_100g.scale(grams),
        }
    }
}

/// Field-wise sum over a list of ingredients.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct NutritionTotals {
    pub name: String,
    pub grams: f64,
    #[serde(flatten)]
    pub nutrients: NutrientFacts,
}

impl Default for NutritionTotals {
    fn default() -> Self {
        Self {
            name: TOTALS_LABEL.to_string(),
            grams: 0.0,
            nutrients: NutrientFacts::default(),
        }
    }
}

/// Sum grams and nutrients across `ingredients`. Empty input yields zero totals.
pub fn sum<'a, I>(ingredients: I) -> NutritionTotals
where
    I: IntoIterator<Item = &'a Ingredient>,
{
    ingredients
        .into_iter()
        .fold(NutritionTotals::default(), |mut totals, ingredient| {
            totals.grams += ingredient.grams;
            totals.nutrients += ingredient.nutrients;
            totals
        })
}
