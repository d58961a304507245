mod rules;
mod validator;

use crate::error::ValidationError;
use crate::types::{Recipe, Step};
use validator::Validator;

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

impl Validate for Recipe {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_recipe(self)
    }
}

/// Check a whole recipe, collecting every violation instead of stopping at the first.
pub fn validate_recipe(recipe: &Recipe) -> Result<(), ValidationError> {
    let mut v = Validator::new();
    v.validate_recipe(recipe);
    v.finish()
}

/// Check a single step's shape outside of a recipe (used by tools before execution).
pub fn validate_step(step: &Step) -> Result<(), ValidationError> {
    let mut v = Validator::new();
    rules::step::validate_step(&mut v, step, &step.name);
    v.finish()
}
