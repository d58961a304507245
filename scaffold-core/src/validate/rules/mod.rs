pub(crate) mod common;
pub(crate) mod recipe;
pub(crate) mod step;
pub(crate) mod tools;
