//! Running recipes from inside recipes.

mod call_stack;
mod fetcher;
mod identifier;
mod resolver;
mod variables;

pub use call_stack::{CallFrame, CallStack};
pub use fetcher::{FetchError, RecipeFetcher, ReqwestFetcher};
pub use identifier::{classify, has_recipe_extension, RecipeSource};
pub use resolver::{
    package_dirs_from_env, RecipeResolution, RecipeResolver, ResolutionKind, ResolveError,
    ResolverConfig, PACKAGE_PATH_ENV,
};
pub use variables::build_sub_variables;
