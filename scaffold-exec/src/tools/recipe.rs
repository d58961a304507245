use async_trait::async_trait;
use scaffold_core::types::{Step, StepKind, ToolType};
use serde_json::json;

use crate::composition::build_sub_variables;
use crate::engine::resolve_variables;
use crate::executor::events::Event;
use crate::executor::{GroupMode, StepContext, StepExecutor};
use crate::tool::{
    validate_shape, ResourceRequirements, ResourceScope, Tool, ToolError, ToolOutput,
    ToolValidation,
};
use crate::tools::group::nested_output;

/// Resolves and runs another recipe with its own variables and results.
#[derive(Debug, Default)]
pub struct RecipeTool;

#[async_trait]
impl Tool for RecipeTool {
    fn tool_type(&self) -> ToolType {
        ToolType::Recipe
    }

    fn validate(&self, step: &Step, _ctx: &StepContext) -> ToolValidation {
        validate_shape(ToolType::Recipe, step).with_requirements(ResourceRequirements {
            filesystem: true,
            network: true,
            ..Default::default()
        })
    }

    async fn execute(
        &self,
        step: &Step,
        ctx: &StepContext,
        _scope: &ResourceScope,
    ) -> Result<ToolOutput, ToolError> {
        let StepKind::Recipe(r) = &step.kind else {
            return Err(ToolError::configuration("not a recipe step"));
        };
        let identifier = ctx.interpolate(&r.recipe)?;
        let resolution = ctx
            .services
            .resolver
            .resolve(&identifier, ctx.source_dir(), &ctx.project_root)
            .await
            .map_err(|e| ToolError::resolution(e.to_string()))?;
        let recipe = &resolution.recipe;
        let call_stack = ctx.call_stack.push(&resolution.location, &recipe.name)?;

        scaffold_core::validate_recipe(recipe).map_err(|e| {
            let messages = e.messages();
            ToolError::configuration(format!(
                "sub-recipe '{}' is invalid: {}",
                recipe.name,
                messages.join("; ")
            ))
            .with_details(json!({ "violations": messages }))
        })?;

        let provided = build_sub_variables(r, ctx)?;
        let interactive = !ctx.flags.skip_prompts && !ctx.flags.dry_run;
        let variables = resolve_variables(recipe, provided, ctx.services.prompter.as_ref(), interactive)
            .await
            .map_err(|e| {
                ToolError::configuration(format!(
                    "sub-recipe '{}': {}",
                    recipe.name,
                    e.messages().join("; ")
                ))
            })?;

        let working_dir = match &r.working_dir {
            Some(dir) => Some(ctx.project_root.join(ctx.interpolate(dir)?)),
            None => None,
        };
        let depth = call_stack.depth();
        let sub = ctx.derive_sub_recipe(
            recipe,
            resolution.base_dir.clone(),
            call_stack,
            working_dir,
            variables,
        );

        ctx.emit(Event::RecipeEntered {
            run_id: ctx.run_id,
            recipe: recipe.name.clone(),
            depth,
        })
        .await;
        let outcome = StepExecutor::execute(&recipe.steps, &sub, GroupMode::Mixed)
            .await
            .map_err(|e| ToolError::configuration(format!("sub-recipe '{}': {e}", recipe.name)))?;
        ctx.emit(Event::RecipeExited {
            run_id: ctx.run_id,
            recipe: recipe.name.clone(),
            succeeded: outcome.succeeded(),
        })
        .await;

        nested_output(
            &outcome,
            json!({
                "recipe": recipe.name,
                "location": resolution.location,
                "cacheHit": resolution.cache_hit,
                "steps": outcome.results,
                "summary": outcome.summary,
            }),
        )
    }
}
