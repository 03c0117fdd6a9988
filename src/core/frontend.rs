//! Frontend build stage
//!
//! Runs the external frontend bundler once, in the project root. The bundler
//! owns module resolution and minification; this stage only looks at its
//! exit status.

use crate::core::stage::{BuildStage, StageContext};
use crate::error::StageError;
use crate::infra::process::{run_checked, Invocation};

/// Invokes the frontend bundler (`npx vite build` by default)
#[derive(Debug, Default)]
pub struct FrontendStage;

impl FrontendStage {
    pub const NAME: &'static str = "frontend";

    /// Command line for the configured bundler
    pub fn invocation(ctx: &StageContext<'_>) -> Invocation {
        let frontend = &ctx.config.frontend;
        Invocation::new(&frontend.program)
            .args(frontend.args.iter().cloned())
            .current_dir(ctx.project_dir)
            .env("NODE_ENV", "production")
    }
}

impl BuildStage for FrontendStage {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn execute(&self, ctx: &StageContext<'_>) -> Result<String, StageError> {
        let invocation = Self::invocation(ctx);
        tracing::info!("Building frontend: {}", invocation.display());

        run_checked(ctx.runner, &invocation)?;

        let assets = ctx.output_dir.join(&ctx.config.frontend.assets_dir);
        if ctx.fs.is_dir(&assets) {
            Ok(format!("assets in {}", assets.display()))
        } else {
            tracing::warn!(
                "Frontend build succeeded but {} does not exist; check the bundler's outDir",
                assets.display()
            );
            Ok("built (asset directory not found)".to_string())
        }
    }
}
