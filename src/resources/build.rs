//! Build driver.
//!
//! Thin wrapper around `ant`. The build system lives in the community
//! edition working copy under `buildomatic/`; a full build compiles both
//! source trees, a targeted build compiles one directory of one edition.
//! The skip-tests toggle comes from the resolved context.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::context::{Context, Edition};
use crate::error::{BuildError, Result};

/// Ant property that disables test execution.
const SKIP_TESTS_ARG: &str = "-DSKIP_TEST_ARG=skipTests";

/// Build-system configuration file seeded into the working copy.
const MASTER_PROPERTIES: &str = "default_master.properties";

/// Driver for the `ant` build tool.
#[derive(Debug)]
pub struct BuildDriver<'a> {
    ctx: &'a Context,
}

impl<'a> BuildDriver<'a> {
    /// Creates a driver reading from the given context.
    #[must_use]
    pub const fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    /// Path of the build file inside the ce working copy.
    #[must_use]
    pub fn build_file(&self) -> PathBuf {
        PathBuf::from(&self.ctx.src.working_copy_ce)
            .join("buildomatic")
            .join("build.xml")
    }

    /// Builds both source trees (`build-src-all`).
    ///
    /// # Errors
    ///
    /// Returns an error when ant cannot be spawned or the target fails.
    pub fn build_all(&self) -> Result<()> {
        self.run_target("build-src-all", &[])
    }

    /// Builds a single directory of one edition (`build-dir-<edition>`).
    ///
    /// # Errors
    ///
    /// Returns an error when ant cannot be spawned or the target fails.
    pub fn build_dir(&self, edition: Edition, dir_name: &str) -> Result<()> {
        let target = format!("build-dir-{edition}");
        let dir_arg = format!("-DdirName={dir_name}");
        self.run_target(&target, &[&dir_arg])
    }

    /// Writes the build-system configuration into the ce working copy,
    /// rendering the `default_master.properties` template from the
    /// template directory with values from the context. A no-op when no
    /// template is present.
    ///
    /// # Errors
    ///
    /// Returns an error when the template cannot be read or the rendered
    /// file cannot be written.
    pub fn write_default_master_properties(&self) -> Result<()> {
        let template_path = Path::new(&self.ctx.core.template_dir).join(MASTER_PROPERTIES);
        if !template_path.is_file() {
            debug!("No master properties template at {}", template_path.display());
            return Ok(());
        }

        let template = std::fs::read_to_string(&template_path)?;
        let rendered = substitute_tokens(&template, self.ctx);

        let target = PathBuf::from(&self.ctx.src.working_copy_ce)
            .join("buildomatic")
            .join(MASTER_PROPERTIES);
        info!("Writing {}", target.display());
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, rendered)?;

        Ok(())
    }

    /// Runs one ant target against the buildomatic build file.
    fn run_target(&self, target: &str, extra_args: &[&str]) -> Result<()> {
        let build_file = self.build_file();
        info!("ant {target} ({})", build_file.display());

        let mut command = Command::new("ant");
        if self.ctx.src.skips_tests() {
            command.arg(SKIP_TESTS_ARG);
        }
        command.arg("-buildfile").arg(&build_file).arg(target);
        command.args(extra_args);

        let status = command.status().map_err(|e| BuildError::SpawnFailed {
            message: e.to_string(),
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(BuildError::TargetFailed {
                target: target.to_string(),
                status: status.code().unwrap_or(-1),
            }
            .into())
        }
    }
}

/// Replaces `%section.key%` tokens in a template with resolved values.
/// Unknown tokens pass through unchanged.
fn substitute_tokens(template: &str, ctx: &Context) -> String {
    let replacements = [
        ("%tc.home%", ctx.tc.home.as_str()),
        ("%src.working_copy_ce%", ctx.src.working_copy_ce.as_str()),
        ("%src.working_copy_pro%", ctx.src.working_copy_pro.as_str()),
    ];

    let mut rendered = template.to_string();
    for (token, value) in replacements {
        rendered = rendered.replace(token, value);
    }
    rendered
}
