//! Source-control driver.
//!
//! Thin wrapper around the `svn` client. Every action runs against both
//! editions' working copies; the checkout URL and working copy path are
//! read from the already-resolved context without further validation.

use std::process::Command;

use tracing::info;

use crate::context::{Context, Edition};
use crate::error::{Result, ScmError};

/// Source-control actions the driver supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScmAction {
    /// Check out both editions.
    Checkout,
    /// Update both working copies.
    Update,
    /// Show working-copy status.
    Status,
    /// Show local modifications.
    Diff,
    /// Revert local modifications recursively.
    Revert,
}

impl ScmAction {
    const fn name(self) -> &'static str {
        match self {
            Self::Checkout => "checkout",
            Self::Update => "update",
            Self::Status => "status",
            Self::Diff => "diff",
            Self::Revert => "revert",
        }
    }
}

/// Driver for the `svn` client.
#[derive(Debug)]
pub struct ScmDriver<'a> {
    ctx: &'a Context,
}

impl<'a> ScmDriver<'a> {
    /// Creates a driver reading from the given context.
    #[must_use]
    pub const fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    /// Runs an action against both editions, community edition first.
    ///
    /// # Errors
    ///
    /// Returns an error when the client cannot be spawned or exits with a
    /// non-zero status for either edition.
    pub fn run(&self, action: ScmAction) -> Result<()> {
        self.run_edition(action, Edition::Ce)?;
        self.run_edition(action, Edition::Pro)
    }

    /// Runs an action against a single edition's working copy.
    ///
    /// # Errors
    ///
    /// Returns an error when the client cannot be spawned or fails.
    pub fn run_edition(&self, action: ScmAction, edition: Edition) -> Result<()> {
        let url = self.ctx.src.url(edition);
        let working_copy = self.ctx.src.working_copy(edition);

        info!("svn {} ({edition}): {working_copy}", action.name());

        let mut command = Command::new("svn");
        match action {
            ScmAction::Checkout => command.args([action.name(), url, working_copy]),
            ScmAction::Status => command.args([action.name(), "--quiet", working_copy]),
            ScmAction::Revert => command.args([action.name(), "-R", working_copy]),
            ScmAction::Update | ScmAction::Diff => command.args([action.name(), working_copy]),
        };

        run_checked(&mut command, action.name(), working_copy)
    }

    /// Removes an existing working copy and checks it out fresh.
    ///
    /// # Errors
    ///
    /// Returns an error when removal or checkout fails.
    pub fn clean_checkout(&self, edition: Edition) -> Result<()> {
        let working_copy = self.ctx.src.working_copy(edition);

        if std::path::Path::new(working_copy).exists() {
            info!("Removing existing working copy: {working_copy}");
            std::fs::remove_dir_all(working_copy)?;
        }

        self.run_edition(ScmAction::Checkout, edition)
    }
}

fn run_checked(command: &mut Command, action: &str, working_copy: &str) -> Result<()> {
    let status = command.status().map_err(|e| ScmError::SpawnFailed {
        program: "svn".to_string(),
        message: e.to_string(),
    })?;

    if status.success() {
        Ok(())
    } else {
        Err(ScmError::CommandFailed {
            action: action.to_string(),
            working_copy: working_copy.to_string(),
            status: status.code().unwrap_or(-1),
        }
        .into())
    }
}
