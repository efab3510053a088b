//! Layered context resolution.
//!
//! Resolution is one synchronous pass: seed missing properties files from
//! the bundled templates, load the user and workspace layers, apply
//! command-line overrides, merge later-wins, then fill in hardcoded and
//! derived defaults in fixed dependency order and fail fast on any
//! mandatory property still unset.
//!
//! The resolver creates directories and seeds files, but never overwrites
//! an existing properties file and never mutates the store after handing
//! it out.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ContextError, DevbenchError, Result};

use super::properties::PropertySet;
use super::store::{Context, CoreSection, SrcSection, TcSection};

/// Tool name; determines data directory and properties file names.
pub const APP_NAME: &str = "devbench";

/// Properties file name used at both the user and workspace level.
const PROPERTIES_FILE: &str = "devbench.properties";

/// Bundled default user-level properties.
const DEFAULT_USER_TEMPLATE: &str = include_str!("../../templates/default.user.properties");

/// Bundled default workspace-level properties.
const DEFAULT_WORKSPACE_TEMPLATE: &str =
    include_str!("../../templates/default.workspace.properties");

/// Checkout URL scheme. One consistent scheme for both editions.
const URL_SCHEME: &str = "svn+ssh";

const DEFAULT_USER: &str = "anonymous";
const DEFAULT_REPO_CE: &str = "server";
const DEFAULT_REPO_PRO: &str = "server-pro";
const DEFAULT_BRANCH: &str = "trunk";
const DEFAULT_SKIP_TESTS: &str = "false";
const DEFAULT_JAVA_OPTS: &str = "-Dport.http=8080 -Dport.ajp=8009 -Dport.shutdown=8005";
const DEFAULT_CATALINA_OPTS: &str =
    "-agentlib:jdwp=transport=dt_socket,address=1044,server=y,suspend=n \
     -Djava.net.preferIPv4Stack=true -Xms1024m -Xmx2048m";

/// Command-line override layer.
///
/// Holds an arbitrary set of `(section, key) = value` pairs; the highest
/// precedence layer of the merge.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    layer: PropertySet,
}

impl Overrides {
    /// Creates an empty override set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            layer: PropertySet::new(),
        }
    }

    /// Sets one override value.
    pub fn set(
        &mut self,
        section: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.layer.set(section, key, value);
    }

    /// Sets the skip-tests toggle. A bare `--skip-tests` flag maps to
    /// `true` at the CLI boundary.
    pub fn set_skip_tests(&mut self, value: bool) {
        self.set("src", "skip_tests", if value { "true" } else { "false" });
    }

    /// Parses a `section.key=value` assignment into an override.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::InvalidOverride`] when the expression does
    /// not have the `section.key=value` shape.
    pub fn parse_assignment(&mut self, expression: &str) -> Result<()> {
        let invalid = || {
            DevbenchError::Context(ContextError::InvalidOverride {
                expression: expression.to_string(),
            })
        };

        let (target, value) = expression.split_once('=').ok_or_else(invalid)?;
        let (section, key) = target.split_once('.').ok_or_else(invalid)?;

        let section = section.trim();
        let key = key.trim();
        if section.is_empty() || key.is_empty() {
            return Err(invalid());
        }

        self.set(section, key, value.trim());
        Ok(())
    }

    /// The override values as a merge layer.
    #[must_use]
    pub(crate) const fn as_layer(&self) -> &PropertySet {
        &self.layer
    }
}

/// Resolves the context for one invocation.
#[derive(Debug)]
pub struct ContextResolver {
    /// User home directory; fixes the data directory location.
    home_dir: PathBuf,
    /// Workspace directory; fixes the workspace properties file and the
    /// default working-copy and server locations.
    workspace_dir: PathBuf,
}

impl ContextResolver {
    /// Creates a resolver for the current user and working directory.
    ///
    /// # Errors
    ///
    /// Returns an error when the home or current directory cannot be
    /// determined.
    pub fn new() -> Result<Self> {
        let home_dir = dirs::home_dir()
            .ok_or_else(|| DevbenchError::internal("Cannot determine home directory"))?;
        let workspace_dir = std::env::current_dir()
            .map_err(|e| DevbenchError::internal(format!("Cannot determine current directory: {e}")))?;

        Ok(Self::with_dirs(home_dir, workspace_dir))
    }

    /// Creates a resolver with explicit home and workspace directories.
    #[must_use]
    pub fn with_dirs(home_dir: impl Into<PathBuf>, workspace_dir: impl Into<PathBuf>) -> Self {
        Self {
            home_dir: home_dir.into(),
            workspace_dir: workspace_dir.into(),
        }
    }

    /// The user-level data directory (`<home>/.devbench`).
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.home_dir.join(format!(".{APP_NAME}"))
    }

    /// Path of the user-level properties file.
    #[must_use]
    pub fn user_properties_path(&self) -> PathBuf {
        self.data_dir().join(PROPERTIES_FILE)
    }

    /// Path of the workspace-level properties file.
    #[must_use]
    pub fn workspace_properties_path(&self) -> PathBuf {
        self.workspace_dir.join(PROPERTIES_FILE)
    }

    /// Resolves the full context for this invocation.
    ///
    /// # Errors
    ///
    /// Returns a [`ContextError`] when seeding fails, a properties file is
    /// missing or malformed, or a mandatory property has no value after
    /// all layers and defaults are applied.
    pub fn resolve(&self, overrides: &Overrides) -> Result<Context> {
        let data_dir = self.data_dir();
        if !data_dir.is_dir() {
            debug!("Creating directory: {}", data_dir.display());
            std::fs::create_dir_all(&data_dir)?;
        }

        let user_path = self.user_properties_path();
        let workspace_path = self.workspace_properties_path();

        seed_file(&user_path, DEFAULT_USER_TEMPLATE)?;
        seed_file(&workspace_path, DEFAULT_WORKSPACE_TEMPLATE)?;

        let user_layer = PropertySet::load(&user_path)?;
        let workspace_layer = PropertySet::load(&workspace_path)?;

        // Pure merge, later layer wins per property.
        let merged = PropertySet::merge(&[&user_layer, &workspace_layer, overrides.as_layer()]);

        let ctx = self.build(&merged, &data_dir)?;

        // Cache directories follow the *resolved* data directory, which a
        // layer may have relocated.
        for dir in [&ctx.core.download_cache, &ctx.core.template_dir] {
            let dir = Path::new(dir);
            if !dir.is_dir() {
                debug!("Creating directory: {}", dir.display());
                std::fs::create_dir_all(dir)?;
            }
        }

        Ok(ctx)
    }

    /// Builds the typed store from the merged layer, filling hardcoded and
    /// derived defaults in fixed order: core, then src primitives, then
    /// src derived values, then tc.
    fn build(&self, merged: &PropertySet, default_data_dir: &Path) -> Result<Context> {
        let defaulted = |section: &str, key: &str, default: &str| {
            merged.get(section, key).unwrap_or(default).to_string()
        };
        let required = |section: &'static str, key: &'static str| {
            merged
                .get(section, key)
                .map(str::to_string)
                .ok_or_else(|| DevbenchError::Context(ContextError::mandatory(section, key)))
        };

        // The cache locations derive from the resolved data directory, not
        // the built-in one, so relocating core.data_dir moves them along.
        let data_dir = defaulted("core", "data_dir", &default_data_dir.display().to_string());
        let data_path = Path::new(&data_dir);
        let download_cache = defaulted(
            "core",
            "download_cache",
            &data_path.join("downloads").display().to_string(),
        );
        let template_dir = defaulted(
            "core",
            "template_dir",
            &data_path.join("templates").display().to_string(),
        );

        let core = CoreSection {
            data_dir,
            download_cache,
            template_dir,
        };

        let user = defaulted("src", "user", DEFAULT_USER);
        let server = required("src", "server")?;
        let repo_ce = defaulted("src", "repo_ce", DEFAULT_REPO_CE);
        let repo_pro = defaulted("src", "repo_pro", DEFAULT_REPO_PRO);
        let branch_ce = defaulted("src", "branch_ce", DEFAULT_BRANCH);
        let branch_pro = defaulted("src", "branch_pro", DEFAULT_BRANCH);

        // Derived values are defaults too: an explicit layer value wins.
        let url_ce = defaulted(
            "src",
            "url_ce",
            &checkout_url(&user, &server, &repo_ce, &branch_ce),
        );
        let url_pro = defaulted(
            "src",
            "url_pro",
            &checkout_url(&user, &server, &repo_pro, &branch_pro),
        );

        let working_copy_ce = defaulted(
            "src",
            "working_copy_ce",
            &self.workspace_dir.join("ce").display().to_string(),
        );
        let working_copy_pro = defaulted(
            "src",
            "working_copy_pro",
            &self.workspace_dir.join("pro").display().to_string(),
        );

        let src = SrcSection {
            user,
            server,
            repo_ce,
            repo_pro,
            branch_ce,
            branch_pro,
            url_ce,
            url_pro,
            working_copy_ce,
            working_copy_pro,
            skip_tests: defaulted("src", "skip_tests", DEFAULT_SKIP_TESTS),
        };

        let tc = TcSection {
            home: defaulted(
                "tc",
                "home",
                &self.workspace_dir.join("tomcat").display().to_string(),
            ),
            distribution_url: required("tc", "distribution_url")?,
            java_opts: defaulted("tc", "java_opts", DEFAULT_JAVA_OPTS),
            catalina_opts: defaulted("tc", "catalina_opts", DEFAULT_CATALINA_OPTS),
        };

        Ok(Context { core, src, tc })
    }
}

/// Computes a checkout URL from resolved primitives. Pure.
fn checkout_url(user: &str, server: &str, repo: &str, branch: &str) -> String {
    format!("{URL_SCHEME}://{user}@{server}/{repo}/{branch}")
}

/// Copies a bundled template into place unless the target already exists.
/// Seeding is idempotent: already-exists is success, never an overwrite.
fn seed_file(path: &Path, template: &str) -> Result<()> {
    if path.is_file() {
        return Ok(());
    }

    info!("Seeding properties file: {}", path.display());
    std::fs::write(path, template).map_err(|e| {
        DevbenchError::Context(ContextError::SeedFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// A minimal user file carrying only the mandatory properties, so
    /// every other property falls through to its default.
    const MINIMAL_USER: &str = "[src]\nserver = scm.example.com\n\n[tc]\ndistribution_url = https://archive.example.com/tomcat-9.tar.gz\n";

    fn test_resolver() -> (ContextResolver, TempDir, TempDir) {
        let home = TempDir::new().expect("Failed to create temp home");
        let workspace = TempDir::new().expect("Failed to create temp workspace");
        let resolver = ContextResolver::with_dirs(home.path(), workspace.path());
        (resolver, home, workspace)
    }

    fn write_user(resolver: &ContextResolver, content: &str) {
        std::fs::create_dir_all(resolver.data_dir()).expect("Failed to create data dir");
        std::fs::write(resolver.user_properties_path(), content).expect("Failed to write user file");
    }

    fn write_workspace(resolver: &ContextResolver, content: &str) {
        std::fs::write(resolver.workspace_properties_path(), content)
            .expect("Failed to write workspace file");
    }

    #[test]
    fn test_hardcoded_defaults_apply() {
        let (resolver, _home, workspace) = test_resolver();
        write_user(&resolver, MINIMAL_USER);
        write_workspace(&resolver, "");

        let ctx = resolver.resolve(&Overrides::new()).expect("resolve failed");

        assert_eq!(ctx.src.user, "anonymous");
        assert_eq!(ctx.src.repo_ce, "server");
        assert_eq!(ctx.src.repo_pro, "server-pro");
        assert_eq!(ctx.src.branch_ce, "trunk");
        assert_eq!(ctx.src.branch_pro, "trunk");
        assert_eq!(ctx.src.skip_tests, "false");
        assert_eq!(
            ctx.tc.home,
            workspace.path().join("tomcat").display().to_string()
        );
        assert_eq!(ctx.tc.java_opts, DEFAULT_JAVA_OPTS);
        assert_eq!(ctx.tc.catalina_opts, DEFAULT_CATALINA_OPTS);
    }

    #[test]
    fn test_relocated_data_dir_moves_cache_dirs() {
        let (resolver, _home, workspace) = test_resolver();
        let custom = workspace.path().join("state");
        write_user(
            &resolver,
            &format!("{MINIMAL_USER}\n[core]\ndata_dir = {}\n", custom.display()),
        );
        write_workspace(&resolver, "");

        let ctx = resolver.resolve(&Overrides::new()).expect("resolve failed");

        assert_eq!(ctx.core.data_dir, custom.display().to_string());
        assert_eq!(
            ctx.core.download_cache,
            custom.join("downloads").display().to_string()
        );
        assert_eq!(
            ctx.core.template_dir,
            custom.join("templates").display().to_string()
        );
        assert!(custom.join("downloads").is_dir());
        assert!(custom.join("templates").is_dir());
    }

    #[test]
    fn test_explicit_cache_dir_suppresses_derivation() {
        let (resolver, _home, workspace) = test_resolver();
        let cache = workspace.path().join("shared-cache");
        write_user(
            &resolver,
            &format!(
                "{MINIMAL_USER}\n[core]\ndownload_cache = {}\n",
                cache.display()
            ),
        );
        write_workspace(&resolver, "");

        let ctx = resolver.resolve(&Overrides::new()).expect("resolve failed");

        assert_eq!(ctx.core.data_dir, resolver.data_dir().display().to_string());
        assert_eq!(ctx.core.download_cache, cache.display().to_string());
        assert!(cache.is_dir());
    }

    #[test]
    fn test_workspace_overrides_user() {
        let (resolver, _home, _workspace) = test_resolver();
        write_user(&resolver, &format!("{MINIMAL_USER}\n[src]\nuser = alice\n"));
        write_workspace(&resolver, "[src]\nuser = carol\n");

        let ctx = resolver.resolve(&Overrides::new()).expect("resolve failed");
        assert_eq!(ctx.src.user, "carol");
    }

    #[test]
    fn test_cli_override_beats_both_layers() {
        let (resolver, _home, _workspace) = test_resolver();
        write_user(&resolver, &format!("{MINIMAL_USER}\n[src]\nbranch_ce = trunk\n"));
        write_workspace(&resolver, "[src]\nbranch_ce = release-6\n");

        let mut overrides = Overrides::new();
        overrides.set("src", "branch_ce", "release-7");

        let ctx = resolver.resolve(&overrides).expect("resolve failed");
        assert_eq!(ctx.src.branch_ce, "release-7");
        assert!(ctx.src.url_ce.ends_with("/release-7"));
    }

    #[test]
    fn test_derived_url_template() {
        let (resolver, _home, _workspace) = test_resolver();
        write_user(
            &resolver,
            "[src]\nuser = alice\nserver = scm.example.com\n\n[tc]\ndistribution_url = https://archive.example.com/t.tar.gz\n",
        );
        write_workspace(&resolver, "");

        let ctx = resolver.resolve(&Overrides::new()).expect("resolve failed");
        assert_eq!(
            ctx.src.url_ce,
            "svn+ssh://alice@scm.example.com/server/trunk"
        );
        assert_eq!(
            ctx.src.url_pro,
            "svn+ssh://alice@scm.example.com/server-pro/trunk"
        );
    }

    #[test]
    fn test_branch_change_only_affects_own_edition() {
        let (resolver, _home, _workspace) = test_resolver();
        write_user(&resolver, MINIMAL_USER);
        write_workspace(&resolver, "[src]\nbranch_ce = release-7\n");

        let ctx = resolver.resolve(&Overrides::new()).expect("resolve failed");
        assert!(ctx.src.url_ce.ends_with("/release-7"));
        assert!(ctx.src.url_pro.ends_with("/trunk"));
    }

    #[test]
    fn test_explicit_url_suppresses_derivation() {
        let (resolver, _home, _workspace) = test_resolver();
        write_user(&resolver, MINIMAL_USER);
        write_workspace(&resolver, "[src]\nurl_ce = svn+ssh://elsewhere/x/y\n");

        let ctx = resolver.resolve(&Overrides::new()).expect("resolve failed");
        assert_eq!(ctx.src.url_ce, "svn+ssh://elsewhere/x/y");
        assert_eq!(
            ctx.src.url_pro,
            "svn+ssh://anonymous@scm.example.com/server-pro/trunk"
        );
    }

    #[test]
    fn test_seeding_is_idempotent() {
        let (resolver, _home, _workspace) = test_resolver();

        let first = resolver.resolve(&Overrides::new()).expect("first resolve failed");
        let user_after_first =
            std::fs::read(resolver.user_properties_path()).expect("read user file");
        let workspace_after_first =
            std::fs::read(resolver.workspace_properties_path()).expect("read workspace file");

        let second = resolver.resolve(&Overrides::new()).expect("second resolve failed");
        let user_after_second =
            std::fs::read(resolver.user_properties_path()).expect("read user file");
        let workspace_after_second =
            std::fs::read(resolver.workspace_properties_path()).expect("read workspace file");

        assert_eq!(first, second);
        assert_eq!(user_after_first, user_after_second);
        assert_eq!(workspace_after_first, workspace_after_second);
    }

    #[test]
    fn test_seeding_never_overwrites_existing_file() {
        let (resolver, _home, _workspace) = test_resolver();
        write_user(&resolver, MINIMAL_USER);
        write_workspace(&resolver, "[src]\nbranch_ce = release-7\n");

        let _ = resolver.resolve(&Overrides::new()).expect("resolve failed");

        let workspace_content = std::fs::read_to_string(resolver.workspace_properties_path())
            .expect("read workspace file");
        assert_eq!(workspace_content, "[src]\nbranch_ce = release-7\n");
    }

    #[test]
    fn test_mandatory_property_missing() {
        let (resolver, _home, _workspace) = test_resolver();
        // No src.server anywhere.
        write_user(
            &resolver,
            "[tc]\ndistribution_url = https://archive.example.com/t.tar.gz\n",
        );
        write_workspace(&resolver, "");

        let result = resolver.resolve(&Overrides::new());
        match result {
            Err(DevbenchError::Context(ContextError::MandatoryMissing { section, property })) => {
                assert_eq!(section, "src");
                assert_eq!(property, "server");
            }
            other => panic!("Expected MandatoryMissing, got {other:?}"),
        }
    }

    #[test]
    fn test_mandatory_can_come_from_override_layer() {
        let (resolver, _home, _workspace) = test_resolver();
        write_user(
            &resolver,
            "[tc]\ndistribution_url = https://archive.example.com/t.tar.gz\n",
        );
        write_workspace(&resolver, "");

        let mut overrides = Overrides::new();
        overrides.set("src", "server", "scm.example.com");

        let ctx = resolver.resolve(&overrides).expect("resolve failed");
        assert_eq!(ctx.src.server, "scm.example.com");
    }

    #[test]
    fn test_example_scenario_from_empty_environment() {
        let (resolver, _home, workspace) = test_resolver();
        write_user(&resolver, MINIMAL_USER);
        write_workspace(&resolver, "[src]\nbranch_ce = release-7\n");

        let ctx = resolver.resolve(&Overrides::new()).expect("resolve failed");

        assert!(ctx.src.url_ce.contains("anonymous"));
        assert!(ctx.src.url_ce.contains("release-7"));
        assert_eq!(
            ctx.src.working_copy_ce,
            workspace.path().join("ce").display().to_string()
        );
    }

    #[test]
    fn test_bare_skip_tests_flag_implies_true() {
        let (resolver, _home, _workspace) = test_resolver();
        write_user(&resolver, MINIMAL_USER);
        write_workspace(&resolver, "");

        let mut overrides = Overrides::new();
        overrides.set_skip_tests(true);

        let ctx = resolver.resolve(&overrides).expect("resolve failed");
        assert_eq!(ctx.src.skip_tests, "true");
    }

    #[test]
    fn test_explicit_skip_tests_false_override() {
        let (resolver, _home, _workspace) = test_resolver();
        write_user(&resolver, MINIMAL_USER);
        write_workspace(&resolver, "[src]\nskip_tests = true\n");

        let mut overrides = Overrides::new();
        overrides.set_skip_tests(false);

        let ctx = resolver.resolve(&overrides).expect("resolve failed");
        assert_eq!(ctx.src.skip_tests, "false");
    }

    #[test]
    fn test_parse_assignment() {
        let mut overrides = Overrides::new();
        overrides
            .parse_assignment("src.branch_ce=release-7")
            .expect("parse failed");
        assert_eq!(overrides.as_layer().get("src", "branch_ce"), Some("release-7"));
    }

    #[test]
    fn test_parse_assignment_rejects_bad_shape() {
        let mut overrides = Overrides::new();
        assert!(overrides.parse_assignment("no-dot=value").is_err());
        assert!(overrides.parse_assignment("src.key-no-value").is_err());
        assert!(overrides.parse_assignment(".key=value").is_err());
    }

    #[test]
    fn test_malformed_workspace_file() {
        let (resolver, _home, _workspace) = test_resolver();
        write_user(&resolver, MINIMAL_USER);
        write_workspace(&resolver, "[src]\nthis is not a property\n");

        let result = resolver.resolve(&Overrides::new());
        assert!(matches!(
            result,
            Err(DevbenchError::Context(ContextError::Malformed { line: 2, .. }))
        ));
    }
}
