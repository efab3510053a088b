//! The resolved context store.
//!
//! [`Context`] is the fully-populated configuration handed to every driver
//! for the duration of one invocation. It is built once by the resolver,
//! never persisted, and every field is guaranteed to hold a concrete value:
//! drivers read it without existence checks.
//!
//! The fields are typed per section (design note: no string-keyed nested
//! dictionaries), with a thin flat adapter for legacy `(section, key)`
//! reads.

use serde::Serialize;

/// One of the two parallel source trees the tool manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Edition {
    /// Community edition.
    Ce,
    /// Professional edition.
    Pro,
}

impl std::fmt::Display for Edition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ce => write!(f, "ce"),
            Self::Pro => write!(f, "pro"),
        }
    }
}

/// Installation and data directories (`[core]` section).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CoreSection {
    /// User-level data directory (`~/.devbench`).
    pub data_dir: String,
    /// Cache directory for downloaded distribution archives.
    pub download_cache: String,
    /// Directory holding user-editable template files.
    pub template_dir: String,
}

/// Version-control coordinates and working copies (`[src]` section).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SrcSection {
    /// Repository user name.
    pub user: String,
    /// Repository server host.
    pub server: String,
    /// Repository name, community edition.
    pub repo_ce: String,
    /// Repository name, professional edition.
    pub repo_pro: String,
    /// Branch, community edition.
    pub branch_ce: String,
    /// Branch, professional edition.
    pub branch_pro: String,
    /// Checkout URL, community edition.
    pub url_ce: String,
    /// Checkout URL, professional edition.
    pub url_pro: String,
    /// Working copy path, community edition.
    pub working_copy_ce: String,
    /// Working copy path, professional edition.
    pub working_copy_pro: String,
    /// `"true"` when builds should skip tests.
    pub skip_tests: String,
}

/// Application-server home and runtime options (`[tc]` section).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TcSection {
    /// Server installation directory.
    pub home: String,
    /// URL of the server distribution archive.
    pub distribution_url: String,
    /// JVM options passed as `JAVA_OPTS`.
    pub java_opts: String,
    /// Server options passed as `CATALINA_OPTS`.
    pub catalina_opts: String,
}

/// The resolved configuration store for one invocation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Context {
    /// Installation and data directories.
    pub core: CoreSection,
    /// Version-control configuration.
    pub src: SrcSection,
    /// Application-server configuration.
    pub tc: TcSection,
}

impl SrcSection {
    /// Returns the checkout URL for an edition.
    #[must_use]
    pub fn url(&self, edition: Edition) -> &str {
        match edition {
            Edition::Ce => &self.url_ce,
            Edition::Pro => &self.url_pro,
        }
    }

    /// Returns the working copy path for an edition.
    #[must_use]
    pub fn working_copy(&self, edition: Edition) -> &str {
        match edition {
            Edition::Ce => &self.working_copy_ce,
            Edition::Pro => &self.working_copy_pro,
        }
    }

    /// Returns true when builds should skip tests.
    #[must_use]
    pub fn skips_tests(&self) -> bool {
        self.skip_tests == "true"
    }
}

impl Context {
    /// Flat `(section, key)` read adapter for legacy consumers.
    ///
    /// Returns `None` for an unknown section or property; lookup is exact.
    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        let value = match (section, key) {
            ("core", "data_dir") => &self.core.data_dir,
            ("core", "download_cache") => &self.core.download_cache,
            ("core", "template_dir") => &self.core.template_dir,
            ("src", "user") => &self.src.user,
            ("src", "server") => &self.src.server,
            ("src", "repo_ce") => &self.src.repo_ce,
            ("src", "repo_pro") => &self.src.repo_pro,
            ("src", "branch_ce") => &self.src.branch_ce,
            ("src", "branch_pro") => &self.src.branch_pro,
            ("src", "url_ce") => &self.src.url_ce,
            ("src", "url_pro") => &self.src.url_pro,
            ("src", "working_copy_ce") => &self.src.working_copy_ce,
            ("src", "working_copy_pro") => &self.src.working_copy_pro,
            ("src", "skip_tests") => &self.src.skip_tests,
            ("tc", "home") => &self.tc.home,
            ("tc", "distribution_url") => &self.tc.distribution_url,
            ("tc", "java_opts") => &self.tc.java_opts,
            ("tc", "catalina_opts") => &self.tc.catalina_opts,
            _ => return None,
        };
        Some(value.as_str())
    }

    /// Renders the documented introspection subset, one `key = value` line
    /// per property, in fixed order. Read-only.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (key, value) in self.display_entries() {
            out.push_str(key);
            out.push_str(" = ");
            out.push_str(value);
            out.push('\n');
        }
        out
    }

    /// The fixed display order of the introspection subset.
    #[must_use]
    pub fn display_entries(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("src.url_ce", self.src.url_ce.as_str()),
            ("src.url_pro", self.src.url_pro.as_str()),
            ("src.working_copy_ce", self.src.working_copy_ce.as_str()),
            ("src.working_copy_pro", self.src.working_copy_pro.as_str()),
            ("src.skip_tests", self.src.skip_tests.as_str()),
            ("tc.home", self.tc.home.as_str()),
            ("tc.distribution_url", self.tc.distribution_url.as_str()),
            ("tc.java_opts", self.tc.java_opts.as_str()),
            ("tc.catalina_opts", self.tc.catalina_opts.as_str()),
        ]
    }
}
