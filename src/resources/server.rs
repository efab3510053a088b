//! Application-server driver.
//!
//! Manages the local Tomcat instance: fetches and extracts the
//! distribution, runs the `catalina.sh` lifecycle script with options from
//! the resolved context, deploys build artifacts, and reports running
//! instances by scanning the process table.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use sysinfo::System;
use tracing::{debug, info};

use crate::context::{Context, Edition};
use crate::error::{DevbenchError, Result, ServerError};

/// Main class of the server bootstrap process, used for process discovery.
const BOOTSTRAP_CLASS: &str = "org.apache.catalina.startup.Bootstrap";

/// Grace period between stop and start on restart.
const RESTART_DELAY: Duration = Duration::from_secs(6);

/// Context path the web application is deployed under.
const WEBAPP_PATH: &str = "server-pro";

/// A running server instance found in the process table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInstance {
    /// Process id.
    pub pid: u32,
    /// HTTP port parsed from the process arguments, when present.
    pub http_port: Option<u16>,
    /// JDWP debug port parsed from the process arguments, when present.
    pub debug_port: Option<u16>,
}

/// Driver for the local application server.
#[derive(Debug)]
pub struct ServerDriver<'a> {
    ctx: &'a Context,
}

impl<'a> ServerDriver<'a> {
    /// Creates a driver reading from the given context.
    #[must_use]
    pub const fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    /// Prepares the server installation: downloads the distribution
    /// archive into the cache (skipped when already cached), creates the
    /// server home, extracts the archive into it, and overlays any local
    /// template files on top of the extracted tree.
    ///
    /// # Errors
    ///
    /// Returns an error when the download or extraction fails.
    pub fn init(&self) -> Result<()> {
        let archive = self.fetch_distribution()?;

        let home = Path::new(&self.ctx.tc.home);
        if !home.exists() {
            std::fs::create_dir_all(home)?;
        }

        info!("Extracting {} into {}", archive.display(), home.display());
        let status = Command::new("tar")
            .arg("-xf")
            .arg(&archive)
            .arg("-C")
            .arg(home)
            .arg("--strip-components=1")
            .status()
            .map_err(|e| ServerError::ExtractFailed {
                archive: archive.clone(),
                message: e.to_string(),
            })?;

        if !status.success() {
            return Err(ServerError::ExtractFailed {
                archive,
                message: format!("tar exited with status {}", status.code().unwrap_or(-1)),
            }
            .into());
        }

        self.overlay_templates(home)?;

        Ok(())
    }

    /// Copies `<template dir>/tomcat/` over the server home, overwriting
    /// distribution defaults with locally customised files. A no-op when
    /// the template subtree does not exist.
    fn overlay_templates(&self, home: &Path) -> Result<()> {
        let overlay = Path::new(&self.ctx.core.template_dir).join("tomcat");
        if !overlay.is_dir() {
            debug!("No server template overlay at {}", overlay.display());
            return Ok(());
        }

        info!("Overlaying {} onto {}", overlay.display(), home.display());
        copy_tree(&overlay, home)?;
        Ok(())
    }

    /// Downloads the distribution archive unless a cached copy exists.
    /// Returns the path of the cached archive.
    fn fetch_distribution(&self) -> Result<PathBuf> {
        let url = &self.ctx.tc.distribution_url;
        let file_name = url
            .rsplit('/')
            .next()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ServerError::DownloadFailed {
                url: url.clone(),
                message: "URL has no file name component".to_string(),
            })?;

        let archive = Path::new(&self.ctx.core.download_cache).join(file_name);
        if archive.is_file() {
            debug!("Distribution already cached: {}", archive.display());
            return Ok(archive);
        }

        info!("Downloading {url}");
        let download_failed = |message: String| ServerError::DownloadFailed {
            url: url.clone(),
            message,
        };

        let response =
            reqwest::blocking::get(url.as_str()).map_err(|e| download_failed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(download_failed(format!("HTTP status {}", response.status())).into());
        }
        let body = response
            .bytes()
            .map_err(|e| download_failed(e.to_string()))?;

        let mut file = std::fs::File::create(&archive)?;
        file.write_all(&body)?;
        file.sync_all()?;

        Ok(archive)
    }

    /// Starts the server.
    ///
    /// # Errors
    ///
    /// Returns an error when the control script cannot be run.
    pub fn start(&self) -> Result<()> {
        self.catalina("start")
    }

    /// Stops the server.
    ///
    /// # Errors
    ///
    /// Returns an error when the control script cannot be run.
    pub fn stop(&self) -> Result<()> {
        self.catalina("stop")
    }

    /// Stops, waits a grace period, and starts again.
    ///
    /// # Errors
    ///
    /// Returns an error when either lifecycle action fails.
    pub fn restart(&self) -> Result<()> {
        self.stop()?;
        std::thread::sleep(RESTART_DELAY);
        self.start()
    }

    /// Runs the `catalina.sh` script with options from the context in the
    /// environment.
    fn catalina(&self, action: &str) -> Result<()> {
        let script = Path::new(&self.ctx.tc.home).join("bin").join("catalina.sh");
        info!("catalina {action} ({})", script.display());

        let status = Command::new(&script)
            .arg(action)
            .env("CATALINA_HOME", &self.ctx.tc.home)
            .env("CATALINA_OPTS", &self.ctx.tc.catalina_opts)
            .env("JAVA_OPTS", &self.ctx.tc.java_opts)
            .status()
            .map_err(|e| ServerError::ControlFailed {
                action: action.to_string(),
                message: e.to_string(),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ServerError::ControlFailed {
                action: action.to_string(),
                message: format!("exit status {}", status.code().unwrap_or(-1)),
            }
            .into())
        }
    }

    /// Deploys the full web application through the build system.
    ///
    /// # Errors
    ///
    /// Returns an error when the build tool fails.
    pub fn deploy_webapp(&self) -> Result<()> {
        let build_file = PathBuf::from(&self.ctx.src.working_copy_ce)
            .join("buildomatic")
            .join("build.xml");

        info!("ant deploy-webapp-pro ({})", build_file.display());
        let status = Command::new("ant")
            .arg("-buildfile")
            .arg(&build_file)
            .arg("deploy-webapp-pro")
            .status()
            .map_err(|e| ServerError::ControlFailed {
                action: "deploy".to_string(),
                message: e.to_string(),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ServerError::ControlFailed {
                action: "deploy".to_string(),
                message: format!("ant exited with status {}", status.code().unwrap_or(-1)),
            }
            .into())
        }
    }

    /// Hot-deploys one module's built jar into the deployed webapp.
    ///
    /// Looks for a single jar under `<working copy>/<dir>/target/` and
    /// copies it into the webapp's `WEB-INF/lib`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::NothingToDeploy`] when no jar is present.
    pub fn deploy_jar(&self, edition: Edition, dir_name: &str) -> Result<()> {
        let source_dir = PathBuf::from(self.ctx.src.working_copy(edition))
            .join(dir_name)
            .join("target");

        let jar = find_jar(&source_dir)?.ok_or_else(|| ServerError::NothingToDeploy {
            location: source_dir.display().to_string(),
        })?;

        let destination = Path::new(&self.ctx.tc.home)
            .join("webapps")
            .join(WEBAPP_PATH)
            .join("WEB-INF")
            .join("lib");

        info!("Copying {} into {}", jar.display(), destination.display());
        let file_name = jar
            .file_name()
            .ok_or_else(|| DevbenchError::internal("jar path has no file name"))?;
        std::fs::copy(&jar, destination.join(file_name))?;

        Ok(())
    }

    /// Finds running server instances belonging to this context's server
    /// home by scanning the process table.
    #[must_use]
    pub fn status(&self) -> Vec<ServerInstance> {
        let system = System::new_all();
        let home_arg = format!("-Dcatalina.home={}", self.ctx.tc.home);

        let mut instances = Vec::new();
        for (pid, process) in system.processes() {
            let args: Vec<&str> = process
                .cmd()
                .iter()
                .filter_map(|a| a.to_str())
                .collect();

            let is_bootstrap = args.iter().any(|a| *a == BOOTSTRAP_CLASS);
            let is_ours = args.iter().any(|a| *a == home_arg);
            if is_bootstrap && is_ours {
                instances.push(ServerInstance {
                    pid: pid.as_u32(),
                    http_port: http_port_from_args(&args),
                    debug_port: debug_port_from_args(&args),
                });
            }
        }

        instances
    }

    /// Opens the deployed application in the browser; the HTTP port comes
    /// from the resolved `tc.java_opts`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::HttpPortUnknown`] when no port setting is
    /// present in the runtime options.
    pub fn go(&self) -> Result<()> {
        let args: Vec<&str> = self.ctx.tc.java_opts.split_whitespace().collect();
        let port = http_port_from_args(&args).ok_or(ServerError::HttpPortUnknown)?;

        let url = app_url(port);
        info!("Opening {url}");
        Command::new("xdg-open")
            .arg(&url)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .map_err(|e| ServerError::ControlFailed {
                action: "go".to_string(),
                message: e.to_string(),
            })?;

        Ok(())
    }
}

/// Extracts the HTTP port from `-Dport.http=<port>` arguments.
#[must_use]
pub fn http_port_from_args(args: &[&str]) -> Option<u16> {
    args.iter()
        .find_map(|a| a.strip_prefix("-Dport.http="))
        .and_then(|p| p.parse().ok())
}

/// Extracts the JDWP debug port from `-agentlib:jdwp=...,address=<port>,...`
/// arguments.
#[must_use]
pub fn debug_port_from_args(args: &[&str]) -> Option<u16> {
    let agent = args
        .iter()
        .find_map(|a| a.strip_prefix("-agentlib:jdwp="))?;

    agent
        .split(',')
        .find_map(|part| part.strip_prefix("address="))
        .and_then(|addr| addr.rsplit(':').next())
        .and_then(|p| p.parse().ok())
}

/// Local URL of the deployed web application on the given HTTP port.
fn app_url(port: u16) -> String {
    format!("http://localhost:{port}/{WEBAPP_PATH}")
}

/// Recursively copies a directory tree into an existing destination,
/// overwriting files that already exist there.
fn copy_tree(from: &Path, to: &Path) -> Result<()> {
    for entry in std::fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            std::fs::create_dir_all(&target)?;
            copy_tree(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}

/// Returns the first jar file in a directory, if any.
fn find_jar(dir: &Path) -> Result<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|e| e == "jar") {
            return Ok(Some(path));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{CoreSection, SrcSection, TcSection};

    fn sample_context(working_copy_ce: &str) -> Context {
        Context {
            core: CoreSection {
                data_dir: "/home/dev/.devbench".into(),
                download_cache: "/home/dev/.devbench/downloads".into(),
                template_dir: "/home/dev/.devbench/templates".into(),
            },
            src: SrcSection {
                user: "alice".into(),
                server: "scm.example.com".into(),
                repo_ce: "server".into(),
                repo_pro: "server-pro".into(),
                branch_ce: "trunk".into(),
                branch_pro: "trunk".into(),
                url_ce: "svn+ssh://alice@scm.example.com/server/trunk".into(),
                url_pro: "svn+ssh://alice@scm.example.com/server-pro/trunk".into(),
                working_copy_ce: working_copy_ce.into(),
                working_copy_pro: "/work/pro".into(),
                skip_tests: "false".into(),
            },
            tc: TcSection {
                home: "/work/tomcat".into(),
                distribution_url: "https://archive.example.com/t.tar.gz".into(),
                java_opts: String::new(),
                catalina_opts: String::new(),
            },
        }
    }

    #[test]
    fn test_deploy_jar_reports_empty_target_dir() {
        let work = tempfile::tempdir().expect("Failed to create temp dir");
        let wc = work.path().join("ce");
        std::fs::create_dir_all(wc.join("core").join("target")).expect("mkdir failed");

        let ctx = sample_context(&wc.display().to_string());
        let driver = ServerDriver::new(&ctx);

        let err = driver
            .deploy_jar(Edition::Ce, "core")
            .expect_err("deploy must fail without a jar");
        match err {
            DevbenchError::Server(ServerError::NothingToDeploy { location }) => {
                assert!(location.ends_with("core/target"), "location: {location}");
            }
            other => panic!("Unexpected error: {other}"),
        }
    }

    #[test]
    fn test_app_url() {
        assert_eq!(app_url(8080), "http://localhost:8080/server-pro");
    }

    #[test]
    fn test_copy_tree_overwrites_existing_files() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let from = dir.path().join("overlay");
        let to = dir.path().join("home");
        std::fs::create_dir_all(from.join("conf")).expect("mkdir failed");
        std::fs::create_dir_all(&to).expect("mkdir failed");

        std::fs::write(from.join("conf").join("server.xml"), b"custom").expect("write failed");
        std::fs::write(from.join("setenv.sh"), b"export X=1").expect("write failed");
        std::fs::create_dir_all(to.join("conf")).expect("mkdir failed");
        std::fs::write(to.join("conf").join("server.xml"), b"stock").expect("write failed");

        copy_tree(&from, &to).expect("copy failed");

        let replaced = std::fs::read(to.join("conf").join("server.xml")).expect("read failed");
        assert_eq!(replaced, b"custom");
        assert!(to.join("setenv.sh").is_file());
    }

    #[test]
    fn test_http_port_from_args() {
        let args = ["-Xmx2048m", "-Dport.http=8080", "-Dport.ajp=8009"];
        assert_eq!(http_port_from_args(&args), Some(8080));
    }

    #[test]
    fn test_http_port_absent() {
        let args = ["-Xmx2048m"];
        assert_eq!(http_port_from_args(&args), None);
    }

    #[test]
    fn test_http_port_unparsable() {
        let args = ["-Dport.http=none"];
        assert_eq!(http_port_from_args(&args), None);
    }

    #[test]
    fn test_debug_port_from_args() {
        let args = ["-agentlib:jdwp=transport=dt_socket,address=1044,server=y,suspend=n"];
        assert_eq!(debug_port_from_args(&args), Some(1044));
    }

    #[test]
    fn test_debug_port_with_host_prefix() {
        let args = ["-agentlib:jdwp=transport=dt_socket,address=*:5005,server=y"];
        assert_eq!(debug_port_from_args(&args), Some(5005));
    }

    #[test]
    fn test_debug_port_absent() {
        let args = ["-Dport.http=8080"];
        assert_eq!(debug_port_from_args(&args), None);
    }

    #[test]
    fn test_find_jar() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        assert_eq!(find_jar(dir.path()).expect("scan failed"), None);

        std::fs::write(dir.path().join("notes.txt"), b"x").expect("write failed");
        std::fs::write(dir.path().join("module.jar"), b"x").expect("write failed");

        let found = find_jar(dir.path()).expect("scan failed").expect("jar expected");
        assert_eq!(found.file_name().and_then(|n| n.to_str()), Some("module.jar"));
    }
}
