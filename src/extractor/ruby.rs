use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use tracing::debug;

use super::{Extractor, PackageMap};
use crate::error::RetryExhausted;
use crate::ignore::IgnorePolicy;
use crate::models::Ecosystem;

/// Sentinel candidate meaning "whatever Ruby is already active".
pub const SYSTEM_RUNTIME: &str = "system";

/// The toolchain seam the retry coordinator drives.
///
/// The real implementation shells out to `bundle` (optionally selecting a
/// runtime through rbenv); tests substitute a scripted one.
pub trait BundlerRuntime {
    /// Ordered candidate runtime identifiers, the system sentinel first,
    /// then installed versions newest first.
    fn candidates(&self) -> Vec<String>;

    /// Regenerate/validate the lockfile under `runtime`, bounded by
    /// `timeout`. A timeout fails this candidate, not the whole scan.
    fn lock(&self, dir: &Path, runtime: &str, timeout: Duration) -> Result<()>;

    /// Run the list step and return its raw textual output.
    fn list(&self, dir: &Path, runtime: &str) -> Result<String>;
}

/// `bundle`/rbenv-backed implementation of [`BundlerRuntime`].
pub struct SystemBundler;

impl SystemBundler {
    fn bundle_command(&self, dir: &Path, runtime: &str) -> Command {
        let mut cmd = Command::new("bundle");
        cmd.current_dir(dir).stdin(Stdio::null());
        if runtime != SYSTEM_RUNTIME {
            cmd.env("RBENV_VERSION", runtime);
        }
        cmd
    }
}

impl BundlerRuntime for SystemBundler {
    fn candidates(&self) -> Vec<String> {
        let mut candidates = vec![SYSTEM_RUNTIME.to_string()];
        candidates.extend(installed_runtimes());
        candidates
    }

    fn lock(&self, dir: &Path, runtime: &str, timeout: Duration) -> Result<()> {
        let mut cmd = self.bundle_command(dir, runtime);
        // discard output; a filled pipe would stall a chatty bundler
        cmd.arg("lock").stdout(Stdio::null()).stderr(Stdio::null());
        run_with_timeout(cmd, timeout)
    }

    fn list(&self, dir: &Path, runtime: &str) -> Result<String> {
        let output = self
            .bundle_command(dir, runtime)
            .arg("list")
            .output()
            .context("failed to run bundle list")?;
        if !output.status.success() {
            bail!("bundle list exited with {}", output.status);
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Installed Ruby versions reported by rbenv, newest first. A missing or
/// failing rbenv simply contributes no extra candidates.
fn installed_runtimes() -> Vec<String> {
    let output = match Command::new("rbenv").args(["versions", "--bare"]).output() {
        Ok(output) if output.status.success() => output,
        _ => return Vec::new(),
    };

    let mut versions: Vec<String> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != SYSTEM_RUNTIME)
        .map(String::from)
        .collect();
    versions.sort_by(|a, b| numeric_key(b).cmp(&numeric_key(a)));
    versions
}

fn numeric_key(version: &str) -> Vec<u32> {
    version
        .split(|c: char| !c.is_ascii_digit())
        .filter_map(|part| part.parse().ok())
        .collect()
}

/// Run a command to completion within a wall-clock deadline, killing the
/// process on expiry.
fn run_with_timeout(mut cmd: Command, timeout: Duration) -> Result<()> {
    let mut child = cmd.spawn().context("failed to spawn bundle")?;
    let deadline = Instant::now() + timeout;

    loop {
        if let Some(status) = child.try_wait()? {
            if status.success() {
                return Ok(());
            }
            bail!("exited with {status}");
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            bail!("timed out after {}s", timeout.as_secs());
        }
        std::thread::sleep(Duration::from_millis(100));
    }
}

/// Bounded retry coordinator for Ruby extraction.
///
/// Bundler's behavior depends on which Ruby runtime is active and the
/// right one is not known in advance, so the lock+list pipeline is re-run
/// against successive candidate runtimes until one succeeds. The loop is
/// explicit and bounded by the candidate list, so the number of external
/// invocations stays auditable.
pub struct GemfileExtractor {
    runtime: Box<dyn BundlerRuntime>,
    lock_timeout: Duration,
}

impl GemfileExtractor {
    pub fn new(lock_timeout: Duration) -> Self {
        GemfileExtractor {
            runtime: Box::new(SystemBundler),
            lock_timeout,
        }
    }

    pub fn with_runtime(runtime: Box<dyn BundlerRuntime>, lock_timeout: Duration) -> Self {
        GemfileExtractor {
            runtime,
            lock_timeout,
        }
    }
}

impl Extractor for GemfileExtractor {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Ruby
    }

    /// `location` is the directory holding the Gemfile.
    fn extract(&self, location: &Path, _ignore: &IgnorePolicy) -> Result<PackageMap> {
        let gemfile = location.join("Gemfile");

        if !location.join("Gemfile.lock").exists() {
            debug!(dir = %location.display(), "no Gemfile.lock, generating");
            if let Err(err) = self
                .runtime
                .lock(location, SYSTEM_RUNTIME, self.lock_timeout)
            {
                debug!(%err, "initial lock failed, candidate loop will retry");
            }
        }

        for candidate in self.runtime.candidates() {
            debug!(candidate = %candidate, "trying Ruby runtime");

            if let Err(err) = self.runtime.lock(location, &candidate, self.lock_timeout) {
                debug!(candidate = %candidate, %err, "lock step failed");
                continue;
            }
            match self.runtime.list(location, &candidate) {
                Ok(output) => return Ok(parse_gem_list(&output)),
                Err(err) => {
                    debug!(candidate = %candidate, %err, "list step failed");
                    continue;
                }
            }
        }

        Err(RetryExhausted(gemfile).into())
    }
}

/// Parse `bundle list` output: one gem per `  * name (version)` line.
/// Headers, blanks and malformed lines are skipped.
fn parse_gem_list(output: &str) -> PackageMap {
    let mut gathered = PackageMap::new();

    for line in output.lines() {
        let Some(rest) = line.trim().strip_prefix('*') else {
            continue;
        };
        let rest = rest.trim();
        if rest.is_empty() {
            continue;
        }
        match rest.split_once(' ') {
            Some((name, tail)) => {
                let version = tail
                    .trim()
                    .strip_prefix('(')
                    .and_then(|t| t.strip_suffix(')'))
                    .unwrap_or("")
                    .to_string();
                gathered.insert(name.to_string(), version);
            }
            None => {
                gathered.insert(rest.to_string(), String::new());
            }
        }
    }

    gathered
}
