// SPDX-License-Identifier: MPL-2.0

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");
    println!("cargo::rerun-if-env-changed=SCANNER_VERSION");

    // Packaged builds (flatpak, distro) pass the version in explicitly
    let version = std::env::var("SCANNER_VERSION")
        .ok()
        .or_else(describe_head)
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

/// Build a version string from git.
///
/// - exact tag `v0.1.0` → `0.1.0-<hash>`
/// - `v0.1.0-5-gabcdef1` → `0.1.0-dirty-abcdef1`
/// - no tags → `<hash>`
fn describe_head() -> Option<String> {
    let describe = git(&["describe", "--tags", "--always", "--match", "v*"])?;
    let hash = git(&["rev-parse", "--short", "HEAD"])?;
    let describe = describe.strip_prefix('v').unwrap_or(&describe).to_string();

    let mut parts = describe.rsplitn(3, '-');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(tail), Some(_commits), Some(base)) => {
            let tail = tail.strip_prefix('g').unwrap_or(tail);
            Some(format!("{}-dirty-{}", base, tail))
        }
        _ if describe == hash => Some(hash),
        _ => Some(format!("{}-{}", describe, hash)),
    }
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
