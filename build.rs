// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");
    println!("cargo::rerun-if-env-changed=BOARDSCAN_VERSION");

    // Packagers building from a tarball set the version explicitly
    let version = std::env::var("BOARDSCAN_VERSION").unwrap_or_else(|_| git_version());

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

/// `<tag or crate version>[-<n>]-<hash>`, or the plain crate version outside git
fn git_version() -> String {
    let crate_version = std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".into());

    let Some(describe) = git(&["describe", "--tags", "--always", "--match", "v*"]) else {
        return crate_version;
    };
    let describe = describe.strip_prefix('v').unwrap_or(&describe).to_string();

    // "1.2.0-5-gabcdef1" → "1.2.0-5-abcdef1"
    let parts: Vec<&str> = describe.rsplitn(3, '-').collect();
    if let [hash, commits, tag] = parts.as_slice() {
        let hash = hash.strip_prefix('g').unwrap_or(hash);
        return format!("{}-{}-{}", tag, commits, hash);
    }

    match git(&["rev-parse", "--short", "HEAD"]) {
        // No tag: `describe --always` returned a bare hash
        Some(hash) if hash == describe => format!("{}-{}", crate_version, hash),
        Some(hash) => format!("{}-{}", describe, hash),
        None => describe,
    }
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}
