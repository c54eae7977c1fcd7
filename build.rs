//! Embeds the git state shown by `thumbsweep --version`.

use std::process::Command;

/// Trimmed stdout of a successful git command.
fn git(args: &[&str]) -> Option<String> {
    let out = Command::new("git").args(args).output().ok()?;
    out.status
        .success()
        .then(|| String::from_utf8_lossy(&out.stdout).trim().to_string())
}

fn main() {
    for path in [".git/HEAD", ".git/refs/", ".git/index"] {
        println!("cargo:rerun-if-changed={path}");
    }

    // e.g. v0.3.0-4-g1a2b3c4-dirty; empty outside a checkout
    let build = git(&["describe", "--tags", "--always", "--dirty"]).unwrap_or_default();
    let release = !build.ends_with("-dirty")
        && git(&["describe", "--tags", "--exact-match", "HEAD"]).is_some();

    println!("cargo:rustc-env=THUMBSWEEP_BUILD={build}");
    println!("cargo:rustc-env=THUMBSWEEP_RELEASE={release}");
}
