//! Stamps GIT_HASH, BUILD_TIMESTAMP and BUILD_PROFILE for the startup banner

use std::process::Command;

fn git_hash() -> Option<String> {
    let output = Command::new("git").args(["rev-parse", "--short=8", "HEAD"]).output().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn main() {
    let hash = git_hash().unwrap_or_else(|| "unknown".to_string());
    let built = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=GIT_HASH={}", hash);
    println!("cargo:rustc-env=BUILD_TIMESTAMP={}", built);
    println!("cargo:rustc-env=BUILD_PROFILE={}", profile);
}
