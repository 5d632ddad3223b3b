//! Build script exposing revision and toolchain metadata to `/about`.

use std::process::Command;

fn main() {
    let build_time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    println!("cargo:rustc-env=CONSULATE_BUILD_TIME={}", build_time);

    let git_hash = git_hash().unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=CONSULATE_GIT_HASH={}", git_hash);

    let rust_version = rust_version().unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=CONSULATE_RUST_VERSION={}", rust_version);

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=Cargo.toml");
}

fn git_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    Some(hash.trim().to_string())
}

fn rust_version() -> Option<String> {
    let rustc = std::env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    let output = Command::new(rustc).arg("--version").output().ok()?;
    let version = String::from_utf8(output.stdout).ok()?;
    version.split_whitespace().nth(1).map(str::to_string)
}
