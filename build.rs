use std::process::Command;

/// Short commit hash of the checkout, if this is one.
fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    Some(hash.trim().to_string()).filter(|hash| !hash.is_empty())
}

fn main() {
    // Packaged builds have no .git, so let the packager pass the hash in.
    let build_hash = std::env::var("OWA_BUILD_HASH")
        .ok()
        .filter(|hash| !hash.trim().is_empty())
        .or_else(git_short_hash)
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=GIT_HASH={}", build_hash);

    println!("cargo:rerun-if-env-changed=OWA_BUILD_HASH");
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads/");
}
