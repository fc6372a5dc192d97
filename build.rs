fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!(
        "cargo:rustc-env=CODEGRADE_BUILD_DATE={}",
        chrono::Utc::now().format("%Y-%m-%d")
    );

    // Short commit hash for the report footer, when built from a checkout
    let hash = std::process::Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string());
    if let Some(hash) = hash {
        println!("cargo:rustc-env=CODEGRADE_GIT_HASH={hash}");
    }
}
