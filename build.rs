use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Короткий хеш коммита для `dotbus --version`
    let commit = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|out| out.status.success())
        .and_then(|out| String::from_utf8(out.stdout).ok())
        .unwrap_or_else(|| "unknown".into());
    println!("cargo:rustc-env=DOTBUS_GIT_COMMIT={}", commit.trim());

    let built_at = chrono::Utc::now().to_rfc3339();
    println!("cargo:rustc-env=DOTBUS_BUILD_TIME={built_at}");
}
