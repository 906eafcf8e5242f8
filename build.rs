//! Build stamp for `star --version`: commit, enabled features, UTC build time.

use std::process::Command;

fn git_commit() -> Option<String> {
    let out = Command::new("git").args(["rev-parse", "--short=10", "HEAD"]).output().ok()?;
    if !out.status.success() {
        return None;
    }
    let hash = String::from_utf8(out.stdout).ok()?.trim().to_string();
    let dirty = Command::new("git")
        .args(["status", "--porcelain", "--untracked-files=no"])
        .output()
        .map(|o| o.status.success() && !o.stdout.is_empty())
        .unwrap_or(false);
    Some(if dirty { format!("{hash}-dirty") } else { hash })
}

/// Cargo exposes each enabled feature as `CARGO_FEATURE_<NAME>`.
fn enabled_features() -> String {
    let mut features: Vec<String> = std::env::vars()
        .filter_map(|(k, _)| k.strip_prefix("CARGO_FEATURE_").map(|f| f.to_lowercase().replace('_', "-")))
        .collect();
    features.sort();
    if features.is_empty() {
        "none".to_string()
    } else {
        features.join(",")
    }
}

fn main() {
    // Reproducible builds pin the stamp through the environment.
    let commit = std::env::var("STAR_GIT_COMMIT").ok().or_else(git_commit).unwrap_or_else(|| "unknown".into());
    let stamp = std::env::var("STAR_BUILD_STAMP").unwrap_or_else(|_| {
        let fmt = time::macros::format_description!("[year]-[month]-[day] [hour]:[minute] UTC");
        time::OffsetDateTime::now_utc().format(&fmt).unwrap_or_else(|_| "unknown".into())
    });

    println!("cargo:rustc-env=STAR_GIT_COMMIT={commit}");
    println!("cargo:rustc-env=STAR_FEATURES={}", enabled_features());
    println!("cargo:rustc-env=STAR_BUILD_STAMP={stamp}");
    println!("cargo:rerun-if-env-changed=STAR_GIT_COMMIT");
    println!("cargo:rerun-if-env-changed=STAR_BUILD_STAMP");
    if std::path::Path::new(".git/HEAD").exists() {
        println!("cargo:rerun-if-changed=.git/HEAD");
    }
}
