use std::env;
use std::process::Command;

// Values surfaced by the CLI `version` command through `utils::build_info`.
fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=.git/HEAD");

    let status = command_stdout("git", &["status", "--porcelain"])
        .map(|out| if out.is_empty() { "clean" } else { "dirty" })
        .unwrap_or("unknown");
    let built_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);

    let values = [
        ("HASH", command_stdout("git", &["rev-parse", "--short", "HEAD"])),
        ("STATUS", Some(status.to_string())),
        ("TIMESTAMP", Some(built_at)),
        ("TARGET", env::var("TARGET").ok()),
        ("PROFILE", env::var("PROFILE").ok()),
        ("RUSTC", command_stdout("rustc", &["--version"])),
    ];
    for (key, value) in values {
        let value = value.unwrap_or_else(|| "unknown".to_string());
        println!("cargo:rustc-env=SPLIT_CORE_BUILD_{key}={value}");
    }
}

/// Trimmed stdout of a successful command; `None` when it fails or prints nothing.
fn command_stdout(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    Some(text.trim().to_string())
}
