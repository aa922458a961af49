// Build scripts signal errors by panicking; there is no caller to
// return Result to.
#![allow(clippy::expect_used, clippy::panic)]

//! Compiles `tailwind.css` into `$OUT_DIR/assets/tailwind.css` with
//! `npx @tailwindcss/cli`, so plain `cargo` builds work without `dx`.
//!
//! Without Node.js the stylesheet is empty and a warning is printed;
//! the app still runs, unstyled.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::{env, fs};

/// Source directories Tailwind scans for class names. Cargo watches a
/// directory recursively.
const CLASS_SOURCES: [&str; 2] = ["src", "../reunite-io/src"];

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR"));
    let assets_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR")).join("assets");
    fs::create_dir_all(&assets_dir)
        .unwrap_or_else(|e| panic!("failed to create {}: {e}", assets_dir.display()));

    let input = manifest_dir.join("tailwind.css");
    let output = assets_dir.join("tailwind.css");
    println!("cargo:rerun-if-changed={}", input.display());
    for dir in CLASS_SOURCES {
        println!("cargo:rerun-if-changed={}", manifest_dir.join(dir).display());
    }

    let minify = env::var("PROFILE").is_ok_and(|profile| profile == "release");
    if let Err(reason) = compile_stylesheet(&input, &output, minify) {
        println!("cargo:warning={reason}; styles disabled");
        fs::write(&output, "")
            .unwrap_or_else(|e| panic!("failed to write {}: {e}", output.display()));
    }
    println!("cargo:rustc-env=TAILWIND_CSS_PATH={}", output.display());
}

fn compile_stylesheet(input: &Path, output: &Path, minify: bool) -> Result<(), String> {
    let mut tailwind = Command::new("npx");
    tailwind
        .arg("@tailwindcss/cli")
        .arg("-i")
        .arg(input)
        .arg("-o")
        .arg(output);
    if minify {
        tailwind.arg("--minify");
    }
    match tailwind.status() {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => Err(format!("tailwind exited with {status}")),
        Err(e) => Err(format!("could not run npx ({e})")),
    }
}
