use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the static site deploy workspace",
    long_about = "A unified CLI for CI checks and release packaging of the\n\
                  site_deploy binary."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run CI checks (fmt, clippy, tests)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::All)]
        job: CiJob,
    },
    /// Build site_deploy and package it as a zip archive under dist/
    Package {
        /// Compilation target triple
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        /// Build profile used for the binary
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting and clippy
    Check,
    /// Workspace tests
    Test,
    /// Run check + test
    All,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn as_cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

const BINARY: &str = "site_deploy";

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn package_binary(target: &str, profile: BuildProfile) {
    ensure_rust_target_installed(target);

    step("Build site_deploy binary");

    let mut cargo_args = vec![
        "build",
        "-p",
        "site_deploy_aws",
        "--target",
        target,
        "--bin",
        BINARY,
    ];
    if let Some(flag) = profile.as_cargo_flag() {
        cargo_args.push(flag);
    }
    run_cargo(&cargo_args);

    step("Package release archive");
    let target_dir = Path::new("target").join(target).join(profile.dir_name());
    let dist_dir = Path::new("dist");
    fs::create_dir_all(dist_dir).expect("failed to create dist directory");

    let binary_file = binary_name(BINARY, target);
    let archive = dist_dir.join(format!("{BINARY}-{target}.zip"));
    package_zip(&target_dir.join(&binary_file), &binary_file, &archive);

    eprintln!("\nPackaged artifact:\n- {}", archive.display());
}

fn ensure_rust_target_installed(target: &str) {
    let output = Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output();

    let output = match output {
        Ok(value) => value,
        Err(error) => {
            eprintln!(
                "warning: failed to run `rustup target list --installed` ({error}); continuing without target preflight"
            );
            return;
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!(
            "failed to list installed rust targets; run `rustup target list --installed` manually. details: {}",
            stderr.trim()
        );
    }

    let installed = String::from_utf8_lossy(&output.stdout);
    if !installed.lines().any(|line| line.trim() == target) {
        panic!(
            "required rust target `{target}` is not installed. install it with `rustup target add {target}` and re-run `cargo run -p xtask -- package`"
        );
    }
}

fn binary_name(bin_name: &str, target: &str) -> String {
    if target.contains("windows") {
        format!("{bin_name}.exe")
    } else {
        bin_name.to_string()
    }
}

fn package_zip(binary_path: &Path, entry_name: &str, zip_path: &Path) {
    if !binary_path.exists() {
        panic!("expected binary at '{}'", binary_path.display());
    }

    let binary = fs::read(binary_path).expect("failed to read binary");
    let file = fs::File::create(zip_path).expect("failed to create zip archive");
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file(entry_name, options)
        .expect("failed to start binary entry in zip archive");
    zip.write_all(&binary).expect("failed to write binary entry");
    zip.finish().expect("failed to finish zip archive");
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);
}

fn ci_test() {
    step("Test site_deploy_core");
    run_cargo(&["test", "-p", "site_deploy_core"]);

    step("Test site_deploy_aws");
    run_cargo(&["test", "-p", "site_deploy_aws"]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { job } => {
            match job {
                CiJob::Check => ci_check(),
                CiJob::Test => ci_test(),
                CiJob::All => {
                    ci_check();
                    ci_test();
                }
            }
            eprintln!("\nCI job passed.");
        }
        Commands::Package { target, profile } => {
            package_binary(&target, profile);
        }
    }
}
