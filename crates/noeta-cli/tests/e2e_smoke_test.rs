use std::{fs, path::PathBuf};

use tempfile::tempdir;

use noeta::config::AppConfig;
use noeta_cli::{Args, run};

/// Demo programs live at the workspace root, not in the crate.
fn demos_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("demos")
}

/// Collects all .noeta files from a directory
fn collect_noeta_files(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("noeta")
            })
            .collect()
    } else {
        Vec::new()
    };

    // Sort for consistent test output
    files.sort();
    files
}

fn args(inputs: Vec<String>, output: Option<String>) -> Args {
    Args {
        inputs,
        output,
        config: None,
        type_check: false,
        bindings: None,
        plain: true,
        log_level: "off".to_string(),
    }
}

#[test]
fn e2e_smoke_test_valid_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let valid_demos = collect_noeta_files(demos_path());

    assert!(!valid_demos.is_empty(), "No valid demos found in demos/");

    let mut failed_demos = Vec::new();

    for demo_path in &valid_demos {
        let output_filename = format!("{}.py", demo_path.file_stem().unwrap().to_string_lossy());
        let output_path = temp_dir.path().join(output_filename);

        let args = args(
            vec![demo_path.to_string_lossy().to_string()],
            Some(output_path.to_string_lossy().to_string()),
        );

        match run(&args, &AppConfig::default()) {
            Ok(()) => {
                let python = fs::read_to_string(&output_path).expect("Output should be written");
                assert!(
                    python.contains("import pandas as pd\n"),
                    "Missing pandas import in output for {}",
                    demo_path.display()
                );
            }
            Err(e) => failed_demos.push((demo_path.clone(), e)),
        }
    }

    if !failed_demos.is_empty() {
        eprintln!("\nValid demos that failed:");
        for (path, err) in &failed_demos {
            eprintln!("  - {}: {}", path.display(), err);
        }
        panic!("{} valid demo(s) failed unexpectedly", failed_demos.len());
    }
}

#[test]
fn e2e_smoke_test_error_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let error_demos = collect_noeta_files(demos_path().join("errors"));

    assert!(
        !error_demos.is_empty(),
        "No error demos found in demos/errors/"
    );

    let mut unexpectedly_succeeded = Vec::new();

    for demo_path in &error_demos {
        let output_filename = format!(
            "error_{}.py",
            demo_path.file_stem().unwrap().to_string_lossy()
        );
        let output_path = temp_dir.path().join(output_filename);

        let args = args(
            vec![demo_path.to_string_lossy().to_string()],
            Some(output_path.to_string_lossy().to_string()),
        );

        if run(&args, &AppConfig::default()).is_ok() {
            unexpectedly_succeeded.push(demo_path.clone());
        }
    }

    if !unexpectedly_succeeded.is_empty() {
        eprintln!("\nError demos that should have failed but succeeded:");
        for path in &unexpectedly_succeeded {
            eprintln!("  - {}", path.display());
        }
        panic!(
            "{} error demo(s) succeeded unexpectedly",
            unexpectedly_succeeded.len()
        );
    }
}

#[test]
fn e2e_later_inputs_see_earlier_datasets() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let first = temp_dir.path().join("first.noeta");
    let second = temp_dir.path().join("second.noeta");
    fs::write(&first, "load \"orders.csv\" as orders\n").expect("Failed to write program");
    fs::write(&second, "head orders n=2 as top\n").expect("Failed to write program");
    let output_path = temp_dir.path().join("out.py");

    let args = args(
        vec![
            first.to_string_lossy().to_string(),
            second.to_string_lossy().to_string(),
        ],
        Some(output_path.to_string_lossy().to_string()),
    );
    run(&args, &AppConfig::default()).expect("Session spans inputs");

    let python = fs::read_to_string(&output_path).expect("Output should be written");
    let load = python.find("orders = pd.read_csv('orders.csv')").expect("loads orders");
    let head = python.find("top = orders.head(2)").expect("heads orders");
    assert!(load < head);
}

#[test]
fn e2e_bindings_seed_the_session() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let bindings = temp_dir.path().join("bindings.json");
    fs::write(
        &bindings,
        r#"{"frame": {"kind": "table", "columns": {"amount": "int64"}}}"#,
    )
    .expect("Failed to write bindings");
    let program = temp_dir.path().join("program.noeta");
    fs::write(&program, "filter frame where amount > 3 as big\n").expect("Failed to write program");
    let output_path = temp_dir.path().join("out.py");

    let mut args = args(
        vec![program.to_string_lossy().to_string()],
        Some(output_path.to_string_lossy().to_string()),
    );

    assert!(run(&args, &AppConfig::default()).is_err());

    args.bindings = Some(bindings.to_string_lossy().to_string());
    run(&args, &AppConfig::default()).expect("Bound dataset is visible");
    let python = fs::read_to_string(&output_path).expect("Output should be written");
    assert!(python.contains("big = frame[frame['amount'] > 3].copy()"));
}
