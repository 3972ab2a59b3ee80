use std::{fs, path::PathBuf};

use tempfile::tempdir;

use classdiagram_cli::{Args, CliError, Emit, OutputFormat, run};

/// Collects all .mmd files from a directory
fn collect_mmd_files(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("mmd")
            })
            .collect()
    } else {
        Vec::new()
    };

    // Sort for consistent test output
    files.sort();
    files
}

/// Demos are at workspace root, relative to workspace not the crate
fn demos_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|crates| crates.parent())
        .expect("crate lives two levels below the workspace root")
        .join("demos")
}

fn args_for(input: &PathBuf, output: PathBuf, emit: Emit, format: OutputFormat) -> Args {
    Args {
        input: input.to_string_lossy().to_string(),
        output: Some(output.to_string_lossy().to_string()),
        emit,
        format: Some(format),
        config: None,
        log_level: "off".to_string(),
    }
}

#[test]
fn e2e_smoke_test_valid_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    let valid_demos = collect_mmd_files(demos_path());
    assert!(!valid_demos.is_empty(), "No valid demos found in demos/");

    let mut failed_demos = Vec::new();

    for demo_path in &valid_demos {
        let stem = demo_path
            .file_stem()
            .expect("demo file has a name")
            .to_string_lossy()
            .to_string();

        for (emit, format, extension) in [
            (Emit::Ast, OutputFormat::Json, "json"),
            (Emit::Ast, OutputFormat::Debug, "txt"),
            (Emit::Tokens, OutputFormat::Json, "tokens.json"),
        ] {
            let output_path = temp_dir.path().join(format!("{stem}.{extension}"));
            let args = args_for(demo_path, output_path.clone(), emit, format);

            match run(&args) {
                Ok(()) => {
                    let written = fs::read_to_string(&output_path).unwrap_or_default();
                    if written.is_empty() {
                        failed_demos.push((demo_path.clone(), "empty output".to_string()));
                    }
                }
                Err(e) => failed_demos.push((demo_path.clone(), e.to_string())),
            }
        }
    }

    if !failed_demos.is_empty() {
        eprintln!("\nValid demos that failed:");
        for (path, err) in &failed_demos {
            eprintln!("  - {}: {}", path.display(), err);
        }
        panic!("{} valid demo run(s) failed unexpectedly", failed_demos.len());
    }

    println!("✅ All {} valid demos passed", valid_demos.len());
}

#[test]
fn e2e_smoke_test_error_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    let error_demos = collect_mmd_files(demos_path().join("errors"));
    assert!(
        !error_demos.is_empty(),
        "No error demos found in demos/errors/"
    );

    let mut unexpectedly_succeeded = Vec::new();

    for demo_path in &error_demos {
        let output_path = temp_dir.path().join(format!(
            "error_{}.json",
            demo_path
                .file_stem()
                .expect("demo file has a name")
                .to_string_lossy()
        ));
        let args = args_for(demo_path, output_path, Emit::Ast, OutputFormat::Json);

        match run(&args) {
            Err(CliError::Parse { err, .. }) => {
                assert!(
                    !err.diagnostics().is_empty(),
                    "{} failed without diagnostics",
                    demo_path.display()
                );
            }
            Err(other) => panic!("{} failed outside the parser: {other}", demo_path.display()),
            Ok(()) => unexpectedly_succeeded.push(demo_path.clone()),
        }
    }

    if !unexpectedly_succeeded.is_empty() {
        eprintln!("\nError demos that unexpectedly succeeded:");
        for path in &unexpectedly_succeeded {
            eprintln!("  - {}", path.display());
        }
        panic!(
            "{} error demo(s) succeeded unexpectedly",
            unexpectedly_succeeded.len()
        );
    }

    println!("✅ All {} error demos failed as expected", error_demos.len());
}

#[test]
fn e2e_tokens_do_not_need_a_valid_diagram() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = temp_dir.path().join("broken.mmd");
    fs::write(&input, "class\nA -->\n").expect("write input");
    let output = temp_dir.path().join("broken.tokens.json");

    run(&args_for(&input, output.clone(), Emit::Tokens, OutputFormat::Json))
        .expect("tokenizing never fails");

    let written = fs::read_to_string(output).expect("read output");
    assert!(written.contains("\"Eof\""));
}
