use chartlens::{Harness, RenderOptions, prepare_bootstrap};
use chartlens_compare::{CompareResult, compare_artifacts, extract_program_output, write_debug_pngs};
use camino::Utf8Path;
use serde_json::Value;

/// Where images of failing fixtures are written for inspection
const DEBUG_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/target/script-debug");

/// What a fixture expects, read from `<name>.expect.json`:
///
/// - `artifacts`: partial artifact payloads, one per emitted line
/// - `exit_code`: defaults to 0
/// - `output`: exact program output, artifact lines excluded
/// - `stderr`: exact error output
/// - `stderr_contains`: fragments the error output must contain
struct Expectation {
    artifacts: Vec<Value>,
    exit_code: i32,
    output: Option<String>,
    stderr: Option<String>,
    stderr_contains: Vec<String>,
}

fn load_expectation(path: &Utf8Path) -> datatest_stable::Result<Expectation> {
    let expect_path = path.with_extension("expect.json");
    let text = std::fs::read_to_string(&expect_path)
        .map_err(|e| format!("failed to read {expect_path}: {e}"))?;
    let json: Value = serde_json::from_str(&text)?;
    let strings = |key: &str| -> Vec<String> {
        json[key]
            .as_array()
            .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default()
    };
    Ok(Expectation {
        artifacts: json["artifacts"]
            .as_array()
            .cloned()
            .ok_or_else(|| format!("{expect_path} has no artifacts array"))?,
        exit_code: json["exit_code"].as_i64().unwrap_or(0) as i32,
        output: json["output"].as_str().map(str::to_string),
        stderr: json["stderr"].as_str().map(str::to_string),
        stderr_contains: strings("stderr_contains"),
    })
}

fn show_diff(label: &str, expected: &str, actual: &str) -> String {
    let mut out = format!("{label} differs:\n");
    for chunk in dissimilar::diff(expected, actual) {
        match chunk {
            dissimilar::Chunk::Equal(text) => out.push_str(text),
            dissimilar::Chunk::Delete(text) => out.push_str(&format!("[-{text}-]")),
            dissimilar::Chunk::Insert(text) => out.push_str(&format!("{{+{text}+}}")),
        }
    }
    out
}

fn run_fixture(path: &Utf8Path) -> datatest_stable::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let source = std::fs::read_to_string(path)?;
    let expect = load_expectation(path)?;
    let name = path.file_stem().unwrap_or("fixture");

    let options = RenderOptions {
        load_system_fonts: false,
        ..Default::default()
    };
    let mut harness = Harness::new(Vec::new(), Vec::new(), options);
    let status = harness.run(&prepare_bootstrap(&source));
    let stdout = harness.out().contents();
    let stderr = String::from_utf8_lossy(harness.err()).into_owned();

    let mut failures = Vec::new();
    if status != expect.exit_code {
        failures.push(format!(
            "exit code {status}, expected {}\nstderr:\n{stderr}",
            expect.exit_code
        ));
    }
    if let Some(output) = &expect.output {
        let actual = extract_program_output(&stdout);
        if &actual != output {
            failures.push(show_diff("program output", output, &actual));
        }
    }
    if let Some(expected) = &expect.stderr {
        if expected != &stderr {
            failures.push(show_diff("stderr", expected, &stderr));
        }
    }
    for fragment in &expect.stderr_contains {
        if !stderr.contains(fragment.as_str()) {
            failures.push(format!("stderr lacks {fragment:?}:\n{stderr}"));
        }
    }
    match compare_artifacts(&expect.artifacts, &stdout) {
        CompareResult::Match => {}
        CompareResult::ArtifactMismatch { index, path, details } => {
            failures.push(format!("artifact {index} differs at {path}:\n{details}"));
        }
        other => failures.push(format!("{other:?}")),
    }

    if failures.is_empty() {
        Ok(())
    } else {
        write_debug_pngs(Utf8Path::new(DEBUG_DIR), name, &stdout);
        Err(format!("{name}:\n{}", failures.join("\n\n")).into())
    }
}

datatest_stable::harness! {
    { test = run_fixture, root = "tests/scripts", pattern = r"\.fig$" },
}
