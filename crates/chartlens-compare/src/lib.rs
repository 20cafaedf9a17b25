//! Artifact comparison utilities for testing chart output.
//!
//! This crate provides shared comparison logic used by both the fixture
//! test harness and the xtask gallery tool.

use base64::Engine;
use camino::Utf8Path;
use serde_json::Value;
use std::fs;

/// Prefix of artifact lines on program output
pub const ARTIFACT_PREFIX: &str = "dtn_artifact:";

/// Tolerance for floating-point comparisons. Coordinates go through a float
/// round trip in JSON, so only formatting noise needs covering.
pub const FLOAT_TOLERANCE: f64 = 1e-6;

/// Result of comparing expected and actual program output
#[derive(Debug, Clone, PartialEq)]
pub enum CompareResult {
    /// Every expected artifact matched
    Match,
    /// A different number of artifacts was emitted
    CountMismatch { expected: usize, actual: usize },
    /// An artifact differs at `path`
    ArtifactMismatch {
        index: usize,
        path: String,
        details: String,
    },
    /// An artifact line is not valid JSON
    ParseError { details: String },
}

impl CompareResult {
    pub fn is_match(&self) -> bool {
        matches!(self, CompareResult::Match)
    }
}

/// Parsed artifact payloads on `output`, in order
pub fn extract_artifacts(output: &str) -> Result<Vec<Value>, String> {
    output
        .lines()
        .filter_map(|line| line.strip_prefix(ARTIFACT_PREFIX))
        .enumerate()
        .map(|(i, json)| {
            serde_json::from_str(json).map_err(|e| format!("artifact {i} is not valid JSON: {e}"))
        })
        .collect()
}

/// Output lines that are not artifacts (print output and the like)
pub fn extract_program_output(output: &str) -> String {
    output
        .lines()
        .filter(|line| !line.starts_with(ARTIFACT_PREFIX))
        .map(|line| format!("{line}\n"))
        .collect()
}

fn numbers_match(a: f64, b: f64) -> bool {
    (a - b).abs() <= FLOAT_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

/// Check that `actual` contains everything in `expected`. Objects may carry
/// extra keys; arrays must have the same length; numbers match within
/// [`FLOAT_TOLERANCE`]. Returns the JSON path of the first difference.
pub fn check_partial(expected: &Value, actual: &Value, path: &str) -> Result<(), String> {
    match (expected, actual) {
        (Value::Object(exp), Value::Object(act)) => {
            for (key, exp_value) in exp {
                let child = format!("{path}.{key}");
                match act.get(key) {
                    Some(act_value) => check_partial(exp_value, act_value, &child)?,
                    None => return Err(child),
                }
            }
            Ok(())
        }
        (Value::Array(exp), Value::Array(act)) => {
            if exp.len() != act.len() {
                return Err(format!("{path} (length {} vs {})", exp.len(), act.len()));
            }
            for (i, (e, a)) in exp.iter().zip(act).enumerate() {
                check_partial(e, a, &format!("{path}[{i}]"))?;
            }
            Ok(())
        }
        (Value::Number(e), Value::Number(a)) => match (e.as_f64(), a.as_f64()) {
            (Some(e), Some(a)) if numbers_match(e, a) => Ok(()),
            _ => Err(path.to_string()),
        },
        (e, a) if e == a => Ok(()),
        _ => Err(path.to_string()),
    }
}

/// Drop the bulky base64 images so diffs stay readable
pub fn strip_images(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let v = match (k.as_str(), v) {
                        ("png", Value::String(s)) => Value::String(format!("<{} bytes>", s.len())),
                        _ => strip_images(v),
                    };
                    (k.clone(), v)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(strip_images).collect()),
        other => other.clone(),
    }
}

/// Line diff of two JSON values, pretty-printed
pub fn render_diff(expected: &Value, actual: &Value) -> String {
    let exp = serde_json::to_string_pretty(expected).unwrap_or_default();
    let act = serde_json::to_string_pretty(&strip_images(actual)).unwrap_or_default();
    let mut out = String::new();
    for chunk in dissimilar::diff(&exp, &act) {
        match chunk {
            dissimilar::Chunk::Equal(text) => out.push_str(text),
            dissimilar::Chunk::Delete(text) => out.push_str(&format!("[-{text}-]")),
            dissimilar::Chunk::Insert(text) => out.push_str(&format!("{{+{text}+}}")),
        }
    }
    out
}

/// Compare the artifacts on `output` with the `expected` partial artifacts
pub fn compare_artifacts(expected: &[Value], output: &str) -> CompareResult {
    let actual = match extract_artifacts(output) {
        Ok(actual) => actual,
        Err(details) => return CompareResult::ParseError { details },
    };
    if actual.len() != expected.len() {
        return CompareResult::CountMismatch {
            expected: expected.len(),
            actual: actual.len(),
        };
    }
    for (index, (exp, act)) in expected.iter().zip(&actual).enumerate() {
        if let Err(path) = check_partial(exp, act, "$") {
            return CompareResult::ArtifactMismatch {
                index,
                path,
                details: render_diff(exp, act),
            };
        }
    }
    CompareResult::Match
}

/// Every image in an artifact, whole figure first, as `(name, base64)`
pub fn artifact_images(artifact: &Value) -> Vec<(String, String)> {
    let mut images = Vec::new();
    let value = &artifact["value"];
    if let Some(png) = value["png"].as_str().filter(|s| !s.is_empty()) {
        images.push(("figure".to_string(), png.to_string()));
    }
    if let Some(subplots) = value["subplots"].as_array() {
        for (i, sub) in subplots.iter().enumerate() {
            if let Some(png) = sub["png"].as_str().filter(|s| !s.is_empty()) {
                images.push((format!("subplot-{i}"), png.to_string()));
            }
        }
    }
    images
}

/// Write the decoded images of every artifact on `output` for inspection.
///
/// Writes `{debug_dir}/{test_name}-{artifact}-{image}.png`, creating the
/// directory if needed.
pub fn write_debug_pngs(debug_dir: &Utf8Path, test_name: &str, output: &str) {
    fs::create_dir_all(debug_dir).ok();
    let Ok(artifacts) = extract_artifacts(output) else {
        return;
    };
    for (i, artifact) in artifacts.iter().enumerate() {
        for (name, png) in artifact_images(artifact) {
            let file = debug_dir.join(format!("{test_name}-{i}-{name}.png"));
            match base64::engine::general_purpose::STANDARD.decode(png) {
                Ok(bytes) => {
                    if let Err(e) = fs::write(&file, bytes) {
                        eprintln!("Warning: Failed to write {file}: {e}");
                    }
                }
                Err(e) => eprintln!("Warning: {file} is not valid base64: {e}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn partial_objects_and_tolerance() {
        let expected = json!({"type": "chart", "value": {"type": "line", "x_ticks": [0.1, 0.2]}});
        let actual = json!({"type": "chart", "value": {"type": "line", "png": "AA==", "x_ticks": [0.1000000001, 0.2]}});
        assert_eq!(check_partial(&expected, &actual, "$"), Ok(()));

        let actual = json!({"type": "chart", "value": {"type": "bar", "x_ticks": [0.1, 0.2]}});
        assert_eq!(check_partial(&expected, &actual, "$"), Err("$.value.type".to_string()));
    }

    #[test]
    fn arrays_must_match_in_length() {
        let err = check_partial(&json!([1, 2]), &json!([1, 2, 3]), "$").unwrap_err();
        assert_eq!(err, "$ (length 2 vs 3)");
    }

    #[test]
    fn artifacts_are_counted() {
        let output = "hello\ndtn_artifact:{\"type\":\"chart\",\"value\":{\"type\":\"unknown\"}}\n";
        assert_eq!(extract_program_output(output), "hello\n");
        let expected = vec![json!({"value": {"type": "unknown"}})];
        assert!(compare_artifacts(&expected, output).is_match());
        assert_eq!(
            compare_artifacts(&[], output),
            CompareResult::CountMismatch { expected: 0, actual: 1 }
        );
    }

    #[test]
    fn images_are_collected() {
        let artifact = json!({"value": {"png": "AA==", "subplots": [{"png": "AQ=="}, {"type": "unknown"}]}});
        let names: Vec<String> = artifact_images(&artifact).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["figure", "subplot-0"]);
    }
}
