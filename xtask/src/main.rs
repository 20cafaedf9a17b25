use camino::{Utf8Path, Utf8PathBuf};
use chartlens::{Harness, RenderOptions, prepare_bootstrap};
use chartlens_compare::{CompareResult, artifact_images, compare_artifacts, extract_artifacts, extract_program_output};
use rayon::prelude::*;
use std::fs;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: cargo xtask <command>");
        eprintln!("Commands:");
        eprintln!("  gallery    Render every fixture script into an HTML page");
        std::process::exit(1);
    }

    match args[1].as_str() {
        "gallery" => gallery(),
        _ => {
            eprintln!("Unknown command: {}", args[1]);
            std::process::exit(1);
        }
    }
}

/// Outcome of running one fixture script
struct Rendered {
    name: String,
    source: String,
    status: i32,
    stdout: String,
    stderr: String,
    compare: Option<CompareResult>,
}

fn render_fixture(path: &Utf8Path) -> Rendered {
    let source = fs::read_to_string(path).unwrap_or_default();
    let mut harness = Harness::new(Vec::new(), Vec::new(), RenderOptions::default());
    let status = harness.run(&prepare_bootstrap(&source));
    let stdout = harness.out().contents();
    let stderr = String::from_utf8_lossy(harness.err()).into_owned();

    let expect_path = path.with_extension("expect.json");
    let compare = fs::read_to_string(&expect_path)
        .ok()
        .and_then(|text| serde_json::from_str::<serde_json::Value>(&text).ok())
        .and_then(|expect| expect["artifacts"].as_array().cloned())
        .map(|expected| compare_artifacts(&expected, &stdout));

    Rendered {
        name: path.file_stem().unwrap_or_default().to_string(),
        source,
        status,
        stdout,
        stderr,
        compare,
    }
}

fn gallery() {
    let manifest_dir = Utf8Path::new(env!("CARGO_MANIFEST_DIR"));
    let root = manifest_dir.parent().unwrap_or(manifest_dir);
    let scripts_dir = root.join("tests/scripts");
    let output_path = root.join("gallery.html");

    let mut paths: Vec<Utf8PathBuf> = fs::read_dir(&scripts_dir)
        .expect("Failed to read fixture directory")
        .filter_map(|e| e.ok())
        .filter_map(|e| Utf8PathBuf::from_path_buf(e.path()).ok())
        .filter(|p| p.extension() == Some("fig"))
        .collect();
    paths.sort();

    let results: Vec<Rendered> = paths
        .par_iter()
        .map(|path| {
            eprintln!("Rendering {}...", path.file_name().unwrap_or_default());
            render_fixture(path)
        })
        .collect();

    let total = results.len();
    let passed = results
        .iter()
        .filter(|r| r.compare.as_ref().is_none_or(CompareResult::is_match))
        .count();

    let mut html = String::new();
    html.push_str(&format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Chart Gallery</title>
    <style>
        * {{ box-sizing: border-box; }}
        body {{
            font-family: system-ui, sans-serif;
            margin: 0;
            background: #eee;
            color: #333;
        }}
        .page {{ max-width: 1200px; margin: 0 auto; padding: 24px; }}
        h1 {{ font-weight: 600; font-size: 20px; margin: 0 0 24px 0; }}
        .test-card {{
            background: white;
            border-radius: 8px;
            box-shadow: 0 1px 3px rgba(0,0,0,0.08);
            margin-bottom: 16px;
            overflow: hidden;
        }}
        .test-header {{
            display: flex;
            justify-content: space-between;
            padding: 12px 16px;
            border-bottom: 1px solid #eee;
            background: #fafafa;
        }}
        .test-title {{ font-weight: 600; font-size: 13px; }}
        .test-status {{ font-size: 11px; font-weight: 600; padding: 3px 8px; border-radius: 4px; }}
        .test-status.match {{ background: #dcfce7; color: #166534; }}
        .test-status.mismatch {{ background: #fee2e2; color: #991b1b; }}
        .test-body {{ padding: 12px 16px; }}
        .images {{ display: flex; flex-wrap: wrap; gap: 12px; }}
        .images figure {{ margin: 0; }}
        .images img {{ max-width: 360px; border: 1px solid #e5e5e5; }}
        .images figcaption {{ font-size: 11px; color: #666; }}
        pre {{ background: #f5f5f5; padding: 8px; font-size: 12px; overflow-x: auto; }}
        .error {{ background: #fef2f2; color: #991b1b; }}
    </style>
</head>
<body>
<div class="page">
<h1>Chart Gallery: {passed} / {total} matching</h1>
"#
    ));

    for r in &results {
        let (status_class, status_text) = match &r.compare {
            Some(result) if !result.is_match() => ("mismatch", "MISMATCH"),
            Some(_) => ("match", "MATCH"),
            None => ("match", "RENDERED"),
        };

        let mut images = String::new();
        for (i, artifact) in extract_artifacts(&r.stdout).unwrap_or_default().iter().enumerate() {
            let chart_type = artifact["value"]["type"].as_str().unwrap_or("?");
            for (name, png) in artifact_images(artifact) {
                images.push_str(&format!(
                    r#"<figure><img src="data:image/png;base64,{png}"><figcaption>#{i} {chart_type} / {name}</figcaption></figure>"#
                ));
            }
        }

        let program_output = extract_program_output(&r.stdout);
        let mut details = String::new();
        if !program_output.is_empty() {
            details.push_str(&format!("<pre>{}</pre>", html_escape(&program_output)));
        }
        if r.status != 0 {
            details.push_str(&format!(
                r#"<pre class="error">exit {}
{}</pre>"#,
                r.status,
                html_escape(&r.stderr)
            ));
        }
        if let Some(result) = r.compare.as_ref().filter(|c| !c.is_match()) {
            details.push_str(&format!("<pre>{}</pre>", html_escape(&format!("{result:#?}"))));
        }

        html.push_str(&format!(
            r#"
<div class="test-card" id="{name}">
    <div class="test-header">
        <span class="test-title">{name}</span>
        <span class="test-status {status_class}">{status_text}</span>
    </div>
    <div class="test-body">
        <div class="images">{images}</div>
        {details}
        <details>
            <summary>Source</summary>
            <pre>{source}</pre>
        </details>
    </div>
</div>
"#,
            name = r.name,
            source = html_escape(&r.source),
        ));
    }

    html.push_str("</div>\n</body></html>");

    fs::write(&output_path, html).expect("Failed to write HTML");
    println!("Generated gallery at: {output_path}");
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
