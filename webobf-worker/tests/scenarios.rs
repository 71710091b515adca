//! End-to-end runs through the orchestrator and worker

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use webobf_core::ObfuscateError;
use webobf_worker::{Orchestrator, Outcome, ProgressReporter, StartArgs};

#[derive(Default)]
struct Recorder {
    progress: Vec<(u8, String)>,
    protocol_errors: usize,
}

impl ProgressReporter for Recorder {
    fn progress(&mut self, percent: u8, text: &str) {
        self.progress.push((percent, text.to_string()));
    }

    fn protocol_error(&mut self, _error: &ObfuscateError) {
        self.protocol_errors += 1;
    }
}

fn write(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn sample_site(root: &Path) {
    write(root, "a.js", b"// greet\nfunction greet(name) {\n  return 'hi ' + name;\n}\n");
    write(root, "b.css", b"body {\n  margin: 0;\n}\n");
    write(root, "c.html", b"<h1>Hi</h1>");
    write(root, "d.json", b"{\n  \"b\": 1,\n  \"a\": [true, null]\n}\n");
    write(root, "e.png", &[0x89, b'P', b'N', b'G', 0, 1, 2, 3]);
    write(root, "f.txt", b"plain text");
}

async fn run(args: StartArgs) -> (Outcome, Recorder) {
    let mut orchestrator = Orchestrator::new();
    let mut recorder = Recorder::default();
    let outcome = orchestrator.run(args, &mut recorder).await.unwrap();
    (outcome, recorder)
}

#[tokio::test]
async fn test_full_site_is_obfuscated() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("site");
    sample_site(&source);

    let (outcome, recorder) = run(StartArgs::new(source.to_string_lossy(), "low", None)).await;
    assert_eq!(outcome, Outcome::Success { name: "obfuscate".to_string() });
    assert_eq!(recorder.protocol_errors, 0);

    let output = temp_dir.path().join("site_Obfuscated");
    for rel in ["a.js", "b.css", "c.html", "d.json", "e.png", "f.txt"] {
        assert!(output.join(rel).is_file(), "{} missing from output", rel);
    }

    let js = fs::read_to_string(output.join("a.js")).unwrap();
    assert!(!js.contains("// greet"));
    assert!(js.contains("function greet(name)"));

    assert_eq!(fs::read_to_string(output.join("b.css")).unwrap(), "body{margin:0}");
    assert_eq!(
        fs::read_to_string(output.join("c.html")).unwrap(),
        "<script>document.write(unescape('%3C%68%31%3E%48%69%3C%2F%68%31%3E'))</script>"
    );
    assert_eq!(
        fs::read_to_string(output.join("d.json")).unwrap(),
        r#"{"b":1,"a":[true,null]}"#
    );

    let png = fs::read(output.join("e.png")).unwrap();
    assert!(png.len() >= 8 + 32 && png.len() < 8 + 52);
    assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0, 1, 2, 3]);

    assert_eq!(fs::read_to_string(output.join("f.txt")).unwrap(), "plain text");

    let texts: Vec<&str> = recorder.progress.iter().map(|(_, t)| t.as_str()).collect();
    assert_eq!(texts[0], "Obfuscating...");
    assert!(texts.contains(&"Find 1 JS files"));
    assert!(texts.contains(&"Copying f.txt"));
    assert!(recorder.progress.iter().all(|(p, _)| *p <= 100));
}

#[tokio::test]
async fn test_missing_source_creates_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("missing");

    let (outcome, _) = run(StartArgs::new(source.to_string_lossy(), "low", None)).await;
    let Outcome::Failure { name, error } = outcome else {
        panic!("expected failure");
    };
    assert_eq!(name, "obfuscate");
    assert!(error.starts_with("SourceNotFound"));
    assert!(!temp_dir.path().join("missing_Obfuscated").exists());
}

#[tokio::test]
async fn test_output_equal_to_source_fails_without_mutation() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("site");
    sample_site(&source);
    let source_str = source.to_string_lossy().to_string();

    let (outcome, _) = run(StartArgs::new(source_str.clone(), "high", Some(source_str))).await;
    let Outcome::Failure { error, .. } = outcome else {
        panic!("expected failure");
    };
    assert!(error.starts_with("InvalidOutputPath"));
    assert_eq!(fs::read_to_string(source.join("f.txt")).unwrap(), "plain text");
    assert_eq!(fs::read_dir(&source).unwrap().count(), 6);
    assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn test_malformed_json_counts_one_failure() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("site");
    sample_site(&source);
    write(&source, "d.json", b"{ \"a\": ");

    let (outcome, recorder) = run(StartArgs::new(source.to_string_lossy(), "normal", None)).await;
    assert_eq!(
        outcome,
        Outcome::Failure {
            name: "obfuscate".to_string(),
            error: "1 files failed to obfuscate".to_string(),
        }
    );
    assert!(recorder
        .progress
        .iter()
        .any(|(_, text)| text.starts_with("Obfuscate d.json failed")));

    let output = temp_dir.path().join("site_Obfuscated");
    assert!(!output.join("d.json").exists());
    assert!(output.join("f.txt").exists());
}

#[tokio::test]
async fn test_excluded_directories_are_not_copied() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("site");
    write(&source, "index.html", b"<p>x</p>");
    write(&source, "node_modules/pkg/index.js", b"module.exports = 1;");
    write(&source, "dist/app.js", b"var a;");
    write(&source, "assets/img/logo.svg", b"<svg/>");

    let output = temp_dir.path().join("build");
    let (outcome, _) = run(StartArgs::new(
        source.to_string_lossy(),
        "low",
        Some(output.to_string_lossy().to_string()),
    ))
    .await;
    assert!(outcome.is_success());
    assert!(output.join("index.html").exists());
    assert!(output.join("assets/img/logo.svg").exists());
    assert!(!output.join("node_modules").exists());
    assert!(!output.join("dist").exists());
}

#[tokio::test]
async fn test_high_level_encodes_script_strings() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("site");
    write(&source, "app.js", b"var key = \"secret\";\nconsole.log(key);\n");

    let (outcome, _) = run(StartArgs::new(source.to_string_lossy(), "high", None)).await;
    assert!(outcome.is_success());
    let js = fs::read_to_string(temp_dir.path().join("site_Obfuscated/app.js")).unwrap();
    assert_eq!(js, "var key = \"\\x73\\x65\\x63\\x72\\x65\\x74\";");
}
