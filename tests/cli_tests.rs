mod common;

use common::{run_orform, TestEnv};

const TRANSCRIPT: &str = "surgeon 1 dr lee in 930 pm heart rate 72";
const PREDICTIONS: &str =
    r#"[{"entity": "B-HR", "word": "72", "start": 38, "end": 40, "score": 0.97}]"#;

#[test]
fn orform_help_shows_usage() {
    let output = run_orform(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(
        output.status.success(),
        "--help should succeed\nstdout:\n{}\nstderr:\n{}",
        stdout,
        stderr
    );
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("extract"));
    assert!(stdout.contains("corrections"));
}

#[test]
fn orform_version_shows_version() {
    let output = run_orform(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(
        output.status.success(),
        "--version should succeed\nstdout:\n{}\nstderr:\n{}",
        stdout,
        stderr
    );
    assert!(stdout.contains("orform "));
}

#[test]
fn completions_bash_outputs_script() {
    let output = run_orform(&["completions", "bash"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(
        output.status.success(),
        "completions bash should succeed\nstdout:\n{}\nstderr:\n{}",
        stdout,
        stderr
    );
    assert!(
        stdout.contains("orform"),
        "expected completion output to reference command name\nstdout:\n{}",
        stdout
    );
}

#[test]
fn config_show_works() {
    let output = run_orform(&["config", "show"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(
        output.status.success(),
        "config show should succeed\nstdout:\n{}\nstderr:\n{}",
        stdout,
        stderr
    );
    assert!(stdout.contains("[model]"));
    assert!(stdout.contains("backend = \"rules-only\""));
    assert!(stdout.contains("[labels]"));
}

#[test]
fn config_path_returns_valid_path() {
    let output = run_orform(&["config", "path"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("config.toml"));
}

#[test]
fn config_init_refuses_to_overwrite_without_force() {
    let env = TestEnv::new();

    let first = env.run(&["config", "init"]);
    assert!(first.status.success());
    assert!(env.config_path().exists());

    let second = env.run(&["config", "init"]);
    let stderr = String::from_utf8_lossy(&second.stderr);
    assert!(!second.status.success());
    assert!(stderr.contains("--force"), "stderr:\n{}", stderr);

    assert!(env.run(&["config", "init", "--force"]).status.success());
}

#[test]
fn extract_with_predictions_file_prints_form() {
    let env = TestEnv::new();
    let predictions = env.write_file("predictions.json", PREDICTIONS);

    let output = env.run(&[
        "extract",
        "--text",
        TRANSCRIPT,
        "--predictions",
        predictions.to_str().unwrap(),
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(
        output.status.success(),
        "extract should succeed\nstdout:\n{}\nstderr:\n{}",
        stdout,
        stderr
    );

    let form: serde_json::Value = serde_json::from_str(&stdout).expect("stdout is JSON");
    assert_eq!(form["vitals"]["heart_rate"], 72);
    assert_eq!(form["personnel"]["surgeon_1"], "lee");
    assert_eq!(form["times"]["in"], "9:30 pm");
    assert_eq!(form["free_notes"], TRANSCRIPT);
    assert!(form["medications"].as_array().unwrap().is_empty());
}

#[test]
fn extract_with_rules_only_backend_reads_transcript_file() {
    let env = TestEnv::new();
    let transcript = env.write_file("case.txt", "first surgeon adams, out 1145 am\n");

    let output = env.run(&["extract", "--transcript", transcript.to_str().unwrap(), "--compact"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "stderr:\n{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout.trim().lines().count(), 1);

    let form: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(form["personnel"]["surgeon_1"], "adams");
    assert_eq!(form["times"]["out"], "11:45 am");
    assert!(form["vitals"]["heart_rate"].is_null());
}

#[test]
fn extract_with_unconfigured_remote_backend_fails() {
    let env = TestEnv::new();
    env.write_config("[model]\nbackend = \"remote\"\n");

    let output = env.run(&["extract", "--text", TRANSCRIPT]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("not available"), "stderr:\n{}", stderr);
}

#[test]
fn align_prints_bio_tags() {
    let env = TestEnv::new();
    let predictions = env.write_file("predictions.json", PREDICTIONS);

    let output = env.run(&[
        "align",
        "--text",
        TRANSCRIPT,
        "--predictions",
        predictions.to_str().unwrap(),
        "--json",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "stderr:\n{}", String::from_utf8_lossy(&output.stderr));

    let sequence: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let tags = sequence["tags"].as_array().unwrap();
    assert_eq!(tags.len(), 10);
    assert_eq!(tags[9], "B-HR");
    assert_eq!(tags[0], "O");
}

#[test]
fn model_list_and_validate() {
    let env = TestEnv::new();

    let output = env.run(&["model", "list"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("rules-only"));
    assert!(stdout.contains("remote"));

    let output = env.run(&["model", "validate"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("\"available\": true"));

    env.write_config("[model]\nbackend = \"spacy\"\n");
    let output = env.run(&["model", "validate"]);
    assert!(!output.status.success());
}

#[test]
fn corrections_add_validate_and_analyze() {
    let env = TestEnv::new();
    env.use_work_dir_as_data_dir();
    env.write_file("label_map.json", r#"["O", "B-HR", "I-HR", "B-DRUG"]"#);

    let output = env.run(&[
        "corrections",
        "add",
        "--text",
        "heart rate 72",
        "--tags",
        "O O B-HR",
        "--by",
        "nurse1",
    ]);
    assert!(
        output.status.success(),
        "corrections add should succeed\nstderr:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(env.work_path("labels/corrections.jsonl").exists());

    let rejected = env.run(&[
        "corrections",
        "add",
        "--text",
        "heart rate 72",
        "--tags",
        "O O B-PULSE",
    ]);
    let stderr = String::from_utf8_lossy(&rejected.stderr);
    assert!(!rejected.status.success());
    assert!(stderr.contains("B-PULSE"), "stderr:\n{}", stderr);

    let output = env.run(&["corrections", "validate"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stdout:\n{}", stdout);
    assert!(stdout.contains("1 of 1 records valid"));

    let output = env.run(&["corrections", "analyze"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("nurse1"));
    assert!(stdout.contains("B-HR"));
}

#[test]
fn corrections_validate_flags_bad_records() {
    let env = TestEnv::new();
    env.use_work_dir_as_data_dir();
    env.write_file("label_map.json", r#"["O", "B-HR"]"#);
    let file = env.write_file(
        "review.jsonl",
        concat!(
            "{\"tokens\": [\"hr\", \"72\"], \"tags\": [\"O\"]}\n",
            "{\"tokens\": [\"give\", \"ketamine\"], \"tags\": [\"O\", \"B-DRUG\"]}\n",
        ),
    );

    let output = env.run(&["corrections", "validate", "--file", file.to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(!output.status.success());
    assert!(stdout.contains("0 of 2 records valid"));
    assert!(stdout.contains("record 0: 2 tokens but 1 tags"));
    assert!(stdout.contains("record 1: unknown tags B-DRUG"));
}

#[test]
fn extract_reads_transcript_from_stdin() {
    let env = TestEnv::new();

    let output = env.run_with_stdin(
        &["extract", "--compact"],
        "first surgeon adams, out 1145 am\n",
    );
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "stderr:\n{}", String::from_utf8_lossy(&output.stderr));

    let form: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(form["personnel"]["surgeon_1"], "adams");
    assert_eq!(form["times"]["out"], "11:45 am");
    assert_eq!(form["free_notes"], "first surgeon adams, out 1145 am");
}

#[test]
fn api_key_env_fills_only_an_empty_config_key() {
    let env = TestEnv::new();
    let vars = [("ORFORM_MODEL_API_KEY", "from-env")];

    let output = env.run_with_env(&["config", "show"], &vars);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("api_key = \"from-env\""), "stdout:\n{}", stdout);

    env.write_config("[model]\napi_key = \"from-file\"\n");
    let output = env.run_with_env(&["config", "show"], &vars);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("api_key = \"from-file\""), "stdout:\n{}", stdout);
    assert!(!stdout.contains("from-env"));
}

#[test]
fn corrections_add_edits_aligned_predictions() {
    let env = TestEnv::new();
    env.use_work_dir_as_data_dir();
    env.write_file("label_map.json", r#"["O", "B-HR", "I-HR", "B-DRUG"]"#);
    let predictions = env.write_file(
        "predictions.json",
        r#"[{"entity": "B-HR", "word": "heart", "start": 0, "end": 5, "score": 0.6}]"#,
    );
    let predictions = predictions.to_str().unwrap();

    let output = env.run(&[
        "corrections",
        "add",
        "--text",
        "heart rate 72",
        "--predictions",
        predictions,
        "--set",
        "0:O",
        "--set",
        "2:B-HR",
        "--by",
        "nurse1",
    ]);
    assert!(
        output.status.success(),
        "corrections add should succeed\nstderr:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );

    let saved = std::fs::read_to_string(env.work_path("labels/corrections.jsonl")).unwrap();
    let record: serde_json::Value = serde_json::from_str(saved.trim()).unwrap();
    assert_eq!(record["tags"], serde_json::json!(["O", "O", "B-HR"]));
    assert_eq!(record["metadata"]["corrected_by"], "nurse1");
    assert_eq!(record["metadata"]["session"], "prediction_review");

    let out_of_range = env.run(&[
        "corrections",
        "add",
        "--text",
        "heart rate 72",
        "--predictions",
        predictions,
        "--set",
        "3:B-HR",
    ]);
    let stderr = String::from_utf8_lossy(&out_of_range.stderr);
    assert!(!out_of_range.status.success());
    assert!(stderr.contains("out of range"), "stderr:\n{}", stderr);

    let unknown = env.run(&[
        "corrections",
        "add",
        "--text",
        "heart rate 72",
        "--predictions",
        predictions,
        "--set",
        "1:B-PULSE",
    ]);
    let stderr = String::from_utf8_lossy(&unknown.stderr);
    assert!(!unknown.status.success());
    assert!(stderr.contains("B-PULSE"), "stderr:\n{}", stderr);

    let saved = std::fs::read_to_string(env.work_path("labels/corrections.jsonl")).unwrap();
    assert_eq!(saved.lines().count(), 1);
}

#[test]
fn corrections_add_rejects_empty_sentence() {
    let env = TestEnv::new();
    env.use_work_dir_as_data_dir();
    env.write_file("label_map.json", r#"["O", "B-HR"]"#);

    let output = env.run(&["corrections", "add", "--text", "", "--tags", ""]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("Empty tokens or tags"), "stderr:\n{}", stderr);
    assert!(!env.work_path("labels/corrections.jsonl").exists());
}
