//! Integration tests for the embedding_requestor binary
//!
//! Failure paths run without the model. Tests that embed real text need
//! network access (or a warm Hugging Face cache) and are ignored by default:
//! cargo test --test cli -- --ignored

use std::process::{Command, Output};

fn requestor() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_embedding_requestor"));
    cmd.env_remove("EMBEDDING_REQUESTOR_CONFIG");
    cmd
}

fn run(args: &[&str]) -> Output {
    requestor()
        .args(args)
        .output()
        .expect("Failed to spawn embedding_requestor")
}

fn embeddings(output: &Output) -> Vec<Vec<f32>> {
    let stdout = String::from_utf8(output.stdout.clone()).unwrap();
    assert!(stdout.ends_with('\n'));
    assert_eq!(stdout.lines().count(), 1);
    serde_json::from_str(stdout.trim_end()).unwrap()
}

#[test]
fn test_missing_argument_fails_without_output() {
    let output = run(&[]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_malformed_argument_fails_without_output() {
    for arg in ["hello world", "[\"unterminated", "{\"a\": 1}", "[1, 2]"] {
        let output = run(&[arg]);
        assert!(!output.status.success(), "accepted {:?}", arg);
        assert!(output.stdout.is_empty(), "printed output for {:?}", arg);

        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("InvalidInput"), "stderr: {}", stderr);
    }
}

#[test]
fn test_extra_arguments_are_ignored() {
    let output = run(&["not json", "extra", "--more"]);

    // Runtime failure on the first argument, not a usage error
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("InvalidInput"));
}

#[test]
fn test_chunk_requires_a_number() {
    let output = run(&["--chunk", "abc", "Some text."]);
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_missing_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.toml");
    let output = run(&["--config", missing.to_str().unwrap(), "[]"]);

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_invalid_config_fails_before_model_access() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("embedder.toml");
    std::fs::write(&path, "[runtime]\nbatch_size = 0\n").unwrap();

    let output = run(&["--config", path.to_str().unwrap(), "[\"hello\"]"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("batch_size"));
}

#[test]
fn test_config_from_environment() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("embedder.toml");
    std::fs::write(&path, "[runtime]\nnum_threads = 0\n").unwrap();

    let output = requestor()
        .env("EMBEDDING_REQUESTOR_CONFIG", &path)
        .arg("[]")
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("num_threads"));
}

#[test]
fn test_offline_without_cached_model_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("embedder.toml");
    std::fs::write(
        &path,
        format!(
            "[model]\noffline = true\ncache_dir = {:?}\n",
            dir.path().join("hf").to_string_lossy()
        ),
    )
    .unwrap();

    let output = run(&["--config", path.to_str().unwrap(), "[\"hello world\"]"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ModelNotFound"));
}

#[test]
#[ignore = "Requires downloading all-MiniLM-L6-v2 (~90MB)"]
fn test_hello_world_has_384_dimensions() {
    let output = run(&["[\"hello world\"]"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let vectors = embeddings(&output);
    assert_eq!(vectors.len(), 1);
    assert_eq!(vectors[0].len(), 384);

    let norm: f32 = vectors[0].iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-3, "norm = {}", norm);
}

#[test]
#[ignore = "Requires downloading all-MiniLM-L6-v2 (~90MB)"]
fn test_order_count_and_determinism() {
    let input = r#"["The cat sits outside", "A man is playing guitar", "The cat sits outside", ""]"#;

    let first = embeddings(&run(&[input]));
    let second = embeddings(&run(&[input]));

    assert_eq!(first.len(), 4);
    assert!(first.iter().all(|v| v.len() == 384));
    assert_eq!(first[0], first[2]);
    assert_ne!(first[0], first[1]);

    for (a, b) in first.iter().zip(&second) {
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-5);
        }
    }
}

#[test]
#[ignore = "Requires downloading all-MiniLM-L6-v2 (~90MB)"]
fn test_empty_list_prints_empty_list() {
    let output = run(&["[]"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "[]\n");
}

#[test]
#[ignore = "Requires downloading all-MiniLM-L6-v2 (~90MB)"]
fn test_similar_texts_are_closer() {
    let vectors = embeddings(&run(&[
        r#"["A dog runs in the park", "A puppy is running on grass", "Quarterly tax filing deadline"]"#,
    ]));
    let dot = |a: &[f32], b: &[f32]| a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();

    assert!(dot(&vectors[0], &vectors[1]) > dot(&vectors[0], &vectors[2]));
}

#[test]
#[ignore = "Requires downloading all-MiniLM-L6-v2 (~90MB)"]
fn test_small_batches_match_single_text_embeddings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("embedder.toml");
    std::fs::write(&path, "[runtime]\nbatch_size = 2\n").unwrap();
    let config = path.to_str().unwrap();

    // Longer than max_sequence_length once tokenized
    let long = "The quick brown fox jumps over the lazy dog. ".repeat(70);
    assert!(long.split_whitespace().count() > 600);
    let texts = vec![
        "Hi".to_string(),
        long,
        "A man is playing guitar on a small stage".to_string(),
        "".to_string(),
        "Embeddings of differently sized texts share a padded batch".to_string(),
    ];

    let batched = embeddings(&run(&["--config", config, &serde_json::to_string(&texts).unwrap()]));
    assert_eq!(batched.len(), 5);
    assert!(batched.iter().all(|v| v.len() == 384));

    for (text, vector) in texts.iter().zip(&batched) {
        let single = serde_json::to_string(&[text]).unwrap();
        let alone = embeddings(&run(&["--config", config, &single]));
        assert_eq!(alone.len(), 1);

        for (x, y) in vector.iter().zip(&alone[0]) {
            assert!((x - y).abs() < 1e-5, "{} vs {} for {:.20}", x, y, text);
        }
    }

    let norm: f32 = batched[1].iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-3, "norm = {}", norm);
}

#[test]
#[ignore = "Requires downloading all-MiniLM-L6-v2 (~90MB)"]
fn test_chunk_embeds_each_sentence_chunk() {
    let text = "The cat sits outside. A man is playing guitar! Is it raining? trailing words";
    let vectors = embeddings(&run(&["--chunk", "25", text]));

    assert_eq!(vectors.len(), 3);
    assert!(vectors.iter().all(|v| v.len() == 384));
}
