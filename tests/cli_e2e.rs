use std::fs;
use std::process::Command;

use tempfile::tempdir;

const CONFIG_VARS: [&str; 4] = ["QUIETWAVE_MODEL_PATH", "MODEL_PATH", "QUIETWAVE_TARGETS", "QUIETWAVE_PROFILE"];

/// The binary with no configuration leaking in from the test environment.
fn quietwave() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_quietwave"));
    for var in CONFIG_VARS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_valid_length_default_topology() {
    let out = quietwave().args(["valid-length", "16000"]).output().unwrap();
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "16213");

    let out = quietwave().args(["valid-length", "0"]).output().unwrap();
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "597");
}

#[test]
fn test_valid_length_with_profile() {
    let dir = tempdir().unwrap();
    let profile = dir.path().join("small.json");
    fs::write(&profile, r#"{"topology": {"depth": 3, "kernel": 4, "stride": 2, "resample": 2}}"#).unwrap();

    let out = quietwave()
        .arg("valid-length")
        .arg("10")
        .arg("--profile")
        .arg(&profile)
        .output()
        .unwrap();
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "11");
}

#[test]
fn test_inspect_missing_model_fails() {
    let out = quietwave()
        .args(["inspect", "--model", "/nonexistent/denoiser.onnx"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("ONNX model not found"));
}

#[test]
fn test_denoise_rejects_unknown_target() {
    let dir = tempdir().unwrap();
    let out = quietwave()
        .arg("denoise")
        .arg("--model")
        .arg(dir.path().join("m.onnx"))
        .arg("--input")
        .arg(dir.path().join("in.wav"))
        .arg("--output")
        .arg(dir.path().join("out.wav"))
        .args(["--target", "tpu"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Unknown execution target"));
}

#[test]
fn test_inspect_reads_model_path_from_environment() {
    let out = quietwave()
        .arg("inspect")
        .env("QUIETWAVE_MODEL_PATH", "/nonexistent/from-env.onnx")
        .output()
        .unwrap();
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("ONNX model not found at /nonexistent/from-env.onnx"), "{}", stderr);
}

#[test]
fn test_namespaced_model_path_wins_over_fallback() {
    let out = quietwave()
        .arg("inspect")
        .env("QUIETWAVE_MODEL_PATH", "/nonexistent/primary.onnx")
        .env("MODEL_PATH", "/nonexistent/fallback.onnx")
        .output()
        .unwrap();
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("/nonexistent/primary.onnx"), "{}", stderr);

    let out = quietwave()
        .arg("inspect")
        .env("MODEL_PATH", "/nonexistent/fallback.onnx")
        .output()
        .unwrap();
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("/nonexistent/fallback.onnx"), "{}", stderr);
}

#[test]
fn test_missing_model_configuration_is_reported() {
    let out = quietwave().arg("inspect").output().unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("No model path configured"));
}

#[test]
fn test_dotenv_file_is_loaded() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(".env"), "QUIETWAVE_MODEL_PATH=/nonexistent/dotenv.onnx\n").unwrap();

    let out = quietwave().arg("inspect").current_dir(dir.path()).output().unwrap();
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("/nonexistent/dotenv.onnx"), "{}", stderr);
}

#[test]
fn test_valid_length_reads_profile_from_environment() {
    let dir = tempdir().unwrap();
    let profile = dir.path().join("small.json");
    fs::write(&profile, r#"{"topology": {"depth": 3, "kernel": 4, "stride": 2, "resample": 2}}"#).unwrap();

    let out = quietwave()
        .args(["valid-length", "10"])
        .env("QUIETWAVE_PROFILE", &profile)
        .output()
        .unwrap();
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "11");
}
