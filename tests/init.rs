use std::process::Command;

#[test]
fn init_creates_valid_toml() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_tideline"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "tideline init failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let config_path = dir.path().join(".tideline.toml");
    assert!(config_path.exists(), ".tideline.toml should exist");

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[evaluation]"));
    assert!(content.contains("[thresholds]"));
    assert!(content.contains("[discovery]"));

    // The template must load and leave every default in place
    let parsed: tideline_core::TidelineConfig = toml::from_str(&content).unwrap();
    assert_eq!(parsed.evaluation.window_days, 180);
    assert_eq!(parsed.thresholds.exposure_high, 0.7);
    tideline_core::TidelineConfig::from_toml(&content).unwrap();
}

#[test]
fn init_refuses_if_exists() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".tideline.toml"), "# existing").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_tideline"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    let existing = std::fs::read_to_string(dir.path().join(".tideline.toml")).unwrap();
    assert_eq!(existing, "# existing");
}
