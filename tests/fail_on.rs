use tideline_core::ExposureLevel;

#[test]
fn fail_on_passes_when_no_file_meets_level() {
    // Simulate: only LOW and MEDIUM files, threshold is HIGH
    let levels = vec![ExposureLevel::Low, ExposureLevel::Medium];
    let threshold = ExposureLevel::High;

    let exposed = levels.iter().any(|l| l.meets_threshold(threshold));
    assert!(!exposed, "should not fail without a HIGH file");
}

#[test]
fn fail_on_fails_when_a_file_meets_level() {
    let levels = vec![ExposureLevel::High, ExposureLevel::Low];
    let threshold = ExposureLevel::Medium;

    let exposed = levels.iter().any(|l| l.meets_threshold(threshold));
    assert!(exposed, "HIGH should meet a MEDIUM threshold");
}

#[test]
fn fail_on_medium_catches_medium_and_high() {
    let threshold = ExposureLevel::Medium;

    assert!(ExposureLevel::High.meets_threshold(threshold));
    assert!(ExposureLevel::Medium.meets_threshold(threshold));
    assert!(!ExposureLevel::Low.meets_threshold(threshold));
}

#[test]
fn fail_on_parses_cli_values() {
    assert_eq!("high".parse::<ExposureLevel>().unwrap(), ExposureLevel::High);
    assert_eq!("MEDIUM".parse::<ExposureLevel>().unwrap(), ExposureLevel::Medium);
    assert!("severe".parse::<ExposureLevel>().is_err());
}
