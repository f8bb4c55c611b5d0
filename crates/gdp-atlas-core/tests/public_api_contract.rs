// SPDX-License-Identifier: Apache-2.0

use gdp_atlas_core::{ExitCode, MachineError};

#[test]
fn exit_codes_are_stable() {
    assert_eq!(ExitCode::Success.as_u8(), 0);
    assert_eq!(ExitCode::Usage.as_u8(), 2);
    assert_eq!(ExitCode::Validation.as_u8(), 3);
    assert_eq!(ExitCode::DependencyFailure.as_u8(), 4);
    assert_eq!(ExitCode::Internal.as_u8(), 10);
    assert_eq!(ExitCode::DependencyFailure.as_str(), "dependency_failure");
}

#[test]
fn machine_error_json_is_deterministic() {
    let err = MachineError::new("validation_error", "unknown metric `gdp; drop`")
        .with_detail("field", "metric")
        .with_detail("allowed", "gdp,population");
    let json = err.to_json().expect("encode");
    assert_eq!(
        json,
        r#"{"code":"validation_error","message":"unknown metric `gdp; drop`","details":{"allowed":"gdp,population","field":"metric"}}"#
    );
    let back: MachineError = serde_json::from_str(&json).expect("decode");
    assert_eq!(back, err);
}
