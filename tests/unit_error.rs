use std::path::PathBuf;

use lifeops::error::{exit_codes, Error, JsonError};

#[test]
fn exit_codes_map_correctly() {
    let user = Error::InvalidArgument("bad".to_string());
    assert_eq!(user.exit_code(), exit_codes::USER_ERROR);

    assert_eq!(Error::NoActiveRun.exit_code(), exit_codes::USER_ERROR);
    assert_eq!(
        Error::RunActive("run_1".to_string()).exit_code(),
        exit_codes::USER_ERROR
    );

    let op = Error::OperationFailed("boom".to_string());
    assert_eq!(op.exit_code(), exit_codes::OPERATION_FAILED);

    let lock = Error::LockFailed(PathBuf::from("/tmp/x.json.lock"));
    assert_eq!(lock.exit_code(), exit_codes::OPERATION_FAILED);
}

#[test]
fn json_error_includes_code_and_details() {
    let err = Error::NotFound {
        kind: "template",
        id: "tpl_x".to_string(),
    };
    let json = JsonError::from(&err);
    assert_eq!(json.code, exit_codes::USER_ERROR);
    assert!(json.error.contains("template not found"));

    let details = json.details.expect("details");
    assert_eq!(details["kind"], "template");
    assert_eq!(details["id"], "tpl_x");
}
