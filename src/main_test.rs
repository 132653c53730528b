use super::*;

fn teardown_failure() -> Result<(), SessionError> {
    Err(SessionError::Storage(StorageError::Unavailable("disk gone".into())))
}

#[test]
fn command_error_survives_failed_teardown() {
    let result = settle(Err(CliError::UnknownElement("t1".into())), teardown_failure());
    assert!(matches!(result, Err(CliError::UnknownElement(id)) if id == "t1"));
}

#[test]
fn failed_teardown_fails_successful_command() {
    let result = settle(Ok(()), teardown_failure());
    assert!(matches!(result, Err(CliError::Session(SessionError::Storage(_)))));
}

#[test]
fn clean_teardown_passes_result_through() {
    assert!(settle(Ok(()), Ok(())).is_ok());
    assert!(matches!(settle(Err(CliError::ResizeRejected("t1".into())), Ok(())), Err(CliError::ResizeRejected(_))));
}
