//! Error display prefixes stay stable; callers match on them in logs.

use gitvitae::AppError;

#[test]
fn display_prefixes_identify_the_failure_domain() {
    let cases = [
        (AppError::Config("missing token".to_owned()), "config: missing token"),
        (AppError::Protocol("bad envelope".to_owned()), "protocol: bad envelope"),
        (AppError::Tool("scan failed".to_owned()), "tool: scan failed"),
        (AppError::Session("gone".to_owned()), "session: gone"),
        (AppError::Transport("line too long".to_owned()), "transport: line too long"),
        (AppError::Github("status 403".to_owned()), "github: status 403"),
        (AppError::Enhance("no choices".to_owned()), "enhance: no choices"),
        (AppError::Io("broken pipe".to_owned()), "io: broken pipe"),
    ];
    for (err, expected) in cases {
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn errors_implement_the_std_error_trait() {
    let err: Box<dyn std::error::Error> = Box::new(AppError::Tool("boom".to_owned()));
    assert!(err.source().is_none());
    assert_eq!(err.to_string(), "tool: boom");
}
