use std::io;

use kiln::error::Error;

#[test]
fn test_error_conversion() {
    let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let err: Error = io_err.into();

    match err {
        Error::IoError(_) => (),
        _ => panic!("Expected IoError variant"),
    }

    let hook_err: Error = anyhow::anyhow!("post hook failed").into();
    assert!(matches!(hook_err, Error::HookError(_)));
    assert_eq!(hook_err.to_string(), "post hook failed");
}

#[test]
fn test_error_display() {
    let err = Error::ConfigError("invalid config".to_string());
    assert_eq!(err.to_string(), "Configuration error: invalid config.");

    let err = Error::DuplicateId { id: "src_path".to_string() };
    assert_eq!(
        err.to_string(),
        "IDs for contents must be unique. The ID (src_path) already exists in the folder contents."
    );

    let err = Error::RecipeNotFound {
        name: "rust_cli".to_string(),
        available: vec!["python_package".to_string(), "python_api".to_string()],
    };
    assert!(err.to_string().contains("Available recipes: python_package, python_api"));
}
