use indexmap::IndexMap;
use kiln::error::Error;
use kiln::namespace::{NamespaceEntry, NamespaceSpec, NamespaceValidator, ValidationLevel};
use tempfile::TempDir;

fn delimiters() -> Vec<String> {
    vec![".".to_string(), ",".to_string(), "-".to_string()]
}

/// `[{a: [b, c]}, d]`
fn grammar() -> NamespaceSpec {
    let mut branch = IndexMap::new();
    branch.insert(
        "a".to_string(),
        vec![NamespaceEntry::Segment("b".to_string()), NamespaceEntry::Segment("c".to_string())],
    );
    vec![NamespaceEntry::Branch(branch), NamespaceEntry::Segment("d".to_string())]
}

fn validator() -> NamespaceValidator {
    NamespaceValidator::new(Some(grammar()), delimiters(), "-").unwrap()
}

#[test]
fn test_unconstrained_names_are_always_valid() {
    let validator = NamespaceValidator::with_options(None).unwrap();
    for name in ["", "anything", "a.b.c", "x y z"] {
        assert_eq!(validator.validate_name(name), (true, "no constraints set".to_string()));
        assert_eq!(validator.to_parts(name), vec![name.to_string()]);
    }
}

#[test]
fn test_tokenization() {
    assert_eq!(validator().to_parts("a.b-c,d"), vec!["a", "b", "c", "d"]);
}

#[test]
fn test_grammar_match() {
    let validator = validator();
    assert_eq!(validator.validate_name("a.b"), (true, "ok".to_string()));
    assert_eq!(validator.validate_name("d.anything"), (true, "ok".to_string()));

    let (valid, message) = validator.validate_name("a.x");
    assert!(!valid);
    assert!(message.contains("for a: b, c"), "{message}");

    let (valid, message) = validator.validate_name("x");
    assert!(!valid);
    assert!(message.contains("for <root>: a, d"), "{message}");
    assert!(message.contains("['.', ',', '-']"), "{message}");
}

#[test]
fn test_branch_requires_a_next_segment() {
    let (valid, message) = validator().validate_name("a");
    assert!(!valid);
    assert!(message.contains("for a: b, c"), "{message}");
}

#[test]
fn test_repo_name_uses_the_separator() {
    let validator = NamespaceValidator::new(Some(grammar()), vec![".".to_string()], "_").unwrap();
    assert_eq!(validator.delimiters(), &[".".to_string(), "_".to_string()]);
    assert_eq!(validator.to_repo_name("a.b_c"), "a_b_c");
}

#[test]
fn test_empty_separator_is_rejected() {
    assert!(matches!(
        NamespaceValidator::new(None, delimiters(), ""),
        Err(Error::NamespaceError(_))
    ));
}

#[test]
fn test_yaml_round_trip() {
    let yaml = "options:\n  - a:\n      - b\n      - c\n  - d\nrepo_separator: '-'\n";
    let validator = NamespaceValidator::from_yaml(yaml).unwrap();
    assert_eq!(validator.options(), Some(&grammar()));
    assert_eq!(validator.delimiters(), delimiters().as_slice());

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("namespaces.yaml");
    validator.save(&path).unwrap();
    let loaded = NamespaceValidator::load(&path).unwrap();
    assert_eq!(loaded.to_file(), validator.to_file());
    assert_eq!(loaded.validate_name("a.c"), (true, "ok".to_string()));
}

#[test]
fn test_malformed_options_fail_at_construction() {
    assert!(matches!(NamespaceValidator::from_yaml("options: 5\n"), Err(Error::NamespaceError(_))));
    assert!(matches!(
        NamespaceValidator::from_yaml("options:\n  - a: 3\n"),
        Err(Error::NamespaceError(_))
    ));
}

#[test]
fn test_enforcement_levels() {
    let validator = validator();
    assert!(validator.enforce("x", ValidationLevel::Ignore).is_ok());
    assert!(validator.enforce("x", ValidationLevel::Warn).is_ok());
    assert!(matches!(
        validator.enforce("x", ValidationLevel::Strict),
        Err(Error::ValidationError(_))
    ));
    assert!(validator.enforce("a.b", ValidationLevel::Strict).is_ok());
}

/// `[{a: [{b: [c, d]}, e]}, f]`
fn deep_validator() -> NamespaceValidator {
    let mut b = IndexMap::new();
    b.insert(
        "b".to_string(),
        vec![NamespaceEntry::Segment("c".to_string()), NamespaceEntry::Segment("d".to_string())],
    );
    let mut a = IndexMap::new();
    a.insert(
        "a".to_string(),
        vec![NamespaceEntry::Branch(b), NamespaceEntry::Segment("e".to_string())],
    );
    let grammar = vec![NamespaceEntry::Branch(a), NamespaceEntry::Segment("f".to_string())];
    NamespaceValidator::new(Some(grammar), delimiters(), "-").unwrap()
}

#[test]
fn test_three_level_grammar() {
    let validator = deep_validator();
    for name in ["a.b.c", "a-b-d", "a.e", "f", "f.anything", "a.b.c.x"] {
        assert_eq!(validator.validate_name(name), (true, "ok".to_string()), "{name}");
    }

    // the deepest mismatching level is named
    let (valid, message) = validator.validate_name("a.b.g");
    assert!(!valid);
    assert_eq!(message, "Does not match valid names for b: c, d, with delimiters: ['.', ',', '-']");

    let (valid, message) = validator.validate_name("a.c");
    assert!(!valid);
    assert!(message.contains("for a: b, e"), "{message}");

    // running out of parts fails at the level that still expects one
    let (valid, message) = validator.validate_name("a.b");
    assert!(!valid);
    assert!(message.contains("for b: c, d"), "{message}");

    let (valid, message) = validator.validate_name("g.b.c");
    assert!(!valid);
    assert!(message.contains("for <root>: a, f"), "{message}");
}
