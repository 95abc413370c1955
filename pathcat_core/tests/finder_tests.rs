//! Integration tests for path/file template lookups against real trees

use pathcat_core::*;
use pathcat_test_utils::fixtures::{MODEL_FILE_TEMPLATE, MODEL_PATH_TEMPLATE, model_tree};
use std::collections::HashMap;

fn finder() -> Finder {
    Finder::new(MODEL_PATH_TEMPLATE, MODEL_FILE_TEMPLATE).unwrap()
}

#[test]
fn test_find_files_raises_on_unparsable_by_default() {
    let tree = model_tree().unwrap();
    let options = FindOptions::new().with_root(tree.path());

    let err = finder().find_files(&Criteria::new(), &options).unwrap_err();
    assert!(matches!(err, Error::Query(QueryError::Unparsable { .. })));
}

#[test]
fn test_find_files_with_criteria() {
    let tree = model_tree().unwrap();
    let options = FindOptions::new()
        .with_root(tree.path())
        .with_on_parse_error(OnParseError::Ignore);

    let catalog = finder()
        .find_files(&Criteria::new().with("model", "cesm"), &options)
        .unwrap();
    assert_eq!(catalog.len(), 4);
    assert!(
        catalog
            .iter()
            .all(|entry| entry.get("model") == Some(&FieldValue::from("cesm")))
    );

    let catalog = finder()
        .find_files(&Criteria::new().with_any("year", [1990, 2000]), &options)
        .unwrap();
    assert_eq!(catalog.len(), 3);
}

#[test]
fn test_find_paths_lists_directories() {
    let tree = model_tree().unwrap();
    let options = FindOptions::new().with_root(tree.path());

    let catalog = finder().find_paths(&Criteria::new(), &options).unwrap();
    assert_eq!(catalog.columns(), ["model", "exp", "variable"]);
    assert_eq!(
        catalog.paths().collect::<Vec<_>>(),
        vec![
            "cesm/historical/tas/*",
            "cesm/ssp585/pr/*",
            "cesm/ssp585/tas/*",
            "mpi/historical/tas/*",
        ]
    );
}

#[test]
fn test_find_single_path() {
    let tree = model_tree().unwrap();
    let options = FindOptions::new().with_root(tree.path());

    let single = finder()
        .find_single_path(&Criteria::new().with("variable", "pr"), &options)
        .unwrap();
    assert_eq!(single.get(0).unwrap().path(), "cesm/ssp585/pr/*");

    let err = finder()
        .find_single_path(&Criteria::new().with("variable", "tas"), &options)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Query(QueryError::MoreThanOne { count: 3 })
    ));
}

#[test]
fn test_empty_result_follows_on_empty() {
    let tree = model_tree().unwrap();
    let criteria = Criteria::new().with("model", "ukesm");

    let options = FindOptions::new()
        .with_root(tree.path())
        .with_on_parse_error(OnParseError::Ignore);
    let err = finder().find_files(&criteria, &options).unwrap_err();
    assert!(matches!(err, Error::Query(QueryError::Empty)));

    let options = options.with_on_empty(OnEmpty::Allow);
    let catalog = finder().find_files(&criteria, &options).unwrap();
    assert!(catalog.is_empty());
}

#[test]
fn test_single_file_forces_raise_on_empty() {
    let tree = model_tree().unwrap();
    let options = FindOptions::new()
        .with_root(tree.path())
        .with_on_empty(OnEmpty::Allow)
        .with_on_parse_error(OnParseError::Ignore);

    let err = finder()
        .find_single_file(&Criteria::new().with("model", "ukesm"), &options)
        .unwrap_err();
    assert!(matches!(err, Error::Query(QueryError::Empty)));
}

#[test]
fn test_created_names_are_found() {
    let tree = model_tree().unwrap();
    let finder = finder();

    let fields: HashMap<String, FieldValue> = [
        ("model", FieldValue::from("cesm")),
        ("exp", FieldValue::from("ssp585")),
        ("variable", FieldValue::from("pr")),
        ("year", FieldValue::Int(2050)),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value))
    .collect();

    let full = finder.create_full_name(&fields).unwrap();
    assert_eq!(full, "cesm/ssp585/pr/pr_cesm_ssp585_2050.nc");
    assert!(tree.join(&full).is_file());
    assert_eq!(finder.create_path_name(&fields).unwrap(), "cesm/ssp585/pr/");
    assert_eq!(
        finder.create_file_name(&fields).unwrap(),
        "pr_cesm_ssp585_2050.nc"
    );
}

#[test]
fn test_absolute_finder_defaults_root_to_prefix() {
    let tree = model_tree().unwrap();
    let path_template = format!("{}{MODEL_PATH_TEMPLATE}", tree.root_prefix());
    let finder = Finder::new(&path_template, MODEL_FILE_TEMPLATE).unwrap();

    let root = finder.default_root();
    assert_eq!(
        root.to_string_lossy().trim_end_matches('/'),
        tree.root_prefix().trim_end_matches('/')
    );

    let options = FindOptions::new().with_on_parse_error(OnParseError::Ignore);
    let catalog = finder
        .find_files(&Criteria::new().with("exp", "ssp585"), &options)
        .unwrap();
    assert_eq!(catalog.len(), 2);
    assert!(catalog.paths().all(|path| path.starts_with(&tree.root_prefix())));
}
