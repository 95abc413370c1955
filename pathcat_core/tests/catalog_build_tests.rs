//! Integration tests for building catalogs from real directory trees
//!
//! These tests run the whole pipeline: compile, derive the traversal pattern,
//! crawl with pruning, match and assemble.

use pathcat_core::*;
use pathcat_test_utils::TestTreeBuilder;
use pathcat_test_utils::fixtures::{
    ARCHIVE_TEMPLATE, MODEL_FILE_TEMPLATE, MODEL_PATH_TEMPLATE, archive_tree, model_tree,
};

fn model_template() -> Template {
    Template::compile(&format!("{MODEL_PATH_TEMPLATE}/{MODEL_FILE_TEMPLATE}")).unwrap()
}

#[cfg(test)]
mod archive_tests {
    use super::*;

    #[test]
    fn test_archive_catalog_has_two_rows() {
        let tree = archive_tree().unwrap();

        let report = CatalogBuilder::new(tree.path())
            .template(Template::compile(ARCHIVE_TEMPLATE).unwrap())
            .build()
            .unwrap();

        // B/notes.txt is pruned before matching, so it is not a failure
        assert!(report.failures.is_empty());
        assert!(report.warnings.is_empty());

        let catalog = report.catalog;
        assert_eq!(catalog.columns(), ["site", "year", "month"]);
        assert_eq!(
            catalog.paths().collect::<Vec<_>>(),
            vec!["A/2020/data_01.csv", "A/2020/data_99.csv"]
        );

        let first = catalog.get(0).unwrap();
        assert_eq!(first.get("site"), Some(&FieldValue::from("A")));
        assert_eq!(first.get("year"), Some(&FieldValue::Int(2020)));
        assert_eq!(first.get("month"), Some(&FieldValue::Int(1)));
        assert_eq!(catalog.get(1).unwrap().get("month"), Some(&FieldValue::Int(99)));
    }

    #[test]
    fn test_build_is_idempotent() {
        let tree = archive_tree().unwrap();
        let builder = CatalogBuilder::new(tree.path())
            .template(Template::compile(ARCHIVE_TEMPLATE).unwrap());

        let first = builder.build().unwrap().into_catalog();
        let second = builder.build().unwrap().into_catalog();
        assert_eq!(first, second);
    }

    #[test]
    fn test_absolute_template_yields_absolute_paths() {
        let tree = archive_tree().unwrap();
        let template = format!("{}{ARCHIVE_TEMPLATE}", tree.root_prefix());

        let catalog = CatalogBuilder::new(tree.path())
            .template(Template::compile(&template).unwrap())
            .build()
            .unwrap()
            .into_catalog();

        assert_eq!(catalog.len(), 2);
        let expected = format!("{}A/2020/data_01.csv", tree.root_prefix());
        assert_eq!(catalog.get(0).unwrap().path(), expected);
        assert_eq!(
            catalog.get(0).unwrap().get("site"),
            Some(&FieldValue::from("A"))
        );
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let tree = archive_tree().unwrap();
        let result = CatalogBuilder::new(tree.join("nowhere"))
            .template(Template::compile(ARCHIVE_TEMPLATE).unwrap())
            .build();

        let err = result.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("Root directory not found"));
    }

    #[test]
    fn test_empty_tree_builds_empty_catalog() {
        let tree = TestTreeBuilder::new().build().unwrap();
        let catalog = CatalogBuilder::new(tree.path())
            .template(Template::compile(ARCHIVE_TEMPLATE).unwrap())
            .build()
            .unwrap()
            .into_catalog();

        assert!(catalog.is_empty());
        assert_eq!(catalog.columns(), ["site", "year", "month"]);
    }
}

#[cfg(test)]
mod model_tests {
    use super::*;

    #[test]
    fn test_glob_accepted_paths_fail_with_reasons() {
        let tree = model_tree().unwrap();
        let report = CatalogBuilder::new(tree.path())
            .template(model_template())
            .build()
            .unwrap();

        assert_eq!(report.catalog.len(), 5);
        assert_eq!(report.failures.len(), 2);

        let reasons: Vec<&MatchError> = report
            .failures
            .iter()
            .filter_map(MatchRecord::reason)
            .collect();
        assert!(reasons.iter().any(|reason| matches!(
            reason,
            MatchError::InconsistentFieldValue { name, .. } if name == "model"
        )));
        assert!(
            reasons
                .iter()
                .any(|reason| matches!(reason, MatchError::NoValidSplit { .. }))
        );

        // README never reaches the matcher
        assert!(
            report
                .failures
                .iter()
                .all(|failure| !failure.path().ends_with("README"))
        );
    }

    #[test]
    fn test_rows_follow_sorted_traversal_order() {
        let tree = model_tree().unwrap();
        let catalog = CatalogBuilder::new(tree.path())
            .template(model_template())
            .build()
            .unwrap()
            .into_catalog();

        assert_eq!(
            catalog.paths().collect::<Vec<_>>(),
            vec![
                "cesm/historical/tas/tas_cesm_historical_1990.nc",
                "cesm/historical/tas/tas_cesm_historical_2000.nc",
                "cesm/ssp585/pr/pr_cesm_ssp585_2050.nc",
                "cesm/ssp585/tas/tas_cesm_ssp585_2050.nc",
                "mpi/historical/tas/tas_mpi_historical_1990.nc",
            ]
        );
    }

    #[test]
    fn test_no_false_negatives() {
        // Every file the matcher accepts must have been produced by the crawl
        let tree = model_tree().unwrap();
        let template = model_template();
        let matcher = PathMatcher::new(template.clone()).unwrap();

        let catalog = CatalogBuilder::new(tree.path())
            .template(template)
            .build()
            .unwrap()
            .into_catalog();
        let crawled: Vec<&str> = catalog.paths().collect();

        for file in tree.relative_files() {
            if matcher.match_path(&file).is_success() {
                assert!(crawled.contains(&file.as_str()), "missed {file}");
            }
        }
    }

    #[test]
    fn test_queries_on_built_catalog() {
        let tree = model_tree().unwrap();
        let catalog = CatalogBuilder::new(tree.path())
            .template(model_template())
            .build()
            .unwrap()
            .into_catalog();

        let hist = catalog
            .search(&Criteria::new().with("exp", "historical").with("variable", "tas"))
            .unwrap();
        assert_eq!(hist.len(), 3);

        let years = catalog.unique_values("year").unwrap();
        assert_eq!(
            years,
            vec![
                FieldValue::Int(1990),
                FieldValue::Int(2000),
                FieldValue::Int(2050)
            ]
        );

        assert!(catalog.has_unique_metadata());
    }
}

#[cfg(test)]
mod multi_template_tests {
    use super::*;

    #[test]
    fn test_first_matching_template_wins() {
        let tree = TestTreeBuilder::new()
            .files(["obs/A_2020.csv", "obs/A_2021.csv", "obs/readme.csv"])
            .build()
            .unwrap();

        let report = CatalogBuilder::new(tree.path())
            .templates([
                Template::compile("obs/{site}_{year:d}.csv").unwrap(),
                Template::compile("obs/{name}.csv").unwrap(),
            ])
            .build()
            .unwrap();

        let catalog = report.catalog;
        assert_eq!(catalog.columns(), ["site", "year", "name"]);
        assert_eq!(catalog.len(), 3);

        // Second template claims what the first rejects
        let readme = catalog
            .iter()
            .find(|entry| entry.path() == "obs/readme.csv")
            .unwrap();
        assert_eq!(readme.get("name"), Some(&FieldValue::from("readme")));
        assert_eq!(readme.get("site"), None);

        // Files admitted by both globs appear once
        let a_2020 = catalog
            .iter()
            .filter(|entry| entry.path() == "obs/A_2020.csv")
            .count();
        assert_eq!(a_2020, 1);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_unmatched_candidate_reports_every_template_failed() {
        let report = CatalogBuilder::new(".")
            .templates([
                Template::compile("{site}_{year:d}.csv").unwrap(),
                Template::compile("{site}-{year:d}.csv").unwrap(),
            ])
            .build_from_paths(["A_x.csv"])
            .unwrap();

        assert!(report.catalog.is_empty());
        assert!(matches!(
            report.failures[0].reason(),
            Some(MatchError::NoTemplateMatched { .. })
        ));
    }
}

#[cfg(all(test, unix))]
mod symlink_tests {
    use super::*;

    #[test]
    fn test_symlink_loop_is_warning_not_error() {
        let tree = TestTreeBuilder::new()
            .files(["a/x.csv"])
            .symlink("a/loop", "a")
            .build()
            .unwrap();

        let report = CatalogBuilder::new(tree.path())
            .template(Template::compile("{dir:**}/{name}.csv").unwrap())
            .build()
            .unwrap();

        assert!(
            report
                .warnings
                .iter()
                .any(|warning| warning.kind == WarningKind::SymlinkLoop)
        );
        assert!(report.catalog.paths().any(|path| path == "a/x.csv"));
    }

    #[test]
    fn test_links_not_followed_when_disabled() {
        let tree = TestTreeBuilder::new()
            .files(["real/2020.csv"])
            .symlink("link", "real")
            .build()
            .unwrap();

        let catalog = CatalogBuilder::new(tree.path())
            .template(Template::compile("{dir}/{year:d}.csv").unwrap())
            .options(CrawlOptions::new().with_follow_links(false))
            .build()
            .unwrap()
            .into_catalog();

        assert_eq!(catalog.paths().collect::<Vec<_>>(), vec!["real/2020.csv"]);
    }

    #[test]
    fn test_linked_directory_is_cataloged_once() {
        let tree = TestTreeBuilder::new()
            .files(["real/2020.csv"])
            .symlink("link", "real")
            .build()
            .unwrap();

        let report = CatalogBuilder::new(tree.path())
            .template(Template::compile("{dir}/{year:d}.csv").unwrap())
            .build()
            .unwrap();

        // Both walks reach the same file; the first one in crawl order is kept
        assert_eq!(
            report.catalog.paths().collect::<Vec<_>>(),
            vec!["link/2020.csv"]
        );
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_broken_symlink_is_warning_not_error() {
        let tree = TestTreeBuilder::new()
            .files(["real/2020.csv"])
            .symlink("dangling", "missing")
            .build()
            .unwrap();

        let report = CatalogBuilder::new(tree.path())
            .template(Template::compile("{dir}/{year:d}.csv").unwrap())
            .build()
            .unwrap();

        assert!(
            report
                .warnings
                .iter()
                .any(|warning| warning.kind == WarningKind::NotFound)
        );
        assert_eq!(
            report.catalog.paths().collect::<Vec<_>>(),
            vec!["real/2020.csv"]
        );
    }

    #[test]
    fn test_unreadable_directory_is_warning_not_error() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let tree = TestTreeBuilder::new()
            .files(["locked/2020.csv", "open/2021.csv"])
            .build()
            .unwrap();
        let locked = tree.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not apply to privileged users
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let report = CatalogBuilder::new(tree.path())
            .template(Template::compile("{dir}/{year:d}.csv").unwrap())
            .build();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let report = report.unwrap();
        assert!(
            report
                .warnings
                .iter()
                .any(|warning| warning.kind == WarningKind::PermissionDenied)
        );
        assert_eq!(
            report.catalog.paths().collect::<Vec<_>>(),
            vec!["open/2021.csv"]
        );
    }
}
