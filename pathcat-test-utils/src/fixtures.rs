//! Shared fixtures

use std::io;

use crate::builders::{TestTree, TestTreeBuilder};

/// Template of the site/year/month archive
pub const ARCHIVE_TEMPLATE: &str = "{site}/{year:d}/data_{month:02d}.csv";

/// Files of the site/year/month archive: two matches and one file the
/// traversal pattern prunes
pub const ARCHIVE_FILES: &[&str] = &[
    "A/2020/data_01.csv",
    "A/2020/data_99.csv",
    "B/notes.txt",
];

/// Path and file templates of a model output archive
pub const MODEL_PATH_TEMPLATE: &str = "{model}/{exp}/{variable}";
pub const MODEL_FILE_TEMPLATE: &str = "{variable}_{model}_{exp}_{year:d}.nc";

/// Files of the model output archive, including names that only the glob
/// accepts
pub const MODEL_FILES: &[&str] = &[
    "cesm/historical/tas/tas_cesm_historical_1990.nc",
    "cesm/historical/tas/tas_cesm_historical_2000.nc",
    "cesm/ssp585/tas/tas_cesm_ssp585_2050.nc",
    "cesm/ssp585/pr/pr_cesm_ssp585_2050.nc",
    "mpi/historical/tas/tas_mpi_historical_1990.nc",
    "mpi/historical/tas/tas_cesm_historical_1990.nc",
    "mpi/historical/tas/tas_mpi_historical_latest.nc",
    "mpi/historical/tas/README",
];

/// Tree holding [`ARCHIVE_FILES`]
pub fn archive_tree() -> io::Result<TestTree> {
    TestTreeBuilder::new().files(ARCHIVE_FILES.iter().copied()).build()
}

/// Tree holding [`MODEL_FILES`]
pub fn model_tree() -> io::Result<TestTree> {
    TestTreeBuilder::new().files(MODEL_FILES.iter().copied()).build()
}
