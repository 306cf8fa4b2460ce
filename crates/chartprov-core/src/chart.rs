//! # Chart Archive Reader
//!
//! Extracts the embedded `Chart.yaml` from a packaged chart. A chart archive
//! is a gzip-compressed tarball whose entries live under a single top-level
//! directory named after the chart:
//!
//! ```text
//! hello/Chart.yaml
//! hello/values.yaml
//! hello/templates/deployment.yaml
//! ```
//!
//! Only the manifest is read; other entries are skipped without being
//! buffered.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Component, Path};

use flate2::read::GzDecoder;

use crate::error::{FormatError, ProvenanceError};
use crate::metadata::Metadata;

/// File name of the chart manifest inside the archive.
pub const CHART_FILE: &str = "Chart.yaml";

/// Load the metadata of a packaged chart.
///
/// Finds the first `<chart>/Chart.yaml` entry and parses it.
pub fn load_archive_metadata(path: &Path) -> Result<Metadata, ProvenanceError> {
    let file = File::open(path).map_err(|e| ProvenanceError::io(path, e))?;
    let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));

    let archive_err = |e: std::io::Error| FormatError::Archive {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    for entry in archive.entries().map_err(archive_err)? {
        let mut entry = entry.map_err(archive_err)?;
        let is_manifest = {
            let entry_path = entry.path().map_err(archive_err)?;
            is_chart_manifest(&entry_path)
        };
        if !is_manifest {
            continue;
        }

        let mut data = String::new();
        entry.read_to_string(&mut data).map_err(archive_err)?;
        return Metadata::from_yaml(&data).map_err(|e| {
            FormatError::Archive {
                path: path.to_path_buf(),
                reason: format!("invalid {CHART_FILE}: {e}"),
            }
            .into()
        });
    }

    Err(FormatError::ChartYamlMissing(path.to_path_buf()).into())
}

/// True for `<dir>/Chart.yaml`, ignoring a leading `./`.
fn is_chart_manifest(entry_path: &Path) -> bool {
    let parts: Vec<_> = entry_path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    matches!(
        parts.as_slice(),
        [Component::Normal(_), Component::Normal(file)] if *file == CHART_FILE
    )
}
