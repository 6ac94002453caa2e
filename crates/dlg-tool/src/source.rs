use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use dlg_runtime::MemoryState;
use walkdir::WalkDir;

use crate::{DlgToolError, TestCase, TESTCASE_SCHEMA_V1};

fn read_file(path: &Path) -> Result<String, DlgToolError> {
    fs::read_to_string(path).map_err(|source| DlgToolError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_dialogue_json(path: &Path) -> Result<String, DlgToolError> {
    read_file(path)
}

pub fn read_participants(path: &Path) -> Result<BTreeMap<String, MemoryState>, DlgToolError> {
    let raw = read_file(path)?;
    serde_json::from_str(&raw).map_err(|source| DlgToolError::ParseParticipants {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_test_case(case_path: &Path) -> Result<TestCase, DlgToolError> {
    let raw = read_file(case_path)?;
    let parsed: TestCase = serde_json::from_str(&raw).map_err(|source| DlgToolError::ParseCase {
        path: case_path.to_path_buf(),
        source,
    })?;

    if parsed.schema_version != TESTCASE_SCHEMA_V1 {
        return Err(DlgToolError::InvalidSchemaVersion {
            expected: TESTCASE_SCHEMA_V1.to_string(),
            found: parsed.schema_version,
        });
    }

    Ok(parsed)
}

/// Directories under `root` holding a `testcase.json`, sorted by path.
pub fn find_case_dirs(root: &Path) -> Result<Vec<PathBuf>, DlgToolError> {
    let mut dirs = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == "testcase.json")
        .filter_map(|entry| entry.path().parent().map(Path::to_path_buf))
        .collect::<Vec<_>>();
    dirs.sort();

    if dirs.is_empty() {
        return Err(DlgToolError::CasesEmpty {
            path: root.to_path_buf(),
        });
    }
    Ok(dirs)
}
