use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use dlg_api::LoadDialogueOptions;
use dlg_core::DialogueError;
use serde::de::DeserializeOwned;
use walkdir::WalkDir;

use crate::{
    map_cli_source_invalid, map_cli_source_path, map_cli_source_read, map_cli_source_scan,
    LoadedSource, SourceArgs, SourceRef,
};

pub(crate) fn load_source(args: &SourceArgs) -> Result<LoadedSource, DialogueError> {
    let resolve_optional = |path: &Option<String>| -> Result<Option<String>, DialogueError> {
        path.as_deref()
            .map(|path| resolve_file(path).map(|path| path.display().to_string()))
            .transpose()
    };
    let source_ref = SourceRef {
        dialogue: resolve_file(&args.dialogue)?.display().to_string(),
        participants: resolve_optional(&args.participants)?,
        settings: resolve_optional(&args.settings)?,
        classes: resolve_optional(&args.classes)?,
    };
    load_source_by_ref(&source_ref)
}

pub(crate) fn load_source_by_ref(source_ref: &SourceRef) -> Result<LoadedSource, DialogueError> {
    let dialogue_json = read_text(Path::new(&source_ref.dialogue))?;
    let load = LoadDialogueOptions {
        settings: read_json_or_default(source_ref.settings.as_deref())?,
        catalog: read_json_or_default(source_ref.classes.as_deref())?,
    };
    let participants = read_json_or_default(source_ref.participants.as_deref())?;

    Ok(LoadedSource {
        source_ref: source_ref.clone(),
        dialogue_json,
        load,
        participants,
    })
}

fn absolute(path: &str) -> Result<PathBuf, DialogueError> {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        return Ok(path);
    }
    Ok(std::env::current_dir()
        .map_err(map_cli_source_path)?
        .join(path))
}

pub(crate) fn resolve_file(path: &str) -> Result<PathBuf, DialogueError> {
    let absolute = absolute(path)?;
    if !absolute.exists() {
        return Err(DialogueError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("File does not exist: {}", absolute.display()),
        ));
    }
    if !absolute.is_file() {
        return Err(DialogueError::new(
            "CLI_SOURCE_NOT_FILE",
            format!("Path is not a file: {}", absolute.display()),
        ));
    }
    Ok(absolute)
}

pub(crate) fn resolve_dir(dir: &str) -> Result<PathBuf, DialogueError> {
    let absolute = absolute(dir)?;
    if !absolute.exists() {
        return Err(DialogueError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("dir does not exist: {}", absolute.display()),
        ));
    }
    if !absolute.is_dir() {
        return Err(DialogueError::new(
            "CLI_SOURCE_NOT_DIR",
            format!("dir is not a directory: {}", absolute.display()),
        ));
    }
    Ok(absolute)
}

pub(crate) fn read_text(path: &Path) -> Result<String, DialogueError> {
    fs::read_to_string(path).map_err(map_cli_source_read)
}

/// Missing path means `T::default()`.
pub(crate) fn read_json_or_default<T: DeserializeOwned + Default>(
    path: Option<&str>,
) -> Result<T, DialogueError> {
    let Some(path) = path else {
        return Ok(T::default());
    };
    let raw = read_text(Path::new(path))?;
    serde_json::from_str(&raw).map_err(map_cli_source_invalid)
}

pub(crate) fn is_dialogue_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name == "dialogue.json" || name.ends_with(".dialogue.json"))
}

/// Every `dialogue.json` / `*.dialogue.json` under `dir`, keyed by relative path.
pub(crate) fn scan_dialogue_files(dir: &Path) -> Result<BTreeMap<String, String>, DialogueError> {
    let mut dialogues = BTreeMap::new();

    for entry in WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() || !is_dialogue_file(entry.path()) {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(dir)
            .map_err(map_cli_source_scan)?
            .to_string_lossy()
            .replace('\\', "/");
        dialogues.insert(relative, read_text(entry.path())?);
    }

    if dialogues.is_empty() {
        return Err(DialogueError::new(
            "CLI_SOURCE_EMPTY",
            format!("No dialogue.json/*.dialogue.json files under {}", dir.display()),
        ));
    }

    Ok(dialogues)
}
