use std::fs;
use std::path::Path;

use dlg_api::{
    dialogue_to_json, load_dialogue_from_json, missing_participants, participants_from_states,
    LoadDialogueOptions,
};
use dlg_core::DialogueError;
use dlg_graph::{find_text, replace_text, validate, Diagnostic, Severity};

use crate::{
    json_string, load_source, map_cli_dialogue_write, read_json_or_default, read_text,
    resolve_dir, resolve_file, scan_dialogue_files, FindTextArgs, InspectArgs, LintArgs,
    ReplaceTextArgs,
};

pub(crate) fn run_inspect(args: InspectArgs) -> Result<i32, DialogueError> {
    let source = load_source(&args.source)?;
    let loaded = load_dialogue_from_json(&source.dialogue_json, &source.load)?;
    let dialogue = &loaded.dialogue;

    println!("RESULT:OK");
    println!("DIALOGUE_JSON:{}", json_string(&dialogue.name));
    println!("GUID:{}", dialogue.guid);
    println!("START_NODES:{}", dialogue.start_nodes().len());
    println!("NODES:{}", dialogue.nodes().len());
    for binding in dialogue.participant_classes() {
        println!(
            "PARTICIPANT:{}|{}",
            binding.participant_name,
            binding.class_name.as_deref().unwrap_or("NONE")
        );
    }
    for state in dialogue.speaker_states() {
        println!("SPEAKER_STATE_JSON:{}", json_string(state));
    }
    let bound = participants_from_states(&source.participants);
    for name in missing_participants(dialogue, &bound) {
        println!("UNBOUND_PARTICIPANT:{}", name);
    }
    let validation = validate(dialogue, &source.load.catalog);
    for diagnostic in loaded.diagnostics.iter().chain(validation.iter()) {
        println!("DIAGNOSTIC:{}", diagnostic);
    }
    Ok(0)
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct LintSummary {
    pub(crate) files: usize,
    pub(crate) errors: usize,
    pub(crate) warnings: usize,
    pub(crate) lines: Vec<String>,
}

impl LintSummary {
    fn record(&mut self, file: &str, diagnostic: &Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Info => {}
        }
        self.lines.push(format!("DIAGNOSTIC:{}|{}", file, diagnostic));
    }
}

/// Load failures count as errors for the file instead of aborting the scan.
pub(crate) fn lint_dir(
    dir: &Path,
    load: &LoadDialogueOptions,
) -> Result<LintSummary, DialogueError> {
    let mut summary = LintSummary::default();
    for (file, json) in scan_dialogue_files(dir)? {
        summary.files += 1;
        let loaded = match load_dialogue_from_json(&json, load) {
            Ok(loaded) => loaded,
            Err(error) => {
                summary.record(&file, &Diagnostic::error(&error.code, error.message));
                continue;
            }
        };
        if loaded.generated_guids {
            summary.record(
                &file,
                &Diagnostic::warning(
                    dlg_graph::validate::GUID_NIL,
                    "Dialogue or nodes have no GUID; saved sessions cannot be resumed.",
                ),
            );
        }
        let validation = validate(&loaded.dialogue, &load.catalog);
        for diagnostic in loaded.diagnostics.iter().chain(validation.iter()) {
            summary.record(&file, diagnostic);
        }
    }
    Ok(summary)
}

pub(crate) fn run_lint(args: LintArgs) -> Result<i32, DialogueError> {
    let dir = resolve_dir(&args.dir)?;
    let load = LoadDialogueOptions {
        settings: read_json_or_default(args.settings.as_deref())?,
        catalog: read_json_or_default(args.classes.as_deref())?,
    };
    let summary = lint_dir(&dir, &load)?;

    println!(
        "RESULT:{}",
        if summary.errors == 0 { "OK" } else { "LINT_FAILED" }
    );
    for line in &summary.lines {
        println!("{}", line);
    }
    println!("FILES:{}", summary.files);
    println!("ERRORS:{}", summary.errors);
    println!("WARNINGS:{}", summary.warnings);
    Ok(if summary.errors == 0 { 0 } else { 1 })
}

pub(crate) fn run_find_text(args: FindTextArgs) -> Result<i32, DialogueError> {
    let path = resolve_file(&args.dialogue)?;
    let loaded = load_dialogue_from_json(&read_text(&path)?, &LoadDialogueOptions::default())?;
    let matches = find_text(&loaded.dialogue, &args.text, args.exact);

    println!("RESULT:OK");
    println!("MATCHES:{}", matches.len());
    for found in matches {
        println!(
            "MATCH:{}|{}|{}",
            found.node_index,
            found.guid,
            json_string(&found.text)
        );
    }
    Ok(0)
}

pub(crate) fn run_replace_text(args: ReplaceTextArgs) -> Result<i32, DialogueError> {
    let path = resolve_file(&args.dialogue)?;
    let loaded = load_dialogue_from_json(&read_text(&path)?, &LoadDialogueOptions::default())?;
    let mut dialogue = (*loaded.dialogue).clone();
    let matches = find_text(&dialogue, &args.find, args.exact);
    let replaced = replace_text(&mut dialogue, &matches, &args.find, &args.replace);

    let out = match &args.out {
        Some(out) => Path::new(out).to_path_buf(),
        None => path,
    };
    fs::write(&out, dialogue_to_json(&dialogue)?).map_err(map_cli_dialogue_write)?;

    println!("RESULT:OK");
    println!("REPLACED:{}", replaced);
    println!("OUT:{}", out.display());
    Ok(0)
}
