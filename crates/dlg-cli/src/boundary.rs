use dlg_core::DialogueError;
use dlg_runtime::DialogueContext;

use crate::{json_string, map_cli_output_json, BoundaryEvent, BoundaryResult};

/// Describes where the context currently waits: the active speech line plus
/// either the selectable options or the end of the session.
pub(crate) fn collect_boundary(context: &DialogueContext) -> BoundaryResult {
    let texts = if context.active_text().is_empty() {
        Vec::new()
    } else {
        vec![context.active_text().to_string()]
    };
    let speaker = Some(context.active_participant_name())
        .filter(|name| !name.is_empty() && !texts.is_empty())
        .map(str::to_string);

    if context.is_ended() {
        return BoundaryResult {
            event: BoundaryEvent::End,
            speaker,
            texts,
            choices: Vec::new(),
            end: context.end_outcome().cloned(),
        };
    }

    BoundaryResult {
        event: BoundaryEvent::Choices,
        speaker,
        texts,
        choices: context
            .current_options()
            .iter()
            .enumerate()
            .map(|(index, option)| (index, option.text.clone()))
            .collect(),
        end: None,
    }
}

pub(crate) fn emit_boundary(
    boundary: BoundaryResult,
    state_out: Option<String>,
) -> Result<(), DialogueError> {
    println!("RESULT:OK");
    match boundary.event {
        BoundaryEvent::Choices => println!("EVENT:CHOICES"),
        BoundaryEvent::End => println!("EVENT:END"),
    }

    if let Some(speaker) = &boundary.speaker {
        println!("SPEAKER_JSON:{}", json_string(speaker));
    }
    for text in &boundary.texts {
        println!("TEXT_JSON:{}", json_string(text));
    }
    for (index, text) in &boundary.choices {
        println!("CHOICE:{}|{}", index, json_string(text));
    }
    if let Some(end) = &boundary.end {
        println!(
            "END_JSON:{}",
            serde_json::to_string(end).map_err(map_cli_output_json)?
        );
    }

    println!(
        "STATE_OUT:{}",
        state_out.unwrap_or_else(|| "NONE".to_string())
    );
    Ok(())
}
