use std::collections::BTreeMap;
use std::path::Path;

use dlg_api::{
    create_context_from_json, memory_participants, participant_map, CreateContextFromJsonOptions,
    LoadDialogueOptions,
};
use dlg_runtime::{ContextOptions, DialogueContext, MemoryState};

use crate::source::{read_dialogue_json, read_participants, read_test_case};
use crate::{DlgToolError, ExpectedEvent, TestAction, TestCase};

const MAX_STEPS: usize = 5_000;

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub observed_events: Vec<ExpectedEvent>,
    pub consumed_actions: usize,
    pub steps: usize,
    /// Participant states after the session ended.
    pub participant_states: BTreeMap<String, MemoryState>,
}

pub fn run_case(case_dir: &Path, case: &TestCase) -> Result<RunReport, DlgToolError> {
    let dialogue_json = read_dialogue_json(&case_dir.join(&case.dialogue))?;
    let states = match &case.participants {
        Some(file) => read_participants(&case_dir.join(file))?,
        None => BTreeMap::new(),
    };
    let participants = memory_participants(&states);

    let mut context = create_context_from_json(CreateContextFromJsonOptions {
        dialogue_json,
        load: LoadDialogueOptions::default(),
        context: ContextOptions {
            participants: participant_map(&participants),
            random_seed: Some(case.random_seed),
            ..ContextOptions::default()
        },
        start_index: case.start_index,
        branch_tag: case.branch_tag.clone(),
    })?;

    let mut observed_events = Vec::new();
    let mut action_index = 0usize;

    for step in 1..=MAX_STEPS {
        observe_speech(&context, &mut observed_events);

        if context.is_ended() {
            observed_events.push(ExpectedEvent::End);
            if action_index != case.actions.len() {
                return Err(DlgToolError::UnusedActions {
                    used: action_index,
                    total: case.actions.len(),
                });
            }
            return Ok(RunReport {
                observed_events,
                consumed_actions: action_index,
                steps: step,
                participant_states: participants
                    .iter()
                    .map(|(name, participant)| (name.clone(), participant.state()))
                    .collect(),
            });
        }

        observed_events.push(ExpectedEvent::Choices {
            choices: context
                .current_options()
                .iter()
                .map(|option| option.text.clone())
                .collect(),
        });
        let event_index = observed_events.len() - 1;
        let action = case
            .actions
            .get(action_index)
            .ok_or(DlgToolError::MissingAction { event_index })?;
        match action {
            TestAction::Choose { index } => context.choose_option(*index)?,
            TestAction::ChooseAll { index } => context.choose_option_from_all(*index)?,
        }
        action_index += 1;
    }

    Err(DlgToolError::GuardExceeded {
        max_steps: MAX_STEPS,
    })
}

fn observe_speech(context: &DialogueContext, observed_events: &mut Vec<ExpectedEvent>) {
    if context.active_text().is_empty() {
        return;
    }
    observed_events.push(ExpectedEvent::Speech {
        speaker: context.active_participant_name().to_string(),
        text: context.active_text().to_string(),
    });
}

pub fn assert_case(case_dir: &Path, case_path: &Path) -> Result<(), DlgToolError> {
    let case = read_test_case(case_path)?;
    let report = run_case(case_dir, &case)?;

    if report.observed_events.len() != case.expected_events.len() {
        let observed = serde_json::to_string_pretty(&report.observed_events)
            .map_err(DlgToolError::EventSerialize)?;
        return Err(DlgToolError::EventCountMismatch {
            expected: case.expected_events.len(),
            actual: report.observed_events.len(),
            observed,
        });
    }

    for (index, (expected, actual)) in case
        .expected_events
        .iter()
        .zip(report.observed_events.iter())
        .enumerate()
    {
        if expected != actual {
            let expected = serde_json::to_string(expected).map_err(DlgToolError::EventSerialize)?;
            let actual = serde_json::to_string(actual).map_err(DlgToolError::EventSerialize)?;
            return Err(DlgToolError::EventMismatch {
                index,
                expected,
                actual,
            });
        }
    }

    for (participant, expected) in &case.expected_fired_events {
        let actual = report
            .participant_states
            .get(participant)
            .map(|state| state.fired_events.clone())
            .unwrap_or_default();
        if &actual != expected {
            return Err(DlgToolError::FiredEventsMismatch {
                participant: participant.clone(),
                expected: expected.clone(),
                actual,
            });
        }
    }

    Ok(())
}
