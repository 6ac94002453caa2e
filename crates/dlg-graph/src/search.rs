use dlg_core::{NodeKind, Uuid};
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dialogue::Dialogue;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMatch {
    pub node_index: usize,
    pub guid: Uuid,
    pub text: String,
}

/// Case-insensitive search over node texts. `exact` compares the whole text.
pub fn find_text(dialogue: &Dialogue, needle: &str, exact: bool) -> Vec<TextMatch> {
    let needle = needle.to_lowercase();
    dialogue
        .nodes()
        .iter()
        .enumerate()
        .filter(|(_, node)| !node.text().is_empty())
        .filter(|(_, node)| {
            let text = node.text().to_lowercase();
            if exact {
                text == needle
            } else {
                text.contains(&needle)
            }
        })
        .map(|(node_index, node)| TextMatch {
            node_index,
            guid: node.guid,
            text: node.text().to_string(),
        })
        .collect()
}

/// Replaces `find` (case-insensitive) inside the matched speech nodes.
/// Matches are resolved by GUID first so stale indices still land on the right node.
pub fn replace_text(
    dialogue: &mut Dialogue,
    matches: &[TextMatch],
    find: &str,
    replacement: &str,
) -> usize {
    if find.is_empty() {
        return 0;
    }
    let Ok(pattern) = RegexBuilder::new(&regex::escape(find))
        .case_insensitive(true)
        .build()
    else {
        return 0;
    };

    let mut changed = 0;
    for found in matches {
        let index = dialogue
            .get_node_index_for_guid(&found.guid)
            .unwrap_or(found.node_index);
        let Some(node) = dialogue.node_mut(index) else {
            warn!(index, "replace_text skipped: node no longer exists");
            continue;
        };
        let node_type = node.type_name();
        let NodeKind::Speech(speech) = &mut node.kind else {
            warn!(index, node_type, "replace_text only edits speech nodes");
            continue;
        };
        let replaced = pattern
            .replace_all(&speech.text, regex::NoExpand(replacement))
            .into_owned();
        if replaced != speech.text {
            speech.text = replaced;
            changed += 1;
        }
    }
    changed
}
