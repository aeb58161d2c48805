// Observed structural signals.
//
// A fixed library of evidence lines (S1..S18) grouped by the structural
// behavior they describe. Up to four representative lines are selected from
// the active set: one per core group first, then evidence and specificity
// fillers, then remaining candidates by priority. Lines are never invented;
// an insufficient active set yields fewer lines.

use crate::models::ObservedSignalLines;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalGroup {
    Revision,
    Transition,
    Counter,
    Evidence,
    NonAuto,
    Specificity,
}

#[derive(Debug, Clone, Copy)]
pub struct SignalTemplate {
    pub id: &'static str,
    pub text: &'static str,
    pub group: SignalGroup,
    /// Smaller is higher priority.
    pub priority: u32,
}

pub const SIGNAL_LIBRARY: [SignalTemplate; 18] = [
    // Revision / self-regulation
    SignalTemplate {
        id: "S1",
        text: "Revision activity occurs at semantic decision boundaries.",
        group: SignalGroup::Revision,
        priority: 10,
    },
    SignalTemplate {
        id: "S2",
        text: "Argument order adjustments correspond to logical correction.",
        group: SignalGroup::Revision,
        priority: 20,
    },
    SignalTemplate {
        id: "S3",
        text: "Claim scope or conditions are refined through explicit revision.",
        group: SignalGroup::Revision,
        priority: 30,
    },
    SignalTemplate {
        id: "S4",
        text: "Prior assumptions are explicitly re-evaluated during reasoning progression.",
        group: SignalGroup::Revision,
        priority: 40,
    },
    // Transition / consistency
    SignalTemplate {
        id: "S5",
        text: "Consistency checks appear across structural transitions.",
        group: SignalGroup::Transition,
        priority: 10,
    },
    SignalTemplate {
        id: "S6",
        text: "Logical transitions between claims and supporting reasons are explicitly maintained.",
        group: SignalGroup::Transition,
        priority: 20,
    },
    SignalTemplate {
        id: "S7",
        text: "Structural continuity is preserved across multi-step reasoning transitions.",
        group: SignalGroup::Transition,
        priority: 30,
    },
    // Counter-evaluation / verification
    SignalTemplate {
        id: "S8",
        text: "Alternative viewpoints are introduced and structurally examined.",
        group: SignalGroup::Counter,
        priority: 10,
    },
    SignalTemplate {
        id: "S9",
        text: "Counter-arguments are explicitly addressed through refutational reasoning.",
        group: SignalGroup::Counter,
        priority: 20,
    },
    SignalTemplate {
        id: "S10",
        text: "Evidence is evaluated against potential contradictions rather than accepted at face value.",
        group: SignalGroup::Counter,
        priority: 30,
    },
    // Evidence handling
    SignalTemplate {
        id: "S11",
        text: "Multiple evidence types are integrated within the reasoning structure.",
        group: SignalGroup::Evidence,
        priority: 10,
    },
    SignalTemplate {
        id: "S12",
        text: "Evidence placement aligns with the logical role it serves within the argument.",
        group: SignalGroup::Evidence,
        priority: 20,
    },
    SignalTemplate {
        id: "S13",
        text: "Supporting evidence is selectively introduced at structurally relevant points.",
        group: SignalGroup::Evidence,
        priority: 30,
    },
    // Non-automation / loop control
    SignalTemplate {
        id: "S14",
        text: "No sustained repetitive propagation is observed across reasoning segments.",
        group: SignalGroup::NonAuto,
        priority: 10,
    },
    SignalTemplate {
        id: "S15",
        text: "Structural variation is maintained without reliance on template-like repetition.",
        group: SignalGroup::NonAuto,
        priority: 20,
    },
    SignalTemplate {
        id: "S16",
        text: "Reasoning progression avoids uniform continuation patterns across sections.",
        group: SignalGroup::NonAuto,
        priority: 30,
    },
    // Structural specificity
    SignalTemplate {
        id: "S17",
        text: "Structural behavior reflects document-specific reasoning rather than generic composition patterns.",
        group: SignalGroup::Specificity,
        priority: 10,
    },
    SignalTemplate {
        id: "S18",
        text: "Observed structural signals vary across sections in response to local reasoning demands.",
        group: SignalGroup::Specificity,
        priority: 20,
    },
];

const DISPLAY_LINES: usize = 4;

fn template_by_id(id: &str) -> Option<&'static SignalTemplate> {
    SIGNAL_LIBRARY.iter().find(|t| t.id == id)
}

/// Select up to four evidence lines from the active template ids.
pub fn select_observed_signals(active_ids: &[String]) -> Vec<&'static str> {
    let candidates: Vec<&'static SignalTemplate> = active_ids
        .iter()
        .filter_map(|id| template_by_id(id))
        .collect();

    let pick_best = |group: SignalGroup| -> Option<&'static SignalTemplate> {
        candidates
            .iter()
            .filter(|t| t.group == group)
            .min_by_key(|t| t.priority)
            .copied()
    };

    let mut selected: Vec<&'static SignalTemplate> = Vec::new();
    let mut push_unique = |selected: &mut Vec<&'static SignalTemplate>,
                           t: Option<&'static SignalTemplate>| {
        if let Some(t) = t {
            if !selected.iter().any(|x| x.id == t.id) {
                selected.push(t);
            }
        }
    };

    // One line per core group in fixed order.
    for g in [
        SignalGroup::Revision,
        SignalGroup::Transition,
        SignalGroup::Counter,
        SignalGroup::NonAuto,
    ] {
        if selected.len() >= DISPLAY_LINES {
            break;
        }
        push_unique(&mut selected, pick_best(g));
    }

    // Fill from evidence then specificity.
    for g in [SignalGroup::Evidence, SignalGroup::Specificity] {
        if selected.len() >= DISPLAY_LINES {
            break;
        }
        push_unique(&mut selected, pick_best(g));
    }

    // Final fill from remaining candidates by priority.
    if selected.len() < DISPLAY_LINES {
        let mut remaining: Vec<&'static SignalTemplate> = candidates
            .iter()
            .filter(|t| !selected.iter().any(|x| x.id == t.id))
            .copied()
            .collect();
        remaining.sort_by_key(|t| t.priority);
        for t in remaining {
            if selected.len() >= DISPLAY_LINES {
                break;
            }
            selected.push(t);
        }
    }

    selected
        .iter()
        .take(DISPLAY_LINES)
        .map(|t| t.text)
        .collect()
}

/// Wire shape with fixed keys "1".."4"; missing lines render as "".
pub fn to_signal_lines(lines: &[&str]) -> ObservedSignalLines {
    let pick = |i: usize| lines.get(i).copied().unwrap_or("").to_string();
    ObservedSignalLines {
        line1: pick(0),
        line2: pick(1),
        line3: pick(2),
        line4: pick(3),
    }
}
