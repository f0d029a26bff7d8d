use crate::{prepare_preview, ProgressMsg, ProgressState, STATUS_COMPLETED};

const STATUS_TITLE_CHARS: usize = 20;

/// Pure update function: applies a message to the progress state.
pub fn update(mut state: ProgressState, msg: ProgressMsg) -> ProgressState {
    match msg {
        ProgressMsg::RunStarted { total } => {
            state = ProgressState {
                total,
                status: "Connecting...".to_string(),
                active: true,
                ..ProgressState::default()
            };
        }
        ProgressMsg::CandidatesFound { total } => {
            state.total = total;
            state.status = format!("Found {total} documents");
        }
        ProgressMsg::CandidateStarted { index, title } => {
            state.current = index + 1;
            state.status = format!("Mining: {}...", short_title(&title));
        }
        ProgressMsg::CandidateFinished {
            title,
            status,
            preview,
        } => {
            state.status = format!("{}: {}", status.label(), short_title(&title));
            state.preview = prepare_preview(&preview);
        }
        ProgressMsg::BudgetExhausted => {
            state.status = "Time budget reached".to_string();
        }
        ProgressMsg::Completed => {
            state.status = STATUS_COMPLETED.to_string();
            state.active = false;
        }
    }
    state
}

fn short_title(title: &str) -> &str {
    match title.char_indices().nth(STATUS_TITLE_CHARS) {
        Some((idx, _)) => &title[..idx],
        None => title,
    }
}
