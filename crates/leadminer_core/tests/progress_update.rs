use leadminer_core::{update, DocumentStatus, ProgressMsg, ProgressState, STATUS_COMPLETED};
use pretty_assertions::assert_eq;

fn apply(state: ProgressState, msgs: Vec<ProgressMsg>) -> ProgressState {
    msgs.into_iter().fold(state, update)
}

#[test]
fn run_start_resets_previous_run() {
    let stale = ProgressState {
        current: 4,
        total: 4,
        status: STATUS_COMPLETED.to_string(),
        active: false,
        preview: "old".to_string(),
    };
    let next = update(stale, ProgressMsg::RunStarted { total: 10 });
    assert_eq!(
        next,
        ProgressState {
            current: 0,
            total: 10,
            status: "Connecting...".to_string(),
            active: true,
            preview: String::new(),
        }
    );
}

#[test]
fn candidates_advance_counter_and_status() {
    let state = apply(
        ProgressState::new(),
        vec![
            ProgressMsg::RunStarted { total: 10 },
            ProgressMsg::CandidatesFound { total: 3 },
            ProgressMsg::CandidateStarted {
                index: 1,
                title: "Municipal Procurement Directory 2021".to_string(),
            },
        ],
    );
    assert_eq!(state.current, 2);
    assert_eq!(state.total, 3);
    assert_eq!(state.status, "Mining: Municipal Procuremen...");
    assert!(state.active);
}

#[test]
fn finished_candidate_sets_preview() {
    let state = apply(
        ProgressState::new(),
        vec![
            ProgressMsg::RunStarted { total: 1 },
            ProgressMsg::CandidateFinished {
                title: "Guide".to_string(),
                status: DocumentStatus::Success,
                preview: "  www.acme.com\n".to_string(),
            },
        ],
    );
    assert_eq!(state.status, "Success: Guide");
    assert_eq!(state.preview, "www.acme.com");
}

#[test]
fn completion_is_terminal_and_inactive() {
    let state = apply(
        ProgressState::new(),
        vec![
            ProgressMsg::RunStarted { total: 2 },
            ProgressMsg::BudgetExhausted,
            ProgressMsg::Completed,
        ],
    );
    assert!(state.is_completed());
    assert!(!state.active);
}

#[test]
fn state_serializes_to_stream_json() {
    let json = serde_json::to_value(ProgressState::new()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "current": 0,
            "total": 0,
            "status": "Idle",
            "active": false,
            "preview": ""
        })
    );
}
