use crate::DocumentStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressMsg {
    /// A run was accepted; `total` is the requested candidate limit.
    RunStarted { total: usize },
    /// The search provider answered with this many candidates.
    CandidatesFound { total: usize },
    /// Work on the zero-based `index`-th candidate began.
    CandidateStarted { index: usize, title: String },
    /// A candidate reached its final status.
    CandidateFinished {
        title: String,
        status: DocumentStatus,
        preview: String,
    },
    /// The run stopped early on its wall-clock budget.
    BudgetExhausted,
    /// The run ended, normally or not.
    Completed,
}
