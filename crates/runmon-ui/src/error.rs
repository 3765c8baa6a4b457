use runmon_core::RunId;

/// A precondition the reducer refuses to paper over. Always a caller bug.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReduceError {
    #[error("action {action} is not valid while the {view} view is shown")]
    WrongView {
        action: &'static str,
        view: &'static str,
    },
    #[error("snapshot for run {got} cannot replace the observed run {expected}")]
    RunMismatch { expected: String, got: String },
    #[error("cannot launch: no {missing} selected")]
    IncompleteLaunch { missing: &'static str },
}

impl ReduceError {
    pub(crate) fn run_mismatch(expected: Option<RunId>, got: Option<RunId>) -> Self {
        let render = |id: Option<RunId>| match id {
            Some(id) => id.to_string(),
            None => "draft".to_string(),
        };
        ReduceError::RunMismatch {
            expected: render(expected),
            got: render(got),
        }
    }
}
