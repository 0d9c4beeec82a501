use bazaar_catalog::models::JobStatus;

/// The state-machine edges from spec §4.4. Both train (on the Model row)
/// and deploy (conceptually a Deployment row — modeled here as the
/// model's `deploy_status`) share this shape: not_started -> starting ->
/// in_progress -> {complete, failed}; complete -> stopped on operator
/// stop; any active state can fail.
pub fn valid_transition(from: JobStatus, to: JobStatus) -> bool {
    use JobStatus::*;
    matches!(
        (from, to),
        (NotStarted, Starting)
            | (NotStarted, Failed)
            | (Starting, InProgress)
            | (Starting, Failed)
            | (InProgress, Complete)
            | (InProgress, Failed)
            | (Complete, Stopped)
    )
}

/// All states reachable from `from` without passing through a terminal
/// state — used to build the `from` list passed to the catalog's
/// compare-and-swap update (`transition_train_status`/
/// `transition_deploy_status`), so a transition applies only if the row's
/// current state is still one the orchestrator expects it to be in.
pub fn preceding_states(to: JobStatus) -> &'static [JobStatus] {
    use JobStatus::*;
    match to {
        Starting => &[NotStarted],
        InProgress => &[Starting],
        Complete => &[InProgress],
        Failed => &[NotStarted, Starting, InProgress],
        Stopped => &[Complete],
        NotStarted => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use JobStatus::*;

    #[test]
    fn complete_never_transitions_backward() {
        assert!(!valid_transition(Complete, InProgress));
        assert!(!valid_transition(Complete, NotStarted));
    }

    #[test]
    fn terminal_states_have_no_outgoing_edges_except_stop() {
        assert!(!valid_transition(Failed, InProgress));
        assert!(!valid_transition(Stopped, InProgress));
    }

    #[test]
    fn happy_path_train_lifecycle() {
        assert!(valid_transition(NotStarted, Starting));
        assert!(valid_transition(Starting, InProgress));
        assert!(valid_transition(InProgress, Complete));
    }
}
