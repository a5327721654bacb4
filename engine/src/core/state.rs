/// Enumeration of possible states a world can be in.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum State {
    /// The world has been constructed but never simulated
    Created,
    /// The simulation loop is active
    Running,
    /// The world has been closed; no further mutation is valid
    Closed,
}

impl State {
    /// Whether moving from the current state to `next` is a legal transition.
    pub fn can_transition(self, next: State) -> bool {
        matches!(
            (self, next),
            (State::Created, State::Running)
                | (State::Created, State::Closed)
                | (State::Running, State::Closed)
        )
    }
}
