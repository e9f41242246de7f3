/// States of the conversational flow machine.
///
/// Every non-idle state waits for exactly one more message from the same
/// chat and is terminal on success: the handler replies and the session
/// returns to [`FlowState::Idle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    AwaitingAddName,
    AwaitingAddRate,
    AwaitingDeleteName,
    AwaitingChangeName,
    AwaitingChangeRate,
    AwaitingConvertName,
    AwaitingConvertAmount,
}

/// Per-chat volatile record of the current flow and partially collected
/// input. Never persisted; a restart drops all in-progress flows.
#[derive(Debug, Clone)]
pub struct Session {
    pub chat_id: String,
    pub state: FlowState,
    pub pending_currency: Option<String>,
}

impl Session {
    pub fn new(chat_id: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            state: FlowState::Idle,
            pending_currency: None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == FlowState::Idle
    }

    /// Return to idle, dropping any partially collected input.
    pub fn reset(&mut self) {
        self.state = FlowState::Idle;
        self.pending_currency = None;
    }

    /// Move to `state`, remembering the currency name the flow is about.
    pub fn advance(&mut self, state: FlowState, pending_currency: Option<String>) {
        self.state = state;
        self.pending_currency = pending_currency;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_clears_pending_input() {
        let mut session = Session::new("42");
        session.advance(FlowState::AwaitingAddRate, Some("USD".to_string()));
        assert!(!session.is_idle());

        session.reset();
        assert!(session.is_idle());
        assert_eq!(session.pending_currency, None);
    }
}
