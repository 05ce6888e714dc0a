//! Continue/halt signal shared by the row emit sink and the upload progress callback.

/// Returned by a sink or observer to tell the producer whether to keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flow {
    #[default]
    Continue,
    Halt,
}

impl Flow {
    pub fn is_halt(self) -> bool {
        matches!(self, Flow::Halt)
    }
}
