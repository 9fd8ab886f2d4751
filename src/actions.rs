use crossterm::event::KeyEvent;

/// Actions that can be dispatched through the application
#[derive(Debug, Clone)]
pub enum Action {
    /// A key was pressed
    KeyPress(KeyEvent),
    /// The elapsed-time ticker fired for the given epoch
    Tick(u64),
    /// An error occurred outside the app (input task, ticker)
    Error(String),
    /// Begin ticking for a new epoch
    StartTicker(u64),
    /// Stop the ticker
    CancelTicker,
}
