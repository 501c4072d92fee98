//! Terminal presentation: the note board, the capture surface and
//! notifications.

pub mod board;
pub mod capture;
pub mod notify;

pub use board::{Card, NoteBoard};
pub use capture::{spawn_line_reader, CaptureLoop, Command, Flow};
pub use notify::TerminalNotifier;
