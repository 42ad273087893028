// ── Live synchronization ──
//
// Viewers poll on their own intervals; every request carries a generation
// number and only the latest issued one may update what is shown.

mod board;
mod countdown;
mod generation;
mod poller;
mod status;

pub use board::{BOARD_REFRESH, BoardSnapshot, fetch_board};
pub(crate) use board::BOARD_FALLBACK_MESSAGE;
pub use countdown::{
    CRITICAL_THRESHOLD_SECS, Countdown, Tick, Urgency, WARNING_THRESHOLD_SECS, format_clock,
};
pub use generation::{Generation, GenerationGate};
pub use poller::{PollingSync, Synced};
pub use status::{StatusSync, StatusView, SyncTiming};
