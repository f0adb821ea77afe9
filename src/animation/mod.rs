/// Easing curves.
pub mod ease;
/// Per-frame spin and reveal schedule.
pub mod spin;
