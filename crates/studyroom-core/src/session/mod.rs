mod controller;
mod countdown;
mod cycle;
mod settings;

pub use controller::{Session, SessionController, SessionStatus, SESSION_SCHEMA_VERSION};
pub use countdown::{CountdownEngine, TimerState};
pub use cycle::{generate_cycles, Cycle, CycleKind};
pub use settings::Settings;
