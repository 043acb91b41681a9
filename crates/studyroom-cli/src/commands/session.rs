use clap::Subcommand;
use studyroom_core::{CoreError, Event, Store, StudyEngine};

#[derive(Subcommand)]
pub enum SessionAction {
    /// Start a new study session
    Start {
        /// Subject of the session (e.g. "Biology")
        subject: String,
        /// Total time budget in minutes
        #[arg(long)]
        minutes: u64,
    },
    /// Pause the running countdown
    Pause,
    /// Resume a paused countdown (or start a staged cycle)
    Resume,
    /// Force-complete the current cycle
    Skip,
    /// Restore the current cycle to its full duration
    Reset,
    /// Abort the session without recording it
    Cancel,
    /// Tick the countdown and print the session state as JSON
    Status,
}

fn print_events(events: &[Event]) -> Result<(), Box<dyn std::error::Error>> {
    for event in events {
        println!("{}", serde_json::to_string_pretty(event)?);
    }
    Ok(())
}

fn print_optional(event: Option<Event>) -> Result<(), Box<dyn std::error::Error>> {
    match event {
        Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
        // Invalid transition: a silent no-op at the engine level.
        None => println!("{{\"type\": \"no_transition\"}}"),
    }
    Ok(())
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open()?;
    let mut engine = StudyEngine::new(store)?;

    match action {
        SessionAction::Start { subject, minutes } => {
            let events = engine.start_session(&subject, minutes, None)?;
            print_events(&events)?;
        }
        SessionAction::Pause => print_optional(engine.pause()?)?,
        SessionAction::Resume => print_optional(engine.resume()?)?,
        SessionAction::Skip => {
            let events = engine.skip()?;
            print_events(&events)?;
        }
        SessionAction::Reset => print_optional(engine.reset()?)?,
        SessionAction::Cancel => print_optional(engine.cancel()?)?,
        SessionAction::Status => match engine.tick() {
            Ok(events) => {
                print_events(&events)?;
                match engine.active_session() {
                    Some(session) => println!("{}", serde_json::to_string_pretty(session)?),
                    None => println!("{{\"type\": \"no_active_session\"}}"),
                }
            }
            Err(CoreError::NoActiveSession) => println!("{{\"type\": \"no_active_session\"}}"),
            Err(e) => return Err(e.into()),
        },
    }
    Ok(())
}
