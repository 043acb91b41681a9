use clap::Subcommand;
use studyroom_core::{Store, StudyEngine};

#[derive(Subcommand)]
pub enum StatsAction {
    /// The full aggregate stats record
    Show,
    /// Per-subject rollups
    Subjects,
    /// The ten most recent session summaries
    Recent,
    /// Every recorded session, most recent first
    History,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let engine = StudyEngine::new(Store::open()?)?;

    match action {
        StatsAction::Show => {
            let stats = engine.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::Subjects => {
            let stats = engine.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats.subjects)?);
        }
        StatsAction::Recent => {
            let stats = engine.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats.recent)?);
        }
        StatsAction::History => {
            let sessions = engine.sessions()?;
            println!("{}", serde_json::to_string_pretty(&sessions)?);
        }
    }
    Ok(())
}
