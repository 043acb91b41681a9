use clap::Subcommand;
use studyroom_core::{Store, StudyEngine};

#[derive(Subcommand)]
pub enum AchievementsAction {
    /// Every achievement in the catalog with its current progress
    List,
    /// Only the achievements already unlocked
    Unlocked,
}

pub fn run(action: AchievementsAction) -> Result<(), Box<dyn std::error::Error>> {
    let engine = StudyEngine::new(Store::open()?)?;
    let achievements = engine.achievements()?;

    match action {
        AchievementsAction::List => {
            println!("{}", serde_json::to_string_pretty(&achievements)?);
        }
        AchievementsAction::Unlocked => {
            let unlocked: Vec<_> = achievements.into_iter().filter(|a| a.unlocked).collect();
            println!("{}", serde_json::to_string_pretty(&unlocked)?);
        }
    }
    Ok(())
}
