use clap::Subcommand;
use studyroom_core::Settings;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the full settings file as JSON
    Show,
    /// Read one setting by its flat key (e.g. `study_minutes`)
    Get { key: String },
    /// Write one setting; the value is validated before it is saved
    Set { key: String, value: String },
    /// Restore the default settings
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => {
            let settings = Settings::load()?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        ConfigAction::Get { key } => {
            let settings = Settings::load()?;
            match settings.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown setting: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut settings = Settings::load()?;
            settings.set(&key, &value)?;
            settings.save()?;
            println!("{key} = {value}");
        }
        ConfigAction::Reset => {
            let settings = Settings::default();
            settings.save()?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
    }
    Ok(())
}
