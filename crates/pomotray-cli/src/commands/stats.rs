use chrono::Utc;
use clap::Subcommand;
use pomotray_core::{Database, Period};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's stats
    Today,
    /// Last 7 days
    Week,
    /// Last 30 days
    Month,
    /// Last 365 days
    Year,
    /// All-time stats
    All,
    /// List recorded sessions
    List {
        /// today, week, month, year or all
        #[arg(long, default_value = "today")]
        period: Period,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let now = Utc::now();

    let period = match action {
        StatsAction::Today => Period::Today,
        StatsAction::Week => Period::Week,
        StatsAction::Month => Period::Month,
        StatsAction::Year => Period::Year,
        StatsAction::All => Period::All,
        StatsAction::List { period } => {
            let sessions = db.sessions_since(period.since(now))?;
            println!("{}", serde_json::to_string_pretty(&sessions)?);
            return Ok(());
        }
    };

    let stats = db.stats(period, now)?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
