use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use todo_pro::cli::{self, Cli, Commands};
use todo_pro::{Config, Profile, Tab, Workspace, open_storage, utils};

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };

    let config = match &cli.config {
        Some(path) => Config::load_from_path(&utils::expand_path(path))?,
        None => Config::load_with_profile(profile)?,
    };

    todo_pro::logging::init_logging(&config.log_level);

    let data_path = config.get_data_path(profile)?;
    let storage = open_storage(config.storage, &data_path)
        .wrap_err_with(|| format!("Failed to open storage at {}", data_path.display()))?;
    let mut workspace = Workspace::load(storage);
    workspace.refresh_streaks(utils::today());

    let mut out = std::io::stdout().lock();

    match cli.command.unwrap_or(Commands::Stats) {
        Commands::AddTask {
            title,
            due,
            tags,
            tag,
            category,
            description,
        } => {
            cli::handle_add_task(
                title,
                due,
                tags,
                tag,
                category,
                description,
                &mut workspace,
                &mut out,
            )?;
        }
        Commands::AddNote { title, content, tag } => {
            cli::handle_add_note(title, content, tag, &mut workspace, &mut out)?;
        }
        Commands::AddHabit {
            title,
            frequency,
            category,
        } => {
            cli::handle_add_habit(title, frequency, category, &mut workspace, &mut out)?;
        }
        Commands::CompleteTask { id, undo } => {
            cli::handle_complete_task(id, undo, &mut workspace, &mut out)?;
        }
        Commands::HabitDone { id, date, undo } => {
            cli::handle_habit_done(id, date, undo, &mut workspace, &mut out)?;
        }
        Commands::List {
            tab,
            search,
            sort,
            desc,
            status,
            category,
        } => {
            let tab = match tab {
                Some(key) => key.parse::<Tab>()?,
                None => config.default_tab()?,
            };
            cli::handle_list(
                tab,
                search,
                sort,
                desc,
                status,
                category,
                &mut workspace,
                &mut out,
            )?;
        }
        Commands::CompleteReminder { id } => {
            cli::handle_complete_reminder(id, &mut workspace, &mut out)?;
        }
        Commands::DismissReminder { id } => {
            cli::handle_dismiss_reminder(id, &mut workspace, &mut out)?;
        }
        Commands::Search { term } => {
            cli::handle_search(term, &mut workspace, &mut out)?;
        }
        Commands::Stats => {
            cli::handle_stats(&workspace, &mut out)?;
        }
        Commands::Remove { tab, id } => {
            cli::handle_remove(tab.parse::<Tab>()?, id, &mut workspace, &mut out)?;
        }
    }

    Ok(())
}
