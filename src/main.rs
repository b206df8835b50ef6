use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{debug, warn};

use tabedit::controller::Controller;
use tabedit::domain::{
    CancelPolicy, DeletePolicy, HELP_TEXT, MAX_COLUMN_WIDTH, Message, ROWS_PER_PAGE, TEConfig,
    TEError,
};
use tabedit::logging;
use tabedit::model::Model;
use tabedit::persist::StateStore;
use tabedit::ui::TableUI;

#[derive(Parser, Debug)]
#[command(name = "tabedit", version, about = "Edit a table of people from the command line")]
struct Cli {
    /// Where the session state is kept between runs
    #[arg(long, global = true, default_value = "~/.local/share/tabedit")]
    state_dir: String,

    /// Rows per page, overrides the saved setting
    #[arg(long, global = true)]
    rows_per_page: Option<usize>,

    #[arg(long, global = true, default_value_t = MAX_COLUMN_WIDTH)]
    max_column_width: usize,

    /// Deleting a row also drops its pending edits and errors
    #[arg(long, global = true)]
    cascade_deletes: bool,

    /// Cancelling edits also clears validation errors
    #[arg(long, global = true)]
    clear_errors_on_cancel: bool,

    /// More output on stderr, repeat for more
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Append the rows of a CSV file
    Import { file: PathBuf },
    /// Write all rows with the visible columns to a CSV file
    Export { file: PathBuf },
    /// Print the current page
    Show {
        #[arg(long)]
        page: Option<usize>,
        #[arg(long)]
        search: Option<String>,
    },
    /// Run editor commands in order, then print the page
    #[command(after_help = HELP_TEXT)]
    Apply {
        #[arg(required = true)]
        commands: Vec<String>,
    },
    /// List the visible columns with their positions
    Columns,
    /// Forget all saved state
    Reset,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli) {
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn config_from(cli: &Cli) -> Result<TEConfig, TEError> {
    let state_dir = shellexpand::full(&cli.state_dir)
        .map_err(|e| TEError::InvalidPath(e.to_string()))?;
    let delete_policy = if cli.cascade_deletes {
        DeletePolicy::Cascade
    } else {
        DeletePolicy::Retain
    };
    let cancel_policy = if cli.clear_errors_on_cancel {
        CancelPolicy::ClearErrors
    } else {
        CancelPolicy::RetainErrors
    };
    Ok(TEConfig::default()
        .with_state_dir(state_dir.into_owned())
        .with_rows_per_page(cli.rows_per_page.unwrap_or(ROWS_PER_PAGE))
        .with_max_column_width(cli.max_column_width)
        .with_delete_policy(delete_policy)
        .with_cancel_policy(cancel_policy))
}

fn run(cli: Cli) -> Result<(), TEError> {
    let cfg = config_from(&cli)?;
    let store = StateStore::new(cfg.state_dir.clone());
    let ui = TableUI::new(cfg.max_column_width);

    if let Command::Reset = cli.command {
        store.clear()?;
        println!("Cleared state in {:?}", store.dir());
        return Ok(());
    }

    let mut model = Model::restore(cfg, &store)?;
    if let Some(rows_per_page) = cli.rows_per_page {
        model.set_rows_per_page(rows_per_page);
    }

    match cli.command {
        Command::Import { file } => {
            let count = model.import_csv(&file)?;
            println!("Imported {count} rows from {file:?}");
        }
        Command::Export { file } => {
            model.export_csv(&file)?;
            println!("Exported {} rows to {file:?}", model.table().len());
            return Ok(());
        }
        Command::Show { page, search } => {
            if let Some(query) = search {
                model.update(Message::SetSearchQuery(query))?;
            }
            if let Some(page) = page {
                model.update(Message::SetCurrentPage(page))?;
            }
            print!("{}", ui.render(&model.uidata()));
        }
        Command::Apply { commands } => {
            // Every command has to parse before anything is applied.
            let messages = commands
                .iter()
                .map(|line| Controller::handle_command(line))
                .collect::<Result<Vec<_>, _>>()?;
            for message in messages {
                if message == Message::SaveAllEdits && !model.can_save() {
                    warn!("Save refused, nothing is edited or a field is invalid");
                    eprintln!("Nothing saved: no edits pending or validation errors present");
                    continue;
                }
                debug!("Applying {message:?}");
                if let Err(e) = model.update(message) {
                    eprintln!("Error: {e}");
                }
            }
            print!("{}", ui.render(&model.uidata()));
        }
        Command::Columns => {
            for (idx, column) in model.columns().visible_columns().iter().enumerate() {
                println!("{idx}: {column}");
            }
            return Ok(());
        }
        Command::Reset => return Ok(()),
    }

    model.persist(&store)
}
