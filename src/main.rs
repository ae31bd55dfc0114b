use chrono::Local;
use clap::{ArgAction, Args, Parser, Subcommand};
use log::{info, LevelFilter};
use simple_logger::SimpleLogger;
use std::{fs, path::PathBuf, process};
use uuid::Uuid;

use loan_tracker::format::{
    format_currency, format_currency_detailed, format_month_year, format_percentage,
};
use loan_tracker::store::{FileStorage, NewPartPayment, NewProject, ProjectStore, ProjectUpdate};
use loan_tracker::{
    calculate_emi, calculate_savings, generate_amortization, is_truncated, paid_emis, LoanError,
    LoanProject, LoanResult, MonthYear,
};

/// Track loans, their part payments and the interest those payments save
#[derive(Parser)]
#[command(name = "loan_tracker", version)]
struct Cli {
    /// Directory holding the project store
    #[arg(long, env = "LOAN_TRACKER_STORE", default_value = "loan-data", global = true)]
    store: PathBuf,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate the EMI for a loan without storing it
    Emi {
        #[arg(long)]
        principal: f64,
        /// Annual interest rate in percent
        #[arg(long)]
        rate: f64,
        /// Tenure in years
        #[arg(long)]
        tenure: u32,
    },
    /// List tracked loans
    List,
    /// Track a new loan
    Add(AddArgs),
    /// Change fields of a tracked loan
    Update(UpdateArgs),
    /// Stop tracking a loan
    Delete { id: Uuid },
    /// Print the month-by-month amortization schedule
    Schedule {
        id: Uuid,
        /// Ignore recorded part payments
        #[arg(long)]
        without_part_payments: bool,
    },
    /// Compare interest and tenure with and without part payments
    Savings { id: Uuid },
    /// Count EMIs paid up to the current month
    Progress { id: Uuid },
    /// Manage part payments of a loan
    #[command(subcommand)]
    PartPayment(PartPaymentCommand),
    /// Export loans as a versioned JSON document
    Export {
        /// Loans to export (all when omitted)
        #[arg(long = "id")]
        ids: Vec<Uuid>,
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Import loans from an exported JSON document
    Import { file: PathBuf },
}

#[derive(Args)]
struct AddArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    principal: f64,
    /// Annual interest rate in percent
    #[arg(long)]
    rate: f64,
    /// Tenure in years
    #[arg(long)]
    tenure: u32,
    /// Month of the first EMI (1-12)
    #[arg(long)]
    start_month: u32,
    #[arg(long)]
    start_year: i32,
    /// Monthly instalment actually paid, if different from the computed EMI
    #[arg(long)]
    emi: Option<f64>,
}

#[derive(Args)]
struct UpdateArgs {
    id: Uuid,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    principal: Option<f64>,
    #[arg(long)]
    rate: Option<f64>,
    #[arg(long)]
    tenure: Option<u32>,
    #[arg(long)]
    start_month: Option<u32>,
    #[arg(long)]
    start_year: Option<i32>,
    #[arg(long, conflicts_with = "clear_emi")]
    emi: Option<f64>,
    /// Drop the EMI override and use the computed EMI
    #[arg(long)]
    clear_emi: bool,
    /// Interest paid before EMIs began
    #[arg(long)]
    pre_emi_interest: Option<f64>,
    #[arg(long)]
    pre_emi_month: Option<u32>,
    #[arg(long)]
    pre_emi_year: Option<i32>,
}

#[derive(Subcommand)]
enum PartPaymentCommand {
    /// Record a part payment made in the given month
    Add {
        id: Uuid,
        #[arg(long)]
        month: u32,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        amount: f64,
    },
    /// Change a recorded part payment
    Update {
        id: Uuid,
        part_payment: Uuid,
        #[arg(long)]
        month: u32,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        amount: f64,
    },
    /// Remove a recorded part payment
    Remove { id: Uuid, part_payment: Uuid },
}

fn main() {
    let cli = Cli::parse();

    SimpleLogger::new()
        .with_level(log_level(cli.verbose))
        .init()
        .expect("logger installed twice");

    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn log_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn run(cli: Cli) -> LoanResult<()> {
    if let Commands::Emi {
        principal,
        rate,
        tenure,
    } = cli.command
    {
        // no store needed for a one-off calculation
        return show_emi(principal, rate, tenure);
    }

    info!("using store at {}", cli.store.display());
    let mut store = ProjectStore::init(FileStorage::new(&cli.store))?;

    match cli.command {
        Commands::Emi { .. } => unreachable!("emi is answered before the store is opened"),
        Commands::List => {
            let today = Local::now().date_naive();
            for project in store.projects() {
                println!(
                    "{}  {}  {} at {} for {} years, EMI {}, {}/{} EMIs paid",
                    project.id,
                    project.name,
                    format_currency(project.principal),
                    format_percentage(project.annual_rate),
                    project.tenure_years,
                    format_currency_detailed(project.emi()),
                    paid_emis(project, &today),
                    project.scheduled_months()
                );
            }
            Ok(())
        }
        Commands::Add(args) => {
            let id = store.add_project(NewProject {
                name: args.name,
                principal: args.principal,
                annual_rate: args.rate,
                tenure_years: args.tenure,
                start_month: args.start_month,
                start_year: args.start_year,
                emi_override: args.emi,
            })?;
            println!("{}", id);
            Ok(())
        }
        Commands::Update(args) => {
            let emi_override = if args.clear_emi {
                Some(None)
            } else {
                args.emi.map(Some)
            };
            store.update_project(
                args.id,
                ProjectUpdate {
                    name: args.name,
                    principal: args.principal,
                    annual_rate: args.rate,
                    tenure_years: args.tenure,
                    start_month: args.start_month,
                    start_year: args.start_year,
                    emi_override,
                    pre_emi_interest: args.pre_emi_interest.map(Some),
                    pre_emi_month: args.pre_emi_month.map(Some),
                    pre_emi_year: args.pre_emi_year.map(Some),
                },
            )
        }
        Commands::Delete { id } => store.delete_project(id),
        Commands::Schedule {
            id,
            without_part_payments,
        } => {
            let project = find(&store, id)?;
            let rows = generate_amortization(project, !without_part_payments);
            for row in &rows {
                println!("{}", row);
            }
            if is_truncated(project, &rows) {
                println!(
                    "EMI {} never repays this loan; schedule stopped after {} months",
                    format_currency_detailed(project.emi()),
                    rows.len()
                );
            }
            Ok(())
        }
        Commands::Savings { id } => {
            show_savings(find(&store, id)?);
            Ok(())
        }
        Commands::Progress { id } => {
            let project = find(&store, id)?;
            let paid = paid_emis(project, &Local::now().date_naive());
            println!(
                "{} of {} EMIs paid since {}",
                paid,
                project.scheduled_months(),
                project.start()
            );
            Ok(())
        }
        Commands::PartPayment(command) => match command {
            PartPaymentCommand::Add {
                id,
                month,
                year,
                amount,
            } => {
                let pp_id = store.add_part_payment(
                    id,
                    NewPartPayment {
                        month,
                        year,
                        amount,
                    },
                )?;
                println!("{}", pp_id);
                Ok(())
            }
            PartPaymentCommand::Update {
                id,
                part_payment,
                month,
                year,
                amount,
            } => store.update_part_payment(
                id,
                part_payment,
                NewPartPayment {
                    month,
                    year,
                    amount,
                },
            ),
            PartPaymentCommand::Remove { id, part_payment } => {
                store.remove_part_payment(id, part_payment)
            }
        },
        Commands::Export { ids, out } => {
            let selection = (!ids.is_empty()).then_some(ids.as_slice());
            let json = store.export_projects(selection).to_json()?;
            match out {
                Some(path) => fs::write(path, json)?,
                None => println!("{}", json),
            }
            Ok(())
        }
        Commands::Import { file } => {
            let json = fs::read_to_string(file)?;
            let count = store.import_json(&json)?;
            println!("imported {} loans", count);
            Ok(())
        }
    }
}

fn find(store: &ProjectStore<FileStorage>, id: Uuid) -> LoanResult<&LoanProject> {
    store.project(id).ok_or(LoanError::ProjectNotFound(id))
}

fn show_emi(principal: f64, rate: f64, tenure: u32) -> LoanResult<()> {
    // validate through a throwaway project so the formula never sees bad input
    let probe = LoanProject::new("", principal, rate, tenure, 1, 2000);
    probe.validate()?;

    let emi = calculate_emi(principal, rate, tenure);
    let total = emi * f64::from(probe.scheduled_months());
    println!("EMI:            {}", format_currency_detailed(emi));
    println!("Total payable:  {}", format_currency(total));
    println!("Total interest: {}", format_currency(total - principal));
    Ok(())
}

fn show_savings(project: &LoanProject) {
    let savings = calculate_savings(project);
    let end = |date: Option<MonthYear>| {
        date.map_or_else(|| "-".to_string(), |d| format_month_year(d.month, d.year))
    };

    println!("{}", project.name);
    println!(
        "  without part payments: {} months, interest {}, ends {}",
        savings.original_tenure_months,
        format_currency(savings.original_total_interest),
        end(savings.original_end_date)
    );
    println!(
        "  with part payments:    {} months, interest {}, ends {}",
        savings.reduced_tenure_months,
        format_currency(savings.reduced_total_interest),
        end(savings.reduced_end_date)
    );
    println!(
        "  saved: {} interest, {} months",
        format_currency(savings.interest_saved),
        savings.months_saved
    );
}
