use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{Bank, CreateAssociationCmd, Engine, Member, MoneyCents, associations, banks, members};
use migration::MigratorTrait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter,
};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "mahber_admin")]
#[command(about = "Admin utilities for Mahber (bootstrap members/associations/banks)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./mahber.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Member(MemberCmd),
    Association(AssociationCmd),
    Bank(BankCmd),
}

#[derive(Args, Debug)]
struct MemberCmd {
    #[command(subcommand)]
    command: MemberCommand,
}

#[derive(Subcommand, Debug)]
enum MemberCommand {
    Create(MemberCreateArgs),
}

#[derive(Args, Debug)]
struct MemberCreateArgs {
    /// Login identity; digits only.
    #[arg(long)]
    phone: String,
    #[arg(long)]
    full_name: String,
}

#[derive(Args, Debug)]
struct AssociationCmd {
    #[command(subcommand)]
    command: AssociationCommand,
}

#[derive(Subcommand, Debug)]
enum AssociationCommand {
    Create(AssociationCreateArgs),
}

#[derive(Args, Debug)]
struct AssociationCreateArgs {
    #[arg(long)]
    name: String,
    /// Phone of an existing member; becomes the founding committee member.
    #[arg(long)]
    creator: String,
    /// Monthly dues, e.g. "100" or "100.50".
    #[arg(long)]
    monthly_fee: String,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    meeting_place: Option<String>,
}

#[derive(Args, Debug)]
struct BankCmd {
    #[command(subcommand)]
    command: BankCommand,
}

#[derive(Subcommand, Debug)]
enum BankCommand {
    Create(BankCreateArgs),
}

#[derive(Args, Debug)]
struct BankCreateArgs {
    #[arg(long)]
    association_id: String,
    #[arg(long)]
    bank_name: String,
    #[arg(long)]
    account_name: String,
    #[arg(long)]
    account_number: String,
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

fn prompt_password_twice() -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let p1 = prompt_password("Password: ")?;
        if p1.is_empty() {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print("Password must not be empty.\r\n")
            )?;
            continue;
        }

        let p2 = prompt_password("Confirm password: ")?;
        if p1 == p2 {
            return Ok(p1);
        }

        execute!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print("Passwords do not match. Try again.\r\n")
        )?;
    }

    Err("too many attempts".into())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

async fn member_by_phone(
    db: &DatabaseConnection,
    phone: &str,
) -> Result<Option<members::Model>, Box<dyn Error + Send + Sync>> {
    let found = members::Entity::find()
        .filter(members::Column::Phone.eq(phone))
        .one(db)
        .await?;
    Ok(found)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;

    match cli.command {
        Command::Member(MemberCmd {
            command: MemberCommand::Create(args),
        }) => {
            if member_by_phone(&db, &args.phone).await?.is_some() {
                eprintln!("member already exists: {}", args.phone);
                std::process::exit(1);
            }

            let password = prompt_password_twice()?;

            let member = match Member::new(args.full_name, args.phone, password) {
                Ok(member) => member,
                Err(err) => {
                    eprintln!("{err}");
                    std::process::exit(2);
                }
            };
            members::ActiveModel::from(&member).insert(&db).await?;

            println!("created member: {} ({})", member.phone, member.id);
        }
        Command::Association(AssociationCmd {
            command: AssociationCommand::Create(args),
        }) => {
            let Some(creator) = member_by_phone(&db, &args.creator).await? else {
                eprintln!("member not found: {}", args.creator);
                std::process::exit(1);
            };
            let creator_id = Uuid::parse_str(&creator.id)?;

            let monthly_fee: MoneyCents = match args.monthly_fee.parse() {
                Ok(amount) => amount,
                Err(err) => {
                    eprintln!("{err}");
                    std::process::exit(2);
                }
            };

            let mut cmd = CreateAssociationCmd::new(args.name.clone(), creator_id, monthly_fee);
            if let Some(city) = args.city {
                cmd = cmd.city(city);
            }
            if let Some(meeting_place) = args.meeting_place {
                cmd = cmd.meeting_place(meeting_place);
            }

            let engine = Engine::builder().database(db.clone()).build().await?;
            let association = engine.create_association(cmd).await?;
            println!("created association: {} ({})", args.name, association.id);
        }
        Command::Bank(BankCmd {
            command: BankCommand::Create(args),
        }) => {
            let association_id = Uuid::parse_str(&args.association_id)?;
            if associations::Entity::find_by_id(association_id.to_string())
                .one(&db)
                .await?
                .is_none()
            {
                eprintln!("association not found: {association_id}");
                std::process::exit(1);
            }

            // Bootstrap path: inserts the row directly, so it works before
            // any committee exists to authorize it.
            let bank = Bank::new(
                association_id,
                args.bank_name,
                args.account_name,
                args.account_number,
            );
            banks::ActiveModel::from(&bank).insert(&db).await?;

            println!(
                "created bank account: {} ({})",
                bank.account_number, bank.id
            );
        }
    }

    Ok(())
}
