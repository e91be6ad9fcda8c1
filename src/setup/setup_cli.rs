use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use rand::RngCore;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;
use supplychain_backend::config::Config;
use supplychain_backend::helper::sanitization_helpers::slugify;
use supplychain_backend::models::db_operations::{
    calendar_db_operations, content_db_operations, councils_db_operations, projects_db_operations,
};
use supplychain_backend::models::NewMeeting;
use supplychain_backend::setup::db_setup;
use validator::ValidateEmail;

#[derive(Parser, Debug)]
#[command(name = "setup_cli", author, version, about = "Setup and data administration for the supply chain site.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the .env configuration file. Required by every command except `secret generate`.
    #[arg(long, global = true, value_name = "FILE")]
    env_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
    Council {
        #[command(subcommand)]
        action: CouncilAction,
    },
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },
    Meeting {
        #[command(subcommand)]
        action: MeetingAction,
    },
    News {
        #[command(subcommand)]
        action: NewsAction,
    },
    Community {
        #[command(subcommand)]
        action: CommunityAction,
    },
    Requirement {
        #[command(subcommand)]
        action: RequirementAction,
    },
    Secret {
        #[command(subcommand)]
        action: SecretAction,
    },
}

#[derive(Subcommand, Debug)]
enum DbAction {
    Setup,
}

#[derive(Subcommand, Debug)]
enum CouncilAction {
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        contact: String,
        #[arg(long)]
        email: String,
        /// Defaults to a slug derived from the name.
        #[arg(long)]
        slug: Option<String>,
    },
    List,
    /// Deletes the council together with all of its projects.
    Delete {
        #[arg(long)]
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum CategoryAction {
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    List,
    Delete {
        #[arg(long)]
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum MeetingAction {
    Create {
        /// Meeting date, YYYY-MM-DD.
        #[arg(long)]
        date: NaiveDate,
        /// Start time, HH:MM.
        #[arg(long, value_parser = parse_time)]
        time: Option<NaiveTime>,
        #[arg(long, default_value = "")]
        location: String,
        #[arg(long, default_value = "")]
        agenda: String,
        #[arg(long)]
        council_id: Option<i64>,
    },
    Archive {
        #[arg(long)]
        id: i64,
        /// Put an archived meeting back on the calendar.
        #[arg(long)]
        undo: bool,
    },
    List,
}

#[derive(Subcommand, Debug)]
enum NewsAction {
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        summary: String,
    },
}

#[derive(Subcommand, Debug)]
enum CommunityAction {
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        link: String,
    },
}

#[derive(Subcommand, Debug)]
enum RequirementAction {
    Add {
        #[arg(long)]
        project_id: i64,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
}

#[derive(Subcommand, Debug)]
enum SecretAction {
    /// Prints a random SESSION_SECRET_KEY value.
    Generate,
}

fn parse_time(raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| format!("'{}' is not a valid time, expected HH:MM", raw))
}

fn main() {
    let cli = Cli::parse();

    if let Commands::Secret { action: SecretAction::Generate } = &cli.command {
        generate_secret();
        return;
    }

    let env_file = match &cli.env_file {
        Some(path) => path,
        None => {
            eprintln!("❌ Error: --env-file <FILE> is required for this command.");
            std::process::exit(2);
        }
    };
    let config = Config::from_env(env_file)
        .expect("FATAL: Failed to load or parse configuration.");

    if let Commands::Db { action: DbAction::Setup } = &cli.command {
        setup_database(&config);
        return;
    }

    let conn = match open_database(&config) {
        Some(conn) => conn,
        None => std::process::exit(1),
    };

    match &cli.command {
        Commands::Council { action } => match action {
            CouncilAction::Create { name, contact, email, slug } => create_council(&conn, name, contact, email, slug.as_deref()),
            CouncilAction::List => list_councils(&conn),
            CouncilAction::Delete { id } => report_delete(councils_db_operations::delete_council(&conn, *id), "Council", *id),
        },
        Commands::Category { action } => match action {
            CategoryAction::Create { name, description } => match councils_db_operations::create_category(&conn, name, description) {
                Ok(id) => println!("✅ Category '{}' created with id {}.", name, id),
                Err(e) => eprintln!("❌ Error creating category: {}", e),
            },
            CategoryAction::List => list_categories(&conn),
            CategoryAction::Delete { id } => report_delete(councils_db_operations::delete_category(&conn, *id), "Category", *id),
        },
        Commands::Meeting { action } => match action {
            MeetingAction::Create { date, time, location, agenda, council_id } => {
                let new = NewMeeting {
                    council_id: *council_id,
                    date: *date,
                    time: *time,
                    location: location.clone(),
                    agenda: agenda.clone(),
                };
                match calendar_db_operations::create_meeting(&conn, &new) {
                    Ok(id) => println!("✅ Meeting on {} created with id {}.", date, id),
                    Err(e) => eprintln!("❌ Error creating meeting: {}. Check that the council id exists.", e),
                }
            }
            MeetingAction::Archive { id, undo } => match calendar_db_operations::set_meeting_archived(&conn, *id, !*undo) {
                Ok(0) => eprintln!("❌ Error: No meeting with id {}.", id),
                Ok(_) if *undo => println!("✅ Meeting {} restored to the calendar.", id),
                Ok(_) => println!("✅ Meeting {} archived.", id),
                Err(e) => eprintln!("❌ Error updating meeting: {}", e),
            },
            MeetingAction::List => list_meetings(&conn),
        },
        Commands::News { action: NewsAction::Create { title, summary } } => {
            match content_db_operations::create_news(&conn, title, summary) {
                Ok(id) => println!("✅ News item '{}' created with id {}.", title, id),
                Err(e) => eprintln!("❌ Error creating news item: {}", e),
            }
        }
        Commands::Community { action: CommunityAction::Create { title, link } } => {
            match content_db_operations::create_community_link(&conn, title, link) {
                Ok(id) => println!("✅ Community link '{}' created with id {}.", title, id),
                Err(e) => eprintln!("❌ Error creating community link: {}", e),
            }
        }
        Commands::Requirement { action: RequirementAction::Add { project_id, name, notes } } => {
            match projects_db_operations::create_requirement(&conn, *project_id, name, notes) {
                Ok(id) => println!("✅ Requirement '{}' added to project {} (id {}).", name, project_id, id),
                Err(e) => eprintln!("❌ Error adding requirement: {}. Check that the project id exists.", e),
            }
        }
        Commands::Db { .. } | Commands::Secret { .. } => {}
    }
}

fn generate_secret() {
    let mut key = [0u8; 64];
    rand::thread_rng().fill_bytes(&mut key);
    println!("SESSION_SECRET_KEY={}", hex::encode(key));
}

fn setup_database(config: &Config) {
    let db_path = config.db_file_path();
    println!("\nSetting up supply chain database at '{}'...", db_path.display());

    if let Some(parent_dir) = db_path.parent() {
        fs::create_dir_all(parent_dir).expect("Could not create database directory.");
    }

    let mut conn = Connection::open(&db_path).expect("Could not create database file.");
    match db_setup::setup_supplychain_db(&mut conn, true) {
        Ok(_) => println!("✅ Database setup completed successfully."),
        Err(e) => eprintln!("❌ Error setting up database: {}", e),
    }
}

fn open_database(config: &Config) -> Option<Connection> {
    let db_path = config.db_file_path();
    if !db_path.exists() {
        eprintln!("❌ Error: Database not found at '{}'. Please run `setup_cli db setup` first.", db_path.display());
        return None;
    }
    let conn = match Connection::open(&db_path) {
        Ok(conn) => conn,
        Err(e) => {
            eprintln!("❌ Error opening database: {}", e);
            return None;
        }
    };
    // Deleting a council or category relies on the cascade rules.
    if let Err(e) = conn.pragma_update(None, "foreign_keys", true) {
        eprintln!("❌ Error enabling foreign keys: {}", e);
        return None;
    }
    Some(conn)
}

fn report_delete(result: rusqlite::Result<usize>, kind: &str, id: i64) {
    match result {
        Ok(0) => eprintln!("❌ Error: No {} with id {}.", kind.to_lowercase(), id),
        Ok(_) => println!("✅ {} {} deleted.", kind, id),
        Err(e) => eprintln!("❌ Error deleting {}: {}", kind.to_lowercase(), e),
    }
}

fn create_council(conn: &Connection, name: &str, contact: &str, email: &str, slug: Option<&str>) {
    if !email.validate_email() {
        eprintln!("❌ Error: '{}' is not a valid email address.", email);
        return;
    }
    let slug = slug.map(str::to_string).unwrap_or_else(|| slugify(name));
    if slug.is_empty() {
        eprintln!("❌ Error: Could not derive a slug from '{}'. Pass --slug.", name);
        return;
    }
    match councils_db_operations::create_council(conn, name, contact, email, &slug) {
        Ok(id) => println!("✅ Council '{}' created with id {} (slug '{}').", name, id, slug),
        Err(e) => eprintln!("❌ Error creating council: {}", e),
    }
}

fn list_councils(conn: &Connection) {
    match councils_db_operations::read_all_councils(conn) {
        Ok(councils) => {
            println!("Listing Councils:");
            for council in councils {
                println!("- [{}] {} ({}) <{}>", council.id, council.name, council.slug, council.contact_email);
            }
        }
        Err(e) => eprintln!("❌ Error fetching councils: {}", e),
    }
}

fn list_categories(conn: &Connection) {
    match councils_db_operations::read_all_categories(conn) {
        Ok(categories) => {
            println!("Listing Categories:");
            for category in categories {
                println!("- [{}] {}", category.id, category.name);
            }
        }
        Err(e) => eprintln!("❌ Error fetching categories: {}", e),
    }
}

fn list_meetings(conn: &Connection) {
    match calendar_db_operations::read_all_meetings(conn) {
        Ok(meetings) => {
            println!("Listing Council Meetings:");
            for m in meetings {
                let time = m.time.map(|t| t.format("%H:%M").to_string()).unwrap_or_else(|| "--:--".to_string());
                let council = m.council_name.as_deref().unwrap_or("No council");
                let archived = if m.archived { " (archived)" } else { "" };
                println!("- [{}] {} {} {}{}", m.id, m.date, time, council, archived);
            }
        }
        Err(e) => eprintln!("❌ Error fetching meetings: {}", e),
    }
}
