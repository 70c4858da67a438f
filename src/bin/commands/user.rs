use clap::Subcommand;
use rowstore::database::Database;
use rowstore::{OutputFormat, User};
use serde_json::json;
use tabled::Tabled;

use super::print_records;

/// User subcommands
#[derive(Subcommand)]
pub enum UserCommands {
    /// Add a new user
    Add {
        #[clap(value_name = "USERNAME")]
        username: String,

        #[clap(value_name = "PASSWORD")]
        password: String,
    },

    /// Check a username/password pair
    Login {
        #[clap(value_name = "USERNAME")]
        username: String,

        #[clap(value_name = "PASSWORD")]
        password: String,
    },

    /// List user names
    List,
}

#[derive(Tabled)]
struct UserRow {
    username: String,
}

impl From<&String> for UserRow {
    fn from(username: &String) -> Self {
        UserRow {
            username: username.clone(),
        }
    }
}

pub fn run(db: &Database, command: UserCommands, format: OutputFormat) -> anyhow::Result<()> {
    let users = db.users();

    match command {
        UserCommands::Add { username, password } => {
            let id = users.insert(&User { username, password })?;
            if format.is_json() {
                println!("{}", json!({ "inserted": id }));
            } else {
                println!("Inserted user {}", id);
            }
            Ok(())
        }
        UserCommands::Login { username, password } => {
            let matched = users.authenticate(&username, &password)?;
            if format.is_json() {
                println!("{}", json!({ "username": username, "success": matched.is_some() }));
            } else if let Some(name) = matched {
                println!("Login succeeded: {}", name);
            } else {
                println!("Login failed");
            }
            Ok(())
        }
        UserCommands::List => {
            // passwords are never printed
            let names: Vec<String> = users
                .list_all()?
                .into_iter()
                .map(|u| u.username)
                .collect();
            print_records::<_, UserRow>(&names, format)
        }
    }
}
