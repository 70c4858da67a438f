use chrono::{NaiveDate, Utc};
use clap::{Args, Subcommand};
use rowstore::database::Database;
use rowstore::output::display_optional;
use rowstore::{Customer, OutputFormat};
use tabled::Tabled;

use super::print_records;

/// Arguments for adding a customer
#[derive(Args, Debug)]
pub struct CustomerAddArgs {
    /// Unique customer identifier
    #[clap(long)]
    pub id: String,

    /// Customer name
    #[clap(long)]
    pub name: String,

    /// Email address
    #[clap(long)]
    pub email: Option<String>,

    /// Account balance
    #[clap(long, default_value_t = 0)]
    pub balance: i32,

    /// Rating score
    #[clap(long, default_value_t = 0.0)]
    pub rating: f64,

    /// Birth date, formatted as YYYY-MM-DD
    #[clap(long)]
    pub birth_date: Option<NaiveDate>,

    /// Mark the customer as married
    #[clap(long)]
    pub married: bool,
}

/// Customer subcommands
#[derive(Subcommand)]
pub enum CustomerCommands {
    /// Add a new customer
    Add(CustomerAddArgs),

    /// Show one customer by identifier
    Get {
        #[clap(value_name = "ID")]
        id: String,
    },

    /// List customers in table order
    List {
        /// Stop after this many rows
        #[clap(short, long)]
        limit: Option<usize>,
    },

    /// Delete a customer by identifier
    Delete {
        #[clap(value_name = "ID")]
        id: String,
    },
}

#[derive(Tabled)]
struct CustomerRow {
    id: String,
    name: String,
    email: String,
    balance: i32,
    rating: f64,
    created_at: String,
    birth_date: String,
    married: bool,
}

impl From<&Customer> for CustomerRow {
    fn from(c: &Customer) -> Self {
        CustomerRow {
            id: c.id.clone(),
            name: c.name.clone(),
            email: display_optional(&c.email),
            balance: c.balance,
            rating: c.rating,
            created_at: c.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            birth_date: display_optional(&c.birth_date),
            married: c.married,
        }
    }
}

pub fn run(db: &Database, command: CustomerCommands, format: OutputFormat) -> anyhow::Result<()> {
    let customers = db.customers();

    match command {
        CustomerCommands::Add(args) => {
            let customer = Customer {
                id: args.id,
                name: args.name,
                email: args.email,
                balance: args.balance,
                rating: args.rating,
                created_at: Utc::now(),
                birth_date: args.birth_date,
                married: args.married,
            };
            let id = customers.insert(&customer)?;
            if !format.is_json() {
                println!("Inserted customer {}", id);
            }
            print_records::<_, CustomerRow>(&[customer], format)
        }
        CustomerCommands::Get { id } => {
            let customer = customers.find_by_id(id.as_str())?;
            print_records::<_, CustomerRow>(&[customer], format)
        }
        CustomerCommands::List { limit } => {
            let list: Vec<Customer> = customers.find_all(|records| match limit {
                Some(n) => records.take(n).collect(),
                None => records.collect(),
            })?;
            print_records::<_, CustomerRow>(&list, format)
        }
        CustomerCommands::Delete { id } => {
            customers.delete(id.as_str())?;
            if !format.is_json() {
                println!("Deleted customer {}", id);
            }
            Ok(())
        }
    }
}
