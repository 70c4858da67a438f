pub mod comment;
pub mod customer;
pub mod database;
pub mod user;

use rowstore::database::ensure_data_dir;
use rowstore::{OutputFormat, StoreConfig};
use serde::Serialize;
use tabled::Tabled;

/// Print records in the requested format
///
/// Table formats convert each record into the row type `R` first.
pub(crate) fn print_records<T, R>(records: &[T], format: OutputFormat) -> anyhow::Result<()>
where
    T: Serialize,
    R: for<'a> From<&'a T> + Tabled,
{
    if let Some(json) = format.render_json(records) {
        println!("{}", json?);
        return Ok(());
    }

    let rows: Vec<R> = records.iter().map(R::from).collect();
    if let Some(table) = format.render_table(&rows) {
        println!("{}", table);
    }
    Ok(())
}

/// Create the directory holding a file-backed database
pub(crate) fn prepare_data_dir(config: &StoreConfig) -> anyhow::Result<()> {
    match config.data_dir() {
        Some(dir) if !dir.is_empty() => ensure_data_dir(&dir),
        _ => Ok(()),
    }
}
