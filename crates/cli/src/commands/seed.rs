use std::path::PathBuf;

use valvey_data::write_demo_dataset;

use crate::commands::{load_config, CommandResult};

pub fn run(data_dir: Option<PathBuf>) -> CommandResult {
    let config = match load_config("seed", data_dir) {
        Ok(config) => config,
        Err(result) => return result,
    };

    match write_demo_dataset(&config.data.dir) {
        Ok(dataset) => CommandResult::success(
            "seed",
            format!(
                "demo dataset written to {}: {} price rows, {} quotes, {} orders, \
                 {} commodity months",
                config.data.dir.display(),
                dataset.price_table.len(),
                dataset.quotes.len(),
                dataset.orders.len(),
                dataset.commodities.len()
            ),
        ),
        Err(error) => CommandResult::failure("seed", "data_write", error.to_string(), 4),
    }
}
