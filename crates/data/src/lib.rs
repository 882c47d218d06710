pub mod fixtures;
pub mod loader;
mod records;

pub use fixtures::{write_demo_dataset, DemoDataset};
pub use loader::{load_tables, Dataset, LoadError, LoadIssue, LoadReport};
