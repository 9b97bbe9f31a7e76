//! CSV boundary adapters: district-period tables in, predictions and
//! station adjustments out.

pub mod export;
pub mod load;

pub use export::{export_adjustments, export_predictions, write_adjustments, write_predictions};
pub use load::{read_dataset, read_dataset_from};
