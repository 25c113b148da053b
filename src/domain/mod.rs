pub mod input_record;
pub mod metric_fields;
pub mod metric_record;

pub use input_record::*;
pub use metric_fields::*;
pub use metric_record::*;
