pub mod batch_orchestrator;
pub mod pagespeed_client;
pub mod report_sink;
pub mod row_loader;

pub use batch_orchestrator::*;
pub use pagespeed_client::*;
pub use report_sink::*;
pub use row_loader::*;
