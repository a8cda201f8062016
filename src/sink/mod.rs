pub mod chat;
pub mod sheet;
pub mod traits;

pub use chat::ChatSink;
pub use sheet::{PivotTable, SheetSink};
pub use traits::{ReportSink, SinkError};
