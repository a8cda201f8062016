pub mod channel;
pub mod report;
pub mod stat;
pub mod window;

pub use channel::ChannelAggregator;
pub use report::ReportAggregator;
pub use stat::{Channel, ChannelStat, Report};
pub use window::{TimeWindow, WindowError};
