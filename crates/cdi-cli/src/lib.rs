//! Library components of the chart data inference command line tool.

pub mod logging;
pub mod pipeline;
