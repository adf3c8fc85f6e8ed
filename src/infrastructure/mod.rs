//! Acquisition side: motion sources, the polling loop, the motion log
//! writer and diagnostics logging.

pub mod acquisition;
pub mod logging;
pub mod motion_source;
pub mod recorder;
