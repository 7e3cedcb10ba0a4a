// Sourceable watermark compositing library

pub mod config;
pub mod geo;
pub mod logging;
pub mod timestamp;
pub mod video;
pub mod watermark;
