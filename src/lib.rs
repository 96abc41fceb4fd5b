pub mod attributes;
pub mod config;
pub mod duration;
pub mod harvest;
pub mod parser;
pub mod report;
pub mod rows;
pub mod sangiin;
pub mod scraper;
pub mod shugiin;
pub mod types;

pub use config::Config;
pub use harvest::Harvest;
pub use parser::{Layout, ParseError};
pub use scraper::ScraperError;
