pub mod parser;
pub mod scraper;

pub use scraper::WebScraper;

pub(crate) const DETAIL_URL_BASE: &str = "https://www.webtv.sangiin.go.jp/webtv/detail.php?sid=";
pub(crate) const KOUSEI_URL_BASE: &str = "https://www.sangiin.go.jp/japanese/joho1/kousei/";
