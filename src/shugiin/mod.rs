pub mod parser;
pub mod scraper;

pub use scraper::WebScraper;

pub(crate) const BASE_URL: &str = "https://www.shugiintv.go.jp/jp/";
pub(crate) const MEMBERS_URL_BASE: &str =
    "https://www.shugiin.go.jp/internet/itdb_annai.nsf/html/statics/syu/";
pub(crate) const QUESTIONS_URL_BASE: &str =
    "https://www.shugiin.go.jp/internet/itdb_shitsumon.nsf/html/shitsumon/";

/// The roster is split over one page per kana row (あ行 .. わ行).
pub(crate) const MEMBER_PAGES: u32 = 10;
