pub mod bestseller;
pub mod error;
pub mod file;
pub mod parse;
pub mod source;

pub use bestseller::BestsellerSource;
pub use error::ScraperError;
pub use file::FileListingSource;
pub use parse::parse_bestseller_page;
pub use source::{fetch_raw_listings, ListingSource};
