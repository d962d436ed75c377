//! # NoticeBot Scraper
//!
//! Pulls the notice table off the board page and turns each row into a
//! `Notice`. Date text stays raw on the notice; `date::parse_notice_date`
//! normalizes it when the engine groups notices by day.

pub mod board;
pub mod date;

pub use board::{NoticeBoardScraper, parse_notice_rows};
pub use date::parse_notice_date;
