//! Notice-board page scraper.
//!
//! The board is a single HTML table: first cell holds an anchor with the
//! notice title and link, last cell holds the publish date.

use std::time::Duration;

use async_trait::async_trait;
use noticebot_core::config::ScraperConfig;
use noticebot_core::error::{NoticeBotError, Result};
use noticebot_core::traits::NoticeSource;
use noticebot_core::types::Notice;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Fetches the board page and extracts the newest rows.
pub struct NoticeBoardScraper {
    config: ScraperConfig,
    client: reqwest::Client,
}

impl NoticeBoardScraper {
    pub fn new(config: ScraperConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.page_timeout_secs))
            .build()
            .map_err(|e| NoticeBotError::Http(format!("HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    async fn fetch_page(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.config.base_url)
            .send()
            .await
            .map_err(|e| NoticeBotError::Http(format!("Fetch {} failed: {e}", self.config.base_url)))?
            .error_for_status()
            .map_err(|e| NoticeBotError::Http(format!("Notice board returned error: {e}")))?;

        response
            .text()
            .await
            .map_err(|e| NoticeBotError::Http(format!("Read notice board body: {e}")))
    }
}

#[async_trait]
impl NoticeSource for NoticeBoardScraper {
    async fn fetch_notices(&self) -> Result<Vec<Notice>> {
        tracing::info!("🌐 Fetching notice board {}", self.config.base_url);
        let html = self.fetch_page().await?;
        let notices = parse_notice_rows(
            &html,
            &self.config.base_url,
            &self.config.row_selector,
            self.config.max_rows,
        )?;
        tracing::info!("🎯 Found {} notices", notices.len());
        Ok(notices)
    }
}

/// Extract notices from the first `max_rows` rows matched by `row_selector`.
///
/// Rows without a title or link are dropped; the remaining notices keep
/// table order. Links are resolved against `base_url`.
pub fn parse_notice_rows(
    html: &str,
    base_url: &str,
    row_selector: &str,
    max_rows: usize,
) -> Result<Vec<Notice>> {
    let base = Url::parse(base_url)
        .map_err(|e| NoticeBotError::Scrape(format!("Invalid base URL {base_url}: {e}")))?;
    let rows = selector(row_selector)?;
    let cells = selector("td")?;
    let anchor = selector("a")?;

    let document = Html::parse_document(html);
    let mut notices = Vec::new();

    for row in document.select(&rows).take(max_rows) {
        let row_cells: Vec<ElementRef> = row.select(&cells).collect();
        let (Some(first), Some(last)) = (row_cells.first(), row_cells.last()) else {
            continue;
        };
        let Some(link) = first.select(&anchor).next() else {
            continue;
        };

        let title = collapsed_text(&link);
        let href = link.value().attr("href").unwrap_or_default().trim();
        if title.is_empty() || href.is_empty() {
            continue;
        }

        let url = match base.join(href) {
            Ok(u) => u.to_string(),
            Err(e) => {
                tracing::debug!("Skipping row with bad link {href:?}: {e}");
                continue;
            }
        };

        tracing::debug!("📰 {title}");
        notices.push(Notice::new(title, url, collapsed_text(last)));
    }

    Ok(notices)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| NoticeBotError::Scrape(format!("Bad selector {css:?}: {e}")))
}

fn collapsed_text(element: &ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
