use std::collections::BTreeMap;

use chrono::Utc;

use crate::bot::error::TransportError;
use crate::bot::geocode::Geocoder;
use crate::bot::message::Message;
use crate::bot::transport::{search_query, Category, FetchRequest, Transport};
use crate::bot::watermark::Watermarks;
use crate::catalog::SatelliteCatalog;
use crate::parser::{parse_mention, NameMatcher};
use crate::response::{ResponseAssembler, ResponseContext};
use crate::track::PropagationPort;

/// API calls charged for fetching one category.
const FETCH_COST: u32 = 1;

#[derive(Debug, Clone)]
pub struct BotSettings {
    /// The bot's own handle, without `@`.
    pub account: String,
    pub search_quota: u32,
    pub search_terms: Vec<String>,
    /// Record replies without posting them.
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedReply {
    pub category: Category,
    pub in_reply_to: u64,
    pub author: String,
    pub text: String,
}

/// What one category step consumed and how far it got.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryOutcome {
    pub consumed: u32,
    /// Id of the last message handled; `None` leaves the stored watermark.
    pub watermark: Option<u64>,
    pub replies: Vec<RecordedReply>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub outcomes: BTreeMap<Category, CategoryOutcome>,
}

impl RunReport {
    pub fn consumed(&self) -> u32 {
        self.outcomes.values().map(|o| o.consumed).sum()
    }

    #[cfg(test)]
    pub fn outcome(&self, category: Category) -> Option<&CategoryOutcome> {
        self.outcomes.get(&category)
    }

    pub fn replies(&self) -> impl Iterator<Item = &RecordedReply> {
        self.outcomes.values().flat_map(|o| o.replies.iter())
    }
}

/// One pass over mentions, searches and direct messages.
pub struct Orchestrator<'a, T, G, P> {
    catalog: &'a SatelliteCatalog,
    transport: T,
    geocoder: G,
    assembler: ResponseAssembler<P>,
    settings: BotSettings,
    catalog_matcher: NameMatcher,
    search_matcher: NameMatcher,
    clock: Box<dyn Fn() -> i64>,
}

impl<'a, T, G, P> Orchestrator<'a, T, G, P>
where
    T: Transport,
    G: Geocoder,
    P: PropagationPort,
{
    pub fn new(
        catalog: &'a SatelliteCatalog,
        transport: T,
        geocoder: G,
        assembler: ResponseAssembler<P>,
        settings: BotSettings,
    ) -> Self {
        let catalog_matcher = NameMatcher::new(catalog.entries());
        let search_matcher = NameMatcher::new(settings.search_terms.iter().map(String::as_str));
        log::debug!(
            "Matching {} catalog names, {} search terms",
            catalog_matcher.len(),
            search_matcher.len()
        );
        Self {
            catalog,
            transport,
            geocoder,
            assembler,
            settings,
            catalog_matcher,
            search_matcher,
            clock: Box::new(|| Utc::now().timestamp()),
        }
    }

    /// Replace the wall clock used for response times.
    #[cfg(test)]
    pub fn with_clock(mut self, clock: impl Fn() -> i64 + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Serve every category in priority order. Each category gets what the
    /// earlier ones left of `available`.
    pub fn run(&mut self, available: u32, watermarks: &Watermarks) -> RunReport {
        let mut report = RunReport::default();
        let mut remaining = available;

        for category in Category::ORDER {
            let allowance = match category {
                Category::Searches => remaining.min(self.settings.search_quota),
                _ => remaining,
            };

            let since = watermarks.get(category);
            let mut outcome = CategoryOutcome::default();
            if let Err(e) = self.process(category, allowance, since, &mut outcome) {
                // Calls made before the failure still count; the watermark stays put.
                log::error!("Processing {} failed: {}", category, e);
                outcome.watermark = None;
            }

            log::info!(
                "{}: {} calls, {} replies",
                category,
                outcome.consumed,
                outcome.replies.len()
            );
            remaining = remaining.saturating_sub(outcome.consumed);
            report.outcomes.insert(category, outcome);
        }

        report
    }

    /// Fill `outcome` as messages are handled, so a transport error part-way
    /// through leaves it holding the calls already spent.
    fn process(
        &mut self,
        category: Category,
        allowance: u32,
        since: Option<u64>,
        outcome: &mut CategoryOutcome,
    ) -> Result<(), TransportError> {
        if allowance == 0 {
            log::warn!("Skipping {}: rate limit", category);
            return Ok(());
        }

        let query = match category {
            Category::Searches if self.settings.search_terms.is_empty() => {
                log::debug!("No search terms configured");
                return Ok(());
            }
            Category::Searches => Some(search_query(&self.settings.search_terms)),
            _ => None,
        };

        let messages = self.transport.fetch(&FetchRequest {
            category,
            since,
            query: query.as_deref(),
        })?;
        outcome.consumed += FETCH_COST;
        log::debug!("Fetched {} {}", messages.len(), category);

        for message in &messages {
            if !self.accepts(category, message) {
                outcome.watermark = Some(message.id);
                continue;
            }

            let matcher = match category {
                Category::Searches => &self.search_matcher,
                _ => &self.catalog_matcher,
            };
            let Some(mention) = parse_mention(message, matcher, &self.geocoder)? else {
                outcome.watermark = Some(message.id);
                continue;
            };

            if !self.settings.dry_run && outcome.consumed + 1 >= allowance {
                log::warn!(
                    "Not responding to {} {} or later: rate limit",
                    category,
                    message.id
                );
                break;
            }

            let Some(elements) = self.catalog.resolve(&mention.satellite) else {
                log::warn!("No elements for {}", mention.satellite);
                outcome.watermark = Some(message.id);
                continue;
            };

            let ctx = ResponseContext {
                satellite: &mention.satellite,
                elements,
                author: &message.author,
                message_id: message.id,
                mention_time: mention.timestamp,
                response_time: (self.clock)(),
                explicit_time: mention.explicit_time,
                observer: mention.observer.as_ref(),
            };
            let response = match self.assembler.assemble(&ctx) {
                Ok(response) => response,
                Err(e) => {
                    log::error!("Cannot respond to {} {}: {}", category, message.id, e);
                    outcome.watermark = Some(message.id);
                    continue;
                }
            };

            let text = format!("@{} {}", message.author, response.text);
            if self.settings.dry_run {
                log::info!("[dry run] {}", text);
            } else {
                self.transport.post(&text, message)?;
                outcome.consumed += 1;
                log::info!("Replied to {} {}", category, message.id);
            }

            outcome.watermark = Some(message.id);
            outcome.replies.push(RecordedReply {
                category,
                in_reply_to: message.id,
                author: message.author.clone(),
                text,
            });
        }

        Ok(())
    }

    fn accepts(&self, category: Category, message: &Message) -> bool {
        let account = &self.settings.account;
        if message.author.eq_ignore_ascii_case(account) {
            return false;
        }

        let handle = format!("@{}", account.to_lowercase());
        let text = message.text.to_lowercase();
        match category {
            Category::Mentions => text.starts_with(&handle),
            Category::Searches => !text.contains(&handle),
            Category::DirectMessages => true,
        }
    }
}
