//! Autocomplete handlers for Discord slash command parameters.
//!
//! This module suggests catalog equipment, history filters, borrow status filters and
//! the caller's open borrows as the user types.

use crate::{
    bot::BotData,
    core::borrow::get_open_borrows,
    entities::TransactionType,
    errors::Error,
};
use poise::serenity_prelude::AutocompleteChoice;

/// Discord shows at most this many suggestions.
const MAX_CHOICES: usize = 25;

const BORROW_FILTERS: [&str; 5] = ["all", "borrowed", "overdue", "returned", "returned_late"];

/// Options from `options` containing `partial`, ignoring case.
fn matching_options<'a>(options: impl IntoIterator<Item = &'a str>, partial: &str) -> Vec<String> {
    let partial_lower = partial.to_lowercase();
    options
        .into_iter()
        .filter(|option| option.to_lowercase().contains(&partial_lower))
        .map(ToString::to_string)
        .take(MAX_CHOICES)
        .collect()
}

/// Provides autocomplete suggestions for the `/history` type filter.
pub async fn autocomplete_history_filter(
    _ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let options = std::iter::once("all").chain(TransactionType::ALL.iter().map(|t| t.as_str()));
    matching_options(options, partial)
}

/// Provides autocomplete suggestions for the `/borrows` status filter.
pub async fn autocomplete_borrow_filter(
    _ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    matching_options(BORROW_FILTERS, partial)
}

/// Provides catalog equipment, labelled with its credit cost.
pub async fn autocomplete_equipment(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<AutocompleteChoice> {
    ctx.data()
        .catalog
        .matching(partial)
        .take(MAX_CHOICES)
        .map(|item| {
            AutocompleteChoice::new(
                format!("{} ({} credits)", item.name, item.cost),
                item.name.clone(),
            )
        })
        .collect()
}

/// Provides the caller's open borrows, labelled with equipment name and due date.
///
/// Matches on either the borrow ID or the equipment name.
pub async fn autocomplete_open_borrow(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<AutocompleteChoice> {
    let ledger = &ctx.data().ledger;
    let Ok(account) = ledger.account_for_user(&ctx.author().id.to_string()).await else {
        return Vec::new();
    };
    let Ok(borrows) = get_open_borrows(ledger.database(), account.id).await else {
        return Vec::new();
    };

    let partial_lower = partial.to_lowercase();
    borrows
        .into_iter()
        .filter(|b| {
            b.id.to_string().starts_with(partial.trim())
                || b.equipment_name.to_lowercase().contains(&partial_lower)
        })
        .take(MAX_CHOICES)
        .map(|b| {
            let label = format!(
                "#{} {} (due {})",
                b.id,
                b.equipment_name,
                b.expected_return_date.format("%Y-%m-%d")
            );
            AutocompleteChoice::new(label, b.id)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_options_is_case_insensitive() {
        assert_eq!(
            matching_options(BORROW_FILTERS, "RETURN"),
            vec!["returned".to_string(), "returned_late".to_string()]
        );
    }

    #[test]
    fn test_matching_options_empty_partial_lists_everything() {
        assert_eq!(matching_options(BORROW_FILTERS, "").len(), BORROW_FILTERS.len());
        assert!(matching_options(BORROW_FILTERS, "lost").is_empty());
    }
}
