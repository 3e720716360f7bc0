//! Report formatting for the presentation layer.
//!
//! Turns snapshots, history pages, borrow lists and monthly statistics into plain text.
//! Nothing here touches the database.

use crate::{
    core::{
        account::AccountSnapshot,
        borrow::BorrowView,
        history::HistoryPage,
        ledger::{BonusReceipt, BorrowReceipt, ReturnReceipt},
        stats::MonthlyStats,
    },
    entities::credit_transaction,
};
use std::fmt::Write;

/// Share of the initial credit still available, as a percentage.
///
/// Can exceed 100 after bonuses. Returns 0 for a zero initial credit.
#[must_use]
pub fn calculate_credit_percent(current: i64, initial: i64) -> f64 {
    if initial == 0 {
        return 0.0;
    }

    // Credit values are small integers, precision loss is irrelevant for display
    #[allow(clippy::cast_precision_loss)]
    let percent = (current as f64 / initial as f64) * 100.0;
    percent
}

/// Generates a progress bar string for visual representation.
///
/// Creates a text-based progress bar like: `[████████░░] 80%`
#[must_use]
pub fn format_progress_bar(progress_percent: f64, bar_length: Option<usize>) -> String {
    let length = bar_length.unwrap_or(10);
    let clamped_progress = progress_percent.clamp(0.0, 100.0);

    // Cast safety: clamped_progress ∈ [0, 100], length is small (10-20).
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let filled = ((clamped_progress / 100.0) * length as f64).round() as usize;
    let empty = length.saturating_sub(filled);

    let filled_str = "█".repeat(filled);
    let empty_str = "░".repeat(empty);

    format!("[{filled_str}{empty_str}] {progress_percent:.1}%")
}

/// Formats a ledger amount with the sign it has on the balance, e.g. `-15` or `+5`.
#[must_use]
pub fn format_signed_amount(transaction: &credit_transaction::Model) -> String {
    if transaction.transaction_type.is_debit() {
        format!("-{}", transaction.amount)
    } else {
        format!("+{}", transaction.amount)
    }
}

/// One line summarizing a ledger entry.
#[must_use]
pub fn format_transaction_line(transaction: &credit_transaction::Model) -> String {
    let mut line = format!(
        "#{} {} | {} | {} | {:?}",
        transaction.id,
        transaction.date.format("%Y-%m-%d"),
        format_signed_amount(transaction),
        transaction.reason,
        transaction.status
    );
    if let Some(note) = &transaction.admin_note {
        let _ = write!(line, " | note: {note}");
    }
    line
}

/// Balance overview for `/credits`.
#[must_use]
pub fn format_account_summary(snapshot: &AccountSnapshot) -> String {
    let account = &snapshot.account;
    let percent = calculate_credit_percent(account.current_credit, account.initial_credit);

    let mut summary = format!(
        "**Credit balance: {} / {}**\n{}\n",
        account.current_credit,
        account.initial_credit,
        format_progress_bar(percent, None)
    );
    let _ = writeln!(
        summary,
        "Used: {} | Returned: {} | Bonus: {}",
        account.total_used, account.total_returned, account.total_bonus
    );
    let _ = write!(
        summary,
        "Pending return: {} across {} open borrow(s)",
        snapshot.pending_return, snapshot.open_borrows
    );
    summary
}

/// A page of history for `/history`.
#[must_use]
pub fn format_history_page(page: &HistoryPage) -> String {
    if page.items.is_empty() {
        return format!(
            "No transactions on page {} ({} total).",
            page.page, page.total_count
        );
    }

    let mut out = format!(
        "**History** page {}/{} ({} total)\n",
        page.page,
        page.total_pages.max(1),
        page.total_count
    );
    for transaction in &page.items {
        let _ = writeln!(out, "{}", format_transaction_line(transaction));
    }
    out
}

/// A borrow list for `/borrows`.
#[must_use]
pub fn format_borrow_list(borrows: &[BorrowView]) -> String {
    if borrows.is_empty() {
        return "No borrows found.".to_string();
    }

    let mut out = String::new();
    for view in borrows {
        let borrow = &view.borrow;
        let _ = write!(
            out,
            "#{} {} | {} credit(s) | due {} | {}",
            borrow.id,
            borrow.equipment_name,
            borrow.credit_used,
            borrow.expected_return_date.format("%Y-%m-%d"),
            view.state
        );
        if view.days_overdue > 0 {
            let _ = write!(out, " ({} day(s) overdue)", view.days_overdue);
        }
        out.push('\n');
    }
    out
}

/// Monthly statistics for `/stats`.
#[must_use]
pub fn format_monthly_stats(stats: &MonthlyStats) -> String {
    format!(
        "**{:04}-{:02}** | {} transaction(s) | deducted {} | returned {} | net {:+}",
        stats.year,
        stats.month,
        stats.transaction_count,
        stats.total_deducted,
        stats.total_returned,
        stats.total_returned - stats.total_deducted
    )
}

/// Confirmation for a new borrow.
#[must_use]
pub fn format_borrow_receipt(receipt: &BorrowReceipt) -> String {
    format!(
        "✅ Borrowed **{}** (borrow #{}) for {} credit(s), due back {}. Balance: {}",
        receipt.borrow.equipment_name,
        receipt.borrow.id,
        receipt.borrow.credit_used,
        receipt.borrow.expected_return_date.format("%Y-%m-%d"),
        receipt.account.current_credit
    )
}

/// Confirmation for a return, listing the refund and any penalty.
#[must_use]
pub fn format_return_receipt(receipt: &ReturnReceipt) -> String {
    let mut out = format!(
        "✅ Returned **{}** (borrow #{}).",
        receipt.borrow.equipment_name, receipt.borrow.id
    );
    if let Some(refund) = &receipt.refund {
        let _ = write!(out, "\nRefunded {} credit(s).", refund.amount);
    }
    if let Some(penalty) = &receipt.penalty {
        let _ = write!(
            out,
            "\n⚠️ {} day(s) late: penalty of {} credit(s).",
            receipt.days_overdue, penalty.amount
        );
    }
    let _ = write!(out, "\nBalance: {}", receipt.account.current_credit);
    out
}

/// Confirmation for a bonus award, noting when the ceiling trimmed it.
#[must_use]
pub fn format_bonus_receipt(receipt: &BonusReceipt) -> String {
    let mut out = format!("✅ Awarded {} bonus credit(s).", receipt.transaction.amount);
    if receipt.transaction.amount < receipt.requested {
        let _ = write!(out, " ({} requested, limited by the bonus ceiling)", receipt.requested);
    }
    let _ = write!(out, " Balance: {}", receipt.account.current_credit);
    out
}
