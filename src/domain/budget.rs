//! Project budgets and their USD aggregation.

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use super::currency::{Currency, Quotes, checked_sum};

/// Funds allocated to a project in one currency.
#[derive(Debug, Clone, PartialEq)]
pub struct Budget {
    /// Budget currency.
    pub currency: Currency,
    /// Amount allocated.
    pub initial_amount: Decimal,
    /// Amount not yet spent.
    pub remaining_amount: Decimal,
}

/// One currency line of a budget view.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BudgetView {
    /// Budget currency.
    pub currency: Currency,
    /// Amount allocated.
    pub initial_amount: Decimal,
    /// Amount not yet spent.
    pub remaining: Decimal,
    /// USD value of the allocation, `None` without a quote.
    pub initial_dollars_equivalent: Option<Decimal>,
    /// USD value of what remains, `None` without a quote.
    pub remaining_dollars_equivalent: Option<Decimal>,
}

/// All budgets of a project with USD totals.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BudgetsView {
    /// Sum of the known initial USD equivalents, `None` on overflow.
    pub initial_dollars_equivalent: Option<Decimal>,
    /// Sum of the known remaining USD equivalents, `None` on overflow.
    pub remaining_dollars_equivalent: Option<Decimal>,
    /// Per-currency lines, in discovery order.
    pub budgets: Vec<BudgetView>,
}

/// Aggregates raw budgets into a [`BudgetsView`].
///
/// Budgets sharing a currency are merged into the line of the first one
/// seen. A zero USD line is prepended when the project never allocated USD.
/// Currencies without a quote stay listed with `None` equivalents and are
/// left out of the totals. Merged amounts saturate at [`Decimal::MAX`].
/// A total that leaves the [`Decimal`] range is `None`.
#[must_use]
pub fn aggregate_budgets(budgets: &[Budget], quotes: &Quotes) -> BudgetsView {
    let mut merged: Vec<Budget> = Vec::with_capacity(budgets.len() + 1);
    if !budgets.iter().any(|b| b.currency == Currency::Usd) {
        merged.push(Budget {
            currency: Currency::Usd,
            initial_amount: Decimal::ZERO,
            remaining_amount: Decimal::ZERO,
        });
    }
    for budget in budgets {
        match merged.iter_mut().find(|b| b.currency == budget.currency) {
            Some(existing) => {
                existing.initial_amount =
                    existing.initial_amount.saturating_add(budget.initial_amount);
                existing.remaining_amount = existing
                    .remaining_amount
                    .saturating_add(budget.remaining_amount);
            }
            None => merged.push(budget.clone()),
        }
    }

    let lines: Vec<BudgetView> = merged
        .into_iter()
        .map(|b| BudgetView {
            currency: b.currency,
            initial_dollars_equivalent: quotes.to_usd(b.initial_amount, b.currency),
            remaining_dollars_equivalent: quotes.to_usd(b.remaining_amount, b.currency),
            initial_amount: b.initial_amount,
            remaining: b.remaining_amount,
        })
        .collect();

    BudgetsView {
        initial_dollars_equivalent: checked_sum(
            lines.iter().filter_map(|l| l.initial_dollars_equivalent),
        ),
        remaining_dollars_equivalent: checked_sum(
            lines.iter().filter_map(|l| l.remaining_dollars_equivalent),
        ),
        budgets: lines,
    }
}
