//! Project budgets.

use rust_decimal::Decimal;

use crate::domain::{Budget, BudgetsView, ProjectId, aggregate_budgets, checked_sum};
use crate::storage::models::Dataset;

use super::Index;

fn budgets_of(data: &Dataset, project_id: ProjectId) -> Vec<Budget> {
    data.budgets
        .iter()
        .filter(|b| b.project_id == project_id)
        .map(|b| Budget {
            currency: b.currency,
            initial_amount: b.initial_amount,
            remaining_amount: b.remaining_amount,
        })
        .collect()
}

/// Budgets of a project with their USD equivalents, all read from the same
/// snapshot as the quotes.
#[must_use]
pub fn project_budgets(data: &Dataset, project_id: ProjectId) -> BudgetsView {
    let index = Index::new(data);
    aggregate_budgets(&budgets_of(data, project_id), index.quotes())
}

/// Remaining budget in USD, skipping currencies without a quote.
#[must_use]
pub fn remaining_usd_budget(index: &Index<'_>, project_id: ProjectId) -> Option<Decimal> {
    checked_sum(
        budgets_of(index.data(), project_id)
            .iter()
            .filter_map(|b| index.quotes().to_usd(b.remaining_amount, b.currency)),
    )
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::domain::Currency;
    use crate::query::fixtures::Fixture;

    #[test]
    fn unquoted_currency_is_listed_but_not_summed() {
        let mut f = Fixture::new();
        let (lead, _) = f.user("lead");
        let project = f.project("Kakarot", &[lead]);
        let other = f.project("Madara", &[lead]);
        f.quote(Currency::Eth, dec!(1500));
        f.budget(project, Currency::Eth, dec!(100), dec!(40));
        f.budget(project, Currency::Stark, dec!(5000), dec!(5000));
        f.budget(other, Currency::Usd, dec!(999), dec!(999));
        let data = f.finish();

        let view = project_budgets(&data, project);
        let currencies: Vec<Currency> = view.budgets.iter().map(|b| b.currency).collect();
        assert_eq!(currencies, vec![Currency::Usd, Currency::Eth, Currency::Stark]);
        assert_eq!(view.initial_dollars_equivalent, Some(dec!(150000)));
        assert_eq!(view.remaining_dollars_equivalent, Some(dec!(60000)));
        let stark = view.budgets.iter().find(|b| b.currency == Currency::Stark);
        assert_eq!(stark.and_then(|b| b.initial_dollars_equivalent), None);

        let index = Index::new(&data);
        assert_eq!(remaining_usd_budget(&index, project), Some(dec!(60000)));
        assert_eq!(remaining_usd_budget(&index, other), Some(dec!(999)));
    }

    #[test]
    fn project_without_budget_still_shows_usd() {
        let data = Fixture::new().finish();
        let view = project_budgets(&data, ProjectId::new());
        assert_eq!(view.budgets.len(), 1);
        assert_eq!(view.initial_dollars_equivalent, Some(Decimal::ZERO));
    }
}
