// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use cofre::error::Error;
use cofre::finance::amortization::{Strategy, installment, payoff_plan, prioritize, schedule};
use cofre::models::Debt;
use common::dec;
use rust_decimal::Decimal;

fn debt(id: i64, balance: &str, rate_percent: &str, installment: &str) -> Debt {
    Debt {
        id,
        name: format!("debt {}", id),
        total_amount: dec(balance),
        current_balance: dec(balance),
        interest_rate: dec(rate_percent),
        total_installments: 24,
        installment_amount: dec(installment),
        ..Default::default()
    }
}

#[test]
fn price_installment_matches_formula() {
    let p = installment(dec("1200"), dec("0.02"), 12).unwrap();
    assert_eq!(p.round_dp(2), dec("113.47"));
}

#[test]
fn zero_rate_divides_evenly() {
    assert_eq!(installment(dec("1200"), Decimal::ZERO, 12).unwrap(), dec("100"));
}

#[test]
fn zero_term_is_rejected() {
    assert!(matches!(
        installment(dec("1200"), dec("0.02"), 0),
        Err(Error::InvalidTerm)
    ));
    assert!(installment(dec("1200"), dec("-0.01"), 12).is_err());
}

#[test]
fn schedule_first_row_and_totals() {
    let rows = schedule(dec("1200"), dec("0.02"), 12).unwrap();
    assert_eq!(rows.len(), 12);
    assert_eq!(rows[0].interest.round_dp(2), dec("24.00"));
    assert_eq!(rows[0].principal.round_dp(2), dec("89.47"));
    assert_eq!(rows[0].installment.round_dp(2), dec("113.47"));

    let last = rows.last().unwrap();
    assert_eq!(last.balance, Decimal::ZERO);
    let principal: Decimal = rows.iter().map(|r| r.principal).sum();
    assert_eq!(principal.round_dp(10), dec("1200"));
}

#[test]
fn schedule_balances_never_increase() {
    let rows = schedule(dec("5000"), dec("0.035"), 36).unwrap();
    for w in rows.windows(2) {
        assert!(w[1].balance <= w[0].balance);
        assert!(w[1].interest <= w[0].interest);
    }
    assert!(rows.iter().all(|r| r.balance >= Decimal::ZERO));
}

#[test]
fn snowball_orders_by_balance() {
    let mut debts = vec![
        debt(1, "3000", "1", "100"),
        debt(2, "500", "5", "50"),
        debt(3, "1200", "2", "80"),
    ];
    prioritize(&mut debts, Strategy::Snowball);
    let ids: Vec<i64> = debts.iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![2, 3, 1]);
    assert!(debts.windows(2).all(|w| w[0].current_balance <= w[1].current_balance));
}

#[test]
fn avalanche_orders_by_rate() {
    let mut debts = vec![
        debt(1, "3000", "1", "100"),
        debt(2, "500", "5", "50"),
        debt(3, "1200", "2", "80"),
    ];
    prioritize(&mut debts, Strategy::Avalanche);
    let ids: Vec<i64> = debts.iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![2, 3, 1]);
    assert!(debts.windows(2).all(|w| w[0].interest_rate >= w[1].interest_rate));
}

#[test]
fn ties_break_on_the_other_key_then_id() {
    let mut debts = vec![
        debt(4, "1000", "1", "10"),
        debt(2, "1000", "3", "10"),
        debt(3, "1000", "3", "10"),
    ];
    prioritize(&mut debts, Strategy::Snowball);
    let ids: Vec<i64> = debts.iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![2, 3, 4]);

    let mut debts = vec![
        debt(7, "900", "2", "10"),
        debt(5, "100", "2", "10"),
        debt(6, "100", "2", "10"),
    ];
    prioritize(&mut debts, Strategy::Avalanche);
    let ids: Vec<i64> = debts.iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![5, 6, 7]);
}

#[test]
fn strategy_parses_case_insensitively() {
    assert_eq!("Snowball".parse::<Strategy>().unwrap(), Strategy::Snowball);
    assert_eq!("avalanche".parse::<Strategy>().unwrap(), Strategy::Avalanche);
    assert!("random".parse::<Strategy>().is_err());
}

#[test]
fn payoff_plan_pays_everything_off() {
    let debts = vec![debt(1, "2000", "1", "100"), debt(2, "600", "4", "60")];
    let plan = payoff_plan(&debts, dec("400"), Strategy::Avalanche).unwrap();
    assert_eq!(plan.order.len(), 2);
    assert_eq!(plan.order[0].debt_id, 2);
    assert!(plan.months > 0);
    assert!(plan.total_interest > Decimal::ZERO);
}

#[test]
fn avalanche_never_costs_more_interest_than_snowball() {
    let debts = vec![
        debt(1, "800", "6", "40"),
        debt(2, "300", "1", "30"),
        debt(3, "1500", "3", "60"),
    ];
    let snow = payoff_plan(&debts, dec("350"), Strategy::Snowball).unwrap();
    let aval = payoff_plan(&debts, dec("350"), Strategy::Avalanche).unwrap();
    assert!(aval.total_interest <= snow.total_interest);
    assert_eq!(snow.order[0].debt_id, 2);
}

#[test]
fn payoff_plan_rejects_budget_below_installments() {
    let debts = vec![debt(1, "2000", "1", "100"), debt(2, "600", "4", "60")];
    assert!(payoff_plan(&debts, dec("120"), Strategy::Snowball).is_err());
}

#[test]
fn payoff_plan_rejects_budget_below_interest() {
    let debts = vec![debt(1, "1000", "10", "10")];
    assert!(matches!(
        payoff_plan(&debts, dec("10"), Strategy::Avalanche),
        Err(Error::InvalidAmount(_))
    ));
    assert!(payoff_plan(&debts, dec("100"), Strategy::Snowball).is_err());
    assert!(payoff_plan(&debts, dec("101"), Strategy::Snowball).is_ok());
}
