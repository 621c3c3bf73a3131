// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Price-table amortization and debt prioritization.

use rust_decimal::{Decimal, MathematicalOps};
use serde::Serialize;
use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::models::Debt;

/// Fixed installment for `principal` at `rate` per period over `periods`.
///
/// `P * (i * (1+i)^n) / ((1+i)^n - 1)`, or `P / n` when the rate is zero.
pub fn installment(principal: Decimal, rate: Decimal, periods: u32) -> Result<Decimal> {
    if periods == 0 {
        return Err(Error::InvalidTerm);
    }
    if rate < Decimal::ZERO {
        return Err(Error::InvalidAmount(format!("negative rate {}", rate)));
    }
    if rate.is_zero() {
        return Ok(principal / Decimal::from(periods));
    }
    let growth = (Decimal::ONE + rate)
        .checked_powu(u64::from(periods))
        .ok_or(Error::Overflow("(1+i)^n"))?;
    let numerator = principal
        .checked_mul(rate * growth)
        .ok_or(Error::Overflow("installment"))?;
    numerator
        .checked_div(growth - Decimal::ONE)
        .ok_or(Error::Overflow("installment"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleRow {
    pub number: u32,
    pub installment: Decimal,
    pub interest: Decimal,
    pub principal: Decimal,
    pub balance: Decimal,
}

/// Full amortization schedule.
///
/// The last row pays off whatever balance is left, so its balance is exactly
/// zero and the principal column sums to `principal`.
pub fn schedule(principal: Decimal, rate: Decimal, periods: u32) -> Result<Vec<ScheduleRow>> {
    let payment = installment(principal, rate, periods)?;
    let mut balance = principal;
    let mut rows = Vec::with_capacity(periods as usize);
    for number in 1..=periods {
        let interest = balance * rate;
        let (installment, amortized) = if number == periods {
            (interest + balance, balance)
        } else {
            let amortized = (payment - interest).min(balance);
            (payment, amortized)
        };
        balance = (balance - amortized).max(Decimal::ZERO);
        rows.push(ScheduleRow {
            number,
            installment,
            interest,
            principal: amortized,
            balance,
        });
    }
    Ok(rows)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Smallest balance first.
    Snowball,
    /// Highest interest rate first.
    Avalanche,
}

impl std::str::FromStr for Strategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "snowball" => Ok(Strategy::Snowball),
            "avalanche" => Ok(Strategy::Avalanche),
            other => Err(anyhow::anyhow!(
                "Unknown strategy '{}' (use snowball|avalanche)",
                other
            )),
        }
    }
}

fn compare(strategy: Strategy, a: &Debt, b: &Debt) -> Ordering {
    let primary = match strategy {
        Strategy::Snowball => a
            .current_balance
            .cmp(&b.current_balance)
            .then_with(|| b.interest_rate.cmp(&a.interest_rate)),
        Strategy::Avalanche => b
            .interest_rate
            .cmp(&a.interest_rate)
            .then_with(|| a.current_balance.cmp(&b.current_balance)),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

/// Orders debts for payoff. Ties fall back to the other key, then to id.
pub fn prioritize(debts: &mut [Debt], strategy: Strategy) {
    debts.sort_by(|a, b| compare(strategy, a, b));
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayoffEntry {
    pub debt_id: i64,
    pub name: String,
    pub paid_off_in_month: u32,
    pub interest_paid: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayoffPlan {
    pub strategy: Strategy,
    pub months: u32,
    pub total_interest: Decimal,
    pub order: Vec<PayoffEntry>,
}

const MAX_PLAN_MONTHS: u32 = 1200;

/// Simulates paying `debts` with a fixed `monthly_budget`.
///
/// Every month interest accrues on each open balance, each debt receives its
/// regular installment (capped at its balance) and whatever budget is left
/// goes to the first open debt in strategy order. Fails when the budget does
/// not cover the installments plus interest growth.
pub fn payoff_plan(debts: &[Debt], monthly_budget: Decimal, strategy: Strategy) -> Result<PayoffPlan> {
    let mut open: Vec<Debt> = debts
        .iter()
        .filter(|d| d.current_balance > Decimal::ZERO)
        .cloned()
        .collect();
    let minimum: Decimal = open
        .iter()
        .map(|d| d.installment_amount.min(d.current_balance))
        .sum();
    if monthly_budget < minimum {
        return Err(Error::InvalidAmount(format!(
            "monthly budget {} is below the sum of installments {}",
            monthly_budget,
            minimum.round_dp(2)
        )));
    }
    let first_interest = open
        .iter()
        .try_fold(Decimal::ZERO, |acc, d| {
            d.current_balance
                .checked_mul(d.monthly_rate())
                .and_then(|i| acc.checked_add(i))
        })
        .ok_or(Error::Overflow("monthly interest"))?;
    if !open.is_empty() && first_interest >= monthly_budget {
        return Err(Error::InvalidAmount(format!(
            "monthly budget {} does not cover the interest of {}",
            monthly_budget,
            first_interest.round_dp(2)
        )));
    }

    let mut interest_by_debt: Vec<Decimal> = vec![Decimal::ZERO; open.len()];
    let mut order = Vec::new();
    let mut total_interest = Decimal::ZERO;
    let mut month = 0;
    while open.iter().any(|d| d.current_balance > Decimal::ZERO) {
        month += 1;
        if month > MAX_PLAN_MONTHS {
            return Err(Error::InvalidAmount(format!(
                "budget {} never pays the debts off",
                monthly_budget
            )));
        }
        let mut budget = monthly_budget;
        for (i, d) in open.iter_mut().enumerate() {
            if d.current_balance <= Decimal::ZERO {
                continue;
            }
            let interest = d
                .current_balance
                .checked_mul(d.monthly_rate())
                .ok_or(Error::Overflow("monthly interest"))?
                .round_dp(2);
            d.current_balance = d
                .current_balance
                .checked_add(interest)
                .ok_or(Error::Overflow("debt balance"))?;
            total_interest = total_interest
                .checked_add(interest)
                .ok_or(Error::Overflow("total interest"))?;
            interest_by_debt[i] += interest;
            let pay = d.installment_amount.min(d.current_balance).min(budget);
            d.current_balance -= pay;
            budget -= pay;
        }

        let mut ranked: Vec<usize> = (0..open.len()).collect();
        ranked.sort_by(|&a, &b| compare(strategy, &open[a], &open[b]));
        for i in ranked {
            if budget <= Decimal::ZERO {
                break;
            }
            let d = &mut open[i];
            if d.current_balance <= Decimal::ZERO {
                continue;
            }
            let pay = budget.min(d.current_balance);
            d.current_balance -= pay;
            budget -= pay;
        }

        for (i, d) in open.iter().enumerate() {
            if d.current_balance <= Decimal::ZERO && !order.iter().any(|e: &PayoffEntry| e.debt_id == d.id) {
                order.push(PayoffEntry {
                    debt_id: d.id,
                    name: d.name.clone(),
                    paid_off_in_month: month,
                    interest_paid: interest_by_debt[i],
                });
            }
        }
    }

    Ok(PayoffPlan {
        strategy,
        months: month,
        total_interest,
        order,
    })
}
