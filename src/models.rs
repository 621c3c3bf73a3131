// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::store::{Entity, Resource};

/// Snake-case string enums shared by rows and CLI arguments.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? } default $default:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = anyhow::Error;

            fn from_str(s: &str) -> anyhow::Result<Self> {
                let wanted = s.trim().to_lowercase().replace('-', "_");
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| {
                        let options: Vec<&str> = $name::ALL.iter().map(|v| v.as_str()).collect();
                        anyhow::anyhow!("Invalid value '{}', expected one of: {}", s, options.join("|"))
                    })
            }
        }
    };
}

string_enum!(AccountKind {
    Checking => "checking",
    Savings => "savings",
    CreditCard => "credit_card",
    Cash => "cash",
    Investment => "investment",
} default Checking);

string_enum!(CategoryKind {
    Income => "income",
    Expense => "expense",
} default Expense);

string_enum!(TransactionKind {
    Income => "income",
    Expense => "expense",
    Transfer => "transfer",
} default Expense);

string_enum!(
    /// How often a recurring transaction repeats.
    Frequency {
        Daily => "daily",
        Weekly => "weekly",
        Biweekly => "biweekly",
        Monthly => "monthly",
        Yearly => "yearly",
    } default Monthly
);

string_enum!(DebtStatus {
    Active => "active",
    Paid => "paid",
} default Active);

string_enum!(InvestmentTxKind {
    Buy => "buy",
    Sell => "sell",
    Dividend => "dividend",
} default Buy);

string_enum!(CardBillStatus {
    Open => "open",
    Closed => "closed",
    Paid => "paid",
} default Open);

string_enum!(NotificationKind {
    BillDue => "bill_due",
    CardBillDue => "card_bill_due",
    BudgetExceeded => "budget_exceeded",
    GoalReached => "goal_reached",
} default BillDue);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub kind: AccountKind,
    pub currency: String,
    pub initial_balance: Decimal,
    pub credit_limit: Option<Decimal>,
    pub closing_day: Option<u32>,
    pub due_day: Option<u32>,
    pub is_archived: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub kind: CategoryKind,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: String,
    pub account_id: i64,
    pub destination_account_id: Option<i64>,
    pub category_id: Option<i64>,
    pub kind: TransactionKind,
    /// Always positive; `kind` carries the direction.
    pub amount: Decimal,
    pub description: String,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub is_paid: bool,
    pub recurring_id: Option<i64>,
    pub installment_id: Option<i64>,
    pub installment_number: Option<u32>,
}

impl Transaction {
    /// Effect of this transaction on the balance of `account_id`.
    pub fn balance_effect(&self, account_id: i64) -> Decimal {
        match self.kind {
            TransactionKind::Income if self.account_id == account_id => self.amount,
            TransactionKind::Expense if self.account_id == account_id => -self.amount,
            TransactionKind::Transfer if self.account_id == account_id => -self.amount,
            TransactionKind::Transfer if self.destination_account_id == Some(account_id) => {
                self.amount
            }
            _ => Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub deadline: Option<NaiveDate>,
    pub is_completed: bool,
}

impl Goal {
    /// Percentage of the target reached, capped at 100.
    pub fn progress(&self) -> Decimal {
        if self.target_amount <= Decimal::ZERO {
            return Decimal::ONE_HUNDRED;
        }
        (self.current_amount / self.target_amount * Decimal::ONE_HUNDRED)
            .min(Decimal::ONE_HUNDRED)
            .round_dp(2)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub id: i64,
    pub user_id: String,
    pub description: String,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub is_paid: bool,
    pub paid_date: Option<NaiveDate>,
    pub category_id: Option<i64>,
    pub account_id: Option<i64>,
    pub barcode: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Debt {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub creditor: Option<String>,
    pub total_amount: Decimal,
    pub current_balance: Decimal,
    /// Monthly interest rate in percent (2.5 means 2.5% a month).
    pub interest_rate: Decimal,
    pub total_installments: u32,
    pub paid_installments: u32,
    pub installment_amount: Decimal,
    pub start_date: NaiveDate,
    pub status: DebtStatus,
}

impl Debt {
    pub fn monthly_rate(&self) -> Decimal {
        self.interest_rate / Decimal::ONE_HUNDRED
    }

    pub fn remaining_installments(&self) -> u32 {
        self.total_installments.saturating_sub(self.paid_installments)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebtPayment {
    pub id: i64,
    pub user_id: String,
    pub debt_id: i64,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub is_extra: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub ticker: Option<String>,
    pub kind: String,
    pub quantity: Decimal,
    pub average_price: Decimal,
    pub current_price: Decimal,
}

impl Investment {
    pub fn cost_basis(&self) -> Decimal {
        self.quantity * self.average_price
    }

    pub fn market_value(&self) -> Decimal {
        self.quantity * self.current_price
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvestmentTransaction {
    pub id: i64,
    pub user_id: String,
    pub investment_id: i64,
    pub kind: InvestmentTxKind,
    pub quantity: Decimal,
    pub price: Decimal,
    pub fees: Decimal,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecurringTransaction {
    pub id: i64,
    pub user_id: String,
    pub account_id: i64,
    pub category_id: Option<i64>,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub description: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub next_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    pub auto_create: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBudget {
    pub id: i64,
    pub user_id: String,
    pub category_id: i64,
    pub month: String, // YYYY-MM
    pub amount: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreditCardBill {
    pub id: i64,
    pub user_id: String,
    pub account_id: i64,
    pub reference_month: String, // YYYY-MM of the closing date
    pub closing_date: NaiveDate,
    pub due_date: NaiveDate,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub status: CardBillStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub id: i64,
    pub user_id: String,
    pub account_id: i64,
    pub category_id: Option<i64>,
    pub description: String,
    pub total_amount: Decimal,
    pub installment_count: u32,
    pub installment_amount: Decimal,
    pub first_date: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// Dedup key, e.g. `bill:12:2025-03-10`.
    pub reference: String,
    pub is_read: bool,
    pub created_on: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionTag {
    pub id: i64,
    pub user_id: String,
    pub transaction_id: i64,
    pub tag_id: i64,
}

macro_rules! entity {
    ($($ty:ty => $resource:ident),+ $(,)?) => {
        $(
            impl Entity for $ty {
                const RESOURCE: Resource = Resource::$resource;

                fn id(&self) -> i64 {
                    self.id
                }
            }
        )+
    };
}

entity!(
    Account => Accounts,
    Category => Categories,
    Transaction => Transactions,
    Goal => Goals,
    Bill => Bills,
    Debt => Debts,
    DebtPayment => DebtPayments,
    Investment => Investments,
    InvestmentTransaction => InvestmentTransactions,
    RecurringTransaction => RecurringTransactions,
    MonthlyBudget => MonthlyBudgets,
    CreditCardBill => CreditCardBills,
    Installment => Installments,
    Notification => Notifications,
    Tag => Tags,
    TransactionTag => TransactionTags,
);
