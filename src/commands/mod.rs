// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accounts;
pub mod backup;
pub mod bills;
pub mod budgets;
pub mod cards;
pub mod categories;
pub mod debts;
pub mod exporter;
pub mod goals;
pub mod installments;
pub mod investments;
pub mod notifications;
pub mod recurring;
pub mod reports;
pub mod scan;
pub mod tags;
pub mod transactions;
