// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, crate_version, value_parser};

fn opt(name: &'static str) -> Arg {
    Arg::new(name).long(name)
}

fn req(name: &'static str) -> Arg {
    Arg::new(name).long(name).required(true)
}

fn flag(name: &'static str) -> Arg {
    Arg::new(name).long(name).action(ArgAction::SetTrue)
}

fn id_arg() -> Arg {
    req("id").help("Row id")
}

fn with_json(cmd: Command) -> Command {
    cmd.arg(flag("json").help("Print as pretty JSON"))
        .arg(flag("jsonl").help("Print as JSON lines"))
}

fn account_cmd() -> Command {
    Command::new("account")
        .about("Bank accounts, wallets and credit cards")
        .subcommand(
            Command::new("add")
                .arg(req("name"))
                .arg(opt("kind").default_value("checking").help(
                    "checking|savings|credit_card|cash|investment",
                ))
                .arg(opt("currency"))
                .arg(opt("initial-balance").default_value("0"))
                .arg(opt("limit").help("Credit limit (cards)"))
                .arg(opt("closing-day").value_parser(value_parser!(u32).range(1..=31)))
                .arg(opt("due-day").value_parser(value_parser!(u32).range(1..=31))),
        )
        .subcommand(with_json(Command::new("list").arg(flag("archived"))))
        .subcommand(
            Command::new("edit")
                .arg(req("name"))
                .arg(opt("rename"))
                .arg(opt("limit"))
                .arg(opt("closing-day").value_parser(value_parser!(u32).range(1..=31)))
                .arg(opt("due-day").value_parser(value_parser!(u32).range(1..=31))),
        )
        .subcommand(Command::new("archive").arg(req("name")))
        .subcommand(Command::new("rm").arg(req("name")))
}

fn category_cmd() -> Command {
    Command::new("category")
        .about("Income and expense categories")
        .subcommand(
            Command::new("add")
                .arg(req("name"))
                .arg(opt("kind").default_value("expense"))
                .arg(opt("color")),
        )
        .subcommand(with_json(Command::new("list")))
        .subcommand(Command::new("rm").arg(req("name")))
}

fn tag_cmd() -> Command {
    Command::new("tag")
        .about("Free-form transaction tags")
        .subcommand(Command::new("add").arg(req("name")).arg(opt("color")))
        .subcommand(with_json(Command::new("list")))
        .subcommand(Command::new("rm").arg(req("name")))
        .subcommand(Command::new("assign").arg(req("tx")).arg(req("tag")))
        .subcommand(Command::new("unassign").arg(req("tx")).arg(req("tag")))
}

fn tx_cmd() -> Command {
    Command::new("tx")
        .about("Transactions")
        .subcommand(
            Command::new("add")
                .arg(req("account"))
                .arg(req("amount"))
                .arg(req("description"))
                .arg(opt("kind").default_value("expense"))
                .arg(opt("date").help("YYYY-MM-DD, defaults to today"))
                .arg(opt("category"))
                .arg(opt("to").help("Destination account for transfers"))
                .arg(opt("notes"))
                .arg(flag("unpaid")),
        )
        .subcommand(with_json(
            Command::new("list")
                .arg(opt("month"))
                .arg(opt("account"))
                .arg(opt("category"))
                .arg(opt("tag"))
                .arg(opt("limit").value_parser(value_parser!(usize))),
        ))
        .subcommand(
            Command::new("edit")
                .arg(id_arg())
                .arg(opt("amount"))
                .arg(opt("description"))
                .arg(opt("date"))
                .arg(opt("category"))
                .arg(flag("paid"))
                .arg(flag("unpaid").conflicts_with("paid")),
        )
        .subcommand(Command::new("rm").arg(id_arg()))
}

fn budget_cmd() -> Command {
    Command::new("budget")
        .about("Monthly budgets per category")
        .subcommand(
            Command::new("set")
                .arg(req("month"))
                .arg(req("category"))
                .arg(req("amount")),
        )
        .subcommand(with_json(Command::new("list").arg(opt("month"))))
        .subcommand(with_json(Command::new("report").arg(req("month"))))
}

fn bill_cmd() -> Command {
    Command::new("bill")
        .about("Bills to pay")
        .subcommand(
            Command::new("add")
                .arg(req("description"))
                .arg(req("amount"))
                .arg(req("due"))
                .arg(opt("category"))
                .arg(opt("account"))
                .arg(opt("barcode")),
        )
        .subcommand(with_json(Command::new("list").arg(flag("pending"))))
        .subcommand(
            Command::new("pay")
                .arg(id_arg())
                .arg(opt("date"))
                .arg(flag("record").help("Also record an expense on the bill's account")),
        )
        .subcommand(Command::new("rm").arg(id_arg()))
        .subcommand(with_json(
            Command::new("scan")
                .about("Read a bill from an image")
                .arg(req("image"))
                .arg(flag("save")),
        ))
}

fn debt_cmd() -> Command {
    Command::new("debt")
        .about("Loans and financed debts")
        .subcommand(
            Command::new("add")
                .arg(req("name"))
                .arg(req("amount"))
                .arg(req("installments").value_parser(value_parser!(u32).range(1..)))
                .arg(opt("rate").default_value("0").help("Monthly interest in percent"))
                .arg(opt("installment-amount"))
                .arg(opt("start"))
                .arg(opt("creditor")),
        )
        .subcommand(with_json(Command::new("list")))
        .subcommand(
            Command::new("pay")
                .arg(id_arg())
                .arg(req("amount"))
                .arg(opt("date"))
                .arg(flag("extra"))
                .arg(opt("notes")),
        )
        .subcommand(with_json(Command::new("payments").arg(id_arg())))
        .subcommand(with_json(Command::new("schedule").arg(id_arg())))
        .subcommand(with_json(
            Command::new("plan")
                .arg(req("budget"))
                .arg(opt("strategy").default_value("avalanche")),
        ))
        .subcommand(Command::new("rm").arg(id_arg()))
}

fn invest_cmd() -> Command {
    let trade = |name: &'static str| {
        Command::new(name)
            .arg(id_arg())
            .arg(req("quantity"))
            .arg(req("price"))
            .arg(opt("fees"))
            .arg(opt("date"))
    };
    Command::new("invest")
        .about("Investment positions")
        .subcommand(
            Command::new("add")
                .arg(req("name"))
                .arg(opt("ticker"))
                .arg(opt("kind").default_value("stock")),
        )
        .subcommand(with_json(Command::new("list")))
        .subcommand(trade("buy"))
        .subcommand(trade("sell"))
        .subcommand(
            Command::new("dividend")
                .arg(id_arg())
                .arg(req("amount"))
                .arg(opt("date")),
        )
        .subcommand(Command::new("price").arg(id_arg()).arg(req("price")))
        .subcommand(with_json(Command::new("history").arg(id_arg())))
        .subcommand(Command::new("rm").arg(id_arg()))
}

fn recurring_cmd() -> Command {
    Command::new("recurring")
        .about("Recurring transactions")
        .subcommand(
            Command::new("add")
                .arg(req("account"))
                .arg(req("amount"))
                .arg(req("description"))
                .arg(opt("kind").default_value("expense"))
                .arg(opt("frequency").default_value("monthly"))
                .arg(opt("start"))
                .arg(opt("end"))
                .arg(opt("category"))
                .arg(flag("manual").help("Do not materialize automatically")),
        )
        .subcommand(with_json(Command::new("list")))
        .subcommand(Command::new("process").arg(opt("date")))
        .subcommand(with_json(
            Command::new("upcoming").arg(
                opt("days")
                    .value_parser(value_parser!(i64))
                    .default_value("30"),
            ),
        ))
        .subcommand(Command::new("pause").arg(id_arg()))
        .subcommand(Command::new("resume").arg(id_arg()))
        .subcommand(Command::new("rm").arg(id_arg()))
}

fn card_cmd() -> Command {
    Command::new("card")
        .about("Credit-card statements")
        .subcommand(with_json(
            Command::new("bill")
                .about("Compute (or refresh) the statement closing in a month")
                .arg(req("account"))
                .arg(opt("month")),
        ))
        .subcommand(with_json(Command::new("bills").arg(req("account"))))
        .subcommand(
            Command::new("pay")
                .arg(req("account"))
                .arg(req("month"))
                .arg(opt("amount")),
        )
        .subcommand(Command::new("period").arg(req("account")).arg(opt("date")))
        .subcommand(Command::new("limit").arg(req("account")))
}

fn installment_cmd() -> Command {
    Command::new("installment")
        .about("Purchases split in monthly installments")
        .subcommand(
            Command::new("add")
                .arg(req("account"))
                .arg(req("description"))
                .arg(req("amount"))
                .arg(req("count").value_parser(value_parser!(u32).range(1..)))
                .arg(opt("first-date"))
                .arg(opt("category")),
        )
        .subcommand(with_json(Command::new("list")))
        .subcommand(Command::new("rm").arg(id_arg()))
}

fn goal_cmd() -> Command {
    Command::new("goal")
        .about("Savings goals")
        .subcommand(
            Command::new("add")
                .arg(req("name"))
                .arg(req("target"))
                .arg(opt("deadline")),
        )
        .subcommand(with_json(Command::new("list")))
        .subcommand(Command::new("contribute").arg(id_arg()).arg(req("amount")))
        .subcommand(Command::new("rm").arg(id_arg()))
}

fn notify_cmd() -> Command {
    Command::new("notify")
        .about("Due-date and budget notifications")
        .subcommand(Command::new("check").arg(opt("date")))
        .subcommand(with_json(Command::new("list").arg(flag("unread"))))
        .subcommand(
            Command::new("read")
                .arg(opt("id"))
                .arg(flag("all"))
                .group(clap::ArgGroup::new("which").args(["id", "all"]).required(true)),
        )
        .subcommand(Command::new("clear"))
}

fn report_cmd() -> Command {
    Command::new("report")
        .about("Reports")
        .subcommand(with_json(Command::new("balances")))
        .subcommand(with_json(
            Command::new("cashflow").arg(
                opt("months")
                    .value_parser(value_parser!(usize))
                    .default_value("12"),
            ),
        ))
        .subcommand(with_json(Command::new("spend-by-category").arg(req("month"))))
        .subcommand(with_json(Command::new("summary").arg(req("month"))))
}

fn export_cmd() -> Command {
    Command::new("export")
        .about("Export data")
        .subcommand(
            Command::new("transactions")
                .arg(req("format").help("csv|json"))
                .arg(req("out")),
        )
}

fn backup_cmd() -> Command {
    Command::new("backup")
        .about("Full JSON backups")
        .subcommand(Command::new("export").arg(req("out")))
        .subcommand(Command::new("restore").arg(req("path")))
}

fn config_cmd() -> Command {
    Command::new("config")
        .about("Settings")
        .subcommand(Command::new("show"))
        .subcommand(Command::new("set-user").arg(req("user")))
        .subcommand(Command::new("set-base").arg(req("currency")))
        .subcommand(
            Command::new("set-notify-days")
                .arg(req("days").value_parser(value_parser!(i64).range(0..))),
        )
}

pub fn build_cli() -> Command {
    Command::new("cofre")
        .version(crate_version!())
        .about("Personal finance ledger: accounts, cards, debts, budgets and more")
        .arg(
            Arg::new("user")
                .long("user")
                .global(true)
                .help("Owning user id (defaults to the configured user)"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .help("Log filter, e.g. info or cofre=debug"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(config_cmd())
        .subcommand(account_cmd())
        .subcommand(category_cmd())
        .subcommand(tag_cmd())
        .subcommand(tx_cmd())
        .subcommand(budget_cmd())
        .subcommand(bill_cmd())
        .subcommand(debt_cmd())
        .subcommand(invest_cmd())
        .subcommand(recurring_cmd())
        .subcommand(card_cmd())
        .subcommand(installment_cmd())
        .subcommand(goal_cmd())
        .subcommand(notify_cmd())
        .subcommand(report_cmd())
        .subcommand(export_cmd())
        .subcommand(backup_cmd())
}
