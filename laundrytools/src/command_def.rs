use clap::{Args, Subcommand};
use laundry_common::Money;
use laundry_engine::db_types::{OrderStatusType, Role};

#[derive(Debug, Subcommand)]
pub enum OrderCommand {
    /// Show an order with its lines, discounts, payment and status history
    Show {
        #[arg(required = true, index = 1)]
        id: i64,
    },
    /// List a customer's orders
    List {
        #[arg(required = true, index = 1)]
        user_id: i64,
    },
    #[command(name = "adjust-price")]
    /// Set the manual price of an unpaid order. Leave out the price to clear it and charge the computed total again.
    AdjustPrice {
        #[arg(required = true, index = 1)]
        id: i64,
        #[arg(index = 2)]
        price: Option<Money>,
    },
    /// Move an order to a new status
    Status(StatusParams),
    /// Record that an order has been paid
    Pay {
        #[arg(required = true, index = 1)]
        id: i64,
    },
}

#[derive(Debug, Args)]
pub struct StatusParams {
    #[arg(required = true, index = 1)]
    pub id: i64,
    #[arg(required = true, index = 2)]
    pub status: OrderStatusType,
    /// The user making the change
    #[arg(short = 'u', long = "user")]
    pub user_id: i64,
    #[arg(short, long, default_value = "ADMIN")]
    pub role: Role,
}

#[derive(Debug, Subcommand)]
pub enum LoyaltyCommand {
    /// Show a customer's balance and tier
    Balance {
        #[arg(required = true, index = 1)]
        user_id: i64,
    },
    /// List a customer's point transactions
    History {
        #[arg(required = true, index = 1)]
        user_id: i64,
    },
    /// Award points to a customer
    Award {
        #[arg(required = true, index = 1)]
        user_id: i64,
        #[arg(required = true, index = 2)]
        points: i64,
        #[arg(short, long, default_value = "Admin award")]
        reason: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum AffiliateCommand {
    /// Show an affiliate's profile, level and pending withdrawals
    Show {
        #[arg(required = true, index = 1)]
        id: i64,
    },
    /// Approve a pending affiliate, or reinstate a suspended one
    Activate {
        #[arg(required = true, index = 1)]
        id: i64,
    },
    Suspend {
        #[arg(required = true, index = 1)]
        id: i64,
    },
    /// List an affiliate's commission transactions
    History {
        #[arg(required = true, index = 1)]
        id: i64,
    },
    #[command(subcommand)]
    /// Review withdrawal requests
    Withdrawal(WithdrawalCommand),
}

#[derive(Debug, Subcommand)]
pub enum WithdrawalCommand {
    Approve {
        #[arg(required = true, index = 1)]
        id: i64,
    },
    /// Reject a withdrawal and return the amount to the affiliate's balance
    Reject {
        #[arg(required = true, index = 1)]
        id: i64,
        #[arg(short, long)]
        reason: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum PriceCommand {
    /// Show the price row for an article and service, provisioning a placeholder if there is none
    Show(PriceKeyParams),
    /// Set a per-item price
    Item {
        #[command(flatten)]
        key: PriceKeyParams,
        #[arg(short, long)]
        base: Money,
        /// Defaults to the base price
        #[arg(short, long)]
        premium: Option<Money>,
    },
    /// Set a per-kilogram price
    Weight {
        #[command(flatten)]
        key: PriceKeyParams,
        #[arg(short = 'k', long)]
        per_kg: Money,
    },
    /// Withdraw a price from sale, or put it back with --available
    Availability {
        #[command(flatten)]
        key: PriceKeyParams,
        #[arg(long, default_value_t = false)]
        available: bool,
    },
}

#[derive(Debug, Args)]
pub struct PriceKeyParams {
    #[arg(short, long)]
    pub article: i64,
    #[arg(short = 't', long)]
    pub service_type: i64,
    #[arg(short, long)]
    pub service: i64,
}
