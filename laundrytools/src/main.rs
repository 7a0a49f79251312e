use clap::{Parser, Subcommand};
use log::*;

mod command_def;
mod command_handler;
mod formatting;
mod setup;

use command_def::{AffiliateCommand, LoyaltyCommand, OrderCommand, PriceCommand};
use setup::SetupCommand;

#[derive(Parser, Debug)]
#[command(version, about = "Operator tools for the laundry settlement engine")]
pub struct Arguments {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(subcommand)]
    /// Prepare a database for the engine
    Setup(SetupCommand),
    #[command(subcommand)]
    /// Inspect and adjust settled orders
    Order(OrderCommand),
    #[command(subcommand)]
    /// Customer loyalty balances and history
    Loyalty(LoyaltyCommand),
    #[command(subcommand)]
    /// Affiliate review, commission history and withdrawals
    Affiliate(AffiliateCommand),
    #[command(subcommand)]
    /// Catalog prices
    Price(PriceCommand),
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();
    let cli = Arguments::parse();
    trace!("🛠️ {cli:?}");
    let result = match cli.command {
        Command::Setup(cmd) => setup::handle_setup_command(cmd).await,
        Command::Order(cmd) => command_handler::handle_order_command(cmd).await,
        Command::Loyalty(cmd) => command_handler::handle_loyalty_command(cmd).await,
        Command::Affiliate(cmd) => command_handler::handle_affiliate_command(cmd).await,
        Command::Price(cmd) => command_handler::handle_price_command(cmd).await,
    };
    if let Err(e) = result {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}
