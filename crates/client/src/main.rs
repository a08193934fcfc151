//! CLI for interacting with a blind auction.
//!
//! This binary provides commands for:
//! - Posting blinded bids and decoys
//! - Revealing bids from the local bid book
//! - Withdrawing outbid amounts
//! - Ending the auction and querying its status

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use auction_client::{BidBook, BidBuilder, Reconciled};
use auction_commitment::parse_commitment;
use auction_types::{Address, Commitment, RevealEntry};

#[derive(Parser)]
#[command(name = "auction-cli")]
#[command(about = "CLI for sealed-bid blind auctions")]
struct Cli {
    /// Mock chain RPC endpoint
    #[arg(long, default_value = "http://127.0.0.1:9944")]
    rpc: String,

    /// Directory holding local bid books
    #[arg(long, default_value = ".auction")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Post a blinded bid
    Bid {
        /// Sender address (hex)
        #[arg(long)]
        sender: String,

        /// Bid value (hidden until reveal)
        #[arg(long)]
        value: u64,

        /// Deposit attached to the bid (visible on-chain); defaults to the value
        #[arg(long)]
        deposit: Option<u64>,

        /// Post a decoy that never competes
        #[arg(long)]
        fake: bool,
    },

    /// Reveal every bid in the sender's bid book
    Reveal {
        /// Sender address (hex)
        #[arg(long)]
        sender: String,
    },

    /// Withdraw the sender's pending return
    Withdraw {
        /// Sender address (hex)
        #[arg(long)]
        sender: String,
    },

    /// End the auction and pay the beneficiary
    End {
        /// Sender address (hex)
        #[arg(long)]
        sender: String,
    },

    /// Show auction status
    Status,

    /// Show a bidder's posted bids
    Bids {
        /// Bidder address (hex)
        #[arg(long)]
        sender: String,
    },

    /// Show a bidder's pending return
    Pending {
        /// Bidder address (hex)
        #[arg(long)]
        sender: String,
    },

    /// Show an account balance
    Balance {
        /// Account address (hex)
        #[arg(long)]
        address: String,
    },

    /// Fund an account (for testing)
    Faucet {
        /// Account address (hex)
        #[arg(long)]
        address: String,

        /// Amount to mint
        #[arg(long)]
        amount: u64,
    },

    /// Advance chain time (for testing)
    AdvanceBlock,

    /// Set chain timestamp (for testing)
    SetTimestamp {
        /// Unix timestamp to set
        #[arg(long)]
        timestamp: u64,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct BlockInfo {
    height: u64,
    timestamp: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct BidRpc {
    commitment: String,
    deposit: u64,
    revealed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct RevealOutcomeRpc {
    refund: u64,
    revealed: u32,
    forfeited: u32,
    already_revealed: u32,
    leading_value: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AuctionResultRpc {
    winner: Option<String>,
    winning_bid: u64,
    beneficiary: String,
    ended_at: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct AuctionSummaryRpc {
    beneficiary: String,
    phase: String,
    ended: bool,
    bidding_end: u64,
    reveal_end: u64,
    highest_bidder: Option<String>,
    highest_bid: u64,
    num_bidders: usize,
    escrow_balance: u64,
    timestamp: u64,
}

fn parse_address(s: &str) -> Result<Address> {
    hex::decode(s.trim_start_matches("0x"))
        .context("Invalid address hex")?
        .try_into()
        .map_err(|_| anyhow!("Address must be 32 bytes"))
}

/// Commitments the chain holds for `sender`, in posting order.
async fn posted_commitments(client: &HttpClient, sender: &str) -> Result<Vec<Commitment>> {
    let posted: Vec<BidRpc> = client.request("query_getBids", vec![sender]).await?;
    posted
        .iter()
        .map(|bid| parse_commitment(&bid.commitment).context("Chain returned a bad commitment"))
        .collect()
}

/// Settle any bid left pending by an earlier run, then require the book to
/// mirror the chain. Reveal is positional, so a gap would misalign it.
async fn sync_book(
    client: &HttpClient,
    sender: &str,
    book: &mut BidBook,
    book_path: &Path,
) -> Result<()> {
    let on_chain = posted_commitments(client, sender).await?;
    match book.reconcile(&on_chain) {
        Reconciled::Clean => {}
        settled => {
            warn!("Pending bid in {}: {:?}", book_path.display(), settled);
            book.save(book_path)?;
        }
    }

    if on_chain.len() != book.bids.len() {
        return Err(anyhow!(
            "Bid book out of sync: {} bids on chain but {} recorded in {}",
            on_chain.len(),
            book.bids.len(),
            book_path.display()
        ));
    }
    Ok(())
}

async fn bid_cmd(
    client: &HttpClient,
    data_dir: &Path,
    sender: &str,
    value: u64,
    deposit: Option<u64>,
    fake: bool,
) -> Result<()> {
    let bidder = parse_address(sender)?;
    let book_path = BidBook::path_for(data_dir, &bidder);
    let mut book = BidBook::load_or_new(&book_path, &bidder)?;
    sync_book(client, sender, &mut book, &book_path).await?;

    let mut builder = BidBuilder::new().value(value).fake(fake);
    if let Some(deposit) = deposit {
        builder = builder.deposit(deposit);
    }
    let prepared = builder.build(&mut OsRng)?;
    let params = serde_json::json!({
        "sender": sender,
        "commitment": hex::encode(prepared.commitment.0),
        "deposit": prepared.deposit
    });
    let deposit = prepared.deposit;

    // the secret must be on disk before the bid can exist on chain
    book.stage(prepared, &book_path)?;

    let index: u64 = match client.request("auction_bid", vec![params]).await {
        Ok(index) => {
            book.confirm(&book_path)?;
            index
        }
        Err(err) => {
            // the call may have landed even though the response was lost
            let on_chain = posted_commitments(client, sender).await?;
            if book.reconcile(&on_chain) == Reconciled::Confirmed {
                book.save(&book_path)?;
                warn!("Bid response lost, found it on chain: {}", err);
                (book.bids.len() - 1) as u64
            } else {
                book.discard(&book_path)?;
                return Err(err.into());
            }
        }
    };

    info!("Bid {} posted by {}", index, sender);
    println!("Bid posted successfully");
    println!("  Index: {}", index);
    println!("  Value: {} (hidden){}", value, if fake { " [decoy]" } else { "" });
    println!("  Deposit: {}", deposit);
    println!("  Book: {}", book_path.display());

    Ok(())
}

async fn reveal_cmd(client: &HttpClient, data_dir: &Path, sender: &str) -> Result<()> {
    let bidder = parse_address(sender)?;
    let book_path = BidBook::path_for(data_dir, &bidder);
    let mut book = BidBook::load_or_new(&book_path, &bidder)?;
    sync_book(client, sender, &mut book, &book_path).await?;
    if book.bids.is_empty() {
        return Err(anyhow!("No bids recorded in {}", book_path.display()));
    }

    let entries: Vec<RevealEntry> = book.reveal_entries();
    let params = serde_json::json!({
        "sender": sender,
        "entries": entries
    });
    let outcome: RevealOutcomeRpc = client.request("auction_reveal", vec![params]).await?;

    println!("Bids revealed:");
    println!("  Opened: {}", outcome.revealed);
    println!("  Forfeited: {}", outcome.forfeited);
    if outcome.already_revealed > 0 {
        println!("  Already revealed: {}", outcome.already_revealed);
    }
    println!("  Refund: {}", outcome.refund);
    if let Some(value) = outcome.leading_value {
        println!("  You now lead with {}", value);
    }

    Ok(())
}

async fn status_cmd(client: &HttpClient) -> Result<()> {
    let s: AuctionSummaryRpc = client.request("query_getSummary", Vec::<()>::new()).await?;

    println!("Auction:");
    println!("  Phase: {}{}", s.phase, if s.ended { " (paid out)" } else { "" });
    println!("  Now: {}", s.timestamp);
    println!("  Bidding ends: {}", s.bidding_end);
    println!("  Reveal ends: {}", s.reveal_end);
    println!("  Beneficiary: {}", s.beneficiary);
    match s.highest_bidder {
        Some(bidder) => println!("  Highest: {} by {}", s.highest_bid, bidder),
        None => println!("  Highest: none"),
    }
    println!("  Bidders: {}", s.num_bidders);
    println!("  Escrow: {}", s.escrow_balance);

    Ok(())
}

/// First 16 characters of a hex string, or all of it when shorter.
fn short_hex(s: &str) -> &str {
    s.get(..16).unwrap_or(s)
}

async fn bids_cmd(client: &HttpClient, sender: &str) -> Result<()> {
    let bids: Vec<BidRpc> = client.request("query_getBids", vec![sender]).await?;

    if bids.is_empty() {
        println!("No bids for {}", sender);
    } else {
        println!("Bids for {}:", sender);
        for (i, bid) in bids.iter().enumerate() {
            println!(
                "  [{}] Deposit: {}  {}",
                i,
                bid.deposit,
                if bid.revealed { "revealed" } else { "sealed" }
            );
            println!("      Commitment: {}...", short_hex(&bid.commitment));
        }
    }

    Ok(())
}

async fn end_cmd(client: &HttpClient, sender: &str) -> Result<()> {
    let result: AuctionResultRpc = client.request("auction_end", vec![sender]).await?;

    println!("Auction ended:");
    match result.winner {
        Some(winner) => println!("  Winner: {}", winner),
        None => println!("  Winner: none"),
    }
    println!("  Winning bid: {}", result.winning_bid);
    println!("  Paid to: {}", result.beneficiary);
    println!("  Ended at: {}", result.ended_at);

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("auction_cli=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let client = HttpClientBuilder::default().build(&cli.rpc)?;

    match cli.command {
        Commands::Bid {
            sender,
            value,
            deposit,
            fake,
        } => {
            bid_cmd(&client, &cli.data_dir, &sender, value, deposit, fake).await?;
        }

        Commands::Reveal { sender } => {
            reveal_cmd(&client, &cli.data_dir, &sender).await?;
        }

        Commands::Withdraw { sender } => {
            let amount: u64 = client.request("auction_withdraw", vec![sender]).await?;
            println!("Withdrawn: {}", amount);
        }

        Commands::End { sender } => {
            end_cmd(&client, &sender).await?;
        }

        Commands::Status => {
            status_cmd(&client).await?;
        }

        Commands::Bids { sender } => {
            bids_cmd(&client, &sender).await?;
        }

        Commands::Pending { sender } => {
            let amount: u64 = client
                .request("query_getPendingReturn", vec![sender.clone()])
                .await?;
            println!("Pending return for {}: {}", sender, amount);
        }

        Commands::Balance { address } => {
            let balance: u64 = client
                .request("chain_getBalance", vec![address.clone()])
                .await?;
            println!("Balance of {}: {}", address, balance);
        }

        Commands::Faucet { address, amount } => {
            let balance: u64 = client
                .request("admin_faucet", (address.clone(), amount))
                .await?;
            println!("Funded {}: balance {}", address, balance);
        }

        Commands::AdvanceBlock => {
            let info: BlockInfo = client.request("admin_advanceBlock", Vec::<()>::new()).await?;
            println!("Block advanced: height={}, timestamp={}", info.height, info.timestamp);
        }

        Commands::SetTimestamp { timestamp } => {
            let _: bool = client.request("admin_setTimestamp", vec![timestamp]).await?;
            println!("Timestamp set to {}", timestamp);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_hex() {
        assert_eq!(short_hex(&"ab".repeat(32)), "abababababababab");
        assert_eq!(short_hex("abc"), "abc");
        assert_eq!(short_hex(""), "");
    }

    #[test]
    fn test_parse_address() {
        let addr = parse_address(&format!("0x{}", hex::encode([3u8; 32]))).unwrap();
        assert_eq!(addr, [3u8; 32]);
        assert!(parse_address("abcd").is_err());
    }
}
