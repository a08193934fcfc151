//! Mock chain server for local testing of a blind auction.
//!
//! This provides a JSON-RPC server that hosts one auction instance, a
//! simulated clock and an account bank, without requiring a real blockchain.

use anyhow::{Context, Result};
use clap::Parser;
use jsonrpsee::core::async_trait;
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::server::Server;
use jsonrpsee::types::ErrorObjectOwned;
use parking_lot::RwLock;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use auction_commitment::parse_commitment;
use auction_module::invariants::check_invariants;
use auction_module::queries::get_pending_withdrawals;
use auction_module::{
    handle_query, handlers, AuctionGenesisConfig, AuctionQuery, AuctionQueryResponse,
    AuctionState as ModuleState, AuctionSummary, CallContext, RevealOutcome,
};
use auction_types::{Address, Commitment};

mod bank;
mod types;
use bank::Bank;
use types::*;

#[derive(Parser)]
#[command(name = "mock-chain")]
#[command(about = "Local JSON-RPC chain hosting a single blind auction")]
struct Cli {
    /// Address to serve JSON-RPC on
    #[arg(long, default_value = "127.0.0.1:9944")]
    listen: SocketAddr,

    /// Genesis config (JSON). Defaults are used when omitted.
    #[arg(long)]
    genesis: Option<PathBuf>,
}

/// Shared chain state.
struct ChainState {
    /// Module state
    module: ModuleState,
    /// Account balances, also the module's transfer backend
    bank: Bank,
    /// Current block height (simulated)
    block_height: u64,
    /// Current timestamp (simulated, can be advanced)
    timestamp: u64,
}

impl ChainState {
    fn new(config: &AuctionGenesisConfig) -> Result<Self> {
        let module = ModuleState::from_genesis(config).context("Invalid genesis config")?;
        Ok(Self {
            module,
            bank: Bank::new(),
            block_height: 0,
            timestamp: config.start_time,
        })
    }

    fn advance_block(&mut self) {
        self.block_height = self.block_height.saturating_add(1);
        self.timestamp = self.timestamp.saturating_add(12); // ~12 second blocks
    }

    fn set_timestamp(&mut self, ts: u64) {
        self.timestamp = ts;
    }

    fn context(&self, sender: Address, value: u64) -> CallContext {
        CallContext {
            sender,
            block_height: self.block_height,
            timestamp: self.timestamp,
            value,
        }
    }

    /// Take the deposit from the sender and post the bid. A refused bid
    /// hands the deposit back.
    fn submit_bid(
        &mut self,
        sender: Address,
        commitment: Commitment,
        deposit: u64,
    ) -> Result<usize> {
        self.bank.debit(&sender, deposit)?;

        let ctx = self.context(sender, deposit);
        match handlers::handle_bid(&mut self.module, &ctx, commitment) {
            Ok(index) => {
                self.audit("auction_bid");
                Ok(index)
            }
            Err(e) => {
                self.bank
                    .credit(sender, deposit)
                    .context("Failed to return deposit")?;
                Err(e.into())
            }
        }
    }

    /// Log any invariant the last call broke.
    fn audit(&self, method: &str) {
        if let Err(violation) = check_invariants(&self.module) {
            error!(method, %violation, "Invariant violated");
        }
    }
}

/// RPC API definition for the mock chain.
#[rpc(server)]
pub trait MockChainApi {
    // ============ Admin Methods ============

    /// Advance the chain by one block.
    #[method(name = "admin_advanceBlock")]
    async fn admin_advance_block(&self) -> Result<BlockInfo, ErrorObjectOwned>;

    /// Set the current timestamp (for testing time-dependent logic).
    #[method(name = "admin_setTimestamp")]
    async fn admin_set_timestamp(&self, timestamp: u64) -> Result<bool, ErrorObjectOwned>;

    /// Mint funds into an account. Returns the new balance.
    #[method(name = "admin_faucet")]
    async fn admin_faucet(&self, address: String, amount: u64) -> Result<u64, ErrorObjectOwned>;

    /// Make an account refuse (or accept again) incoming payments.
    #[method(name = "admin_setRejecting")]
    async fn admin_set_rejecting(
        &self,
        address: String,
        rejecting: bool,
    ) -> Result<bool, ErrorObjectOwned>;

    // ============ Auction Methods ============

    /// Post a blinded bid. Returns its index in the sender's sequence.
    #[method(name = "auction_bid")]
    async fn auction_bid(&self, params: BidParams) -> Result<u64, ErrorObjectOwned>;

    /// Reveal all of the sender's bids.
    #[method(name = "auction_reveal")]
    async fn auction_reveal(&self, params: RevealParams)
        -> Result<RevealOutcome, ErrorObjectOwned>;

    /// Withdraw the sender's pending return.
    #[method(name = "auction_withdraw")]
    async fn auction_withdraw(&self, sender: String) -> Result<u64, ErrorObjectOwned>;

    /// End the auction and pay the beneficiary.
    #[method(name = "auction_end")]
    async fn auction_end(&self, sender: String) -> Result<AuctionResultRpc, ErrorObjectOwned>;

    // ============ Query Methods ============

    /// Get current block info.
    #[method(name = "chain_getBlockInfo")]
    async fn chain_get_block_info(&self) -> Result<BlockInfo, ErrorObjectOwned>;

    /// Get an account balance.
    #[method(name = "chain_getBalance")]
    async fn chain_get_balance(&self, address: String) -> Result<u64, ErrorObjectOwned>;

    /// Get auction status at the current timestamp.
    #[method(name = "query_getSummary")]
    async fn query_get_summary(&self) -> Result<AuctionSummaryRpc, ErrorObjectOwned>;

    /// Get a bidder's blinded bids.
    #[method(name = "query_getBids")]
    async fn query_get_bids(&self, bidder: String) -> Result<Vec<BidRpc>, ErrorObjectOwned>;

    /// Get a bidder's pending return.
    #[method(name = "query_getPendingReturn")]
    async fn query_get_pending_return(&self, bidder: String) -> Result<u64, ErrorObjectOwned>;

    /// Run any module query against the current state.
    #[method(name = "query_auction")]
    async fn query_auction(
        &self,
        query: AuctionQuery,
    ) -> Result<AuctionQueryResponse, ErrorObjectOwned>;

    /// List every outstanding pending return.
    #[method(name = "query_listPendingReturns")]
    async fn query_list_pending_returns(&self)
        -> Result<Vec<PendingReturnRpc>, ErrorObjectOwned>;

    /// Get the settlement result, if the auction ended.
    #[method(name = "query_getResult")]
    async fn query_get_result(&self) -> Result<Option<AuctionResultRpc>, ErrorObjectOwned>;

    /// Get the event log.
    #[method(name = "query_getEvents")]
    async fn query_get_events(&self) -> Result<Vec<AuctionEventRpc>, ErrorObjectOwned>;
}

/// Implementation of the mock chain RPC server.
struct MockChainServer {
    state: Arc<RwLock<ChainState>>,
}

impl MockChainServer {
    fn new(chain: ChainState) -> Self {
        Self {
            state: Arc::new(RwLock::new(chain)),
        }
    }

    fn rpc_error(msg: &str) -> ErrorObjectOwned {
        ErrorObjectOwned::owned(-32000, msg.to_string(), None::<()>)
    }

    fn query(&self, query: AuctionQuery) -> AuctionQueryResponse {
        handle_query(&self.state.read().module, query)
    }

    fn unexpected(response: AuctionQueryResponse) -> ErrorObjectOwned {
        Self::rpc_error(&format!("Unexpected query response: {:?}", response))
    }
}

#[async_trait]
impl MockChainApiServer for MockChainServer {
    async fn admin_advance_block(&self) -> Result<BlockInfo, ErrorObjectOwned> {
        let mut state = self.state.write();
        state.advance_block();
        Ok(BlockInfo {
            height: state.block_height,
            timestamp: state.timestamp,
        })
    }

    async fn admin_set_timestamp(&self, timestamp: u64) -> Result<bool, ErrorObjectOwned> {
        let mut state = self.state.write();
        state.set_timestamp(timestamp);
        info!("Timestamp set to {}", timestamp);
        Ok(true)
    }

    async fn admin_faucet(&self, address: String, amount: u64) -> Result<u64, ErrorObjectOwned> {
        let account = parse_address(&address)?;
        let mut state = self.state.write();
        let balance = state
            .bank
            .credit(account, amount)
            .map_err(|e| Self::rpc_error(&format!("Faucet failed: {}", e)))?;

        info!("Faucet sent {} to {}", amount, address);
        Ok(balance)
    }

    async fn admin_set_rejecting(
        &self,
        address: String,
        rejecting: bool,
    ) -> Result<bool, ErrorObjectOwned> {
        let account = parse_address(&address)?;
        self.state.write().bank.set_rejecting(account, rejecting);
        info!("Account {} rejecting payments: {}", address, rejecting);
        Ok(true)
    }

    async fn auction_bid(&self, params: BidParams) -> Result<u64, ErrorObjectOwned> {
        let sender = parse_address(&params.sender)?;
        let commitment = parse_commitment(&params.commitment)
            .map_err(|e| Self::rpc_error(&format!("Invalid commitment: {}", e)))?;

        let index = self
            .state
            .write()
            .submit_bid(sender, commitment, params.deposit)
            .map_err(|e| Self::rpc_error(&format!("Failed to bid: {:#}", e)))?;

        info!(
            "Bid {} posted by {} with deposit {}",
            index, params.sender, params.deposit
        );
        Ok(index as u64)
    }

    async fn auction_reveal(
        &self,
        params: RevealParams,
    ) -> Result<RevealOutcome, ErrorObjectOwned> {
        let sender = parse_address(&params.sender)?;
        let mut guard = self.state.write();
        let chain = &mut *guard;

        let ctx = chain.context(sender, 0);
        let outcome =
            handlers::handle_reveal(&mut chain.module, &ctx, &mut chain.bank, &params.entries)
                .map_err(|e| Self::rpc_error(&format!("Failed to reveal: {}", e)))?;
        chain.audit("auction_reveal");

        info!(
            "{} revealed {} bids, refund {}",
            params.sender, outcome.revealed, outcome.refund
        );
        Ok(outcome)
    }

    async fn auction_withdraw(&self, sender: String) -> Result<u64, ErrorObjectOwned> {
        let account = parse_address(&sender)?;
        let mut guard = self.state.write();
        let chain = &mut *guard;

        let ctx = chain.context(account, 0);
        let amount = handlers::handle_withdraw(&mut chain.module, &ctx, &mut chain.bank)
            .map_err(|e| Self::rpc_error(&format!("Failed to withdraw: {}", e)))?;
        chain.audit("auction_withdraw");

        info!("{} withdrew {}", sender, amount);
        Ok(amount)
    }

    async fn auction_end(&self, sender: String) -> Result<AuctionResultRpc, ErrorObjectOwned> {
        let account = parse_address(&sender)?;
        let mut guard = self.state.write();
        let chain = &mut *guard;

        let ctx = chain.context(account, 0);
        let result = handlers::handle_auction_end(&mut chain.module, &ctx, &mut chain.bank)
            .map_err(|e| Self::rpc_error(&format!("Failed to end auction: {}", e)))?;
        chain.audit("auction_end");

        info!(
            "Auction ended. Winning bid {} paid to beneficiary",
            result.winning_bid
        );
        Ok(AuctionResultRpc::from(result))
    }

    async fn chain_get_block_info(&self) -> Result<BlockInfo, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(BlockInfo {
            height: state.block_height,
            timestamp: state.timestamp,
        })
    }

    async fn chain_get_balance(&self, address: String) -> Result<u64, ErrorObjectOwned> {
        let account = parse_address(&address)?;
        Ok(self.state.read().bank.balance_of(&account))
    }

    async fn query_get_summary(&self) -> Result<AuctionSummaryRpc, ErrorObjectOwned> {
        let state = self.state.read();
        let summary = AuctionSummary::from_state(&state.module, state.timestamp);
        Ok(AuctionSummaryRpc::new(summary, state.timestamp))
    }

    async fn query_get_bids(&self, bidder: String) -> Result<Vec<BidRpc>, ErrorObjectOwned> {
        let bidder = parse_address(&bidder)?;
        match self.query(AuctionQuery::GetBids { bidder }) {
            AuctionQueryResponse::Bids(bids) => Ok(bids.iter().map(BidRpc::from).collect()),
            other => Err(Self::unexpected(other)),
        }
    }

    async fn query_get_pending_return(&self, bidder: String) -> Result<u64, ErrorObjectOwned> {
        let bidder = parse_address(&bidder)?;
        match self.query(AuctionQuery::GetPendingReturn { bidder }) {
            AuctionQueryResponse::PendingReturn(amount) => Ok(amount),
            other => Err(Self::unexpected(other)),
        }
    }

    async fn query_auction(
        &self,
        query: AuctionQuery,
    ) -> Result<AuctionQueryResponse, ErrorObjectOwned> {
        Ok(self.query(query))
    }

    async fn query_list_pending_returns(
        &self,
    ) -> Result<Vec<PendingReturnRpc>, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(get_pending_withdrawals(&state.module)
            .into_iter()
            .map(|(bidder, amount)| PendingReturnRpc {
                bidder: hex::encode(bidder),
                amount,
            })
            .collect())
    }

    async fn query_get_result(&self) -> Result<Option<AuctionResultRpc>, ErrorObjectOwned> {
        match self.query(AuctionQuery::GetResult) {
            AuctionQueryResponse::Result(result) => Ok(result.map(AuctionResultRpc::from)),
            other => Err(Self::unexpected(other)),
        }
    }

    async fn query_get_events(&self) -> Result<Vec<AuctionEventRpc>, ErrorObjectOwned> {
        match self.query(AuctionQuery::GetEvents) {
            AuctionQueryResponse::Events(events) => {
                Ok(events.iter().map(AuctionEventRpc::from).collect())
            }
            other => Err(Self::unexpected(other)),
        }
    }
}

fn parse_address(s: &str) -> Result<Address, ErrorObjectOwned> {
    let bytes = hex::decode(s.trim_start_matches("0x"))
        .map_err(|e| MockChainServer::rpc_error(&format!("Invalid address hex: {}", e)))?;
    bytes
        .try_into()
        .map_err(|_| MockChainServer::rpc_error("Address must be 32 bytes"))
}

fn load_genesis(path: Option<&PathBuf>) -> Result<AuctionGenesisConfig> {
    match path {
        Some(path) => {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("Reading genesis file {}", path.display()))?;
            serde_json::from_str(&data).context("Parsing genesis config")
        }
        None => Ok(AuctionGenesisConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mock_chain=info".parse()?)
                .add_directive("auction_module=info".parse()?)
                .add_directive("jsonrpsee=warn".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let genesis = load_genesis(cli.genesis.as_ref())?;
    let chain = ChainState::new(&genesis)?;

    info!(
        "Auction for beneficiary {}: bidding until {}, reveals until {}",
        hex::encode(chain.module.beneficiary),
        chain.module.timing.bidding_end,
        chain.module.timing.reveal_end
    );
    info!("Starting mock chain server on {}", cli.listen);

    let server = Server::builder().build(cli.listen).await?;
    let handle = server.start(MockChainServer::new(chain).into_rpc());

    info!("Mock chain server running. Press Ctrl+C to stop.");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutting down...");
    handle.stop()?;
    handle.stopped().await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        let addr = parse_address(&format!("0x{}", hex::encode([7u8; 32]))).unwrap();
        assert_eq!(addr, [7u8; 32]);
        assert!(parse_address("abcd").is_err());
        assert!(parse_address("zz").is_err());
    }

    #[test]
    fn test_chain_starts_at_genesis_time() {
        let config = AuctionGenesisConfig {
            start_time: 1_000,
            ..AuctionGenesisConfig::default()
        };
        let mut chain = ChainState::new(&config).unwrap();
        assert_eq!(chain.timestamp, 1_000);

        chain.advance_block();
        assert_eq!(chain.block_height, 1);
        assert_eq!(chain.timestamp, 1_012);

        chain.set_timestamp(u64::MAX - 5);
        chain.advance_block();
        assert_eq!(chain.timestamp, u64::MAX);
    }

    #[test]
    fn test_refused_bid_returns_deposit() {
        let mut chain = ChainState::new(&AuctionGenesisConfig::default()).unwrap();
        let bidder = [5u8; 32];
        chain.bank.credit(bidder, 100).unwrap();

        let index = chain.submit_bid(bidder, Commitment([1u8; 32]), 40).unwrap();
        assert_eq!(index, 0);
        assert_eq!(chain.bank.balance_of(&bidder), 60);
        assert_eq!(chain.module.escrow_balance, 40);

        // more than the account holds: nothing is taken or posted
        assert!(chain.submit_bid(bidder, Commitment([2u8; 32]), 500).is_err());
        assert_eq!(chain.bank.balance_of(&bidder), 60);

        // bidding closed: the module refuses and the deposit comes back
        let bidding_end = chain.module.timing.bidding_end;
        chain.set_timestamp(bidding_end);
        assert!(chain.submit_bid(bidder, Commitment([3u8; 32]), 25).is_err());
        assert_eq!(chain.bank.balance_of(&bidder), 60);
        assert_eq!(chain.module.escrow_balance, 40);
        assert_eq!(chain.module.get_bids(&bidder).len(), 1);
    }

    #[tokio::test]
    async fn test_bid_rpc_and_queries() {
        let chain = ChainState::new(&AuctionGenesisConfig::default()).unwrap();
        let server = MockChainServer::new(chain);
        let bidder = hex::encode([6u8; 32]);
        server.admin_faucet(bidder.clone(), 50).await.unwrap();

        let params = BidParams {
            sender: bidder.clone(),
            commitment: hex::encode([9u8; 32]),
            deposit: 30,
        };
        assert_eq!(server.auction_bid(params.clone()).await.unwrap(), 0);

        let bids = server.query_get_bids(bidder.clone()).await.unwrap();
        assert_eq!(bids.len(), 1);
        assert_eq!(bids[0].deposit, 30);
        assert!(!bids[0].revealed);

        server.admin_set_timestamp(u64::MAX).await.unwrap();
        assert!(server.auction_bid(params).await.is_err());
        assert_eq!(server.chain_get_balance(bidder.clone()).await.unwrap(), 20);

        let response = server.query_auction(AuctionQuery::IsEnded).await.unwrap();
        assert_eq!(response, AuctionQueryResponse::Ended(false));
        assert_eq!(server.query_get_pending_return(bidder).await.unwrap(), 0);
        assert_eq!(server.query_get_events().await.unwrap().len(), 0);
        assert!(server.query_get_result().await.unwrap().is_none());
    }
}
