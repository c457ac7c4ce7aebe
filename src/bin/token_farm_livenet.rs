//! Livenet deploy and demo binary for the Token Farm.
//!
//! Run with:
//! - Deploy only:       TOKEN_FARM_LIVENET_MODE=deploy cargo run --bin token_farm_livenet --features=livenet
//! - Deploy + demo:     TOKEN_FARM_LIVENET_MODE=deploy_and_demo cargo run --bin token_farm_livenet --features=livenet
//! - Issue rewards:     TOKEN_FARM_LIVENET_MODE=issue TOKEN_FARM_EXISTING_DAPP=... TOKEN_FARM_EXISTING_FARM=... cargo run ...
//! - Query position:    TOKEN_FARM_LIVENET_MODE=query TOKEN_FARM_EXISTING_DAPP=... TOKEN_FARM_EXISTING_FARM=... cargo run ...
//!
//! Required environment variables (Odra livenet):
//! - ODRA_CASPER_LIVENET_SECRET_KEY_PATH
//! - ODRA_CASPER_LIVENET_NODE_ADDRESS        (base URL; Odra appends "/rpc")
//! - ODRA_CASPER_LIVENET_EVENTS_URL          (required by Odra; placeholder URL is OK here)
//! - ODRA_CASPER_LIVENET_CHAIN_NAME
//!
//! Optional:
//! - ODRA_CASPER_LIVENET_DEPLOY_GAS          (motes)
//! - ODRA_CASPER_LIVENET_CALL_GAS            (motes)
//! - TOKEN_FARM_EXISTING_DAPP                (64-hex or formatted "hash-..."/"contract-package-...")
//! - TOKEN_FARM_EXISTING_FARM                (same format)
//! - TOKEN_FARM_WETH_TOKEN / TOKEN_FARM_FAU_TOKEN            (address book; mock deployed if unset)
//! - TOKEN_FARM_ETH_USD_FEED / TOKEN_FARM_DAI_USD_FEED       (address book; mock deployed if unset)
//! - TOKEN_FARM_KEPT_BALANCE                 (whole DAPP kept by the deployer; default: 100)
//! - TOKEN_FARM_MOCK_FEED_DECIMALS           (default: 8)
//! - TOKEN_FARM_MOCK_ETH_USD                 (whole USD; default: 2000)
//! - TOKEN_FARM_MOCK_DAI_USD                 (whole USD; default: 1)
//! - TOKEN_FARM_DEMO_STAKE_DAPP              (whole DAPP staked in demo mode; default: 1)

use odra::host::{Deployer, HostEnv, HostRef, HostRefLoader};
use odra::prelude::*;
use odra::casper_types::U256;

use token_farm::price_feed::{MockV3Aggregator, MockV3AggregatorInitArgs};
use token_farm::token_farm::{TokenFarm, TokenFarmHostRef, TokenFarmInitArgs};
use token_farm::tokens::{
    DappToken, DappTokenHostRef, DappTokenInitArgs, MockToken, MockTokenInitArgs,
    DAPP_DECIMALS, DAPP_INITIAL_SUPPLY,
};

const MOTES_PER_CSPR: u64 = 1_000_000_000;

const DEFAULT_DEPLOY_GAS_MOTES: u64 = 450_000_000_000; // 450 CSPR
const DEFAULT_CALL_GAS_MOTES: u64 = 50_000_000_000; // 50 CSPR

/// Settings read from the environment
struct LivenetConfig {
    mode: String,
    deploy_gas: u64,
    call_gas: u64,
    existing_dapp: Option<String>,
    existing_farm: Option<String>,
    weth_token: Option<String>,
    fau_token: Option<String>,
    eth_usd_feed: Option<String>,
    dai_usd_feed: Option<String>,
    kept_balance: u64,
    mock_feed_decimals: u8,
    mock_eth_usd: u64,
    mock_dai_usd: u64,
    demo_stake_dapp: u64,
}

impl LivenetConfig {
    fn from_env() -> Self {
        Self {
            mode: std::env::var("TOKEN_FARM_LIVENET_MODE").unwrap_or_else(|_| "deploy".to_string()),
            deploy_gas: read_u64_env("ODRA_CASPER_LIVENET_DEPLOY_GAS", DEFAULT_DEPLOY_GAS_MOTES),
            call_gas: read_u64_env("ODRA_CASPER_LIVENET_CALL_GAS", DEFAULT_CALL_GAS_MOTES),
            existing_dapp: read_opt_env("TOKEN_FARM_EXISTING_DAPP"),
            existing_farm: read_opt_env("TOKEN_FARM_EXISTING_FARM"),
            weth_token: read_opt_env("TOKEN_FARM_WETH_TOKEN"),
            fau_token: read_opt_env("TOKEN_FARM_FAU_TOKEN"),
            eth_usd_feed: read_opt_env("TOKEN_FARM_ETH_USD_FEED"),
            dai_usd_feed: read_opt_env("TOKEN_FARM_DAI_USD_FEED"),
            kept_balance: read_u64_env("TOKEN_FARM_KEPT_BALANCE", 100),
            mock_feed_decimals: read_u64_env("TOKEN_FARM_MOCK_FEED_DECIMALS", 8) as u8,
            mock_eth_usd: read_u64_env("TOKEN_FARM_MOCK_ETH_USD", 2000),
            mock_dai_usd: read_u64_env("TOKEN_FARM_MOCK_DAI_USD", 1),
            demo_stake_dapp: read_u64_env("TOKEN_FARM_DEMO_STAKE_DAPP", 1),
        }
    }
}

/// Whole units to base units
fn whole(amount: u64, decimals: u8) -> U256 {
    U256::from(amount) * U256::from(10u64).pow(U256::from(decimals))
}

fn main() {
    println!("============================================");
    println!("  Token Farm — Livenet");
    println!("============================================\n");

    let env = odra_casper_livenet_env::env();
    let config = LivenetConfig::from_env();

    let should_deploy = config.mode == "deploy" || config.mode == "deploy_and_demo";
    let should_demo = config.mode == "deploy_and_demo";
    let should_issue = config.mode == "issue";
    let should_query = config.mode == "query";

    println!("[INFO] Mode: {}", config.mode);
    println!("[INFO] Caller: {:?}", env.caller());
    println!(
        "[INFO] Gas (motes): deploy={} ({} CSPR), calls={} ({} CSPR)",
        config.deploy_gas,
        config.deploy_gas / MOTES_PER_CSPR,
        config.call_gas,
        config.call_gas / MOTES_PER_CSPR
    );
    println!();

    // ==========================================
    // Step 1: Deploy (or reuse) DAPP
    // ==========================================
    let mut dapp = if should_deploy {
        println!("[STEP 1] Deploying DAPP token...");
        env.set_gas(config.deploy_gas);
        let dapp = DappToken::deploy(
            &env,
            DappTokenInitArgs {
                initial_supply: U256::from(DAPP_INITIAL_SUPPLY),
            },
        );
        println!("[OK] DAPP deployed at: {:?}", dapp.address());
        println!("     Total supply: {}", dapp.total_supply());
        println!();
        dapp
    } else {
        println!("[STEP 1] Reusing existing DAPP token...");
        let raw = config
            .existing_dapp
            .clone()
            .unwrap_or_else(|| panic!("TOKEN_FARM_EXISTING_DAPP must be set for mode={}", config.mode));
        let addr = parse_contract_address(&raw);
        println!("[OK] DAPP: {:?}", addr);
        println!();
        DappToken::load(&env, addr)
    };
    let dapp_addr = dapp.address();

    // ==========================================
    // Step 2: Deploy (or reuse) the farm
    // ==========================================
    let mut farm = if should_deploy {
        println!("[STEP 2] Deploying TokenFarm...");
        env.set_gas(config.deploy_gas);
        let farm = TokenFarm::deploy(&env, TokenFarmInitArgs { dapp_token: dapp_addr });
        println!("[OK] TokenFarm deployed at: {:?}", farm.address());
        println!();
        farm
    } else {
        println!("[STEP 2] Reusing existing TokenFarm...");
        let raw = config
            .existing_farm
            .clone()
            .unwrap_or_else(|| panic!("TOKEN_FARM_EXISTING_FARM must be set for mode={}", config.mode));
        let addr = parse_contract_address(&raw);
        println!("[OK] TokenFarm: {:?}", addr);
        println!();
        TokenFarm::load(&env, addr)
    };
    let farm_addr = farm.address();

    if should_deploy {
        // ==========================================
        // Step 3: Fund the reward reserve
        // ==========================================
        let kept = whole(config.kept_balance, DAPP_DECIMALS);
        let supply = dapp.total_supply();
        let reserve = supply.saturating_sub(kept);
        println!("[STEP 3] Funding farm reserve with {} DAPP base units (keeping {})...", reserve, kept);
        env.set_gas(config.call_gas);
        dapp.transfer(farm_addr, reserve);
        println!("[OK] Farm reserve: {}", dapp.balance_of(farm_addr));
        println!();

        // ==========================================
        // Step 4: Allow tokens and bind price feeds
        // ==========================================
        println!("[STEP 4] Resolving tokens and price feeds...");
        let dai_usd_feed = resolve_price_feed(&env, &config, config.dai_usd_feed.as_deref(), config.mock_dai_usd, "DAI/USD");
        let eth_usd_feed = resolve_price_feed(&env, &config, config.eth_usd_feed.as_deref(), config.mock_eth_usd, "ETH/USD");
        let fau_token = resolve_token(&env, &config, config.fau_token.as_deref(), "Faucet DAI", "FAU");
        let weth_token = resolve_token(&env, &config, config.weth_token.as_deref(), "Wrapped Ether", "WETH");

        for (token, feed, label) in [
            (dapp_addr, dai_usd_feed, "DAPP"),
            (fau_token, dai_usd_feed, "FAU"),
            (weth_token, eth_usd_feed, "WETH"),
        ] {
            env.set_gas(config.call_gas);
            farm.add_allowed_token_with_feed(token, feed);
            println!("[OK] Allowed {} ({:?}) with feed {:?}", label, token, feed);
        }
        println!("     Allowed tokens: {}", farm.allowed_tokens_count());
        println!();
    }

    // ==========================================
    // Demo: stake DAPP -> issue -> print
    // ==========================================
    if should_demo {
        let caller = env.caller();
        let amount = whole(config.demo_stake_dapp, DAPP_DECIMALS);

        println!("[DEMO 1] Staking {} DAPP...", config.demo_stake_dapp);
        env.set_gas(config.call_gas);
        dapp.approve(farm_addr, amount);
        env.set_gas(config.call_gas);
        farm.stake_tokens(amount, dapp_addr);
        println!("[OK] Stake complete.");
        print_position_info(&farm, caller, &dapp);

        println!("[DEMO 2] Issuing rewards...");
        env.set_gas(config.call_gas);
        farm.issue_tokens();
        println!("[OK] Issuance complete.");
        print_position_info(&farm, caller, &dapp);
    }

    if should_issue {
        println!("[ISSUE] Issuing rewards to {} stakers...", farm.stakers_count());
        env.set_gas(config.call_gas);
        farm.issue_tokens();
        println!("[OK] Issuance complete. Farm reserve left: {}", dapp.balance_of(farm_addr));
        println!();
    }

    // ==========================================
    // Query mode: Output position as JSON
    // ==========================================
    if should_query {
        let query_user = env.caller();
        let unique = farm.unique_tokens_staked(query_user);
        let total_value = if unique == 0 {
            U256::zero()
        } else {
            farm.get_user_total_value(query_user)
        };
        let balances: Vec<String> = (0..farm.allowed_tokens_count())
            .filter_map(|i| farm.allowed_tokens(i))
            .map(|token| {
                format!(
                    "{{\"token\":\"{}\",\"balance\":\"{}\"}}",
                    format_address_hash(&token),
                    farm.staking_balance(token, query_user)
                )
            })
            .collect();

        println!(
            "TOKEN_FARM_POSITION_JSON={{\"user\":\"{:?}\",\"unique_tokens_staked\":{},\"total_value\":\"{}\",\"dapp_balance\":\"{}\",\"stakes\":[{}]}}",
            query_user,
            unique,
            total_value,
            dapp.balance_of(query_user),
            balances.join(",")
        );
        return;
    }

    output_deploy_json(dapp_addr, farm_addr);
}

/// Address book entry if configured, otherwise a freshly deployed mock feed
fn resolve_price_feed(env: &HostEnv, config: &LivenetConfig, configured: Option<&str>, mock_usd: u64, label: &str) -> Address {
    if let Some(raw) = configured {
        let addr = parse_contract_address(raw);
        println!("     {} feed from address book: {:?}", label, addr);
        return addr;
    }
    println!("     Deploying mock {} feed ({} USD, {} decimals)...", label, mock_usd, config.mock_feed_decimals);
    env.set_gas(config.deploy_gas);
    let feed = MockV3Aggregator::deploy(
        env,
        MockV3AggregatorInitArgs {
            decimals: config.mock_feed_decimals,
            initial_answer: whole(mock_usd, config.mock_feed_decimals),
        },
    );
    feed.address()
}

/// Address book entry if configured, otherwise a freshly deployed mock token
fn resolve_token(env: &HostEnv, config: &LivenetConfig, configured: Option<&str>, name: &str, symbol: &str) -> Address {
    if let Some(raw) = configured {
        let addr = parse_contract_address(raw);
        println!("     {} token from address book: {:?}", symbol, addr);
        return addr;
    }
    println!("     Deploying mock {} token...", symbol);
    env.set_gas(config.deploy_gas);
    let token = MockToken::deploy(
        env,
        MockTokenInitArgs {
            name: name.to_string(),
            symbol: symbol.to_string(),
            decimals: 18,
        },
    );
    token.address()
}

fn print_position_info(farm: &TokenFarmHostRef, user: Address, dapp: &DappTokenHostRef) {
    for index in 0..farm.allowed_tokens_count() {
        if let Some(token) = farm.allowed_tokens(index) {
            println!("     staked {:?}: {}", token, farm.staking_balance(token, user));
        }
    }
    println!("     unique_tokens_staked: {}", farm.unique_tokens_staked(user));
    println!("     stakers_count: {}", farm.stakers_count());
    println!("     user DAPP balance: {}", dapp.balance_of(user));
    println!("     farm DAPP balance: {}", dapp.balance_of(farm.address()));
    println!();
}

fn read_u64_env(name: &str, default_value: u64) -> u64 {
    match std::env::var(name) {
        Ok(raw) => {
            let cleaned = raw.trim().replace('_', "");
            cleaned.parse::<u64>().unwrap_or(default_value)
        }
        Err(_) => default_value,
    }
}

fn read_opt_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn output_deploy_json(dapp_addr: Address, farm_addr: Address) {
    let chain_name =
        std::env::var("ODRA_CASPER_LIVENET_CHAIN_NAME").unwrap_or_else(|_| "casper-test".to_string());
    let node_url = std::env::var("ODRA_CASPER_LIVENET_NODE_ADDRESS")
        .unwrap_or_else(|_| "https://node.testnet.casper.network".to_string());

    println!(
        r#"TOKEN_FARM_DEPLOY_JSON={{"chain_name":"{}","node_url":"{}","dapp_contract_hash":"{}","token_farm_contract_hash":"{}","deployed_at":"{}"}}"#,
        chain_name,
        node_url,
        format_address_hash(&dapp_addr),
        format_address_hash(&farm_addr),
        chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
    );
}

fn format_address_hash(addr: &Address) -> String {
    let debug_str = format!("{:?}", addr);
    if let (Some(start), Some(end)) = (debug_str.find('['), debug_str.rfind(']')) {
        return debug_str[start + 1..end]
            .split(", ")
            .filter_map(|part| part.strip_prefix("0x").or_else(|| part.strip_prefix("0X")))
            .collect();
    }
    debug_str
}

fn parse_contract_address(raw: &str) -> Address {
    use odra::casper_types::account::AccountHash;
    use odra::casper_types::contracts::ContractPackageHash;

    fn decode_hex_32(s: &str) -> [u8; 32] {
        if s.len() != 64 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            panic!("Invalid address hash (expected 64 hex): {}", s);
        }
        let mut out = [0u8; 32];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .unwrap_or_else(|_| panic!("Invalid hex in address: {}", s));
        }
        out
    }

    let trimmed = raw.trim();
    if let Some(hex) = trimmed.strip_prefix("account-hash-") {
        return Address::Account(AccountHash::new(decode_hex_32(hex)));
    }
    let hex = ["contract-package-", "package-", "hash-"]
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .unwrap_or(trimmed);
    if hex.len() == 64 {
        return Address::Contract(ContractPackageHash::new(decode_hex_32(hex)));
    }

    panic!("Invalid address format: {}", trimmed);
}
