//! # Purse Distribution Report
//!
//! Mints a batch of purses from a category config, redeems all of them and
//! prints how the tiers and rewards came out against the configured weights.
//!
//! Usage: `purse_distribution [config.toml] [quantity] [seed]`

use std::process;
use std::sync::Arc;

use alloy_primitives::Address;
use purse_economy::sampling::expected_reward_centi;
use purse_economy::{ChaChaRandomizer, Purse, PurseConfig, PurseResult, RewardKind, RewardShop};

const DEFAULT_CONFIG: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/purse_categories.toml");
const DEFAULT_QUANTITY: u32 = 100;
const DEFAULT_SEED: u64 = 0x5EED;

fn main() {
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         PURSE DISTRIBUTION REPORT                                ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    let args: Vec<String> = std::env::args().collect();
    let config_path = args.get(1).map_or(DEFAULT_CONFIG, String::as_str);
    let quantity = args
        .get(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_QUANTITY);
    let seed = args
        .get(3)
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SEED);

    println!("Config:   {config_path}");
    println!("Quantity: {quantity}");
    println!("Seed:     {seed}");
    println!();

    if let Err(e) = run(config_path, quantity, seed) {
        println!("Error: {e}");
        process::exit(1);
    }
}

#[allow(clippy::cast_precision_loss)]
fn run(config_path: &str, quantity: u32, seed: u64) -> PurseResult<()> {
    let owner = Address::with_last_byte(1);
    let minter = Address::with_last_byte(2);
    let buyer = Address::with_last_byte(3);

    let config = PurseConfig::from_file(config_path)?;
    let shop = Arc::new(RewardShop::with_default_types());
    for kind in RewardKind::ALL {
        let token_id = config.reward_tokens.get(kind);
        if shop.token_uri(token_id).is_none() {
            shop.register_token_type(token_id, kind.to_string());
        }
    }

    let purse = Purse::from_config(
        owner,
        &config,
        Box::new(ChaChaRandomizer::seed_from_u64(Address::with_last_byte(4), seed)),
        shop.clone(),
    )?;
    purse.grant_minter(owner, minter)?;

    let ids = purse.mint(minter, buyer, quantity)?;

    println!("┌─ TIERS ──────────────────────────────────────────────────────────┐");
    for category in purse.categories() {
        let observed = category.minted as f64 * 100.0 / f64::from(quantity);
        println!(
            "│ {:<12} weight {:>3}%   minted {:>6}   observed {:>6.2}%",
            category.name, category.rarity, category.minted, observed
        );
    }
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();

    let mut expected_centi = [0u64; 3];
    for id in &ids {
        let redemption = purse.redeem(buyer, *id)?;
        let category = purse.category(redemption.category)?;
        for kind in RewardKind::ALL {
            let slot = &mut expected_centi[kind.index()];
            *slot = slot.saturating_add(expected_reward_centi(&category, kind));
        }
    }

    println!("┌─ REWARDS ────────────────────────────────────────────────────────┐");
    for kind in RewardKind::ALL {
        let received = shop.balance_of(buyer, config.reward_tokens.get(kind));
        println!(
            "│ {:<16} received {:>8}   expected {:>10.1}",
            kind.to_string(),
            received,
            expected_centi[kind.index()] as f64 / 100.0
        );
    }
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();
    println!("Events emitted: {}", purse.drain_events().len());

    Ok(())
}
