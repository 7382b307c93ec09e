//! Statistical checks of tier selection and reward payout.

use std::sync::Arc;

use alloy_primitives::Address;
use purse_economy::sampling::expected_reward_centi;
use purse_economy::{ChaChaRandomizer, Purse, PurseConfig, RewardKind, RewardShop, ScriptedRandomizer};

const REFERENCE_CONFIG: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/purse_categories.toml");

fn owner() -> Address {
    Address::with_last_byte(0x01)
}

fn minter() -> Address {
    Address::with_last_byte(0x02)
}

fn buyer() -> Address {
    Address::with_last_byte(0x03)
}

fn setup(randomizer: Box<dyn purse_economy::Randomizer>) -> (Purse, Arc<RewardShop>) {
    let config = PurseConfig::from_file(REFERENCE_CONFIG).unwrap();
    let shop = Arc::new(RewardShop::with_default_types());
    let purse = Purse::from_config(owner(), &config, randomizer, shop.clone()).unwrap();
    purse.grant_minter(owner(), minter()).unwrap();
    (purse, shop)
}

#[test]
fn test_every_draw_maps_to_its_bucket() {
    // Walking every draw in [0, 100) once hits each tier exactly its weight.
    let (purse, _) = setup(Box::new(ScriptedRandomizer::new(Address::ZERO, 0..100)));

    purse.mint(minter(), buyer(), 100).unwrap();

    let minted: Vec<u64> = purse.categories().iter().map(|c| c.minted).collect();
    assert_eq!(minted, vec![45, 25, 20, 7, 3]);
}

#[test]
fn test_tier_frequencies_match_weights() {
    let (purse, _) = setup(Box::new(ChaChaRandomizer::from_seed(Address::ZERO, [0x5E; 32])));
    let mints = 10_000u64;

    for _ in 0..10 {
        purse.mint(minter(), buyer(), 1_000).unwrap();
    }

    for category in purse.categories() {
        let expected = mints * u64::from(category.rarity) / 100;
        let diff = category.minted.abs_diff(expected);
        println!(
            "{:<12} expected {:>5} observed {:>5}",
            category.name, expected, category.minted
        );
        // Two percentage points, four standard deviations for the widest tier.
        assert!(
            diff <= mints / 50,
            "{}: observed {} vs expected {}",
            category.name,
            category.minted,
            expected
        );
    }
}

#[test]
fn test_reward_totals_track_expectation() {
    let (purse, shop) = setup(Box::new(ChaChaRandomizer::from_seed(Address::ZERO, [0xA7; 32])));
    let ids = purse.mint(minter(), buyer(), 10_000).unwrap();

    let mut expected_centi = [0u64; 3];
    for id in ids {
        let redemption = purse.redeem(buyer(), id).unwrap();
        let category = purse.category(redemption.category).unwrap();
        for kind in RewardKind::ALL {
            let slot = &mut expected_centi[kind.index()];
            *slot = slot.saturating_add(expected_reward_centi(&category, kind));
        }
    }

    for kind in RewardKind::ALL {
        let received = shop.balance_of(buyer(), kind.index() as u64);
        let expected = expected_centi[kind.index()] / 100;
        println!("{kind}: received {received}, expected {expected}");
        // Within 15% of the expectation given the drawn tiers.
        assert!(
            received.abs_diff(expected) * 100 <= expected * 15,
            "{kind}: received {received} vs expected {expected}"
        );
    }
    assert_eq!(purse.balance_of(buyer()), 0);
}
