//! Builds the supply tree from one refresh worth of raw payloads.
//!
//! All-or-nothing: the caller only gets a tree that passed the structural
//! self-check, never a partially populated one.

use std::collections::HashMap;

use crate::buckets::{self, BUCKET_LABELS, E8S_PER_TOKEN};
use crate::errors::MetricsError;
use crate::fetch::RawMetrics;
use crate::logging::{self, obj, v_num, Domain, Level};
use crate::model::SupplyTree;

pub fn build_tree(raw: &RawMetrics) -> Result<SupplyTree, MetricsError> {
    let dissolving = buckets::aggregate(&raw.dissolving_neurons)?;
    let locked = buckets::aggregate(&raw.locked_neurons)?;
    let dissolving_maturity = buckets::aggregate(&raw.dissolving_maturity)?;
    let locked_maturity = buckets::aggregate(&raw.locked_maturity)?;

    let total_supply = raw.total_supply_e8s as f64 / E8S_PER_TOKEN;
    let circulating = raw.circulating_supply_e8s as f64 / E8S_PER_TOKEN;
    let staked_total = raw.daily.governance_total_locked_e8s as f64 / E8S_PER_TOKEN;

    // Rewards = accrued maturity plus the staked portion; the unlocked row is
    // whatever is not staked back.
    let staked_maturity =
        raw.daily.governance_total_staked_maturity_e8s_equivalent as f64 / E8S_PER_TOKEN;
    let rewards_total = raw.total_maturity_e8s as f64 / E8S_PER_TOKEN + staked_maturity;
    let rewards_unlocked = rewards_total - staked_maturity;

    let burned_fees = raw.daily.icp_burned_fees as f64 / E8S_PER_TOKEN;
    let burned_cycles = raw.daily.total_cycle_burn_till_date as f64 / E8S_PER_TOKEN;

    let mut values: HashMap<String, f64> = HashMap::new();
    values.insert("total".to_string(), total_supply);
    values.insert("liquid".to_string(), circulating);
    values.insert("staked".to_string(), staked_total);
    let unlocking_total = insert_buckets(&mut values, "staked.unlocking", &dissolving);
    values.insert("staked.unlocking".to_string(), unlocking_total);
    let locked_total = insert_buckets(&mut values, "staked.locked", &locked);
    values.insert("staked.locked".to_string(), locked_total);
    values.insert("rewards".to_string(), rewards_total);
    values.insert("rewards.unlocked".to_string(), rewards_unlocked);
    let maturity_unlocking = insert_buckets(&mut values, "rewards.unlocking", &dissolving_maturity);
    values.insert("rewards.unlocking".to_string(), maturity_unlocking);
    let maturity_locked = insert_buckets(&mut values, "rewards.locked", &locked_maturity);
    values.insert("rewards.locked".to_string(), maturity_locked);
    values.insert("burned".to_string(), burned_fees + burned_cycles);
    values.insert("burned.fees".to_string(), burned_fees);
    values.insert("burned.cycles".to_string(), burned_cycles);
    // Community and allocation rows have no data source yet; the canonical
    // shape keeps them as zero placeholders.

    let tree = SupplyTree::from_values(&values);
    tree.verify()?;

    logging::log(
        Level::Info,
        Domain::Build,
        "tree_built",
        obj(&[
            ("total_supply", v_num(total_supply)),
            ("staked", v_num(staked_total)),
            ("rewards", v_num(rewards_total)),
            ("burned", v_num(burned_fees + burned_cycles)),
        ]),
    );

    Ok(tree)
}

/// Write the nine bucket rows under `prefix` and return their sum.
fn insert_buckets(values: &mut HashMap<String, f64>, prefix: &str, amounts: &[f64; 9]) -> f64 {
    let mut sum = 0.0;
    for (label, amount) in BUCKET_LABELS.iter().zip(amounts) {
        values.insert(format!("{}.{}", prefix, label), *amount);
        sum += amount;
    }
    sum
}
