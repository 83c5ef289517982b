//! Challenge evaluation simulation.
//!
//! Walks through the canonical challenge lifecycles: a daily drawdown breach,
//! a funded account, an out-of-order trade, two writers racing on one
//! challenge, and a daily reset across UTC midnight.

use challenge_core::*;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal_macros::dec;
use std::error::Error;
use tracing_subscriber::EnvFilter;

type SimResult = Result<(), Box<dyn Error>>;

fn main() -> SimResult {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("Prop Challenge Engine Simulation");
    println!("$10,000 account, 5% daily / 10% total drawdown, 10% target\n");

    scenario_1_daily_breach()?;
    scenario_2_funded()?;
    scenario_3_out_of_order()?;
    scenario_4_racing_writers()?;
    scenario_5_daily_reset()?;

    println!("\nAll simulations completed successfully.");
    Ok(())
}

fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, day, hour, minute, 0)
        .single()
        .unwrap_or_default()
}

fn fresh(id: u64) -> Challenge {
    create_challenge(
        ChallengeId(id),
        TraderId(42),
        ChallengeTier::Starter.params(),
        at(1, 0, 0),
    )
}

fn print_events(events: &EventBatch) {
    for event in events {
        match &event.payload {
            EventPayload::StatusChanged(e) => {
                println!("    v{} status {} -> {} ({})", event.version, e.from, e.to, e.reason)
            }
            EventPayload::TradeApplied(e) => println!(
                "    v{} {} {} pnl {} equity {}",
                event.version, e.trade_id, e.symbol, e.pnl, e.equity_after
            ),
            EventPayload::Failed(e) => println!(
                "    v{} FAILED by {}: {} > {}",
                event.version, e.rule_id, e.metric_value, e.limit_value
            ),
            EventPayload::Funded(e) => {
                println!("    v{} FUNDED with {} profit", event.version, e.metric_value)
            }
        }
    }
}

/// One losing trade takes 6% in a day.
fn scenario_1_daily_breach() -> SimResult {
    println!("Scenario 1: Daily Drawdown Breach\n");

    let challenge = fresh(1);
    let trade = Trade::new(TradeId(1), "EURUSD", PnL::new(dec!(-600))?, at(1, 14, 0))?;
    let outcome = apply_trade(&challenge, &trade, challenge.version())?;

    print_events(&outcome.events);
    println!("  Final status: {}\n", outcome.challenge.status());
    Ok(())
}

/// One winning trade clears the 10% target.
fn scenario_2_funded() -> SimResult {
    println!("Scenario 2: Profit Target\n");

    let challenge = fresh(2);
    let trade = Trade::new(TradeId(1), "XAUUSD", PnL::new(dec!(1100))?, at(1, 15, 0))?;
    let outcome = apply_trade(&challenge, &trade, challenge.version())?;

    print_events(&outcome.events);
    println!("  Final status: {}\n", outcome.challenge.status());

    let late = Trade::new(TradeId(2), "XAUUSD", PnL::new(dec!(10))?, at(1, 16, 0))?;
    if let Err(e) = apply_trade(&outcome.challenge, &late, outcome.challenge.version()) {
        println!("  Further trade rejected: {e}\n");
    }
    Ok(())
}

/// A trade stamped before the last accepted one.
fn scenario_3_out_of_order() -> SimResult {
    println!("Scenario 3: Out-of-Order Trade\n");

    let challenge = fresh(3);
    let first = Trade::new(TradeId(1), "GBPUSD", PnL::new(dec!(50))?, at(1, 12, 0))?;
    let outcome = apply_trade(&challenge, &first, 0)?;

    let stale = Trade::new(TradeId(2), "GBPUSD", PnL::new(dec!(50))?, at(1, 11, 59))?;
    match apply_trade(&outcome.challenge, &stale, outcome.challenge.version()) {
        Ok(_) => println!("  unexpected: stale trade accepted"),
        Err(e) => println!("  Rejected ({:?}): {e}", e.kind()),
    }
    println!("  Version still {}\n", outcome.challenge.version());
    Ok(())
}

/// Two writers read version 3, both evaluate, only one swap lands.
fn scenario_4_racing_writers() -> SimResult {
    println!("Scenario 4: Concurrent Writers\n");

    let mut challenge = fresh(4);
    for i in 1..=3u64 {
        let trade = Trade::new(TradeId(i), "US30", PnL::new(dec!(25))?, at(2, 9 + i as u32, 0))?;
        challenge = apply_trade(&challenge, &trade, challenge.version())?.challenge;
    }

    let slot = VersionedSlot::new(challenge);
    let snapshot = slot.load();
    println!("  Both writers read version {}", snapshot.version());

    let a = Trade::new(TradeId(10), "US30", PnL::new(dec!(40))?, at(2, 14, 0))?;
    let b = Trade::new(TradeId(11), "US30", PnL::new(dec!(-40))?, at(2, 14, 1))?;

    let out_a = apply_trade(&snapshot, &a, snapshot.version())?;
    let out_b = apply_trade(&snapshot, &b, snapshot.version())?;

    slot.compare_and_swap(snapshot.version(), out_a.challenge)?;
    println!("  Writer A stored version {}", slot.version());

    if let Err(e) = slot.compare_and_swap(snapshot.version(), out_b.challenge) {
        println!("  Writer B swap rejected: {e}");
    }

    let current = slot.load();
    if let Err(e) = apply_trade(&current, &b, snapshot.version()) {
        println!("  Writer B retry with stale version rejected: {e}");
    }
    let retried = apply_trade(&current, &b, current.version())?;
    slot.compare_and_swap(current.version(), retried.challenge)?;
    println!("  Writer B re-read and stored version {}\n", slot.version());
    Ok(())
}

/// A trade after midnight starts a new daily window from the carried equity.
fn scenario_5_daily_reset() -> SimResult {
    println!("Scenario 5: Daily Reset\n");

    let challenge = fresh(5);
    let day_one = Trade::new(TradeId(1), "EURUSD", PnL::new(dec!(-400))?, at(1, 23, 0))?;
    let after_one = apply_trade(&challenge, &day_one, 0)?.challenge;

    let day_two = Trade::new(TradeId(2), "EURUSD", PnL::new(dec!(-400))?, at(2, 0, 30))?;
    let after_two = apply_trade(&after_one, &day_two, after_one.version())?.challenge;

    let metrics = after_two.metrics()?;
    println!(
        "  Day start {} equity {} daily dd {} total dd {}",
        after_two.daily_start_equity(),
        after_two.current_equity(),
        metrics.daily_drawdown,
        metrics.total_drawdown
    );
    println!("  Status: {}", after_two.status());
    Ok(())
}
