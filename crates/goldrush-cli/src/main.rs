// ============================================================================
// goldrush: command-line access to a Gold Rush Miner player store
// ============================================================================
// Usage:
//   goldrush catalog                         List shop items and prices
//   goldrush inventory                       Show held items
//   goldrush progress                        Show today's reward progress
//   goldrush grant <item> [--quantity N]     Credit an item or pack
//   goldrush use <item>                      Spend one unit (precision activates)
//   goldrush record-game <score>             Record a finished game's score
//   goldrush play [--seed N]                 Simulate one session headlessly
//   goldrush mute <on|off>                   Toggle sound
//   goldrush export                          Dump every stored key as JSON
//   goldrush reset --yes                     Wipe the store
// ============================================================================

use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use goldrush_core::catalog::{self, items, PRICE_TOKEN_SYMBOL};
use goldrush_core::game::playfield::{ItemType, TICKS_PER_SECOND};
use goldrush_core::summary::{InventorySummary, ProgressSummary};
use goldrush_core::{
    GameConfig, GameResult, GameSession, GameStore, PowerUpKind, RedbStore, SimulatedClock,
    StoreSummary,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tracing::info;

/// Gold Rush Miner store tool
#[derive(Parser)]
#[command(name = "goldrush", version, about = "Inspect and manage a Gold Rush Miner player store")]
struct Cli {
    /// Path to the store file (default: ~/.goldrush/store.redb)
    #[arg(long, global = true)]
    db_path: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List shop items with prices and contents
    Catalog,

    /// Show held items and precision uses
    Inventory,

    /// Show today's points, games and claimable tiers
    Progress,

    /// Credit a catalog item (packs are unpacked) without payment
    Grant {
        item: String,

        #[arg(long, default_value = "1")]
        quantity: u32,
    },

    /// Spend one unit of an item
    Use { item: String },

    /// Record a finished game's final score
    RecordGame { score: u64 },

    /// Play one simulated session with an automatic tapper. Power-ups expire
    /// on simulated time and the cooldown counts from the simulated end.
    Play {
        /// Seed for spawns and taps (random when omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Chance that the tapper hits something each second
        #[arg(long, default_value = "0.8")]
        accuracy: f64,

        /// Detonate TNT whenever three or more rocks are falling
        #[arg(long)]
        use_tnt: bool,

        /// Spend a timer boost at the start if one is held
        #[arg(long)]
        use_timer: bool,
    },

    /// Turn sound on or off
    Mute { state: String },

    /// Export every stored key plus a summary as JSON
    Export,

    /// Delete all stored state
    Reset {
        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("goldrush=info".parse()?)
                .add_directive("goldrush_core=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = GameConfig::load();
    if cli.db_path.is_some() {
        config.db_path = cli.db_path.clone();
    }

    let kv = Arc::new(RedbStore::open(config.db_path.as_deref())?);
    info!("Using store at {}", kv.path().display());
    // Wall time until `play` advances it
    let clock = Arc::new(SimulatedClock::new());
    let mut store = GameStore::open(kv, clock.clone(), &config);

    let result = match cli.command {
        Commands::Catalog => cmd_catalog(),
        Commands::Inventory => cmd_inventory(&store),
        Commands::Progress => cmd_progress(&mut store),
        Commands::Grant { item, quantity } => cmd_grant(&mut store, &item, quantity),
        Commands::Use { item } => cmd_use(&mut store, &item),
        Commands::RecordGame { score } => cmd_record_game(&mut store, score),
        Commands::Play {
            seed,
            accuracy,
            use_tnt,
            use_timer,
        } => cmd_play(
            &mut store,
            &clock,
            PlayOptions {
                seed: seed.unwrap_or_else(|| rand::thread_rng().gen()),
                accuracy,
                use_tnt,
                use_timer,
            },
        ),
        Commands::Mute { state } => cmd_mute(&mut store, &state),
        Commands::Export => cmd_export(&mut store),
        Commands::Reset { yes } => return cmd_reset(&mut store, yes),
    };

    store.flush()?;
    result
}

fn cmd_catalog() -> Result<()> {
    println!("{:<16}  {:<14}  {:>6}  {}", "ID", "NAME", PRICE_TOKEN_SYMBOL, "CONTENTS");
    println!("{}", "-".repeat(80));
    for item in catalog::all() {
        let contents = item
            .credits()
            .iter()
            .map(|(id, quantity)| format!("{} x{}", id, quantity))
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "{:<16}  {:<14}  {:>6}  {}",
            item.id,
            item.name,
            item.price.to_string(),
            contents
        );
    }
    Ok(())
}

fn cmd_inventory(store: &GameStore) -> Result<()> {
    let inventory = InventorySummary::from_store(store);

    println!("=== Inventory ===");
    println!("TNT:            {}", inventory.tnt);
    println!("Timer boosts:   {}", inventory.timer_boosts);
    println!(
        "Precision:      {} packs ({} uses)",
        inventory.precision_packs, inventory.precision_uses
    );
    println!("Extra plays:    {}", inventory.extra_plays);
    Ok(())
}

fn cmd_progress(store: &mut GameStore) -> Result<()> {
    let summary = StoreSummary::collect(store);
    let progress: &ProgressSummary = &summary.progress;

    println!("=== Daily Progress ({}) ===", progress.day);
    println!(
        "Level 1: {}/{} points ({}%){}",
        progress.points_today,
        progress.points_target,
        progress.tier1_percent,
        claim_marker(progress.claimed_tier1, progress.eligibility.tier1)
    );
    println!(
        "Level 2: {}/{} high-score games ({}%){}",
        progress.high_score_games_today,
        progress.high_score_games_target,
        progress.tier2_percent,
        claim_marker(progress.claimed_tier2, progress.eligibility.tier2)
    );
    println!("Games today: {}", progress.games_played_today);
    println!(
        "Streak: {} days (+{}% score)",
        summary.streak_days, summary.streak_bonus_pct
    );
    match &summary.next_free_game_in {
        Some(countdown) => println!("Next free game in {}", countdown),
        None => println!("Free game available"),
    }
    println!();
    println!("{}", progress.message);
    Ok(())
}

fn claim_marker(claimed: bool, claimable: bool) -> &'static str {
    match (claimed, claimable) {
        (true, _) => " [claimed]",
        (false, true) => " [claimable]",
        _ => "",
    }
}

fn cmd_grant(store: &mut GameStore, item_id: &str, quantity: u32) -> Result<()> {
    for (ledger_item, total) in grant_totals(item_id, quantity)? {
        store.credit(ledger_item, total);
        println!("+ {} x{} (now {})", ledger_item, total, store.quantity_of(ledger_item));
    }
    Ok(())
}

/// Ledger credits for `quantity` copies of a catalog item
fn grant_totals(item_id: &str, quantity: u32) -> Result<Vec<(&'static str, u32)>> {
    let credits = catalog::credits_for(item_id)
        .ok_or_else(|| anyhow!("Unknown item '{}'. Run `goldrush catalog` for ids.", item_id))?;
    if quantity == 0 {
        bail!("Quantity must be at least 1");
    }

    credits
        .into_iter()
        .map(|(ledger_item, count)| {
            count
                .checked_mul(quantity)
                .map(|total| (ledger_item, total))
                .ok_or_else(|| anyhow!("Quantity {} is too large for {}", quantity, item_id))
        })
        .collect()
}

fn cmd_use(store: &mut GameStore, item_id: &str) -> Result<()> {
    if item_id == items::PRECISION_PACK {
        let active = store
            .activate_power_up(PowerUpKind::Precision)
            .map_err(|e| anyhow!(e.user_message()))?;
        println!(
            "Precision active for {}s ({} uses left)",
            (active.expires_at - store.now_ms()) / 1000,
            store.precision_uses()
        );
        return Ok(());
    }

    if !store.consume_one(item_id) {
        bail!("You have no {} left.", item_id);
    }
    println!("Used {} ({} left)", item_id, store.quantity_of(item_id));
    Ok(())
}

fn cmd_record_game(store: &mut GameStore, score: u64) -> Result<()> {
    if score == 0 {
        println!("Score 0 is not recorded.");
        return Ok(());
    }
    store.record_game_result(score);
    println!("{}", store.progress().status_message());
    Ok(())
}

fn cmd_play(store: &mut GameStore, clock: &SimulatedClock, options: PlayOptions) -> Result<()> {
    let report = simulate_session(store, clock, &options)?;
    let result = report.result;

    println!("=== Game Over ===");
    println!("Seed:         {}", options.seed);
    println!("Simulated:    {}s", report.simulated_ms / 1000);
    println!("Precision:    {}s active", report.precision_secs);
    println!("Raw score:    {}", result.raw_score);
    println!(
        "Final score:  {} (+{}% streak, {} days)",
        result.final_score, result.bonus_pct, result.streak_days
    );
    if !result.recorded {
        println!("(score 0 not recorded)");
    }
    println!("{}", store.progress().status_message());
    Ok(())
}

struct PlayOptions {
    seed: u64,
    accuracy: f64,
    use_tnt: bool,
    use_timer: bool,
}

struct PlayReport {
    result: GameResult,
    simulated_ms: i64,
    precision_secs: u32,
}

/// Run one session at 60 frames per simulated second. The store clock is
/// advanced with every frame so power-ups expire on simulated time.
fn simulate_session(
    store: &mut GameStore,
    clock: &SimulatedClock,
    options: &PlayOptions,
) -> Result<PlayReport> {
    let mut tapper = StdRng::seed_from_u64(options.seed.wrapping_add(1));
    let mut session = GameSession::start_with_rng(store, StdRng::seed_from_u64(options.seed))
        .map_err(|e| anyhow!(e.user_message()))?;
    info!("Simulating session with seed {}", options.seed);

    if options.use_timer && store.quantity_of(items::TIMER_BOOST) > 0 {
        session
            .use_timer_boost(store)
            .map_err(|e| anyhow!(e.user_message()))?;
    }

    let ticks = TICKS_PER_SECOND as i64;
    let mut elapsed_ms: i64 = 0;
    let mut precision_secs = 0;
    loop {
        if store.is_power_up_active(PowerUpKind::Precision) {
            precision_secs += 1;
        }

        let second_start = elapsed_ms;
        for frame in 1..=ticks {
            session.spawn_due(elapsed_ms);
            session.advance_frame();
            let next = second_start + frame * 1000 / ticks;
            clock.advance_ms(next - elapsed_ms);
            elapsed_ms = next;
        }

        if options.use_tnt
            && rocks_falling(&session) >= 3
            && store.quantity_of(items::TNT_PACK) > 0
        {
            session.use_tnt(store).map_err(|e| anyhow!(e.user_message()))?;
        }

        if tapper.gen::<f64>() < options.accuracy {
            let target = session
                .playfield()
                .items()
                .iter()
                .filter(|item| item.kind != ItemType::Rock)
                .max_by(|a, b| a.y.total_cmp(&b.y))
                .map(|item| (item.x + item.width / 2.0, item.y + item.height / 2.0));
            if let Some((x, y)) = target {
                session.tap(store, x, y).map_err(|e| anyhow!(e.user_message()))?;
            }
        }

        if !session.tick_second() {
            break;
        }
    }

    let result = session.finish(store).map_err(|e| anyhow!(e.user_message()))?;
    Ok(PlayReport {
        result,
        simulated_ms: elapsed_ms,
        precision_secs,
    })
}

fn rocks_falling(session: &GameSession) -> usize {
    session
        .playfield()
        .items()
        .iter()
        .filter(|item| item.kind == ItemType::Rock)
        .count()
}

fn cmd_mute(store: &mut GameStore, state: &str) -> Result<()> {
    let muted = match state.to_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => true,
        "off" | "false" | "0" | "no" => false,
        _ => bail!("Unknown mute state '{}'. Valid values: on, off", state),
    };
    store.set_muted(muted);
    println!("Sound {}", if muted { "muted" } else { "on" });
    Ok(())
}

fn cmd_export(store: &mut GameStore) -> Result<()> {
    let keys: serde_json::Map<String, serde_json::Value> = store
        .export()
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Some(raw) => serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw)),
                None => serde_json::Value::Null,
            };
            (key.to_string(), value)
        })
        .collect();

    let export = serde_json::json!({
        "exported_at": Utc::now().to_rfc3339(),
        "summary": StoreSummary::collect(store),
        "keys": keys,
    });

    println!("{}", serde_json::to_string_pretty(&export)?);
    Ok(())
}

fn cmd_reset(store: &mut GameStore, yes: bool) -> Result<()> {
    if !yes {
        bail!("Refusing to wipe the store without --yes");
    }
    store.reset()?;
    println!("Store wiped.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use goldrush_core::MemoryStore;

    #[test]
    fn test_grant_totals_multiplies_pack_contents() {
        assert_eq!(
            grant_totals(items::GOLDEN_CHEST, 2).unwrap(),
            vec![
                (items::EXTRA_PLAYS, 10),
                (items::TNT_PACK, 6),
                (items::TIMER_BOOST, 6),
                (items::PRECISION_PACK, 4),
            ]
        );
        assert_eq!(
            grant_totals(items::TNT_PACK, u32::MAX).unwrap(),
            vec![(items::TNT_PACK, u32::MAX)]
        );
    }

    #[test]
    fn test_grant_totals_rejects_bad_requests() {
        assert!(grant_totals(items::DIAMOND_CHEST, u32::MAX / 10 + 1).is_err());
        assert!(grant_totals(items::TNT_PACK, 0).is_err());
        assert!(grant_totals("mystery_box", 1).is_err());
    }

    #[test]
    fn test_simulated_precision_lasts_twenty_seconds() {
        let clock = Arc::new(SimulatedClock::new());
        let mut store = GameStore::open(
            Arc::new(MemoryStore::new()),
            clock.clone(),
            &GameConfig::default(),
        );
        store.credit(items::PRECISION_PACK, 1);

        let options = PlayOptions {
            seed: 7,
            accuracy: 0.0,
            use_tnt: false,
            use_timer: false,
        };
        let report = simulate_session(&mut store, &clock, &options).unwrap();

        assert_eq!(report.precision_secs, 20);
        assert_eq!(report.simulated_ms, 60_000);
        assert_eq!(clock.offset_ms(), 60_000);
        assert_eq!(report.result.raw_score, 0);
        assert!(!report.result.recorded);
        assert_eq!(store.precision_uses(), 2);
    }
}
