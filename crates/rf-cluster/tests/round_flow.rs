//! Round Flow Test Suite
//!
//! Full rounds through the public API:
//! - Cluster removal feeding scatters into a cleared reel
//! - Scatter evaluation on settled boards only
//! - Overlay persistence across a free game and reset on the next round
//! - Strip-backed rounds checked against board and overlay invariants

use std::sync::Arc;

use approx::assert_relative_eq;
use rf_cluster::{
    CellMultiplier, ClusterPaytable, FreeSpinAwards, GameConfig, GameDefinition, Grid, GridSpec,
    Position, RoundController, RoundPhase, RoundType, ScriptedReelSource, StopReason,
    StripReelSource, Symbol, Verdict,
};

// ═══════════════════════════════════════════════════════════════════════════════
// TEST FIXTURES
// ═══════════════════════════════════════════════════════════════════════════════

fn sym(name: &str) -> Symbol {
    name.parse().unwrap()
}

fn reel(names: &[&str]) -> Vec<Symbol> {
    names.iter().map(|n| sym(n)).collect()
}

/// 5 reels × 6 rows, H1 cluster on reel 0 rows 1-5, one scatter on reel 4
fn trigger_board() -> Grid {
    Grid::parse(
        "L1 H2 L3 H4 L2
         H1 L2 H3 L4 S
         H1 H3 L4 H2 L1
         H1 L4 H2 L1 L3
         H1 L1 L2 L3 H4
         H1 H4 L1 H3 L2",
    )
    .unwrap()
}

/// Scripted reels that deal `board`, with `extra[reel]` queued above it
fn script(board: &Grid, extra: &[Vec<Symbol>]) -> Vec<Vec<Symbol>> {
    board
        .reels()
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let mut queue = extra.get(i).cloned().unwrap_or_default();
            queue.extend(column.iter().copied());
            queue
        })
        .collect()
}

/// Reels (top→bottom) of a board with no clusters and no scatters
fn quiet(spec: GridSpec) -> Vec<Vec<Symbol>> {
    let pay = reel(&["H1", "H2", "H3", "H4", "L1", "L2", "L3", "L4"]);
    (0..spec.reels)
        .map(|r| (0..spec.rows).map(|w| pay[(r + 2 * w) % 8]).collect())
        .collect()
}

fn controller(
    spec: GridSpec,
    spins: Vec<Vec<Vec<Symbol>>>,
) -> RoundController<ScriptedReelSource> {
    RoundController::new(
        GameConfig::standard_7x7().with_grid(spec),
        Arc::new(ClusterPaytable::standard()),
        Arc::new(FreeSpinAwards::standard()),
        ScriptedReelSource::new(spins),
    )
    .unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════════
// END-TO-END
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_cleared_reel_refills_scatters_into_free_game() {
    let board = trigger_board();
    let spec = board.spec();
    assert_eq!(spec, GridSpec::new(5, 6));

    // Three scatters wait above reel 0
    let spins = vec![
        script(&board, &[reel(&["S", "H4", "S", "H2", "S"])]),
        quiet(spec),
    ];
    let mut ctl = controller(spec, spins);

    let spin = ctl.start().unwrap();
    assert_eq!(spin.steps().len(), 1);
    assert_eq!(spin.cascade.stop_reason, StopReason::Stabilized);

    let step = &spin.steps()[0];
    assert_eq!(step.clusters.len(), 1);
    assert_eq!(step.clusters[0].symbol, sym("H1"));
    assert_eq!(step.clusters[0].size, 5);
    assert_relative_eq!(spin.total_payout, 2.0);

    assert_eq!(
        spin.final_grid().reels()[0],
        reel(&["S", "H4", "S", "H2", "S", "L1"])
    );
    assert_eq!(spin.scatter.count, 4);
    assert_eq!(spin.verdict(), Verdict::EnterFree(10));

    for row in 1..6 {
        let pos = Position::new(0, row);
        let update = step
            .multiplier_updates
            .iter()
            .find(|u| u.position == pos)
            .unwrap();
        assert_eq!(update.before, CellMultiplier::INACTIVE);
        assert_eq!(update.after, CellMultiplier::active(1));
    }
    assert_eq!(spin.final_overlay.get(Position::new(0, 0)), CellMultiplier::INACTIVE);

    assert_eq!(ctl.phase(), RoundPhase::FreeSpin);
    let state = ctl.state().unwrap();
    assert_eq!(state.round_type, RoundType::Free);
    assert_eq!(state.remaining_free_spins, 10);
    assert_eq!(state.overlay.active_count(), 5);
}

#[test]
fn test_only_settled_board_is_evaluated() {
    let mut board = trigger_board();
    // Second scatter on the board from the start
    board = Grid::from_rows({
        let mut rows = board.to_rows();
        rows[5][4] = Symbol::Scatter;
        rows
    })
    .unwrap();
    let spec = board.spec();

    // Step 0 refills reel 0 with S + four L2 (3 scatters, new L2 cluster),
    // step 1 refills reel 0 with H4/L3 and reel 1 with a scatter (4 scatters).
    let extra = [
        reel(&["H4", "L3", "H4", "L3", "S", "L2", "L2", "L2", "L2"]),
        reel(&["S"]),
    ];
    let mut ctl = controller(spec, vec![script(&board, &extra)]);

    let spin = ctl.start().unwrap();
    assert_eq!(spin.steps().len(), 2);

    let intermediate = &spin.steps()[0].grid_after;
    assert_eq!(intermediate.count(Symbol::Scatter), 3);
    assert_eq!(spin.steps()[1].clusters[0].symbol, sym("L2"));

    assert_eq!(spin.final_grid().count(Symbol::Scatter), 4);
    assert_eq!(spin.scatter.count, 4);
    assert_eq!(spin.verdict(), Verdict::EnterFree(10));

    // Step 1 wins again on reel 0 rows 1-4
    assert_relative_eq!(spin.steps()[1].clusters[0].multiplier, 2.0);
    assert_relative_eq!(spin.total_payout, 2.0 + 0.2 * 2.0);
    assert_eq!(spin.final_overlay.get(Position::new(0, 2)), CellMultiplier::active(2));
    assert_eq!(spin.final_overlay.get(Position::new(0, 5)), CellMultiplier::active(1));
    assert_eq!(spin.final_overlay.get(Position::new(1, 1)), CellMultiplier::active(1));
}

#[test]
fn test_overlay_resets_on_next_round() {
    let board = trigger_board();
    let spec = board.spec();
    let mut spins = vec![script(&board, &[reel(&["S", "H4", "S", "H2", "S"])])];
    spins.extend((0..10).map(|_| quiet(spec)));
    spins.push(quiet(spec));
    let mut ctl = controller(spec, spins);

    let summary = ctl.play_round().unwrap();
    assert_eq!(summary.free_spins_played, 10);
    assert!(summary.triggered_free_game());
    // Free spins were quiet, so the base-spin overlay survived all of them
    let last = summary.spins.last().unwrap();
    assert_eq!(last.final_overlay.active().len(), 5);

    let next = ctl.start().unwrap();
    assert_eq!(next.round_type, RoundType::Base);
    assert!(next.final_overlay.active().is_empty());
    assert_eq!(ctl.phase(), RoundPhase::RoundComplete);
}

// ═══════════════════════════════════════════════════════════════════════════════
// STRIP-BACKED ROUNDS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_standard_game_invariants_over_many_rounds() {
    let definition = GameDefinition::standard_7x7();
    let source: StripReelSource = definition.strip_source(2024);
    let mut ctl = RoundController::from_definition(&definition, source).unwrap();
    let max_steps = definition.config.engine().max_steps;
    let cells = definition.config.grid.total_positions();

    for _ in 0..300 {
        let summary = ctl.play_round().unwrap();
        assert!(summary.total_payout >= 0.0);
        assert_relative_eq!(
            summary.total_payout,
            summary.spins.iter().map(|s| s.total_payout).sum::<f64>(),
            epsilon = 1e-9
        );

        let mut previous: Option<&rf_cluster::OverlaySnapshot> = None;
        for spin in &summary.spins {
            assert!(spin.steps().len() <= max_steps);
            for step in spin.steps() {
                assert_eq!(step.grid_after.occupied(), cells);
                assert!(step.clusters.iter().all(|c| c.size >= 5));
            }

            // Multipliers never decrease within a round
            if let Some(prev) = previous {
                for (pos, value) in prev.active() {
                    let now = spin.final_overlay.get(pos);
                    assert!(now.active && now.value >= value);
                }
            }
            previous = Some(&spin.final_overlay);
        }

        let base = &summary.spins[0];
        match base.verdict() {
            Verdict::EnterFree(_) => assert!(base.scatter.count >= 4),
            Verdict::None => assert!(base.scatter.count < 4 || summary.wincap_hit),
            Verdict::ReTrigger(_) => panic!("re-trigger on a base spin"),
        }
    }
}
