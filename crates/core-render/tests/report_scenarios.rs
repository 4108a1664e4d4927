//! Report text scenarios and verbosity gating.

use core_render::{VerbosityLevel, compose, compose_report};
use core_stats::{ChainStats, PresentMode, ProcessSnapshot, ProcessTable, RuntimeKind};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn game_chain() -> ChainStats {
    ChainStats {
        runtime: RuntimeKind::Dxgi,
        sync_interval: 1,
        present_flags: 0,
        fps: 60.0,
        cpu_frame_time_seconds: 0.01,
        ..ChainStats::default()
    }
}

fn composed_flip_chain() -> ChainStats {
    ChainStats {
        present_mode: PresentMode::HardwareComposedIndependentFlip,
        plane_index: 2,
        dwm_notified: true,
        has_been_batched: true,
        latency_seconds: 0.005,
        displayed_fps: 58.0,
        ..game_chain()
    }
}

fn game(chain: ChainStats) -> ProcessSnapshot {
    ProcessSnapshot::new("game.exe", true).with_chain(0x1, chain)
}

#[test]
fn simple_report_matches_exactly() {
    let text = compose(1234, &game(game_chain()), VerbosityLevel::Simple);
    assert_eq!(
        text,
        "\ngame.exe[1234]:\n\t0000000000000001 (DXGI): SyncInterval 1 | Flags 0 | 16.67 ms/frame (60.0 fps, 10.00 ms CPU)\n"
    );
}

#[test]
fn verbose_report_includes_every_clause() {
    let text = compose(1234, &game(composed_flip_chain()), VerbosityLevel::Verbose);
    assert!(text.contains("58.0 displayed fps, "), "{text}");
    assert!(
        text.contains(
            ", 5.00 ms latency) (Hardware Composed Independent Flip: Plane 2, DWM notified, batched)"
        ),
        "{text}"
    );
    assert_eq!(
        text,
        "\ngame.exe[1234]:\n\t0000000000000001 (DXGI): SyncInterval 1 | Flags 0 | 16.67 ms/frame (60.0 fps, 58.0 displayed fps, 10.00 ms CPU, 5.00 ms latency) (Hardware Composed Independent Flip: Plane 2, DWM notified, batched)\n"
    );
}

#[test]
fn default_verbosity_omits_dwm_and_batched() {
    let text = compose(1234, &game(composed_flip_chain()), VerbosityLevel::Default);
    assert_eq!(
        text,
        "\ngame.exe[1234]:\n\t0000000000000001 (DXGI): SyncInterval 1 | Flags 0 | 16.67 ms/frame (60.0 fps, 58.0 displayed fps, 10.00 ms CPU, 5.00 ms latency) (Hardware Composed Independent Flip: Plane 2)\n"
    );
}

#[test]
fn simple_verbosity_omits_mode_clause_entirely() {
    let text = compose(1234, &game(composed_flip_chain()), VerbosityLevel::Simple);
    for absent in ["displayed fps", "latency", "Plane", "DWM", "batched", "Flip"] {
        assert!(!text.contains(absent), "{absent} leaked into {text}");
    }
    // The unconditional closing paren ends the fps group at Simple.
    assert!(text.ends_with(" fps, 10.00 ms CPU)\n"), "{text}");
}

#[test]
fn batched_shown_for_any_mode_at_verbose() {
    let chain = ChainStats {
        present_mode: PresentMode::ComposedFlip,
        has_been_batched: true,
        ..game_chain()
    };
    let text = compose(7, &game(chain), VerbosityLevel::Verbose);
    assert!(text.ends_with("(Composed Flip, batched)\n"), "{text}");
}

#[test]
fn invisible_snapshots_compose_to_empty() {
    let not_target = ProcessSnapshot::new("game.exe", false).with_chain(1, game_chain());
    let unnamed = ProcessSnapshot::new("", true).with_chain(1, game_chain());
    let no_chains = ProcessSnapshot::new("game.exe", true);
    for snap in [&not_target, &unnamed, &no_chains] {
        for v in [
            VerbosityLevel::Simple,
            VerbosityLevel::Default,
            VerbosityLevel::Verbose,
        ] {
            assert_eq!(compose(1, snap, v), "");
        }
    }
}

#[test]
fn report_orders_processes_and_chains() {
    let mut table = ProcessTable::new();
    table.insert(
        20,
        ProcessSnapshot::new("b.exe", true)
            .with_chain(0xB, game_chain())
            .with_chain(0xA, game_chain()),
    );
    table.insert(10, ProcessSnapshot::new("a.exe", true).with_chain(0x5, game_chain()));
    table.insert(15, ProcessSnapshot::new("hidden.exe", false).with_chain(0x1, game_chain()));

    let text = compose_report(&table, VerbosityLevel::Simple);
    let markers: Vec<&str> = text
        .lines()
        .filter(|l| !l.is_empty())
        .map(|l| l.split_whitespace().next().unwrap())
        .collect();
    assert_eq!(
        markers,
        vec![
            "a.exe[10]:",
            "0000000000000005",
            "b.exe[20]:",
            "000000000000000A",
            "000000000000000B",
        ]
    );
    assert_eq!(
        text,
        compose(10, &table[&10], VerbosityLevel::Simple)
            + &compose(20, &table[&20], VerbosityLevel::Simple)
    );
}

fn verbosity_strategy() -> impl Strategy<Value = VerbosityLevel> {
    prop_oneof![
        Just(VerbosityLevel::Simple),
        Just(VerbosityLevel::Default),
        Just(VerbosityLevel::Verbose),
    ]
}

proptest! {
    #[test]
    fn compose_is_deterministic(
        ids in proptest::collection::vec(any::<u64>(), 1..8),
        fps in 1.0f64..500.0,
        pid in any::<u32>(),
        verbosity in verbosity_strategy(),
    ) {
        let mut snap = ProcessSnapshot::new("app.exe", true);
        for id in &ids {
            snap = snap.with_chain(*id, ChainStats { fps, ..composed_flip_chain() });
        }
        let first = compose(pid, &snap, verbosity);
        let second = compose(pid, &snap.clone(), verbosity);
        prop_assert_eq!(&first, &second);
        // Header + one line per distinct chain.
        prop_assert_eq!(first.matches('\n').count(), 2 + snap.chains.len());
    }

    #[test]
    fn verbosity_only_adds_text(verbosity in verbosity_strategy()) {
        let snap = game(composed_flip_chain());
        let simple = compose(1, &snap, VerbosityLevel::Simple);
        let text = compose(1, &snap, verbosity);
        prop_assert!(text.len() >= simple.len());
        let head = &simple[..simple.find("fps, ").unwrap() + "fps, ".len()];
        prop_assert!(text.starts_with(head));
    }
}
