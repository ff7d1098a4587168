//! Property-based invariant tests for cut lists and grid boundaries.
//!
//! 1. Keys stay strictly increasing under any insert sequence.
//! 2. A cut inserted as real at any point stays real.
//! 3. Floor/ceiling lookups return the neighbouring keys and clamp at the ends.
//! 4. Removing the auxiliary subset leaves exactly the real cuts.
//! 5. Completing a page twice gives the same grid.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use proptest::prelude::*;
use tablegrid::{Bounds, BoxKind, Coord, CutList, LayoutBox, Rounding, SheetLayout, TableConfig};

// ── Helpers ─────────────────────────────────────────────────────────────

fn inserts_strategy() -> impl Strategy<Value = Vec<(Coord, bool)>> {
    prop::collection::vec((-5_000_i64..5_000, any::<bool>()), 0..200)
}

fn build(inserts: &[(Coord, bool)]) -> CutList {
    let mut cuts = CutList::new();
    for &(coord, auxiliary) in inserts {
        cuts.insert(coord, auxiliary);
    }
    cuts
}

fn box_strategy() -> impl Strategy<Value = Bounds> {
    (0_i64..1_000, 0_i64..1_000, 0_i64..300, 0_i64..300)
        .prop_map(|(x, y, w, h)| Bounds::new(x, y, w, h))
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Sortedness
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn keys_strictly_increasing(inserts in inserts_strategy()) {
        let cuts = build(&inserts);
        let keys: Vec<Coord> = cuts.keys().collect();
        for pair in keys.windows(2) {
            prop_assert!(pair[0] < pair[1], "keys out of order: {:?}", keys);
        }
        let mut expected: Vec<Coord> = inserts.iter().map(|&(c, _)| c).collect();
        expected.sort_unstable();
        expected.dedup();
        prop_assert_eq!(keys, expected);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Promotion monotonicity
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn real_cuts_never_downgrade(inserts in inserts_strategy()) {
        let cuts = build(&inserts);
        let auxiliary = cuts.auxiliary_keys();
        for &(coord, was_auxiliary) in &inserts {
            if !was_auxiliary {
                prop_assert!(
                    !auxiliary.contains(&coord),
                    "{} was inserted as real but is auxiliary",
                    coord
                );
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Floor/ceiling correctness
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn floor_and_ceiling_bracket_the_query(
        inserts in prop::collection::vec((-5_000_i64..5_000, any::<bool>()), 1..200),
        query in -6_000_i64..6_000,
    ) {
        let cuts = build(&inserts);
        let last = cuts.size() - 1;
        let lower = cuts.find_position(query, Rounding::Lower);
        let upper = cuts.find_position(query, Rounding::Upper);

        if query < cuts.key_at(0) {
            prop_assert_eq!((lower, upper), (0, 0));
        } else if query > cuts.key_at(last) {
            prop_assert_eq!((lower, upper), (last, last));
        } else if cuts.contains(query) {
            prop_assert_eq!(lower, upper);
            prop_assert_eq!(cuts.key_at(lower), query);
        } else {
            prop_assert_eq!(upper, lower + 1);
            prop_assert!(cuts.key_at(lower) < query && query < cuts.key_at(upper));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Subset removal
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn removing_auxiliary_keeps_real(inserts in inserts_strategy()) {
        let mut cuts = build(&inserts);
        let auxiliary = cuts.auxiliary_keys();
        let real: Vec<Coord> = cuts.keys().filter(|k| !auxiliary.contains(k)).collect();
        cuts.remove_sorted_subset(&auxiliary);
        prop_assert_eq!(cuts.keys().collect::<Vec<_>>(), real);
        prop_assert!(cuts.auxiliary_keys().is_empty());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Pruning idempotence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn page_completed_is_idempotent(
        boxes in prop::collection::vec((box_strategy(), any::<bool>()), 1..40),
    ) {
        let mut layout = SheetLayout::new(TableConfig::default());
        for (bounds, is_content) in boxes {
            let kind = if is_content { BoxKind::Content } else { BoxKind::Block };
            layout.add_box(&LayoutBox::new(kind, bounds), 0, 0, 10_000);
        }
        layout.page_completed();
        let first: (Vec<Coord>, Vec<Coord>) =
            (layout.x_cuts().keys().collect(), layout.y_cuts().keys().collect());
        let revision = layout.revision();

        layout.page_completed();
        let second: (Vec<Coord>, Vec<Coord>) =
            (layout.x_cuts().keys().collect(), layout.y_cuts().keys().collect());
        prop_assert_eq!(first, second);
        prop_assert_eq!(layout.revision(), revision);
    }
}
