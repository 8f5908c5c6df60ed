//! Property-based checks over the lifecycle model and order numbering.

use precast_erp::{
    models::{Dimensions, DispositionFlags, LifecycleState},
    services::dispatch::{generate_order_number, is_valid_order_number},
};
use proptest::prelude::*;
use rand::{rngs::StdRng, SeedableRng};

const STATES: [LifecycleState; 6] = [
    LifecycleState::Produced,
    LifecycleState::InStockyard,
    LifecycleState::ReservedForDispatch,
    LifecycleState::InTransit,
    LifecycleState::ReceivedAtSite,
    LifecycleState::Erected,
];

fn state_strategy() -> impl Strategy<Value = LifecycleState> {
    (0..STATES.len()).prop_map(|i| STATES[i])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn transitions_only_move_forward(from in state_strategy(), to in state_strategy()) {
        if from.can_transition_to(to) {
            prop_assert!(to > from, "{:?} -> {:?} moves backwards", from, to);
        }
    }

    #[test]
    fn no_state_reaches_itself(state in state_strategy()) {
        prop_assert!(!state.can_transition_to(state));
    }

    #[test]
    fn derived_flags_are_consistent(state in state_strategy(), requested in any::<bool>()) {
        let flags = DispositionFlags::derive(state, requested);

        // erected implies received implies yarded
        if flags.erected {
            prop_assert!(flags.received_in_erection);
        }
        if flags.received_in_erection {
            prop_assert!(flags.stockyard);
            prop_assert!(!flags.dispatch_status);
        }
        if flags.dispatch_status {
            prop_assert!(flags.stockyard);
        }
        prop_assert_eq!(flags.order_by_erection, requested);
    }

    #[test]
    fn generated_order_numbers_are_well_formed(seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        for _ in 0..16 {
            let number = generate_order_number(&mut rng);
            prop_assert!(is_valid_order_number(&number), "bad order number {}", number);
        }
    }

    #[test]
    fn foreign_prefixes_are_rejected(digits in "[0-9]{1,6}", prefix in "[A-Z]{3}") {
        prop_assume!(prefix != "ORD");
        let candidate = format!("{}{}", prefix, digits);
        prop_assert!(!is_valid_order_number(&candidate));
    }

    #[test]
    fn weight_scales_with_density(
        thickness in 1.0f64..500.0,
        length in 1.0f64..12_000.0,
        height in 1.0f64..4_000.0,
        density in 1.0f64..3_000.0,
    ) {
        let dims = Dimensions::new(thickness, length, height);
        let single = dims.weight(density);
        let double = dims.weight(density * 2.0);
        prop_assert!(single > 0.0);
        prop_assert!((double - 2.0 * single).abs() <= single * 1e-9);
    }
}

#[test]
fn order_numbers_accept_the_full_range() {
    assert!(is_valid_order_number("ORD0"));
    assert!(is_valid_order_number("ORD999999"));
    assert!(!is_valid_order_number("ORD"));
    assert!(!is_valid_order_number("ORD1000000"));
    assert!(!is_valid_order_number("ord123"));
}
