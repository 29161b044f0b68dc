//! Property tests for rank vector invariants and estimator determinism

use proptest::prelude::*;
use rapid_pagerank::{ConvergenceConfig, CsrGraph, DistributionPageRank, StochasticPageRank};

fn edges() -> impl Strategy<Value = Vec<(u32, u32)>> {
    prop::collection::vec((0u32..8, 0u32..8), 1..24)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn step_preserves_probability_mass(edges in edges(), weights in prop::collection::vec(0.01f64..1.0, 8)) {
        let graph = CsrGraph::from_edges(edges);
        let n = graph.node_count();
        let total: f64 = weights[..n].iter().sum();
        let scores: Vec<f64> = weights[..n].iter().map(|w| w / total).collect();

        let next = DistributionPageRank::step(&graph, &scores);
        prop_assert!((next.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        prop_assert!(next.iter().all(|&s| s >= 0.0));
    }

    #[test]
    fn distribution_is_a_probability_vector(edges in edges(), steps in 1usize..60) {
        let graph = CsrGraph::from_edges(edges);
        let result = DistributionPageRank::new()
            .with_max_iterations(steps)
            .run(&graph)
            .unwrap();

        prop_assert_eq!(result.ranks.len(), graph.node_count());
        if graph.node_count() > 1 {
            prop_assert_eq!(result.iterations, steps);
        }
        prop_assert!((result.ranks.sum() - 1.0).abs() < 1e-9);
        prop_assert!(result.ranks.scores().iter().all(|&s| (0.0..=1.0 + 1e-12).contains(&s)));
    }

    #[test]
    fn tolerance_mode_never_exceeds_ceiling(edges in edges(), ceiling in 1usize..40) {
        let graph = CsrGraph::from_edges(edges);
        let config = ConvergenceConfig::tolerance(1e-9).with_ceiling(ceiling);
        let result = DistributionPageRank::new()
            .with_convergence(config)
            .run(&graph)
            .unwrap();

        prop_assert!(result.iterations <= ceiling);
        prop_assert_eq!(result.converged, result.warning.is_none());
        if result.converged {
            prop_assert!(result.delta <= 1e-9);
        }
    }

    #[test]
    fn stochastic_is_a_probability_vector(edges in edges(), seed in any::<u64>()) {
        let graph = CsrGraph::from_edges(edges);
        let result = StochasticPageRank::new()
            .with_num_walks(64)
            .with_walk_length(32)
            .with_seed(seed)
            .run(&graph)
            .unwrap();

        prop_assert!((result.ranks.sum() - 1.0).abs() < 1e-9);
        prop_assert!(result.ranks.scores().iter().all(|&s| s >= 0.0));
    }

    #[test]
    fn seeded_walks_are_reproducible(edges in edges(), seed in any::<u64>(), walks in 1usize..3000) {
        let graph = CsrGraph::from_edges(edges);
        let estimator = StochasticPageRank::new()
            .with_num_walks(walks)
            .with_walk_length(8)
            .with_seed(seed);

        let first = estimator.run(&graph).unwrap();
        let second = estimator.run(&graph).unwrap();
        let parallel = estimator
            .run_parallel(&graph, &mut rapid_pagerank::pipeline::NoopReporter)
            .unwrap();

        prop_assert_eq!(&first.ranks, &second.ranks);
        prop_assert_eq!(&first.ranks, &parallel.ranks);
    }
}
