use facetmap::aes::broadcast;
use facetmap::backend::LineStyle;
use facetmap::dims::DimSet;
use facetmap::layout::wrap_shape;
use facetmap::{
    AesBinding, AesSpec, Backend, Dataset, Dimension, FacetMap, GridOptions, MapOptions, PlotCollection,
    PlottersBackend, SelectionIter, Variable, WrapSpec,
};
use proptest::prelude::*;
use std::collections::HashSet;

const DIM_NAMES: [&str; 3] = ["chain", "draw", "team"];

/// One variable over the first `sizes.len()` dimension names.
fn dataset(sizes: &[usize]) -> Dataset {
    let dims: Vec<Dimension> = sizes
        .iter()
        .zip(DIM_NAMES)
        .map(|(&size, name)| Dimension::range(name, size))
        .collect();
    let total = sizes.iter().product();
    let values = (0..total).map(|i| i as f64).collect();
    Dataset::new(vec![Variable::new("mu", dims, values).unwrap()]).unwrap()
}

fn all_dims(sizes: &[usize]) -> DimSet {
    DIM_NAMES[..sizes.len()].iter().collect()
}

proptest! {
    #[test]
    fn prop_wrap_shape_fits(total in 1usize..60, col_wrap in 1usize..10) {
        let (rows, cols) = wrap_shape(total, col_wrap).unwrap();
        prop_assert!(rows * cols >= total);
        prop_assert!(cols <= col_wrap);
        // no fully empty trailing row
        prop_assert!((rows - 1) * cols < total);
    }

    #[test]
    fn prop_broadcast_tiles(values in prop::collection::vec(0i32..100, 1..6), required in 0usize..30) {
        let tiled = broadcast("color", &values, required).unwrap();
        prop_assert_eq!(tiled.len(), required);
        for (i, v) in tiled.iter().enumerate() {
            prop_assert_eq!(*v, values[i % values.len()]);
        }
    }

    #[test]
    fn prop_binding_idempotent(sizes in prop::collection::vec(1usize..5, 2..4), n_values in 1usize..7) {
        let ds = dataset(&sizes);
        let values: Vec<String> = (0..n_values).map(|i| format!("C{}", i)).collect();
        let aes = AesSpec::new().map("color", &DIM_NAMES[..2]).values("color", values);
        let first = AesBinding::build(&ds, &aes).unwrap();
        let second = AesBinding::build(&ds, &aes).unwrap();
        prop_assert_eq!(first.get("color").unwrap().len(), sizes[0] * sizes[1]);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_iterator_unique_and_complete(sizes in prop::collection::vec(1usize..5, 1..4)) {
        let ds = dataset(&sizes);
        let loop_dims = all_dims(&sizes);
        let visited: Vec<String> = SelectionIter::new(&ds, &loop_dims)
            .map(|(_, sel)| sel.to_string())
            .collect();
        let expected: usize = sizes.iter().product();
        prop_assert_eq!(visited.len(), expected);
        let unique: HashSet<&String> = visited.iter().collect();
        prop_assert_eq!(unique.len(), expected);
    }

    #[test]
    fn prop_iterator_deterministic(sizes in prop::collection::vec(1usize..5, 1..4)) {
        let ds = dataset(&sizes);
        let loop_dims = all_dims(&sizes);
        let first: Vec<_> = SelectionIter::new(&ds, &loop_dims).collect();
        let second: Vec<_> = SelectionIter::new(&ds, &loop_dims).collect();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_store_matches_visits(sizes in prop::collection::vec(2usize..4, 2..4), col_wrap in 1usize..5) {
        let ds = dataset(&sizes);
        let aes = AesSpec::new().map("color", &[DIM_NAMES[1]]).values("color", ["C0", "C1", "C2"]);
        let mut plot = PlotCollection::wrap(
            &ds,
            &WrapSpec::new(&[DIM_NAMES[0]]).col_wrap(col_wrap),
            PlottersBackend::new(),
            &GridOptions::default(),
            aes,
        )
        .unwrap();

        let (rows, cols) = plot.shape();
        prop_assert!(rows * cols >= sizes[0]);

        let mut calls = 0;
        plot.map(
            |call| {
                calls += 1;
                call.backend.line(&[0.0, 1.0], &[0.0, 1.0], &call.target, &LineStyle::default())
            },
            &MapOptions::new("line"),
        )
        .unwrap();

        prop_assert_eq!(calls, sizes[0] * sizes[1]);
        let artifacts = plot.artifact("line").unwrap();
        prop_assert_eq!(artifacts.shape(), vec![sizes[0], sizes[1]]);
        prop_assert!(artifacts.iter().all(Option::is_some));
    }
}
