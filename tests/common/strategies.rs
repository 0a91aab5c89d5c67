use proptest::prelude::*;

/// Sample counts from empty datasets up to a few thousand samples
pub fn num_samples_strategy() -> impl Strategy<Value = usize> {
    prop_oneof![Just(0usize), 1usize..64, 64usize..5000]
}

/// Worker counts in the range typically configured per dataset
pub fn num_children_strategy() -> impl Strategy<Value = usize> {
    1usize..32
}

/// Worker counts no larger than the sample count
pub fn samples_and_fewer_children_strategy() -> impl Strategy<Value = (usize, usize)> {
    (1usize..5000).prop_flat_map(|samples| (Just(samples), 1usize..=samples.min(64)))
}
