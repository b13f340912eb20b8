//! Randomized group sampling over a record table.
//!
//! Rows are partitioned into buckets by the distinct combinations of the
//! grouping columns (the whole table is one bucket when no columns are
//! given), then groups of a fixed size are drawn from each bucket until the
//! total cap is reached or the buckets run out.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::{RecordTable, SampleGroup};

/// Randomized group sampler.
///
/// Draws are non-deterministic by default; set a seed for reproducible
/// runs.
#[derive(Debug, Clone, Default)]
pub struct GroupSampler {
    /// Random seed for reproducibility (None = non-deterministic).
    seed: Option<u64>,
}

impl GroupSampler {
    /// Creates a sampler with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Draws up to `sample_size` groups of exactly `group_size` rows.
    ///
    /// Behavior:
    /// - With `group_columns`, rows are bucketed by the distinct value
    ///   combinations of those columns; no group mixes rows from different
    ///   buckets. Buckets are visited in sorted key order.
    /// - Buckets smaller than `group_size` are skipped.
    /// - Rows are never repeated within one group. When a bucket is large
    ///   enough to satisfy the remaining demand disjointly, groups are
    ///   disjoint; a smaller bucket is oversampled with independent draws,
    ///   so rows may recur across groups.
    /// - Drawing stops once `sample_size` groups exist in total.
    pub fn sample_groups(
        &self,
        table: &RecordTable,
        sample_size: usize,
        group_size: usize,
        group_columns: &[String],
    ) -> Vec<SampleGroup> {
        let mut groups = Vec::new();
        if table.is_empty() || sample_size == 0 || group_size == 0 {
            return groups;
        }

        let mut rng = self.create_rng();
        let buckets = self.bucket_indices(table, group_columns);

        for (label, indices) in buckets {
            let remaining = sample_size - groups.len();
            if remaining == 0 {
                break;
            }

            if indices.len() < group_size {
                tracing::debug!(
                    bucket = label.as_deref().unwrap_or("-"),
                    rows = indices.len(),
                    group_size,
                    "Skipping bucket smaller than group size"
                );
                continue;
            }

            let mut shuffled = indices;
            shuffled.shuffle(&mut rng);

            if shuffled.len() / group_size >= remaining {
                // Disjoint chunks of one shuffle cover the demand.
                for chunk in shuffled.chunks_exact(group_size).take(remaining) {
                    groups.push(make_group(table, &label, chunk));
                }
            } else {
                // Small bucket: each group is an independent draw without
                // replacement, so rows may recur across groups but never
                // within one.
                for _ in 0..remaining {
                    shuffled.shuffle(&mut rng);
                    groups.push(make_group(table, &label, &shuffled[..group_size]));
                }
            }
        }

        tracing::debug!(
            groups = groups.len(),
            sample_size,
            group_size,
            "Drew sample groups"
        );

        groups
    }

    /// Partitions row indices into buckets keyed by the grouping columns.
    ///
    /// Returns `[(None, all_rows)]` when no grouping columns are given.
    fn bucket_indices(
        &self,
        table: &RecordTable,
        group_columns: &[String],
    ) -> Vec<(Option<String>, Vec<usize>)> {
        if group_columns.is_empty() {
            return vec![(None, (0..table.rows.len()).collect())];
        }

        let mut buckets: BTreeMap<Vec<String>, Vec<usize>> = BTreeMap::new();
        for (idx, row) in table.rows.iter().enumerate() {
            let key: Vec<String> = group_columns
                .iter()
                .map(|col| row.get(col).cloned().unwrap_or_default())
                .collect();
            buckets.entry(key).or_default().push(idx);
        }

        buckets
            .into_iter()
            .map(|(key, indices)| (Some(key.join(", ")), indices))
            .collect()
    }

    /// Creates the random number generator.
    fn create_rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        }
    }
}

fn make_group(table: &RecordTable, label: &Option<String>, indices: &[usize]) -> SampleGroup {
    SampleGroup {
        bucket: label.clone(),
        rows: indices.iter().map(|&i| table.rows[i].clone()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::Record;
    use std::collections::HashSet;

    fn catalog(n: usize) -> RecordTable {
        let categories = ["audio", "video", "home"];
        let rows = (0..n)
            .map(|i| {
                let mut row = Record::new();
                row.insert("name".to_string(), format!("product-{}", i));
                row.insert("price".to_string(), format!("{}.99", 10 + i));
                row.insert(
                    "category".to_string(),
                    categories[i % categories.len()].to_string(),
                );
                row
            })
            .collect();

        RecordTable {
            columns: vec![
                "name".to_string(),
                "price".to_string(),
                "category".to_string(),
            ],
            rows,
        }
    }

    #[test]
    fn test_groups_have_exact_size() {
        let table = catalog(12);
        let sampler = GroupSampler::new().with_seed(42);

        let groups = sampler.sample_groups(&table, 4, 3, &[]);
        assert_eq!(groups.len(), 4);
        for group in &groups {
            assert_eq!(group.rows.len(), 3);
        }
    }

    #[test]
    fn test_ten_rows_three_groups_of_two() {
        let table = catalog(10);
        let sampler = GroupSampler::new().with_seed(7);

        let groups = sampler.sample_groups(&table, 3, 2, &[]);
        assert_eq!(groups.len(), 3);

        // Demand fits disjointly, so no row appears twice anywhere.
        let mut seen = HashSet::new();
        for group in &groups {
            assert_eq!(group.rows.len(), 2);
            for row in &group.rows {
                assert!(seen.insert(row["name"].clone()), "row drawn twice");
            }
        }
    }

    #[test]
    fn test_group_count_never_exceeds_sample_size() {
        let table = catalog(30);
        let sampler = GroupSampler::new().with_seed(1);

        let groups = sampler.sample_groups(&table, 5, 2, &["category".to_string()]);
        assert!(groups.len() <= 5);
    }

    #[test]
    fn test_buckets_never_mix() {
        let table = catalog(30);
        let sampler = GroupSampler::new().with_seed(9);

        let groups = sampler.sample_groups(&table, 6, 2, &["category".to_string()]);
        assert!(!groups.is_empty());
        for group in &groups {
            let categories: HashSet<&str> =
                group.rows.iter().map(|r| r["category"].as_str()).collect();
            assert_eq!(categories.len(), 1, "group mixes bucket values");
            assert_eq!(
                group.bucket.as_deref(),
                categories.iter().next().copied(),
                "bucket label should match the rows' column value"
            );
        }
    }

    #[test]
    fn test_small_buckets_skipped() {
        // One category with a single row cannot form a group of 2.
        let mut table = catalog(4);
        for row in &mut table.rows {
            row.insert("category".to_string(), "bulk".to_string());
        }
        let mut lone = Record::new();
        lone.insert("name".to_string(), "orphan".to_string());
        lone.insert("price".to_string(), "1.99".to_string());
        lone.insert("category".to_string(), "rare".to_string());
        table.rows.push(lone);

        let sampler = GroupSampler::new().with_seed(3);
        let groups = sampler.sample_groups(&table, 10, 2, &["category".to_string()]);

        for group in &groups {
            assert_ne!(group.bucket.as_deref(), Some("rare"));
        }
    }

    #[test]
    fn test_small_bucket_oversamples_without_in_group_repeats() {
        // 4 rows, group_size 3, sample_size 3: 4 < 3 * 3, so rows recur
        // across groups but never inside one.
        let table = catalog(4);
        let sampler = GroupSampler::new().with_seed(11);

        let groups = sampler.sample_groups(&table, 3, 3, &[]);
        assert_eq!(groups.len(), 3);
        for group in &groups {
            let names: HashSet<&str> = group.rows.iter().map(|r| r["name"].as_str()).collect();
            assert_eq!(names.len(), 3, "row repeated within a group");
        }
    }

    #[test]
    fn test_empty_table_returns_nothing() {
        let table = RecordTable::default();
        let sampler = GroupSampler::new().with_seed(5);
        assert!(sampler.sample_groups(&table, 3, 2, &[]).is_empty());
    }

    #[test]
    fn test_zero_sample_or_group_size() {
        let table = catalog(10);
        let sampler = GroupSampler::new().with_seed(5);
        assert!(sampler.sample_groups(&table, 0, 2, &[]).is_empty());
        assert!(sampler.sample_groups(&table, 2, 0, &[]).is_empty());
    }

    #[test]
    fn test_group_size_larger_than_table() {
        let table = catalog(3);
        let sampler = GroupSampler::new().with_seed(5);
        assert!(sampler.sample_groups(&table, 2, 10, &[]).is_empty());
    }

    #[test]
    fn test_seeded_sampling_reproducible() {
        let table = catalog(20);

        let first = GroupSampler::new()
            .with_seed(42)
            .sample_groups(&table, 4, 3, &["category".to_string()]);
        let second = GroupSampler::new()
            .with_seed(42)
            .sample_groups(&table, 4, 3, &["category".to_string()]);

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.bucket, b.bucket);
            let names_a: Vec<&str> = a.rows.iter().map(|r| r["name"].as_str()).collect();
            let names_b: Vec<&str> = b.rows.iter().map(|r| r["name"].as_str()).collect();
            assert_eq!(names_a, names_b, "same seed should draw the same groups");
        }
    }
}
