//! Duplicate row detection and resolution.

use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::*;
use riskprep_common::value_key;
use riskprep_model::{DuplicatePolicy, KeepStrategy};

use crate::error::{PipelineError, Result};

/// Name of the flag column added by [`DuplicatePolicy::Mark`].
pub const DUPLICATE_FLAG_COLUMN: &str = "is_duplicate";

/// Options for [`resolve_duplicates`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DuplicateOptions {
    pub policy: DuplicatePolicy,
    /// Columns compared for equality; all columns when `None`.
    pub subset: Option<Vec<String>>,
    pub keep: KeepStrategy,
}

impl DuplicateOptions {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_subset<I, S>(mut self, subset: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subset = Some(subset.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_keep(mut self, keep: KeepStrategy) -> Self {
        self.keep = keep;
        self
    }
}

/// Resolves duplicate rows and returns the resulting table.
pub fn resolve_duplicates(mut df: DataFrame, options: &DuplicateOptions) -> Result<DataFrame> {
    resolve_duplicates_in_place(&mut df, options)?;
    Ok(df)
}

/// Resolves duplicate rows, mutating the table.
///
/// When no row is a duplicate under the subset and keep strategy, the table
/// is left untouched whatever the policy (`mark` adds no column).
pub fn resolve_duplicates_in_place(df: &mut DataFrame, options: &DuplicateOptions) -> Result<()> {
    tracing::info!("checking for duplicates");
    let subset = options.subset.as_deref();
    let mask = duplicate_mask(df, subset, options.keep)?;
    let duplicates = mask.iter().filter(|flag| **flag).count();
    if duplicates == 0 {
        tracing::info!("no duplicates found in the dataset");
        return Ok(());
    }

    match &options.policy {
        DuplicatePolicy::Remove => {
            tracing::info!(duplicates, keep = %options.keep, "removing duplicates");
            drop_flagged(df, &mask)?;
        }
        DuplicatePolicy::Mark => {
            tracing::info!(duplicates, keep = %options.keep, "marking duplicates");
            df.with_column(Series::new(DUPLICATE_FLAG_COLUMN.into(), mask))?;
        }
        DuplicatePolicy::KeepLast => {
            tracing::info!("keeping last occurrence of duplicates");
            let mask = duplicate_mask(df, subset, KeepStrategy::Last)?;
            drop_flagged(df, &mask)?;
        }
        DuplicatePolicy::Count => {
            tracing::warn!(
                duplicates,
                "duplicate policy 'count' is not implemented; table unchanged"
            );
        }
        DuplicatePolicy::Unrecognized(_) => {
            tracing::warn!(
                policy = %options.policy,
                "invalid duplicate policy; choose from: remove, mark, count, keep_last"
            );
        }
    }
    Ok(())
}

/// Flags each row that is a duplicate under `keep`.
///
/// Rows compare equal when every compared column holds the same value; two
/// nulls are equal.
pub fn duplicate_mask(
    df: &DataFrame,
    subset: Option<&[String]>,
    keep: KeepStrategy,
) -> Result<Vec<bool>> {
    let columns: Vec<String> = match subset {
        Some(subset) => subset.to_vec(),
        None => df
            .get_column_names()
            .into_iter()
            .map(ToString::to_string)
            .collect(),
    };

    let mut series = Vec::with_capacity(columns.len());
    for name in &columns {
        let column = df
            .column(name)
            .map_err(|_| PipelineError::ColumnNotFound {
                column: name.clone(),
            })?;
        series.push(column.as_materialized_series());
    }

    let keys: Vec<Vec<Option<String>>> = (0..df.height())
        .map(|idx| {
            series
                .iter()
                .map(|s| value_key(s.get(idx).unwrap_or(AnyValue::Null)))
                .collect()
        })
        .collect();

    let mask = match keep {
        KeepStrategy::First => {
            let mut seen = BTreeSet::new();
            keys.into_iter().map(|key| !seen.insert(key)).collect()
        }
        KeepStrategy::Last => {
            let mut seen = BTreeSet::new();
            let mut mask: Vec<bool> = keys.into_iter().rev().map(|key| !seen.insert(key)).collect();
            mask.reverse();
            mask
        }
        KeepStrategy::None => {
            let mut counts: BTreeMap<&Vec<Option<String>>, usize> = BTreeMap::new();
            for key in &keys {
                *counts.entry(key).or_default() += 1;
            }
            keys.iter().map(|key| counts[key] > 1).collect()
        }
    };
    Ok(mask)
}

fn drop_flagged(df: &mut DataFrame, duplicates: &[bool]) -> Result<()> {
    let keep: Vec<bool> = duplicates.iter().map(|flag| !flag).collect();
    let mask = BooleanChunked::from_slice("dedupe".into(), &keep);
    *df = df.filter(&mask)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        df! {
            "id" => [1i64, 2, 1, 3, 1],
            "grade" => ["A", "B", "A", "C", "B"],
        }
        .unwrap()
    }

    #[test]
    fn mask_by_keep_strategy() {
        let df = sample();
        assert_eq!(
            duplicate_mask(&df, None, KeepStrategy::First).unwrap(),
            vec![false, false, true, false, false]
        );
        assert_eq!(
            duplicate_mask(&df, None, KeepStrategy::Last).unwrap(),
            vec![true, false, false, false, false]
        );
        let subset = vec!["id".to_string()];
        assert_eq!(
            duplicate_mask(&df, Some(&subset), KeepStrategy::None).unwrap(),
            vec![true, false, true, false, true]
        );
    }

    #[test]
    fn nulls_compare_equal() {
        let df = df! { "a" => [None::<i64>, None, Some(1)] }.unwrap();
        assert_eq!(
            duplicate_mask(&df, None, KeepStrategy::First).unwrap(),
            vec![false, true, false]
        );
    }

    #[test]
    fn missing_subset_column_is_an_error() {
        let subset = vec!["nope".to_string()];
        let err = duplicate_mask(&sample(), Some(&subset), KeepStrategy::First).unwrap_err();
        assert!(matches!(err, PipelineError::ColumnNotFound { column } if column == "nope"));
    }

    #[test]
    fn keep_last_overrides_keep() {
        let options = DuplicateOptions::new(DuplicatePolicy::KeepLast)
            .with_subset(["id"])
            .with_keep(KeepStrategy::First);
        let out = resolve_duplicates(sample(), &options).unwrap();
        let grades: Vec<String> = (0..out.height())
            .map(|idx| riskprep_common::any_to_string(out.column("grade").unwrap().get(idx).unwrap()))
            .collect();
        assert_eq!(grades, vec!["B", "C", "B"]);
    }

    #[test]
    fn in_place_removal() {
        let mut df = sample();
        resolve_duplicates_in_place(&mut df, &DuplicateOptions::default()).unwrap();
        assert_eq!(df.height(), 4);
    }

    #[test]
    fn count_leaves_duplicates_in_place() {
        let df = sample();
        let out = resolve_duplicates(df.clone(), &DuplicateOptions::new(DuplicatePolicy::Count))
            .unwrap();
        assert!(out.equals_missing(&df));
        assert!(out.column(DUPLICATE_FLAG_COLUMN).is_err());
    }
}
