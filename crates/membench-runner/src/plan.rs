//! Resume and overwrite planning for search runs.

use std::cmp::Ordering;

use membench_ledger::{LedgerResult, ResultStore};
use membench_types::Task;
use tracing::info;

/// Flags controlling how an existing result store is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchPolicy {
    pub overwrite: bool,
    /// Candidates were named explicitly for this run.
    pub run_ids: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPlan {
    pub tasks: Vec<Task>,
    /// Candidates dropped because the store already holds their result.
    pub excluded: usize,
    pub truncated: bool,
}

/// Applies `policy` to the store and returns the naturally sorted work list.
///
/// | overwrite | run_ids | store    | excluded          |
/// |-----------|---------|----------|-------------------|
/// | false     | any     | kept     | every stored id   |
/// | true      | false   | truncated| none              |
/// | true      | true    | kept     | none              |
pub async fn plan_search_run(
    candidates: Vec<Task>,
    store: &dyn ResultStore,
    policy: SearchPolicy,
) -> LedgerResult<SearchPlan> {
    let candidate_count = candidates.len();
    let mut truncated = false;

    let mut tasks = if policy.overwrite {
        if !policy.run_ids {
            store.truncate().await?;
            truncated = true;
        }
        candidates
    } else {
        let stored = store.completed_ids().await?;
        candidates
            .into_iter()
            .filter(|task| !stored.contains(&task.id))
            .collect()
    };
    tasks.sort_by(|left, right| natural_id_cmp(&left.id, &right.id));

    let excluded = candidate_count - tasks.len();
    info!(
        candidates = candidate_count,
        planned = tasks.len(),
        excluded,
        truncated,
        "planned search run"
    );
    Ok(SearchPlan {
        tasks,
        excluded,
        truncated,
    })
}

/// Orders ids by their non-numeric prefix, then by the trailing integer.
///
/// `simple_2` sorts before `simple_10`; ids without a trailing number come
/// before numbered ids sharing the prefix.
pub fn natural_id_cmp(left: &str, right: &str) -> Ordering {
    let (left_prefix, left_number) = split_trailing_number(left);
    let (right_prefix, right_number) = split_trailing_number(right);
    left_prefix
        .cmp(right_prefix)
        .then_with(|| compare_digits(left_number, right_number))
        .then_with(|| left.cmp(right))
}

fn split_trailing_number(id: &str) -> (&str, &str) {
    let split = id
        .char_indices()
        .rev()
        .take_while(|(_, ch)| ch.is_ascii_digit())
        .last()
        .map_or(id.len(), |(index, _)| index);
    id.split_at(split)
}

// Compares digit strings numerically without parsing, so long runs cannot overflow.
fn compare_digits(left: &str, right: &str) -> Ordering {
    let left = left.trim_start_matches('0');
    let right = right.trim_start_matches('0');
    left.len().cmp(&right.len()).then_with(|| left.cmp(right))
}
