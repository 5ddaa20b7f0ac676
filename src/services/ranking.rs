// src/services/ranking.rs

/// Orders one (category, date) partition and returns `(entry_id, rank)` pairs.
///
/// Higher scores rank first. Ties keep insertion order, using the entry id as
/// the insertion sequence, so ranks always run 1..=N without gaps or repeats.
pub fn partition_ranks<I>(entries: I) -> Vec<(i64, i32)>
where
    I: IntoIterator<Item = (i64, i32)>,
{
    let mut ordered: Vec<(i64, i32)> = entries.into_iter().collect();
    ordered.sort_by(|(a_id, a_score), (b_id, b_score)| b_score.cmp(a_score).then(a_id.cmp(b_id)));

    ordered
        .into_iter()
        .zip(1..)
        .map(|((id, _), rank)| (id, rank))
        .collect()
}
