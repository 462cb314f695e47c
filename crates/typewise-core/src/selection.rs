//! Maximum-information item selection.

use std::collections::HashSet;

use crate::irt::item_information;
use crate::model::PsychometricItem;

/// Pick the unadministered candidate with the highest Fisher information at
/// `theta`. Equal information is broken by the lexicographically lowest id,
/// so selection is reproducible regardless of bank order.
///
/// Returns `None` when every candidate has been administered.
pub fn select_next_item<'a, I>(
    theta: f64,
    candidates: I,
    administered: &HashSet<String>,
) -> Option<&'a PsychometricItem>
where
    I: IntoIterator<Item = &'a PsychometricItem>,
{
    candidates
        .into_iter()
        .filter(|item| !administered.contains(&item.id))
        .map(|item| (item, item_information(item, theta)))
        .max_by(|(a, info_a), (b, info_b)| {
            info_a
                .total_cmp(info_b)
                .then_with(|| b.id.cmp(&a.id))
        })
        .map(|(item, info)| {
            tracing::debug!(item_id = %item.id, theta, information = info, "selected item");
            item
        })
}
