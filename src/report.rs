//! Completion progress per summit classification.

use serde::Serialize;

use crate::store::Classification;
use crate::visits::VisitedSummitDataset;

/// How many summits of one classification have been visited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationProgress {
    pub classification: Classification,
    pub name: &'static str,
    pub visited: usize,
    pub total: usize,
}

impl ClassificationProgress {
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.visited)
    }
}

/// One entry per classification, in [`Classification::ALL`] order.
pub fn completion_report(dataset: &VisitedSummitDataset) -> Vec<ClassificationProgress> {
    Classification::ALL
        .into_iter()
        .map(|classification| {
            let members = dataset
                .rows()
                .iter()
                .filter(|row| row.summit.is_classified(classification));
            let (total, visited) = members.fold((0, 0), |(total, visited), row| {
                (total + 1, visited + row.is_visited() as usize)
            });
            ClassificationProgress {
                classification,
                name: classification.name(),
                visited,
                total,
            }
        })
        .collect()
}
