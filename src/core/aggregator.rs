use crate::core::classifier::{BestHitOrder, MarkerEvidence};
use crate::domain::model::{EvidenceRow, Marker};
use std::collections::BTreeMap;

/// 整次執行的彙整狀態：建立一次、逐批吸收、最後 finalize 一次
#[derive(Debug, Clone, Default)]
pub struct AggregationState {
    order: BestHitOrder,
    rows: BTreeMap<String, EvidenceRow>,
    absorbed: usize,
}

impl AggregationState {
    pub fn new(order: BestHitOrder) -> Self {
        Self {
            order,
            rows: BTreeMap::new(),
            absorbed: 0,
        }
    }

    /// Places each winning evidence into its organism's row.
    ///
    /// An organism can receive a winner for the same marker from more than one
    /// organism-filter search; the better one under `order` is kept.
    pub fn absorb(&mut self, evidence: MarkerEvidence) {
        let marker = evidence.marker;
        self.absorbed += 1;

        for winner in evidence.into_winners() {
            let row = self
                .rows
                .entry(winner.organism.clone())
                .or_insert_with(|| EvidenceRow::new(winner.organism.clone()));

            let replace = match row.slot(marker) {
                Some(current) => self.order.prefers(&winner, current),
                None => true,
            };
            if replace {
                row.set_slot(marker, winner);
            }
        }
    }

    pub fn organism_count(&self) -> usize {
        self.rows.len()
    }

    pub fn absorbed_batches(&self) -> usize {
        self.absorbed
    }

    /// Rows ordered by organism name.
    pub fn finalize(self) -> Vec<EvidenceRow> {
        let rows: Vec<EvidenceRow> = self.rows.into_values().collect();
        for marker in Marker::ALL {
            tracing::debug!(
                "{}: present in {} of {} organisms",
                marker,
                rows.iter().filter(|row| row.is_present(marker)).count(),
                rows.len()
            );
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classifier::EvidenceClassifier;
    use crate::domain::model::{RawHit, Segment, Tier};

    fn hits(organism: &str, identities: u32, evalue: f64) -> Vec<RawHit> {
        vec![RawHit {
            title: format!("gi|1|ref|WP_1.1| marker protein [{}]", organism),
            length: 300,
            segments: vec![Segment {
                identities,
                align_length: 200,
                evalue,
                bit_score: 80.0,
            }],
        }]
    }

    #[test]
    fn test_rows_collect_markers_per_organism() {
        let classifier = EvidenceClassifier::default();
        let mut state = AggregationState::new(BestHitOrder::LargestEvalue);

        state.absorb(classifier.classify(Marker::MamB, "magneto", &hits("Magnetovibrio blakemorei", 40, 1e-30)));
        state.absorb(classifier.classify(Marker::MamK, "magneto", &hits("Magnetovibrio blakemorei", 20, 0.01)));
        state.absorb(classifier.classify(Marker::MamE, "magneto", &hits("Magnetococcus marinus", 40, 1e-30)));

        assert_eq!(state.organism_count(), 2);
        assert_eq!(state.absorbed_batches(), 3);

        let rows = state.finalize();
        assert_eq!(rows[0].organism(), "magnetococcus marinus");
        assert_eq!(rows[0].present_count(), 1);
        assert_eq!(rows[1].organism(), "magnetovibrio blakemorei");
        assert_eq!(rows[1].tier(Marker::MamB), Some(Tier::Strong));
        assert_eq!(rows[1].tier(Marker::MamK), Some(Tier::Weak));
        assert!(!rows[1].is_present(Marker::MamA));
    }

    #[test]
    fn test_overlapping_filters_keep_preferred_winner() {
        let classifier = EvidenceClassifier::default();
        let mut state = AggregationState::new(BestHitOrder::SmallestEvalue);

        state.absorb(classifier.classify(Marker::MamM, "magnetospirillum", &hits("Magnetospirillum sp.", 22, 0.02)));
        state.absorb(classifier.classify(Marker::MamM, "magnetospirillum sp", &hits("Magnetospirillum sp.", 50, 1e-50)));

        let rows = state.finalize();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].slot(Marker::MamM).unwrap().evalue, 1e-50);
    }
}
