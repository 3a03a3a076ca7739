use crate::domain::model::{Confidence, EvidenceRow, Marker, ProductionType, Tier, Verdict};

/// 產生型別判定所需的核心四個標記
pub const CORE_QUARTET: [Marker; 4] = [Marker::MamB, Marker::MamM, Marker::MamO, Marker::MamE];

#[derive(Debug, Clone, Copy, Default)]
pub struct ProductionTypeResolver;

impl ProductionTypeResolver {
    pub fn new() -> Self {
        Self
    }

    pub fn resolve(&self, row: &EvidenceRow) -> Verdict {
        let (production_type, confidence) = Self::decide(row);
        Verdict {
            organism: row.organism().to_string(),
            production_type,
            confidence,
            displays: row.displays(),
        }
    }

    fn decide(row: &EvidenceRow) -> (ProductionType, Confidence) {
        // Rule 1: core quartet
        let quartet: Option<Vec<Tier>> = CORE_QUARTET.iter().map(|&m| row.tier(m)).collect();
        let Some(quartet) = quartet else {
            return (ProductionType::Unassigned, Confidence::Unassigned);
        };

        let mut production_type = ProductionType::A;
        let mut confidence = if quartet.iter().all(|&tier| tier == Tier::Strong) {
            Confidence::Strong
        } else {
            Confidence::Weak
        };

        // Rule 2: MamA escalation
        let mam_a = row.tier(Marker::MamA);
        if let Some(tier_a) = mam_a {
            production_type = ProductionType::C;
            confidence = Self::escalate(confidence, &[tier_a]);
        }

        // Rule 3: MamK + MamA escalation
        if let (Some(tier_a), Some(tier_k)) = (mam_a, row.tier(Marker::MamK)) {
            production_type = ProductionType::CC;
            confidence = Self::escalate(confidence, &[tier_a, tier_k]);
        }

        (production_type, confidence)
    }

    /// Strong only if nothing downgraded it yet and every contributing marker is strong.
    fn escalate(current: Confidence, tiers: &[Tier]) -> Confidence {
        if current == Confidence::Strong && tiers.iter().all(|&tier| tier == Tier::Strong) {
            Confidence::Strong
        } else {
            Confidence::Weak
        }
    }
}
