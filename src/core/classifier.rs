use crate::core::title::parse_title;
use crate::domain::model::{Evidence, Marker, RawHit, Segment, Tier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One tier's cutoffs. All comparisons are strict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierThresholds {
    pub min_identities: u32,
    pub max_evalue: f64,
    pub min_align_length: u32,
}

impl TierThresholds {
    pub fn weak_default() -> Self {
        Self {
            min_identities: 18,
            max_evalue: 0.05,
            min_align_length: 100,
        }
    }

    pub fn strong_default() -> Self {
        Self {
            min_identities: 25,
            max_evalue: 0.0001,
            min_align_length: 100,
        }
    }

    pub fn admits(&self, segment: &Segment) -> bool {
        segment.identities > self.min_identities
            && segment.align_length > self.min_align_length
            && segment.evalue < self.max_evalue
    }
}

/// 同一物種有多筆證據時，決定哪一筆勝出。
///
/// 預設 `LargestEvalue`：e-value 較大者勝出，
/// 與一般同源搜尋「e-value 越小越好」的慣例相反。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BestHitOrder {
    #[default]
    LargestEvalue,
    SmallestEvalue,
}

impl BestHitOrder {
    /// True when `candidate` should replace `current`. Ties keep `current`.
    pub fn prefers(self, candidate: &Evidence, current: &Evidence) -> bool {
        match self {
            BestHitOrder::LargestEvalue => candidate.evalue > current.evalue,
            BestHitOrder::SmallestEvalue => candidate.evalue < current.evalue,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    pub block_word: String,
    pub best_hit: BestHitOrder,
    pub weak: TierThresholds,
    pub strong: TierThresholds,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            block_word: "hypothetical".to_string(),
            best_hit: BestHitOrder::default(),
            weak: TierThresholds::weak_default(),
            strong: TierThresholds::strong_default(),
        }
    }
}

/// Winning evidence per organism for one marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerEvidence {
    pub marker: Marker,
    winners: BTreeMap<String, Evidence>,
}

impl MarkerEvidence {
    pub fn new(marker: Marker) -> Self {
        Self {
            marker,
            winners: BTreeMap::new(),
        }
    }

    pub fn get(&self, organism: &str) -> Option<&Evidence> {
        self.winners.get(organism)
    }

    pub fn len(&self) -> usize {
        self.winners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.winners.is_empty()
    }

    pub fn into_winners(self) -> impl Iterator<Item = Evidence> {
        self.winners.into_values()
    }

    fn offer(&mut self, evidence: Evidence, order: BestHitOrder) {
        match self.winners.get_mut(&evidence.organism) {
            Some(current) => {
                if order.prefers(&evidence, current) {
                    *current = evidence;
                }
            }
            None => {
                self.winners.insert(evidence.organism.clone(), evidence);
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EvidenceClassifier {
    settings: ClassifierSettings,
}

impl EvidenceClassifier {
    pub fn new(settings: ClassifierSettings) -> Self {
        Self { settings }
    }

    /// Tier for one segment, or `None` when it is rejected.
    pub fn assess(&self, title: &str, segment: &Segment) -> Option<Tier> {
        if title.contains(self.settings.block_word.as_str())
            && segment.identities <= self.settings.strong.min_identities
        {
            return None;
        }

        if !self.settings.weak.admits(segment) {
            return None;
        }

        if self.settings.strong.admits(segment) {
            Some(Tier::Strong)
        } else {
            Some(Tier::Weak)
        }
    }

    pub fn classify(&self, marker: Marker, organism_filter: &str, hits: &[RawHit]) -> MarkerEvidence {
        let filter = organism_filter.to_lowercase();
        let mut evidence = MarkerEvidence::new(marker);
        let mut rejected = 0usize;
        let mut off_target = 0usize;

        for hit in hits {
            for segment in &hit.segments {
                let Some(tier) = self.assess(&hit.title, segment) else {
                    rejected += 1;
                    continue;
                };

                let parsed = parse_title(&hit.title);
                if !parsed.organism.contains(filter.as_str()) {
                    off_target += 1;
                    continue;
                }

                evidence.offer(
                    Evidence {
                        organism: parsed.organism,
                        protein: parsed.protein,
                        tier,
                        identities: segment.identities,
                        evalue: segment.evalue,
                    },
                    self.settings.best_hit,
                );
            }
        }

        tracing::debug!(
            "{} / '{}': {} hits, {} organisms kept, {} segments rejected, {} off-target",
            marker,
            organism_filter,
            hits.len(),
            evidence.len(),
            rejected,
            off_target
        );

        evidence
    }
}
