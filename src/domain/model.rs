use serde::{Deserialize, Serialize};
use std::fmt;

/// 固定的 8 個磁小體標記蛋白，順序即輸出欄位順序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Marker {
    MamA,
    MamB,
    MamM,
    MamO,
    MamE,
    MamN,
    MamK,
    MamH,
}

impl Marker {
    pub const ALL: [Marker; 8] = [
        Marker::MamA,
        Marker::MamB,
        Marker::MamM,
        Marker::MamO,
        Marker::MamE,
        Marker::MamN,
        Marker::MamK,
        Marker::MamH,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Marker::MamA => "MamA",
            Marker::MamB => "MamB",
            Marker::MamM => "MamM",
            Marker::MamO => "MamO",
            Marker::MamE => "MamE",
            Marker::MamN => "MamN",
            Marker::MamK => "MamK",
            Marker::MamH => "MamH",
        }
    }

    /// Reference protein accession submitted as the search query.
    pub fn reference_id(self) -> &'static str {
        match self {
            Marker::MamA => "AAL09996.1",
            Marker::MamB => "AAL09999.1",
            Marker::MamM => "CDK99590.1",
            Marker::MamO => "CDK99588.1",
            Marker::MamE => "CDK99594.1",
            Marker::MamN => "CDK99589.1",
            Marker::MamK => "CDK99592.1",
            Marker::MamH => "CDK99596.1",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Weak,
    Strong,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Weak => f.write_str("weak"),
            Tier::Strong => f.write_str("strong"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductionType {
    Unassigned,
    A,
    C,
    CC,
}

impl fmt::Display for ProductionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductionType::Unassigned => f.write_str("none"),
            ProductionType::A => f.write_str("A"),
            ProductionType::C => f.write_str("C"),
            ProductionType::CC => f.write_str("CC"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    Unassigned,
    Weak,
    Strong,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Unassigned => f.write_str("none"),
            Confidence::Weak => f.write_str("weak"),
            Confidence::Strong => f.write_str("strong"),
        }
    }
}

/// One HSP inside a hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub identities: u32,
    pub align_length: u32,
    pub evalue: f64,
    pub bit_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawHit {
    pub title: String,
    pub length: u32,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub organism: String,
    pub protein: String,
    pub tier: Tier,
    pub identities: u32,
    pub evalue: f64,
}

impl Evidence {
    /// `<e-value> (<identities>%) <protein>`
    pub fn display(&self) -> String {
        format!(
            "{} ({}%) {}",
            format_evalue(self.evalue),
            self.identities,
            self.protein
        )
    }
}

pub const ABSENT: &str = "-";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvidenceRow {
    organism: String,
    slots: [Option<Evidence>; 8],
}

impl EvidenceRow {
    pub fn new(organism: impl Into<String>) -> Self {
        Self {
            organism: organism.into().to_lowercase(),
            slots: Default::default(),
        }
    }

    pub fn organism(&self) -> &str {
        &self.organism
    }

    pub fn slot(&self, marker: Marker) -> Option<&Evidence> {
        self.slots[marker.index()].as_ref()
    }

    pub fn set_slot(&mut self, marker: Marker, evidence: Evidence) {
        self.slots[marker.index()] = Some(evidence);
    }

    pub fn tier(&self, marker: Marker) -> Option<Tier> {
        self.slot(marker).map(|evidence| evidence.tier)
    }

    pub fn is_present(&self, marker: Marker) -> bool {
        self.slot(marker).is_some()
    }

    pub fn displays(&self) -> [String; 8] {
        Marker::ALL.map(|marker| {
            self.slot(marker)
                .map(Evidence::display)
                .unwrap_or_else(|| ABSENT.to_string())
        })
    }

    pub fn present_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub organism: String,
    pub production_type: ProductionType,
    pub confidence: Confidence,
    pub displays: [String; 8],
}

impl Verdict {
    pub fn is_included(&self) -> bool {
        self.production_type != ProductionType::Unassigned
    }
}

/// 一次搜尋（或快取）取得的原始 BLAST XML 文件
#[derive(Debug, Clone)]
pub struct SearchDocument {
    pub organism_filter: String,
    pub marker: Marker,
    pub body: String,
    pub from_cache: bool,
}

#[derive(Debug, Clone)]
pub struct SurveyResult {
    pub verdicts: Vec<Verdict>,
    pub rows: Vec<EvidenceRow>,
    pub tsv_output: String,
}

impl SurveyResult {
    pub fn included_count(&self) -> usize {
        self.verdicts.iter().filter(|v| v.is_included()).count()
    }
}

/// Renders an e-value the way a shortest round-trip float printer does:
/// plain decimal inside `[1e-4, 1e16)`, scientific with a two digit
/// exponent outside it.
pub fn format_evalue(value: f64) -> String {
    if value == 0.0 {
        return "0.0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }

    let magnitude = value.abs();
    if (1e-4..1e16).contains(&magnitude) {
        let plain = value.to_string();
        if plain.contains('.') {
            plain
        } else {
            format!("{}.0", plain)
        }
    } else {
        let scientific = format!("{:e}", value);
        match scientific.split_once('e') {
            Some((mantissa, exponent)) => {
                let (sign, digits) = match exponent.strip_prefix('-') {
                    Some(digits) => ('-', digits),
                    None => ('+', exponent),
                };
                format!("{}e{}{:0>2}", mantissa, sign, digits)
            }
            None => scientific,
        }
    }
}
