use crate::domain::model::{RawHit, Segment};
use crate::utils::error::{Result, ScanError};
use quick_xml::events::Event;
use quick_xml::Reader;

#[derive(Default)]
struct HitBuilder {
    id: String,
    def: String,
    length: u32,
    segments: Vec<Segment>,
}

impl HitBuilder {
    fn finish(self) -> RawHit {
        let title = match (self.id.is_empty(), self.def.is_empty()) {
            (false, false) => format!("{} {}", self.id, self.def),
            (false, true) => self.id,
            _ => self.def,
        };
        RawHit {
            title,
            length: self.length,
            segments: self.segments,
        }
    }
}

#[derive(Default)]
struct SegmentBuilder {
    identities: u32,
    align_length: u32,
    evalue: f64,
    bit_score: f64,
}

/// 解析 NCBI BLAST XML，攤平所有 Iteration 的 Hit
pub fn parse_blast_xml(xml: &str) -> Result<Vec<RawHit>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut hits = Vec::new();
    let mut hit: Option<HitBuilder> = None;
    let mut segment: Option<SegmentBuilder> = None;
    let mut element = String::new();

    loop {
        let event = reader.read_event().map_err(|e| ScanError::XmlError {
            message: format!("at byte {}: {}", reader.buffer_position(), e),
        })?;

        match event {
            Event::Start(start) => {
                element = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                match element.as_str() {
                    "Hit" => hit = Some(HitBuilder::default()),
                    "Hsp" => segment = Some(SegmentBuilder::default()),
                    _ => {}
                }
            }
            Event::Text(text) => {
                let value = text.unescape().map_err(|e| ScanError::XmlError {
                    message: format!("bad text in <{}>: {}", element, e),
                })?;
                let value = value.as_ref();

                if let Some(segment) = segment.as_mut() {
                    match element.as_str() {
                        "Hsp_identity" => segment.identities = parse_number(&element, value)?,
                        "Hsp_align-len" => segment.align_length = parse_number(&element, value)?,
                        "Hsp_evalue" => segment.evalue = parse_number(&element, value)?,
                        "Hsp_bit-score" => segment.bit_score = parse_number(&element, value)?,
                        _ => {}
                    }
                } else if let Some(hit) = hit.as_mut() {
                    match element.as_str() {
                        "Hit_id" => hit.id = value.to_string(),
                        "Hit_def" => hit.def = value.to_string(),
                        "Hit_len" => hit.length = parse_number(&element, value)?,
                        _ => {}
                    }
                }
            }
            Event::End(end) => match end.name().as_ref() {
                b"Hsp" => {
                    if let (Some(done), Some(hit)) = (segment.take(), hit.as_mut()) {
                        hit.segments.push(Segment {
                            identities: done.identities,
                            align_length: done.align_length,
                            evalue: done.evalue,
                            bit_score: done.bit_score,
                        });
                    }
                }
                b"Hit" => {
                    if let Some(done) = hit.take() {
                        hits.push(done.finish());
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(hits)
}

fn parse_number<T: std::str::FromStr>(element: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| ScanError::XmlError {
        message: format!("<{}> is not a number: '{}'", element, value),
    })
}
