use crate::domain::model::{Marker, Verdict};
use crate::utils::error::{Result, ScanError};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub organism: String,
    pub production_type: String,
    pub confidence: String,
    pub markers: [String; 8],
}

impl TableRow {
    fn fields(&self) -> impl Iterator<Item = &str> + '_ {
        [
            self.organism.as_str(),
            self.production_type.as_str(),
            self.confidence.as_str(),
        ]
        .into_iter()
        .chain(self.markers.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TableBuilder;

impl TableBuilder {
    pub fn header() -> Vec<&'static str> {
        let mut header = vec!["Taxonomy", "Production type", "Statistic class"];
        header.extend(Marker::ALL.iter().map(|marker| marker.name()));
        header
    }

    /// 只保留通過核心四標記規則的物種，其餘直接略過
    pub fn build(verdicts: &[Verdict]) -> Vec<TableRow> {
        verdicts
            .iter()
            .filter(|verdict| verdict.is_included())
            .map(|verdict| TableRow {
                organism: verdict.organism.clone(),
                production_type: verdict.production_type.to_string(),
                confidence: verdict.confidence.to_string(),
                markers: verdict.displays.clone(),
            })
            .collect()
    }

    /// Tab separated, CRLF line endings, header first. Cells are written verbatim.
    pub fn render_tsv(rows: &[TableRow]) -> Result<String> {
        let mut writer = WriterBuilder::new()
            .delimiter(b'\t')
            .terminator(Terminator::CRLF)
            .quote_style(QuoteStyle::Never)
            .from_writer(Vec::new());

        writer.write_record(Self::header())?;
        for row in rows {
            writer.write_record(row.fields())?;
        }

        let bytes = writer.into_inner().map_err(|e| ScanError::ProcessingError {
            message: format!("Failed to flush table: {}", e),
        })?;
        String::from_utf8(bytes).map_err(|e| ScanError::ProcessingError {
            message: format!("Table is not valid UTF-8: {}", e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Confidence, ProductionType};

    fn verdict(organism: &str, production_type: ProductionType, confidence: Confidence) -> Verdict {
        let mut displays: [String; 8] = std::array::from_fn(|_| "-".to_string());
        displays[1] = "1e-30 (80%) gi|2|ref|WP_2.1| MamB ".to_string();
        Verdict {
            organism: organism.to_string(),
            production_type,
            confidence,
            displays,
        }
    }

    #[test]
    fn test_header() {
        assert_eq!(
            TableBuilder::header().join("\t"),
            "Taxonomy\tProduction type\tStatistic class\tMamA\tMamB\tMamM\tMamO\tMamE\tMamN\tMamK\tMamH"
        );
    }

    #[test]
    fn test_excluded_verdicts_are_omitted() {
        let verdicts = vec![
            verdict("magnetococcus marinus", ProductionType::A, Confidence::Strong),
            verdict("escherichia coli", ProductionType::Unassigned, Confidence::Unassigned),
        ];
        let rows = TableBuilder::build(&verdicts);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].organism, "magnetococcus marinus");
        assert_eq!(rows[0].production_type, "A");
        assert_eq!(rows[0].confidence, "strong");
    }

    #[test]
    fn test_render_tsv() {
        let rows = TableBuilder::build(&[verdict(
            "magnetococcus marinus",
            ProductionType::CC,
            Confidence::Weak,
        )]);
        let tsv = TableBuilder::render_tsv(&rows).unwrap();
        let lines: Vec<&str> = tsv.split("\r\n").collect();

        assert_eq!(lines.len(), 3); // header + 1 row + trailing empty
        assert!(lines[0].starts_with("Taxonomy\tProduction type\tStatistic class\tMamA"));
        assert_eq!(
            lines[1],
            "magnetococcus marinus\tCC\tweak\t-\t1e-30 (80%) gi|2|ref|WP_2.1| MamB \t-\t-\t-\t-\t-\t-"
        );
        assert_eq!(lines[2], "");
    }

    #[test]
    fn test_quotes_in_protein_are_not_escaped() {
        let mut quoted = verdict("magnetococcus marinus", ProductionType::A, Confidence::Strong);
        quoted.displays[1] = r#"1e-30 (80%) gi|2| MamB "putative" "#.to_string();

        let tsv = TableBuilder::render_tsv(&TableBuilder::build(&[quoted])).unwrap();
        let row = tsv.split("\r\n").nth(1).unwrap();
        let cells: Vec<&str> = row.split('\t').collect();

        assert_eq!(cells[4], r#"1e-30 (80%) gi|2| MamB "putative" "#);
    }

    #[test]
    fn test_render_empty_table_has_header_only() {
        let tsv = TableBuilder::render_tsv(&[]).unwrap();
        assert!(tsv.ends_with("MamH\r\n"));
        assert_eq!(tsv.matches("\r\n").count(), 1);
    }
}
