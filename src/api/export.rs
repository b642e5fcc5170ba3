//! Export encodings for measurement results: JSON, CSV and a KML-style markup
//!
//! CSV columns:
//! - id: caller-supplied measurement identifier
//! - type: `parcel` for the whole boundary, `section` for each named section
//! - area: area in the configured area unit
//! - perimeter: perimeter in the configured linear unit
//! - vertex_count: boundary vertex count (sections: their own count)

use crate::api::types::{MeasurementResult, PrecisionSettings};
use crate::api::units::round_to_precision;
use std::io::Write;
use thiserror::Error;

/// Error types for result export
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("export produced invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// serde_json encoding of whole results
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExporter {
    pub pretty: bool,
}

impl JsonExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    pub fn export<W: Write>(&self, writer: W, results: &[MeasurementResult]) -> ExportResult<()> {
        if self.pretty {
            serde_json::to_writer_pretty(writer, results)?;
        } else {
            serde_json::to_writer(writer, results)?;
        }
        Ok(())
    }

    pub fn to_string(&self, result: &MeasurementResult) -> ExportResult<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(result)?
        } else {
            serde_json::to_string(result)?
        };
        Ok(json)
    }

    pub fn parse(&self, json: &str) -> ExportResult<MeasurementResult> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Tabular export, one `parcel` row per result plus one `section` row per section
#[derive(Debug, Clone)]
pub struct CsvExporter {
    pub include_header: bool,
    pub delimiter: u8,
    settings: PrecisionSettings,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self {
            include_header: true,
            delimiter: b',',
            settings: PrecisionSettings::default(),
        }
    }
}

impl CsvExporter {
    /// Exporter writing values in the units of `settings`
    pub fn new(settings: PrecisionSettings) -> Self {
        Self { settings, ..Default::default() }
    }

    pub fn without_header(mut self) -> Self {
        self.include_header = false;
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn header(&self) -> [&'static str; 5] {
        ["id", "type", "area", "perimeter", "vertex_count"]
    }

    pub fn export<W: Write>(&self, writer: W, results: &[MeasurementResult]) -> ExportResult<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .from_writer(writer);

        if self.include_header {
            csv_writer.write_record(self.header())?;
        }

        for result in results {
            csv_writer.write_record([
                result.id.as_str(),
                "parcel",
                &self.area_field(result.area_sqft),
                &self.length_field(result.perimeter_ft),
                &result.vertex_count().to_string(),
            ])?;
            for section in &result.sections {
                csv_writer.write_record([
                    result.id.as_str(),
                    "section",
                    &self.area_field(section.area_sqft),
                    &self.length_field(section.perimeter_ft),
                    &section.vertex_count.to_string(),
                ])?;
            }
        }

        csv_writer.flush()?;
        Ok(())
    }

    pub fn to_string(&self, results: &[MeasurementResult]) -> ExportResult<String> {
        let mut output = Vec::new();
        self.export(&mut output, results)?;
        Ok(String::from_utf8(output)?)
    }

    fn area_field(&self, value_sqft: f64) -> String {
        let value = self.settings.area_unit.from_square_feet(value_sqft);
        round_to_precision(value, self.settings.decimal_places).to_string()
    }

    fn length_field(&self, value_ft: f64) -> String {
        let value = self.settings.linear_unit.from_feet(value_ft);
        round_to_precision(value, self.settings.decimal_places).to_string()
    }
}

/// KML-style document with one Placemark per result
#[derive(Debug, Clone, Default)]
pub struct MarkupExporter {
    /// Document name; defaults to "Parcel measurements"
    pub document_name: Option<String>,
}

impl MarkupExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document_name(mut self, name: impl Into<String>) -> Self {
        self.document_name = Some(name.into());
        self
    }

    pub fn export<W: Write>(&self, mut writer: W, results: &[MeasurementResult]) -> ExportResult<()> {
        writer.write_all(self.render(results).as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    pub fn render(&self, results: &[MeasurementResult]) -> String {
        let name = self.document_name.as_deref().unwrap_or("Parcel measurements");
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        out.push_str("<kml xmlns=\"http://www.opengis.net/kml/2.2\">\n<Document>\n");
        out.push_str(&format!("  <name>{}</name>\n", xml_escape(name)));

        for result in results {
            out.push_str("  <Placemark>\n");
            out.push_str(&format!("    <name>{}</name>\n", xml_escape(&result.id)));
            out.push_str(&format!(
                "    <description>{:.2} sq ft, {:.2} ft perimeter</description>\n",
                result.area_sqft, result.perimeter_ft
            ));
            out.push_str("    <Polygon><outerBoundaryIs><LinearRing><coordinates>\n");

            let vertices = result.boundary.vertices();
            for vertex in vertices.iter().chain(vertices.first()) {
                out.push_str(&format!("      {},{},0\n", vertex.longitude, vertex.latitude));
            }

            out.push_str("    </coordinates></LinearRing></outerBoundaryIs></Polygon>\n");
            out.push_str("  </Placemark>\n");
        }

        out.push_str("</Document>\n</kml>\n");
        out
    }
}

fn xml_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
