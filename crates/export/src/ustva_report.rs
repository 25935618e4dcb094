//! Rendering of aggregated UStVA figures.

use csv::{Terminator, WriterBuilder};

use aioffice_core::{OfficeError, OfficeResult};
use aioffice_tax::UstvaFigures;
use rust_decimal::Decimal;

use crate::{ExportFile, ExportFormat};

/// Render the Kennziffer table as CSV (Kennziffer;Bezeichnung;Betrag) or as
/// a JSON object mirroring the figure fields.
pub fn render_ustva(figures: &UstvaFigures, format: ExportFormat) -> OfficeResult<ExportFile> {
    let filename = format!("ustva_{}.{}", figures.period, format.extension());
    let content = match format {
        ExportFormat::Csv => render_csv(figures)?,
        ExportFormat::Json => serde_json::to_string_pretty(figures)
            .map_err(|e| OfficeError::serialization(e.to_string()))?,
    };
    Ok(ExportFile { filename, content })
}

fn betrag(value: Decimal) -> String {
    format!("{value:.2}")
}

fn render_csv(figures: &UstvaFigures) -> OfficeResult<String> {
    let mut writer = WriterBuilder::new()
        .delimiter(b';')
        .terminator(Terminator::CRLF)
        .from_writer(Vec::new());
    let rows: [(&str, &str, String); 5] = [
        ("81", "Steuerpflichtige Umsaetze 19%", betrag(figures.kz81)),
        ("86", "Steuerpflichtige Umsaetze 7%", betrag(figures.kz86)),
        ("66", "Vorsteuer 19%", betrag(figures.kz66)),
        ("61", "Vorsteuer 7%", betrag(figures.kz61)),
        ("83", "Vorauszahlung", betrag(figures.kz83)),
    ];
    writer
        .write_record(["Kennziffer", "Bezeichnung", "Betrag"])
        .map_err(|e| OfficeError::serialization(e.to_string()))?;
    for (kennziffer, bezeichnung, amount) in &rows {
        writer
            .write_record([*kennziffer, *bezeichnung, amount.as_str()])
            .map_err(|e| OfficeError::serialization(e.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| OfficeError::serialization(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| OfficeError::serialization(e.to_string()))
}
