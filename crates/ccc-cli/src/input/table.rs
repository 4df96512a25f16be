use rust_decimal::Decimal;
use std::io::Read;
use std::str::FromStr;

use ccc_core::metrics::table::FinancialTable;

/// Parse CSV with a header row into a numeric table.
///
/// Empty cells become `None`. Cells that are not numbers also become `None`
/// so the core can reject the row if the column is required.
pub fn parse_csv<R: Read>(reader: R) -> Result<FinancialTable, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let columns: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let mut table = FinancialTable::new(columns);

    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let cells = record
            .iter()
            .enumerate()
            .map(|(col, raw)| {
                let cell = parse_cell(raw);
                if cell.is_none() && !raw.is_empty() {
                    tracing::warn!(row, column = col, value = raw, "non-numeric cell treated as missing");
                }
                cell
            })
            .collect();
        table.push_row(cells);
    }

    Ok(table)
}

fn parse_cell(raw: &str) -> Option<Decimal> {
    if raw.is_empty() {
        return None;
    }
    let cleaned = raw.replace(',', "");
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}
