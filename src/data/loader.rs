use std::collections::HashMap;

use crate::catalog::client::CatalogApi;
use crate::catalog::model::Resource;
use crate::error::LoadError;

use super::model::{CellValue, Table};

/// Cells read as missing in CSV input. `inf`, `-inf` and `Infinity` are not
/// listed but still end up as `Null`: they parse as floats and
/// [`CellValue::float`] keeps only finite values.
const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// How a resource can be materialized, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Bounded, natively typed fetch from the structured store.
    Store,
    /// Unbounded fetch and parse of the CSV at the resource URL.
    Csv,
}

/// Pick the single strategy that applies to `resource`, if any.
pub fn strategy_for(resource: &Resource) -> Option<Strategy> {
    if resource.is_datastore_active() {
        Some(Strategy::Store)
    } else if resource.format_upper() == "CSV" && resource.download_url().is_some() {
        Some(Strategy::Csv)
    } else {
        None
    }
}

/// Materialize a resource as a [`Table`].
///
/// Exactly one strategy is attempted. `Ok(None)` means no strategy applies
/// to this resource; errors from the chosen strategy are returned as-is.
///
/// The structured-store path returns at most `row_limit` rows. The CSV path
/// reads the whole file.
pub fn load(
    catalog: &dyn CatalogApi,
    resource: &Resource,
    row_limit: usize,
) -> Result<Option<Table>, LoadError> {
    match strategy_for(resource) {
        Some(Strategy::Store) => {
            log::info!("Loading {} from the structured store (limit {row_limit})", resource.id);
            let mut records = catalog.store_search(&resource.id, row_limit)?;
            records.truncate(row_limit);
            Ok(Some(Table::from_records(&records)))
        }
        Some(Strategy::Csv) => {
            // strategy_for only picks Csv when a URL exists.
            let Some(url) = resource.download_url() else {
                return Ok(None);
            };
            log::info!("Loading {} as CSV from {url}", resource.id);
            let bytes = catalog.download(url)?;
            parse_csv(&bytes).map(Some)
        }
        None => {
            log::info!(
                "No load strategy for resource {} (format '{}')",
                resource.id,
                resource.format_upper()
            );
            Ok(None)
        }
    }
}

// ---------------------------------------------------------------------------
// CSV parsing
// ---------------------------------------------------------------------------

/// Parse comma-separated text with a header row.
///
/// Cell types are inferred per value. Short rows are padded with `Null`;
/// rows wider than the header are rejected. Repeated header names get a
/// numeric suffix (`a`, `a.1`, `a.2`).
pub fn parse_csv(bytes: &[u8]) -> Result<Table, LoadError> {
    let raw = String::from_utf8_lossy(bytes);
    let text = raw.strip_prefix('\u{feff}').unwrap_or(&*raw);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let columns = dedupe_headers(reader.headers()?.iter().map(str::to_string));

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result?;
        if record.len() > columns.len() {
            return Err(LoadError::RaggedRow {
                row: row_no,
                expected: columns.len(),
                found: record.len(),
            });
        }
        let mut row: Vec<CellValue> = record.iter().map(guess_cell_type).collect();
        row.resize(columns.len(), CellValue::Null);
        rows.push(row);
    }

    Ok(Table::new(columns, rows)?)
}

fn dedupe_headers(headers: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::new();
    for mut name in headers {
        let mut count = seen.get(&name).copied().unwrap_or(0);
        while count > 0 {
            seen.insert(name.clone(), count + 1);
            name = format!("{name}.{count}");
            count = seen.get(&name).copied().unwrap_or(0);
        }
        seen.insert(name.clone(), count + 1);
        out.push(name);
    }
    out
}

fn guess_cell_type(s: &str) -> CellValue {
    if NA_TOKENS.contains(&s) {
        return CellValue::Null;
    }
    let trimmed = s.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        return CellValue::float(f);
    }
    match s {
        "true" | "True" | "TRUE" => CellValue::Bool(true),
        "false" | "False" | "FALSE" => CellValue::Bool(false),
        _ => CellValue::Text(s.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::profile::classify;
    use crate::testing::FakeCatalog;
    use serde_json::json;

    fn resource(format: &str, store: bool, url: Option<&str>) -> Resource {
        Resource {
            id: "r1".into(),
            name: Some("Egresos 2020".into()),
            format: Some(format.into()),
            datastore_active: Some(store),
            url: url.map(str::to_string),
        }
    }

    #[test]
    fn store_resources_never_touch_the_csv_path_and_respect_the_limit() {
        let fake = FakeCatalog::default()
            .with_records("r1", json!([{"a": 1}, {"a": 2}, {"a": 3}, {"a": 4}]))
            .with_download("http://x/data.csv", "a\n1\n");
        let calls = fake.calls();

        let res = resource("CSV", true, Some("http://x/data.csv"));
        let table = load(&fake, &res, 2).unwrap().unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(*calls.borrow(), ["store:r1:2"]);
    }

    #[test]
    fn csv_resources_are_fetched_and_parsed() {
        let fake = FakeCatalog::default().with_download(
            "http://x/data.csv",
            "region,egresos\nMaule,10\nBiobío,20\nÑuble,30\n",
        );
        let res = resource("csv", false, Some("http://x/data.csv"));

        let table = load(&fake, &res, 1).unwrap().unwrap();

        // No row cap on the CSV path.
        assert_eq!(table.len(), 3);
        assert_eq!(table.columns(), ["region", "egresos"]);
        assert_eq!(table.rows()[2][1], CellValue::Integer(30));
    }

    #[test]
    fn unloadable_resources_are_absent_without_any_call() {
        let fake = FakeCatalog::default();
        let calls = fake.calls();

        for res in [
            resource("XLSX", false, Some("http://x/data.xlsx")),
            resource("CSV", false, None),
            resource("CSV", false, Some("  ")),
            Resource {
                id: "r2".into(),
                name: None,
                format: None,
                datastore_active: None,
                url: None,
            },
        ] {
            assert_eq!(strategy_for(&res), None);
            assert!(load(&fake, &res, 100).unwrap().is_none());
        }
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn store_failures_propagate() {
        let fake = FakeCatalog::default();
        let res = resource("CSV", true, Some("http://x/data.csv"));
        assert!(matches!(load(&fake, &res, 10), Err(LoadError::Rejected { .. })));
    }

    #[test]
    fn csv_cells_are_typed_per_value() {
        let table = parse_csv(
            "\u{feff}egresos,region,activo\n10,Maule,True\nbad,,false\n2.5,NA,\n".as_bytes(),
        )
        .unwrap();

        assert_eq!(table.columns(), ["egresos", "region", "activo"]);
        let rows = table.rows();
        assert_eq!(rows[0][0], CellValue::Integer(10));
        assert_eq!(rows[0][2], CellValue::Bool(true));
        assert_eq!(rows[1][0], CellValue::Text("bad".into()));
        assert_eq!(rows[1][1], CellValue::Null);
        assert_eq!(rows[2][0], CellValue::Float(2.5));
        assert_eq!(rows[2][1], CellValue::Null);
        assert_eq!(rows[2][2], CellValue::Null);
    }

    #[test]
    fn repeated_headers_get_suffixes_and_stay_distinct() {
        let table = parse_csv(b"codigo,codigo,codigo.1,codigo\n1,Maule,x,7\n2,Nuble,y,8\n").unwrap();
        assert_eq!(table.columns(), ["codigo", "codigo.1", "codigo.1.1", "codigo.2"]);

        let profile = classify(&table);
        assert_eq!(profile.numeric, ["codigo", "codigo.2"]);
        assert!(profile.categorical.iter().any(|c| c == "codigo.1"));
        let text: Vec<_> = table.column("codigo.1").unwrap().cloned().collect();
        assert_eq!(text, [CellValue::Text("Maule".into()), CellValue::Text("Nuble".into())]);
    }

    #[test]
    fn infinite_csv_cells_read_as_missing() {
        let table = parse_csv(b"v\ninf\n-Infinity\n3\n").unwrap();
        let cells: Vec<_> = table.column("v").unwrap().cloned().collect();
        assert_eq!(cells, [CellValue::Null, CellValue::Null, CellValue::Integer(3)]);
    }

    #[test]
    fn short_rows_are_padded_and_long_rows_rejected() {
        let table = parse_csv(b"a,b,c\n1,2\n").unwrap();
        assert_eq!(table.rows()[0], [CellValue::Integer(1), CellValue::Integer(2), CellValue::Null]);

        let err = parse_csv(b"a,b\n1,2,3\n").unwrap_err();
        assert!(matches!(err, LoadError::RaggedRow { row: 0, expected: 2, found: 3 }));
    }
}
