//! Integration tests for record-export

use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use chrono::NaiveDate;
use record_export::accessor::{AccessorTable, Property, Record};
use record_export::metadata::{ExcelField, RecordDescriptor};
use record_export::{
    AccessError, BufferedResponse, CustomScalar, ExcelExport, ExportMode, Exportable, FormatError,
    FormatterRegistry, MemoryProfile, Value,
};
use std::any::Any;
use std::fmt;
use std::io::Read;
use std::sync::LazyLock;
use tempfile::NamedTempFile;

#[derive(Debug)]
struct Money {
    cents: i64,
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}c", self.cents)
    }
}

impl CustomScalar for Money {
    fn type_tag(&self) -> &str {
        "Money"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct Owner {
    name: String,
}

struct Pet {
    id: i32,
    name: String,
    weight: f64,
    born: NaiveDate,
    fee: i64,
    owner: Option<Owner>,
}

static OWNER: LazyLock<AccessorTable<Owner>> = LazyLock::new(|| {
    AccessorTable::<Owner>::new("Owner").value("name", |o| Value::from(o.name.as_str()))
});

static PET: LazyLock<AccessorTable<Pet>> = LazyLock::new(|| {
    AccessorTable::<Pet>::new("Pet")
        .value("id", |p| Value::from(p.id))
        .value("name", |p| Value::from(p.name.as_str()))
        .value("weight", |p| Value::from(p.weight))
        .value("born", |p| Value::from(p.born))
        .value("fee", |p| Value::custom(Money { cents: p.fee }))
        .nested("owner", |p| p.owner.as_ref().map(|o| o as &dyn Record))
});

impl Record for Owner {
    fn property(&self, name: &str) -> Result<Property<'_>, AccessError> {
        OWNER.resolve(self, name)
    }
}

impl Record for Pet {
    fn property(&self, name: &str) -> Result<Property<'_>, AccessError> {
        PET.resolve(self, name)
    }
}

impl Exportable for Pet {
    fn descriptor() -> RecordDescriptor {
        RecordDescriptor::new("Pet")
            .field("name", ExcelField::new("Name**Call name").sort(2).groups([1]))
            .field("id", ExcelField::new("ID").sort(1).groups([1, 2]))
            .field("weight", ExcelField::new("Weight").sort(3).align_code(3))
            .field("born", ExcelField::new("Born").sort(4))
            .field("owner", ExcelField::new("Owner").sort(5).path("owner.name").groups([2]))
            .field("fee", ExcelField::new("Fee").sort(6))
            .field("chip", ExcelField::new("Chip").sort(7).mode(ExportMode::Import))
    }
}

fn pet(id: i32, owner: Option<&str>) -> Pet {
    Pet {
        id,
        name: format!("pet-{}", id),
        weight: 3.14159,
        born: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        fee: 1234,
        owner: owner.map(|n| Owner {
            name: n.to_string(),
        }),
    }
}

fn money_registry() -> FormatterRegistry {
    FormatterRegistry::new().with("Money", |v| match v {
        Value::Custom(c) => c
            .as_any()
            .downcast_ref::<Money>()
            .map(|m| format!("${}.{:02}", m.cents / 100, m.cents % 100))
            .ok_or_else(|| FormatError::new("Money", "not a Money value")),
        _ => Err(FormatError::new("Money", "not a custom value")),
    })
}

fn read_sheet(path: &std::path::Path, sheet: &str) -> Range<Data> {
    let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
    workbook.worksheet_range(sheet).unwrap()
}

fn text(range: &Range<Data>, row: u32, col: u32) -> String {
    match range.get_value((row, col)) {
        Some(Data::String(s)) => s.clone(),
        Some(Data::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn number(range: &Range<Data>, row: u32, col: u32) -> f64 {
    match range.get_value((row, col)) {
        Some(Data::Float(f)) => *f,
        Some(Data::Int(i)) => *i as f64,
        Some(Data::DateTime(dt)) => dt.as_f64(),
        other => panic!("expected a number at ({}, {}), got {:?}", row, col, other),
    }
}

#[test]
fn test_export_records_roundtrip() {
    let temp = NamedTempFile::new().unwrap();

    {
        let mut export = ExcelExport::builder()
            .title("Pets")
            .registry(money_registry())
            .build_for::<Pet>(ExportMode::Export, &[])
            .unwrap();
        export
            .set_data_list(&[pet(1, Some("Ada")), pet(2, Some("Grace"))])
            .unwrap();
        export.write_file(temp.path()).unwrap();
        export.dispose();
    }

    let range = read_sheet(temp.path(), "Export");

    // Title row
    assert_eq!(text(&range, 0, 0), "Pets");

    // Header row: sorted, comment stripped, import-only column excluded
    let headers: Vec<String> = (0..6).map(|c| text(&range, 1, c)).collect();
    assert_eq!(headers, ["ID", "Name", "Weight", "Born", "Owner", "Fee"]);
    assert_eq!(text(&range, 1, 6), "");

    // Data rows
    assert_eq!(number(&range, 2, 0), 1.0);
    assert_eq!(text(&range, 2, 1), "pet-1");
    assert!((number(&range, 2, 2) - 3.14159).abs() < 1e-9);
    // 2020-01-01 as an Excel serial date
    assert_eq!(number(&range, 2, 3), 43831.0);
    assert_eq!(text(&range, 2, 4), "Ada");
    assert_eq!(text(&range, 2, 5), "$12.34");
    assert_eq!(text(&range, 3, 4), "Grace");
}

#[test]
fn test_dates_before_leap_day_bug() {
    let temp = NamedTempFile::new().unwrap();

    let mut early = pet(1, None);
    early.born = NaiveDate::from_ymd_opt(1900, 1, 15).unwrap();
    let mut later = pet(2, None);
    later.born = NaiveDate::from_ymd_opt(1900, 3, 1).unwrap();

    let mut export = ExcelExport::new::<Pet>("").unwrap();
    export.add_record(&early).unwrap();
    export.add_record(&later).unwrap();
    export.write_file(temp.path()).unwrap();

    let range = read_sheet(temp.path(), "Export");
    // Excel counts a nonexistent 1900-02-29, so serials shift by one after it
    assert_eq!(number(&range, 1, 3), 15.0);
    assert_eq!(number(&range, 2, 3), 61.0);
}

#[test]
fn test_missing_owner_writes_empty_cell() {
    let temp = NamedTempFile::new().unwrap();

    let mut export = ExcelExport::new::<Pet>("").unwrap();
    export.add_record(&pet(1, None)).unwrap();
    export.add_record(&pet(2, Some("Ada"))).unwrap();
    export.write_file(temp.path()).unwrap();
    export.dispose();

    let range = read_sheet(temp.path(), "Export");
    // no title row: header first
    assert_eq!(text(&range, 0, 0), "ID");
    assert_eq!(text(&range, 1, 4), "");
    assert_eq!(text(&range, 1, 1), "pet-1");
    assert_eq!(text(&range, 2, 4), "Ada");
    // no registry entry: Display text of the custom scalar
    assert_eq!(text(&range, 1, 5), "1234c");
}

#[test]
fn test_group_filter_selects_columns() {
    let temp = NamedTempFile::new().unwrap();

    let mut export = ExcelExport::for_record::<Pet>("", ExportMode::Export, &[2]).unwrap();
    assert_eq!(export.plan().headers().collect::<Vec<_>>(), ["ID", "Owner"]);
    export.add_record(&pet(9, Some("Linus"))).unwrap();
    export.write_file(temp.path()).unwrap();

    let range = read_sheet(temp.path(), "Export");
    assert_eq!(range.width(), 2);
    assert_eq!(text(&range, 1, 1), "Linus");
}

#[test]
fn test_large_export_flushes_and_keeps_order() {
    let temp = NamedTempFile::new().unwrap();
    let rows = 1_250;

    let mut export = ExcelExport::builder()
        .title("Ledger")
        .memory_profile(MemoryProfile::Low)
        .build_with_headers(["Seq", "Label", "Amount"])
        .unwrap();

    for i in 0..rows {
        export
            .add_row([
                Value::from(i),
                Value::from(format!("entry {}", i)),
                Value::from(i as f64 / 4.0),
            ])
            .unwrap();
        assert!(export.stats().rows_buffered <= 100);
    }

    let stats = export.stats();
    assert!(stats.flush_count >= 1);
    assert_eq!(stats.data_rows, rows as u64);
    assert_eq!(stats.rows_appended, rows as u64 + 2);

    export.write_file(temp.path()).unwrap();
    export.dispose();

    let range = read_sheet(temp.path(), "Export");
    assert_eq!(range.height(), rows as usize + 2);
    assert_eq!(text(&range, 0, 0), "Ledger");
    assert_eq!(text(&range, 1, 2), "Amount");
    for i in [0, 99, 100, 101, 777, rows - 1] {
        let row = i as u32 + 2;
        assert_eq!(number(&range, row, 0), i as f64);
        assert_eq!(text(&range, row, 1), format!("entry {}", i));
    }
}

#[test]
fn test_response_sink() {
    let mut export = ExcelExport::with_headers("Report", ["A", "B"]).unwrap();
    export.add_row([Value::from("x"), Value::from(1)]).unwrap();

    let mut response = BufferedResponse::new();
    export
        .write_response(&mut response, "pets 2024.xlsx")
        .unwrap();
    export.dispose();

    assert_eq!(
        response.content_type(),
        Some("application/octet-stream;charset=utf-8")
    );
    assert_eq!(
        response.header("Content-Disposition"),
        Some("attachment; filename=pets%202024.xlsx")
    );

    let temp = NamedTempFile::new().unwrap();
    std::fs::write(temp.path(), response.body_bytes()).unwrap();
    let range = read_sheet(temp.path(), "Export");
    assert_eq!(text(&range, 2, 0), "x");
}

#[test]
fn test_multiple_sheets_in_one_workbook() {
    let temp = NamedTempFile::new().unwrap();

    let mut export = ExcelExport::builder()
        .sheet_name("Summary")
        .title("Summary")
        .build_with_headers(["Metric", "Value"])
        .unwrap();
    export.add_row([Value::from("pets"), Value::from(2)]).unwrap();

    export
        .add_sheet_for::<Pet>("Pets", "All pets", ExportMode::Export, &[1])
        .unwrap();
    export.add_record(&pet(1, None)).unwrap();
    export.add_record(&pet(2, None)).unwrap();
    assert_eq!(export.sheet_count(), 2);

    export.write_file(temp.path()).unwrap();
    export.dispose();

    let workbook: Xlsx<_> = open_workbook(temp.path()).unwrap();
    assert_eq!(workbook.sheet_names(), ["Summary", "Pets"]);

    let summary = read_sheet(temp.path(), "Summary");
    assert_eq!(text(&summary, 2, 0), "pets");

    let pets = read_sheet(temp.path(), "Pets");
    assert_eq!(text(&pets, 1, 0), "ID");
    assert_eq!(text(&pets, 1, 1), "Name");
    assert_eq!(text(&pets, 3, 1), "pet-2");
}

#[test]
fn test_independent_exports_on_threads() {
    let handles: Vec<_> = (0..4)
        .map(|n| {
            std::thread::spawn(move || {
                let mut export = ExcelExport::builder()
                    .flush_threshold(10)
                    .build_with_headers(["N", "Square"])
                    .unwrap();
                for i in 0..100 {
                    export.add_row([Value::from(n), Value::from(i * i)]).unwrap();
                }
                let mut out = Vec::new();
                export.write(&mut out).unwrap();
                export.dispose();
                out
            })
        })
        .collect();

    for handle in handles {
        let bytes = handle.join().unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}

#[test]
fn test_package_holds_header_note_and_title_merge() {
    let temp = NamedTempFile::new().unwrap();

    let mut export = ExcelExport::with_headers("Report", ["A", "B**Note text"]).unwrap();
    export.add_row([Value::from("x"), Value::from(1)]).unwrap();
    export.write_file(temp.path()).unwrap();
    export.dispose();

    let mut archive = zip::ZipArchive::new(std::fs::File::open(temp.path()).unwrap()).unwrap();

    let mut comments = String::new();
    archive
        .by_name("xl/comments1.xml")
        .unwrap()
        .read_to_string(&mut comments)
        .unwrap();
    assert!(comments.contains("Note text"));

    let mut sheet = String::new();
    archive
        .by_name("xl/worksheets/sheet1.xml")
        .unwrap()
        .read_to_string(&mut sheet)
        .unwrap();
    assert!(sheet.contains(r#"<mergeCell ref="A1:B1"/>"#));
}
