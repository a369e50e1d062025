//! Stream a large export with a memory profile taken from the environment

use record_export::{ExcelExport, MemoryProfile, Value};
use std::time::Instant;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let profile = MemoryProfile::from_env();
    println!(
        "Memory profile: {:?} ({} rows in memory)",
        profile,
        profile.flush_threshold()
    );

    let start = Instant::now();
    let mut export = ExcelExport::builder()
        .title("Transactions")
        .sheet_name("Transactions")
        .memory_profile(profile)
        .build_with_headers(["ID", "Account", "Amount**Signed, in USD", "Memo"])?;

    for i in 0..100_000i64 {
        export.add_row([
            Value::from(i),
            Value::from(format!("ACC-{:05}", i % 5000)),
            Value::from((i % 2000) as f64 * 1.25 - 1000.0),
            Value::from(if i % 7 == 0 { "refund" } else { "purchase" }),
        ])?;
    }

    let stats = export.stats();
    println!(
        "Appended {} rows, {} flushes, {} rows still buffered",
        stats.rows_appended, stats.flush_count, stats.rows_buffered
    );

    // Second sheet composed into the same workbook
    export.add_sheet(
        "Summary",
        "Summary",
        record_export::ColumnPlan::from_headers(["Metric", "Value"])?,
    )?;
    export.add_row([Value::from("rows"), Value::from(100_000i64)])?;

    export.write_file("transactions.xlsx")?;
    export.dispose();

    println!(
        "Excel file created successfully: transactions.xlsx ({:.2?})",
        start.elapsed()
    );
    Ok(())
}
