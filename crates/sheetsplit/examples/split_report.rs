//! Example: Build a three-sheet report, then split two of its sheets into a zip

use sheetsplit::prelude::*;
use sheetsplit::{CellRange, Table, XLSX_MIME_TYPE};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut workbook = Workbook::empty();
    for name in ["Summary", "Q1", "Q2"] {
        let index = workbook.add_worksheet_with_name(name)?;
        let sheet = workbook
            .worksheet_mut(index)
            .ok_or("worksheet just added")?;

        sheet.set_cell_value("A1", "Region")?;
        sheet.set_cell_value("B1", "Amount")?;
        sheet.set_cell_value("A2", "North")?;
        sheet.set_cell_value("B2", 1250.0)?;
        sheet.add_table(Table::new(
            index as u32 + 1,
            format!("{}Sales", name),
            CellRange::parse("A1:B2")?,
        ))?;
    }

    let bytes = XlsxWriter::write_to_vec(&workbook, &Default::default())?;
    let source = SourceFile::from_bytes("Report.xlsx", XLSX_MIME_TYPE, bytes);

    let pipeline = SplitPipeline::default();
    pipeline.validate(&source)?;
    let analysis = pipeline.analyze(&source).await?;
    for sheet in &analysis.worksheets {
        println!(
            "{}: {} rows x {} columns, {} table(s)",
            sheet.name, sheet.row_count, sheet.column_count, sheet.table_count
        );
    }

    let mut progress = |p: u8| println!("  {}%", p);
    let archive = pipeline
        .process(&analysis, &["Q1", "Q2"], Some(&mut progress))
        .await?;
    let package = pipeline.package(&analysis, &archive).await?;

    let target = DirectoryTarget::new(std::env::temp_dir());
    pipeline.deliver(&package, &target).await?;
    println!(
        "Wrote {} ({} bytes)",
        target.path_for(&package).display(),
        package.size
    );

    Ok(())
}
