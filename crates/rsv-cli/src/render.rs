//! Report rendering: aligned text or JSON.

use std::io::{self, Write};

use prettytable::format::{FormatBuilder, TableFormat};
use prettytable::{Cell, Row, Table};
use rsv_reconcile::ReservationReport;

pub const ON_DEMAND_HEADER: &str = "On-demand instances:";
pub const UNUSED_HEADER: &str = "Unused reservations:";

/// Borderless, left-aligned columns separated by one space.
fn plain_format() -> TableFormat {
    FormatBuilder::new().padding(0, 1).build()
}

/// Two sections, each preceded by its header; an empty section prints nothing.
///
/// On-demand rows: `type count zone`. Unused rows: `type count`.
pub fn render_table<W: Write>(report: &ReservationReport, out: &mut W) -> io::Result<()> {
    if !report.on_demand.is_empty() {
        writeln!(out, "{ON_DEMAND_HEADER}")?;
        let mut table = Table::new();
        table.set_format(plain_format());
        for row in &report.on_demand {
            table.add_row(Row::new(vec![
                Cell::new(&row.instance_type),
                Cell::new(&row.count.to_string()),
                Cell::new(&row.zone),
            ]));
        }
        table.print(out)?;
    }

    if !report.unused.is_empty() {
        writeln!(out, "{UNUSED_HEADER}")?;
        let mut table = Table::new();
        table.set_format(plain_format());
        for row in &report.unused {
            table.add_row(Row::new(vec![
                Cell::new(&row.instance_type),
                Cell::new(&row.count.to_string()),
            ]));
        }
        table.print(out)?;
    }

    Ok(())
}

pub fn render_json<W: Write>(report: &ReservationReport, out: &mut W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)
}
