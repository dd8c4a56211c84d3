use std::collections::HashMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::pipeline::{
    CLAIM_RATE_WORKBOOK, CLAIM_VIEW_SUMMARY, CLAIM_VIEW_WORKBOOK, PROFITABILITY_SUMMARY,
    PROFITABILITY_WORKBOOK, SEGMENTATION_SUMMARY, SEGMENTATION_WORKBOOK,
};
use crate::report::markdown_table;
use crate::table::Table;
use crate::workbook;

/// Read-through cache of mirrored sheets keyed by `(source, sheet)`.
///
/// Absent sheets are cached as `None` as well; call [`SheetCache::invalidate`]
/// or [`SheetCache::clear`] after outputs are rewritten.
#[derive(Debug, Default)]
pub struct SheetCache {
    entries: HashMap<(PathBuf, String), Option<Table>>,
    loads: usize,
}

impl SheetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, source: &Path, sheet: &str) -> Result<Option<&Table>> {
        let key = (source.to_path_buf(), sheet.to_string());
        if !self.entries.contains_key(&key) {
            let path = source.join(format!("{sheet}.csv"));
            let table = if path.is_file() {
                Some(workbook::read_csv_sheet(&path)?)
            } else {
                None
            };
            self.loads += 1;
            tracing::debug!(path = %path.display(), found = table.is_some(), "loaded sheet");
            self.entries.insert(key.clone(), table);
        }
        Ok(self.entries.get(&key).and_then(Option::as_ref))
    }

    /// Drops one cached sheet; returns whether it was cached.
    pub fn invalidate(&mut self, source: &Path, sheet: &str) -> bool {
        self.entries
            .remove(&(source.to_path_buf(), sheet.to_string()))
            .is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn loads(&self) -> usize {
        self.loads
    }
}

enum SheetSelection {
    Named(&'static [&'static str]),
    All,
}

struct Tab {
    title: &'static str,
    workbook: &'static str,
    sheets: SheetSelection,
    summary: Option<&'static str>,
}

const TABS: [Tab; 4] = [
    Tab {
        title: "Claim View Metrics",
        workbook: CLAIM_VIEW_WORKBOOK,
        sheets: SheetSelection::Named(&[
            "Overall_Worker_Stats",
            "Overall_Shift_Stats",
            "AM_Worker_Stats",
            "PM_Worker_Stats",
            "Overnight_Worker_Stats",
        ]),
        summary: Some(CLAIM_VIEW_SUMMARY),
    },
    Tab {
        title: "Claim % by Rate",
        workbook: CLAIM_RATE_WORKBOOK,
        sheets: SheetSelection::Named(&[
            "All_Rate_Slot_Combos",
            "Top_10_Percent",
            "Pivot_Rate_vs_Slot",
        ]),
        summary: None,
    },
    Tab {
        title: "Profitability",
        workbook: PROFITABILITY_WORKBOOK,
        sheets: SheetSelection::Named(&["Profit_By_Shift_Type", "Profit_By_PayRate"]),
        summary: Some(PROFITABILITY_SUMMARY),
    },
    Tab {
        title: "Worker Grouping",
        workbook: SEGMENTATION_WORKBOOK,
        sheets: SheetSelection::All,
        summary: Some(SEGMENTATION_SUMMARY),
    },
];

pub fn render(cache: &mut SheetCache, output_dir: &Path, max_rows: usize) -> Result<String> {
    let mut output = String::new();
    let _ = writeln!(output, "# Shift Analysis Dashboard");

    for tab in &TABS {
        let _ = writeln!(output);
        let _ = writeln!(output, "## {}", tab.title);

        let source = workbook::mirror_dir(output_dir, tab.workbook);
        let names: Vec<String> = match tab.sheets {
            SheetSelection::Named(names) => names.iter().map(|n| n.to_string()).collect(),
            SheetSelection::All => workbook::list_mirror_sheets(&source)?,
        };

        let mut rendered = 0;
        for name in names {
            let Some(table) = cache.get(&source, &name)? else {
                continue;
            };
            if table.is_empty() {
                continue;
            }
            let _ = writeln!(output);
            let _ = writeln!(output, "### {}", name.replace('_', " "));
            let _ = writeln!(output);
            output.push_str(&markdown_table(table, max_rows));
            rendered += 1;
        }

        if let Some(file_name) = tab.summary {
            let path = output_dir.join(file_name);
            if path.is_file() {
                let text = std::fs::read_to_string(&path)?;
                let _ = writeln!(output);
                let _ = writeln!(output, "```text");
                output.push_str(text.trim_end());
                let _ = writeln!(output);
                let _ = writeln!(output, "```");
                rendered += 1;
            }
        }

        if rendered == 0 {
            let _ = writeln!(output);
            let _ = writeln!(output, "No data available.");
        }
    }

    Ok(output)
}
