//! Styled spreadsheet output for scan reports: one worksheet, a formatted
//! header, categorical highlighting on the trend and momentum columns.

use rust_xlsxwriter::{
    Color, ConditionalFormatText, ConditionalFormatTextRule, Format, FormatBorder, Workbook,
    XlsxError,
};
use scan_core::{ReportRenderer, ScanError, ScanReport};
use std::path::Path;

const SHEET_NAME: &str = "Market_Scan";
const HEADERS: [&str; 6] = ["Ticker", "Price", "Trend", "RSI", "RSI Status", "Beta"];
const COLUMN_WIDTHS: [f64; 6] = [15.0, 10.0, 15.0, 8.0, 20.0, 8.0];
const TREND_COL: u16 = 2;
const STATUS_COL: u16 = 4;
/// Conditional formats cover a fixed block below the header
const FORMAT_ROWS: u32 = 100;

pub struct XlsxReportWriter {
    /// Open the finished workbook with the OS default application.
    /// Best effort; a failure is logged and never fails the run.
    pub open_after_save: bool,
}

impl XlsxReportWriter {
    pub fn new() -> Self {
        Self {
            open_after_save: false,
        }
    }

    pub fn with_auto_open(mut self) -> Self {
        self.open_after_save = true;
        self
    }
}

impl Default for XlsxReportWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportRenderer for XlsxReportWriter {
    fn render(&self, report: &ScanReport, path: &Path) -> Result<(), ScanError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME).map_err(render_error)?;

        let header_format = Format::new()
            .set_bold()
            .set_background_color(Color::RGB(0xD3D3D3))
            .set_border(FormatBorder::Thin);
        let number_format = Format::new().set_num_format("0.00");
        let favorable = Format::new()
            .set_background_color(Color::RGB(0xC6EFCE))
            .set_font_color(Color::RGB(0x006100));
        let unfavorable = Format::new()
            .set_background_color(Color::RGB(0xFFC7CE))
            .set_font_color(Color::RGB(0x9C0006));

        for (col, header) in HEADERS.iter().enumerate() {
            worksheet
                .write_string_with_format(0, col as u16, *header, &header_format)
                .map_err(render_error)?;
        }
        for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
            worksheet
                .set_column_width(col as u16, *width)
                .map_err(render_error)?;
        }

        for (i, row) in report.rows.iter().enumerate() {
            let r = (i + 1) as u32;
            worksheet
                .write_string(r, 0, row.ticker.as_str())
                .map_err(render_error)?;
            worksheet
                .write_number_with_format(r, 1, row.price, &number_format)
                .map_err(render_error)?;
            worksheet
                .write_string(r, TREND_COL, row.trend.as_str())
                .map_err(render_error)?;
            if let Some(rsi) = row.rsi {
                worksheet
                    .write_number_with_format(r, 3, rsi, &number_format)
                    .map_err(render_error)?;
            }
            worksheet
                .write_string(r, STATUS_COL, row.momentum.as_str())
                .map_err(render_error)?;
            if let Some(beta) = row.beta {
                worksheet
                    .write_number_with_format(r, 5, beta, &number_format)
                    .map_err(render_error)?;
            }
        }

        // Trend: green for bullish rows, red for bearish
        for (needle, format) in [("bullish", &favorable), ("bearish", &unfavorable)] {
            let rule = ConditionalFormatText::new()
                .set_rule(ConditionalFormatTextRule::Contains(needle.to_string()))
                .set_format(format.clone());
            worksheet
                .add_conditional_format(1, TREND_COL, FORMAT_ROWS, TREND_COL, &rule)
                .map_err(render_error)?;
        }
        // Momentum: overbought is the risk state, oversold the value state
        for (needle, format) in [("overbought", &unfavorable), ("oversold", &favorable)] {
            let rule = ConditionalFormatText::new()
                .set_rule(ConditionalFormatTextRule::Contains(needle.to_string()))
                .set_format(format.clone());
            worksheet
                .add_conditional_format(1, STATUS_COL, FORMAT_ROWS, STATUS_COL, &rule)
                .map_err(render_error)?;
        }

        workbook.save(path).map_err(render_error)?;
        tracing::info!("Report written to {}", path.display());

        if self.open_after_save {
            if let Err(e) = open::that(path) {
                tracing::warn!("Could not open {}: {}", path.display(), e);
            }
        }

        Ok(())
    }
}

fn render_error(e: XlsxError) -> ScanError {
    ScanError::Render(e.to_string())
}
