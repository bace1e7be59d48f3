//! Test fixtures for building order templates in memory.
//!
//! This module provides builders to create valid XLSX/XLSM packages
//! programmatically: a reference sheet with option lists, an order sheet
//! with styled empty rows, and optional VBA project and calc chain parts.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_possible_truncation
)]

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

/// Style index of the bold cell format in generated `styles.xml`.
pub const STYLE_BOLD: u32 = 1;
/// Style index of the thin-border cell format in generated `styles.xml`.
pub const STYLE_BORDER: u32 = 2;

/// Stand-in VBA project payload. Only its bytes matter to the tests.
pub const VBA_PAYLOAD: &[u8] = b"\xd0\xcf\x11\xe0\xa1\xb1\x1a\xe1 fake vba project \x00\x01\x02";

// ============================================================================
// Cell Values
// ============================================================================

/// Value of a template cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// A string stored in the shared string table.
    String(String),
    /// A numeric value.
    Number(f64),
    /// A boolean value.
    Boolean(bool),
    /// An inline string (not shared).
    InlineString(String),
    /// A formula with its cached numeric result.
    Formula(String, f64),
    /// Cell content written verbatim inside `<c>`, e.g. a raw `<v>` as
    /// Excel stores it or a shared formula.
    Raw(String),
    /// An empty cell (style only).
    Empty,
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(f64::from(n))
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

// ============================================================================
// Sheet Builder
// ============================================================================

/// A cell in the sheet.
#[derive(Debug, Clone)]
pub struct CellEntry {
    pub col: u32,
    pub row: u32,
    pub value: CellValue,
    pub style: Option<u32>,
}

/// Builder for a single worksheet.
#[derive(Debug, Clone, Default)]
pub struct SheetBuilder {
    pub name: String,
    pub cells: Vec<CellEntry>,
    pub merges: Vec<String>,
    pub col_widths: Vec<(u32, u32, f64)>,
    pub validations: Vec<(String, String)>,
}

impl SheetBuilder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Add a cell at 1-based `(col, row)`.
    #[must_use]
    pub fn cell<V: Into<CellValue>>(mut self, col: u32, row: u32, value: V) -> Self {
        self.cells.push(CellEntry {
            col,
            row,
            value: value.into(),
            style: None,
        });
        self
    }

    /// Add a cell with a style index.
    #[must_use]
    pub fn styled_cell<V: Into<CellValue>>(mut self, col: u32, row: u32, value: V, style: u32) -> Self {
        self.cells.push(CellEntry {
            col,
            row,
            value: value.into(),
            style: Some(style),
        });
        self
    }

    /// Fill `col` with `values` from `first_row` down (`None` leaves a gap).
    #[must_use]
    pub fn column(mut self, col: u32, first_row: u32, values: &[Option<&str>]) -> Self {
        for (row, value) in (first_row..).zip(values) {
            if let Some(v) = value {
                self = self.cell(col, row, *v);
            }
        }
        self
    }

    #[must_use]
    pub fn merge(mut self, range: &str) -> Self {
        self.merges.push(range.to_string());
        self
    }

    #[must_use]
    pub fn col_width(mut self, min: u32, max: u32, width: f64) -> Self {
        self.col_widths.push((min, max, width));
        self
    }

    /// Add a list data validation on `sqref` sourcing from `formula`.
    #[must_use]
    pub fn list_validation(mut self, sqref: &str, formula: &str) -> Self {
        self.validations.push((sqref.to_string(), formula.to_string()));
        self
    }
}

// ============================================================================
// Template Builder
// ============================================================================

/// Builder for complete template packages.
#[derive(Debug, Default)]
pub struct TemplateBuilder {
    sheets: Vec<SheetBuilder>,
    vba_project: Option<Vec<u8>>,
    calc_chain: Vec<(u32, u32)>,
}

impl TemplateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sheet(mut self, sheet: SheetBuilder) -> Self {
        self.sheets.push(sheet);
        self
    }

    /// Make the package macro-enabled with the given VBA project bytes.
    #[must_use]
    pub fn vba_project(mut self, bytes: &[u8]) -> Self {
        self.vba_project = Some(bytes.to_vec());
        self
    }

    /// Add a calc chain listing formula cells `(col, row)` of the first sheet.
    #[must_use]
    pub fn calc_chain(mut self, cells: &[(u32, u32)]) -> Self {
        self.calc_chain = cells.to_vec();
        self
    }

    /// Build the package as bytes.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        let cursor = Cursor::new(Vec::new());
        let mut zip = ZipWriter::new(cursor);
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let mut shared_strings: Vec<String> = Vec::new();
        for sheet in &self.sheets {
            for cell in &sheet.cells {
                if let CellValue::String(ref s) = cell.value {
                    if !shared_strings.contains(s) {
                        shared_strings.push(s.clone());
                    }
                }
            }
        }

        let mut write = |name: &str, data: &[u8]| {
            zip.start_file(name, options).unwrap();
            zip.write_all(data).unwrap();
        };

        write("[Content_Types].xml", self.content_types().as_bytes());
        write("_rels/.rels", ROOT_RELS.as_bytes());
        write("xl/_rels/workbook.xml.rels", self.workbook_rels().as_bytes());
        write("xl/workbook.xml", self.workbook().as_bytes());
        write("xl/styles.xml", STYLES.as_bytes());
        if !shared_strings.is_empty() {
            write(
                "xl/sharedStrings.xml",
                generate_shared_strings(&shared_strings).as_bytes(),
            );
        }
        for (i, sheet) in self.sheets.iter().enumerate() {
            let path = format!("xl/worksheets/sheet{}.xml", i + 1);
            write(&path, generate_sheet_xml(sheet, &shared_strings).as_bytes());
        }
        if !self.calc_chain.is_empty() {
            write("xl/calcChain.xml", self.calc_chain_xml().as_bytes());
        }
        if let Some(ref vba) = self.vba_project {
            write("xl/vbaProject.bin", vba);
        }

        zip.finish().expect("Failed to finish ZIP").into_inner()
    }

    fn content_types(&self) -> String {
        let workbook_type = if self.vba_project.is_some() {
            "application/vnd.ms-excel.sheet.macroEnabled.main+xml"
        } else {
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"
        };
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
"#,
        );
        if self.vba_project.is_some() {
            xml.push_str(r#"<Default Extension="bin" ContentType="application/vnd.ms-office.vbaProject"/>"#);
        }
        xml.push_str(&format!(
            r#"<Override PartName="/xl/workbook.xml" ContentType="{workbook_type}"/>"#
        ));
        for i in 1..=self.sheets.len() {
            xml.push_str(&format!(
                r#"<Override PartName="/xl/worksheets/sheet{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
            ));
        }
        xml.push_str(r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#);
        xml.push_str(r#"<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#);
        if !self.calc_chain.is_empty() {
            xml.push_str(r#"<Override PartName="/xl/calcChain.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.calcChain+xml"/>"#);
        }
        xml.push_str("</Types>");
        xml
    }

    fn workbook_rels(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
"#,
        );
        for i in 1..=self.sheets.len() {
            xml.push_str(&format!(
                r#"<Relationship Id="rId{i}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{i}.xml"/>"#
            ));
        }
        xml.push_str(r#"<Relationship Id="rId100" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#);
        xml.push_str(r#"<Relationship Id="rId101" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#);
        if !self.calc_chain.is_empty() {
            xml.push_str(r#"<Relationship Id="rId102" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/calcChain" Target="calcChain.xml"/>"#);
        }
        if self.vba_project.is_some() {
            xml.push_str(r#"<Relationship Id="rId103" Type="http://schemas.microsoft.com/office/2006/relationships/vbaProject" Target="vbaProject.bin"/>"#);
        }
        xml.push_str("</Relationships>");
        xml
    }

    fn workbook(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets>
"#,
        );
        for (i, sheet) in self.sheets.iter().enumerate() {
            xml.push_str(&format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape_xml(&sheet.name),
                i + 1,
                i + 1
            ));
        }
        xml.push_str("</sheets></workbook>");
        xml
    }

    fn calc_chain_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<calcChain xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );
        for &(col, row) in &self.calc_chain {
            xml.push_str(&format!(r#"<c r="{}" i="1"/>"#, cell_ref(col, row)));
        }
        xml.push_str("</calcChain>");
        xml
    }
}

// ============================================================================
// Part Generators
// ============================================================================

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="11"/><name val="Calibri"/></font></fonts>
<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>
<borders count="2"><border><left/><right/><top/><bottom/></border><border><left style="thin"/><right style="thin"/><top style="thin"/><bottom style="thin"/></border></borders>
<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
<cellXfs count="3"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/><xf numFmtId="0" fontId="0" fillId="0" borderId="1" xfId="0" applyBorder="1"/></cellXfs>
</styleSheet>"#;

/// 1-based column number to letters.
pub fn col_letter(col: u32) -> String {
    let mut n = col;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

pub fn cell_ref(col: u32, row: u32) -> String {
    format!("{}{row}", col_letter(col))
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn generate_shared_strings(strings: &[String]) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
        strings.len()
    );
    for s in strings {
        xml.push_str(&format!("<si><t>{}</t></si>", escape_xml(s)));
    }
    xml.push_str("</sst>");
    xml
}

fn generate_sheet_xml(sheet: &SheetBuilder, shared_strings: &[String]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
"#,
    );
    xml.push_str(r#"<dimension ref="A1"/>"#);
    xml.push_str(r#"<sheetViews><sheetView workbookViewId="0"/></sheetViews>"#);
    xml.push_str(r#"<sheetFormatPr defaultRowHeight="15"/>"#);

    if !sheet.col_widths.is_empty() {
        xml.push_str("<cols>");
        for (min, max, width) in &sheet.col_widths {
            xml.push_str(&format!(
                r#"<col min="{min}" max="{max}" width="{width}" customWidth="1"/>"#
            ));
        }
        xml.push_str("</cols>");
    }

    let mut cells = sheet.cells.clone();
    cells.sort_by_key(|c| (c.row, c.col));

    xml.push_str("<sheetData>");
    let mut current_row = 0;
    for cell in &cells {
        if cell.row != current_row {
            if current_row != 0 {
                xml.push_str("</row>");
            }
            current_row = cell.row;
            xml.push_str(&format!(r#"<row r="{current_row}">"#));
        }
        let r = cell_ref(cell.col, cell.row);
        let s = cell.style.map(|s| format!(r#" s="{s}""#)).unwrap_or_default();
        match &cell.value {
            CellValue::String(text) => {
                let idx = shared_strings.iter().position(|x| x == text).unwrap();
                xml.push_str(&format!(r#"<c r="{r}"{s} t="s"><v>{idx}</v></c>"#));
            }
            CellValue::Number(n) => xml.push_str(&format!(r#"<c r="{r}"{s}><v>{n}</v></c>"#)),
            CellValue::Boolean(b) => xml.push_str(&format!(
                r#"<c r="{r}"{s} t="b"><v>{}</v></c>"#,
                u8::from(*b)
            )),
            CellValue::InlineString(text) => xml.push_str(&format!(
                r#"<c r="{r}"{s} t="inlineStr"><is><t>{}</t></is></c>"#,
                escape_xml(text)
            )),
            CellValue::Formula(f, cached) => xml.push_str(&format!(
                r#"<c r="{r}"{s}><f>{}</f><v>{cached}</v></c>"#,
                escape_xml(f)
            )),
            CellValue::Raw(inner) => xml.push_str(&format!(r#"<c r="{r}"{s}>{inner}</c>"#)),
            CellValue::Empty => xml.push_str(&format!(r#"<c r="{r}"{s}/>"#)),
        }
    }
    if current_row != 0 {
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData>");

    if !sheet.merges.is_empty() {
        xml.push_str(&format!(r#"<mergeCells count="{}">"#, sheet.merges.len()));
        for m in &sheet.merges {
            xml.push_str(&format!(r#"<mergeCell ref="{m}"/>"#));
        }
        xml.push_str("</mergeCells>");
    }

    if !sheet.validations.is_empty() {
        xml.push_str(&format!(
            r#"<dataValidations count="{}">"#,
            sheet.validations.len()
        ));
        for (sqref, formula) in &sheet.validations {
            xml.push_str(&format!(
                r#"<dataValidation type="list" allowBlank="1" sqref="{sqref}"><formula1>{}</formula1></dataValidation>"#,
                escape_xml(formula)
            ));
        }
        xml.push_str("</dataValidations>");
    }

    xml.push_str("</worksheet>");
    xml
}

// ============================================================================
// Ready-made Templates
// ============================================================================

pub const MATERIALS: &[Option<&str>] = &[Some("Plastic"), Some("Glass"), None, Some("Poly"), Some("Plastic")];
pub const PRODUCTS: &[Option<&str>] = &[Some("SV 1.5"), Some("Progressive")];
pub const TINTS: &[Option<&str>] = &[Some("None"), Some("Grey 50%")];
pub const COATINGS: &[Option<&str>] = &[Some("AR"), Some("HC"), Some("Blue Cut")];

/// Reference sheet with the four option columns under a header row.
pub fn data_sheet() -> SheetBuilder {
    SheetBuilder::new("DATA")
        .cell(1, 1, "Material")
        .cell(2, 1, "Products")
        .cell(3, 1, "Tint")
        .cell(4, 1, "Coating")
        .column(1, 2, MATERIALS)
        .column(2, 2, PRODUCTS)
        .column(3, 2, TINTS)
        .column(4, 2, COATINGS)
        .cell(5, 2, 1.5)
}

/// Order sheet: bold title, header row 2, bordered empty cells in row 3..=33,
/// a formula total at T3 and a list validation on J3:J33.
pub fn order_sheet() -> SheetBuilder {
    let mut sheet = SheetBuilder::new("ORDER")
        .styled_cell(1, 1, "RX ORDER", STYLE_BOLD)
        .merge("A1:S1")
        .col_width(1, 19, 9.0)
        .col_width(20, 20, 12.0)
        .list_validation("J3:J33", "DATA!$A$2:$A$100");
    for (col, label) in (1u32..).zip(["Order #", "Eye (R/L)", "Sph", "Cyl"]) {
        sheet = sheet.styled_cell(col, 2, label, STYLE_BOLD);
    }
    for row in 3..=33 {
        for col in 1..=19 {
            sheet = sheet.styled_cell(col, row, CellValue::Empty, STYLE_BORDER);
        }
    }
    sheet.cell(20, 3, CellValue::Formula("SUM(R3:R33)".into(), 0.0))
}

/// Plain XLSX order template.
pub fn rx_template() -> Vec<u8> {
    TemplateBuilder::new()
        .sheet(order_sheet())
        .sheet(data_sheet())
        .build()
}

/// Macro-enabled order template with a calc chain for the total formula.
pub fn rx_template_xlsm() -> Vec<u8> {
    TemplateBuilder::new()
        .sheet(order_sheet())
        .sheet(data_sheet())
        .vba_project(VBA_PAYLOAD)
        .calc_chain(&[(20, 3)])
        .build()
}
