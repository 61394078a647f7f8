use super::aggregate::{FrequencyTable, RatioTable};
use std::collections::HashSet;
use std::io::Write;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ReportError {
    #[error("Section name '{0}' is used more than once")]
    NameConflict(String),

    #[error("Image '{image}' is attached to unknown table section '{host}'")]
    UnknownHost { image: String, host: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Svg,
    Png,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Svg => "svg",
            ImageFormat::Png => "png",
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            ImageFormat::Svg => "image/svg+xml",
            ImageFormat::Png => "image/png",
        }
    }
}

/// A pre-rendered chart, tagged with a logical name and optionally the table
/// section it illustrates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartImage {
    name: String,
    host: Option<String>,
    format: ImageFormat,
    data: Vec<u8>,
}

impl ChartImage {
    pub fn new(name: impl Into<String>, format: ImageFormat, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            host: None,
            format,
            data,
        }
    }

    /// Places the image inside the table section called `section`.
    pub fn attached_to(mut self, section: impl Into<String>) -> Self {
        self.host = Some(section.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// A rectangular table with labelled rows, ready for export.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableData {
    corner: String,
    columns: Vec<String>,
    rows: Vec<(String, Vec<f64>)>,
}

impl TableData {
    pub fn new(corner: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            corner: corner.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, label: impl Into<String>, values: Vec<f64>) {
        self.rows.push((label.into(), values));
    }

    /// Header cell above the row labels.
    pub fn corner(&self) -> &str {
        &self.corner
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[(String, Vec<f64>)] {
        &self.rows
    }

    /// Writes the table as CSV: one header record, then one record per row.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(
            std::iter::once(self.corner.as_str()).chain(self.columns.iter().map(String::as_str)),
        )?;
        for (label, values) in &self.rows {
            let mut record = Vec::with_capacity(values.len() + 1);
            record.push(label.clone());
            record.extend(values.iter().map(|v| v.to_string()));
            csv_writer.write_record(&record)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

impl From<&FrequencyTable> for TableData {
    fn from(table: &FrequencyTable) -> Self {
        let mut data = TableData::new("residue", table.proteins().to_vec());
        for (residue_idx, symbol) in table.residues().iter().enumerate() {
            let values = table.row(residue_idx).unwrap_or_default();
            data.push_row(symbol.to_string(), values);
        }
        data
    }
}

impl From<&RatioTable> for TableData {
    fn from(table: &RatioTable) -> Self {
        let columns = table.ratio_names().iter().map(|n| n.to_string()).collect();
        let mut data = TableData::new("protein", columns);
        for (protein_idx, protein) in table.proteins().iter().enumerate() {
            let values = table
                .row(protein_idx)
                .map(|row| row.as_slice().to_vec())
                .unwrap_or_default();
            data.push_row(protein.clone(), values);
        }
        data
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SectionContent {
    Table {
        table: TableData,
        images: Vec<ChartImage>,
    },
    Image(ChartImage),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportSection {
    name: String,
    content: SectionContent,
}

impl ReportSection {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &SectionContent {
        &self.content
    }

    pub fn table(&self) -> Option<&TableData> {
        match &self.content {
            SectionContent::Table { table, .. } => Some(table),
            SectionContent::Image(_) => None,
        }
    }

    /// Images shown in this section: the attached charts of a table section, or the
    /// single image of an image section.
    pub fn images(&self) -> &[ChartImage] {
        match &self.content {
            SectionContent::Table { images, .. } => images,
            SectionContent::Image(image) => std::slice::from_ref(image),
        }
    }
}

/// The assembled report: table sections first, then stand-alone image sections,
/// each in the order they were handed to the assembler.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportArtifact {
    sections: Vec<ReportSection>,
}

impl ReportArtifact {
    pub fn sections(&self) -> &[ReportSection] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct ReportAssembler {
    tables: Vec<(String, TableData)>,
    images: Vec<ChartImage>,
}

impl ReportAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, name: impl Into<String>, table: TableData) -> Self {
        self.tables.push((name.into(), table));
        self
    }

    pub fn image(mut self, image: ChartImage) -> Self {
        self.images.push(image);
        self
    }

    pub fn images(mut self, images: impl IntoIterator<Item = ChartImage>) -> Self {
        self.images.extend(images);
        self
    }

    /// Builds the artifact.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::NameConflict`] if any two tables or images share a
    /// name, and [`ReportError::UnknownHost`] if an image is attached to a name that
    /// is not one of the table sections. Nothing is returned on failure.
    #[instrument(skip_all, name = "report_assembly")]
    pub fn assemble(self) -> Result<ReportArtifact, ReportError> {
        {
            let mut seen = HashSet::new();
            let names = self
                .tables
                .iter()
                .map(|(name, _)| name.as_str())
                .chain(self.images.iter().map(ChartImage::name));
            for name in names {
                if !seen.insert(name) {
                    return Err(ReportError::NameConflict(name.to_string()));
                }
            }
        }

        let mut sections: Vec<ReportSection> = self
            .tables
            .into_iter()
            .map(|(name, table)| ReportSection {
                name,
                content: SectionContent::Table {
                    table,
                    images: Vec::new(),
                },
            })
            .collect();
        let table_count = sections.len();

        for image in self.images {
            let Some(host) = image.host.clone() else {
                sections.push(ReportSection {
                    name: image.name.clone(),
                    content: SectionContent::Image(image),
                });
                continue;
            };
            let host_section = sections[..table_count]
                .iter_mut()
                .find(|section| section.name == host);
            match host_section {
                Some(ReportSection {
                    content: SectionContent::Table { images, .. },
                    ..
                }) => images.push(image),
                _ => {
                    return Err(ReportError::UnknownHost {
                        image: image.name,
                        host,
                    });
                }
            }
        }

        debug!(sections = sections.len(), "Report assembled.");
        Ok(ReportArtifact { sections })
    }
}

/// Assembles the standard comparison report: the frequency and ratio tables as
/// named sections, with `images` attached to them or placed in their own sections.
pub fn assemble_report(
    frequency: &FrequencyTable,
    ratio: &RatioTable,
    frequency_section: &str,
    ratio_section: &str,
    images: impl IntoIterator<Item = ChartImage>,
) -> Result<ReportArtifact, ReportError> {
    ReportAssembler::new()
        .table(frequency_section, TableData::from(frequency))
        .table(ratio_section, TableData::from(ratio))
        .images(images)
        .assemble()
}
