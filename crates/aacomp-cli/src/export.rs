use crate::cli::OutputFormat;
use crate::error::{CliError, Result};
use aacomp::engine::report::{ImageFormat, ReportArtifact, ReportSection, SectionContent, TableData};
use rust_xlsxwriter::{DocProperties, Format, Image, Workbook, Worksheet, XlsxError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

pub const MANIFEST_FILE: &str = "manifest.toml";
const TABLE_FILE: &str = "table.csv";
const ZSTD_LEVEL: i32 = 3;
/// Height of a default worksheet row in pixels.
const SHEET_ROW_PX: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionKind {
    Table,
    Image,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ManifestSection {
    pub name: String,
    pub kind: SectionKind,
    pub files: Vec<String>,
}

/// Describes the written report; stored as the first entry of every export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Manifest {
    pub generator: String,
    pub proteins: Vec<String>,
    pub warnings: Vec<String>,
    pub sections: Vec<ManifestSection>,
}

/// Run details recorded alongside the report sections.
#[derive(Debug, Clone, Default)]
pub struct ExportMetadata {
    pub proteins: Vec<String>,
    pub warnings: Vec<String>,
}

struct Entry {
    path: String,
    data: Vec<u8>,
}

/// Writes a [`ReportArtifact`] to disk: as an Excel workbook, as a
/// zstd-compressed tar archive, or as a plain directory with the archive's layout.
#[derive(Debug, Clone)]
pub struct ReportExporter {
    path: PathBuf,
    format: OutputFormat,
}

impl ReportExporter {
    pub fn new(path: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the report and returns the written entries: relative file paths for
    /// archives and directories, `sheet` and `sheet/image` names for workbooks.
    #[instrument(skip_all, fields(path = %self.path.display(), format = ?self.format))]
    pub fn export(&self, report: &ReportArtifact, metadata: &ExportMetadata) -> Result<Vec<String>> {
        let written = match self.format {
            OutputFormat::Xlsx => self.write_workbook(report, metadata)?,
            OutputFormat::Archive | OutputFormat::Dir => {
                let entries = layout(report, metadata)?;
                if self.format == OutputFormat::Archive {
                    self.write_archive(&entries)?;
                } else {
                    self.write_dir(&entries)?;
                }
                entries.into_iter().map(|e| e.path).collect()
            }
        };
        info!(
            "Wrote {} report entries to {}",
            written.len(),
            self.path.display()
        );
        Ok(written)
    }

    fn write_workbook(&self, report: &ReportArtifact, metadata: &ExportMetadata) -> Result<Vec<String>> {
        let mut workbook = Workbook::new();
        let mut comment = format!("Proteins: {}", metadata.proteins.join(", "));
        for warning in &metadata.warnings {
            comment.push('\n');
            comment.push_str(warning);
        }
        workbook.set_properties(
            &DocProperties::new()
                .set_title("Amino acid composition comparison")
                .set_comment(&comment),
        );

        let header = Format::new().set_bold();
        let mut written = Vec::new();
        for section in report.sections() {
            let sheet = workbook.add_worksheet();
            sheet.set_name(section.name()).map_err(sheet_error(section))?;
            written.push(section.name().to_string());

            // Charts go two columns right of the table, stacked downwards.
            let (image_col, mut image_row) = match section.table() {
                Some(table) => {
                    write_table(sheet, table, &header).map_err(sheet_error(section))?;
                    (table.columns().len() as u16 + 2, 1u32)
                }
                None => (0, 0),
            };

            for image in section.images() {
                if image.format() != ImageFormat::Png {
                    return Err(CliError::Export(format!(
                        "Chart '{}' is {}; workbooks embed PNG images only",
                        image.name(),
                        image.format().media_type()
                    )));
                }
                let picture = Image::new_from_buffer(image.data()).map_err(sheet_error(section))?;
                sheet
                    .insert_image(image_row, image_col, &picture)
                    .map_err(sheet_error(section))?;
                image_row += (picture.height() / SHEET_ROW_PX).ceil() as u32 + 1;
                written.push(format!("{}/{}", section.name(), image.name()));
                debug!("Embedded chart {} in sheet {}", image.name(), section.name());
            }
        }

        create_parent(&self.path)?;
        workbook
            .save(&self.path)
            .map_err(|e| CliError::Export(format!("Failed to write workbook: {}", e)))?;
        Ok(written)
    }

    fn write_archive(&self, entries: &[Entry]) -> Result<()> {
        create_parent(&self.path)?;
        let file = fs::File::create(&self.path)?;
        let encoder = zstd::stream::write::Encoder::new(file, ZSTD_LEVEL)?;
        let mut builder = tar::Builder::new(encoder);

        for entry in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(entry.data.len() as u64);
            header.set_mode(0o644);
            header.set_mtime(0);
            header.set_cksum();
            builder
                .append_data(&mut header, &entry.path, entry.data.as_slice())
                .map_err(|e| CliError::Export(format!("Failed to add '{}': {}", entry.path, e)))?;
            debug!("Archived {}", entry.path);
        }

        let encoder = builder.into_inner()?;
        let mut file = encoder.finish()?;
        file.flush()?;
        Ok(())
    }

    fn write_dir(&self, entries: &[Entry]) -> Result<()> {
        if self.path.is_file() {
            return Err(CliError::Export(format!(
                "'{}' exists and is not a directory",
                self.path.display()
            )));
        }
        for entry in entries {
            let target = self.path.join(&entry.path);
            create_parent(&target)?;
            fs::write(&target, &entry.data)?;
            debug!("Wrote {}", target.display());
        }
        Ok(())
    }
}

fn sheet_error(section: &ReportSection) -> impl Fn(XlsxError) -> CliError + '_ {
    move |e| CliError::Export(format!("Worksheet '{}': {}", section.name(), e))
}

/// Header row of column names below the corner label, then one row per table row.
fn write_table(sheet: &mut Worksheet, table: &TableData, header: &Format) -> std::result::Result<(), XlsxError> {
    sheet.write_string_with_format(0, 0, table.corner(), header)?;
    for (col, name) in table.columns().iter().enumerate() {
        sheet.write_string_with_format(0, col as u16 + 1, name, header)?;
    }
    for (row, (label, values)) in table.rows().iter().enumerate() {
        let row = row as u32 + 1;
        sheet.write_string_with_format(row, 0, label, header)?;
        for (col, value) in values.iter().enumerate() {
            sheet.write_number(row, col as u16 + 1, *value)?;
        }
    }
    Ok(())
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn layout(report: &ReportArtifact, metadata: &ExportMetadata) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();
    let mut manifest_sections = Vec::with_capacity(report.len());
    let mut taken = HashSet::new();

    for (idx, section) in report.sections().iter().enumerate() {
        let dir = format!("{:02}-{}", idx + 1, sanitize(section.name()));
        let mut files = Vec::new();

        let kind = match section.content() {
            SectionContent::Table { table, .. } => {
                let mut data = Vec::new();
                table.write_csv(&mut data).map_err(|e| {
                    CliError::Export(format!("Failed to write table '{}': {}", section.name(), e))
                })?;
                let path = format!("{}/{}", dir, TABLE_FILE);
                taken.insert(path.clone());
                files.push(push_entry(&mut entries, path, data));
                SectionKind::Table
            }
            SectionContent::Image(_) => SectionKind::Image,
        };

        for image in section.images() {
            let path = format!(
                "{}/{}.{}",
                dir,
                sanitize(image.name()),
                image.format().extension()
            );
            if !taken.insert(path.clone()) {
                return Err(CliError::Export(format!(
                    "Chart '{}' of section '{}' would overwrite '{}'",
                    image.name(),
                    section.name(),
                    path
                )));
            }
            files.push(push_entry(&mut entries, path, image.data().to_vec()));
        }

        manifest_sections.push(ManifestSection {
            name: section.name().to_string(),
            kind,
            files,
        });
    }

    let manifest = Manifest {
        generator: concat!("aacomp ", env!("CARGO_PKG_VERSION")).to_string(),
        proteins: metadata.proteins.clone(),
        warnings: metadata.warnings.clone(),
        sections: manifest_sections,
    };
    let manifest_text = toml::to_string_pretty(&manifest)
        .map_err(|e| CliError::Export(format!("Failed to serialize manifest: {}", e)))?;
    entries.insert(
        0,
        Entry {
            path: MANIFEST_FILE.to_string(),
            data: manifest_text.into_bytes(),
        },
    );

    Ok(entries)
}

fn push_entry(entries: &mut Vec<Entry>, path: String, data: Vec<u8>) -> String {
    entries.push(Entry {
        path: path.clone(),
        data,
    });
    path
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
