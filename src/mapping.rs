//src/mapping.rs

use ahash::AHashMap;
use std::io::BufRead;
use std::path::Path;

use crate::error::{parse_field, CoverageError, Result};
use crate::reader::open_text;

const REQUIRED_COLUMNS: [&str; 3] = ["protein", "genome", "length"];

/// Anything that can size a subject's coverage array up front.
pub trait SubjectLengths {
    fn subject_length(&self, subject: &str) -> Option<usize>;
}

impl SubjectLengths for AHashMap<String, usize> {
    fn subject_length(&self, subject: &str) -> Option<usize> {
        self.get(subject).copied()
    }
}

/// One declared protein row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProteinEntry {
    pub protein: String,
    pub genome: String,
    pub length: usize,
}

/// Everything the mapping file says about one genome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenomeRecord {
    pub genome: String,
    /// Indices into [`MappingTable::proteins`], in file order.
    pub proteins: Vec<usize>,
    /// Per extra column, the distinct values seen across this genome's
    /// proteins in first-seen order.
    pub attributes: Vec<(String, Vec<String>)>,
}

impl GenomeRecord {
    /// The column's value if every member protein agrees on it.
    pub fn constant_value(&self, column: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == column)
            .and_then(|(_, values)| match values.as_slice() {
                [only] => Some(only.as_str()),
                _ => None,
            })
    }

    /// All distinct values joined with `"; "`, or `None` when the column is
    /// unknown or empty for this genome.
    pub fn display_value(&self, column: &str) -> Option<String> {
        self.attributes
            .iter()
            .find(|(k, values)| k == column && !values.is_empty())
            .map(|(_, values)| values.join("; "))
    }
}

/// Protein -> genome association loaded from a headered TSV with at least
/// `protein`, `genome` and `length` columns. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    proteins: Vec<ProteinEntry>,
    protein_index: AHashMap<String, usize>,
    genomes: Vec<GenomeRecord>,
    genome_index: AHashMap<String, usize>,
    extra_columns: Vec<String>,
}

impl MappingTable {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Reading in the mapping file ({})", path.display());
        let reader = open_text(path)?;
        let table = Self::from_reader(reader).map_err(|e| match e {
            CoverageError::Io { source, .. } => CoverageError::io(path, source),
            other => other,
        })?;
        log::info!(
            "Mapping file lists {} proteins across {} genomes",
            table.proteins.len(),
            table.genomes.len()
        );
        Ok(table)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut lines = reader.lines().enumerate();

        let header: Vec<String> = loop {
            match lines.next() {
                Some((_, line)) => {
                    let line = line.map_err(|e| CoverageError::io("<mapping>", e))?;
                    if line.is_empty() {
                        continue;
                    }
                    break line.split('\t').map(|s| s.to_string()).collect();
                }
                None => return Err(CoverageError::format(1, "mapping file has no header row")),
            }
        };

        let column_ix = |name: &str| header.iter().position(|h| h == name);
        let mut required = [0usize; 3];
        for (slot, name) in required.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = column_ix(name).ok_or_else(|| {
                CoverageError::format(1, format!("mapping header lacks required column '{name}'"))
            })?;
        }
        let [protein_ix, genome_ix, length_ix] = required;

        let extra: Vec<(usize, String)> = header
            .iter()
            .enumerate()
            .filter(|(_, h)| !REQUIRED_COLUMNS.contains(&h.as_str()))
            .map(|(ix, h)| (ix, h.clone()))
            .collect();

        let mut table = MappingTable {
            extra_columns: extra.iter().map(|(_, h)| h.clone()).collect(),
            ..Default::default()
        };

        for (ix, line) in lines {
            let line_no = ix + 1;
            let line = line.map_err(|e| CoverageError::io("<mapping>", e))?;
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != header.len() {
                return Err(CoverageError::format(
                    line_no,
                    format!(
                        "expected {} columns to match the header, found {}",
                        header.len(),
                        fields.len()
                    ),
                ));
            }

            let protein = fields[protein_ix];
            let genome = fields[genome_ix];
            let length: usize = parse_field(fields[length_ix], "length", line_no)?;

            if table.protein_index.contains_key(protein) {
                return Err(CoverageError::format(
                    line_no,
                    format!("protein '{protein}' is declared more than once"),
                ));
            }

            let protein_pos = table.proteins.len();
            table.proteins.push(ProteinEntry {
                protein: protein.to_string(),
                genome: genome.to_string(),
                length,
            });
            table.protein_index.insert(protein.to_string(), protein_pos);

            let genome_pos = match table.genome_index.get(genome) {
                Some(&pos) => pos,
                None => {
                    let pos = table.genomes.len();
                    table.genomes.push(GenomeRecord {
                        genome: genome.to_string(),
                        proteins: Vec::new(),
                        attributes: table
                            .extra_columns
                            .iter()
                            .map(|c| (c.clone(), Vec::new()))
                            .collect(),
                    });
                    table.genome_index.insert(genome.to_string(), pos);
                    pos
                }
            };

            let record = &mut table.genomes[genome_pos];
            record.proteins.push(protein_pos);
            for (slot, (col_ix, _)) in record.attributes.iter_mut().zip(&extra) {
                let value = fields[*col_ix];
                if !slot.1.iter().any(|v| v == value) {
                    slot.1.push(value.to_string());
                }
            }
        }

        Ok(table)
    }

    pub fn genome_of(&self, protein: &str) -> Option<&str> {
        self.protein(protein).map(|p| p.genome.as_str())
    }

    pub fn protein_length(&self, protein: &str) -> Option<usize> {
        self.protein(protein).map(|p| p.length)
    }

    pub fn protein(&self, protein: &str) -> Option<&ProteinEntry> {
        self.protein_index.get(protein).map(|&ix| &self.proteins[ix])
    }

    pub fn genome(&self, genome: &str) -> Option<&GenomeRecord> {
        self.genome_index.get(genome).map(|&ix| &self.genomes[ix])
    }

    /// Proteins in file order.
    pub fn proteins(&self) -> &[ProteinEntry] {
        &self.proteins
    }

    /// Genomes in order of first appearance.
    pub fn genomes(&self) -> &[GenomeRecord] {
        &self.genomes
    }

    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    pub fn len(&self) -> usize {
        self.proteins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proteins.is_empty()
    }
}

impl SubjectLengths for MappingTable {
    fn subject_length(&self, subject: &str) -> Option<usize> {
        self.protein_length(subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const MAPPING: &str = "protein\tgenome\tlength\ttaxon\tsource\n\
                           p1\tG1\t100\tPhage\tA\n\
                           p2\tG1\t50\tPhage\tB\n\
                           \n\
                           p3\tG2\t80\tVirus\tC\n";

    #[test]
    fn test_lookups() {
        let table = MappingTable::from_reader(MAPPING.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.genome_of("p2"), Some("G1"));
        assert_eq!(table.protein_length("p3"), Some(80));
        assert_eq!(table.subject_length("p1"), Some(100));
        assert_eq!(table.genome_of("missing"), None);
        assert_eq!(table.extra_columns(), &["taxon".to_string(), "source".to_string()]);
    }

    #[test]
    fn test_genome_order_and_attributes() {
        let table = MappingTable::from_reader(MAPPING.as_bytes()).unwrap();
        let names: Vec<&str> = table.genomes().iter().map(|g| g.genome.as_str()).collect();
        assert_eq!(names, vec!["G1", "G2"]);

        let g1 = table.genome("G1").unwrap();
        assert_eq!(g1.proteins, vec![0, 1]);
        assert_eq!(g1.constant_value("taxon"), Some("Phage"));
        assert_eq!(g1.constant_value("source"), None);
        assert_eq!(g1.display_value("source").as_deref(), Some("A; B"));
        assert_eq!(g1.display_value("unknown"), None);
    }

    #[test]
    fn test_columns_may_be_reordered() {
        let text = "length\tprotein\tgenome\n12\tpX\tGX\n";
        let table = MappingTable::from_reader(text.as_bytes()).unwrap();
        assert_eq!(table.protein_length("pX"), Some(12));
        assert_eq!(table.genome_of("pX"), Some("GX"));
        assert!(table.extra_columns().is_empty());
    }

    #[test]
    fn test_missing_required_column() {
        let text = "protein\tgenome\n p1\tG1\n";
        let err = MappingTable::from_reader(text.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.to_string().contains("length"));
    }

    #[test]
    fn test_column_count_mismatch() {
        let text = "protein\tgenome\tlength\np1\tG1\n";
        let err = MappingTable::from_reader(text.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_non_numeric_length() {
        let text = "protein\tgenome\tlength\np1\tG1\tlong\n";
        let err = MappingTable::from_reader(text.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_duplicate_protein_rejected() {
        let text = "protein\tgenome\tlength\np1\tG1\t10\np1\tG2\t10\n";
        let err = MappingTable::from_reader(text.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.to_string().contains("p1"));
    }

    #[test]
    fn test_empty_input() {
        let err = MappingTable::from_reader("".as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }
}
