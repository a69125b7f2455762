//! # Sequence Dataset I/O
//!
//! One sequence per line in SPMF style: items as non-negative integers,
//! `-1` closes an itemset and `-2` closes the sequence. Rows of the
//! multigraph are sequences and columns are the distinct itemsets, numbered
//! in order of first appearance. Repeated items within one itemset count
//! once; a missing `-2` at the end of a line is tolerated.

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::instrument;

use crate::data::storage::MultiGraph;
use crate::error::{Result, SwapError};

const END_ITEMSET: &str = "-1";
const END_SEQUENCE: &str = "-2";

/// A multigraph together with the itemset behind each column
#[derive(Clone, Debug, PartialEq)]
pub struct SequenceDataset {
    pub graph: MultiGraph,
    /// Sorted items of itemset `c`
    pub itemsets: Vec<Vec<u32>>,
}

impl SequenceDataset {
    /// Read a sequence file
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SwapError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path)?;
        Self::parse(BufReader::new(file))
    }

    /// Parse sequences from any buffered reader
    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        let mut ids: HashMap<Vec<u32>, u32> = HashMap::new();
        let mut itemsets: Vec<Vec<u32>> = Vec::new();
        let mut sequences: Vec<Vec<u32>> = Vec::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = line_no + 1;
            let mut sequence = Vec::new();
            let mut current: BTreeSet<u32> = BTreeSet::new();
            let mut closed = false;

            for token in line.split_whitespace() {
                if closed {
                    return Err(SwapError::parse(line_no, format!("'{}' after the end of the sequence", token)));
                }
                match token {
                    END_ITEMSET => {
                        if current.is_empty() {
                            return Err(SwapError::parse(line_no, "empty itemset"));
                        }
                        let itemset: Vec<u32> = std::mem::take(&mut current).into_iter().collect();
                        let next = itemsets.len() as u32;
                        let id = *ids.entry(itemset).or_insert_with_key(|key| {
                            itemsets.push(key.clone());
                            next
                        });
                        sequence.push(id);
                    }
                    END_SEQUENCE => closed = true,
                    _ => {
                        let item: u32 = token.parse().map_err(|_| {
                            SwapError::parse(line_no, format!("item '{}' is not a non-negative integer", token))
                        })?;
                        current.insert(item);
                    }
                }
            }
            if !current.is_empty() {
                return Err(SwapError::parse(line_no, "itemset not closed with -1"));
            }
            sequences.push(sequence);
        }

        let graph = MultiGraph::from_sequences(itemsets.len(), sequences)?;
        Ok(Self { graph, itemsets })
    }

    pub fn n_sequences(&self) -> usize {
        self.graph.n_rows()
    }

    pub fn n_itemsets(&self) -> usize {
        self.itemsets.len()
    }

    /// Write `graph` as a sequence file with this dataset's itemsets
    pub fn write(&self, path: impl AsRef<Path>, graph: &MultiGraph) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer, graph)?;
        writer.flush()?;
        Ok(())
    }

    pub fn write_to<W: Write>(&self, writer: &mut W, graph: &MultiGraph) -> Result<()> {
        if graph.n_cols() != self.itemsets.len() {
            return Err(SwapError::invalid_matrix(format!(
                "multigraph has {} columns but the dataset has {} itemsets",
                graph.n_cols(),
                self.itemsets.len()
            )));
        }
        for sequence in graph.rows() {
            let mut tokens: Vec<String> = Vec::new();
            for &c in sequence {
                tokens.extend(self.itemsets[c as usize].iter().map(|i| i.to_string()));
                tokens.push(END_ITEMSET.to_string());
            }
            tokens.push(END_SEQUENCE.to_string());
            writeln!(writer, "{}", tokens.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse() {
        let text = "1 2 -1 3 -1 2 1 -1 -2\n3 -1 -2\n4 4 -1 1 2 -1\n";
        let ds = SequenceDataset::parse(Cursor::new(text)).unwrap();
        assert_eq!(ds.itemsets, vec![vec![1, 2], vec![3], vec![4]]);
        assert_eq!(ds.n_sequences(), 3);
        assert_eq!(ds.graph.rows(), &[vec![0, 1, 0], vec![1], vec![2, 0]]);
        assert_eq!(ds.graph.col_sums(), &[3, 2, 1]);
    }

    #[test]
    fn test_parse_errors() {
        let unclosed = SequenceDataset::parse(Cursor::new("1 -1 -2\n2 3\n")).unwrap_err();
        assert!(matches!(unclosed, SwapError::Parse { line: 2, .. }));

        assert!(SequenceDataset::parse(Cursor::new("1 -1 -1 -2\n")).is_err());
        assert!(SequenceDataset::parse(Cursor::new("1 -1 -2 2 -1\n")).is_err());
        assert!(SequenceDataset::parse(Cursor::new("1 x -1 -2\n")).is_err());
    }

    #[test]
    fn test_write_format() {
        let ds = SequenceDataset::parse(Cursor::new("2 1 -1 5 -1 -2\n5 -1 -2\n")).unwrap();
        let mut out = Vec::new();
        ds.write_to(&mut out, &ds.graph).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1 2 -1 5 -1 -2\n5 -1 -2\n");
    }

    #[test]
    fn test_missing_file() {
        let err = SequenceDataset::read("/definitely/not/here.seq").unwrap_err();
        assert!(matches!(err, SwapError::FileNotFound { .. }));
    }
}
