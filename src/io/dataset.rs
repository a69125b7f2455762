//! # Transactional Dataset I/O
//!
//! One transaction per line, items as whitespace-separated non-negative
//! integers. Rows of the matrix are transactions, columns are the distinct
//! items in increasing order of their value. Blank lines are empty
//! transactions and repeated items within a line count once.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::instrument;

use crate::data::storage::SparseMatrix;
use crate::error::{Result, SwapError};

/// A matrix together with the item label of each column
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    pub matrix: SparseMatrix,
    /// Item value of column `c`, strictly increasing
    pub items: Vec<u32>,
}

impl Dataset {
    /// Read a dataset file
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

    /// Parse transactions from any buffered reader
    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        let mut transactions: Vec<Vec<u32>> = Vec::new();
        let mut all_items: BTreeSet<u32> = BTreeSet::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let mut transaction = Vec::new();
            for token in line.split_whitespace() {
                let item: u32 = token.parse().map_err(|_| {
                    SwapError::parse(line_no + 1, format!("item '{}' is not a non-negative integer", token))
                })?;
                transaction.push(item);
                all_items.insert(item);
            }
            transactions.push(transaction);
        }

        let items: Vec<u32> = all_items.into_iter().collect();
        let rows = transactions
            .into_iter()
            .map(|t| {
                t.into_iter()
                    .filter_map(|item| items.binary_search(&item).ok().map(|c| c as u32))
                    .collect()
            })
            .collect();
        let matrix = SparseMatrix::from_rows(items.len(), rows)?;

        Ok(Self { matrix, items })
    }

    pub fn n_transactions(&self) -> usize {
        self.matrix.n_rows()
    }

    pub fn n_items(&self) -> usize {
        self.items.len()
    }

    /// Transactions of `matrix` under this dataset's item labels
    pub fn transactions(&self, matrix: &SparseMatrix) -> Result<Vec<Vec<u32>>> {
        if matrix.n_cols() != self.items.len() {
            return Err(SwapError::invalid_matrix(format!(
                "matrix has {} columns but the dataset has {} items",
                matrix.n_cols(),
                self.items.len()
            )));
        }
        Ok(matrix
            .rows()
            .iter()
            .map(|row| row.indices().iter().map(|&c| self.items[c as usize]).collect())
            .collect())
    }

    /// Write `matrix` as a transactional file with this dataset's labels
    pub fn write(&self, path: impl AsRef<Path>, matrix: &SparseMatrix) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer, matrix)?;
        writer.flush()?;
        Ok(())
    }

    pub fn write_to<W: Write>(&self, writer: &mut W, matrix: &SparseMatrix) -> Result<()> {
        for transaction in self.transactions(matrix)? {
            let line: Vec<String> = transaction.iter().map(|i| i.to_string()).collect();
            writeln!(writer, "{}", line.join(" "))?;
        }
        Ok(())
    }
}
