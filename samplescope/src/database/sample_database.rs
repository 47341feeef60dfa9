use log::{debug, info, warn};
use samplescope_common::{
    OdbDescriptor, OdbNode, OpdHeader, ODB_NODES_OFFSET, ODB_NODE_SIZE, OPD_HEADER_SIZE,
};
use std::fs;
use std::path::{Path, PathBuf};

use crate::aggregation::SampleAggregator;
use crate::domain::DatabaseError;
use crate::symbols::SymbolResolver;

/// Read-only handle on one sample database file
#[derive(Debug)]
pub struct SampleDatabase {
    path: PathBuf,
    handle: Option<OpenDatabase>,
}

/// A successfully opened database
#[derive(Debug)]
struct OpenDatabase {
    data: Vec<u8>,
    header: OpdHeader,
    is_kernel: bool,
    /// Nodes in use, including the reserved node 0
    node_count: usize,
}

impl SampleDatabase {
    /// Create a handle for `path`; nothing is read until a query runs
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into(), handle: None }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the file if it is not already open
    ///
    /// Failures are logged and leave the handle absent; iteration then
    /// yields nothing.
    pub fn open(&mut self) {
        if self.handle.is_some() {
            return;
        }

        match load(&self.path) {
            Ok(db) => {
                debug!(
                    "Opened sample database {} ({} slots, is_kernel = {})",
                    self.path.display(),
                    db.node_count,
                    db.is_kernel
                );
                self.handle = Some(db);
            }
            Err(e) => warn!("Error opening sample database {}: {e}", self.path.display()),
        }
    }

    /// Release the handle if present
    pub fn close(&mut self) {
        self.handle = None;
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Whether the sampled image lives in kernel space; false while closed
    #[must_use]
    pub fn is_kernel(&self) -> bool {
        self.handle.as_ref().is_some_and(|db| db.is_kernel)
    }

    /// Decoded header of the open database
    #[must_use]
    pub fn header(&self) -> Option<&OpdHeader> {
        self.handle.as_ref().map(|db| &db.header)
    }

    /// Occupied slots as `(address, count)`, in storage order
    ///
    /// Empty when the database is not open.
    #[must_use]
    pub fn entries(&self) -> Entries<'_> {
        match &self.handle {
            Some(db) => Entries { data: &db.data, pos: 0, end: db.node_count },
            None => Entries { data: &[], pos: 0, end: 0 },
        }
    }

    /// Call `visitor` for every occupied slot of the open database
    pub fn iterate<F: FnMut(u64, u32)>(&self, mut visitor: F) {
        for (key, value) in self.entries() {
            visitor(key, value);
        }
    }

    /// Open, visit every occupied slot, close
    pub fn walk_samples<F: FnMut(u64, u32)>(&mut self, visitor: F) {
        self.open();
        self.iterate(visitor);
        self.close();
    }

    /// Aggregate every entry into one [`Sample`](crate::aggregation::Sample)
    /// per raw address, resolving through `resolver` when given
    ///
    /// Symbols start the pass empty, so reusing a resolver across passes
    /// gives the same totals each time.
    pub fn samples(&mut self, mut resolver: Option<&mut dyn SymbolResolver>) -> SampleAggregator {
        if let Some(resolver) = resolver.as_deref_mut() {
            resolver.clear_samples();
        }
        self.open();
        let is_kernel = self.is_kernel();

        let mut aggregator = SampleAggregator::new();
        for (key, value) in self.entries() {
            aggregator.record(resolver.as_deref_mut(), is_kernel, key, value);
        }
        self.close();

        info!(
            "Aggregated {} samples ({} hits) from {}",
            aggregator.len(),
            aggregator.total_count(),
            self.path.display()
        );
        aggregator
    }

    /// Does any slot hold a positive count?
    ///
    /// Stops at the first positive slot instead of scanning the whole table.
    pub fn has_samples(&mut self) -> bool {
        self.open();
        let found = self.entries().any(|(_, value)| value > 0);
        self.close();
        found
    }

    /// Sum of every stored count
    pub fn count(&mut self) -> u64 {
        let mut count = 0u64;
        self.walk_samples(|_, value| count += u64::from(value));
        count
    }
}

/// Iterator over the occupied slots of an open database
///
/// Finite and single pass; a fresh pass needs a fresh call to
/// [`SampleDatabase::entries`].
#[derive(Debug, Clone)]
pub struct Entries<'a> {
    data: &'a [u8],
    pos: usize,
    end: usize,
}

impl Iterator for Entries<'_> {
    type Item = (u64, u32);

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.end {
            let offset = ODB_NODES_OFFSET + self.pos * ODB_NODE_SIZE;
            self.pos += 1;

            let node = OdbNode::decode(self.data.get(offset..)?)?;
            if !node.is_empty() {
                return Some((node.key, node.value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.end - self.pos))
    }
}

fn load(path: &Path) -> Result<OpenDatabase, DatabaseError> {
    let data = fs::read(path)?;

    let truncated = |needed: usize| DatabaseError::Truncated { needed, actual: data.len() };
    if data.len() < ODB_NODES_OFFSET {
        return Err(truncated(ODB_NODES_OFFSET));
    }

    let header = OpdHeader::decode(&data).ok_or_else(|| truncated(OPD_HEADER_SIZE))?;
    if !header.has_valid_magic() {
        return Err(DatabaseError::BadMagic(header.magic));
    }

    let descr = OdbDescriptor::decode(&data[OPD_HEADER_SIZE..])
        .ok_or_else(|| truncated(ODB_NODES_OFFSET))?;
    if descr.current_size > descr.size {
        return Err(DatabaseError::CorruptDescriptor {
            size: descr.size,
            current_size: descr.current_size,
        });
    }

    let node_count = descr.current_size as usize;
    let needed = ODB_NODES_OFFSET + node_count * ODB_NODE_SIZE;
    if data.len() < needed {
        return Err(truncated(needed));
    }

    let is_kernel = header.is_kernel != 0;
    Ok(OpenDatabase { data, header, is_kernel, node_count })
}
