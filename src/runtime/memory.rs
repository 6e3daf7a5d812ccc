//! Simulated heap
//!
//! A bump allocator over an address-indexed map. Addresses are handed out
//! monotonically by type size and are never reused, even after `free`.
//! Every write is checked against the configured capacity.

use std::collections::BTreeMap;
use std::fmt::Write;

use tracing::trace;

use crate::error::{Error, Result};
use crate::runtime::Value;

/// Byte size of a declared type; unknown and user types take 4 bytes
pub fn size_of_type(type_name: &str) -> usize {
    match type_name {
        "int8" | "uint8" | "char" => 1,
        "int16" | "uint16" => 2,
        "int32" | "uint32" | "float32" => 4,
        "int64" | "uint64" | "float64" => 8,
        _ => 4,
    }
}

/// Capacity-bounded address space
#[derive(Debug, Clone)]
pub struct Heap {
    cells: BTreeMap<i64, Value>,
    next_address: i64,
    capacity: usize,
}

impl Heap {
    /// Creates an empty heap with the given capacity in bytes
    pub fn new(capacity: usize) -> Self {
        Heap {
            cells: BTreeMap::new(),
            next_address: 0,
            capacity,
        }
    }

    /// Reserves an address for a value of `type_name`
    pub fn allocate(&mut self, type_name: &str) -> i64 {
        let address = self.next_address;
        let size = size_of_type(type_name);
        self.next_address += size as i64;
        trace!(type_name, address, size, "allocate");
        address
    }

    /// Stores a value, failing past the capacity
    pub fn write(&mut self, address: i64, value: Value) -> Result<()> {
        if address < 0 {
            return Err(Error::InvalidMemoryAccess { address });
        }
        if address as u64 >= self.capacity as u64 {
            return Err(Error::HeapCapacityExceeded {
                address,
                capacity: self.capacity,
            });
        }
        self.cells.insert(address, value);
        Ok(())
    }

    /// Reads the value at an address
    pub fn read(&self, address: i64) -> Result<Value> {
        self.cells
            .get(&address)
            .cloned()
            .ok_or(Error::InvalidMemoryAccess { address })
    }

    /// Drops the cell at an address; the address is not reused
    pub fn free(&mut self, address: i64) -> Option<Value> {
        self.cells.remove(&address)
    }

    /// Whether a live cell exists at `address`
    pub fn contains(&self, address: i64) -> bool {
        self.cells.contains_key(&address)
    }

    /// Next address to be handed out (bytes consumed so far)
    pub fn next_address(&self) -> i64 {
        self.next_address
    }

    /// Moves the allocation counter, used when importing modules
    pub fn set_next_address(&mut self, address: i64) {
        self.next_address = address;
    }

    /// Configured capacity in bytes
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live cells
    pub fn live_cells(&self) -> usize {
        self.cells.len()
    }

    /// Copies every cell of `other` into this heap
    pub fn merge(&mut self, other: Heap) {
        self.cells.extend(other.cells);
        self.next_address = self.next_address.max(other.next_address);
    }

    /// `address: value` lines for every live cell, in address order
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (address, value) in &self.cells {
            let _ = writeln!(out, "{}: {}", address, value);
        }
        out
    }
}
