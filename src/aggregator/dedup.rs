//! Address deduplication
//!
//! Turns the raw `addresses` list of a request into an [`AddressSet`]:
//! first occurrence wins, order preserved, blanks dropped.

use std::collections::HashSet;

/// Opaque address string, compared by exact match
pub type Address = String;

/// Ordered, duplicate-free addresses of one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressSet {
    addresses: Vec<Address>,
}

impl AddressSet {
    /// Deduplicate a raw address list in a single pass
    pub fn from_raw<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut addresses = Vec::new();

        for address in raw {
            let address: String = address.into();
            if address.trim().is_empty() {
                continue;
            }
            if seen.insert(address.clone()) {
                addresses.push(address);
            }
        }

        Self { addresses }
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Address> {
        self.addresses.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Address> {
        self.addresses.iter()
    }

    pub fn as_slice(&self) -> &[Address] {
        &self.addresses
    }
}

impl<'a> IntoIterator for &'a AddressSet {
    type Item = &'a Address;
    type IntoIter = std::slice::Iter<'a, Address>;

    fn into_iter(self) -> Self::IntoIter {
        self.addresses.iter()
    }
}
