use core::{fmt, str::FromStr};

use crate::{error::SpecError, macros::parse_list};

/// Ordered set of vocabulary tokens.
///
/// Tokens keep the order of their first insertion, inserting a token twice
/// has no effect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Set<T> {
    list: Vec<T>,
}

impl<T> Default for Set<T> {
    fn default() -> Self {
        Self { list: Vec::new() }
    }
}

impl<T: Copy + PartialEq> Set<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, value: T) -> bool {
        if self.contains(value) {
            false
        } else {
            self.list.push(value);
            true
        }
    }

    pub fn remove(&mut self, value: T) -> bool {
        let len = self.list.len();
        self.list.retain(|i| *i != value);
        len != self.list.len()
    }

    pub fn contains(&self, value: T) -> bool {
        self.list.contains(&value)
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.list.iter().copied()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.list
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub(crate) fn retain(&mut self, f: impl FnMut(&T) -> bool) {
        self.list.retain(f);
    }
}

impl<T> Set<T>
where
    T: Copy + PartialEq + FromStr<Err = SpecError>,
{
    /// Adds `|`-separated tokens.
    ///
    /// Nothing is added if any of the tokens is unknown.
    pub fn add(&mut self, value: &str) -> Result<(), SpecError> {
        for i in parse_list::<T>(value)? {
            self.insert(i);
        }
        Ok(())
    }
}

impl<T: fmt::Display> Set<T> {
    /// Returns the token of every element.
    pub fn names(&self) -> Vec<String> {
        self.list.iter().map(|i| i.to_string()).collect()
    }
}

impl<T: Copy + PartialEq> FromIterator<T> for Set<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        for i in iter {
            set.insert(i);
        }
        set
    }
}

impl<T: fmt::Display> fmt::Display for Set<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        for (i, value) in self.list.iter().enumerate() {
            if i != 0 {
                fmt.write_str("|")?;
            }
            fmt::Display::fmt(value, fmt)?;
        }
        Ok(())
    }
}
