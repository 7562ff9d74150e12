use std::collections::HashSet;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

/// Shorter lines are blanks or garbage, never account names.
const MIN_ACCOUNT_LEN: usize = 3;

#[derive(Debug, Error)]
pub enum Error {
    #[error("reading accounts list: {0}")]
    Io(#[from] std::io::Error),
}

/// Delegatees the operator allows to be unstaked.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AllowSet(HashSet<String>);

impl AllowSet {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        let mut accounts = HashSet::new();
        for line in reader.lines() {
            let line = line?;
            let account = line.trim_end();
            if account.len() >= MIN_ACCOUNT_LEN {
                accounts.insert(account.to_string());
            }
        }
        Ok(Self(accounts))
    }

    pub fn contains(&self, account: &str) -> bool {
        self.0.contains(account)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for AllowSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
