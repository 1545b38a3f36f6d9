//! A movable position inside a history.

use crate::chain::ChainError;
use crate::navigate::{find_head, find_next, find_prev, find_root};
use crate::types::{Entry, History, ProofId};

/// Read-only cursor over a history.
///
/// Moves that have nowhere to go leave the cursor in place and return `false`.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    history: &'a History,
    proof: &'a ProofId,
    entry: &'a Entry,
}

impl<'a> Cursor<'a> {
    pub fn at_head(history: &'a History) -> Result<Self, ChainError> {
        let (proof, entry) = find_head(history)?;
        Ok(Self {
            history,
            proof,
            entry,
        })
    }

    pub fn at_root(history: &'a History) -> Result<Self, ChainError> {
        let (proof, entry) = find_root(history)?;
        Ok(Self {
            history,
            proof,
            entry,
        })
    }

    pub fn proof(&self) -> &'a ProofId {
        self.proof
    }

    pub fn current(&self) -> &'a Entry {
        self.entry
    }

    pub fn switch_next(&mut self) -> bool {
        self.move_to(find_next(self.history, self.entry))
    }

    pub fn switch_prev(&mut self) -> bool {
        self.move_to(find_prev(self.history, self.entry))
    }

    pub fn switch_root(&mut self) -> bool {
        self.move_to(find_root(self.history).ok())
    }

    pub fn switch_head(&mut self) -> bool {
        self.move_to(find_head(self.history).ok())
    }

    pub fn switch_into(&mut self, proof: &str) -> bool {
        self.move_to(self.history.get_key_value(proof))
    }

    fn move_to(&mut self, target: Option<(&'a ProofId, &'a Entry)>) -> bool {
        match target {
            Some((proof, entry)) => {
                self.proof = proof;
                self.entry = entry;
                true
            }
            None => false,
        }
    }
}
