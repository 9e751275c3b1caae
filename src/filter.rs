//! Boolean selection of which certificates to extract.

/// Selection flags gating extraction, combined as role x position x
/// purpose. With every flag unset nothing is extracted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterSelection {
    /// Shorthand that turns every other flag on. Expanded once at the
    /// start of a run, not a live alias.
    pub all: bool,
    pub author: bool,
    pub repository: bool,
    pub leaf: bool,
    pub intermediate: bool,
    pub root: bool,
    pub code_signing: bool,
    pub timestamping: bool,
}

impl FilterSelection {
    /// Apply the `all` expansion. The result is read-only for the rest of
    /// the run.
    pub fn expanded(mut self) -> Self {
        if self.all {
            self.author = true;
            self.repository = true;
            self.leaf = true;
            self.intermediate = true;
            self.root = true;
            self.code_signing = true;
            self.timestamping = true;
        }
        self
    }

    /// Every flag on, without going through the `all` shorthand.
    pub fn everything() -> Self {
        Self {
            all: false,
            author: true,
            repository: true,
            leaf: true,
            intermediate: true,
            root: true,
            code_signing: true,
            timestamping: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn all_expands_to_every_flag() {
        let expanded = FilterSelection {
            all: true,
            ..Default::default()
        }
        .expanded();
        let manual = FilterSelection {
            all: true,
            ..FilterSelection::everything()
        };
        assert_eq!(expanded, manual);
    }

    #[test]
    fn expansion_without_all_is_identity() {
        let filter = FilterSelection {
            repository: true,
            leaf: true,
            ..Default::default()
        };
        assert_eq!(filter.expanded(), filter);
    }
}
