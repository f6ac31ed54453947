//! Canonical column names and the alias table used to resolve them.
//!
//! Source spreadsheets come from several exports whose headers drifted over
//! time (`Articulo` vs `Artículo`, `OF` vs `O.F`, ...). Every lookup goes
//! through [`CanonicalColumn::resolve`], which tries the canonical header
//! first and then each alias in table order. Matching is exact: no case
//! folding, no fuzzy matching.

use std::collections::BTreeSet;

/// A column the ingestion pipeline knows how to interpret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CanonicalColumn {
    Center,
    Item,
    AvailableTime,
    CompletedQty,
    CompletedQtyPrior,
    WorkOrder,
}

impl CanonicalColumn {
    /// Every canonical column, in load order.
    pub const ALL: [CanonicalColumn; 6] = [
        CanonicalColumn::Center,
        CanonicalColumn::Item,
        CanonicalColumn::AvailableTime,
        CanonicalColumn::CompletedQty,
        CanonicalColumn::CompletedQtyPrior,
        CanonicalColumn::WorkOrder,
    ];

    /// Canonical header text.
    pub fn name(self) -> &'static str {
        match self {
            CanonicalColumn::Center => "Centro",
            CanonicalColumn::Item => "Artículo",
            CanonicalColumn::AvailableTime => "TEjec_Disp",
            CanonicalColumn::CompletedQty => "C. Terminada",
            CanonicalColumn::CompletedQtyPrior => "C.Terminada FAn",
            CanonicalColumn::WorkOrder => "O.F",
        }
    }

    /// Known alternative headers, tried in order after the canonical name.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            CanonicalColumn::Center => &[],
            CanonicalColumn::Item => &["Articulo", "ARTICULO", "Artículo"],
            CanonicalColumn::AvailableTime => {
                &["TEjec_Disp", "Tiempo Ejecucion Disponible", "T.Ejec Disp"]
            }
            CanonicalColumn::CompletedQty => &["C. Terminada", "C.Terminada", "Cantidad Terminada"],
            CanonicalColumn::CompletedQtyPrior => &[
                "C.Terminada FAn",
                "C. Terminada Ant",
                "Cantidad Terminada Ant",
            ],
            CanonicalColumn::WorkOrder => &["O.F", "OF", "Orden Fabricacion"],
        }
    }

    /// Return the index of the header matching this column, or `None`.
    ///
    /// Candidates are the canonical name followed by [`aliases`]; the first
    /// candidate present in `headers` wins, regardless of header position.
    ///
    /// [`aliases`]: CanonicalColumn::aliases
    pub fn resolve<S: AsRef<str>>(self, headers: &[S]) -> Option<usize> {
        std::iter::once(self.name())
            .chain(self.aliases().iter().copied())
            .find_map(|candidate| headers.iter().position(|h| h.as_ref() == candidate))
    }
}

// ── ColumnMap ─────────────────────────────────────────────────────────────────

/// Header positions of every canonical column found in one source table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    positions: Vec<(CanonicalColumn, usize)>,
}

impl ColumnMap {
    /// Resolve all canonical columns against `headers`.
    pub fn resolve<S: AsRef<str>>(headers: &[S]) -> Self {
        let positions = CanonicalColumn::ALL
            .iter()
            .filter_map(|col| col.resolve(headers).map(|idx| (*col, idx)))
            .collect();
        Self { positions }
    }

    /// Header index for `column`, when it was resolved.
    pub fn index_of(&self, column: CanonicalColumn) -> Option<usize> {
        self.positions
            .iter()
            .find(|(col, _)| *col == column)
            .map(|(_, idx)| *idx)
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// The set of columns that resolved.
    pub fn columns(&self) -> ColumnSet {
        ColumnSet(self.positions.iter().map(|(col, _)| *col).collect())
    }
}

// ── ColumnSet ─────────────────────────────────────────────────────────────────

/// Which canonical columns a dataset carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSet(BTreeSet<CanonicalColumn>);

impl ColumnSet {
    pub fn contains(&self, column: CanonicalColumn) -> bool {
        self.0.contains(&column)
    }

    /// Add every column of `other` to this set.
    pub fn extend(&mut self, other: &ColumnSet) {
        self.0.extend(other.0.iter().copied());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<CanonicalColumn> for ColumnSet {
    fn from_iter<I: IntoIterator<Item = CanonicalColumn>>(iter: I) -> Self {
        ColumnSet(iter.into_iter().collect())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
