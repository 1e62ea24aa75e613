use std::fmt;

use serde::{Deserialize, Serialize};

use crate::processing::statistics::ENERGY_DIVISOR;
use crate::report::address::{CellAddress, CellRange};

/// Derived values attached to each pulse's raw-data rows, in attachment order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Statistic {
    MinCompanion,
    PeakCurrent,
    Energy,
}

impl Statistic {
    pub const ALL: [Statistic; 3] = [
        Statistic::MinCompanion,
        Statistic::PeakCurrent,
        Statistic::Energy,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Statistic::MinCompanion => "Min [V]",
            Statistic::PeakCurrent => "Peak [A]",
            Statistic::Energy => "Joules [J]",
        }
    }

    pub fn needs_companion(&self) -> bool {
        matches!(self, Statistic::MinCompanion | Statistic::Energy)
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateOp {
    Max,
    Min,
    Mean,
    Count,
}

impl AggregateOp {
    pub fn function_name(&self) -> &'static str {
        match self {
            AggregateOp::Max => "MAX",
            AggregateOp::Min => "MIN",
            AggregateOp::Mean => "AVERAGE",
            AggregateOp::Count => "COUNT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Aggregate {
    pub op: AggregateOp,
    pub range: CellRange,
}

impl Aggregate {
    pub fn new(op: AggregateOp, range: CellRange) -> Self {
        Self { op, range }
    }

    fn render(&self) -> String {
        format!("{}({})", self.op.function_name(), self.range.a1())
    }
}

/// A formula kept as data. Nothing in the crate evaluates these; the document engine does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Formula {
    Aggregate(Aggregate),
    /// `mean(companion) * mean(current) * count(current) / ENERGY_DIVISOR`
    EnergyEstimate {
        companion: CellRange,
        current: CellRange,
    },
    Reference(CellAddress),
}

impl Formula {
    /// Build the raw-data formula for `statistic` over a pulse's rows.
    /// Returns `None` when the statistic needs a companion range that is missing.
    pub fn for_statistic(
        statistic: Statistic,
        current: CellRange,
        companion: Option<CellRange>,
    ) -> Option<Self> {
        match statistic {
            Statistic::PeakCurrent => Some(Formula::Aggregate(Aggregate::new(
                AggregateOp::Max,
                current,
            ))),
            Statistic::MinCompanion => {
                companion.map(|range| Formula::Aggregate(Aggregate::new(AggregateOp::Min, range)))
            }
            Statistic::Energy => {
                companion.map(|companion| Formula::EnergyEstimate { companion, current })
            }
        }
    }

    /// Every range this formula reads.
    pub fn ranges(&self) -> Vec<CellRange> {
        match self {
            Formula::Aggregate(agg) => vec![agg.range],
            Formula::EnergyEstimate { companion, current } => vec![*companion, *current],
            Formula::Reference(_) => Vec::new(),
        }
    }

    /// Whether the formula reads the cell at `addr`.
    pub fn reads(&self, addr: &CellAddress) -> bool {
        match self {
            Formula::Reference(target) => target == addr,
            _ => self.ranges().iter().any(|r| r.contains(addr)),
        }
    }

    /// Spreadsheet A1 syntax with the leading `=`.
    pub fn render(&self) -> String {
        match self {
            Formula::Aggregate(agg) => format!("={}", agg.render()),
            Formula::EnergyEstimate { companion, current } => format!(
                "={}*{}*{}/{}",
                Aggregate::new(AggregateOp::Mean, *companion).render(),
                Aggregate::new(AggregateOp::Mean, *current).render(),
                Aggregate::new(AggregateOp::Count, *current).render(),
                ENERGY_DIVISOR
            ),
            Formula::Reference(addr) => format!("={}", addr.a1()),
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::address::Region;

    fn range(column: usize) -> CellRange {
        CellRange::column_span(Region::RawData, column, 11, 13)
    }

    #[test]
    fn renders_aggregates() {
        let f = Formula::for_statistic(Statistic::PeakCurrent, range(4), None).unwrap();
        assert_eq!(f.render(), "=MAX(E12:E14)");
        let f = Formula::for_statistic(Statistic::MinCompanion, range(4), Some(range(3))).unwrap();
        assert_eq!(f.render(), "=MIN(D12:D14)");
    }

    #[test]
    fn renders_energy_proxy() {
        let f = Formula::for_statistic(Statistic::Energy, range(4), Some(range(3))).unwrap();
        assert_eq!(
            f.render(),
            "=AVERAGE(D12:D14)*AVERAGE(E12:E14)*COUNT(E12:E14)/100"
        );
    }

    #[test]
    fn companion_statistics_need_companion_range() {
        assert!(Formula::for_statistic(Statistic::MinCompanion, range(4), None).is_none());
        assert!(Formula::for_statistic(Statistic::Energy, range(4), None).is_none());
    }

    #[test]
    fn reference_reads_only_its_target() {
        let target = CellAddress::new(Region::RawData, 9, 6);
        let f = Formula::Reference(target);
        assert_eq!(f.render(), "=G10");
        assert!(f.reads(&target));
        assert!(!f.reads(&CellAddress::new(Region::RawData, 10, 6)));
    }
}
