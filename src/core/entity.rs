use std::collections::HashMap;

use crate::core::token::decode_token;
use crate::error::LoadError;
use crate::io::document::CrossComponentMetrics;
use crate::io::tsv::Table;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Classification {
    Accepted,
    Rejected,
    Ignored,
    #[default]
    Unknown,
}

impl Classification {
    pub const ALL: [Classification; 4] = [
        Classification::Accepted,
        Classification::Rejected,
        Classification::Ignored,
        Classification::Unknown,
    ];

    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "accepted" => Self::Accepted,
            "rejected" => Self::Rejected,
            "ignored" => Self::Ignored,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Ignored => "ignored",
            Self::Unknown => "unknown",
        }
    }

    pub fn rgb(self) -> [u8; 3] {
        match self {
            Self::Accepted => [0x2e, 0xcc, 0x71],
            Self::Rejected => [0xe7, 0x4c, 0x3c],
            Self::Ignored => [0x34, 0x98, 0xdb],
            Self::Unknown => [0x00, 0x00, 0x00],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    /// Dataset-assigned component number; also its index on the volume's
    /// 4th axis.
    pub id: i64,
    pub classification: Classification,
    pub kappa_rank: u32,
    pub rho_rank: u32,
    pub kappa: f64,
    pub rho: f64,
    pub variance_explained: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Elbows {
    pub kappa: Option<f64>,
    pub rho: Option<f64>,
}

impl From<&CrossComponentMetrics> for Elbows {
    fn from(doc: &CrossComponentMetrics) -> Self {
        Self {
            kappa: doc.kappa_elbow,
            rho: doc.rho_elbow,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RankMetric {
    Kappa,
    Rho,
}

/// Per-component metrics of one dataset. Immutable once built; a new load
/// replaces it wholesale.
#[derive(Clone, Debug, Default)]
pub struct EntityTable {
    entities: Vec<Entity>,
    index: HashMap<i64, usize>,
    elbows: Elbows,
}

const ID_COLUMNS: &[&str] = &["Component", "component"];
const CLASSIF_COLUMNS: &[&str] = &["classif", "classification"];
const KAPPA_COLUMNS: &[&str] = &["kappa"];
const RHO_COLUMNS: &[&str] = &["rho"];
const KAPPA_RANK_COLUMNS: &[&str] = &["kappa ranking", "kappa_rank", "kappa rank"];
const RHO_RANK_COLUMNS: &[&str] = &["rho ranking", "rho_rank", "rho rank"];
const VAREX_COLUMNS: &[&str] = &[
    "variance explained",
    "variance_explained",
    "normalized variance explained",
];

impl EntityTable {
    pub fn new(entities: Vec<Entity>, elbows: Elbows) -> Result<Self, i64> {
        let mut index = HashMap::with_capacity(entities.len());
        for (row, entity) in entities.iter().enumerate() {
            if index.insert(entity.id, row).is_some() {
                return Err(entity.id);
            }
        }
        Ok(Self {
            entities,
            index,
            elbows,
        })
    }

    /// Builds the table from a tedana component table. Rank columns are
    /// optional and derived from the metric (1 = largest) when absent.
    pub fn from_table(table: &Table, elbows: Elbows) -> Result<Self, LoadError> {
        let source = table.source();
        let require = |names: &[&str]| {
            table
                .column_index(names)
                .ok_or_else(|| LoadError::parse(source, format!("missing column `{}`", names[0])))
        };
        let id_col = require(ID_COLUMNS)?;
        let classif_col = require(CLASSIF_COLUMNS)?;
        let kappa_col = require(KAPPA_COLUMNS)?;
        let rho_col = require(RHO_COLUMNS)?;
        let varex_col = require(VAREX_COLUMNS)?;

        let float = |row: usize, col: usize, cell: &str| -> Result<f64, LoadError> {
            cell.parse().map_err(|_| {
                LoadError::parse(
                    source,
                    format!(
                        "row {}: `{}` value `{cell}` is not a number",
                        row + 1,
                        table.header()[col]
                    ),
                )
            })
        };

        let mut entities = Vec::with_capacity(table.n_rows());
        for (row, cells) in table.rows().enumerate() {
            let id = decode_token(&cells[id_col]).ok_or_else(|| {
                LoadError::parse(
                    source,
                    format!("row {}: bad component label `{}`", row + 1, cells[id_col]),
                )
            })?;
            entities.push(Entity {
                id,
                classification: Classification::parse(&cells[classif_col]),
                kappa_rank: 0,
                rho_rank: 0,
                kappa: float(row, kappa_col, &cells[kappa_col])?,
                rho: float(row, rho_col, &cells[rho_col])?,
                variance_explained: float(row, varex_col, &cells[varex_col])?,
            });
        }

        let ranks = |names: &[&str], metric: fn(&Entity) -> f64| -> Result<Vec<u32>, LoadError> {
            match table.column_index(names) {
                Some(col) => table
                    .column(col)
                    .enumerate()
                    .map(|(row, cell)| {
                        let v = float(row, col, cell)?;
                        if v.is_finite() && (0.0..=u32::MAX as f64).contains(&v) {
                            Ok(v.round() as u32)
                        } else {
                            Err(LoadError::parse(
                                source,
                                format!(
                                    "row {}: `{}` value `{cell}` is not a valid rank",
                                    row + 1,
                                    table.header()[col]
                                ),
                            ))
                        }
                    })
                    .collect(),
                None => Ok(descending_ranks(&entities, metric)),
            }
        };
        let kappa_ranks = ranks(KAPPA_RANK_COLUMNS, |e| e.kappa)?;
        let rho_ranks = ranks(RHO_RANK_COLUMNS, |e| e.rho)?;
        for ((entity, k), r) in entities.iter_mut().zip(kappa_ranks).zip(rho_ranks) {
            entity.kappa_rank = k;
            entity.rho_rank = r;
        }

        Self::new(entities, elbows)
            .map_err(|id| LoadError::parse(source, format!("duplicate component id {id}")))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.entities.iter().map(|e| e.id)
    }

    pub fn get(&self, id: i64) -> Option<&Entity> {
        self.index.get(&id).map(|&row| &self.entities[row])
    }

    pub fn contains(&self, id: i64) -> bool {
        self.index.contains_key(&id)
    }

    /// Row position of `id` in table order.
    pub fn position(&self, id: i64) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn elbows(&self) -> Elbows {
        self.elbows
    }

    /// Entities ordered by rank on `metric` (rank 1 first).
    pub fn sorted_by_rank(&self, metric: RankMetric) -> Vec<&Entity> {
        let mut sorted: Vec<&Entity> = self.entities.iter().collect();
        match metric {
            RankMetric::Kappa => sorted.sort_by_key(|e| (e.kappa_rank, e.id)),
            RankMetric::Rho => sorted.sort_by_key(|e| (e.rho_rank, e.id)),
        }
        sorted
    }

    pub fn counts_by_classification(&self) -> Vec<(Classification, usize)> {
        Classification::ALL
            .iter()
            .map(|&c| {
                let n = self.entities.iter().filter(|e| e.classification == c).count();
                (c, n)
            })
            .filter(|(_, n)| *n > 0)
            .collect()
    }

    pub fn variance_by_classification(&self) -> Vec<(Classification, f64)> {
        Classification::ALL
            .iter()
            .filter_map(|&c| {
                let mut members = self.entities.iter().filter(|e| e.classification == c).peekable();
                members.peek()?;
                Some((c, members.map(|e| e.variance_explained).sum()))
            })
            .collect()
    }
}

fn descending_ranks(entities: &[Entity], metric: fn(&Entity) -> f64) -> Vec<u32> {
    let mut order: Vec<usize> = (0..entities.len()).collect();
    order.sort_by(|&a, &b| metric(&entities[b]).total_cmp(&metric(&entities[a])));
    let mut ranks = vec![0u32; entities.len()];
    for (rank, row) in order.into_iter().enumerate() {
        ranks[row] = rank as u32 + 1;
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;

    const METRICS: &str = "Component\tclassif\tkappa\trho\tvariance explained\tkappa ranking\trho ranking
ICA_00\taccepted\t80.0\t10.0\t30.5\t1\t3
ICA_01\trejected\t20.0\t40.0\t12.0\t3\t1
ICA_02\tignored\t50.0\t15.0\t1.5\t2\t2
";

    fn table() -> EntityTable {
        let t = Table::parse("m.tsv", METRICS).unwrap();
        EntityTable::from_table(
            &t,
            Elbows {
                kappa: Some(40.0),
                rho: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn parses_labels_and_metrics() {
        let table = table();
        assert_eq!(table.len(), 3);
        assert_eq!(table.ids().collect::<Vec<_>>(), vec![0, 1, 2]);
        let e = table.get(2).unwrap();
        assert_eq!(e.classification, Classification::Ignored);
        assert_eq!(e.kappa_rank, 2);
        assert_eq!(table.position(1), Some(1));
        assert_eq!(table.elbows().kappa, Some(40.0));
        assert!(!table.contains(3));
    }

    #[test]
    fn sorted_by_rank_orders_rank_one_first() {
        let table = table();
        let kappa: Vec<i64> = table.sorted_by_rank(RankMetric::Kappa).iter().map(|e| e.id).collect();
        let rho: Vec<i64> = table.sorted_by_rank(RankMetric::Rho).iter().map(|e| e.id).collect();
        assert_eq!(kappa, vec![0, 2, 1]);
        assert_eq!(rho, vec![1, 2, 0]);
    }

    #[test]
    fn missing_rank_columns_are_derived() {
        let text = "Component\tclassif\tkappa\trho\tvariance explained\n7\taccepted\t1.0\t5.0\t1\n3\trejected\t9.0\t2.0\t1\n";
        let t = Table::parse("m.tsv", text).unwrap();
        let table = EntityTable::from_table(&t, Elbows::default()).unwrap();
        assert_eq!(table.get(3).unwrap().kappa_rank, 1);
        assert_eq!(table.get(7).unwrap().kappa_rank, 2);
        assert_eq!(table.get(7).unwrap().rho_rank, 1);
    }

    #[test]
    fn duplicate_ids_and_bad_numbers_are_rejected() {
        let dup = "Component\tclassif\tkappa\trho\tvariance explained\n1\taccepted\t1\t1\t1\nICA_01\taccepted\t1\t1\t1\n";
        let t = Table::parse("m.tsv", dup).unwrap();
        assert!(EntityTable::from_table(&t, Elbows::default()).is_err());

        let bad = "Component\tclassif\tkappa\trho\tvariance explained\n1\taccepted\thigh\t1\t1\n";
        let t = Table::parse("m.tsv", bad).unwrap();
        let err = EntityTable::from_table(&t, Elbows::default()).unwrap_err();
        assert!(err.to_string().contains("kappa"), "{err}");
    }

    #[test]
    fn negative_or_nan_rank_cells_are_rejected() {
        let header = "Component\tclassif\tkappa\trho\tvariance explained\tkappa ranking\n";
        for rank in ["-2", "nan", "inf"] {
            let text = format!("{header}0\taccepted\t10\t1\t1\t{rank}\n");
            let t = Table::parse("m.tsv", &text).unwrap();
            let err = EntityTable::from_table(&t, Elbows::default()).unwrap_err();
            assert!(err.to_string().contains("not a valid rank"), "{rank}: {err}");
        }

        let text = format!("{header}0\taccepted\t10\t1\t1\t2.0\n");
        let t = Table::parse("m.tsv", &text).unwrap();
        let table = EntityTable::from_table(&t, Elbows::default()).unwrap();
        assert_eq!(table.get(0).unwrap().kappa_rank, 2);
    }

    #[test]
    fn classification_summaries() {
        let table = table();
        assert_eq!(
            table.variance_by_classification(),
            vec![
                (Classification::Accepted, 30.5),
                (Classification::Rejected, 12.0),
                (Classification::Ignored, 1.5),
            ]
        );
        assert_eq!(table.counts_by_classification().len(), 3);
        assert_eq!(Classification::parse(" Accepted "), Classification::Accepted);
        assert_eq!(Classification::parse("provisional"), Classification::Unknown);
    }
}
