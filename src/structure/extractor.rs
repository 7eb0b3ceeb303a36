use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::grid::GridAccessor;
use crate::spreadsheet::reference::index_to_col;
use crate::structure::layout::SheetLayout;
use crate::structure::template::Template;
use crate::structure::SectionTag;
use crate::warning::Warning;
use crate::warning::Warnings;
use serde::Serialize;

/// Value of one template slot for one entity.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EntityField {
    pub tag: SectionTag,
    pub key: String,
    /// `None` when the key does not occur in the sheet, `Some(Empty)` when
    /// it does but the entity left the cell blank
    pub value: Option<CellValue>,
}

/// Everything one entity column holds, in template order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EntityRecord {
    /// Zero-based sheet column
    pub column: usize,
    pub fields: Vec<EntityField>,
}

impl EntityRecord {
    pub fn field(&self, tag: &SectionTag, key: &str) -> Option<&EntityField> {
        self.fields.iter().find(|field| field.tag == *tag && field.key == key)
    }

    /// Value of a resolved field; `None` for unknown or unresolved keys.
    pub fn get(&self, tag: &SectionTag, key: &str) -> Option<&CellValue> {
        self.field(tag, key).and_then(|field| field.value.as_ref())
    }

    /// Number of non-empty values.
    pub fn value_count(&self) -> usize {
        self.fields
            .iter()
            .filter(|field| field.value.as_ref().map(|value| !value.is_empty()).unwrap_or(false))
            .count()
    }

    /// Column letters, "C" for the first entity of the default layout.
    pub fn column_name(&self) -> String {
        index_to_col(self.column)
    }
}

/// Reads one record per entity column using the resolved rows of `template`.
///
/// Entity columns end at the last column holding a value of its own, so a
/// merge stretched across the sheet adds no records.
pub fn create_data_structure_from_template<G: GridAccessor + ?Sized>(
    template: &Template,
    grid: &G,
    layout: &SheetLayout,
) -> Vec<EntityRecord> {
    (layout.first_entity_column..used_column_count(grid))
        .map(|column| EntityRecord {
            column,
            fields: template
                .iter()
                .map(|entry| EntityField {
                    tag: entry.tag.clone(),
                    key: entry.key.clone(),
                    value: entry.row().map(|row| grid.value(row, column).clone()),
                })
                .collect(),
        })
        .collect()
}

fn used_column_count<G: GridAccessor + ?Sized>(grid: &G) -> usize {
    (0..grid.column_count())
        .rev()
        .find(|col| {
            (0..grid.row_count())
                .any(|row| !grid.is_merge_continuation(row, *col) && !grid.value(row, *col).is_empty())
        })
        .map(|col| col + 1)
        .unwrap_or(0)
}

/// Drops records holding fewer than `minimum` non-empty values, one warning
/// per dropped record. A minimum of zero keeps every record.
pub fn discard_sparse_entities(records: Vec<EntityRecord>, minimum: usize, warnings: &mut Warnings) -> Vec<EntityRecord> {
    records
        .into_iter()
        .filter(|record| {
            let values = record.value_count();
            if values >= minimum {
                return true;
            }
            warnings.push(Warning::SparseEntity {
                column: record.column,
                values,
                minimum,
            });
            false
        })
        .collect()
}
