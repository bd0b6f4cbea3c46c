use engine_logging::engine_debug;
use serde::{Deserialize, Serialize};

use crate::result::{AnalysisResult, FieldEntry, LotData, LotEntry, ResultEntry, METERING_KEYS};

/// Which top-level payload keys count as lots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LotFilter {
    /// Everything except the metering counters.
    ExcludeMetering,
    /// Keys whose lowercase form contains the (lowercased) needle.
    KeyContains(String),
}

impl Default for LotFilter {
    fn default() -> Self {
        Self::ExcludeMetering
    }
}

impl LotFilter {
    pub fn lotto() -> Self {
        Self::KeyContains("lotto".to_string())
    }

    pub fn admits(&self, key: &str) -> bool {
        match self {
            LotFilter::ExcludeMetering => !METERING_KEYS.contains(&key),
            LotFilter::KeyContains(needle) => key
                .to_lowercase()
                .contains(needle.to_lowercase().as_str()),
        }
    }
}

/// Lots of `result` admitted by `filter`, in payload order.
///
/// Only object-valued keys can be lots.
pub fn derive_lots<'a>(result: &'a AnalysisResult, filter: &LotFilter) -> Vec<(&'a str, &'a LotData)> {
    result
        .entries()
        .filter(|(key, _)| filter.admits(key))
        .filter_map(|(key, entry)| match entry {
            ResultEntry::Lot(lot) => Some((key, lot)),
            ResultEntry::Other(_) => None,
        })
        .collect()
}

/// Structured fields of a lot, skipping scalar leaves.
pub fn fields_of(lot: &LotData) -> Vec<(&str, &FieldEntry)> {
    lot.entries()
        .filter_map(|(name, entry)| match entry {
            LotEntry::Field(field) => Some((name, field)),
            LotEntry::Scalar(_) => None,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub lot_id: String,
    pub lot: LotData,
}

/// Holds a succeeded job's payload together with the lot cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultModel {
    result: AnalysisResult,
    filter: LotFilter,
    selection: Option<Selection>,
}

impl ResultModel {
    pub fn new(result: AnalysisResult, filter: LotFilter) -> Self {
        Self {
            result,
            filter,
            selection: None,
        }
    }

    pub fn result(&self) -> &AnalysisResult {
        &self.result
    }

    pub fn filter(&self) -> &LotFilter {
        &self.filter
    }

    pub fn lots(&self) -> Vec<(&str, &LotData)> {
        derive_lots(&self.result, &self.filter)
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Moves the cursor to `lot_id`. Unknown ids leave the selection untouched.
    pub fn select(&mut self, lot_id: &str) -> bool {
        let found = self
            .lots()
            .into_iter()
            .find(|(key, _)| *key == lot_id)
            .map(|(key, lot)| Selection {
                lot_id: key.to_string(),
                lot: lot.clone(),
            });
        match found {
            Some(selection) => {
                self.selection = Some(selection);
                true
            }
            None => {
                engine_debug!("Ignoring selection of unknown lot {}", lot_id);
                false
            }
        }
    }

    pub fn deselect(&mut self) {
        self.selection = None;
    }

    /// Swaps the lot policy, dropping a selection the new policy no longer admits.
    pub fn set_filter(&mut self, filter: LotFilter) {
        self.filter = filter;
        let still_listed = self
            .selection
            .as_ref()
            .is_some_and(|selection| self.filter.admits(&selection.lot_id));
        if !still_listed {
            self.selection = None;
        }
    }
}
