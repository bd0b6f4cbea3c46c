use crate::format::{label_for, summary_of, LotSummary};
use crate::navigator::fields_of;
use crate::result::{FieldEntry, LotData, Metering};
use crate::{AppState, FailureKind, JobPhase};

/// Read-only snapshot handed to the rendering layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub phase: JobPhase,
    pub files: Vec<FileRowView>,
    /// Non-PDF files dropped from the most recent selection.
    pub last_rejected: usize,
    pub can_submit: bool,
    pub job_id: Option<String>,
    pub poll_attempts: u32,
    pub error: Option<String>,
    pub failure_kind: Option<FailureKind>,
    pub lots: Vec<LotCardView>,
    pub selection: Option<LotDetailView>,
    pub metering: Option<Metering>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRowView {
    pub index: usize,
    pub name: String,
    pub size_kb: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotCardView {
    pub lot_id: String,
    pub label: String,
    pub summary: LotSummary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotDetailView {
    pub lot_id: String,
    pub label: String,
    pub fields: Vec<FieldView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldView {
    pub name: String,
    pub label: String,
    pub value: Option<String>,
    pub source_text: Option<String>,
    pub sources: Vec<SourceView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceView {
    pub document: Option<String>,
    pub page: Option<String>,
}

impl AppState {
    pub fn view(&self) -> AppViewModel {
        let files = self
            .batch()
            .files()
            .iter()
            .enumerate()
            .map(|(index, file)| FileRowView {
                index,
                name: file.name.clone(),
                size_kb: file.size_kb(),
            })
            .collect();

        let (lots, selection, metering) = match self.results() {
            Some(results) => {
                let lots = results
                    .lots()
                    .into_iter()
                    .map(|(lot_id, lot)| LotCardView {
                        lot_id: lot_id.to_string(),
                        label: label_for(lot_id),
                        summary: summary_of(lot, self.currency()),
                    })
                    .collect();
                let selection = results
                    .selection()
                    .map(|selection| lot_detail(&selection.lot_id, &selection.lot));
                (lots, selection, Some(results.result().metering()))
            }
            None => (Vec::new(), None, None),
        };

        AppViewModel {
            phase: self.phase(),
            files,
            last_rejected: self.last_rejected(),
            can_submit: self.phase() == JobPhase::Idle && !self.batch().is_empty(),
            job_id: self.job().map(|job| job.id.clone()),
            poll_attempts: self.job().map_or(0, |job| job.poll_attempts),
            error: self.failure().map(|failure| failure.message.clone()),
            failure_kind: self.failure().map(|failure| failure.kind),
            lots,
            selection,
            metering,
            dirty: self.is_dirty(),
        }
    }
}

fn lot_detail(lot_id: &str, lot: &LotData) -> LotDetailView {
    LotDetailView {
        lot_id: lot_id.to_string(),
        label: label_for(lot_id),
        fields: fields_of(lot)
            .into_iter()
            .map(|(name, field)| field_view(name, field))
            .collect(),
    }
}

fn field_view(name: &str, field: &FieldEntry) -> FieldView {
    FieldView {
        name: name.to_string(),
        label: label_for(name),
        value: field.present_value().map(ToString::to_string),
        source_text: field
            .source_text()
            .filter(|text| !text.is_empty())
            .map(str::to_string),
        sources: field
            .sources()
            .iter()
            .map(|source| SourceView {
                document: source.source.clone(),
                page: source.page_num.as_ref().map(ToString::to_string),
            })
            .collect(),
    }
}
